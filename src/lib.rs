//! A deterministic generator of tactical battle maps.
//!
//! One generation run turns a [`MapParameters`] request into a
//! [`TileMap`]: a rectangular tile grid annotated with geology,
//! topography, hydrology, vegetation and artificial structures, plus the
//! discrete features (rivers, lakes, forests, buildings, roads, ...) that
//! share its tiles. Every decision derives from the request's [`Seed`], so
//! equal requests always produce bit-identical maps.

pub mod error;
pub mod feature;
pub mod grid;
pub mod map_generator;
pub mod map_parameters;
pub mod noise;
pub mod seed;
pub mod spatial;
pub mod tile_component;
pub mod tile_map;

pub use error::GenerationError;
pub use map_parameters::MapParameters;
pub use seed::Seed;
pub use tile_map::TileMap;

use map_generator::{Generator, standard::Standard};

/// Runs the full generation pipeline for the given parameters.
pub fn generate_map(map_parameters: &MapParameters) -> Result<TileMap, GenerationError> {
    Standard::generate(map_parameters)
}
