//! This module contains the components of the tile in the map.
//! Each pipeline layer commits one summary per tile; the tile map stores
//! them in parallel lists indexed by the tile index.

pub mod geology;
pub mod hydrology;
pub mod tactical;
pub mod terrain_type;
pub mod topography;
pub mod vegetation;

pub use geology::{BedrockType, GeologicFeature, GeologySummary};
pub use hydrology::HydrologySummary;
pub use tactical::{ConcealmentLevel, CoverLevel, TacticalAspect, TacticalProperties};
pub use terrain_type::TerrainType;
pub use topography::TopographySummary;
pub use vegetation::{TreeSpecies, VegetationSummary};
