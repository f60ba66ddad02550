//! This module defines the `Generator` trait for map generation and provides
//! the ordered pipeline every generator runs.

use crate::{error::GenerationError, map_parameters::MapParameters, tile_map::TileMap};

pub mod standard;

/// A trait that allows for the generation of a tile map.
///
/// The default `generate` drives the fixed stage order of the pipeline;
/// implementors supply construction and can override individual stages.
pub trait Generator {
    fn new(map_parameters: &MapParameters) -> Self;

    fn into_inner(self) -> TileMap;

    fn tile_map_mut(&mut self) -> &mut TileMap;

    fn generate_geology(&mut self, map_parameters: &MapParameters) -> Result<(), GenerationError> {
        self.tile_map_mut().generate_geology(map_parameters)
    }

    fn generate_topography(
        &mut self,
        map_parameters: &MapParameters,
    ) -> Result<(), GenerationError> {
        self.tile_map_mut().generate_topography(map_parameters)
    }

    fn generate_hydrology(
        &mut self,
        map_parameters: &MapParameters,
    ) -> Result<(), GenerationError> {
        self.tile_map_mut().generate_hydrology(map_parameters)
    }

    fn generate_vegetation(
        &mut self,
        map_parameters: &MapParameters,
    ) -> Result<(), GenerationError> {
        self.tile_map_mut().generate_vegetation(map_parameters)
    }

    fn generate_structures(
        &mut self,
        map_parameters: &MapParameters,
    ) -> Result<(), GenerationError> {
        self.tile_map_mut().generate_structures(map_parameters)
    }

    fn mix_features(&mut self) -> Result<(), GenerationError> {
        self.tile_map_mut().mix_features()
    }

    /// Runs the whole pipeline for the given parameters.
    ///
    /// Parameters are validated first; a stage failure aborts the run and
    /// the partially generated map is dropped, never returned.
    fn generate(map_parameters: &MapParameters) -> Result<TileMap, GenerationError>
    where
        Self: Sized,
    {
        map_parameters.validate()?;

        let mut map = Self::new(map_parameters);
        // The order of the following methods is important. Do not change it.
        map.generate_geology(map_parameters)?;
        map.generate_topography(map_parameters)?;
        map.generate_hydrology(map_parameters)?;
        map.generate_vegetation(map_parameters)?;
        map.generate_structures(map_parameters)?;
        map.mix_features()?;

        Ok(map.into_inner())
    }
}

/// Generates common methods for a generator struct.
///
/// This macro generates the following methods:
/// - `new`: Creates a new instance of the struct with the given `MapParameters`.
/// - `into_inner`: Consumes the struct and returns the inner `TileMap`.
/// - `tile_map_mut`: Provides a mutable reference to the inner `TileMap`.
#[macro_export]
macro_rules! generate_common_methods {
    () => {
        /// Creates a new instance of the struct with the given `MapParameters`.
        fn new(map_parameters: &MapParameters) -> Self {
            Self(TileMap::new(map_parameters))
        }

        /// Consumes the struct and returns the inner `TileMap`.
        fn into_inner(self) -> TileMap {
            self.0
        }

        /// Provides a mutable reference to the inner `TileMap`.
        fn tile_map_mut(&mut self) -> &mut TileMap {
            &mut self.0
        }
    };
}
