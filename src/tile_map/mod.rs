//! This module defines the [`TileMap`] struct and its associated methods.
//! The tile map is the map aggregate: it owns the per-tile component lists,
//! the feature registry and the map metadata. Its methods come in two
//! parts:
//! 1. The common query and bookkeeping methods, in this file.
//! 2. The pipeline stage methods, defined in the [`impls`] submodule, one
//!    file per stage.

use serde::{Deserialize, Serialize};

use crate::{
    error::GenerationError,
    feature::{FeatureId, FeatureRegistry},
    grid::{Direction, SquareGrid},
    map_parameters::MapParameters,
    seed::Seed,
    tile_component::{
        GeologySummary, HydrologySummary, TacticalProperties, TerrainType, TopographySummary,
        VegetationSummary,
    },
};

mod impls;
pub mod tile;

pub use impls::FeatureInteraction;
pub use tile::Tile;

/// One stage of the generation pipeline, in fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Geology,
    Topography,
    Hydrology,
    Vegetation,
    Structures,
    FeatureMixing,
}

impl PipelineStage {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineStage::Geology => "geology",
            PipelineStage::Topography => "topography",
            PipelineStage::Hydrology => "hydrology",
            PipelineStage::Vegetation => "vegetation",
            PipelineStage::Structures => "structures",
            PipelineStage::FeatureMixing => "feature_mixing",
        }
    }
}

/// Descriptive metadata of a generated map.
///
/// The pipeline never stamps wall-clock times; timestamps, if wanted, are
/// the caller's business after generation returns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MapMetadata {
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub revision: u32,
}

/// The map aggregate produced by one generation run.
///
/// Per-tile data is stored as parallel lists indexed by [`Tile::index`],
/// one list per component. The lists for a layer stay empty until that
/// layer's stage commits, so a failed stage never leaves partial tile
/// state behind.
#[derive(PartialEq, Debug)]
pub struct TileMap {
    /// Stable map identity, derived from the seed.
    pub id: String,
    pub name: String,
    pub grid: SquareGrid,
    /// Edge length of one tile in meters.
    pub cell_size: f64,
    pub seed: Seed,
    /// Terrain type of each tile. The index is equal to [`Tile::index`].
    pub terrain_type_list: Vec<TerrainType>,
    /// Geology summary of each tile. The index is equal to [`Tile::index`].
    pub geology_list: Vec<GeologySummary>,
    /// Topography summary of each tile. The index is equal to [`Tile::index`].
    pub topography_list: Vec<TopographySummary>,
    /// Hydrology summary of each tile. The index is equal to [`Tile::index`].
    pub hydrology_list: Vec<HydrologySummary>,
    /// Vegetation summary of each tile. The index is equal to [`Tile::index`].
    pub vegetation_list: Vec<VegetationSummary>,
    /// Resolved tactical properties of each tile, written by the mixing
    /// engine. The index is equal to [`Tile::index`].
    pub tactical_list: Vec<TacticalProperties>,
    /// The dominant feature of each tile, assigned by the mixing engine.
    pub primary_feature_list: Vec<Option<FeatureId>>,
    /// The non-primary features sharing each tile, sorted by id.
    pub mixed_feature_list: Vec<Vec<FeatureId>>,
    /// Features claiming each tile, in claim order. Input of the mixing
    /// engine; placement stages append here.
    pub(crate) claimed_feature_list: Vec<Vec<FeatureId>>,
    /// Every feature of the map, owned by id.
    pub feature_registry: FeatureRegistry,
    pub metadata: MapMetadata,
    completed_stages: Vec<PipelineStage>,
}

impl TileMap {
    /// Creates an empty tile map for the given parameters.
    pub fn new(map_parameters: &MapParameters) -> Self {
        let grid = map_parameters.grid();
        let size = grid.size.area() as usize;

        Self {
            id: format!("map-{}", map_parameters.seed),
            name: map_parameters.name.clone(),
            grid,
            cell_size: map_parameters.cell_size,
            seed: map_parameters.seed,
            terrain_type_list: Vec::new(),
            geology_list: Vec::new(),
            topography_list: Vec::new(),
            hydrology_list: Vec::new(),
            vegetation_list: Vec::new(),
            tactical_list: Vec::new(),
            primary_feature_list: Vec::new(),
            mixed_feature_list: Vec::new(),
            claimed_feature_list: vec![Vec::new(); size],
            feature_registry: FeatureRegistry::new(),
            metadata: MapMetadata::default(),
            completed_stages: Vec::new(),
        }
    }

    /// Returns an iterator over all tiles in the map, in index order.
    #[must_use = "iterators are lazy and do nothing unless consumed"]
    pub fn all_tiles(&self) -> impl Iterator<Item = Tile> + use<> {
        (0..self.grid.size.area() as usize).map(Tile::new)
    }

    /// The number of tiles in the map.
    pub fn tile_count(&self) -> usize {
        self.grid.size.area() as usize
    }

    /// The canonical neighbor scan order of this map.
    ///
    /// The 8 compass directions rotated by a seed-derived offset. All
    /// tie-breaking (flow directions, aspect) scans in this order, so the
    /// result is deterministic and varies between seeds without ever
    /// depending on container iteration order.
    pub fn neighbor_scan_order(&self) -> [Direction; 8] {
        let rotation = (self.seed.derive("neighbor-order") % 8) as usize;
        let mut order = [Direction::None; 8];
        for (slot, direction) in order.iter_mut().enumerate() {
            *direction = Direction::ALL_NEIGHBORS[(slot + rotation) % 8];
        }
        order
    }

    /// Records a feature's claim on a tile. The mixing engine resolves all
    /// claims after the placement stages.
    pub(crate) fn claim_tile(&mut self, tile: Tile, feature: FeatureId) {
        let claims = &mut self.claimed_feature_list[tile.index()];
        if !claims.contains(&feature) {
            claims.push(feature);
        }
    }

    /// Marks a stage's output as committed.
    pub(crate) fn mark_stage_complete(&mut self, stage: PipelineStage) {
        if !self.completed_stages.contains(&stage) {
            self.completed_stages.push(stage);
        }
    }

    /// Whether a stage's output has been committed.
    pub fn stage_complete(&self, stage: PipelineStage) -> bool {
        self.completed_stages.contains(&stage)
    }

    /// Verifies that a dependency stage ran before the current one.
    ///
    /// A missing dependency is a pipeline-ordering bug, reported as a fatal
    /// deterministic error rather than a retryable condition.
    pub(crate) fn ensure_stage(
        &self,
        dependency: PipelineStage,
        current: &'static str,
    ) -> Result<(), GenerationError> {
        if self.stage_complete(dependency) {
            Ok(())
        } else {
            Err(GenerationError::deterministic(
                "STAGE_DEPENDENCY_MISSING",
                current,
                format!("stage '{}' has not committed its output", dependency.name()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PipelineStage, TileMap};
    use crate::{grid::Direction, map_parameters::MapParameters};

    #[test]
    fn stage_dependencies_are_enforced() {
        let map = TileMap::new(&MapParameters::default());
        let error = map
            .ensure_stage(PipelineStage::Geology, "topography")
            .unwrap_err();
        assert_eq!(error.code(), "STAGE_DEPENDENCY_MISSING");

        let mut map = TileMap::new(&MapParameters::default());
        map.mark_stage_complete(PipelineStage::Geology);
        assert!(map.ensure_stage(PipelineStage::Geology, "topography").is_ok());
    }

    #[test]
    fn neighbor_scan_order_is_a_rotation() {
        let map = TileMap::new(&MapParameters::default());
        let order = map.neighbor_scan_order();
        assert_eq!(order, map.neighbor_scan_order());
        for direction in Direction::ALL_NEIGHBORS {
            assert!(order.contains(&direction));
        }
    }
}
