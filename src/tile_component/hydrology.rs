use serde::{Deserialize, Serialize};

use crate::grid::Direction;

/// The hydrology layer's output for one tile.
#[derive(PartialEq, Clone, Copy, Serialize, Deserialize, Debug)]
pub struct HydrologySummary {
    /// Upstream contributing area in tiles, including the tile itself.
    pub flow_accumulation: f64,
    /// The direction surface water leaves the tile.
    /// `Direction::None` in depressions and on water tiles.
    pub flow_direction: Direction,
    /// Standing or flowing water depth in meters. Zero on dry tiles.
    pub water_depth: f64,
    /// Soil moisture in `[0, 1]`, driven by permeability and water
    /// proximity. Read by the vegetation layer.
    pub moisture: f64,
}
