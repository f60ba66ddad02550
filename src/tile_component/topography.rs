use serde::{Deserialize, Serialize};

use crate::grid::Direction;

/// The topography layer's output for one tile.
#[derive(PartialEq, Clone, Copy, Serialize, Deserialize, Debug)]
pub struct TopographySummary {
    /// Normalized elevation in `[0, 1]`.
    pub elevation: f64,
    /// Local gradient magnitude, in elevation units per tile.
    pub slope: f64,
    /// The downhill facing of the tile. `Direction::None` on flat ground.
    pub aspect: Direction,
    /// Height multiplier combining terrain class and local elevation.
    pub height_multiplier: f64,
}
