use core::convert::From;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::direction::Direction;

/// A coordinate in the offset coordinate system.
///
/// Offset coordinates address tiles relative to the grid's bottom-left
/// corner at `(0, 0)`. For a grid of `width × height` tiles the valid ranges
/// are `x ∈ [0, width)` and `y ∈ [0, height)`; coordinates outside that
/// range may appear transiently while probing neighbors and are rejected by
/// [`SquareGrid::index_of`](super::SquareGrid::index_of).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OffsetCoordinate(pub IVec2);

impl OffsetCoordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self(IVec2::new(x, y))
    }

    pub const fn into_inner(self) -> IVec2 {
        self.0
    }

    pub const fn to_array(self) -> [i32; 2] {
        [self.0.x, self.0.y]
    }

    /// The coordinate one step away in the given direction.
    pub fn step(self, direction: Direction) -> Self {
        Self(self.0 + direction.delta())
    }
}

impl From<[u32; 2]> for OffsetCoordinate {
    fn from(value: [u32; 2]) -> Self {
        OffsetCoordinate::new(value[0] as i32, value[1] as i32)
    }
}

impl From<IVec2> for OffsetCoordinate {
    fn from(value: IVec2) -> Self {
        OffsetCoordinate(value)
    }
}
