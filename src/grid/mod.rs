//! The square tile grid the battle map is built on.
//!
//! The grid is purely geometric: it knows about sizes, coordinates and
//! neighborhood, never about terrain. Per-tile data lives in
//! [`TileMap`](crate::tile_map::TileMap).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub mod direction;
pub mod offset_coordinate;

pub use direction::Direction;
pub use offset_coordinate::OffsetCoordinate;

/// The size of a grid in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The number of tiles in a grid of this size.
    pub const fn area(&self) -> u32 {
        self.width * self.height
    }
}

bitflags! {
    /// Wrapping behavior of a grid axis.
    ///
    /// Battle maps never wrap; the flags exist because the noise lattice
    /// shares this grid plumbing and can be asked for tileable fields.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct WrapFlags: u8 {
        const WrapX = 0b00000001;
        const WrapY = 0b00000010;
    }
}

/// A rectangular grid of square tiles with 8-way adjacency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareGrid {
    pub size: Size,
    pub wrap_flags: WrapFlags,
}

impl SquareGrid {
    /// Creates a non-wrapping grid of the given size.
    pub const fn new(size: Size) -> Self {
        Self {
            size,
            wrap_flags: WrapFlags::empty(),
        }
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.size.width
    }

    #[inline]
    pub const fn height(&self) -> u32 {
        self.size.height
    }

    /// Normalizes a coordinate and converts it to a tile index.
    ///
    /// Returns `None` when the coordinate falls outside the grid after any
    /// wrapping is applied.
    pub fn index_of(&self, offset_coordinate: OffsetCoordinate) -> Option<usize> {
        let width = self.size.width as i32;
        let height = self.size.height as i32;
        let [mut x, mut y] = offset_coordinate.to_array();

        if self.wrap_flags.contains(WrapFlags::WrapX) {
            x = x.rem_euclid(width);
        }
        if self.wrap_flags.contains(WrapFlags::WrapY) {
            y = y.rem_euclid(height);
        }

        if x >= 0 && x < width && y >= 0 && y < height {
            Some((x + y * width) as usize)
        } else {
            None
        }
    }

    /// Converts a tile index back to its offset coordinate.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds for the grid size.
    pub fn offset_of(&self, index: usize) -> OffsetCoordinate {
        assert!(
            index < self.size.area() as usize,
            "Index out of bounds"
        );
        let x = index as i32 % self.size.width as i32;
        let y = index as i32 / self.size.width as i32;
        OffsetCoordinate::new(x, y)
    }

    /// Whether the coordinate lies on the outer rim of the grid.
    pub fn is_on_edge(&self, offset_coordinate: OffsetCoordinate) -> bool {
        let [x, y] = offset_coordinate.to_array();
        x == 0
            || y == 0
            || x == self.size.width as i32 - 1
            || y == self.size.height as i32 - 1
    }
}

#[cfg(test)]
mod tests {
    use super::{Size, SquareGrid};
    use crate::grid::OffsetCoordinate;

    #[test]
    fn index_round_trip() {
        let grid = SquareGrid::new(Size::new(5, 4));
        for index in 0..20 {
            assert_eq!(grid.index_of(grid.offset_of(index)), Some(index));
        }
        assert_eq!(grid.index_of(OffsetCoordinate::new(5, 0)), None);
        assert_eq!(grid.index_of(OffsetCoordinate::new(0, -1)), None);
    }

    #[test]
    fn edge_detection() {
        let grid = SquareGrid::new(Size::new(4, 4));
        assert!(grid.is_on_edge(OffsetCoordinate::new(0, 2)));
        assert!(grid.is_on_edge(OffsetCoordinate::new(3, 1)));
        assert!(!grid.is_on_edge(OffsetCoordinate::new(2, 2)));
    }
}
