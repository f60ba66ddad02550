//! Spatial value objects shared by every layer: absolute positions,
//! sub-tile positions, dimensions and rectangular feature areas.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::{error::GenerationError, grid::OffsetCoordinate};

/// An absolute position on the map, in map units (tiles); multiply by the
/// map's cell size for meters.
///
/// Both components are always finite; construction rejects NaN and
/// infinities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position(DVec2);

impl Position {
    pub fn new(x: f64, y: f64) -> Result<Self, GenerationError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(GenerationError::validation(
                "POSITION_NOT_FINITE",
                "spatial",
                "position components must be finite",
                format!("({x}, {y})"),
                "finite f64 pairs",
            ));
        }
        Ok(Self(DVec2::new(x, y)))
    }

    /// Builds a position from components known to be finite.
    ///
    /// Used by generators composing positions from already-validated values.
    pub(crate) fn from_finite(x: f64, y: f64) -> Self {
        debug_assert!(x.is_finite() && y.is_finite());
        Self(DVec2::new(x, y))
    }

    #[inline]
    pub const fn x(&self) -> f64 {
        self.0.x
    }

    #[inline]
    pub const fn y(&self) -> f64 {
        self.0.y
    }

    /// Euclidean distance to another position.
    pub fn distance_to(&self, other: &Position) -> f64 {
        self.0.distance(other.0)
    }
}

/// A position expressed as a tile coordinate plus a fractional offset
/// within that tile.
///
/// Invariant: both offset components are in `[0, 1)`; the tile coordinate
/// is an integer grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubTilePosition {
    tile: OffsetCoordinate,
    offset: DVec2,
}

impl SubTilePosition {
    pub fn new(
        tile: OffsetCoordinate,
        offset_x: f64,
        offset_y: f64,
    ) -> Result<Self, GenerationError> {
        if !(0.0..1.0).contains(&offset_x) || !(0.0..1.0).contains(&offset_y) {
            return Err(GenerationError::validation(
                "SUBTILE_OFFSET_OUT_OF_RANGE",
                "spatial",
                "sub-tile offsets must lie within the tile",
                format!("({offset_x}, {offset_y})"),
                "[0, 1) per component",
            ));
        }
        Ok(Self {
            tile,
            offset: DVec2::new(offset_x, offset_y),
        })
    }

    #[inline]
    pub const fn tile(&self) -> OffsetCoordinate {
        self.tile
    }

    #[inline]
    pub const fn offset_x(&self) -> f64 {
        self.offset.x
    }

    #[inline]
    pub const fn offset_y(&self) -> f64 {
        self.offset.y
    }

    /// Composes the tile coordinate and offset into an absolute position.
    pub fn to_position(&self, cell_size: f64) -> Position {
        Position::from_finite(
            (self.tile.0.x as f64 + self.offset.x) * cell_size,
            (self.tile.0.y as f64 + self.offset.y) * cell_size,
        )
    }
}

/// Positive integer width and height, in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    width: u32,
    height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Result<Self, GenerationError> {
        if width == 0 || height == 0 {
            return Err(GenerationError::validation(
                "DIMENSIONS_NOT_POSITIVE",
                "spatial",
                "dimensions must be positive",
                format!("{width}x{height}"),
                "width >= 1 and height >= 1",
            ));
        }
        Ok(Self { width, height })
    }

    /// The 1×1 dimensions of a single tile.
    pub const fn unit() -> Self {
        Self {
            width: 1,
            height: 1,
        }
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    pub const fn area(&self) -> u32 {
        self.width * self.height
    }
}

/// The rectangular area a feature occupies: an origin position plus
/// dimensions, in tile units.
///
/// Containment treats the rectangle as half-open, `[x, x + width)`, so
/// adjacent areas that share an edge do not intersect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureArea {
    origin: Position,
    dimensions: Dimensions,
}

impl FeatureArea {
    pub fn new(origin: Position, dimensions: Dimensions) -> Self {
        Self { origin, dimensions }
    }

    #[inline]
    pub const fn origin(&self) -> Position {
        self.origin
    }

    #[inline]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn center(&self) -> Position {
        Position::from_finite(
            self.origin.x() + self.dimensions.width as f64 / 2.0,
            self.origin.y() + self.dimensions.height as f64 / 2.0,
        )
    }

    /// Whether the position lies within this area.
    pub fn contains(&self, position: &Position) -> bool {
        position.x() >= self.origin.x()
            && position.x() < self.origin.x() + self.dimensions.width as f64
            && position.y() >= self.origin.y()
            && position.y() < self.origin.y() + self.dimensions.height as f64
    }

    /// Axis-aligned rectangular intersection test.
    pub fn intersects(&self, other: &FeatureArea) -> bool {
        self.origin.x() < other.origin.x() + other.dimensions.width as f64
            && other.origin.x() < self.origin.x() + self.dimensions.width as f64
            && self.origin.y() < other.origin.y() + other.dimensions.height as f64
            && other.origin.y() < self.origin.y() + self.dimensions.height as f64
    }

    /// The smallest area containing both rectangles.
    pub fn union(&self, other: &FeatureArea) -> FeatureArea {
        let min_x = self.origin.x().min(other.origin.x());
        let min_y = self.origin.y().min(other.origin.y());
        let max_x = (self.origin.x() + self.dimensions.width as f64)
            .max(other.origin.x() + other.dimensions.width as f64);
        let max_y = (self.origin.y() + self.dimensions.height as f64)
            .max(other.origin.y() + other.dimensions.height as f64);
        FeatureArea {
            origin: Position::from_finite(min_x, min_y),
            // Rounded up so the union always covers both inputs.
            dimensions: Dimensions {
                width: (max_x - min_x).ceil() as u32,
                height: (max_y - min_y).ceil() as u32,
            },
        }
    }

    /// The area of a single tile.
    pub fn tile(coordinate: OffsetCoordinate) -> FeatureArea {
        FeatureArea {
            origin: Position::from_finite(coordinate.0.x as f64, coordinate.0.y as f64),
            dimensions: Dimensions {
                width: 1,
                height: 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Dimensions, FeatureArea, Position, SubTilePosition};
    use crate::grid::OffsetCoordinate;

    #[test]
    fn position_rejects_non_finite_components() {
        assert!(Position::new(f64::NAN, 0.0).is_err());
        assert!(Position::new(0.0, f64::INFINITY).is_err());
        let position = Position::new(3.0, 4.0).unwrap();
        let origin = Position::new(0.0, 0.0).unwrap();
        assert_eq!(origin.distance_to(&position), 5.0);
    }

    #[test]
    fn sub_tile_offsets_are_bounded() {
        let tile = OffsetCoordinate::new(2, 3);
        assert!(SubTilePosition::new(tile, 1.0, 0.0).is_err());
        assert!(SubTilePosition::new(tile, -0.1, 0.5).is_err());

        let sub_tile = SubTilePosition::new(tile, 0.5, 0.25).unwrap();
        let position = sub_tile.to_position(2.0);
        assert_eq!(position.x(), 5.0);
        assert_eq!(position.y(), 6.5);
    }

    #[test]
    fn dimensions_must_be_positive() {
        assert!(Dimensions::new(0, 5).is_err());
        assert!(Dimensions::new(5, 0).is_err());
        assert_eq!(Dimensions::new(4, 3).unwrap().area(), 12);
    }

    #[test]
    fn area_containment_and_intersection() {
        let area = FeatureArea::new(
            Position::new(2.0, 2.0).unwrap(),
            Dimensions::new(4, 3).unwrap(),
        );
        assert!(area.contains(&Position::new(2.0, 2.0).unwrap()));
        assert!(area.contains(&Position::new(5.9, 4.9).unwrap()));
        assert!(!area.contains(&Position::new(6.0, 3.0).unwrap()));

        let disjoint = FeatureArea::new(
            Position::new(6.0, 2.0).unwrap(),
            Dimensions::new(2, 2).unwrap(),
        );
        assert!(!area.intersects(&disjoint));

        let overlapping = FeatureArea::new(
            Position::new(5.0, 4.0).unwrap(),
            Dimensions::new(2, 2).unwrap(),
        );
        assert!(area.intersects(&overlapping));
        assert!(overlapping.intersects(&area));
    }
}
