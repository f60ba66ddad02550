use arrayvec::ArrayVec;

use crate::{
    feature::FeatureId,
    grid::{Direction, OffsetCoordinate, SquareGrid},
    spatial::Position,
    tile_component::{
        GeologySummary, HydrologySummary, TacticalProperties, TerrainType, TopographySummary,
        VegetationSummary,
    },
};

use super::TileMap;

/// `Tile` represents a tile on the map, where the `usize` is the index of
/// the current tile in the per-component lists of the [`TileMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tile(usize);

impl Tile {
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the index of the tile.
    #[inline]
    pub const fn index(&self) -> usize {
        self.0
    }

    /// Converts an offset coordinate to the corresponding tile.
    ///
    /// Returns `None` when the coordinate is outside the grid.
    pub fn from_offset_coordinate(
        grid: &SquareGrid,
        offset_coordinate: OffsetCoordinate,
    ) -> Option<Self> {
        grid.index_of(offset_coordinate).map(Self)
    }

    /// Converts the tile to its offset coordinate.
    pub fn to_offset_coordinate(&self, grid: &SquareGrid) -> OffsetCoordinate {
        grid.offset_of(self.0)
    }

    /// The absolute position of the tile center, in world units.
    pub fn center_position(&self, tile_map: &TileMap) -> Position {
        let offset = self.to_offset_coordinate(&tile_map.grid);
        Position::from_finite(
            (offset.0.x as f64 + 0.5) * tile_map.cell_size,
            (offset.0.y as f64 + 0.5) * tile_map.cell_size,
        )
    }

    /// The neighbor tile in the given direction, if it is inside the grid.
    pub fn neighbor_tile(&self, direction: Direction, grid: &SquareGrid) -> Option<Tile> {
        Self::from_offset_coordinate(grid, self.to_offset_coordinate(grid).step(direction))
    }

    /// All neighbor tiles inside the grid, in canonical direction order.
    pub fn neighbor_tiles(&self, grid: &SquareGrid) -> ArrayVec<Tile, 8> {
        Direction::ALL_NEIGHBORS
            .iter()
            .filter_map(|&direction| self.neighbor_tile(direction, grid))
            .collect()
    }

    /// Whether the tile lies on the outer rim of the map.
    pub fn is_on_edge(&self, grid: &SquareGrid) -> bool {
        grid.is_on_edge(self.to_offset_coordinate(grid))
    }

    pub fn terrain_type(&self, tile_map: &TileMap) -> TerrainType {
        tile_map.terrain_type_list[self.0]
    }

    pub fn geology(&self, tile_map: &TileMap) -> GeologySummary {
        tile_map.geology_list[self.0]
    }

    pub fn topography(&self, tile_map: &TileMap) -> TopographySummary {
        tile_map.topography_list[self.0]
    }

    pub fn hydrology(&self, tile_map: &TileMap) -> HydrologySummary {
        tile_map.hydrology_list[self.0]
    }

    pub fn vegetation(&self, tile_map: &TileMap) -> VegetationSummary {
        tile_map.vegetation_list[self.0]
    }

    pub fn tactical(&self, tile_map: &TileMap) -> TacticalProperties {
        tile_map.tactical_list[self.0]
    }

    /// The dominant feature on the tile, if any feature claimed it.
    pub fn primary_feature(&self, tile_map: &TileMap) -> Option<FeatureId> {
        tile_map.primary_feature_list[self.0]
    }

    /// The non-primary features sharing the tile, sorted by id.
    pub fn mixed_features<'a>(&self, tile_map: &'a TileMap) -> &'a [FeatureId] {
        &tile_map.mixed_feature_list[self.0]
    }

    /// Whether any water feature or water terrain touches the tile.
    pub fn is_water(&self, tile_map: &TileMap) -> bool {
        self.terrain_type(tile_map) == TerrainType::Water
            || tile_map.hydrology_list[self.0].water_depth > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::Tile;
    use crate::grid::{Direction, OffsetCoordinate, Size, SquareGrid};

    #[test]
    fn neighbors_respect_the_grid_boundary() {
        let grid = SquareGrid::new(Size::new(4, 3));
        let corner = Tile::from_offset_coordinate(&grid, OffsetCoordinate::new(0, 0)).unwrap();
        assert_eq!(corner.neighbor_tiles(&grid).len(), 3);
        assert!(corner.neighbor_tile(Direction::West, &grid).is_none());

        let center = Tile::from_offset_coordinate(&grid, OffsetCoordinate::new(1, 1)).unwrap();
        assert_eq!(center.neighbor_tiles(&grid).len(), 8);
    }
}
