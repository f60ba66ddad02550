use serde::{Deserialize, Serialize};

use crate::{
    error::GenerationError,
    grid::Direction,
    map_parameters::Biome,
    spatial::{FeatureArea, Position},
};

/// Footprint edge bounds, in tiles.
pub const FOOTPRINT_EDGE_RANGE: std::ops::RangeInclusive<u32> = 1..=40;

/// The ground plan a building occupies, used for collision checks and
/// shared-wall detection.
#[derive(PartialEq, Clone, Copy, Serialize, Deserialize, Debug)]
pub struct Footprint {
    area: FeatureArea,
}

impl Footprint {
    /// Creates a rectangular footprint, validating the edge bounds.
    pub fn rectangular(area: FeatureArea) -> Result<Self, GenerationError> {
        let dimensions = area.dimensions();
        if !FOOTPRINT_EDGE_RANGE.contains(&dimensions.width())
            || !FOOTPRINT_EDGE_RANGE.contains(&dimensions.height())
        {
            return Err(GenerationError::validation(
                "FOOTPRINT_OUT_OF_RANGE",
                "structures",
                "footprint edge is outside the valid range",
                format!("{}x{}", dimensions.width(), dimensions.height()),
                "1..=40 tiles per edge",
            ));
        }
        Ok(Self { area })
    }

    #[inline]
    pub fn area(&self) -> &FeatureArea {
        &self.area
    }

    /// Footprint area in square tiles.
    pub fn floor_area(&self) -> f64 {
        self.area.dimensions().area() as f64
    }

    pub fn perimeter(&self) -> f64 {
        2.0 * (self.area.dimensions().width() as f64 + self.area.dimensions().height() as f64)
    }

    pub fn center(&self) -> Position {
        self.area.center()
    }

    /// Axis-aligned overlap test against another footprint.
    pub fn intersects(&self, other: &Footprint) -> bool {
        self.area.intersects(&other.area)
    }
}

/// The kind of a placed building.
#[derive(PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Debug)]
pub enum BuildingKind {
    Cottage,
    Farmhouse,
    Watchtower,
    Barn,
    Chapel,
}

impl BuildingKind {
    pub fn name(&self) -> &str {
        match self {
            BuildingKind::Cottage => "Cottage",
            BuildingKind::Farmhouse => "Farmhouse",
            BuildingKind::Watchtower => "Watchtower",
            BuildingKind::Barn => "Barn",
            BuildingKind::Chapel => "Chapel",
        }
    }

    /// Footprint edge lengths typical for the kind, in tiles.
    pub fn footprint_edges(&self) -> (u32, u32) {
        match self {
            BuildingKind::Cottage => (2, 2),
            BuildingKind::Farmhouse => (3, 2),
            BuildingKind::Watchtower => (1, 1),
            BuildingKind::Barn => (4, 2),
            BuildingKind::Chapel => (3, 3),
        }
    }

    /// Floors above ground, including the ground floor.
    pub fn above_ground_floors(&self) -> i32 {
        match self {
            BuildingKind::Watchtower => 3,
            BuildingKind::Chapel => 2,
            BuildingKind::Cottage | BuildingKind::Farmhouse => 2,
            BuildingKind::Barn => 1,
        }
    }

    /// Whether the kind gets a basement floor.
    pub fn has_basement(&self) -> bool {
        matches!(self, BuildingKind::Farmhouse | BuildingKind::Chapel)
    }

    /// The steepest slope the kind's foundation tolerates, in elevation
    /// units per tile.
    pub fn max_foundation_slope(&self) -> f64 {
        match self {
            BuildingKind::Watchtower => 0.20,
            BuildingKind::Chapel => 0.06,
            BuildingKind::Barn => 0.08,
            BuildingKind::Cottage | BuildingKind::Farmhouse => 0.10,
        }
    }
}

/// Wall construction of a building.
#[derive(PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Debug)]
pub enum WallMaterial {
    Timber,
    Stone,
    Brick,
    WattleAndDaub,
}

impl WallMaterial {
    /// Structural durability in `[0, 1]`.
    pub fn durability(&self) -> f64 {
        match self {
            WallMaterial::Stone => 0.95,
            WallMaterial::Brick => 0.85,
            WallMaterial::Timber => 0.6,
            WallMaterial::WattleAndDaub => 0.35,
        }
    }

    /// Resistance to rain and standing moisture in `[0, 1]`.
    pub fn weather_resistance(&self) -> f64 {
        match self {
            WallMaterial::Stone => 0.9,
            WallMaterial::Brick => 0.8,
            WallMaterial::Timber => 0.5,
            WallMaterial::WattleAndDaub => 0.25,
        }
    }

    /// Relative construction cost.
    pub fn cost(&self) -> f64 {
        match self {
            WallMaterial::Stone => 4.0,
            WallMaterial::Brick => 3.0,
            WallMaterial::Timber => 1.5,
            WallMaterial::WattleAndDaub => 1.0,
        }
    }

    /// Whether the material holds up in the biome's climate.
    ///
    /// Wattle-and-daub dissolves in wetlands; unfired brick fares badly
    /// there too.
    pub fn suits_biome(&self, biome: Biome) -> bool {
        match biome {
            Biome::Wetland => matches!(self, WallMaterial::Stone | WallMaterial::Timber),
            Biome::Alpine => matches!(self, WallMaterial::Stone | WallMaterial::Timber),
            _ => true,
        }
    }
}

/// The identity of a room within its building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(pub u32);

/// The use of a room.
#[derive(PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Debug)]
pub enum RoomKind {
    Hall,
    Chamber,
    Kitchen,
    Storage,
    Stable,
    Cellar,
}

/// A room on one floor of a building.
///
/// Connectivity is stored as room ids, mirrored on both endpoints, so the
/// room graph has no ownership cycles.
#[derive(PartialEq, Clone, Serialize, Deserialize, Debug)]
pub struct Room {
    pub id: RoomId,
    pub kind: RoomKind,
    /// Floor area in square tiles.
    pub area: f64,
    pub connections: Vec<RoomId>,
}

/// One floor of a building. Ground floor is level 0, upper floors are
/// positive, basements negative.
#[derive(PartialEq, Clone, Serialize, Deserialize, Debug)]
pub struct Floor {
    pub level: i32,
    /// Total usable area of the floor, in square tiles.
    pub footprint_area: f64,
    rooms: Vec<Room>,
}

impl Floor {
    pub fn new(level: i32, footprint_area: f64) -> Self {
        Self {
            level,
            footprint_area,
            rooms: Vec::new(),
        }
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Area not yet claimed by rooms, in square tiles.
    pub fn remaining_area(&self) -> f64 {
        self.footprint_area - self.rooms.iter().map(|room| room.area).sum::<f64>()
    }

    /// Adds a room; fails if the floor's remaining area cannot hold it.
    pub fn add_room(&mut self, room: Room) -> Result<(), GenerationError> {
        if room.area > self.remaining_area() + 1e-9 {
            return Err(GenerationError::domain_rule(
                "ROOM_EXCEEDS_FLOOR_AREA",
                "structures",
                format!(
                    "room of {} tiles does not fit the remaining {:.2} tiles on level {}",
                    room.area,
                    self.remaining_area(),
                    self.level
                ),
            ));
        }
        self.rooms.push(room);
        Ok(())
    }

    fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|room| room.id == id)
    }

    /// Records a bidirectional connection between two rooms on this floor.
    pub fn connect_rooms(&mut self, a: RoomId, b: RoomId) {
        if let Some(room) = self.room_mut(a)
            && !room.connections.contains(&b)
        {
            room.connections.push(b);
        }
        if let Some(room) = self.room_mut(b)
            && !room.connections.contains(&a)
        {
            room.connections.push(a);
        }
    }
}

/// A placed building with floors and rooms.
#[derive(PartialEq, Clone, Serialize, Deserialize, Debug)]
pub struct Building {
    pub name: String,
    pub kind: BuildingKind,
    pub footprint: Footprint,
    /// The compass direction the main entrance faces.
    pub orientation: Direction,
    pub material: WallMaterial,
    /// Structural condition in `[0, 1]`.
    pub condition: f64,
    pub age_years: u32,
    /// Floors ordered bottom-up; the element with `level == 0` is the
    /// ground floor.
    floors: Vec<Floor>,
}

impl Building {
    pub fn new(
        name: String,
        kind: BuildingKind,
        footprint: Footprint,
        orientation: Direction,
        material: WallMaterial,
        condition: f64,
        age_years: u32,
    ) -> Self {
        let floor_area = footprint.floor_area();
        let lowest = if kind.has_basement() { -1 } else { 0 };
        let floors = (lowest..kind.above_ground_floors())
            .map(|level| Floor::new(level, floor_area))
            .collect();
        Self {
            name,
            kind,
            footprint,
            orientation,
            material,
            condition,
            age_years,
            floors,
        }
    }

    pub fn floors(&self) -> &[Floor] {
        &self.floors
    }

    pub fn floor_mut(&mut self, level: i32) -> Option<&mut Floor> {
        self.floors.iter_mut().find(|floor| floor.level == level)
    }

    pub fn ground_floor(&self) -> &Floor {
        self.floors
            .iter()
            .find(|floor| floor.level == 0)
            .expect("every building has a ground floor")
    }

    /// Total height of the above-ground volume, in meters.
    pub fn height(&self) -> f64 {
        const FLOOR_HEIGHT: f64 = 2.8;
        self.floors.iter().filter(|floor| floor.level >= 0).count() as f64 * FLOOR_HEIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Building, BuildingKind, Footprint, Room, RoomId, RoomKind, WallMaterial,
    };
    use crate::{
        grid::Direction,
        spatial::{Dimensions, FeatureArea, Position},
    };

    fn footprint(x: f64, y: f64, w: u32, h: u32) -> Footprint {
        Footprint::rectangular(FeatureArea::new(
            Position::new(x, y).unwrap(),
            Dimensions::new(w, h).unwrap(),
        ))
        .unwrap()
    }

    #[test]
    fn footprint_edges_are_bounded() {
        let oversized = FeatureArea::new(
            Position::new(0.0, 0.0).unwrap(),
            Dimensions::new(41, 2).unwrap(),
        );
        let error = Footprint::rectangular(oversized).unwrap_err();
        assert_eq!(error.code(), "FOOTPRINT_OUT_OF_RANGE");

        assert!(Footprint::rectangular(FeatureArea::new(
            Position::new(0.0, 0.0).unwrap(),
            Dimensions::new(40, 1).unwrap(),
        ))
        .is_ok());
    }

    #[test]
    fn footprint_overlap_is_detected() {
        let a = footprint(0.0, 0.0, 3, 3);
        let b = footprint(2.0, 2.0, 3, 3);
        let c = footprint(3.0, 0.0, 2, 2);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn rooms_cannot_exceed_the_floor_area() {
        let mut building = Building::new(
            "old farmhouse".to_owned(),
            BuildingKind::Farmhouse,
            footprint(5.0, 5.0, 3, 2),
            Direction::South,
            WallMaterial::Timber,
            0.7,
            40,
        );

        let ground = building.floor_mut(0).unwrap();
        ground
            .add_room(Room {
                id: RoomId(0),
                kind: RoomKind::Hall,
                area: 4.0,
                connections: Vec::new(),
            })
            .unwrap();
        let error = ground
            .add_room(Room {
                id: RoomId(1),
                kind: RoomKind::Kitchen,
                area: 3.0,
                connections: Vec::new(),
            })
            .unwrap_err();
        assert_eq!(error.code(), "ROOM_EXCEEDS_FLOOR_AREA");

        // A room that exactly fills the rest is fine.
        ground
            .add_room(Room {
                id: RoomId(2),
                kind: RoomKind::Storage,
                area: 2.0,
                connections: Vec::new(),
            })
            .unwrap();
    }

    #[test]
    fn room_connections_are_bidirectional() {
        let mut building = Building::new(
            "chapel".to_owned(),
            BuildingKind::Chapel,
            footprint(0.0, 0.0, 3, 3),
            Direction::East,
            WallMaterial::Stone,
            0.9,
            120,
        );
        let floor = building.floor_mut(0).unwrap();
        for (id, area) in [(0, 5.0), (1, 4.0)] {
            floor
                .add_room(Room {
                    id: RoomId(id),
                    kind: RoomKind::Hall,
                    area,
                    connections: Vec::new(),
                })
                .unwrap();
        }
        floor.connect_rooms(RoomId(0), RoomId(1));
        floor.connect_rooms(RoomId(0), RoomId(1));

        let rooms = floor.rooms();
        assert_eq!(rooms[0].connections, vec![RoomId(1)]);
        assert_eq!(rooms[1].connections, vec![RoomId(0)]);
    }

    #[test]
    fn farmhouse_has_a_basement_and_two_storeys() {
        let building = Building::new(
            "farm".to_owned(),
            BuildingKind::Farmhouse,
            footprint(0.0, 0.0, 3, 2),
            Direction::North,
            WallMaterial::Stone,
            1.0,
            5,
        );
        let levels: Vec<i32> = building.floors().iter().map(|floor| floor.level).collect();
        assert_eq!(levels, vec![-1, 0, 1]);
    }
}
