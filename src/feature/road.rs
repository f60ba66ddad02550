use serde::{Deserialize, Serialize};

use crate::{
    feature::FeatureId,
    grid::Direction,
    spatial::{FeatureArea, Position},
};

/// Road surface construction.
#[derive(PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Debug)]
pub enum RoadSurface {
    Dirt,
    Gravel,
    Cobblestone,
}

impl RoadSurface {
    /// Movement cost factor on the road surface. Below `1.0` because roads
    /// are faster than open ground.
    pub fn movement_factor(&self) -> f64 {
        match self {
            RoadSurface::Dirt => 0.9,
            RoadSurface::Gravel => 0.75,
            RoadSurface::Cobblestone => 0.6,
        }
    }
}

/// A road: an ordered path of positions along tile centers.
#[derive(PartialEq, Clone, Serialize, Deserialize, Debug)]
pub struct Road {
    pub name: String,
    pub area: FeatureArea,
    pub path: Vec<Position>,
    /// Width in meters.
    pub width: f64,
    pub surface: RoadSurface,
}

/// A bridge carrying a road over a river.
#[derive(PartialEq, Clone, Serialize, Deserialize, Debug)]
pub struct Bridge {
    pub name: String,
    pub area: FeatureArea,
    pub position: Position,
    /// The direction the deck runs.
    pub span_direction: Direction,
    pub deck_material: BridgeDeck,
    /// The river this bridge crosses.
    pub crossed_river: FeatureId,
}

/// Bridge deck construction.
#[derive(PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Debug)]
pub enum BridgeDeck {
    Timber,
    Stone,
}
