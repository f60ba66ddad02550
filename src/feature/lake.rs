use serde::{Deserialize, Serialize};

use crate::spatial::{FeatureArea, Position};

/// How a lake basin formed. Drives depth profile and the shore types the
/// shoreline generator may choose from.
#[derive(PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Debug)]
pub enum LakeFormation {
    Glacial,
    Tectonic,
    Volcanic,
    Fluvial,
}

impl LakeFormation {
    /// The shore types a formation can produce.
    ///
    /// The shoreline generator must only pick from this set, e.g. a volcanic
    /// crater lake has no mud flats.
    pub fn shore_candidates(&self) -> &'static [ShoreType] {
        match self {
            LakeFormation::Glacial => &[ShoreType::Rocky, ShoreType::Sandy, ShoreType::Muddy],
            LakeFormation::Tectonic => &[ShoreType::Cliff, ShoreType::Rocky, ShoreType::Sandy],
            LakeFormation::Volcanic => &[ShoreType::Rocky, ShoreType::Sandy],
            LakeFormation::Fluvial => &[ShoreType::Muddy, ShoreType::Marshy, ShoreType::Sandy],
        }
    }
}

/// The ground type along one stretch of shoreline.
#[derive(PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Debug)]
pub enum ShoreType {
    Rocky,
    Sandy,
    Muddy,
    Marshy,
    Cliff,
}

impl ShoreType {
    /// Whether troops and boats can use this stretch of shore.
    pub fn is_accessible(&self) -> bool {
        !matches!(self, ShoreType::Cliff)
    }
}

/// One point on the shoreline ring of a lake.
#[derive(PartialEq, Clone, Copy, Serialize, Deserialize, Debug)]
pub struct ShorelinePoint {
    pub position: Position,
    pub shore_type: ShoreType,
    pub accessible: bool,
}

/// A standing body of water with an explicit shoreline ring.
#[derive(PartialEq, Clone, Serialize, Deserialize, Debug)]
pub struct Lake {
    pub name: String,
    pub area: FeatureArea,
    /// Mean depth in meters.
    pub average_depth: f64,
    /// Depth at the deepest sounding, in meters.
    pub max_depth: f64,
    pub formation: LakeFormation,
    /// Ordered ring of shoreline points, counter-clockwise.
    pub shoreline: Vec<ShorelinePoint>,
    pub islands: Vec<Position>,
    /// Positions where rivers feed the lake.
    pub inlets: Vec<Position>,
    /// Positions where water leaves the lake.
    pub outlets: Vec<Position>,
}

impl Lake {
    /// Checks that every shoreline point uses a shore type the formation
    /// permits.
    pub fn shoreline_conforms_to_formation(&self) -> bool {
        let candidates = self.formation.shore_candidates();
        self.shoreline
            .iter()
            .all(|point| candidates.contains(&point.shore_type))
    }
}
