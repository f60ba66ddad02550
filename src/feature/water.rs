use serde::{Deserialize, Serialize};

use crate::spatial::{FeatureArea, Position};

/// A point where groundwater surfaces, with a small pool around it.
#[derive(PartialEq, Clone, Serialize, Deserialize, Debug)]
pub struct Spring {
    pub position: Position,
    /// Discharge in liters per second.
    pub discharge: f64,
    /// Radius of the standing pool in meters. Zero for a seep.
    pub pool_radius: f64,
    pub area: FeatureArea,
}

/// The kind of a wetland, by water source.
#[derive(PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Debug)]
pub enum WetlandKind {
    /// Mineral-fed, reeds and open water patches.
    Marsh,
    /// Rain-fed, acidic, peat-forming.
    Bog,
    /// Groundwater-fed, alkaline.
    Fen,
}

/// Waterlogged ground around rivers, lakes and springs.
#[derive(PartialEq, Clone, Serialize, Deserialize, Debug)]
pub struct Wetland {
    pub area: FeatureArea,
    pub kind: WetlandKind,
    /// Water table depth below the surface in meters. Negative values mean
    /// standing water.
    pub water_table: f64,
}
