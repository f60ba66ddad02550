use enum_map::Enum;
use serde::{Deserialize, Serialize};

/// One tactical aspect a feature can dominate on a shared tile.
///
/// The mixing engine resolves a dominant feature per aspect, so a bridge
/// can own movement on a tile whose visual aspect belongs to the river.
#[derive(Enum, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Debug)]
pub enum TacticalAspect {
    Terrain,
    Height,
    Movement,
    Blocking,
    Visual,
}

/// Protection from direct fire contributed by a tile.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize, Debug, Default)]
pub enum CoverLevel {
    #[default]
    None,
    Light,
    Medium,
    Heavy,
}

/// Protection from observation contributed by a tile.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Serialize, Deserialize, Debug, Default)]
pub enum ConcealmentLevel {
    #[default]
    None,
    Light,
    Medium,
    Heavy,
}

/// The resolved tactical properties of a tile, written by the feature
/// mixing engine after all placement stages.
#[derive(PartialEq, Clone, Copy, Serialize, Deserialize, Debug)]
pub struct TacticalProperties {
    /// Multiplicative movement cost. `1.0` is open flat ground;
    /// `f64::INFINITY` is impassable.
    pub movement_cost: f64,
    pub cover: CoverLevel,
    pub concealment: ConcealmentLevel,
    /// Height the resolved features add on top of the terrain, in meters.
    /// Synergistic features average their contributions.
    pub feature_height: f64,
}

impl Default for TacticalProperties {
    fn default() -> Self {
        Self {
            movement_cost: 1.0,
            cover: CoverLevel::None,
            concealment: ConcealmentLevel::None,
            feature_height: 0.0,
        }
    }
}
