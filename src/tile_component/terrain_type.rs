use serde::{Deserialize, Serialize};

/// The coarse terrain class of a tile, assigned by the topography layer
/// from elevation quantiles and the requested terrain distribution weights.
#[derive(PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Debug)]
pub enum TerrainType {
    Water,
    Flatland,
    Hill,
    Mountain,
}

impl TerrainType {
    pub fn name(&self) -> &str {
        match self {
            TerrainType::Water => "Water",
            TerrainType::Flatland => "Flatland",
            TerrainType::Hill => "Hill",
            TerrainType::Mountain => "Mountain",
        }
    }

    /// Whether ground units can enter a tile of this type at all.
    pub fn is_passable(&self) -> bool {
        !matches!(self, TerrainType::Mountain)
    }

    /// The height multiplier contributed by the terrain class alone.
    pub fn height_multiplier(&self) -> f64 {
        match self {
            TerrainType::Water => 0.0,
            TerrainType::Flatland => 1.0,
            TerrainType::Hill => 1.5,
            TerrainType::Mountain => 2.5,
        }
    }

    /// The base movement cost factor before features are mixed in.
    pub fn movement_factor(&self) -> f64 {
        match self {
            TerrainType::Water => 4.0,
            TerrainType::Flatland => 1.0,
            TerrainType::Hill => 1.5,
            TerrainType::Mountain => f64::INFINITY,
        }
    }
}
