use serde::{Deserialize, Serialize};

use crate::map_parameters::Biome;

/// The bedrock underlying a tile.
#[derive(PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Debug)]
pub enum BedrockType {
    Granite,
    Limestone,
    Sandstone,
    Basalt,
    Shale,
}

impl BedrockType {
    pub fn name(&self) -> &str {
        match self {
            BedrockType::Granite => "Granite",
            BedrockType::Limestone => "Limestone",
            BedrockType::Sandstone => "Sandstone",
            BedrockType::Basalt => "Basalt",
            BedrockType::Shale => "Shale",
        }
    }

    /// Relative resistance to erosion, in `[0, 1]`. Harder bedrock keeps
    /// more of the raw noise relief in the topography layer.
    pub fn hardness(&self) -> f64 {
        match self {
            BedrockType::Granite => 0.9,
            BedrockType::Basalt => 0.8,
            BedrockType::Limestone => 0.5,
            BedrockType::Sandstone => 0.4,
            BedrockType::Shale => 0.3,
        }
    }

    /// Base water permeability, in `[0, 1]`. Limestone karst drains well,
    /// shale holds water at the surface.
    pub fn base_permeability(&self) -> f64 {
        match self {
            BedrockType::Granite => 0.2,
            BedrockType::Basalt => 0.3,
            BedrockType::Limestone => 0.8,
            BedrockType::Sandstone => 0.7,
            BedrockType::Shale => 0.1,
        }
    }

    /// The bedrock candidates of a biome, ordered from most to least
    /// common. The geology layer picks among these by noise threshold.
    pub fn candidates_for_biome(biome: Biome) -> &'static [BedrockType] {
        match biome {
            Biome::TemperateForest => &[
                BedrockType::Limestone,
                BedrockType::Granite,
                BedrockType::Shale,
            ],
            Biome::Grassland => &[
                BedrockType::Sandstone,
                BedrockType::Limestone,
                BedrockType::Shale,
            ],
            Biome::Alpine => &[
                BedrockType::Granite,
                BedrockType::Basalt,
                BedrockType::Limestone,
            ],
            Biome::Wetland => &[
                BedrockType::Shale,
                BedrockType::Limestone,
                BedrockType::Sandstone,
            ],
            Biome::Arid => &[
                BedrockType::Sandstone,
                BedrockType::Basalt,
                BedrockType::Granite,
            ],
        }
    }

    /// Whether this bedrock can host dissolution caves and sinkholes.
    pub fn is_karstic(&self) -> bool {
        matches!(self, BedrockType::Limestone)
    }
}

/// A point geologic feature on a tile.
#[derive(PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Debug)]
pub enum GeologicFeature {
    Cave,
    Sinkhole,
    RockOutcrop,
}

/// The geology layer's output for one tile.
#[derive(PartialEq, Clone, Copy, Serialize, Deserialize, Debug)]
pub struct GeologySummary {
    pub bedrock: BedrockType,
    /// Soil depth in meters. Zero is exposed rock.
    pub soil_depth: f64,
    /// Effective permeability in `[0, 1]`, bedrock base jittered by noise.
    pub permeability: f64,
    pub point_feature: Option<GeologicFeature>,
}
