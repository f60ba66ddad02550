use serde::{Deserialize, Serialize};

use crate::map_parameters::Biome;

/// Tree species placeable by the vegetation layer.
#[derive(PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Debug, Hash)]
pub enum TreeSpecies {
    Oak,
    Birch,
    Pine,
    Spruce,
    Willow,
    Alder,
}

impl TreeSpecies {
    pub fn name(&self) -> &str {
        match self {
            TreeSpecies::Oak => "Oak",
            TreeSpecies::Birch => "Birch",
            TreeSpecies::Pine => "Pine",
            TreeSpecies::Spruce => "Spruce",
            TreeSpecies::Willow => "Willow",
            TreeSpecies::Alder => "Alder",
        }
    }

    /// Mature canopy radius in meters.
    pub fn canopy_radius(&self) -> f64 {
        match self {
            TreeSpecies::Oak => 6.0,
            TreeSpecies::Birch => 3.5,
            TreeSpecies::Pine => 4.0,
            TreeSpecies::Spruce => 3.0,
            TreeSpecies::Willow => 5.0,
            TreeSpecies::Alder => 4.0,
        }
    }

    /// Mature height in meters.
    pub fn mature_height(&self) -> f64 {
        match self {
            TreeSpecies::Oak => 22.0,
            TreeSpecies::Birch => 18.0,
            TreeSpecies::Pine => 28.0,
            TreeSpecies::Spruce => 30.0,
            TreeSpecies::Willow => 12.0,
            TreeSpecies::Alder => 16.0,
        }
    }

    /// Fraction of light the mature canopy blocks, in `[0, 1]`.
    pub fn canopy_density(&self) -> f64 {
        match self {
            TreeSpecies::Oak => 0.8,
            TreeSpecies::Birch => 0.5,
            TreeSpecies::Pine => 0.6,
            TreeSpecies::Spruce => 0.85,
            TreeSpecies::Willow => 0.7,
            TreeSpecies::Alder => 0.6,
        }
    }

    /// Whether two species can inosculate when their canopies touch.
    ///
    /// Same-species grafting is always possible; willow and alder are the
    /// one cross-species pairing.
    pub fn can_graft_with(&self, other: TreeSpecies) -> bool {
        *self == other
            || matches!(
                (*self, other),
                (TreeSpecies::Willow, TreeSpecies::Alder)
                    | (TreeSpecies::Alder, TreeSpecies::Willow)
            )
    }

    /// The species mix of a biome, ordered by dominance.
    pub fn candidates_for_biome(biome: Biome) -> &'static [TreeSpecies] {
        match biome {
            Biome::TemperateForest => &[
                TreeSpecies::Oak,
                TreeSpecies::Birch,
                TreeSpecies::Pine,
                TreeSpecies::Alder,
            ],
            Biome::Grassland => &[TreeSpecies::Oak, TreeSpecies::Birch],
            Biome::Alpine => &[TreeSpecies::Spruce, TreeSpecies::Pine, TreeSpecies::Birch],
            Biome::Wetland => &[TreeSpecies::Willow, TreeSpecies::Alder, TreeSpecies::Birch],
            Biome::Arid => &[TreeSpecies::Pine, TreeSpecies::Oak],
        }
    }
}

/// The vegetation layer's output for one tile.
#[derive(PartialEq, Clone, Copy, Serialize, Deserialize, Debug)]
pub struct VegetationSummary {
    /// Fraction of the tile covered by canopy, in `[0, 1]`.
    pub canopy_cover: f64,
    /// Light reaching the understory after canopy attenuation, in `[0, 1]`.
    pub understory_light: f64,
    pub dominant_species: Option<TreeSpecies>,
}
