//! The generation request: map name, size, seed, biome and per-layer
//! configuration, with range validation for every numeric parameter.
//!
//! The surrounding application hands this struct (or its JSON form) to
//! [`generate_map`](crate::generate_map); nothing here reads the
//! environment, the clock or any other ambient state.

use serde::{Deserialize, Serialize};

use crate::{
    error::GenerationError,
    grid::{Size, SquareGrid},
    seed::Seed,
};

/// The inclusive bounds on map width and height, in tiles.
pub const MAP_DIMENSION_RANGE: std::ops::RangeInclusive<u32> = 10..=200;

/// The biome family of the map. Drives bedrock candidates, species mix and
/// building material suitability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Biome {
    #[default]
    TemperateForest,
    Grassland,
    Alpine,
    Wetland,
    Arid,
}

/// Relative weights of the terrain distribution used when elevation
/// quantiles are converted to terrain types.
///
/// Weights are relative, not percentages; they only need to be non-negative
/// with a positive sum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TerrainWeights {
    #[serde(default = "default_water_weight")]
    pub water: f64,
    #[serde(default = "default_flatland_weight")]
    pub flatland: f64,
    #[serde(default = "default_hill_weight")]
    pub hill: f64,
    #[serde(default = "default_mountain_weight")]
    pub mountain: f64,
}

fn default_water_weight() -> f64 {
    0.15
}
fn default_flatland_weight() -> f64 {
    0.55
}
fn default_hill_weight() -> f64 {
    0.20
}
fn default_mountain_weight() -> f64 {
    0.10
}

impl Default for TerrainWeights {
    fn default() -> Self {
        Self {
            water: default_water_weight(),
            flatland: default_flatland_weight(),
            hill: default_hill_weight(),
            mountain: default_mountain_weight(),
        }
    }
}

impl TerrainWeights {
    pub fn total(&self) -> f64 {
        self.water + self.flatland + self.hill + self.mountain
    }
}

/// Geology layer configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeologyConfig {
    /// Scales soil depth across the map. `0.0` is bare rock, `1.0` deep soil.
    #[serde(default = "default_soil_fertility")]
    pub soil_fertility: f64,
    /// Probability scale for point geologic features (caves, sinkholes,
    /// rock outcrops).
    #[serde(default = "default_cave_density")]
    pub cave_density: f64,
}

fn default_soil_fertility() -> f64 {
    0.6
}
fn default_cave_density() -> f64 {
    0.3
}

impl Default for GeologyConfig {
    fn default() -> Self {
        Self {
            soil_fertility: default_soil_fertility(),
            cave_density: default_cave_density(),
        }
    }
}

/// Topography layer configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TopographyConfig {
    /// Controls octave count and persistence of the elevation noise via the
    /// documented piecewise-linear mapping. Valid range `[0.5, 2.0]`.
    #[serde(default = "default_ruggedness")]
    pub ruggedness: f64,
    /// Scales the amplitude of the elevation field. Valid range `[0.0, 1.0]`.
    #[serde(default = "default_elevation_variance")]
    pub elevation_variance: f64,
}

fn default_ruggedness() -> f64 {
    1.0
}
fn default_elevation_variance() -> f64 {
    0.5
}

impl Default for TopographyConfig {
    fn default() -> Self {
        Self {
            ruggedness: default_ruggedness(),
            elevation_variance: default_elevation_variance(),
        }
    }
}

/// Hydrology layer configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HydrologyConfig {
    /// Scales river, spring and wetland frequency. `0.25` is the dry anchor,
    /// `1.0` the default, `4.0` the wet anchor. Valid range `[0.25, 4.0]`.
    #[serde(default = "default_water_abundance")]
    pub water_abundance: f64,
    #[serde(default = "default_true")]
    pub generate_rivers: bool,
}

fn default_water_abundance() -> f64 {
    1.0
}
fn default_true() -> bool {
    true
}

impl Default for HydrologyConfig {
    fn default() -> Self {
        Self {
            water_abundance: default_water_abundance(),
            generate_rivers: true,
        }
    }
}

/// Vegetation layer configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VegetationConfig {
    /// Density multiplier for tree and understory counts. Valid range
    /// `[0.1, 3.0]`.
    #[serde(default = "default_vegetation_density")]
    pub density: f64,
    /// Species diversity, `0.0` monoculture to `1.0` even mix. Valid range
    /// `[0.0, 1.0]`.
    #[serde(default = "default_diversity")]
    pub diversity: f64,
    #[serde(default = "default_true")]
    pub generate_forests: bool,
}

fn default_vegetation_density() -> f64 {
    1.0
}
fn default_diversity() -> f64 {
    0.5
}

impl Default for VegetationConfig {
    fn default() -> Self {
        Self {
            density: default_vegetation_density(),
            diversity: default_diversity(),
            generate_forests: true,
        }
    }
}

/// Artificial structure layer configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StructureConfig {
    #[serde(default = "default_true")]
    pub generate_buildings: bool,
    #[serde(default = "default_true")]
    pub generate_roads: bool,
    /// Building count per map area. Valid range `[0.0, 1.0]`.
    #[serde(default = "default_building_density")]
    pub building_density: f64,
}

fn default_building_density() -> f64 {
    0.5
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            generate_buildings: true,
            generate_roads: true,
            building_density: default_building_density(),
        }
    }
}

/// All parameters of one generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapParameters {
    #[serde(default = "default_name")]
    pub name: String,
    pub map_size: Size,
    /// Edge length of one tile in meters.
    #[serde(default = "default_cell_size")]
    pub cell_size: f64,
    pub seed: Seed,
    #[serde(default)]
    pub biome: Biome,
    #[serde(default)]
    pub terrain_weights: TerrainWeights,
    #[serde(default)]
    pub geology: GeologyConfig,
    #[serde(default)]
    pub topography: TopographyConfig,
    #[serde(default)]
    pub hydrology: HydrologyConfig,
    #[serde(default)]
    pub vegetation: VegetationConfig,
    #[serde(default)]
    pub structures: StructureConfig,
}

fn default_name() -> String {
    "battle map".to_owned()
}
fn default_cell_size() -> f64 {
    1.5
}

impl Default for MapParameters {
    fn default() -> Self {
        Self {
            name: default_name(),
            map_size: Size::new(50, 40),
            cell_size: default_cell_size(),
            // Fixed default; the generation path never consults the clock.
            seed: Seed::from_string("battle-map-default"),
            biome: Biome::default(),
            terrain_weights: TerrainWeights::default(),
            geology: GeologyConfig::default(),
            topography: TopographyConfig::default(),
            hydrology: HydrologyConfig::default(),
            vegetation: VegetationConfig::default(),
            structures: StructureConfig::default(),
        }
    }
}

impl MapParameters {
    /// Parses a generation request from its JSON form.
    pub fn from_json_str(text: &str) -> Result<Self, GenerationError> {
        let parameters: Self = serde_json::from_str(text).map_err(|error| {
            GenerationError::validation(
                "REQUEST_MALFORMED",
                "map_parameters",
                "generation request is not valid JSON",
                error.to_string(),
                "a JSON object matching MapParameters",
            )
        })?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// The square grid implied by the requested map size.
    pub fn grid(&self) -> SquareGrid {
        SquareGrid::new(self.map_size)
    }

    /// Validates every numeric parameter against its documented range.
    ///
    /// The first offending parameter is reported with its value and range;
    /// validation errors are never retried.
    pub fn validate(&self) -> Result<(), GenerationError> {
        let Size { width, height } = self.map_size;
        if !MAP_DIMENSION_RANGE.contains(&width) || !MAP_DIMENSION_RANGE.contains(&height) {
            return Err(GenerationError::validation(
                "MAP_INVALID_DIMENSIONS",
                "map_parameters",
                "map dimensions are outside the valid range",
                format!("{width}x{height}"),
                "10..=200 per axis",
            ));
        }
        if !(self.cell_size > 0.0 && self.cell_size.is_finite()) {
            return Err(GenerationError::validation(
                "CELL_SIZE_OUT_OF_RANGE",
                "map_parameters",
                "cell size must be a positive finite length",
                self.cell_size.to_string(),
                "(0, +inf)",
            ));
        }

        let weights = &self.terrain_weights;
        let weight_values = [
            weights.water,
            weights.flatland,
            weights.hill,
            weights.mountain,
        ];
        if weight_values.iter().any(|w| !w.is_finite() || *w < 0.0) || weights.total() <= 0.0 {
            return Err(GenerationError::validation(
                "TERRAIN_WEIGHTS_INVALID",
                "map_parameters",
                "terrain weights must be non-negative with a positive sum",
                format!(
                    "water={} flatland={} hill={} mountain={}",
                    weights.water, weights.flatland, weights.hill, weights.mountain
                ),
                "each >= 0.0, sum > 0.0",
            ));
        }

        check_range(
            "geology.soil_fertility",
            self.geology.soil_fertility,
            0.0,
            1.0,
        )?;
        check_range("geology.cave_density", self.geology.cave_density, 0.0, 1.0)?;
        check_range(
            "topography.ruggedness",
            self.topography.ruggedness,
            0.5,
            2.0,
        )?;
        check_range(
            "topography.elevation_variance",
            self.topography.elevation_variance,
            0.0,
            1.0,
        )?;
        check_range(
            "hydrology.water_abundance",
            self.hydrology.water_abundance,
            0.25,
            4.0,
        )?;
        check_range("vegetation.density", self.vegetation.density, 0.1, 3.0)?;
        check_range("vegetation.diversity", self.vegetation.diversity, 0.0, 1.0)?;
        check_range(
            "structures.building_density",
            self.structures.building_density,
            0.0,
            1.0,
        )?;

        Ok(())
    }
}

fn check_range(name: &'static str, value: f64, min: f64, max: f64) -> Result<(), GenerationError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(GenerationError::Validation {
            code: "PARAM_OUT_OF_RANGE",
            component: "map_parameters",
            message: name,
            value: value.to_string(),
            valid_range: format!("[{min}, {max}]"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{MapParameters, Seed};
    use crate::grid::Size;

    #[test]
    fn dimension_bounds_are_inclusive() {
        let mut parameters = MapParameters::default();

        parameters.map_size = Size::new(10, 10);
        assert!(parameters.validate().is_ok());

        parameters.map_size = Size::new(200, 200);
        assert!(parameters.validate().is_ok());

        parameters.map_size = Size::new(9, 50);
        let error = parameters.validate().unwrap_err();
        assert_eq!(error.code(), "MAP_INVALID_DIMENSIONS");

        parameters.map_size = Size::new(50, 201);
        let error = parameters.validate().unwrap_err();
        assert_eq!(error.code(), "MAP_INVALID_DIMENSIONS");
    }

    #[test]
    fn layer_parameters_are_range_checked() {
        let mut parameters = MapParameters::default();
        parameters.topography.ruggedness = 2.5;
        let error = parameters.validate().unwrap_err();
        assert_eq!(error.code(), "PARAM_OUT_OF_RANGE");

        let mut parameters = MapParameters::default();
        parameters.hydrology.water_abundance = 0.1;
        assert!(parameters.validate().is_err());

        let mut parameters = MapParameters::default();
        parameters.terrain_weights.water = -1.0;
        let error = parameters.validate().unwrap_err();
        assert_eq!(error.code(), "TERRAIN_WEIGHTS_INVALID");
    }

    #[test]
    fn json_request_round_trip() {
        let request = r#"{
            "name": "river crossing",
            "map_size": { "width": 50, "height": 40 },
            "seed": 987654,
            "biome": "TemperateForest",
            "topography": { "ruggedness": 1.5 }
        }"#;
        let parameters = MapParameters::from_json_str(request).unwrap();
        assert_eq!(parameters.name, "river crossing");
        assert_eq!(parameters.map_size, Size::new(50, 40));
        assert_eq!(parameters.seed, Seed::from_number(987654).unwrap());
        assert_eq!(parameters.topography.ruggedness, 1.5);
        // Omitted sections fall back to defaults.
        assert_eq!(parameters.vegetation.density, 1.0);

        let rejected = MapParameters::from_json_str("{\"name\": 3}");
        assert!(rejected.is_err());
    }
}
