use crate::{
    generate_common_methods, map_generator::Generator, map_parameters::MapParameters,
    tile_map::TileMap,
};

/// The standard battle map generator: the full pipeline with no stage
/// overrides.
pub struct Standard(TileMap);

impl Generator for Standard {
    generate_common_methods!();
}

#[cfg(test)]
mod tests {
    use super::Standard;
    use crate::{
        feature::MapFeature,
        map_generator::Generator,
        map_parameters::MapParameters,
        seed::Seed,
        tile_map::PipelineStage,
    };

    /// The end-to-end scenario: a 50x40 temperate-forest valley with all
    /// layer parameters at their defaults.
    fn valley_parameters() -> MapParameters {
        let mut parameters = MapParameters::default();
        parameters.name = "epic mountain valley".to_owned();
        parameters.seed = Seed::from_string("epic-mountain-valley");
        parameters.map_size = crate::grid::Size::new(50, 40);
        parameters.topography.ruggedness = 1.0;
        parameters.hydrology.water_abundance = 1.0;
        parameters.vegetation.density = 1.0;
        parameters
    }

    #[test]
    fn full_pipeline_generates_a_complete_map() {
        let parameters = valley_parameters();
        let map = Standard::generate(&parameters).unwrap();

        assert_eq!(map.tile_count(), 50 * 40);
        assert_eq!(map.terrain_type_list.len(), 2000);
        assert_eq!(map.tactical_list.len(), 2000);
        assert!(map.stage_complete(PipelineStage::FeatureMixing));

        // Default water abundance guarantees open water somewhere.
        let has_water_feature = map.feature_registry.iter().any(|(_, feature)| {
            matches!(feature, MapFeature::River(_) | MapFeature::Lake(_))
        });
        assert!(has_water_feature);

        // No two committed building footprints may overlap.
        let buildings: Vec<_> = map
            .feature_registry
            .iter()
            .filter_map(|(_, feature)| match feature {
                MapFeature::Building(building) => Some(building),
                _ => None,
            })
            .collect();
        for (index, a) in buildings.iter().enumerate() {
            for b in &buildings[index + 1..] {
                assert!(!a.footprint.intersects(&b.footprint));
            }
        }
    }

    #[test]
    fn the_same_seed_reproduces_the_map_bit_for_bit() {
        let parameters = valley_parameters();
        let first = Standard::generate(&parameters).unwrap();
        let second = Standard::generate(&parameters).unwrap();

        assert_eq!(first.terrain_type_list, second.terrain_type_list);
        assert_eq!(first.geology_list, second.geology_list);
        assert_eq!(first.topography_list, second.topography_list);
        assert_eq!(first.hydrology_list, second.hydrology_list);
        assert_eq!(first.vegetation_list, second.vegetation_list);
        assert_eq!(first.tactical_list, second.tactical_list);
        assert_eq!(first.primary_feature_list, second.primary_feature_list);
        assert_eq!(first.mixed_feature_list, second.mixed_feature_list);
        assert_eq!(first.feature_registry, second.feature_registry);
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn different_seeds_diverge() {
        let mut parameters = valley_parameters();
        let first = Standard::generate(&parameters).unwrap();
        parameters.seed = Seed::from_string("a-different-valley");
        let second = Standard::generate(&parameters).unwrap();
        assert_ne!(first.terrain_type_list, second.terrain_type_list);
    }

    #[test]
    fn boundary_dimensions_generate() {
        for (width, height) in [(10, 10), (200, 200)] {
            let mut parameters = MapParameters::default();
            parameters.map_size = crate::grid::Size::new(width, height);
            let map = Standard::generate(&parameters).unwrap();
            assert_eq!(map.tile_count(), (width * height) as usize);
        }
    }

    #[test]
    fn invalid_dimensions_fail_before_any_stage_runs() {
        let mut parameters = MapParameters::default();
        parameters.map_size = crate::grid::Size::new(9, 9);
        let error = Standard::generate(&parameters).unwrap_err();
        assert_eq!(error.code(), "MAP_INVALID_DIMENSIONS");
    }
}
