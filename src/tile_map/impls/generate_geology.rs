use rand::Rng;
use rand::seq::IndexedRandom;

use crate::{
    error::GenerationError,
    feature::{MapFeature, Relief, ReliefKind},
    map_parameters::MapParameters,
    noise::{LayeredNoise, NoiseFlags},
    spatial::FeatureArea,
    tile_component::{BedrockType, GeologicFeature, GeologySummary},
    tile_map::{PipelineStage, TileMap},
};

impl TileMap {
    /// Generates the geology layer: bedrock, soil depth, permeability and
    /// sparse point geologic features.
    ///
    /// Bedrock is selected from the biome's candidate set by thresholding a
    /// low-frequency noise field, so bedrock forms contiguous provinces
    /// instead of per-tile speckle.
    pub fn generate_geology(
        &mut self,
        map_parameters: &MapParameters,
    ) -> Result<(), GenerationError> {
        let mut random = self.seed.rng("geology");
        let size = self.grid.size;
        let config = &map_parameters.geology;

        let bedrock_noise = LayeredNoise::create(&mut random, size, 2, 0.5, NoiseFlags::empty());
        let soil_noise = LayeredNoise::create(&mut random, size, 3, 0.55, NoiseFlags::empty());
        let jitter_noise = LayeredNoise::create(&mut random, size, 4, 0.5, NoiseFlags::empty());

        let candidates = BedrockType::candidates_for_biome(map_parameters.biome);

        let mut geology = Vec::with_capacity(self.tile_count());
        for tile in self.all_tiles() {
            let offset = tile.to_offset_coordinate(&self.grid);
            let (x, y) = (offset.0.x as u32, offset.0.y as u32);

            let bedrock = {
                let value = bedrock_noise.sample(x, y);
                // Most common candidate below 0.55, second below 0.85.
                let slot = if value < 0.55 {
                    0
                } else if value < 0.85 {
                    1
                } else {
                    2
                };
                candidates[slot.min(candidates.len() - 1)]
            };

            let soil_depth =
                config.soil_fertility * soil_noise.sample(x, y) * 2.0 * (1.0 - bedrock.hardness() * 0.3);

            let permeability = (bedrock.base_permeability()
                + (jitter_noise.sample(x, y) - 0.5) * 0.3)
                .clamp(0.0, 1.0);

            // Point features draw from a per-tile stream so a future
            // parallel executor cannot reorder them.
            let point_feature = {
                let mut tile_random = self.seed.rng_indexed("geology-point", tile.index());
                let roll: f64 = tile_random.random_range(0.0..1.0);
                if bedrock.is_karstic() && roll < config.cave_density * 0.02 {
                    [GeologicFeature::Cave, GeologicFeature::Sinkhole]
                        .choose(&mut tile_random)
                        .copied()
                } else if bedrock.hardness() >= 0.8
                    && soil_depth < 0.3
                    && roll < config.cave_density * 0.015
                {
                    Some(GeologicFeature::RockOutcrop)
                } else {
                    None
                }
            };

            geology.push(GeologySummary {
                bedrock,
                soil_depth,
                permeability,
                point_feature,
            });
        }

        self.geology_list = geology;

        // Point features become relief features so the mixing engine can
        // weigh them against whatever else lands on the tile.
        for tile in self.all_tiles() {
            let Some(point_feature) = self.geology_list[tile.index()].point_feature else {
                continue;
            };
            let kind = match point_feature {
                GeologicFeature::Cave => ReliefKind::Cave,
                GeologicFeature::Sinkhole => ReliefKind::Sinkhole,
                GeologicFeature::RockOutcrop => ReliefKind::RockOutcrop,
            };
            let relief = Relief {
                kind,
                area: FeatureArea::tile(tile.to_offset_coordinate(&self.grid)),
            };
            let id = self.feature_registry.insert(MapFeature::Relief(relief));
            self.claim_tile(tile, id);
        }

        self.mark_stage_complete(PipelineStage::Geology);
        log::debug!("geology committed for {} tiles", self.tile_count());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{map_parameters::MapParameters, tile_map::TileMap};

    #[test]
    fn geology_is_deterministic_and_complete() {
        let parameters = MapParameters::default();

        let mut first = TileMap::new(&parameters);
        first.generate_geology(&parameters).unwrap();
        let mut second = TileMap::new(&parameters);
        second.generate_geology(&parameters).unwrap();

        assert_eq!(first.geology_list, second.geology_list);
        assert_eq!(first.geology_list.len(), first.tile_count());
        for summary in &first.geology_list {
            assert!(summary.soil_depth >= 0.0);
            assert!((0.0..=1.0).contains(&summary.permeability));
        }
    }
}
