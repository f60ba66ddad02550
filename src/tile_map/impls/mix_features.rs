use enum_map::EnumMap;

use crate::{
    error::GenerationError,
    feature::{Compatibility, FeatureId, MapFeature},
    tile_component::{ConcealmentLevel, CoverLevel, TacticalAspect, TacticalProperties},
    tile_map::{PipelineStage, Tile, TileMap},
};

/// The resolved interaction of all features claiming one tile: which
/// feature dominates each tactical aspect, and the combined height.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureInteraction {
    /// The overall dominant feature of the tile.
    pub primary: FeatureId,
    /// The dominant feature per tactical aspect. `None` when no feature on
    /// the tile expresses the aspect.
    pub dominant: EnumMap<TacticalAspect, Option<FeatureId>>,
    /// Feature height after synergy averaging, in meters.
    pub resolved_height: f64,
}

impl TileMap {
    /// The feature mixing engine: resolves every tile with feature claims
    /// into one primary feature, a mixed-feature set and the tile's
    /// tactical properties.
    ///
    /// Resolution is a pure function of the claim set: candidates are
    /// ranked by declared priority, ties broken by feature id (insertion
    /// order), so the outcome does not depend on the order the claims were
    /// proposed.
    pub fn mix_features(&mut self) -> Result<(), GenerationError> {
        self.ensure_stage(PipelineStage::Structures, "feature_mixing")?;

        let mut primary_list: Vec<Option<FeatureId>> = vec![None; self.tile_count()];
        let mut mixed_list: Vec<Vec<FeatureId>> = vec![Vec::new(); self.tile_count()];
        let mut tactical_list: Vec<TacticalProperties> = Vec::with_capacity(self.tile_count());

        for tile in self.all_tiles() {
            let claims = self.claimed_feature_list[tile.index()].clone();
            let interaction = if claims.is_empty() {
                None
            } else {
                Some(self.resolve_interaction(tile, &claims)?)
            };

            if let Some(interaction) = &interaction {
                primary_list[tile.index()] = Some(interaction.primary);
                let mut rest: Vec<FeatureId> = claims
                    .iter()
                    .copied()
                    .filter(|&id| id != interaction.primary)
                    .collect();
                rest.sort();
                mixed_list[tile.index()] = rest;
            }

            tactical_list.push(self.resolve_tactical(tile, &claims, interaction.as_ref()));
        }

        self.primary_feature_list = primary_list;
        self.mixed_feature_list = mixed_list;
        self.tactical_list = tactical_list;
        self.mark_stage_complete(PipelineStage::FeatureMixing);
        Ok(())
    }

    /// Resolves which feature dominates each aspect of a tile.
    ///
    /// An incompatible pair sharing a tile means a placement stage broke
    /// its rules; that is a reproducibility bug, not a recoverable
    /// condition.
    pub(crate) fn resolve_interaction(
        &self,
        tile: Tile,
        claims: &[FeatureId],
    ) -> Result<FeatureInteraction, GenerationError> {
        // Rank by (priority desc, id asc); the id order is the registry
        // insertion order.
        let mut ranked: Vec<FeatureId> = claims.to_vec();
        ranked.sort_by(|&a, &b| {
            let feature_a = self.feature_registry.get(a);
            let feature_b = self.feature_registry.get(b);
            feature_b
                .priority()
                .cmp(&feature_a.priority())
                .then(a.cmp(&b))
        });

        for (index, &a) in ranked.iter().enumerate() {
            for &b in &ranked[index + 1..] {
                let feature_a = self.feature_registry.get(a);
                let feature_b = self.feature_registry.get(b);
                if feature_a.can_mix_with(feature_b) == Compatibility::Incompatible {
                    return Err(GenerationError::deterministic(
                        "INCOMPATIBLE_OVERLAP",
                        "feature_mixing",
                        format!(
                            "'{}' and '{}' both claim tile {} but are incompatible",
                            feature_a.name(),
                            feature_b.name(),
                            tile.index()
                        ),
                    ));
                }
            }
        }

        let primary = ranked[0];

        let expresses = |id: FeatureId, aspect: TacticalAspect| -> bool {
            let feature = self.feature_registry.get(id);
            match aspect {
                TacticalAspect::Terrain => true,
                TacticalAspect::Height => feature.height_contribution() != 0.0,
                TacticalAspect::Movement => feature.movement_factor() != 1.0,
                TacticalAspect::Blocking => feature.cover() != CoverLevel::None,
                TacticalAspect::Visual => feature.concealment() != ConcealmentLevel::None,
            }
        };
        let mut dominant: EnumMap<TacticalAspect, Option<FeatureId>> = EnumMap::default();
        for (aspect, slot) in dominant.iter_mut() {
            *slot = ranked.iter().copied().find(|&id| expresses(id, aspect));
        }

        // Height: synergistic partners of the height-dominant feature
        // average their contributions; everything else defers outright.
        let resolved_height = match dominant[TacticalAspect::Height] {
            None => 0.0,
            Some(leader) => {
                let leader_feature = self.feature_registry.get(leader);
                let synergists: Vec<f64> = ranked
                    .iter()
                    .copied()
                    .filter(|&id| {
                        id != leader
                            && leader_feature.can_mix_with(self.feature_registry.get(id))
                                == Compatibility::Synergistic
                    })
                    .map(|id| self.feature_registry.get(id).height_contribution())
                    .collect();
                if synergists.is_empty() {
                    leader_feature.height_contribution()
                } else {
                    let total: f64 =
                        leader_feature.height_contribution() + synergists.iter().sum::<f64>();
                    total / (synergists.len() + 1) as f64
                }
            }
        };

        Ok(FeatureInteraction {
            primary,
            dominant,
            resolved_height,
        })
    }

    /// Combines terrain, slope, water, vegetation and structure factors
    /// into the tile's tactical properties.
    fn resolve_tactical(
        &self,
        tile: Tile,
        claims: &[FeatureId],
        interaction: Option<&FeatureInteraction>,
    ) -> TacticalProperties {
        let terrain = self.terrain_type_list[tile.index()];
        let topography = &self.topography_list[tile.index()];
        let hydrology = &self.hydrology_list[tile.index()];
        let vegetation = &self.vegetation_list[tile.index()];

        let has_bridge = claims
            .iter()
            .any(|&id| matches!(self.feature_registry.get(id), MapFeature::Bridge(_)));

        let slope_factor = 1.0 + topography.slope * 4.0;
        let water_factor = if has_bridge || hydrology.water_depth == 0.0 {
            // A bridge deck carries traffic clear over the channel.
            1.0
        } else {
            1.0 + hydrology.water_depth * 1.5
        };
        let vegetation_factor = 1.0 + vegetation.canopy_cover * 0.8;

        // The structure factor comes from artificial and relief features
        // only; natural features already act through the water and
        // vegetation factors. A building blocks the tile outright; among
        // the rest the best route (a road over an outcrop) sets the factor.
        let structure_factor = if claims
            .iter()
            .any(|&id| matches!(self.feature_registry.get(id), MapFeature::Building(_)))
        {
            f64::INFINITY
        } else {
            let paved = claims
                .iter()
                .filter_map(|&id| {
                    let feature = self.feature_registry.get(id);
                    matches!(feature, MapFeature::Road(_) | MapFeature::Bridge(_))
                        .then(|| feature.movement_factor())
                })
                .fold(f64::INFINITY, f64::min);
            if paved.is_finite() {
                // A laid surface overrides whatever it was laid over.
                paved
            } else {
                claims
                    .iter()
                    .filter_map(|&id| {
                        let feature = self.feature_registry.get(id);
                        matches!(feature, MapFeature::Relief(_))
                            .then(|| feature.movement_factor())
                    })
                    .product::<f64>()
            }
        };

        let base = if has_bridge {
            // The deck overrides the terrain underneath.
            1.0
        } else {
            terrain.movement_factor()
        };
        let movement_cost = base * slope_factor * water_factor * vegetation_factor * structure_factor;

        let mut cover = CoverLevel::None;
        let mut concealment = ConcealmentLevel::None;
        for &id in claims {
            let feature = self.feature_registry.get(id);
            cover = cover.max(feature.cover());
            concealment = concealment.max(feature.concealment());
        }
        // Canopy shadow conceals even where no feature claim resolves it.
        if vegetation.canopy_cover > 0.3 {
            concealment = concealment.max(ConcealmentLevel::Light);
        }

        TacticalProperties {
            movement_cost,
            cover,
            concealment,
            feature_height: interaction.map_or(0.0, |i| i.resolved_height),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        map_parameters::MapParameters,
        tile_map::{PipelineStage, TileMap},
    };

    fn generated_map() -> TileMap {
        let parameters = MapParameters::default();
        let mut map = TileMap::new(&parameters);
        map.generate_geology(&parameters).unwrap();
        map.generate_topography(&parameters).unwrap();
        map.generate_hydrology(&parameters).unwrap();
        map.generate_vegetation(&parameters).unwrap();
        map.generate_structures(&parameters).unwrap();
        map.mix_features().unwrap();
        map
    }

    #[test]
    fn every_claimed_tile_gets_exactly_one_primary_feature() {
        let map = generated_map();
        for tile in map.all_tiles() {
            let claims = &map.claimed_feature_list[tile.index()];
            let primary = map.primary_feature_list[tile.index()];
            if claims.is_empty() {
                assert!(primary.is_none());
            } else {
                let primary = primary.expect("claimed tiles resolve a primary");
                assert!(claims.contains(&primary));
                assert!(!map.mixed_feature_list[tile.index()].contains(&primary));
                assert_eq!(
                    map.mixed_feature_list[tile.index()].len(),
                    claims.len() - 1
                );
            }
        }
    }

    #[test]
    fn resolution_ignores_claim_order() {
        let map = generated_map();
        let busy_tile = map
            .all_tiles()
            .find(|tile| map.claimed_feature_list[tile.index()].len() >= 2);
        let Some(tile) = busy_tile else {
            // Nothing shares a tile on this seed; the property is vacuous.
            return;
        };

        let claims = map.claimed_feature_list[tile.index()].clone();
        let forward = map.resolve_interaction(tile, &claims).unwrap();
        let mut reversed = claims.clone();
        reversed.reverse();
        let backward = map.resolve_interaction(tile, &reversed).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn movement_costs_are_positive_and_mountains_impassable() {
        let map = generated_map();
        assert!(map.stage_complete(PipelineStage::FeatureMixing));
        for tile in map.all_tiles() {
            let tactical = map.tactical_list[tile.index()];
            assert!(tactical.movement_cost > 0.0);
            if map.terrain_type_list[tile.index()]
                == crate::tile_component::TerrainType::Mountain
                && map.claimed_feature_list[tile.index()].is_empty()
            {
                assert!(tactical.movement_cost.is_infinite());
            }
        }
    }
}
