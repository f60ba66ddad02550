use std::collections::VecDeque;

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::{
    error::GenerationError,
    feature::{Forest, Grassland, MapFeature, Tree, TreeId, TreeSize},
    map_parameters::MapParameters,
    spatial::{FeatureArea, SubTilePosition},
    tile_component::{TerrainType, TreeSpecies, VegetationSummary},
    tile_map::{PipelineStage, Tile, TileMap},
};

/// Minimum tiles for a tree cluster to become a forest feature.
const MIN_FOREST_TILES: usize = 4;

/// Minimum tiles for an open cluster to become a grassland feature.
const MIN_GRASSLAND_TILES: usize = 6;

impl TileMap {
    /// Generates the vegetation layer.
    ///
    /// Canopy trees are placed first; the understory then grows into
    /// whatever light the canopy lets through. Adjacent compatible trees
    /// with touching canopies inosculate.
    ///
    /// The density formulas, each independently clamped:
    /// - per-tile tree probability `p = clamp(0.20 · density · (0.4 + 0.8 · moisture), 0.02, 0.85)`
    /// - trees per forested tile `n = clamp(round(1.6 · density), 1, 5)`
    /// - stand basal-area target `b = clamp(24 · density, 4, 60)` m²/ha,
    ///   scaling trunk girth relative to the default stand
    /// - understory tallies scale with `density · mean understory light`.
    pub fn generate_vegetation(
        &mut self,
        map_parameters: &MapParameters,
    ) -> Result<(), GenerationError> {
        self.ensure_stage(PipelineStage::Hydrology, "vegetation")?;

        let mut random = self.seed.rng("vegetation");
        let config = &map_parameters.vegetation;
        let trees_per_tile = ((1.6 * config.density).round() as u32).clamp(1, 5);
        // Girth scales with the square root of the basal-area target so a
        // doubled stand density does not double every trunk.
        let basal_area_target = (24.0 * config.density).clamp(4.0, 60.0);
        let girth_scale = (basal_area_target / 24.0).sqrt();
        let candidates = TreeSpecies::candidates_for_biome(map_parameters.biome);

        // Decide tree tiles with per-tile streams, then group them.
        let mut forested = vec![false; self.tile_count()];
        if config.generate_forests {
            for tile in self.all_tiles() {
                if !self.suits_trees(tile) {
                    continue;
                }
                let moisture = self.hydrology_list[tile.index()].moisture;
                let probability =
                    (0.20 * config.density * (0.4 + 0.8 * moisture)).clamp(0.02, 0.85);
                let mut tile_random = self.seed.rng_indexed("vegetation-tile", tile.index());
                forested[tile.index()] = tile_random.random_range(0.0..1.0) < probability;
            }
        }

        let clusters = self.connected_clusters(|tile| forested[tile.index()]);

        let mut canopy_cover = vec![0.0_f64; self.tile_count()];
        let mut species_by_tile: Vec<Option<TreeSpecies>> = vec![None; self.tile_count()];
        let mut forests: Vec<(Forest, Vec<Tile>)> = Vec::new();

        for cluster in &clusters {
            if cluster.len() < MIN_FOREST_TILES {
                continue;
            }

            // Per-forest dominant species: the biome's lead species is
            // favored three to one.
            let dominant = {
                let mut weighted: Vec<TreeSpecies> = vec![candidates[0]; 3];
                weighted.extend_from_slice(candidates);
                *weighted.choose(&mut random).unwrap()
            };

            let area = self.cluster_area(cluster);
            let mut forest = Forest::new(
                format!("Forest {}", forests.len() + 1),
                area,
                dominant,
            );

            for &tile in cluster {
                let mut tile_random = self.seed.rng_indexed("vegetation-tree", tile.index());
                let offset = tile.to_offset_coordinate(&self.grid);
                for _ in 0..trees_per_tile {
                    let species = if tile_random.random_range(0.0..1.0)
                        < 1.0 - 0.7 * config.diversity
                    {
                        dominant
                    } else {
                        *candidates.choose(&mut tile_random).unwrap()
                    };
                    let size = match tile_random.random_range(0..100) {
                        0..15 => TreeSize::Sapling,
                        15..45 => TreeSize::Young,
                        45..90 => TreeSize::Mature,
                        _ => TreeSize::Ancient,
                    };
                    let growth = size.growth_fraction();
                    let health = tile_random.random_range(0.55..0.95);
                    let position = SubTilePosition::new(
                        offset,
                        tile_random.random_range(0.0..1.0),
                        tile_random.random_range(0.0..1.0),
                    )?;
                    let tree = Tree {
                        id: TreeId(0),
                        species,
                        size,
                        position,
                        health,
                        age_years: (growth * 180.0) as u32,
                        trunk_diameter: 0.8 * growth * girth_scale,
                        height: species.mature_height() * growth,
                        canopy_density: species.canopy_density() * (0.85 + 0.15 * health),
                        canopy_radius: species.canopy_radius() * growth,
                        grafted_into: None,
                    };
                    // Canopy area over the tile footprint, capped at full cover.
                    let tile_area = self.cell_size * self.cell_size;
                    let canopy_area =
                        std::f64::consts::PI * tree.canopy_radius * tree.canopy_radius;
                    canopy_cover[tile.index()] = (canopy_cover[tile.index()]
                        + (canopy_area / tile_area) * tree.canopy_density * 0.5)
                        .min(1.0);
                    forest.add_tree(tree, self.cell_size)?;
                }
                species_by_tile[tile.index()] = Some(dominant);
            }

            self.graft_adjacent_trees(&mut forest)?;
            forests.push((forest, cluster.clone()));
        }

        // Understory light from own and neighboring canopy.
        let understory_light: Vec<f64> = self
            .all_tiles()
            .map(|tile| {
                let neighbors = tile.neighbor_tiles(&self.grid);
                let neighbor_cover = if neighbors.is_empty() {
                    0.0
                } else {
                    neighbors
                        .iter()
                        .map(|n| canopy_cover[n.index()])
                        .sum::<f64>()
                        / neighbors.len() as f64
                };
                (1.0 - 0.75 * canopy_cover[tile.index()] - 0.15 * neighbor_cover).clamp(0.05, 1.0)
            })
            .collect();

        // Understory tallies per forest now that the light map exists.
        for (forest, tiles) in &mut forests {
            let mean_light = tiles
                .iter()
                .map(|tile| understory_light[tile.index()])
                .sum::<f64>()
                / tiles.len() as f64;
            let tile_count = tiles.len() as f64;
            forest.underbrush_density = (0.15 + 0.75 * mean_light).clamp(0.0, 1.0);
            forest.shrub_count = (tile_count * 2.0 * config.density * mean_light).round() as u32;
            forest.herbaceous_count =
                (tile_count * 6.0 * config.density * mean_light).round() as u32;
            forest.moss_patches =
                (tile_count * 1.2 * config.density * (1.0 - mean_light)).round() as u32;
        }

        // Grasslands over the remaining open ground.
        let open_clusters = self.connected_clusters(|tile| {
            !forested[tile.index()]
                && matches!(
                    self.terrain_type_list[tile.index()],
                    TerrainType::Flatland | TerrainType::Hill
                )
                && self.hydrology_list[tile.index()].water_depth == 0.0
                && self.topography_list[tile.index()].slope < 0.2
                && self.hydrology_list[tile.index()].moisture >= 0.15
        });
        let mut grasslands: Vec<(Grassland, Vec<Tile>)> = Vec::new();
        for cluster in open_clusters {
            if cluster.len() < MIN_GRASSLAND_TILES {
                continue;
            }
            let mean_moisture = cluster
                .iter()
                .map(|tile| self.hydrology_list[tile.index()].moisture)
                .sum::<f64>()
                / cluster.len() as f64;
            let grassland = Grassland {
                area: self.cluster_area(&cluster),
                grass_height: 0.2 + mean_moisture * random.random_range(0.4..1.0),
                forb_fraction: config.diversity * random.random_range(0.2..0.8),
            };
            grasslands.push((grassland, cluster));
        }

        // Commit summaries, then features and claims.
        self.vegetation_list = self
            .all_tiles()
            .map(|tile| VegetationSummary {
                canopy_cover: canopy_cover[tile.index()],
                understory_light: understory_light[tile.index()],
                dominant_species: species_by_tile[tile.index()],
            })
            .collect();

        let forest_count = forests.len();
        for (forest, tiles) in forests {
            let id = self.feature_registry.insert(MapFeature::Forest(forest));
            for tile in tiles {
                self.claim_tile(tile, id);
            }
        }
        for (grassland, tiles) in grasslands {
            let id = self.feature_registry.insert(MapFeature::Grassland(grassland));
            for tile in tiles {
                self.claim_tile(tile, id);
            }
        }

        self.mark_stage_complete(PipelineStage::Vegetation);
        log::debug!("vegetation committed: {forest_count} forests");
        Ok(())
    }

    /// Whether a tile can carry canopy trees.
    fn suits_trees(&self, tile: Tile) -> bool {
        let terrain = self.terrain_type_list[tile.index()];
        let topography = &self.topography_list[tile.index()];
        let geology = &self.geology_list[tile.index()];
        let hydrology = &self.hydrology_list[tile.index()];
        matches!(terrain, TerrainType::Flatland | TerrainType::Hill)
            && topography.slope < 0.25
            && geology.soil_depth >= 0.25
            && hydrology.moisture >= 0.35
            && hydrology.water_depth < 0.5
    }

    /// Grafts adjacent compatible trees with touching canopies.
    ///
    /// Only trees on the same or a neighboring tile can be close enough to
    /// touch. Trees are visited in id order and each grafts into at most
    /// one earlier tree, so the pass is deterministic.
    fn graft_adjacent_trees(&self, forest: &mut Forest) -> Result<(), GenerationError> {
        let mut trees_by_tile: Vec<Vec<TreeId>> = vec![Vec::new(); self.tile_count()];
        let tile_of: Vec<usize> = forest
            .trees()
            .iter()
            .map(|tree| {
                self.grid
                    .index_of(tree.position.tile())
                    .expect("forest trees sit on in-grid tiles")
            })
            .collect();
        for tree in forest.trees() {
            trees_by_tile[tile_of[tree.id.0 as usize]].push(tree.id);
        }

        for source_index in 1..forest.trees().len() {
            let source = TreeId(source_index as u32);
            let offset = self.grid.offset_of(tile_of[source_index]);

            let mut candidates: Vec<TreeId> = Vec::new();
            let mut collect = |tile_index: usize| {
                candidates.extend(
                    trees_by_tile[tile_index]
                        .iter()
                        .copied()
                        .filter(|id| id.0 < source.0),
                );
            };
            collect(tile_of[source_index]);
            for direction in crate::grid::Direction::ALL_NEIGHBORS {
                if let Some(neighbor_index) = self.grid.index_of(offset.step(direction)) {
                    collect(neighbor_index);
                }
            }
            candidates.sort();

            for target in candidates {
                if forest.graft(source, target, self.cell_size)? {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Connected components (8-neighbor) of tiles matching the predicate,
    /// discovered in tile index order.
    fn connected_clusters(&self, qualifies: impl Fn(Tile) -> bool) -> Vec<Vec<Tile>> {
        let mut assigned = vec![false; self.tile_count()];
        let mut clusters = Vec::new();
        for start in self.all_tiles() {
            if assigned[start.index()] || !qualifies(start) {
                continue;
            }
            let mut cluster = Vec::new();
            let mut queue = VecDeque::from([start]);
            assigned[start.index()] = true;
            while let Some(tile) = queue.pop_front() {
                cluster.push(tile);
                for neighbor in tile.neighbor_tiles(&self.grid) {
                    if !assigned[neighbor.index()] && qualifies(neighbor) {
                        assigned[neighbor.index()] = true;
                        queue.push_back(neighbor);
                    }
                }
            }
            clusters.push(cluster);
        }
        clusters
    }

    /// The bounding area of a tile cluster, in map units.
    fn cluster_area(&self, cluster: &[Tile]) -> FeatureArea {
        cluster
            .iter()
            .map(|tile| FeatureArea::tile(tile.to_offset_coordinate(&self.grid)))
            .reduce(|a, b| a.union(&b))
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        feature::MapFeature,
        map_parameters::MapParameters,
        tile_map::TileMap,
    };

    fn generated_map(density: f64) -> TileMap {
        let mut parameters = MapParameters::default();
        parameters.vegetation.density = density;
        let mut map = TileMap::new(&parameters);
        map.generate_geology(&parameters).unwrap();
        map.generate_topography(&parameters).unwrap();
        map.generate_hydrology(&parameters).unwrap();
        map.generate_vegetation(&parameters).unwrap();
        map
    }

    #[test]
    fn every_tree_lies_inside_its_forest() {
        let map = generated_map(1.5);
        for (_, feature) in map.feature_registry.iter() {
            if let MapFeature::Forest(forest) = feature {
                assert!(forest.contains_all_trees());
            }
        }
    }

    #[test]
    fn understory_light_is_attenuated_under_canopy() {
        let map = generated_map(1.5);
        for summary in &map.vegetation_list {
            assert!((0.0..=1.0).contains(&summary.canopy_cover));
            assert!((0.05..=1.0).contains(&summary.understory_light));
            if summary.canopy_cover > 0.9 {
                assert!(summary.understory_light < 0.5);
            }
        }
    }

    #[test]
    fn vegetation_is_deterministic() {
        let first = generated_map(1.0);
        let second = generated_map(1.0);
        assert_eq!(first.vegetation_list, second.vegetation_list);
        assert_eq!(first.feature_registry, second.feature_registry);
    }

    #[test]
    fn grafts_point_at_earlier_compatible_trees() {
        let map = generated_map(2.0);
        for (_, feature) in map.feature_registry.iter() {
            if let MapFeature::Forest(forest) = feature {
                for tree in forest.trees() {
                    if let Some(target) = tree.grafted_into {
                        assert!(target.0 < tree.id.0);
                        assert!(
                            tree.species
                                .can_graft_with(forest.tree(target).species)
                        );
                    }
                }
            }
        }
    }
}
