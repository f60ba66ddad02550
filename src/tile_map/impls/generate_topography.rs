use crate::{
    error::GenerationError,
    grid::Direction,
    map_parameters::MapParameters,
    noise::{LayeredNoise, NoiseFlags},
    tile_component::{TerrainType, TopographySummary},
    tile_map::{PipelineStage, Tile, TileMap},
};

impl TileMap {
    /// Generates the topography layer: elevation, slope, aspect and terrain
    /// types.
    ///
    /// Elevation comes from layered value noise whose octave count and
    /// persistence follow the ruggedness mapping, with relief scaled down
    /// over soft bedrock. Terrain types are assigned from elevation
    /// quantiles so the requested terrain distribution weights hold
    /// regardless of the noise realization.
    pub fn generate_topography(
        &mut self,
        map_parameters: &MapParameters,
    ) -> Result<(), GenerationError> {
        self.ensure_stage(PipelineStage::Geology, "topography")?;

        let mut random = self.seed.rng("topography");
        let size = self.grid.size;
        let config = &map_parameters.topography;

        let noise = LayeredNoise::with_ruggedness(
            &mut random,
            size,
            config.ruggedness,
            NoiseFlags::empty(),
        );

        // Relief amplitude grows with elevation variance; soft bedrock
        // erodes toward the mean.
        let amplitude = 0.5 + 0.5 * config.elevation_variance;
        let elevations: Vec<f64> = self
            .all_tiles()
            .map(|tile| {
                let offset = tile.to_offset_coordinate(&self.grid);
                let raw = noise.sample(offset.0.x as u32, offset.0.y as u32);
                let hardness = self.geology_list[tile.index()].bedrock.hardness();
                let relief_keep = 0.6 + 0.4 * hardness;
                (0.5 + (raw - 0.5) * amplitude * relief_keep).clamp(0.0, 1.0)
            })
            .collect();

        // Elevation quantiles matching the terrain distribution weights.
        let weights = &map_parameters.terrain_weights;
        let total = weights.total();
        let mut sorted = elevations.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let quantile = |fraction: f64| -> f64 {
            let index = ((sorted.len() - 1) as f64 * fraction.clamp(0.0, 1.0)).round() as usize;
            sorted[index]
        };
        let water_level = quantile(weights.water / total);
        let hill_level = quantile((weights.water + weights.flatland) / total);
        let mountain_level = quantile((weights.water + weights.flatland + weights.hill) / total);

        let terrain_types: Vec<TerrainType> = elevations
            .iter()
            .map(|&elevation| {
                if elevation < water_level {
                    TerrainType::Water
                } else if elevation < hill_level {
                    TerrainType::Flatland
                } else if elevation < mountain_level {
                    TerrainType::Hill
                } else {
                    TerrainType::Mountain
                }
            })
            .collect();

        let scan_order = self.neighbor_scan_order();
        let topography: Vec<TopographySummary> = self
            .all_tiles()
            .map(|tile| {
                let elevation = elevations[tile.index()];
                let slope = self.local_slope(tile, &elevations);
                let aspect = self.downhill_aspect(tile, &elevations, &scan_order);
                let terrain = terrain_types[tile.index()];
                TopographySummary {
                    elevation,
                    slope,
                    aspect,
                    height_multiplier: terrain.height_multiplier() * (0.8 + 0.4 * elevation),
                }
            })
            .collect();

        self.terrain_type_list = terrain_types;
        self.topography_list = topography;
        self.mark_stage_complete(PipelineStage::Topography);
        log::debug!(
            "topography committed: water level {:.3}, mountain level {:.3}",
            water_level,
            mountain_level
        );
        Ok(())
    }

    /// Gradient magnitude by central differences, clamped at the map rim.
    fn local_slope(&self, tile: Tile, elevations: &[f64]) -> f64 {
        let sample = |direction: Direction| -> f64 {
            tile.neighbor_tile(direction, &self.grid)
                .map_or(elevations[tile.index()], |neighbor| {
                    elevations[neighbor.index()]
                })
        };
        let dx = (sample(Direction::East) - sample(Direction::West)) / 2.0;
        let dy = (sample(Direction::North) - sample(Direction::South)) / 2.0;
        (dx * dx + dy * dy).sqrt()
    }

    /// The direction of steepest descent, scanning neighbors in the
    /// seed-rotated canonical order. `Direction::None` when no neighbor is
    /// lower.
    pub(crate) fn downhill_aspect(
        &self,
        tile: Tile,
        elevations: &[f64],
        scan_order: &[Direction; 8],
    ) -> Direction {
        let own = elevations[tile.index()];
        let mut best = Direction::None;
        let mut best_drop = 0.0;
        for &direction in scan_order {
            if let Some(neighbor) = tile.neighbor_tile(direction, &self.grid) {
                // Normalize by step length so diagonals are not favored.
                let drop = (own - elevations[neighbor.index()]) / direction.step_length();
                if drop > best_drop {
                    best_drop = drop;
                    best = direction;
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        map_parameters::MapParameters,
        tile_component::TerrainType,
        tile_map::TileMap,
    };

    fn generated_map() -> TileMap {
        let parameters = MapParameters::default();
        let mut map = TileMap::new(&parameters);
        map.generate_geology(&parameters).unwrap();
        map.generate_topography(&parameters).unwrap();
        map
    }

    #[test]
    fn topography_requires_geology() {
        let parameters = MapParameters::default();
        let mut map = TileMap::new(&parameters);
        let error = map.generate_topography(&parameters).unwrap_err();
        assert_eq!(error.code(), "STAGE_DEPENDENCY_MISSING");
    }

    #[test]
    fn terrain_distribution_roughly_follows_the_weights() {
        let map = generated_map();
        let water_count = map
            .terrain_type_list
            .iter()
            .filter(|&&terrain| terrain == TerrainType::Water)
            .count();
        // Default water weight is 15%; quantile assignment keeps it within
        // a few points of that.
        let fraction = water_count as f64 / map.tile_count() as f64;
        assert!(fraction > 0.05 && fraction < 0.30, "fraction {fraction}");
    }

    #[test]
    fn elevations_and_slopes_are_bounded() {
        let map = generated_map();
        for summary in &map.topography_list {
            assert!((0.0..=1.0).contains(&summary.elevation));
            assert!(summary.slope >= 0.0);
            assert!(summary.slope.is_finite());
        }
    }
}
