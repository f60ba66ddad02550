use std::collections::VecDeque;

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::{
    error::GenerationError,
    feature::{
        FeatureId, Lake, LakeFormation, MapFeature, River, RiverPoint, RiverSegmentType,
        ShorelinePoint, Spring, Wetland, WetlandKind,
    },
    grid::Direction,
    map_parameters::MapParameters,
    spatial::{FeatureArea, Position},
    tile_component::{HydrologySummary, TerrainType},
    tile_map::{PipelineStage, Tile, TileMap},
};

/// Maximum number of steps a river trace may take before it is abandoned.
const MAX_TRACE_STEPS: usize = 2000;

/// Slope above which a river segment runs as rapids.
const RAPIDS_SLOPE: f64 = 0.06;

/// Minimum number of path points for a traced river to be kept.
const MIN_RIVER_LENGTH: usize = 3;

/// Minimum tile distance between two river sources.
const SOURCE_SPACING: i32 = 4;

/// Piecewise-linear interpolation between the dry (0.25), default (1.0) and
/// wet (4.0) water-abundance anchors.
fn abundance_lerp(abundance: f64, dry: f64, default: f64, wet: f64) -> f64 {
    let abundance = abundance.clamp(0.25, 4.0);
    if abundance <= 1.0 {
        let t = (abundance - 0.25) / 0.75;
        dry + (default - dry) * t
    } else {
        let t = (abundance - 1.0) / 3.0;
        default + (wet - default) * t
    }
}

/// A river while it is being traced, before registration.
struct TracedRiver {
    source_tile: Tile,
    path: Vec<RiverPoint>,
    tiles: Vec<Tile>,
    /// Index of the traced river this one flows into, with the junction
    /// position, when the trace ended in a confluence.
    joins: Option<(usize, Position)>,
    /// Index of the lake this river feeds, when the trace ended in a lake.
    feeds_lake: Option<usize>,
}

/// A lake component while it is being assembled, before registration.
struct LakeBasin {
    tiles: Vec<Tile>,
    formation: LakeFormation,
    average_depth: f64,
    max_depth: f64,
    area: FeatureArea,
    shoreline: Vec<ShorelinePoint>,
    islands: Vec<Position>,
    inlets: Vec<Position>,
    outlets: Vec<Position>,
}

impl TileMap {
    /// Generates the hydrology layer.
    ///
    /// The steps, in order: flow directions by steepest descent, flow
    /// accumulation over the descending elevation order, lakes from
    /// connected water-terrain basins, rivers traced downhill from
    /// above-threshold channel heads, then springs and wetlands by
    /// threshold sampling. All thresholds shift with the water-abundance
    /// configuration through a documented piecewise-linear interpolation.
    pub fn generate_hydrology(
        &mut self,
        map_parameters: &MapParameters,
    ) -> Result<(), GenerationError> {
        self.ensure_stage(PipelineStage::Topography, "hydrology")?;

        let mut random = self.seed.rng("hydrology");
        let abundance = map_parameters.hydrology.water_abundance;
        let scan_order = self.neighbor_scan_order();

        let elevations: Vec<f64> = self
            .topography_list
            .iter()
            .map(|summary| summary.elevation)
            .collect();

        // Step 1: flow directions. Water tiles do not drain anywhere.
        let flow_directions: Vec<Direction> = self
            .all_tiles()
            .map(|tile| {
                if self.terrain_type_list[tile.index()] == TerrainType::Water {
                    Direction::None
                } else {
                    self.downhill_aspect(tile, &elevations, &scan_order)
                }
            })
            .collect();

        // Step 2: flow accumulation. Tiles are processed from the highest
        // elevation down (ties broken by index) so every contribution is
        // committed before it is passed on.
        let mut accumulation = vec![1.0_f64; self.tile_count()];
        let mut descending: Vec<Tile> = self.all_tiles().collect();
        descending.sort_by(|a, b| {
            elevations[b.index()]
                .total_cmp(&elevations[a.index()])
                .then(a.index().cmp(&b.index()))
        });
        for &tile in &descending {
            let direction = flow_directions[tile.index()];
            if direction == Direction::None {
                continue;
            }
            if let Some(target) = tile.neighbor_tile(direction, &self.grid) {
                accumulation[target.index()] += accumulation[tile.index()];
            }
        }

        // Step 3: lakes from connected water-terrain basins.
        let (basins, lake_index_by_tile) = self.collect_lake_basins(&mut random);

        // Step 4: rivers.
        let mut traced: Vec<TracedRiver> = Vec::new();
        let mut river_owner: Vec<Option<usize>> = vec![None; self.tile_count()];
        if map_parameters.hydrology.generate_rivers {
            let source_threshold = abundance_lerp(abundance, 40.0, 22.0, 8.0);
            let sources = self.select_river_sources(
                &accumulation,
                &flow_directions,
                &lake_index_by_tile,
                source_threshold,
            );
            for source in sources {
                let index = traced.len();
                if let Some(river) = self.trace_river(
                    source,
                    &flow_directions,
                    &accumulation,
                    &lake_index_by_tile,
                    &river_owner,
                ) {
                    for &tile in &river.tiles {
                        if river_owner[tile.index()].is_none() {
                            river_owner[tile.index()] = Some(index);
                        }
                    }
                    traced.push(river);
                }
            }
        }

        // Step 5: per-tile moisture from water proximity and permeability.
        let moisture = self.compute_moisture(abundance, &lake_index_by_tile, &river_owner);

        // Step 6: springs by threshold sampling with per-tile streams.
        let springs = self.sample_springs(abundance, &moisture, &lake_index_by_tile, &river_owner);

        // Step 7: wetlands where moisture stays above the abundance-shifted
        // floor on flat ground.
        let wetlands =
            self.collect_wetlands(abundance, &moisture, &lake_index_by_tile, &river_owner);

        // Commit: summaries first, then features and claims, in a fixed
        // registration order (lakes, rivers, springs, wetlands).
        let mut water_depth = vec![0.0_f64; self.tile_count()];
        for (basin_index, basin) in basins.iter().enumerate() {
            for &tile in &basin.tiles {
                let boundary = tile.neighbor_tiles(&self.grid).iter().any(|neighbor| {
                    lake_index_by_tile[neighbor.index()] != Some(basin_index)
                });
                water_depth[tile.index()] = if boundary {
                    basin.average_depth * 0.5
                } else {
                    basin.average_depth
                };
            }
        }
        for river in &traced {
            for (point, tile) in river.path.iter().zip(&river.tiles) {
                if water_depth[tile.index()] == 0.0 {
                    water_depth[tile.index()] = point.depth;
                }
            }
        }

        self.hydrology_list = self
            .all_tiles()
            .map(|tile| HydrologySummary {
                flow_accumulation: accumulation[tile.index()],
                flow_direction: flow_directions[tile.index()],
                water_depth: water_depth[tile.index()],
                moisture: moisture[tile.index()],
            })
            .collect();

        self.register_water_features(basins, traced, springs, wetlands)?;
        self.mark_stage_complete(PipelineStage::Hydrology);
        Ok(())
    }

    /// Finds connected components of water terrain and assembles a lake
    /// basin for each. Components are discovered in tile index order so the
    /// resulting lake list is deterministic.
    fn collect_lake_basins(
        &self,
        random: &mut rand::rngs::StdRng,
    ) -> (Vec<LakeBasin>, Vec<Option<usize>>) {
        let mut lake_index_by_tile: Vec<Option<usize>> = vec![None; self.tile_count()];
        let mut basins = Vec::new();

        for start in self.all_tiles() {
            if self.terrain_type_list[start.index()] != TerrainType::Water
                || lake_index_by_tile[start.index()].is_some()
            {
                continue;
            }

            let basin_index = basins.len();
            let mut tiles = Vec::new();
            let mut queue = VecDeque::from([start]);
            lake_index_by_tile[start.index()] = Some(basin_index);
            while let Some(tile) = queue.pop_front() {
                tiles.push(tile);
                for neighbor in tile.neighbor_tiles(&self.grid) {
                    if self.terrain_type_list[neighbor.index()] == TerrainType::Water
                        && lake_index_by_tile[neighbor.index()].is_none()
                    {
                        lake_index_by_tile[neighbor.index()] = Some(basin_index);
                        queue.push_back(neighbor);
                    }
                }
            }

            basins.push(self.assemble_basin(tiles, random, &lake_index_by_tile, basin_index));
        }

        (basins, lake_index_by_tile)
    }

    fn assemble_basin(
        &self,
        tiles: Vec<Tile>,
        random: &mut rand::rngs::StdRng,
        lake_index_by_tile: &[Option<usize>],
        basin_index: usize,
    ) -> LakeBasin {
        // Formation from the basin's dominant bedrock and elevation.
        let mut basalt = 0;
        let mut granite = 0;
        let mut elevation_sum = 0.0;
        for &tile in &tiles {
            match self.geology_list[tile.index()].bedrock {
                crate::tile_component::BedrockType::Basalt => basalt += 1,
                crate::tile_component::BedrockType::Granite => granite += 1,
                _ => {}
            }
            elevation_sum += self.topography_list[tile.index()].elevation;
        }
        let mean_elevation = elevation_sum / tiles.len() as f64;
        let formation = if basalt * 2 > tiles.len() {
            LakeFormation::Volcanic
        } else if mean_elevation > 0.55 {
            LakeFormation::Glacial
        } else if granite * 2 > tiles.len() {
            LakeFormation::Tectonic
        } else {
            LakeFormation::Fluvial
        };

        let max_depth = 1.0 + 0.25 * (tiles.len() as f64).sqrt();
        let average_depth = max_depth * 0.4;

        let area = tiles
            .iter()
            .map(|tile| FeatureArea::tile(tile.to_offset_coordinate(&self.grid)))
            .reduce(|a, b| a.union(&b))
            .unwrap();

        // Shoreline: boundary tiles ordered counter-clockwise around the
        // centroid. Shore types are drawn after the ordering is fixed so
        // the draws land on a deterministic sequence of points.
        let centroid = area.center();
        let mut boundary: Vec<Tile> = tiles
            .iter()
            .copied()
            .filter(|tile| {
                tile.is_on_edge(&self.grid)
                    || tile
                        .neighbor_tiles(&self.grid)
                        .iter()
                        .any(|neighbor| lake_index_by_tile[neighbor.index()] != Some(basin_index))
            })
            .collect();
        boundary.sort_by(|a, b| {
            let angle = |tile: &Tile| {
                let position = self.tile_center(*tile);
                (position.y() - centroid.y()).atan2(position.x() - centroid.x())
            };
            angle(a).total_cmp(&angle(b)).then(a.index().cmp(&b.index()))
        });
        let candidates = formation.shore_candidates();
        let shoreline = boundary
            .iter()
            .map(|&tile| {
                let shore_type = *candidates.choose(random).unwrap();
                ShorelinePoint {
                    position: self.tile_center(tile),
                    shore_type,
                    accessible: shore_type.is_accessible(),
                }
            })
            .collect();

        // Islands: land tiles whose every neighbor is basin water.
        let islands = self
            .all_tiles()
            .filter(|tile| {
                self.terrain_type_list[tile.index()] != TerrainType::Water && {
                    let neighbors = tile.neighbor_tiles(&self.grid);
                    !neighbors.is_empty()
                        && neighbors
                            .iter()
                            .all(|n| lake_index_by_tile[n.index()] == Some(basin_index))
                }
            })
            .map(|tile| self.tile_center(tile))
            .collect();

        LakeBasin {
            tiles,
            formation,
            average_depth,
            max_depth,
            area,
            shoreline,
            islands,
            inlets: Vec::new(),
            outlets: Vec::new(),
        }
    }

    /// River sources: heads of the above-threshold channel network, with a
    /// minimum spacing, scanned in tile index order.
    fn select_river_sources(
        &self,
        accumulation: &[f64],
        flow_directions: &[Direction],
        lake_index_by_tile: &[Option<usize>],
        threshold: f64,
    ) -> Vec<Tile> {
        let mut sources = Vec::new();
        for tile in self.all_tiles() {
            if lake_index_by_tile[tile.index()].is_some()
                || accumulation[tile.index()] < threshold
                || flow_directions[tile.index()] == Direction::None
            {
                continue;
            }
            // A head has no above-threshold neighbor draining into it.
            let is_head = !tile.neighbor_tiles(&self.grid).iter().any(|neighbor| {
                accumulation[neighbor.index()] >= threshold
                    && flow_directions[neighbor.index()] != Direction::None
                    && neighbor.neighbor_tile(flow_directions[neighbor.index()], &self.grid)
                        == Some(tile)
            });
            if !is_head {
                continue;
            }
            let offset = tile.to_offset_coordinate(&self.grid);
            let well_spaced = sources.iter().all(|existing: &Tile| {
                let other = existing.to_offset_coordinate(&self.grid);
                (offset.0.x - other.0.x).abs().max((offset.0.y - other.0.y).abs())
                    >= SOURCE_SPACING
            });
            if well_spaced {
                sources.push(tile);
            }
        }
        sources
    }

    /// Traces one river downhill, classifying segments as it goes.
    fn trace_river(
        &self,
        source: Tile,
        flow_directions: &[Direction],
        accumulation: &[f64],
        lake_index_by_tile: &[Option<usize>],
        river_owner: &[Option<usize>],
    ) -> Option<TracedRiver> {
        let mut path: Vec<RiverPoint> = Vec::new();
        let mut tiles: Vec<Tile> = Vec::new();
        let mut joins = None;
        let mut feeds_lake = None;
        let mut current = source;
        let mut previous_direction = Direction::None;

        for step in 0..MAX_TRACE_STEPS {
            let direction = flow_directions[current.index()];
            let slope = self.topography_list[current.index()].slope;
            let flow = accumulation[current.index()];
            let width = (1.5 + 0.45 * flow.sqrt()).min(12.0);
            let depth = (0.25 + 0.12 * flow.sqrt()).min(3.0);

            let segment_type = if step == 0 {
                RiverSegmentType::Source
            } else if slope > RAPIDS_SLOPE {
                RiverSegmentType::Rapids
            } else {
                classify_heading_change(previous_direction, direction)
            };

            path.push(RiverPoint {
                position: self.tile_center(current),
                width,
                depth,
                flow_direction: direction,
                segment_type,
            });
            tiles.push(current);

            if direction == Direction::None {
                // Depression without an outlet; the river ends in a pool.
                path.last_mut().unwrap().segment_type = RiverSegmentType::Mouth;
                break;
            }

            let Some(next) = current.neighbor_tile(direction, &self.grid) else {
                // Flowing off the map rim.
                let terminus = path.last_mut().unwrap();
                terminus.segment_type = if slope < 0.015 && width > 4.0 {
                    RiverSegmentType::Delta
                } else {
                    RiverSegmentType::Mouth
                };
                break;
            };

            if let Some(lake) = lake_index_by_tile[next.index()] {
                path.last_mut().unwrap().segment_type = RiverSegmentType::Mouth;
                feeds_lake = Some(lake);
                break;
            }

            if let Some(owner) = river_owner[next.index()] {
                // Joining an existing river: the junction lies on the
                // receiving river's path.
                path.push(RiverPoint {
                    position: self.tile_center(next),
                    width,
                    depth,
                    flow_direction: direction,
                    segment_type: RiverSegmentType::Confluence,
                });
                tiles.push(next);
                joins = Some((owner, self.tile_center(next)));
                break;
            }

            previous_direction = direction;
            current = next;
        }

        if path.len() < MIN_RIVER_LENGTH {
            return None;
        }
        Some(TracedRiver {
            source_tile: source,
            path,
            tiles,
            joins,
            feeds_lake,
        })
    }

    /// Moisture per tile: impermeable ground holds water, and anything near
    /// open water stays damp. Abundance shifts the whole field.
    fn compute_moisture(
        &self,
        abundance: f64,
        lake_index_by_tile: &[Option<usize>],
        river_owner: &[Option<usize>],
    ) -> Vec<f64> {
        const WET_RADIUS: u32 = 6;

        // Multi-source BFS distance to the nearest water tile.
        let mut distance: Vec<u32> = vec![u32::MAX; self.tile_count()];
        let mut queue = VecDeque::new();
        for tile in self.all_tiles() {
            if lake_index_by_tile[tile.index()].is_some() || river_owner[tile.index()].is_some() {
                distance[tile.index()] = 0;
                queue.push_back(tile);
            }
        }
        while let Some(tile) = queue.pop_front() {
            let next_distance = distance[tile.index()] + 1;
            if next_distance > WET_RADIUS {
                continue;
            }
            for neighbor in tile.neighbor_tiles(&self.grid) {
                if distance[neighbor.index()] > next_distance {
                    distance[neighbor.index()] = next_distance;
                    queue.push_back(neighbor);
                }
            }
        }

        let shift = abundance_lerp(abundance, -0.10, 0.0, 0.15);
        self.all_tiles()
            .map(|tile| {
                let geology = &self.geology_list[tile.index()];
                let proximity = if distance[tile.index()] == u32::MAX {
                    0.0
                } else {
                    1.0 - distance[tile.index()] as f64 / WET_RADIUS as f64
                };
                (0.15 + 0.35 * (1.0 - geology.permeability) + 0.45 * proximity + shift)
                    .clamp(0.0, 1.0)
            })
            .collect()
    }

    /// Springs surface where a moderately steep slope cuts the water table
    /// in permeable ground. Each tile rolls its own derived stream.
    fn sample_springs(
        &self,
        abundance: f64,
        moisture: &[f64],
        lake_index_by_tile: &[Option<usize>],
        river_owner: &[Option<usize>],
    ) -> Vec<Spring> {
        let probability = abundance_lerp(abundance, 0.002, 0.006, 0.02);
        let mut springs = Vec::new();
        for tile in self.all_tiles() {
            if lake_index_by_tile[tile.index()].is_some() || river_owner[tile.index()].is_some() {
                continue;
            }
            let topography = &self.topography_list[tile.index()];
            let geology = &self.geology_list[tile.index()];
            if !(0.02..=0.2).contains(&topography.slope)
                || geology.permeability < 0.45
                || moisture[tile.index()] < 0.3
            {
                continue;
            }
            let mut tile_random = self.seed.rng_indexed("hydrology-spring", tile.index());
            if tile_random.random_range(0.0..1.0) < probability {
                let position = self.tile_center(tile);
                springs.push(Spring {
                    position,
                    discharge: tile_random.random_range(0.5..5.0),
                    pool_radius: tile_random.random_range(0.5..2.0),
                    area: FeatureArea::tile(tile.to_offset_coordinate(&self.grid)),
                });
            }
        }
        springs
    }

    /// Wetland components: contiguous flat, saturated land.
    fn collect_wetlands(
        &self,
        abundance: f64,
        moisture: &[f64],
        lake_index_by_tile: &[Option<usize>],
        river_owner: &[Option<usize>],
    ) -> Vec<(Wetland, Vec<Tile>)> {
        const MIN_WETLAND_TILES: usize = 3;
        let floor = abundance_lerp(abundance, 0.92, 0.78, 0.60);

        let qualifies = |tile: Tile| {
            lake_index_by_tile[tile.index()].is_none()
                && moisture[tile.index()] >= floor
                && self.topography_list[tile.index()].slope < 0.04
                && self.terrain_type_list[tile.index()] != TerrainType::Water
        };

        let mut assigned = vec![false; self.tile_count()];
        let mut wetlands = Vec::new();
        for start in self.all_tiles() {
            if assigned[start.index()] || !qualifies(start) {
                continue;
            }
            let mut tiles = Vec::new();
            let mut queue = VecDeque::from([start]);
            assigned[start.index()] = true;
            while let Some(tile) = queue.pop_front() {
                tiles.push(tile);
                for neighbor in tile.neighbor_tiles(&self.grid) {
                    if !assigned[neighbor.index()] && qualifies(neighbor) {
                        assigned[neighbor.index()] = true;
                        queue.push_back(neighbor);
                    }
                }
            }
            if tiles.len() < MIN_WETLAND_TILES {
                continue;
            }

            let touches_open_water = tiles.iter().any(|tile| {
                river_owner[tile.index()].is_some()
                    || tile
                        .neighbor_tiles(&self.grid)
                        .iter()
                        .any(|n| lake_index_by_tile[n.index()].is_some())
            });
            let mean_permeability = tiles
                .iter()
                .map(|tile| self.geology_list[tile.index()].permeability)
                .sum::<f64>()
                / tiles.len() as f64;
            let kind = if touches_open_water {
                WetlandKind::Marsh
            } else if mean_permeability < 0.35 {
                WetlandKind::Bog
            } else {
                WetlandKind::Fen
            };
            let mean_moisture =
                tiles.iter().map(|tile| moisture[tile.index()]).sum::<f64>() / tiles.len() as f64;

            let area = tiles
                .iter()
                .map(|tile| FeatureArea::tile(tile.to_offset_coordinate(&self.grid)))
                .reduce(|a, b| a.union(&b))
                .unwrap();
            wetlands.push((
                Wetland {
                    area,
                    kind,
                    // Saturation above 0.9 means standing water.
                    water_table: if mean_moisture > 0.9 { -0.1 } else { 0.3 },
                },
                tiles,
            ));
        }
        wetlands
    }

    /// Registers lakes, rivers, springs and wetlands in a fixed order,
    /// claims their tiles and attaches tributaries.
    fn register_water_features(
        &mut self,
        mut basins: Vec<LakeBasin>,
        traced: Vec<TracedRiver>,
        springs: Vec<Spring>,
        wetlands: Vec<(Wetland, Vec<Tile>)>,
    ) -> Result<(), GenerationError> {
        // Lake inlets/outlets from the traced rivers.
        for river in &traced {
            if let Some(lake) = river.feeds_lake {
                basins[lake].inlets.push(river.path.last().unwrap().position);
            }
            let source_offset = river.source_tile.to_offset_coordinate(&self.grid);
            for direction in Direction::ALL_NEIGHBORS {
                if let Some(neighbor) =
                    Tile::from_offset_coordinate(&self.grid, source_offset.step(direction))
                    && let Some(lake) = self
                        .terrain_type_list
                        .get(neighbor.index())
                        .and_then(|terrain| {
                            (*terrain == TerrainType::Water).then(|| {
                                basins.iter().position(|basin| basin.tiles.contains(&neighbor))
                            })
                        })
                        .flatten()
                {
                    basins[lake].outlets.push(river.path[0].position);
                    break;
                }
            }
        }

        let mut lake_ids = Vec::with_capacity(basins.len());
        for (index, basin) in basins.into_iter().enumerate() {
            let tiles = basin.tiles;
            let lake = Lake {
                name: format!("Lake {}", index + 1),
                area: basin.area,
                average_depth: basin.average_depth,
                max_depth: basin.max_depth,
                formation: basin.formation,
                shoreline: basin.shoreline,
                islands: basin.islands,
                inlets: basin.inlets,
                outlets: basin.outlets,
            };
            let id = self.feature_registry.insert(MapFeature::Lake(lake));
            for tile in tiles {
                self.claim_tile(tile, id);
            }
            lake_ids.push(id);
        }

        let mut river_ids: Vec<FeatureId> = Vec::with_capacity(traced.len());
        let mut pending_joins = Vec::new();
        for (index, river) in traced.iter().enumerate() {
            let feature = River::from_path(format!("River {}", index + 1), river.path.clone());
            let id = self.feature_registry.insert(MapFeature::River(feature));
            for &tile in &river.tiles {
                self.claim_tile(tile, id);
            }
            if let Some((main, junction)) = river.joins {
                pending_joins.push((main, index, junction));
            }
            river_ids.push(id);
        }
        for (main, tributary, junction) in pending_joins {
            let tributary_id = river_ids[tributary];
            let tributary_area = *self.feature_registry.get(tributary_id).area();
            let MapFeature::River(main_river) = self.feature_registry.get_mut(river_ids[main])
            else {
                unreachable!("river ids only point at rivers");
            };
            main_river.attach_tributary(tributary_id, &tributary_area, junction)?;
        }

        for spring in springs {
            let tile = Tile::from_offset_coordinate(
                &self.grid,
                crate::grid::OffsetCoordinate::new(
                    spring.position.x().floor() as i32,
                    spring.position.y().floor() as i32,
                ),
            )
            .expect("springs are sampled from in-grid tiles");
            let id = self.feature_registry.insert(MapFeature::Spring(spring));
            self.claim_tile(tile, id);
        }

        for (wetland, tiles) in wetlands {
            let id = self.feature_registry.insert(MapFeature::Wetland(wetland));
            for tile in tiles {
                self.claim_tile(tile, id);
            }
        }

        log::debug!(
            "hydrology committed: {} lakes, {} rivers",
            lake_ids.len(),
            river_ids.len()
        );
        Ok(())
    }

    /// The center of a tile in map units.
    pub(crate) fn tile_center(&self, tile: Tile) -> Position {
        let offset = tile.to_offset_coordinate(&self.grid);
        Position::from_finite(offset.0.x as f64 + 0.5, offset.0.y as f64 + 0.5)
    }
}

/// Classifies a segment by how sharply the flow direction turned.
fn classify_heading_change(previous: Direction, current: Direction) -> RiverSegmentType {
    if previous == Direction::None || previous == current {
        return RiverSegmentType::Straight;
    }
    let index_of = |direction: Direction| {
        Direction::ALL_NEIGHBORS
            .iter()
            .position(|&d| d == direction)
            .unwrap() as i32
    };
    let difference = (index_of(previous) - index_of(current)).rem_euclid(8);
    // 45 degrees per scan step.
    match difference.min(8 - difference) {
        0 => RiverSegmentType::Straight,
        1 => RiverSegmentType::Curve,
        _ => RiverSegmentType::Meander,
    }
}

#[cfg(test)]
mod tests {
    use super::{abundance_lerp, classify_heading_change};
    use crate::{
        feature::{MapFeature, RiverSegmentType},
        grid::Direction,
        map_parameters::MapParameters,
        tile_map::TileMap,
    };

    fn generated_map(abundance: f64) -> TileMap {
        let mut parameters = MapParameters::default();
        parameters.hydrology.water_abundance = abundance;
        let mut map = TileMap::new(&parameters);
        map.generate_geology(&parameters).unwrap();
        map.generate_topography(&parameters).unwrap();
        map.generate_hydrology(&parameters).unwrap();
        map
    }

    #[test]
    fn abundance_interpolation_hits_the_anchors() {
        assert_eq!(abundance_lerp(0.25, 40.0, 22.0, 8.0), 40.0);
        assert_eq!(abundance_lerp(1.0, 40.0, 22.0, 8.0), 22.0);
        assert_eq!(abundance_lerp(4.0, 40.0, 22.0, 8.0), 8.0);
        // Wetter always means a lower threshold.
        let mut previous = abundance_lerp(0.25, 40.0, 22.0, 8.0);
        for step in 1..=15 {
            let current = abundance_lerp(0.25 + step as f64 * 0.25, 40.0, 22.0, 8.0);
            assert!(current <= previous);
            previous = current;
        }
    }

    #[test]
    fn heading_changes_classify_segments() {
        assert_eq!(
            classify_heading_change(Direction::North, Direction::North),
            RiverSegmentType::Straight
        );
        assert_eq!(
            classify_heading_change(Direction::North, Direction::NorthEast),
            RiverSegmentType::Curve
        );
        assert_eq!(
            classify_heading_change(Direction::North, Direction::East),
            RiverSegmentType::Meander
        );
    }

    #[test]
    fn accumulation_conserves_at_least_local_rainfall() {
        let map = generated_map(1.0);
        for summary in &map.hydrology_list {
            assert!(summary.flow_accumulation >= 1.0);
        }
    }

    #[test]
    fn hydrology_is_deterministic() {
        let first = generated_map(1.0);
        let second = generated_map(1.0);
        assert_eq!(first.hydrology_list, second.hydrology_list);
        assert_eq!(first.feature_registry, second.feature_registry);
    }

    #[test]
    fn river_paths_stay_inside_their_areas() {
        let map = generated_map(2.0);
        for (_, feature) in map.feature_registry.iter() {
            if let MapFeature::River(river) = feature {
                assert!(river.contains_all_points());
                assert_eq!(river.path()[0].segment_type, RiverSegmentType::Source);
            }
        }
    }

    #[test]
    fn shorelines_conform_to_their_formation() {
        let map = generated_map(1.0);
        for (_, feature) in map.feature_registry.iter() {
            if let MapFeature::Lake(lake) = feature {
                assert!(lake.shoreline_conforms_to_formation());
            }
        }
    }

    #[test]
    fn higher_abundance_never_dries_a_tile() {
        let parameters = MapParameters::default();
        let mut map = TileMap::new(&parameters);
        map.generate_geology(&parameters).unwrap();
        map.generate_topography(&parameters).unwrap();

        // Same water layout, different abundance: every tile must be at
        // least as moist on the wetter setting.
        let no_water = vec![None; map.tile_count()];
        let dry = map.compute_moisture(0.25, &no_water, &no_water);
        let wet = map.compute_moisture(4.0, &no_water, &no_water);
        for (dry_tile, wet_tile) in dry.iter().zip(&wet) {
            assert!(wet_tile >= dry_tile);
        }
    }
}
