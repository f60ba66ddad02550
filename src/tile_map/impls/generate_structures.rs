use rand::Rng;
use rand::seq::IndexedRandom;

use crate::{
    error::GenerationError,
    feature::{
        Bridge, BridgeDeck, Building, BuildingKind, Footprint, MapFeature, Road, RoadSurface,
        Room, RoomId, RoomKind, WallMaterial,
    },
    grid::{Direction, OffsetCoordinate},
    map_parameters::MapParameters,
    spatial::{Dimensions, FeatureArea, Position},
    tile_map::{PipelineStage, Tile, TileMap},
};

/// How many placements are tried before a building is given up on.
const MAX_PLACEMENT_ATTEMPTS: u32 = 10;

/// Step budget of the road walker, per road.
const MAX_ROAD_STEPS: usize = 1200;

impl TileMap {
    /// Generates the artificial structure layer: buildings with interiors,
    /// roads between them and bridges where a road must cross a river.
    ///
    /// A building is committed only after its footprint passes terrain
    /// suitability and collides with no committed footprint; a collision or
    /// unsuitable site is retried with a new position up to a fixed bound,
    /// then the building is skipped.
    pub fn generate_structures(
        &mut self,
        map_parameters: &MapParameters,
    ) -> Result<(), GenerationError> {
        self.ensure_stage(PipelineStage::Vegetation, "structures")?;

        let mut random = self.seed.rng("structures");
        let config = &map_parameters.structures;

        let mut buildings: Vec<(Building, Vec<Tile>)> = Vec::new();
        if config.generate_buildings {
            let target = ((config.building_density * self.tile_count() as f64) / 150.0)
                .round()
                .clamp(0.0, 12.0) as u32;
            for number in 0..target {
                match self.place_building(number, &mut random, map_parameters, &buildings) {
                    Some(placed) => buildings.push(placed),
                    None => log::warn!(
                        "no valid site for building {} after {} attempts",
                        number + 1,
                        MAX_PLACEMENT_ATTEMPTS
                    ),
                }
            }
        }

        // Register buildings before roads so road claims can defer to them.
        let mut building_ids = Vec::with_capacity(buildings.len());
        let mut sites: Vec<Tile> = Vec::with_capacity(buildings.len());
        for (building, tiles) in buildings {
            let door_tile = tiles[0];
            let id = self.feature_registry.insert(MapFeature::Building(building));
            for tile in tiles {
                self.claim_tile(tile, id);
            }
            building_ids.push(id);
            sites.push(door_tile);
        }

        if config.generate_roads && sites.len() >= 2 {
            // One road per consecutive site pair keeps the network a
            // spanning chain.
            for pair in 0..sites.len() - 1 {
                self.build_road(pair, sites[pair], sites[pair + 1], &mut random)?;
            }
        }

        self.mark_stage_complete(PipelineStage::Structures);
        log::debug!("structures committed: {} buildings", building_ids.len());
        Ok(())
    }

    /// Tries to place one building, retrying on unsuitable terrain or
    /// footprint collision.
    fn place_building(
        &self,
        number: u32,
        random: &mut rand::rngs::StdRng,
        map_parameters: &MapParameters,
        committed: &[(Building, Vec<Tile>)],
    ) -> Option<(Building, Vec<Tile>)> {
        const KINDS: [BuildingKind; 5] = [
            BuildingKind::Cottage,
            BuildingKind::Farmhouse,
            BuildingKind::Watchtower,
            BuildingKind::Barn,
            BuildingKind::Chapel,
        ];

        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let kind = *KINDS.choose(random).unwrap();
            let (width, height) = kind.footprint_edges();
            let max_x = self.grid.width().saturating_sub(width + 1);
            let max_y = self.grid.height().saturating_sub(height + 1);
            let origin = OffsetCoordinate::new(
                random.random_range(1..=max_x as i32),
                random.random_range(1..=max_y as i32),
            );

            let area = FeatureArea::new(
                Position::from_finite(origin.0.x as f64, origin.0.y as f64),
                Dimensions::new(width, height).expect("kind footprints are positive"),
            );
            let Ok(footprint) = Footprint::rectangular(area) else {
                continue;
            };

            let Some(tiles) = self.footprint_tiles(&area) else {
                continue;
            };
            if !self.site_suits_building(kind, &tiles) {
                continue;
            }
            if committed
                .iter()
                .any(|(other, _)| other.footprint.intersects(&footprint))
            {
                // Footprint collision; never resolved silently, the site is
                // rerolled.
                continue;
            }

            let material = self.pick_material(map_parameters, random);
            let orientation = *[
                Direction::North,
                Direction::East,
                Direction::South,
                Direction::West,
            ]
            .choose(random)
            .unwrap();
            let mut building = Building::new(
                format!("{} {}", kind.name(), number + 1),
                kind,
                footprint,
                orientation,
                material,
                random.random_range(0.5..1.0),
                random.random_range(5..120),
            );
            Self::furnish_interior(&mut building, random);
            return Some((building, tiles));
        }
        None
    }

    /// The tiles a footprint covers, or `None` if any falls off the grid.
    fn footprint_tiles(&self, area: &FeatureArea) -> Option<Vec<Tile>> {
        let origin_x = area.origin().x() as i32;
        let origin_y = area.origin().y() as i32;
        let mut tiles = Vec::new();
        for y in 0..area.dimensions().height() as i32 {
            for x in 0..area.dimensions().width() as i32 {
                tiles.push(Tile::from_offset_coordinate(
                    &self.grid,
                    OffsetCoordinate::new(origin_x + x, origin_y + y),
                )?);
            }
        }
        Some(tiles)
    }

    /// Terrain suitability: dry, passable ground with a slope the
    /// foundation tolerates, clear of water-feature claims.
    fn site_suits_building(&self, kind: BuildingKind, tiles: &[Tile]) -> bool {
        tiles.iter().all(|&tile| {
            let terrain = self.terrain_type_list[tile.index()];
            let slope = self.topography_list[tile.index()].slope;
            let water_depth = self.hydrology_list[tile.index()].water_depth;
            let claims = &self.claimed_feature_list[tile.index()];
            let blocked_by_water_feature = claims.iter().any(|&id| {
                matches!(
                    self.feature_registry.get(id),
                    MapFeature::River(_)
                        | MapFeature::Lake(_)
                        | MapFeature::Wetland(_)
                        | MapFeature::Spring(_)
                )
            });
            terrain.is_passable()
                && terrain != crate::tile_component::TerrainType::Water
                && slope <= kind.max_foundation_slope()
                && water_depth == 0.0
                && !blocked_by_water_feature
        })
    }

    /// Picks a wall material that holds up in the biome.
    fn pick_material(
        &self,
        map_parameters: &MapParameters,
        random: &mut rand::rngs::StdRng,
    ) -> WallMaterial {
        const MATERIALS: [WallMaterial; 4] = [
            WallMaterial::Timber,
            WallMaterial::Stone,
            WallMaterial::Brick,
            WallMaterial::WattleAndDaub,
        ];
        let suitable: Vec<WallMaterial> = MATERIALS
            .iter()
            .copied()
            .filter(|material| material.suits_biome(map_parameters.biome))
            .collect();
        *suitable.choose(random).unwrap()
    }

    /// Packs rooms onto each floor greedily by remaining area and wires the
    /// room graph as a chain with a cross-link.
    fn furnish_interior(building: &mut Building, random: &mut rand::rngs::StdRng) {
        let kind = building.kind;
        let levels: Vec<i32> = building.floors().iter().map(|floor| floor.level).collect();
        let mut next_room_id = 0u32;

        for level in levels {
            let floor = building.floor_mut(level).expect("level comes from the list");
            let total = floor.footprint_area;

            let plan: Vec<(RoomKind, f64)> = match (level, kind) {
                (level, _) if level < 0 => vec![(RoomKind::Cellar, total)],
                (0, BuildingKind::Barn) => vec![(RoomKind::Stable, total)],
                (0, _) => vec![
                    (RoomKind::Hall, (total * 0.4).max(1.0)),
                    (RoomKind::Kitchen, (total * 0.3).max(1.0)),
                    (RoomKind::Storage, total * 0.3),
                ],
                (_, BuildingKind::Watchtower) => vec![(RoomKind::Chamber, total)],
                _ => vec![
                    (RoomKind::Chamber, (total * 0.5).max(1.0)),
                    (RoomKind::Chamber, total * 0.5),
                ],
            };

            let mut placed: Vec<RoomId> = Vec::new();
            for (room_kind, wanted) in plan {
                // Greedy: trim the request to whatever area is left.
                let granted = wanted.min(floor.remaining_area());
                if granted < 0.5 {
                    continue;
                }
                let id = RoomId(next_room_id);
                if floor
                    .add_room(Room {
                        id,
                        kind: room_kind,
                        area: granted,
                        connections: Vec::new(),
                    })
                    .is_ok()
                {
                    next_room_id += 1;
                    placed.push(id);
                }
            }

            for window in placed.windows(2) {
                floor.connect_rooms(window[0], window[1]);
            }
            // A second doorway somewhere keeps larger floors from being a
            // dead-end corridor.
            if placed.len() > 2 && random.random_bool(0.5) {
                floor.connect_rooms(placed[0], *placed.last().unwrap());
            }
        }
    }

    /// Walks a road from one site toward another, bridging rivers on the
    /// way. The walker greedily minimizes remaining distance with slope and
    /// water penalties.
    fn build_road(
        &mut self,
        number: usize,
        from: Tile,
        to: Tile,
        random: &mut rand::rngs::StdRng,
    ) -> Result<(), GenerationError> {
        let goal = self.tile_center(to);
        let mut current = from;
        let mut visited = vec![false; self.tile_count()];
        let mut path: Vec<Position> = vec![self.tile_center(from)];
        let mut road_tiles: Vec<Tile> = vec![from];
        let mut crossings: Vec<(Tile, Direction, crate::feature::FeatureId)> = Vec::new();
        visited[from.index()] = true;

        let mut reached = false;
        for _ in 0..MAX_ROAD_STEPS {
            if current == to {
                reached = true;
                break;
            }
            let mut best: Option<(f64, Direction, Tile)> = None;
            for direction in Direction::ALL_NEIGHBORS {
                let Some(next) = current.neighbor_tile(direction, &self.grid) else {
                    continue;
                };
                if visited[next.index()] || self.lake_claim(next) {
                    continue;
                }
                let cost = self.road_step_cost(next) + self.tile_center(next).distance_to(&goal);
                if best.is_none_or(|(best_cost, _, _)| cost < best_cost) {
                    best = Some((cost, direction, next));
                }
            }
            let Some((_, direction, next)) = best else {
                break;
            };

            if let Some(river) = self.river_claim(next)
                && !self.bridge_claim(next)
            {
                crossings.push((next, direction, river));
            }
            visited[next.index()] = true;
            path.push(self.tile_center(next));
            road_tiles.push(next);
            current = next;
        }

        if !reached {
            // The walker boxed itself in; the road is dropped rather than
            // committed half-built.
            log::warn!("road {} abandoned before reaching its endpoint", number + 1);
            return Ok(());
        }

        let area = road_tiles
            .iter()
            .map(|tile| FeatureArea::tile(tile.to_offset_coordinate(&self.grid)))
            .reduce(|a, b| a.union(&b))
            .unwrap();
        let surface = *[
            RoadSurface::Dirt,
            RoadSurface::Dirt,
            RoadSurface::Gravel,
            RoadSurface::Cobblestone,
        ]
        .choose(random)
        .unwrap();
        let road = Road {
            name: format!("Road {}", number + 1),
            area,
            path,
            width: 3.0,
            surface,
        };
        let road_id = self.feature_registry.insert(MapFeature::Road(road));
        for &tile in &road_tiles {
            // A river tile is carried by its bridge, never claimed by the
            // road itself.
            if self.river_claim(tile).is_none() {
                self.claim_tile(tile, road_id);
            }
        }

        for (index, (tile, direction, river)) in crossings.into_iter().enumerate() {
            let deck = if surface == RoadSurface::Cobblestone {
                BridgeDeck::Stone
            } else {
                BridgeDeck::Timber
            };
            let bridge = Bridge {
                name: format!("Bridge {}-{}", number + 1, index + 1),
                area: FeatureArea::tile(tile.to_offset_coordinate(&self.grid)),
                position: self.tile_center(tile),
                span_direction: direction,
                deck_material: deck,
                crossed_river: river,
            };
            let bridge_id = self.feature_registry.insert(MapFeature::Bridge(bridge));
            self.claim_tile(tile, bridge_id);
        }
        Ok(())
    }

    /// Step cost of routing a road over a tile.
    fn road_step_cost(&self, tile: Tile) -> f64 {
        let topography = &self.topography_list[tile.index()];
        let hydrology = &self.hydrology_list[tile.index()];
        let mut cost = topography.slope * 40.0;
        if self.terrain_type_list[tile.index()] == crate::tile_component::TerrainType::Mountain {
            cost += 1000.0;
        }
        if hydrology.water_depth > 0.0 {
            // Crossable only over a river; standing lake water is avoided
            // outright.
            cost += if self.river_claim(tile).is_some() {
                25.0
            } else {
                1000.0
            };
        }
        cost
    }

    /// The river claiming a tile, if any.
    fn river_claim(&self, tile: Tile) -> Option<crate::feature::FeatureId> {
        self.claimed_feature_list[tile.index()]
            .iter()
            .copied()
            .find(|&id| matches!(self.feature_registry.get(id), MapFeature::River(_)))
    }

    /// Whether a lake claims the tile. Roads must route around lakes; only
    /// rivers can be bridged.
    fn lake_claim(&self, tile: Tile) -> bool {
        self.claimed_feature_list[tile.index()]
            .iter()
            .any(|&id| matches!(self.feature_registry.get(id), MapFeature::Lake(_)))
    }

    /// Whether an earlier road already bridged the tile. Later roads share
    /// the existing bridge instead of stacking a second one.
    fn bridge_claim(&self, tile: Tile) -> bool {
        self.claimed_feature_list[tile.index()]
            .iter()
            .any(|&id| matches!(self.feature_registry.get(id), MapFeature::Bridge(_)))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        feature::MapFeature,
        map_parameters::MapParameters,
        tile_map::TileMap,
    };

    fn generated_map() -> TileMap {
        let mut parameters = MapParameters::default();
        parameters.structures.building_density = 1.0;
        let mut map = TileMap::new(&parameters);
        map.generate_geology(&parameters).unwrap();
        map.generate_topography(&parameters).unwrap();
        map.generate_hydrology(&parameters).unwrap();
        map.generate_vegetation(&parameters).unwrap();
        map.generate_structures(&parameters).unwrap();
        map
    }

    #[test]
    fn committed_building_footprints_never_overlap() {
        let map = generated_map();
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
    fn room_areas_fit_their_floors() {
        let map = generated_map();
        for (_, feature) in map.feature_registry.iter() {
            if let MapFeature::Building(building) = feature {
                for floor in building.floors() {
                    let used: f64 = floor.rooms().iter().map(|room| room.area).sum();
                    assert!(used <= floor.footprint_area + 1e-9);
                    for room in floor.rooms() {
                        for connection in &room.connections {
                            let other = floor
                                .rooms()
                                .iter()
                                .find(|candidate| candidate.id == *connection)
                                .expect("connections point at rooms on the same floor");
                            assert!(other.connections.contains(&room.id));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn bridges_only_appear_on_river_tiles() {
        let map = generated_map();
        for (_, feature) in map.feature_registry.iter() {
            if let MapFeature::Bridge(bridge) = feature {
                assert!(matches!(
                    map.feature_registry.get(bridge.crossed_river),
                    MapFeature::River(_)
                ));
            }
        }
    }

    #[test]
    fn structures_are_deterministic() {
        let first = generated_map();
        let second = generated_map();
        assert_eq!(first.feature_registry, second.feature_registry);
        assert_eq!(first.claimed_feature_list, second.claimed_feature_list);
    }
}
