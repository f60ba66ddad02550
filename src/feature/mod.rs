//! The feature model: every discrete entity placed on the map (rivers,
//! lakes, forests, buildings, ...) as one tagged union, stored in an
//! id-indexed registry.
//!
//! Cross-feature references (tributaries, bridge→river, mixed-feature sets
//! on tiles) are always [`FeatureId`]s into the registry, never owned
//! sub-objects, so feature graphs cannot form ownership cycles.

use enum_map::{Enum, EnumMap, enum_map};
use serde::{Deserialize, Serialize};

use crate::{
    spatial::FeatureArea,
    tile_component::{ConcealmentLevel, CoverLevel},
};

pub mod building;
pub mod forest;
pub mod lake;
pub mod relief;
pub mod river;
pub mod road;
pub mod water;

pub use building::{
    Building, BuildingKind, Floor, Footprint, Room, RoomId, RoomKind, WallMaterial,
};
pub use forest::{Forest, Grassland, Tree, TreeId, TreeSize};
pub use lake::{Lake, LakeFormation, ShoreType, ShorelinePoint};
pub use relief::{Relief, ReliefKind};
pub use river::{River, RiverPoint, RiverSegmentType};
pub use road::{Bridge, BridgeDeck, Road, RoadSurface};
pub use water::{Spring, Wetland, WetlandKind};

/// The identity of a feature in the registry.
///
/// Ids are assigned in committed pipeline order; because the pipeline is a
/// pure function of the seed, re-generating with the same seed reproduces
/// the same ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(u32);

impl FeatureId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// The coarse category of a feature, used as the fallback key of the
/// compatibility rule table.
#[derive(Enum, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Debug)]
pub enum FeatureCategory {
    Relief,
    Natural,
    Artificial,
    Cultural,
}

/// The outcome of a pairwise mixing check.
#[derive(PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Debug)]
pub enum Compatibility {
    /// The features coexist; the dominant one wins each aspect.
    Compatible,
    /// The features reinforce each other; height contributions average.
    Synergistic,
    /// The features ignore each other.
    Neutral,
    /// The features must never share a tile.
    Incompatible,
}

/// A discrete entity placed on the map.
#[derive(PartialEq, Clone, Serialize, Deserialize, Debug)]
pub enum MapFeature {
    River(River),
    Lake(Lake),
    Spring(Spring),
    Wetland(Wetland),
    Forest(Forest),
    Grassland(Grassland),
    Building(Building),
    Road(Road),
    Bridge(Bridge),
    Relief(Relief),
}

impl MapFeature {
    pub fn name(&self) -> &str {
        match self {
            MapFeature::River(river) => &river.name,
            MapFeature::Lake(lake) => &lake.name,
            MapFeature::Spring(_) => "Spring",
            MapFeature::Wetland(_) => "Wetland",
            MapFeature::Forest(forest) => &forest.name,
            MapFeature::Grassland(_) => "Grassland",
            MapFeature::Building(building) => &building.name,
            MapFeature::Road(road) => &road.name,
            MapFeature::Bridge(bridge) => &bridge.name,
            MapFeature::Relief(relief) => relief.kind.name(),
        }
    }

    pub fn category(&self) -> FeatureCategory {
        match self {
            MapFeature::River(_)
            | MapFeature::Lake(_)
            | MapFeature::Spring(_)
            | MapFeature::Wetland(_)
            | MapFeature::Forest(_)
            | MapFeature::Grassland(_) => FeatureCategory::Natural,
            MapFeature::Building(_) | MapFeature::Road(_) | MapFeature::Bridge(_) => {
                FeatureCategory::Artificial
            }
            MapFeature::Relief(_) => FeatureCategory::Relief,
        }
    }

    /// The tie-break rank when several features claim the same aspect of a
    /// tile. Higher wins.
    pub fn priority(&self) -> u32 {
        match self {
            MapFeature::Building(_) => 90,
            MapFeature::Bridge(_) => 85,
            MapFeature::Road(_) => 70,
            MapFeature::Lake(_) => 65,
            MapFeature::River(_) => 60,
            MapFeature::Forest(_) => 50,
            MapFeature::Wetland(_) => 45,
            MapFeature::Spring(_) => 40,
            MapFeature::Relief(_) => 30,
            MapFeature::Grassland(_) => 20,
        }
    }

    pub fn area(&self) -> &FeatureArea {
        match self {
            MapFeature::River(river) => river.area(),
            MapFeature::Lake(lake) => &lake.area,
            MapFeature::Spring(spring) => &spring.area,
            MapFeature::Wetland(wetland) => &wetland.area,
            MapFeature::Forest(forest) => &forest.area,
            MapFeature::Grassland(grassland) => &grassland.area,
            MapFeature::Building(building) => building.footprint.area(),
            MapFeature::Road(road) => &road.area,
            MapFeature::Bridge(bridge) => &bridge.area,
            MapFeature::Relief(relief) => &relief.area,
        }
    }

    /// Height contributed to a tile, in meters. Averaged between
    /// synergistic features, taken from the dominant feature otherwise.
    pub fn height_contribution(&self) -> f64 {
        match self {
            MapFeature::Building(building) => building.height(),
            MapFeature::Bridge(_) => 2.5,
            MapFeature::Forest(forest) => forest.dominant_species.mature_height() * 0.6,
            MapFeature::Relief(relief) => match relief.kind {
                ReliefKind::RockOutcrop => 3.0,
                ReliefKind::Sinkhole => -2.0,
                ReliefKind::Cave => 0.0,
            },
            MapFeature::Grassland(grassland) => grassland.grass_height,
            _ => 0.0,
        }
    }

    /// The structure movement factor of the feature, multiplied into the
    /// tile's movement cost by the mixing engine.
    pub fn movement_factor(&self) -> f64 {
        match self {
            MapFeature::Building(_) => f64::INFINITY,
            MapFeature::Bridge(_) => 1.0,
            MapFeature::Road(road) => road.surface.movement_factor(),
            MapFeature::Lake(_) => 6.0,
            MapFeature::River(river) => {
                // Deep channels are fords at best.
                if river.path().iter().any(|point| point.depth > 1.5) {
                    4.0
                } else {
                    2.0
                }
            }
            MapFeature::Wetland(_) => 2.0,
            MapFeature::Spring(_) => 1.2,
            MapFeature::Forest(_) => 1.5,
            MapFeature::Relief(relief) => match relief.kind {
                ReliefKind::RockOutcrop => 1.8,
                ReliefKind::Sinkhole => 2.5,
                ReliefKind::Cave => 1.0,
            },
            MapFeature::Grassland(_) => 1.0,
        }
    }

    /// Cover the feature provides against direct fire.
    pub fn cover(&self) -> CoverLevel {
        match self {
            MapFeature::Building(_) => CoverLevel::Heavy,
            MapFeature::Relief(relief) => match relief.kind {
                ReliefKind::RockOutcrop => CoverLevel::Heavy,
                ReliefKind::Sinkhole => CoverLevel::Medium,
                ReliefKind::Cave => CoverLevel::Heavy,
            },
            MapFeature::Forest(_) => CoverLevel::Medium,
            MapFeature::Bridge(_) => CoverLevel::Light,
            MapFeature::Wetland(_) => CoverLevel::Light,
            _ => CoverLevel::None,
        }
    }

    /// Concealment the feature provides against observation.
    pub fn concealment(&self) -> ConcealmentLevel {
        match self {
            MapFeature::Forest(_) => ConcealmentLevel::Heavy,
            MapFeature::Building(_) => ConcealmentLevel::Heavy,
            MapFeature::Wetland(_) => ConcealmentLevel::Medium,
            MapFeature::Grassland(grassland) => {
                if grassland.grass_height > 0.8 {
                    ConcealmentLevel::Medium
                } else {
                    ConcealmentLevel::Light
                }
            }
            MapFeature::Relief(_) => ConcealmentLevel::Light,
            _ => ConcealmentLevel::None,
        }
    }

    /// Pairwise mixing rule.
    ///
    /// Variant-specific rules are checked first; pairs without a specific
    /// rule fall back to the category table. The relation is symmetric.
    pub fn can_mix_with(&self, other: &MapFeature) -> Compatibility {
        if let Some(specific) =
            variant_rule(self, other).or_else(|| variant_rule(other, self))
        {
            return specific;
        }
        category_rule_table()[self.category()][other.category()]
    }
}

/// Variant-pair rules, checked in both argument orders.
fn variant_rule(a: &MapFeature, b: &MapFeature) -> Option<Compatibility> {
    use MapFeature::*;
    Some(match (a, b) {
        (River(_), Bridge(_)) => Compatibility::Compatible,
        (River(_), Road(_)) => Compatibility::Incompatible,
        (River(_), Building(_)) => Compatibility::Incompatible,
        (River(_), Wetland(_)) => Compatibility::Synergistic,
        (River(_), Forest(_)) => Compatibility::Compatible,
        (Lake(_), Building(_)) => Compatibility::Incompatible,
        (Lake(_), Road(_)) => Compatibility::Incompatible,
        (Lake(_), Bridge(_)) => Compatibility::Incompatible,
        (Lake(_), Wetland(_)) => Compatibility::Synergistic,
        (Spring(_), Forest(_)) => Compatibility::Compatible,
        (Wetland(_), Building(_)) => Compatibility::Incompatible,
        (Forest(_), Grassland(_)) => Compatibility::Incompatible,
        (Building(_), Building(_)) => Compatibility::Incompatible,
        (Building(_), Road(_)) => Compatibility::Compatible,
        (Road(_), Bridge(_)) => Compatibility::Compatible,
        (Road(_), Road(_)) => Compatibility::Compatible,
        _ => return None,
    })
}

/// The category-pair fallback table.
fn category_rule_table() -> EnumMap<FeatureCategory, EnumMap<FeatureCategory, Compatibility>> {
    use Compatibility::*;
    enum_map! {
        FeatureCategory::Relief => enum_map! {
            FeatureCategory::Relief => Neutral,
            FeatureCategory::Natural => Synergistic,
            FeatureCategory::Artificial => Neutral,
            FeatureCategory::Cultural => Neutral,
        },
        FeatureCategory::Natural => enum_map! {
            FeatureCategory::Relief => Synergistic,
            FeatureCategory::Natural => Compatible,
            FeatureCategory::Artificial => Neutral,
            FeatureCategory::Cultural => Neutral,
        },
        FeatureCategory::Artificial => enum_map! {
            FeatureCategory::Relief => Neutral,
            FeatureCategory::Natural => Neutral,
            FeatureCategory::Artificial => Incompatible,
            FeatureCategory::Cultural => Neutral,
        },
        FeatureCategory::Cultural => enum_map! {
            _ => Neutral,
        },
    }
}

/// The id-indexed arena owning every feature of one map.
#[derive(PartialEq, Clone, Serialize, Deserialize, Debug, Default)]
pub struct FeatureRegistry {
    features: Vec<MapFeature>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a feature and returns its id.
    pub fn insert(&mut self, feature: MapFeature) -> FeatureId {
        let id = FeatureId(self.features.len() as u32);
        self.features.push(feature);
        id
    }

    pub fn get(&self, id: FeatureId) -> &MapFeature {
        &self.features[id.index()]
    }

    pub fn get_mut(&mut self, id: FeatureId) -> &mut MapFeature {
        &mut self.features[id.index()]
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterates features in id order.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, &MapFeature)> {
        self.features
            .iter()
            .enumerate()
            .map(|(index, feature)| (FeatureId(index as u32), feature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        grid::Direction,
        spatial::{Dimensions, FeatureArea, Position},
        tile_component::TreeSpecies,
    };

    fn area(x: f64, y: f64) -> FeatureArea {
        FeatureArea::new(
            Position::new(x, y).unwrap(),
            Dimensions::new(2, 2).unwrap(),
        )
    }

    fn sample_river() -> MapFeature {
        MapFeature::River(River::from_path(
            "test".to_owned(),
            vec![crate::feature::RiverPoint {
                position: Position::new(1.0, 1.0).unwrap(),
                width: 2.0,
                depth: 0.5,
                flow_direction: Direction::South,
                segment_type: RiverSegmentType::Source,
            }],
        ))
    }

    fn sample_bridge() -> MapFeature {
        MapFeature::Bridge(Bridge {
            name: "old bridge".to_owned(),
            area: area(1.0, 1.0),
            position: Position::new(1.0, 1.0).unwrap(),
            span_direction: Direction::East,
            deck_material: BridgeDeck::Stone,
            crossed_river: FeatureId::new(0),
        })
    }

    fn sample_relief() -> MapFeature {
        MapFeature::Relief(Relief {
            kind: ReliefKind::RockOutcrop,
            area: area(4.0, 4.0),
        })
    }

    fn sample_forest() -> MapFeature {
        MapFeature::Forest(Forest::new(
            "wood".to_owned(),
            area(3.0, 3.0),
            TreeSpecies::Oak,
        ))
    }

    #[test]
    fn variant_rules_are_symmetric() {
        let river = sample_river();
        let bridge = sample_bridge();
        assert_eq!(river.can_mix_with(&bridge), Compatibility::Compatible);
        assert_eq!(bridge.can_mix_with(&river), Compatibility::Compatible);
    }

    #[test]
    fn category_fallback_applies_without_a_specific_rule() {
        let relief = sample_relief();
        let forest = sample_forest();
        assert_eq!(relief.can_mix_with(&forest), Compatibility::Synergistic);
        assert_eq!(forest.can_mix_with(&relief), Compatibility::Synergistic);
    }

    #[test]
    fn registry_ids_are_stable_insertion_indices() {
        let mut registry = FeatureRegistry::new();
        let first = registry.insert(sample_river());
        let second = registry.insert(sample_bridge());
        assert_eq!(first, FeatureId::new(0));
        assert_eq!(second, FeatureId::new(1));
        assert_eq!(registry.get(first).name(), "test");
        assert_eq!(registry.len(), 2);
    }
}
