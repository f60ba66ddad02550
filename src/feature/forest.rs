use serde::{Deserialize, Serialize};

use crate::{
    error::GenerationError,
    spatial::{FeatureArea, SubTilePosition},
    tile_component::TreeSpecies,
};

/// The identity of a tree within its forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TreeId(pub u32);

/// Size class of a placed tree, scaling its mature dimensions.
#[derive(PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Debug)]
pub enum TreeSize {
    Sapling,
    Young,
    Mature,
    Ancient,
}

impl TreeSize {
    /// Fraction of the species' mature dimensions this size class reaches.
    pub fn growth_fraction(&self) -> f64 {
        match self {
            TreeSize::Sapling => 0.15,
            TreeSize::Young => 0.55,
            TreeSize::Mature => 1.0,
            TreeSize::Ancient => 1.15,
        }
    }
}

/// A single placed tree.
#[derive(PartialEq, Clone, Serialize, Deserialize, Debug)]
pub struct Tree {
    pub id: TreeId,
    pub species: TreeSpecies,
    pub size: TreeSize,
    pub position: SubTilePosition,
    /// Vitality in `[0, 1]`.
    pub health: f64,
    pub age_years: u32,
    /// Trunk diameter at breast height, in meters.
    pub trunk_diameter: f64,
    /// Height in meters.
    pub height: f64,
    /// Fraction of light the canopy blocks, in `[0, 1]`.
    pub canopy_density: f64,
    /// Canopy radius in meters.
    pub canopy_radius: f64,
    /// The tree this one has inosculated into, if any.
    pub grafted_into: Option<TreeId>,
}

impl Tree {
    /// Whether this tree's canopy can physically reach the other's.
    pub fn canopies_touch(&self, other: &Tree, cell_size: f64) -> bool {
        let distance = self
            .position
            .to_position(cell_size)
            .distance_to(&other.position.to_position(cell_size));
        distance <= self.canopy_radius + other.canopy_radius
    }
}

/// A forest feature: an area owning a collection of trees plus understory
/// tallies.
///
/// Invariant: every tree position lies within the forest's area.
#[derive(PartialEq, Clone, Serialize, Deserialize, Debug)]
pub struct Forest {
    pub name: String,
    pub area: FeatureArea,
    trees: Vec<Tree>,
    pub dominant_species: TreeSpecies,
    /// Understory shrub density in `[0, 1]`.
    pub underbrush_density: f64,
    pub shrub_count: u32,
    pub herbaceous_count: u32,
    pub moss_patches: u32,
}

impl Forest {
    pub fn new(name: String, area: FeatureArea, dominant_species: TreeSpecies) -> Self {
        Self {
            name,
            area,
            trees: Vec::new(),
            dominant_species,
            underbrush_density: 0.0,
            shrub_count: 0,
            herbaceous_count: 0,
            moss_patches: 0,
        }
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn tree(&self, id: TreeId) -> &Tree {
        &self.trees[id.0 as usize]
    }

    /// Adds a tree, enforcing the containment invariant.
    pub fn add_tree(&mut self, tree: Tree, cell_size: f64) -> Result<TreeId, GenerationError> {
        let position = tree.position.to_position(1.0);
        // Containment is checked in tile units; the area is in tile units too.
        if !self.area.contains(&position) {
            return Err(GenerationError::domain_rule(
                "TREE_OUTSIDE_FOREST",
                "vegetation",
                format!(
                    "tree at ({}, {}) falls outside forest {}",
                    position.x() * cell_size,
                    position.y() * cell_size,
                    self.name
                ),
            ));
        }
        let id = TreeId(self.trees.len() as u32);
        let mut tree = tree;
        tree.id = id;
        self.trees.push(tree);
        Ok(id)
    }

    /// Grafts tree `source` into tree `target` (inosculation).
    ///
    /// The canopies physically merge: the target's canopy widens and its
    /// health gets a boost from the shared root and vascular system. The
    /// mutation is one-way and idempotent; grafting an already-grafted pair
    /// again changes nothing. Returns whether a graft happened.
    pub fn graft(
        &mut self,
        source: TreeId,
        target: TreeId,
        cell_size: f64,
    ) -> Result<bool, GenerationError> {
        if source == target {
            return Err(GenerationError::domain_rule(
                "TREE_SELF_GRAFT",
                "vegetation",
                "a tree cannot graft into itself",
            ));
        }

        // Idempotence: the pair is already merged.
        if self.trees[source.0 as usize].grafted_into == Some(target) {
            return Ok(false);
        }
        if self.trees[source.0 as usize].grafted_into.is_some() {
            return Ok(false);
        }

        let (source_tree, target_tree) = (
            self.trees[source.0 as usize].clone(),
            &self.trees[target.0 as usize],
        );
        if !source_tree.species.can_graft_with(target_tree.species) {
            return Ok(false);
        }
        if !source_tree.canopies_touch(target_tree, cell_size) {
            return Ok(false);
        }

        let target_tree = &mut self.trees[target.0 as usize];
        target_tree.canopy_radius =
            (target_tree.canopy_radius + source_tree.canopy_radius * 0.5).min(12.0);
        target_tree.canopy_density =
            (target_tree.canopy_density.max(source_tree.canopy_density) + 0.05).min(1.0);
        target_tree.health = (target_tree.health + 0.1).min(1.0);
        self.trees[source.0 as usize].grafted_into = Some(target);
        Ok(true)
    }

    /// Checks the containment invariant over all trees.
    pub fn contains_all_trees(&self) -> bool {
        self.trees
            .iter()
            .all(|tree| self.area.contains(&tree.position.to_position(1.0)))
    }
}

/// Open grass cover where tree canopy never established.
#[derive(PartialEq, Clone, Serialize, Deserialize, Debug)]
pub struct Grassland {
    pub area: FeatureArea,
    /// Mean grass height in meters.
    pub grass_height: f64,
    /// Fraction of broadleaf forbs in the sward, in `[0, 1]`.
    pub forb_fraction: f64,
}

#[cfg(test)]
mod tests {
    use super::{Forest, Tree, TreeId, TreeSize};
    use crate::{
        grid::OffsetCoordinate,
        spatial::{Dimensions, FeatureArea, Position, SubTilePosition},
        tile_component::TreeSpecies,
    };

    fn tree(x: i32, y: i32, species: TreeSpecies) -> Tree {
        Tree {
            id: TreeId(0),
            species,
            size: TreeSize::Mature,
            position: SubTilePosition::new(OffsetCoordinate::new(x, y), 0.5, 0.5).unwrap(),
            health: 0.8,
            age_years: 60,
            trunk_diameter: 0.5,
            height: species.mature_height(),
            canopy_density: species.canopy_density(),
            canopy_radius: species.canopy_radius(),
            grafted_into: None,
        }
    }

    fn forest() -> Forest {
        Forest::new(
            "north wood".to_owned(),
            FeatureArea::new(
                Position::new(0.0, 0.0).unwrap(),
                Dimensions::new(10, 10).unwrap(),
            ),
            TreeSpecies::Oak,
        )
    }

    #[test]
    fn trees_outside_the_area_are_rejected() {
        let mut forest = forest();
        let error = forest
            .add_tree(tree(25, 3, TreeSpecies::Oak), 1.5)
            .unwrap_err();
        assert_eq!(error.code(), "TREE_OUTSIDE_FOREST");

        forest.add_tree(tree(3, 3, TreeSpecies::Oak), 1.5).unwrap();
        assert!(forest.contains_all_trees());
    }

    #[test]
    fn grafting_is_idempotent() {
        let mut forest = forest();
        let a = forest.add_tree(tree(3, 3, TreeSpecies::Oak), 1.5).unwrap();
        let b = forest.add_tree(tree(4, 3, TreeSpecies::Oak), 1.5).unwrap();

        assert!(forest.graft(a, b, 1.5).unwrap());
        let after_first = forest.tree(b).clone();
        assert_eq!(forest.tree(a).grafted_into, Some(b));

        // The second application is a no-op.
        assert!(!forest.graft(a, b, 1.5).unwrap());
        assert_eq!(forest.tree(b), &after_first);
    }

    #[test]
    fn incompatible_species_do_not_graft() {
        let mut forest = forest();
        let oak = forest.add_tree(tree(3, 3, TreeSpecies::Oak), 1.5).unwrap();
        let pine = forest.add_tree(tree(4, 3, TreeSpecies::Pine), 1.5).unwrap();
        assert!(!forest.graft(oak, pine, 1.5).unwrap());
        assert_eq!(forest.tree(oak).grafted_into, None);
    }

    #[test]
    fn distant_trees_do_not_graft() {
        let mut forest = forest();
        let a = forest.add_tree(tree(0, 0, TreeSpecies::Birch), 1.5).unwrap();
        let b = forest.add_tree(tree(9, 9, TreeSpecies::Birch), 1.5).unwrap();
        assert!(!forest.graft(a, b, 1.5).unwrap());
    }
}
