//! Static world decoration
//!
//! Trees and buildings are placed once from a fixed seed and never move.
//! Gameplay only asks whether they stand on land and whether their tile is
//! infected; infected trees also soak up bullets.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::infection::InfectionMap;
use super::terrain::{AltitudeField, GridCell, is_above_sea, is_launchpad};

/// Half-extent of the square that scenery is scattered over
pub const SCENERY_EXTENT: f32 = 5000.0;
/// Number of tree silhouettes the renderer knows about
pub const TREE_VARIANTS: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub x: f32,
    pub z: f32,
    pub variant: u8,
    pub trunk_height: f32,
    pub canopy_scale: f32,
}

impl Tree {
    /// Highest point of the canopy (smallest Y) for a tree rooted at `ground`
    #[inline]
    pub fn canopy_top(&self, ground: f32) -> f32 {
        ground - self.trunk_height - 30.0 * self.canopy_scale - 10.0
    }

    #[inline]
    pub fn cell(&self, tile_size: f32) -> GridCell {
        GridCell::from_world(self.x, self.z, tile_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub x: f32,
    pub z: f32,
    pub width: f32,
    pub depth: f32,
    pub height: f32,
}

impl Building {
    #[inline]
    pub fn cell(&self, tile_size: f32) -> GridCell {
        GridCell::from_world(self.x, self.z, tile_size)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenery {
    pub trees: Vec<Tree>,
    pub buildings: Vec<Building>,
}

impl Scenery {
    pub fn generate(seed: u64, tree_count: usize, building_count: usize) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let trees = (0..tree_count)
            .map(|_| Tree {
                x: rng.random_range(-SCENERY_EXTENT..SCENERY_EXTENT),
                z: rng.random_range(-SCENERY_EXTENT..SCENERY_EXTENT),
                variant: rng.random_range(0..TREE_VARIANTS),
                trunk_height: rng.random_range(25.0..50.0),
                canopy_scale: rng.random_range(1.0..1.8),
            })
            .collect();
        let buildings = (0..building_count)
            .map(|_| Building {
                x: rng.random_range(-SCENERY_EXTENT..SCENERY_EXTENT),
                z: rng.random_range(-SCENERY_EXTENT..SCENERY_EXTENT),
                width: rng.random_range(30.0..70.0),
                depth: rng.random_range(30.0..70.0),
                height: rng.random_range(40.0..120.0),
            })
            .collect();
        Self { trees, buildings }
    }

    /// Trees that are actually drawn: on land and off the launchpad
    pub fn standing_trees<'a>(
        &'a self,
        terrain: &'a AltitudeField,
    ) -> impl Iterator<Item = &'a Tree> + 'a {
        self.trees
            .iter()
            .filter(move |t| stands_on_land(t.x, t.z, terrain))
    }

    pub fn standing_buildings<'a>(
        &'a self,
        terrain: &'a AltitudeField,
    ) -> impl Iterator<Item = &'a Building> + 'a {
        self.buildings
            .iter()
            .filter(move |b| stands_on_land(b.x, b.z, terrain))
    }

    pub fn tree_is_infected(
        tree: &Tree,
        infection: &InfectionMap,
        terrain: &AltitudeField,
    ) -> bool {
        infection.contains(tree.cell(terrain.tile_size()))
    }

    pub fn building_is_infected(
        building: &Building,
        infection: &InfectionMap,
        terrain: &AltitudeField,
    ) -> bool {
        infection.contains(building.cell(terrain.tile_size()))
    }
}

fn stands_on_land(x: f32, z: f32, terrain: &AltitudeField) -> bool {
    !is_launchpad(x, z) && !is_above_sea(terrain.altitude(x, z))
}
