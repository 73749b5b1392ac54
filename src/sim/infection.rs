//! Infection cellular automaton
//!
//! A sparse set of infected tiles that creeps outward over land. Each spread
//! step gives every infected tile a small chance to push into one random
//! orthogonal neighbor; proposals are collected during the scan and committed
//! afterwards so a single step can never chain.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::terrain::{AltitudeField, GridCell};

/// Orthogonal neighbor offsets
const ORTHO_DIRS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Spread tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfectionConfig {
    /// Chance per infected tile per step of attempting one neighbor
    pub spread_chance: f32,
    /// Steps run on every Nth simulation tick
    pub cadence_ticks: u64,
    /// Hard cap on infected tiles; reaching it ends the game
    pub capacity: usize,
    /// Chebyshev radius cleared around a hit
    pub clear_radius: i32,
}

impl Default for InfectionConfig {
    fn default() -> Self {
        Self {
            spread_chance: 0.01,
            cadence_ticks: 5,
            capacity: 1600,
            clear_radius: 3,
        }
    }
}

/// An infected tile and the tick it turned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfectedTile {
    pub cell: GridCell,
    pub tick: u64,
}

/// Result of a spread step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadOutcome {
    /// Step ran; `added` tiles were infected
    Spread { added: usize },
    /// Capacity reached, nothing was scanned
    CriticalMass,
}

/// Sparse infection set
#[derive(Debug, Clone, Default)]
pub struct InfectionMap {
    config: InfectionConfig,
    tiles: BTreeMap<GridCell, InfectedTile>,
}

impl InfectionMap {
    pub fn new(config: InfectionConfig) -> Self {
        Self {
            config,
            tiles: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &InfectionConfig {
        &self.config
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.tiles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    #[inline]
    pub fn contains(&self, cell: GridCell) -> bool {
        self.tiles.contains_key(&cell)
    }

    pub fn at_capacity(&self) -> bool {
        self.tiles.len() >= self.config.capacity
    }

    /// Infected tiles in cell order
    pub fn iter(&self) -> impl Iterator<Item = &InfectedTile> {
        self.tiles.values()
    }

    /// Drop every infected tile (level reset)
    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    /// Whether the automaton advances on this tick
    #[inline]
    pub fn should_spread(&self, tick: u64) -> bool {
        tick % self.config.cadence_ticks.max(1) == 0
    }

    fn can_infect(&self, cell: GridCell, terrain: &AltitudeField) -> bool {
        !self.tiles.contains_key(&cell) && terrain.is_infectable(cell)
    }

    /// Run one spread step over every infected tile
    pub fn spread_step<R: Rng>(
        &mut self,
        rng: &mut R,
        terrain: &AltitudeField,
        tick: u64,
    ) -> SpreadOutcome {
        if self.at_capacity() {
            return SpreadOutcome::CriticalMass;
        }

        let mut fresh: Vec<GridCell> = Vec::new();
        for &cell in self.tiles.keys() {
            // Both draws happen for every tile so the RNG stream doesn't depend on the guard
            let roll: f32 = rng.random();
            let (dx, dz) = ORTHO_DIRS[rng.random_range(0..ORTHO_DIRS.len())];
            if roll >= self.config.spread_chance {
                continue;
            }
            let neighbor = cell.offset(dx, dz);
            if self.can_infect(neighbor, terrain) {
                fresh.push(neighbor);
            }
        }

        fresh.sort_unstable();
        fresh.dedup();
        let room = self.config.capacity - self.tiles.len();
        fresh.truncate(room);

        let added = fresh.len();
        for cell in fresh {
            self.tiles.insert(cell, InfectedTile { cell, tick });
        }
        SpreadOutcome::Spread { added }
    }

    /// Infect a single cell if it passes the pad/sea/duplicate/capacity guard
    pub fn seed(&mut self, cell: GridCell, terrain: &AltitudeField, tick: u64) -> bool {
        if self.at_capacity() || !self.can_infect(cell, terrain) {
            return false;
        }
        self.tiles.insert(cell, InfectedTile { cell, tick });
        true
    }

    /// Remove every infected cell within Chebyshev `radius` of `center`
    pub fn clear_radius(&mut self, center: GridCell, radius: i32) -> usize {
        let before = self.tiles.len();
        if radius < 0 {
            return 0;
        }
        // Walk the (2r+1)^2 square when it's smaller than the set, otherwise filter the set
        let side = (2 * radius as usize + 1).pow(2);
        if side <= self.tiles.len() {
            for dx in -radius..=radius {
                for dz in -radius..=radius {
                    self.tiles.remove(&center.offset(dx, dz));
                }
            }
        } else {
            self.tiles.retain(|&cell, _| cell.chebyshev(center) > radius);
        }
        before - self.tiles.len()
    }

    /// Clear around a world point if the tile under it is infected
    pub fn clear_at(&mut self, wx: f32, wz: f32, terrain: &AltitudeField) -> bool {
        let cell = GridCell::from_world(wx, wz, terrain.tile_size());
        if !self.contains(cell) {
            return false;
        }
        self.clear_radius(cell, self.config.clear_radius) > 0
    }
}
