//! Data-driven game balance
//!
//! Every gameplay constant that a designer might want to tweak lives in
//! [`Tuning`]. Values load from JSON; missing keys fall back to the defaults
//! and out-of-range values are clamped rather than rejected.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::infection::InfectionConfig;
use crate::sim::terrain::TerrainParams;

/// Errors raised while loading tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("malformed tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
}

/// Points credited to the acting player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scoring {
    pub bullet_kill: u64,
    pub missile_kill: u64,
    pub infection_clear: u64,
    pub infected_tree: u64,
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            bullet_kill: 100,
            missile_kill: 250,
            infection_clear: 100,
            infected_tree: 200,
        }
    }
}

/// Complete balance sheet for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Seed for the simulation RNG
    pub seed: u64,
    pub terrain: TerrainParams,
    pub infection: InfectionConfig,
    pub scoring: Scoring,
    /// Ticks a destroyed ship waits before respawning
    pub respawn_ticks: u32,
    /// Ticks between "level complete" and the next level starting
    pub level_complete_ticks: u32,
    /// Ticks the game-over screen holds before returning to the menu
    pub game_over_ticks: u32,
    /// Enemies per level = `base_enemies + level`
    pub base_enemies: u32,
    /// Homing missiles granted at the start of each level
    pub missiles_per_level: u32,
    /// Seed for static scenery placement
    pub scenery_seed: u64,
    pub tree_count: usize,
    pub building_count: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            seed: 0x5eed_1234,
            terrain: TerrainParams::default(),
            infection: InfectionConfig::default(),
            scoring: Scoring::default(),
            respawn_ticks: 120,
            level_complete_ticks: 240,
            game_over_ticks: 300,
            base_enemies: 1,
            missiles_per_level: 1,
            scenery_seed: 42,
            tree_count: 250,
            building_count: 40,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON and clamp it into a playable range
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        Ok(tuning.sanitized())
    }

    /// Load tuning from a JSON file on disk
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    /// Serialize to pretty JSON (for writing a starter tuning file)
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Clamp every value into the range the simulation can handle
    pub fn sanitized(mut self) -> Self {
        let inf = &mut self.infection;
        if !(0.0..=1.0).contains(&inf.spread_chance) {
            let clamped = if inf.spread_chance.is_nan() {
                InfectionConfig::default().spread_chance
            } else {
                inf.spread_chance.clamp(0.0, 1.0)
            };
            log::warn!("spread_chance {} out of range, using {}", inf.spread_chance, clamped);
            inf.spread_chance = clamped;
        }
        if inf.cadence_ticks == 0 {
            log::warn!("cadence_ticks must be at least 1");
            inf.cadence_ticks = 1;
        }
        if inf.capacity == 0 {
            log::warn!("infection capacity must be at least 1");
            inf.capacity = 1;
        }
        inf.clear_radius = inf.clear_radius.clamp(0, 16);

        let tile = self.terrain.tile_size;
        if !tile.is_finite() || !(8.0..=1000.0).contains(&tile) {
            let clamped = if tile.is_finite() {
                tile.clamp(8.0, 1000.0)
            } else {
                crate::consts::TILE_SIZE
            };
            log::warn!("tile_size {} out of range, using {}", tile, clamped);
            self.terrain.tile_size = clamped;
        }

        self.respawn_ticks = self.respawn_ticks.max(1);
        self.level_complete_ticks = self.level_complete_ticks.max(1);
        self.game_over_ticks = self.game_over_ticks.max(1);
        self
    }
}
