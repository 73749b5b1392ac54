//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID / ordered maps)
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod collision;
pub mod enemy;
pub mod infection;
pub mod level;
pub mod physics;
pub mod scenery;
pub mod state;
pub mod terrain;
pub mod tick;
pub mod view;

pub use infection::{InfectedTile, InfectionConfig, InfectionMap, SpreadOutcome};
pub use level::{Game, GamePhase, LevelStatus, MAX_PLAYERS};
pub use scenery::{Building, Scenery, Tree};
pub use state::{
    Bomb, BombArea, DeathCause, Enemy, EnemyKind, EnemyTag, GameEvent, KillMethod, Player,
    Projectile, Ship, WorldState,
};
pub use terrain::{AltitudeField, GridCell, NoiseMode, TerrainParams, is_above_sea, is_launchpad};
pub use tick::{PlayerInput, TickInput, tick};
pub use view::{HudInfo, WorldSnapshot};
