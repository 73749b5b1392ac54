//! World state and core simulation types
//!
//! Everything a tick reads or writes lives in [`WorldState`]; the level
//! controller owns it and hands it to physics and collision by reference.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::infection::InfectionMap;
use super::scenery::Scenery;
use super::terrain::{AltitudeField, GridCell};
use crate::consts::*;
use crate::tuning::Tuning;
use crate::{nose_direction, thrust_direction};

/// A player's hovercraft
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    pub pos: Vec3,
    pub vel: Vec3,
    /// Nose tilt, clamped to ±`PITCH_LIMIT`
    pub pitch: f32,
    pub yaw: f32,
}

impl Ship {
    /// Parked above the launchpad, `offset_x` to the side of center
    pub fn at_spawn(offset_x: f32) -> Self {
        Self {
            pos: Vec3::new(SPAWN_X + offset_x, SPAWN_Y, SPAWN_Z),
            vel: Vec3::ZERO,
            pitch: 0.0,
            yaw: 0.0,
        }
    }

    #[inline]
    pub fn nose(&self) -> Vec3 {
        nose_direction(self.pitch, self.yaw)
    }

    #[inline]
    pub fn thrust_dir(&self) -> Vec3 {
        thrust_direction(self.pitch, self.yaw)
    }
}

/// Bullet, homing missile, or enemy shot; the owning list decides behavior
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec3,
    pub vel: Vec3,
    pub ticks_left: u32,
}

impl Projectile {
    /// Leave the ship along its nose, inheriting the ship's velocity
    pub fn launched(id: u32, ship: &Ship, speed: f32, life: u32) -> Self {
        Self {
            id,
            pos: ship.pos,
            vel: ship.nose() * speed + ship.vel,
            ticks_left: life,
        }
    }
}

/// A local player: ship plus everything it owns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: usize,
    pub ship: Ship,
    pub alive: bool,
    pub respawn_ticks: u32,
    /// Homing missiles left this level
    pub missiles: u32,
    pub score: u64,
    pub bullets: Vec<Projectile>,
    pub homing_missiles: Vec<Projectile>,
    /// Sideways spawn offset so split-screen ships don't overlap
    pub spawn_offset: f32,
}

impl Player {
    pub fn new(id: usize, spawn_offset: f32) -> Self {
        Self {
            id,
            ship: Ship::at_spawn(spawn_offset),
            alive: true,
            respawn_ticks: 0,
            missiles: 0,
            score: 0,
            bullets: Vec::new(),
            homing_missiles: Vec::new(),
            spawn_offset,
        }
    }

    /// Put the ship back on the pad at rest
    pub fn reset_ship(&mut self) {
        self.ship = Ship::at_spawn(self.spawn_offset);
    }
}

/// Behavior-specific state for the Fighter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FighterState {
    pub aggressive: bool,
    /// Ticks left in the current aggressive/wandering phase
    pub phase_ticks: u32,
    pub wander_target: Vec3,
    pub fire_cooldown: u32,
}

/// Behavior-specific state for the Crab
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrabState {
    pub seed_cooldown: u32,
    pub fire_cooldown: u32,
}

/// Enemy variant with its per-kind state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Drifting patroller that drops single-tile bombs
    Seeder { bob_phase: f32 },
    /// Slow patroller that drops 5x5 mega bombs
    Bomber { bob_phase: f32 },
    /// Alternates pursuit (with ranged fire) and wandering
    Fighter(FighterState),
    /// Ground walker that tracks ships horizontally and seeds where it stands
    Crab(CrabState),
    /// Relentless rammer
    Hunter,
}

/// Fieldless kind tag for events, snapshots and spawn tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyTag {
    Seeder,
    Bomber,
    Fighter,
    Crab,
    Hunter,
}

impl EnemyKind {
    pub fn tag(&self) -> EnemyTag {
        match self {
            EnemyKind::Seeder { .. } => EnemyTag::Seeder,
            EnemyKind::Bomber { .. } => EnemyTag::Bomber,
            EnemyKind::Fighter(_) => EnemyTag::Fighter,
            EnemyKind::Crab(_) => EnemyTag::Crab,
            EnemyKind::Hunter => EnemyTag::Hunter,
        }
    }
}

/// An enemy entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub pos: Vec3,
    pub vel: Vec3,
    pub kind: EnemyKind,
}

/// How much ground a bomb infects on impact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BombArea {
    Single,
    /// (2 * `MEGA_BOMB_RADIUS` + 1)^2 block centred on the target
    Mega,
}

/// A falling infection bomb
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bomb {
    pub id: u32,
    pub pos: Vec3,
    pub vel: Vec3,
    pub target: GridCell,
    pub area: BombArea,
}

/// Why a ship was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Sea,
    HardLanding,
    EnemyFire,
    Collision,
}

/// What finished off an enemy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KillMethod {
    Bullet,
    Missile,
    /// Mutual destruction with a ship
    Ram,
}

/// Side effects for collaborators (particles, audio, HUD flashes)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Explosion { pos: Vec3 },
    EnemyKilled {
        player: usize,
        kind: EnemyTag,
        by: KillMethod,
    },
    ShipDestroyed {
        player: usize,
        cause: DeathCause,
    },
    ShipRespawned { player: usize },
    InfectionCleared {
        player: Option<usize>,
        cell: GridCell,
        cells: usize,
        points: u64,
    },
    BombImpact {
        cell: GridCell,
        area: BombArea,
        infected: usize,
    },
    MissileFired { player: usize },
    LevelStarted { level: u32 },
    LevelComplete { level: u32 },
    CriticalMass { count: usize },
    GameOver { level: u32 },
    ReturnedToMenu,
}

/// Complete simulation state for one session
#[derive(Debug, Clone)]
pub struct WorldState {
    pub tuning: Tuning,
    pub terrain: AltitudeField,
    pub infection: InfectionMap,
    pub scenery: Scenery,
    pub players: Vec<Player>,
    /// Sorted by id for deterministic iteration
    pub enemies: Vec<Enemy>,
    pub enemy_bullets: Vec<Projectile>,
    pub bombs: Vec<Bomb>,
    /// Drained by collaborators each frame
    pub events: Vec<GameEvent>,
    pub rng: Pcg32,
    /// Simulation tick counter
    pub time_ticks: u64,
    next_id: u32,
}

impl WorldState {
    pub fn new(tuning: Tuning) -> Self {
        let terrain = AltitudeField::new(tuning.terrain);
        let scenery = Scenery::generate(
            tuning.scenery_seed,
            tuning.tree_count,
            tuning.building_count,
        );
        Self {
            terrain,
            infection: InfectionMap::new(tuning.infection),
            scenery,
            players: Vec::new(),
            enemies: Vec::new(),
            enemy_bullets: Vec::new(),
            bombs: Vec::new(),
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(tuning.seed),
            time_ticks: 0,
            next_id: 1,
            tuning,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    #[inline]
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Positions of ships currently in play
    pub fn live_ship_positions(&self) -> Vec<Vec3> {
        self.players
            .iter()
            .filter(|p| p.alive)
            .map(|p| p.ship.pos)
            .collect()
    }

    /// Drop every in-flight entity (level reset / game over)
    pub fn discard_transients(&mut self) {
        self.enemies.clear();
        self.enemy_bullets.clear();
        self.bombs.clear();
        self.infection.clear();
        for player in &mut self.players {
            player.bullets.clear();
            player.homing_missiles.clear();
        }
    }

    /// Destroy a player's ship and start its respawn countdown
    pub fn destroy_ship(&mut self, player: usize, cause: DeathCause) {
        let respawn = self.tuning.respawn_ticks;
        let Some(p) = self.players.get_mut(player) else {
            return;
        };
        if !p.alive {
            return;
        }
        p.alive = false;
        p.respawn_ticks = respawn;
        p.bullets.clear();
        let pos = p.ship.pos;
        log::debug!("Player {} destroyed ({:?})", player, cause);
        self.emit(GameEvent::Explosion { pos });
        self.emit(GameEvent::ShipDestroyed { player, cause });
    }

    /// Clear infection under a world point; credits `player` if anything was cured
    pub fn clear_infection_at(&mut self, x: f32, z: f32, player: Option<usize>) -> bool {
        let cell = GridCell::from_world(x, z, self.terrain.tile_size());
        let before = self.infection.count();
        if !self.infection.clear_at(x, z, &self.terrain) {
            return false;
        }
        let cells = before - self.infection.count();
        let points = self.tuning.scoring.infection_clear;
        if let Some(p) = player.and_then(|i| self.players.get_mut(i)) {
            p.score += points;
        }
        let ground = self.terrain.altitude(x, z);
        self.emit(GameEvent::Explosion {
            pos: Vec3::new(x, ground - 10.0, z),
        });
        self.emit(GameEvent::InfectionCleared {
            player,
            cell,
            cells,
            points,
        });
        true
    }

    /// Ensure entity lists are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
        self.enemy_bullets.sort_by_key(|b| b.id);
        self.bombs.sort_by_key(|b| b.id);
    }
}
