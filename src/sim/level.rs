//! Session and level progression
//!
//! [`Game`] owns the world and decides when a level is won (infection
//! appeared and was wiped out), when it is lost (infection hit capacity) and
//! when ships come back after being destroyed.

use serde::{Deserialize, Serialize};

use super::enemy::{kind_for_spawn, spawn_enemy};
use super::state::{GameEvent, Player, WorldState};
use crate::tuning::Tuning;

/// Players supported on one machine
pub const MAX_PLAYERS: usize = 2;
/// Sideways gap between split-screen ships on the pad
const SPAWN_SPREAD: f32 = 100.0;

/// Top-level phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Menu,
    Playing,
    GameOver,
}

/// Progress within the current level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelStatus {
    Active,
    /// Cleared; the next level starts when the countdown runs out
    Complete { ticks_left: u32 },
}

/// A play session
#[derive(Debug, Clone)]
pub struct Game {
    phase: GamePhase,
    level: u32,
    status: LevelStatus,
    /// Set once any tile has been infected this level
    infection_started: bool,
    game_over_ticks: u32,
    /// Previous missile button state, for edge detection
    missile_held: [bool; MAX_PLAYERS],
    world: WorldState,
}

impl Game {
    pub fn new(tuning: Tuning) -> Self {
        let tuning = tuning.sanitized();
        log::info!("New game, seed {:#x}", tuning.seed);
        Self {
            phase: GamePhase::Menu,
            level: 0,
            status: LevelStatus::Active,
            infection_started: false,
            game_over_ticks: 0,
            missile_held: [false; MAX_PLAYERS],
            world: WorldState::new(tuning),
        }
    }

    #[inline]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    #[inline]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[inline]
    pub fn status(&self) -> LevelStatus {
        self.status
    }

    #[inline]
    pub fn infection_started(&self) -> bool {
        self.infection_started
    }

    #[inline]
    pub fn world(&self) -> &WorldState {
        &self.world
    }

    #[inline]
    pub fn world_mut(&mut self) -> &mut WorldState {
        &mut self.world
    }

    /// Take every event emitted since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.world.events)
    }

    /// Fresh players on level 1
    pub fn start_game(&mut self, player_count: usize) {
        let count = player_count.clamp(1, MAX_PLAYERS);
        self.world.players = (0..count)
            .map(|id| {
                let offset = if count == 1 {
                    0.0
                } else if id == 0 {
                    -SPAWN_SPREAD
                } else {
                    SPAWN_SPREAD
                };
                Player::new(id, offset)
            })
            .collect();
        self.missile_held = [false; MAX_PLAYERS];
        self.phase = GamePhase::Playing;
        log::info!("Starting game with {} player(s)", count);
        self.start_level(1);
    }

    /// Reset ships and transients, then populate level `level`
    pub fn start_level(&mut self, level: u32) {
        self.level = level;
        self.status = LevelStatus::Active;
        self.infection_started = false;

        let world = &mut self.world;
        world.discard_transients();
        let missiles = world.tuning.missiles_per_level;
        for player in &mut world.players {
            player.reset_ship();
            player.alive = true;
            player.respawn_ticks = 0;
            player.missiles = missiles;
        }

        let count = world.tuning.base_enemies + level;
        for i in 0..count {
            let kind = kind_for_spawn(level, i, &mut world.rng);
            spawn_enemy(world, kind);
        }
        log::info!("Level {} started with {} enemies", level, count);
        world.emit(GameEvent::LevelStarted { level });
    }

    /// Back to the title screen; scores stay readable until the next start
    pub fn return_to_menu(&mut self) {
        self.world.discard_transients();
        self.phase = GamePhase::Menu;
        self.status = LevelStatus::Active;
        log::info!("Returned to menu");
        self.world.emit(GameEvent::ReturnedToMenu);
    }

    /// Whether the world advances this tick
    pub fn is_simulating(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// Turn held missile buttons into single presses
    pub(super) fn missile_edge(&mut self, player: usize, held: bool) -> bool {
        let Some(prev) = self.missile_held.get_mut(player) else {
            return false;
        };
        let pressed = held && !*prev;
        *prev = held;
        pressed
    }

    /// Run the level-complete and game-over countdowns
    pub(super) fn update_transitions(&mut self) {
        match self.phase {
            GamePhase::GameOver => {
                self.game_over_ticks = self.game_over_ticks.saturating_sub(1);
                if self.game_over_ticks == 0 {
                    self.return_to_menu();
                }
            }
            GamePhase::Playing => {
                if let LevelStatus::Complete { ticks_left } = self.status {
                    if ticks_left <= 1 {
                        self.start_level(self.level + 1);
                    } else {
                        self.status = LevelStatus::Complete {
                            ticks_left: ticks_left - 1,
                        };
                    }
                }
            }
            GamePhase::Menu => {}
        }
    }

    /// Check win/lose after the spread step; `critical` is the spread step's verdict
    pub(super) fn update_progress(&mut self, critical: bool) {
        if self.phase != GamePhase::Playing {
            return;
        }

        // Capacity ends the game even while a cleared level is counting down
        let infection = &self.world.infection;
        if critical || infection.at_capacity() {
            self.game_over();
            return;
        }
        if self.status != LevelStatus::Active {
            return;
        }

        if infection.count() > 0 {
            self.infection_started = true;
        } else if self.infection_started {
            let ticks_left = self.world.tuning.level_complete_ticks;
            self.status = LevelStatus::Complete { ticks_left };
            log::info!("Level {} complete", self.level);
            self.world.emit(GameEvent::LevelComplete { level: self.level });
        }
    }

    fn game_over(&mut self) {
        let count = self.world.infection.count();
        self.phase = GamePhase::GameOver;
        self.game_over_ticks = self.world.tuning.game_over_ticks;
        log::info!("Game over on level {}: {} tiles infected", self.level, count);
        self.world.emit(GameEvent::CriticalMass { count });
        self.world.emit(GameEvent::GameOver { level: self.level });
    }

    /// Count down dead ships and put them back on the pad
    pub(super) fn update_respawns(&mut self) {
        let mut respawned = Vec::new();
        for player in &mut self.world.players {
            if player.alive {
                continue;
            }
            player.respawn_ticks = player.respawn_ticks.saturating_sub(1);
            if player.respawn_ticks == 0 {
                player.reset_ship();
                player.alive = true;
                respawned.push(player.id);
            }
        }
        for player in respawned {
            log::debug!("Player {} respawned", player);
            self.world.emit(GameEvent::ShipRespawned { player });
        }
    }
}
