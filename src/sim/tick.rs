//! Fixed timestep simulation tick
//!
//! Core game loop that advances the session deterministically.

use serde::{Deserialize, Serialize};

use super::autopilot;
use super::collision::resolve_collisions;
use super::enemy::update_enemies;
use super::infection::SpreadOutcome;
use super::level::{Game, MAX_PLAYERS};
use super::physics::{update_bombs, update_enemy_bullets, update_projectiles, update_ships};

/// One player's controls for a tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInput {
    pub thrust: bool,
    pub brake: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub pitch_up: bool,
    pub pitch_down: bool,
    /// Held: fires on the bullet cadence
    pub shoot: bool,
    /// Fires once per press
    pub fire_missile: bool,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub players: [PlayerInput; MAX_PLAYERS],
    /// Idle/demo mode - AI flies every ship
    pub idle_mode: bool,
}

/// Advance the game by one fixed timestep
pub fn tick(game: &mut Game, input: &TickInput) {
    game.update_transitions();
    if !game.is_simulating() {
        return;
    }

    let mut inputs = input.players;
    if input.idle_mode {
        let world = game.world();
        for (idx, slot) in inputs.iter_mut().enumerate().take(world.players.len()) {
            *slot = autopilot::steer(world, idx);
        }
    }
    for (idx, slot) in inputs.iter_mut().enumerate() {
        slot.fire_missile = game.missile_edge(idx, slot.fire_missile);
    }

    let world = game.world_mut();
    world.time_ticks += 1;

    update_ships(world, &inputs);
    update_enemies(world);
    update_projectiles(world);
    update_enemy_bullets(world);
    update_bombs(world);
    resolve_collisions(world);

    let tick = world.time_ticks;
    let mut critical = false;
    if world.infection.should_spread(tick) {
        let outcome = world.infection.spread_step(&mut world.rng, &world.terrain, tick);
        if let SpreadOutcome::Spread { added } = outcome {
            if added > 0 {
                log::debug!(
                    "Infection spread to {} new tiles ({} total)",
                    added,
                    world.infection.count()
                );
            }
        }
        critical = outcome == SpreadOutcome::CriticalMass;
    }

    game.update_progress(critical);
    game.update_respawns();
    game.world_mut().normalize_order();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::{GamePhase, LevelStatus};
    use crate::sim::state::GameEvent;
    use crate::sim::terrain::GridCell;
    use crate::tuning::Tuning;

    #[test]
    fn test_tick_menu_is_frozen() {
        let mut game = Game::new(Tuning::default());
        tick(&mut game, &TickInput::default());
        assert_eq!(game.phase(), GamePhase::Menu);
        assert_eq!(game.world().time_ticks, 0);
    }

    #[test]
    fn test_tick_advances_time() {
        let mut game = Game::new(Tuning::default());
        game.start_game(1);
        for _ in 0..10 {
            tick(&mut game, &TickInput::default());
        }
        assert_eq!(game.world().time_ticks, 10);
        assert_eq!(game.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_missile_fires_once_per_press() {
        let mut game = Game::new(Tuning::default());
        game.start_game(1);
        game.world_mut().players[0].missiles = 3;
        let mut input = TickInput::default();
        input.players[0].fire_missile = true;
        for _ in 0..5 {
            tick(&mut game, &input);
        }
        assert_eq!(game.world().players[0].missiles, 2);
    }

    #[test]
    fn test_zero_spread_keeps_single_tile() {
        let mut tuning = Tuning::default();
        tuning.infection.spread_chance = 0.0;
        let mut game = Game::new(tuning);
        game.start_game(1);
        // No enemies, so nothing else can seed
        game.world_mut().enemies.clear();
        let cell = {
            let terrain = &game.world().terrain;
            (-60..60)
                .flat_map(|x| (-60..60).map(move |z| GridCell::new(x, z)))
                .find(|&c| terrain.is_infectable(c))
                .unwrap()
        };
        let world = game.world_mut();
        world.infection.seed(cell, &world.terrain, 0);

        for _ in 0..1000 {
            tick(&mut game, &TickInput::default());
        }
        assert_eq!(game.world().infection.count(), 1);
        assert_eq!(game.status(), LevelStatus::Active);
    }

    #[test]
    fn test_game_over_at_capacity() {
        let mut tuning = Tuning::default();
        tuning.infection.capacity = 1;
        let mut game = Game::new(tuning);
        game.start_game(1);
        let cell = {
            let terrain = &game.world().terrain;
            (-60..60)
                .flat_map(|x| (-60..60).map(move |z| GridCell::new(x, z)))
                .find(|&c| terrain.is_infectable(c))
                .unwrap()
        };
        let world = game.world_mut();
        world.infection.seed(cell, &world.terrain, 0);

        for _ in 0..20 {
            tick(&mut game, &TickInput::default());
        }
        assert_eq!(game.phase(), GamePhase::GameOver);
        let overs = game
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count();
        assert_eq!(overs, 1);
    }

    #[test]
    fn test_idle_mode_runs() {
        let mut game = Game::new(Tuning::default());
        game.start_game(2);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..600 {
            tick(&mut game, &input);
        }
        assert!(game.world().time_ticks > 0);
    }

    #[test]
    fn test_determinism() {
        // Two games with the same seed should produce identical results
        let mut game1 = Game::new(Tuning::default());
        let mut game2 = Game::new(Tuning::default());
        game1.start_game(1);
        game2.start_game(1);

        let mut thrust = TickInput::default();
        thrust.players[0].thrust = true;
        thrust.players[0].shoot = true;
        let inputs = [
            thrust.clone(),
            TickInput {
                idle_mode: true,
                ..Default::default()
            },
            TickInput::default(),
        ];

        for i in 0..900 {
            let input = &inputs[(i / 100) % inputs.len()];
            tick(&mut game1, input);
            tick(&mut game2, input);
        }

        let (w1, w2) = (game1.world(), game2.world());
        assert_eq!(w1.time_ticks, w2.time_ticks);
        assert_eq!(w1.players[0].ship, w2.players[0].ship);
        assert_eq!(w1.enemies, w2.enemies);
        assert_eq!(w1.infection.count(), w2.infection.count());
        assert_eq!(w1.events, w2.events);
    }
}
