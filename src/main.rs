//! Headless session runner
//!
//! Plays an autopilot session without a renderer and prints a JSON summary.
//!
//! Usage: `virus-sim [seed] [ticks] [players] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
use serde::Serialize;

#[cfg(not(target_arch = "wasm32"))]
use virus_sim::consts::SIM_HZ;
#[cfg(not(target_arch = "wasm32"))]
use virus_sim::sim::{GameEvent, KillMethod, TickInput};
#[cfg(not(target_arch = "wasm32"))]
use virus_sim::{Game, GamePhase, Tuning, tick};

#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_TICKS: u64 = SIM_HZ as u64 * 60 * 5;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default, Serialize)]
struct Summary {
    seed: u64,
    ticks_run: u64,
    final_level: u32,
    phase: Option<GamePhase>,
    game_over: bool,
    scores: Vec<u64>,
    enemy_kills: usize,
    missile_kills: usize,
    ship_losses: usize,
    tiles_cured: usize,
    peak_infection: usize,
    final_infection: usize,
}

#[cfg(not(target_arch = "wasm32"))]
fn arg<T: std::str::FromStr>(args: &[String], index: usize, default: T) -> T {
    match args.get(index) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("Ignoring unparseable argument {:?}", raw);
            default
        }),
        None => default,
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut tuning = match args.get(3) {
        Some(path) => match Tuning::load(path) {
            Ok(tuning) => tuning,
            Err(e) => {
                eprintln!("Failed to load tuning from {path}: {e}");
                std::process::exit(2);
            }
        },
        None => Tuning::default(),
    };
    tuning.seed = arg(&args, 0, tuning.seed);
    let ticks: u64 = arg(&args, 1, DEFAULT_TICKS);
    let players: usize = arg(&args, 2, 1);

    log::info!(
        "Virus headless run: seed {:#x}, {} ticks, {} player(s)",
        tuning.seed,
        ticks,
        players
    );

    let mut game = Game::new(tuning);
    game.start_game(players);

    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };
    let mut summary = Summary {
        seed: game.world().tuning.seed,
        ..Default::default()
    };

    for _ in 0..ticks {
        tick(&mut game, &input);
        summary.ticks_run += 1;
        summary.peak_infection = summary.peak_infection.max(game.world().infection.count());

        for event in game.drain_events() {
            match event {
                GameEvent::EnemyKilled { by, .. } => {
                    summary.enemy_kills += 1;
                    if by == KillMethod::Missile {
                        summary.missile_kills += 1;
                    }
                }
                GameEvent::ShipDestroyed { .. } => summary.ship_losses += 1,
                GameEvent::InfectionCleared { cells, .. } => summary.tiles_cured += cells,
                GameEvent::GameOver { .. } => summary.game_over = true,
                _ => {}
            }
        }
        if game.phase() == GamePhase::Menu {
            break;
        }
    }

    let world = game.world();
    summary.final_level = game.level();
    summary.phase = Some(game.phase());
    summary.scores = world.players.iter().map(|p| p.score).collect();
    summary.final_infection = world.infection.count();

    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Failed to serialize summary: {}", e),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is used as a library on the web; there is no headless runner
}
