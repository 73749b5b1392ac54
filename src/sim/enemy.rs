//! Enemy behaviors and spawning
//!
//! Each [`EnemyKind`] variant has its own update function; [`update_enemy`]
//! dispatches to it and returns whatever the enemy wants done to the world
//! (bombs, shots, direct seeding) so the caller can apply it with full access.

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;

use super::physics::nearest;
use super::state::{
    Bomb, BombArea, CrabState, Enemy, EnemyKind, EnemyTag, FighterState, Projectile, WorldState,
};
use super::terrain::{AltitudeField, GridCell, is_above_sea, is_launchpad};
use crate::consts::*;
use crate::lerp_vec3;

/// Patrollers turn back once this far from the reference ship on an axis
pub const PATROL_RADIUS: f32 = 5000.0;

const SEEDER_DROP_CHANCE: f32 = 0.008;
const BOMBER_DROP_CHANCE: f32 = 0.004;
const PATROL_MIN_CLEARANCE: f32 = 100.0;

const FIGHTER_SPEED: f32 = 5.0;
const FIGHTER_BLEND: f32 = 0.05;
const FIGHTER_AGGRO_TICKS: u32 = 300;
const FIGHTER_WANDER_TICKS: u32 = 180;
const FIGHTER_RANGE: f32 = 1500.0;
const FIGHTER_FIRE_TICKS: u32 = 45;
const FIGHTER_SEED_CHANCE: f32 = 0.002;
const FIGHTER_MIN_CLEARANCE: f32 = 80.0;

const CRAB_SPEED: f32 = 1.5;
const CRAB_HEIGHT: f32 = 10.0;
const CRAB_SEED_TICKS: u32 = 240;
const CRAB_RANGE: f32 = 600.0;
const CRAB_FIRE_TICKS: u32 = 90;

const HUNTER_SPEED: f32 = 6.5;
const HUNTER_BLEND: f32 = 0.08;
const HUNTER_MIN_CLEARANCE: f32 = 40.0;

/// What an enemy asks the world to do after moving
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnemyAction {
    DropBomb {
        target: GridCell,
        area: BombArea,
    },
    Seed(GridCell),
    Fire { at: Vec3 },
}

/// Read-only world view plus the RNG, for one enemy update
pub struct EnemyContext<'a> {
    pub terrain: &'a AltitudeField,
    /// Ships currently in play
    pub ships: &'a [Vec3],
    /// Fallback reference when every ship is down
    pub home: Vec3,
    pub tick: u64,
    pub rng: &'a mut Pcg32,
}

impl EnemyContext<'_> {
    fn nearest_ship(&self, from: Vec3) -> Option<Vec3> {
        nearest(self.ships, from)
    }

    fn reference_ship(&self, from: Vec3) -> Vec3 {
        self.nearest_ship(from).unwrap_or(self.home)
    }

    /// Tile below a point, if bombs or seeds may land there
    fn seedable_cell_below(&self, pos: Vec3) -> Option<GridCell> {
        if is_above_sea(self.terrain.altitude(pos.x, pos.z)) {
            return None;
        }
        let cell = GridCell::from_world(pos.x, pos.z, self.terrain.tile_size());
        let (wx, wz) = cell.origin(self.terrain.tile_size());
        (!is_launchpad(wx, wz)).then_some(cell)
    }
}

/// Run one enemy's behavior for this tick
pub fn update_enemy(enemy: &mut Enemy, ctx: &mut EnemyContext) -> Option<EnemyAction> {
    match enemy.kind {
        EnemyKind::Seeder { bob_phase } => patrol(
            enemy,
            ctx,
            bob_phase,
            SEEDER_DROP_CHANCE,
            BombArea::Single,
        ),
        EnemyKind::Bomber { bob_phase } => {
            patrol(enemy, ctx, bob_phase, BOMBER_DROP_CHANCE, BombArea::Mega)
        }
        EnemyKind::Fighter(mut state) => {
            let action = fighter(enemy, &mut state, ctx);
            enemy.kind = EnemyKind::Fighter(state);
            action
        }
        EnemyKind::Crab(mut state) => {
            let action = crab(enemy, &mut state, ctx);
            enemy.kind = EnemyKind::Crab(state);
            action
        }
        EnemyKind::Hunter => {
            hunter(enemy, ctx);
            None
        }
    }
}

/// Straight-line drift with a vertical bob, turning back at the patrol radius
fn patrol(
    enemy: &mut Enemy,
    ctx: &mut EnemyContext,
    bob_phase: f32,
    drop_chance: f32,
    area: BombArea,
) -> Option<EnemyAction> {
    enemy.pos.x += enemy.vel.x;
    enemy.pos.z += enemy.vel.z;
    enemy.pos.y += (ctx.tick as f32 * 0.05 + bob_phase).sin() * 2.0;

    let reference = ctx.reference_ship(enemy.pos);
    let dx = enemy.pos.x - reference.x;
    let dz = enemy.pos.z - reference.z;
    // Only flip while heading further out, so the enemy can't jitter at the edge
    if dx.abs() > PATROL_RADIUS && dx * enemy.vel.x > 0.0 {
        enemy.vel.x = -enemy.vel.x;
    }
    if dz.abs() > PATROL_RADIUS && dz * enemy.vel.z > 0.0 {
        enemy.vel.z = -enemy.vel.z;
    }

    let ground = ctx.terrain.altitude(enemy.pos.x, enemy.pos.z);
    enemy.pos.y = enemy.pos.y.min(ground - PATROL_MIN_CLEARANCE);

    if ctx.rng.random::<f32>() < drop_chance {
        return ctx
            .seedable_cell_below(enemy.pos)
            .map(|target| EnemyAction::DropBomb { target, area });
    }
    None
}

fn fighter(
    enemy: &mut Enemy,
    state: &mut FighterState,
    ctx: &mut EnemyContext,
) -> Option<EnemyAction> {
    state.phase_ticks = state.phase_ticks.saturating_sub(1);
    if state.phase_ticks == 0 {
        state.aggressive = !state.aggressive;
        state.phase_ticks = if state.aggressive {
            FIGHTER_AGGRO_TICKS
        } else {
            FIGHTER_WANDER_TICKS
        };
        if !state.aggressive {
            state.wander_target = pick_wander_target(enemy.pos, ctx.rng);
        }
    }

    let target = ctx.nearest_ship(enemy.pos);
    let goal = match target {
        Some(ship) if state.aggressive => ship,
        _ => {
            if enemy.pos.distance_squared(state.wander_target) < 100.0 * 100.0 {
                state.wander_target = pick_wander_target(enemy.pos, ctx.rng);
            }
            state.wander_target
        }
    };
    if let Some(dir) = (goal - enemy.pos).try_normalize() {
        enemy.vel = lerp_vec3(enemy.vel, dir * FIGHTER_SPEED, FIGHTER_BLEND);
    }
    enemy.pos += enemy.vel;
    keep_clear_of_ground(enemy, ctx.terrain, FIGHTER_MIN_CLEARANCE);

    state.fire_cooldown = state.fire_cooldown.saturating_sub(1);
    if let Some(ship) = target {
        if state.aggressive
            && state.fire_cooldown == 0
            && enemy.pos.distance_squared(ship) < FIGHTER_RANGE * FIGHTER_RANGE
        {
            state.fire_cooldown = FIGHTER_FIRE_TICKS;
            return Some(EnemyAction::Fire { at: ship });
        }
    }

    if !state.aggressive && ctx.rng.random::<f32>() < FIGHTER_SEED_CHANCE {
        return ctx.seedable_cell_below(enemy.pos).map(EnemyAction::Seed);
    }
    None
}

/// Walks the ground toward the nearest ship's X/Z, never into water
fn crab(enemy: &mut Enemy, state: &mut CrabState, ctx: &mut EnemyContext) -> Option<EnemyAction> {
    let target = ctx.nearest_ship(enemy.pos);
    enemy.vel = Vec3::ZERO;
    if let Some(ship) = target {
        let flat = Vec3::new(ship.x - enemy.pos.x, 0.0, ship.z - enemy.pos.z);
        let dist = flat.length();
        if dist > 0.0 {
            let step = flat / dist * CRAB_SPEED.min(dist);
            let next = enemy.pos + step;
            if !is_above_sea(ctx.terrain.altitude(next.x, next.z)) {
                enemy.pos.x = next.x;
                enemy.pos.z = next.z;
                enemy.vel = step;
            }
        }
    }
    enemy.pos.y = ctx.terrain.altitude(enemy.pos.x, enemy.pos.z) - CRAB_HEIGHT;

    state.fire_cooldown = state.fire_cooldown.saturating_sub(1);
    state.seed_cooldown = state.seed_cooldown.saturating_sub(1);

    if let Some(ship) = target {
        if state.fire_cooldown == 0 && enemy.pos.distance_squared(ship) < CRAB_RANGE * CRAB_RANGE {
            state.fire_cooldown = CRAB_FIRE_TICKS;
            return Some(EnemyAction::Fire { at: ship });
        }
    }
    if state.seed_cooldown == 0 {
        state.seed_cooldown = CRAB_SEED_TICKS;
        return ctx.seedable_cell_below(enemy.pos).map(EnemyAction::Seed);
    }
    None
}

/// Pure pursuit of the nearest ship
fn hunter(enemy: &mut Enemy, ctx: &mut EnemyContext) {
    match ctx.nearest_ship(enemy.pos) {
        Some(ship) => {
            if let Some(dir) = (ship - enemy.pos).try_normalize() {
                enemy.vel = lerp_vec3(enemy.vel, dir * HUNTER_SPEED, HUNTER_BLEND);
            }
        }
        None => enemy.vel *= 0.98,
    }
    enemy.pos += enemy.vel;
    keep_clear_of_ground(enemy, ctx.terrain, HUNTER_MIN_CLEARANCE);
}

fn keep_clear_of_ground(enemy: &mut Enemy, terrain: &AltitudeField, clearance: f32) {
    let ground = terrain.altitude(enemy.pos.x, enemy.pos.z).min(SEA_LEVEL);
    if enemy.pos.y > ground - clearance {
        enemy.pos.y = ground - clearance;
        enemy.vel.y = enemy.vel.y.min(0.0);
    }
}

fn pick_wander_target(from: Vec3, rng: &mut Pcg32) -> Vec3 {
    Vec3::new(
        from.x + rng.random_range(-2000.0..2000.0),
        rng.random_range(-700.0..-300.0),
        from.z + rng.random_range(-2000.0..2000.0),
    )
}

/// Move every enemy and apply the actions they request
pub fn update_enemies(world: &mut WorldState) {
    let ships = world.live_ship_positions();
    let home = world
        .players
        .first()
        .map(|p| p.ship.pos)
        .unwrap_or(Vec3::new(SPAWN_X, SPAWN_Y, SPAWN_Z));
    let tick = world.time_ticks;

    let mut actions = Vec::new();
    {
        let mut ctx = EnemyContext {
            terrain: &world.terrain,
            ships: &ships,
            home,
            tick,
            rng: &mut world.rng,
        };
        for enemy in world.enemies.iter_mut() {
            if let Some(action) = update_enemy(enemy, &mut ctx) {
                actions.push((enemy.pos, action));
            }
        }
    }

    for (origin, action) in actions {
        match action {
            EnemyAction::DropBomb { target, area } => {
                let id = world.next_entity_id();
                world.bombs.push(Bomb {
                    id,
                    pos: origin,
                    vel: Vec3::ZERO,
                    target,
                    area,
                });
            }
            EnemyAction::Seed(cell) => {
                world.infection.seed(cell, &world.terrain, tick);
            }
            EnemyAction::Fire { at } => {
                if let Some(dir) = (at - origin).try_normalize() {
                    let id = world.next_entity_id();
                    world.enemy_bullets.push(Projectile {
                        id,
                        pos: origin,
                        vel: dir * ENEMY_BULLET_SPEED,
                        ticks_left: ENEMY_BULLET_LIFE_TICKS,
                    });
                }
            }
        }
    }
}

/// Kinds available from a given level on
fn unlocked_kinds(level: u32) -> Vec<EnemyTag> {
    let mut kinds = vec![EnemyTag::Seeder];
    if level >= 2 {
        kinds.push(EnemyTag::Fighter);
    }
    if level >= 3 {
        kinds.push(EnemyTag::Bomber);
    }
    if level >= 4 {
        kinds.push(EnemyTag::Crab);
    }
    if level >= 5 {
        kinds.push(EnemyTag::Hunter);
    }
    kinds
}

/// Kind of the `index`-th enemy spawned on `level`; the first is always a Seeder
pub fn kind_for_spawn(level: u32, index: u32, rng: &mut Pcg32) -> EnemyTag {
    if index == 0 {
        return EnemyTag::Seeder;
    }
    let kinds = unlocked_kinds(level);
    kinds[rng.random_range(0..kinds.len())]
}

/// Spawn one enemy of the given kind somewhere in the patrol area
pub fn spawn_enemy(world: &mut WorldState, tag: EnemyTag) {
    let id = world.next_entity_id();
    let rng = &mut world.rng;
    let mut pos = Vec3::new(
        rng.random_range(-4000.0..4000.0),
        rng.random_range(-800.0..-300.0),
        rng.random_range(-4000.0..4000.0),
    );
    let (kind, vel) = match tag {
        EnemyTag::Seeder => (
            EnemyKind::Seeder {
                bob_phase: rng.random_range(0.0..std::f32::consts::TAU),
            },
            Vec3::new(rng.random_range(-2.0..2.0), 0.0, rng.random_range(-2.0..2.0)),
        ),
        EnemyTag::Bomber => (
            EnemyKind::Bomber {
                bob_phase: rng.random_range(0.0..std::f32::consts::TAU),
            },
            Vec3::new(rng.random_range(-1.0..1.0), 0.0, rng.random_range(-1.0..1.0)),
        ),
        EnemyTag::Fighter => (
            EnemyKind::Fighter(FighterState {
                aggressive: false,
                phase_ticks: rng.random_range(1..FIGHTER_WANDER_TICKS),
                wander_target: pick_wander_target(pos, rng),
                fire_cooldown: FIGHTER_FIRE_TICKS,
            }),
            Vec3::ZERO,
        ),
        EnemyTag::Crab => {
            // Walkers need dry land; try a handful of spots before settling
            for _ in 0..64 {
                if !is_above_sea(world.terrain.altitude(pos.x, pos.z)) {
                    break;
                }
                pos.x = rng.random_range(-4000.0..4000.0);
                pos.z = rng.random_range(-4000.0..4000.0);
            }
            pos.y = world.terrain.altitude(pos.x, pos.z).min(SEA_LEVEL) - CRAB_HEIGHT;
            (
                EnemyKind::Crab(CrabState {
                    seed_cooldown: CRAB_SEED_TICKS,
                    fire_cooldown: CRAB_FIRE_TICKS,
                }),
                Vec3::ZERO,
            )
        }
        EnemyTag::Hunter => (EnemyKind::Hunter, Vec3::ZERO),
    };
    log::debug!("Spawned {:?} #{} at {:?}", tag, id, pos);
    world.enemies.push(Enemy { id, pos, vel, kind });
}
