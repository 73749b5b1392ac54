//! Combat resolution
//!
//! Proximity tests between ships, projectiles, enemies and infected trees.
//! Everything is a squared-distance check against a fixed radius; the
//! entity counts are small enough that brute force is fine.

use glam::Vec3;

use super::scenery::Scenery;
use super::state::{DeathCause, Enemy, GameEvent, KillMethod, WorldState};
use super::terrain::GridCell;

/// Ship body vs enemy
pub const SHIP_HIT_RADIUS: f32 = 70.0;
/// Player bullet vs enemy
pub const BULLET_HIT_RADIUS: f32 = 80.0;
/// Homing missile vs enemy
pub const MISSILE_HIT_RADIUS: f32 = 100.0;
/// Enemy bullet vs ship
pub const ENEMY_BULLET_HIT_RADIUS: f32 = 40.0;
/// Horizontal reach of a tree canopy for bullet hits
pub const TREE_HIT_RADIUS: f32 = 60.0;

/// An infected tree that can absorb bullets this tick
#[derive(Debug, Clone, Copy)]
struct TreeTarget {
    x: f32,
    z: f32,
    top: f32,
    ground: f32,
    cell: GridCell,
}

impl TreeTarget {
    fn is_hit_by(&self, pos: Vec3) -> bool {
        let dx = pos.x - self.x;
        let dz = pos.z - self.z;
        dx * dx + dz * dz < TREE_HIT_RADIUS * TREE_HIT_RADIUS
            && pos.y >= self.top
            && pos.y <= self.ground
    }
}

/// Resolve every hit for this tick, player by player
pub fn resolve_collisions(world: &mut WorldState) {
    let trees = infected_trees(world);
    for idx in 0..world.players.len() {
        if world.players[idx].alive {
            enemy_fire_vs_ship(world, idx);
            enemies_vs_player(world, idx);
        }
        missiles_vs_enemies(world, idx);
        bullets_vs_trees(world, idx, &trees);
    }
}

fn infected_trees(world: &WorldState) -> Vec<TreeTarget> {
    let tile = world.terrain.tile_size();
    world
        .scenery
        .standing_trees(&world.terrain)
        .filter(|t| Scenery::tree_is_infected(t, &world.infection, &world.terrain))
        .map(|t| {
            let ground = world.terrain.altitude(t.x, t.z);
            TreeTarget {
                x: t.x,
                z: t.z,
                top: t.canopy_top(ground),
                ground,
                cell: t.cell(tile),
            }
        })
        .collect()
}

fn enemy_fire_vs_ship(world: &mut WorldState, idx: usize) {
    let ship = world.players[idx].ship.pos;
    let reach = ENEMY_BULLET_HIT_RADIUS * ENEMY_BULLET_HIT_RADIUS;
    if let Some(i) = world
        .enemy_bullets
        .iter()
        .position(|b| b.pos.distance_squared(ship) < reach)
    {
        world.enemy_bullets.remove(i);
        world.destroy_ship(idx, DeathCause::EnemyFire);
    }
}

/// Bullets first, then the ship body; an enemy dies at most once
fn enemies_vs_player(world: &mut WorldState, idx: usize) {
    let bullet_reach = BULLET_HIT_RADIUS * BULLET_HIT_RADIUS;
    let ship_reach = SHIP_HIT_RADIUS * SHIP_HIT_RADIUS;
    let points = world.tuning.scoring.bullet_kill;

    let mut e = 0;
    while e < world.enemies.len() {
        let enemy = world.enemies[e];
        let player = &mut world.players[idx];

        if let Some(b) = player
            .bullets
            .iter()
            .position(|b| b.pos.distance_squared(enemy.pos) < bullet_reach)
        {
            player.bullets.remove(b);
            world.enemies.remove(e);
            credit_kill(world, idx, &enemy, KillMethod::Bullet, points);
            continue;
        }

        if player.alive && player.ship.pos.distance_squared(enemy.pos) < ship_reach {
            world.enemies.remove(e);
            credit_kill(world, idx, &enemy, KillMethod::Ram, 0);
            world.destroy_ship(idx, DeathCause::Collision);
            continue;
        }

        e += 1;
    }
}

fn missiles_vs_enemies(world: &mut WorldState, idx: usize) {
    let reach = MISSILE_HIT_RADIUS * MISSILE_HIT_RADIUS;
    let points = world.tuning.scoring.missile_kill;

    let mut m = 0;
    while m < world.players[idx].homing_missiles.len() {
        let pos = world.players[idx].homing_missiles[m].pos;
        if let Some(e) = world
            .enemies
            .iter()
            .position(|enemy| enemy.pos.distance_squared(pos) < reach)
        {
            let enemy = world.enemies.remove(e);
            world.players[idx].homing_missiles.remove(m);
            credit_kill(world, idx, &enemy, KillMethod::Missile, points);
            continue;
        }
        m += 1;
    }
}

/// Infected trees soak up bullets and get cured; healthy ones are transparent
fn bullets_vs_trees(world: &mut WorldState, idx: usize, trees: &[TreeTarget]) {
    if trees.is_empty() {
        return;
    }
    let radius = world.infection.config().clear_radius;
    let points = world.tuning.scoring.infected_tree;

    let mut b = 0;
    while b < world.players[idx].bullets.len() {
        let pos = world.players[idx].bullets[b].pos;
        let hit = trees
            .iter()
            .find(|t| world.infection.contains(t.cell) && t.is_hit_by(pos));
        if let Some(tree) = hit.copied() {
            world.players[idx].bullets.remove(b);
            let cells = world.infection.clear_radius(tree.cell, radius);
            world.players[idx].score += points;
            log::debug!("Player {} cured tree at {:?} ({} cells)", idx, tree.cell, cells);
            world.emit(GameEvent::Explosion {
                pos: Vec3::new(tree.x, tree.top, tree.z),
            });
            world.emit(GameEvent::InfectionCleared {
                player: Some(idx),
                cell: tree.cell,
                cells,
                points,
            });
            continue;
        }
        b += 1;
    }
}

fn credit_kill(world: &mut WorldState, idx: usize, enemy: &Enemy, by: KillMethod, points: u64) {
    world.players[idx].score += points;
    let kind = enemy.kind.tag();
    log::debug!("Player {} killed {:?} #{} ({:?})", idx, kind, enemy.id, by);
    world.emit(GameEvent::Explosion { pos: enemy.pos });
    world.emit(GameEvent::EnemyKilled {
        player: idx,
        kind,
        by,
    });
}
