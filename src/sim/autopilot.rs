//! Simple AI pilot for idle/demo mode and headless runs
//!
//! Holds a hover band above the ground, swings the nose toward the nearest
//! enemy (or the nearest infected tile when the sky is clear) and fires
//! when roughly on target.

use glam::Vec3;

use super::physics::nearest;
use super::state::WorldState;
use super::tick::PlayerInput;
use crate::normalize_angle;

/// Climb when closer than this to the ground
const HOVER_LOW: f32 = 150.0;
/// Above the low band, still climb if sinking faster than `SINK_LIMIT`
const HOVER_HIGH: f32 = 350.0;
const SINK_LIMIT: f32 = 0.5;
const CRUISE_SPEED: f32 = 8.0;
const YAW_DEADZONE: f32 = 0.05;
const PITCH_DEADZONE: f32 = 0.05;
/// Don't dive steeper than this while chasing
const MAX_DIVE: f32 = 0.9;
const MAX_CLIMB: f32 = 0.6;
const FIRE_CONE: f32 = 0.15;
const GUN_RANGE: f32 = 2000.0;
const MISSILE_RANGE: f32 = 1200.0;

/// Controls for `player` this tick
pub fn steer(world: &WorldState, player: usize) -> PlayerInput {
    let mut input = PlayerInput::default();
    let Some(p) = world.players.get(player) else {
        return input;
    };
    if !p.alive {
        return input;
    }
    let ship = &p.ship;

    let height = world.terrain.ground_clearance(ship.pos);
    input.thrust = height < HOVER_LOW || (height < HOVER_HIGH && ship.vel.y > SINK_LIMIT);
    input.brake = ship.vel.length() > CRUISE_SPEED;

    let enemies: Vec<Vec3> = world.enemies.iter().map(|e| e.pos).collect();
    let (target, is_enemy) = match nearest(&enemies, ship.pos) {
        Some(pos) => (pos, true),
        None => match nearest_infection(world, ship.pos) {
            Some(pos) => (pos, false),
            None => return input,
        },
    };

    let to = target - ship.pos;
    let desired_yaw = (-to.x).atan2(-to.z);
    let yaw_err = normalize_angle(desired_yaw - ship.yaw);
    if yaw_err > YAW_DEADZONE {
        input.turn_left = true;
    } else if yaw_err < -YAW_DEADZONE {
        input.turn_right = true;
    }

    let horizontal = (to.x * to.x + to.z * to.z).sqrt();
    let desired_pitch = to.y.atan2(horizontal).clamp(-MAX_CLIMB, MAX_DIVE);
    let pitch_err = desired_pitch - ship.pitch;
    if pitch_err > PITCH_DEADZONE {
        input.pitch_down = true;
    } else if pitch_err < -PITCH_DEADZONE {
        input.pitch_up = true;
    }

    let distance = to.length();
    let on_target = yaw_err.abs() < FIRE_CONE && pitch_err.abs() < FIRE_CONE * 2.0;
    input.shoot = on_target && distance < GUN_RANGE;
    input.fire_missile = is_enemy && on_target && distance < MISSILE_RANGE;
    input
}

fn nearest_infection(world: &WorldState, from: Vec3) -> Option<Vec3> {
    let tile = world.terrain.tile_size();
    let cells: Vec<Vec3> = world
        .infection
        .iter()
        .map(|t| {
            let (x, z) = t.cell.center(tile);
            Vec3::new(x, world.terrain.altitude(x, z), z)
        })
        .collect();
    nearest(&cells, from)
}
