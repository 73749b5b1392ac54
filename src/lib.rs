//! Virus - hovercraft infection-containment arcade game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain, infection, physics, combat, levels)
//! - `tuning`: Data-driven game balance
//!
//! World axes: X and Z span the ground plane and Y grows *downward*, so a
//! smaller Y is higher in the sky and "downward velocity" is positive `vy`.

pub mod sim;
pub mod tuning;

pub use sim::{Game, GamePhase, TickInput, tick};
pub use tuning::{Tuning, TuningError};

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Simulation rate; every per-tick rate below assumes this cadence
    pub const SIM_HZ: u32 = 60;

    /// Side length of a terrain/infection tile in world units
    pub const TILE_SIZE: f32 = 120.0;
    /// Sea surface height (Y grows downward)
    pub const SEA_LEVEL: f32 = 200.0;
    /// Launchpad surface height
    pub const LAUNCH_ALT: f32 = 100.0;
    /// Launchpad bounds (inclusive, both axes)
    pub const LAUNCH_MIN: f32 = 0.0;
    pub const LAUNCH_MAX: f32 = 800.0;

    /// Downward acceleration per tick
    pub const GRAVITY: f32 = 0.09;

    /// Ship handling
    pub const YAW_RATE: f32 = 0.04;
    pub const PITCH_RATE: f32 = 0.03;
    pub const PITCH_LIMIT: f32 = std::f32::consts::PI / 2.2;
    pub const THRUST_POWER: f32 = 0.45;
    pub const BRAKE_FACTOR: f32 = 0.96;
    pub const SHIP_DRAG: f32 = 0.985;
    /// Distance from ship center to its landing gear
    pub const SHIP_CLEARANCE: f32 = 12.0;
    /// Downward speed above which touching the ground is fatal
    pub const HARD_LANDING_SPEED: f32 = 2.8;
    /// Horizontal damping applied on a soft landing
    pub const LANDING_FRICTION: f32 = 0.8;

    /// Spawn point (launchpad center, hovering above the pad)
    pub const SPAWN_X: f32 = 400.0;
    pub const SPAWN_Z: f32 = 400.0;
    pub const SPAWN_Y: f32 = LAUNCH_ALT - 20.0;

    /// Bullets
    pub const BULLET_SPEED: f32 = 25.0;
    pub const BULLET_LIFE_TICKS: u32 = 150;
    pub const FIRE_INTERVAL_TICKS: u64 = 6;

    /// Homing missiles
    pub const MISSILE_LAUNCH_SPEED: f32 = 8.0;
    pub const MISSILE_SPEED: f32 = 10.0;
    pub const MISSILE_TURN_BLEND: f32 = 0.12;
    pub const MISSILE_LIFE_TICKS: u32 = 300;

    /// Enemy fire
    pub const ENEMY_BULLET_SPEED: f32 = 12.0;
    pub const ENEMY_BULLET_LIFE_TICKS: u32 = 120;

    /// Mega bombs infect a (2 * R + 1)^2 block
    pub const MEGA_BOMB_RADIUS: i32 = 2;
}

/// Linear interpolation between two vectors
#[inline]
pub fn lerp_vec3(from: Vec3, to: Vec3, t: f32) -> Vec3 {
    from + (to - from) * t
}

/// Normalize angle to [-PI, PI)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector the craft's nose points along (bullets and missiles leave this way)
#[inline]
pub fn nose_direction(pitch: f32, yaw: f32) -> Vec3 {
    let (sp, cp) = pitch.sin_cos();
    let (sy, cy) = yaw.sin_cos();
    Vec3::new(cp * -sy, sp, cp * -cy)
}

/// Direction the hover engine pushes: straight up at zero pitch, tilted forward by pitch
#[inline]
pub fn thrust_direction(pitch: f32, yaw: f32) -> Vec3 {
    let (sp, cp) = pitch.sin_cos();
    let (sy, cy) = yaw.sin_cos();
    Vec3::new(sp * -sy, -cp, sp * -cy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nose_direction_is_unit() {
        for &(p, y) in &[(0.0, 0.0), (0.5, 1.0), (-1.2, 3.0), (1.4, -2.0)] {
            assert!((nose_direction(p, y).length() - 1.0).abs() < 1e-5);
            assert!((thrust_direction(p, y).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_normalize_angle() {
        use std::f32::consts::PI;
        assert!((normalize_angle(2.5 * PI) - 0.5 * PI).abs() < 1e-5);
        assert!((normalize_angle(-1.5 * PI) - 0.5 * PI).abs() < 1e-5);
        assert_eq!(normalize_angle(0.25), 0.25);
    }

    #[test]
    fn test_level_thrust_points_up() {
        let dir = thrust_direction(0.0, 0.7);
        assert!(dir.y < -0.999);
        assert!(dir.x.abs() < 1e-6 && dir.z.abs() < 1e-6);
    }
}
