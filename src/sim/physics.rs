//! Per-tick kinematics for ships, projectiles and bombs
//!
//! All rates are per tick; there is no variable timestep.

use glam::Vec3;

use super::state::{BombArea, DeathCause, GameEvent, Projectile, WorldState};
use super::terrain::GridCell;
use super::tick::PlayerInput;
use crate::consts::*;
use crate::lerp_vec3;

/// Advance every live ship by one tick of input, gravity, drag and ground contact
pub fn update_ships(world: &mut WorldState, inputs: &[PlayerInput]) {
    for idx in 0..world.players.len() {
        let input = inputs.get(idx).copied().unwrap_or_default();
        update_ship(world, idx, &input);
    }
}

fn update_ship(world: &mut WorldState, idx: usize, input: &PlayerInput) {
    if !world.players[idx].alive {
        return;
    }

    let tick = world.time_ticks;
    let fire_bullet = input.shoot && tick % FIRE_INTERVAL_TICKS == 0;
    let fire_missile = input.fire_missile && world.players[idx].missiles > 0;
    let bullet_id = fire_bullet.then(|| world.next_entity_id());
    let missile_id = fire_missile.then(|| world.next_entity_id());

    let terrain = &world.terrain;
    let player = &mut world.players[idx];
    let ship = &mut player.ship;

    if input.turn_left {
        ship.yaw += YAW_RATE;
    }
    if input.turn_right {
        ship.yaw -= YAW_RATE;
    }
    if input.pitch_up {
        ship.pitch = (ship.pitch - PITCH_RATE).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }
    if input.pitch_down {
        ship.pitch = (ship.pitch + PITCH_RATE).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    ship.vel.y += GRAVITY;
    if input.thrust {
        ship.vel += ship.thrust_dir() * THRUST_POWER;
    }
    if input.brake {
        ship.vel *= BRAKE_FACTOR;
    }

    if let Some(id) = bullet_id {
        player
            .bullets
            .push(Projectile::launched(id, ship, BULLET_SPEED, BULLET_LIFE_TICKS));
    }
    if let Some(id) = missile_id {
        player.missiles -= 1;
        player.homing_missiles.push(Projectile::launched(
            id,
            ship,
            MISSILE_LAUNCH_SPEED,
            MISSILE_LIFE_TICKS,
        ));
    }

    ship.vel *= SHIP_DRAG;
    ship.pos += ship.vel;

    let mut death = None;
    if ship.pos.y > SEA_LEVEL - SHIP_CLEARANCE {
        death = Some(DeathCause::Sea);
    } else {
        let ground = terrain.altitude(ship.pos.x, ship.pos.z);
        if ship.pos.y > ground - SHIP_CLEARANCE {
            if ship.vel.y > HARD_LANDING_SPEED {
                death = Some(DeathCause::HardLanding);
            } else {
                ship.pos.y = ground - SHIP_CLEARANCE;
                ship.vel.y = 0.0;
                ship.vel.x *= LANDING_FRICTION;
                ship.vel.z *= LANDING_FRICTION;
            }
        }
    }

    if missile_id.is_some() {
        world.emit(GameEvent::MissileFired { player: idx });
    }
    if let Some(cause) = death {
        if cause == DeathCause::Sea {
            let pos = world.players[idx].ship.pos;
            world.emit(GameEvent::Explosion {
                pos: Vec3::new(pos.x, SEA_LEVEL, pos.z),
            });
        }
        world.destroy_ship(idx, cause);
    }
}

/// Steer a homing missile one tick toward `target` and move it
///
/// Velocity blends toward the ideal heading instead of snapping, then is
/// renormalized so the missile only ever turns, never changes speed.
pub fn steer_missile(missile: &mut Projectile, target: Option<Vec3>) {
    if let Some(target) = target {
        let to_target = target - missile.pos;
        let dist = to_target.length();
        if dist > 0.0 {
            let ideal = to_target / dist * MISSILE_SPEED;
            missile.vel = lerp_vec3(missile.vel, ideal, MISSILE_TURN_BLEND);
        }
    }
    let speed = missile.vel.length();
    if speed > 0.0 {
        missile.vel = missile.vel / speed * MISSILE_SPEED;
    }
    missile.pos += missile.vel;
}

/// Brute-force nearest point
pub fn nearest(points: &[Vec3], from: Vec3) -> Option<Vec3> {
    points
        .iter()
        .copied()
        .min_by(|a, b| {
            a.distance_squared(from)
                .partial_cmp(&b.distance_squared(from))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// Move player bullets and homing missiles; ground hits try to cure infection
pub fn update_projectiles(world: &mut WorldState) {
    let terrain = &world.terrain;
    let targets: Vec<Vec3> = world.enemies.iter().map(|e| e.pos).collect();
    let mut bullet_impacts: Vec<(usize, Vec3)> = Vec::new();
    let mut missile_impacts: Vec<(usize, Vec3)> = Vec::new();

    for player in world.players.iter_mut() {
        let pid = player.id;
        player.bullets.retain_mut(|b| {
            b.pos += b.vel;
            b.ticks_left = b.ticks_left.saturating_sub(1);
            if b.ticks_left == 0 {
                return false;
            }
            if b.pos.y > terrain.altitude(b.pos.x, b.pos.z) {
                bullet_impacts.push((pid, b.pos));
                return false;
            }
            true
        });

        player.homing_missiles.retain_mut(|m| {
            steer_missile(m, nearest(&targets, m.pos));
            m.ticks_left = m.ticks_left.saturating_sub(1);
            if m.pos.y > terrain.altitude(m.pos.x, m.pos.z) {
                missile_impacts.push((pid, m.pos));
                return false;
            }
            m.ticks_left > 0
        });
    }

    for (pid, pos) in bullet_impacts {
        world.clear_infection_at(pos.x, pos.z, Some(pid));
    }
    for (pid, pos) in missile_impacts {
        world.emit(GameEvent::Explosion { pos });
        world.clear_infection_at(pos.x, pos.z, Some(pid));
    }
}

/// Enemy shots fly straight until they time out or hit the ground
pub fn update_enemy_bullets(world: &mut WorldState) {
    let terrain = &world.terrain;
    world.enemy_bullets.retain_mut(|b| {
        b.pos += b.vel;
        b.ticks_left = b.ticks_left.saturating_sub(1);
        b.ticks_left > 0 && b.pos.y <= terrain.altitude(b.pos.x, b.pos.z)
    });
}

/// Drop bombs under gravity; impacts infect their target cell or block
pub fn update_bombs(world: &mut WorldState) {
    let terrain = &world.terrain;
    let mut impacts = Vec::new();
    world.bombs.retain_mut(|bomb| {
        bomb.vel.y += GRAVITY;
        bomb.pos += bomb.vel;
        if bomb.pos.y >= terrain.altitude(bomb.pos.x, bomb.pos.z) {
            impacts.push(*bomb);
            return false;
        }
        true
    });

    let tick = world.time_ticks;
    for bomb in impacts {
        let infected = match bomb.area {
            BombArea::Single => {
                usize::from(world.infection.seed(bomb.target, &world.terrain, tick))
            }
            BombArea::Mega => {
                let r = MEGA_BOMB_RADIUS;
                let mut n = 0;
                for dx in -r..=r {
                    for dz in -r..=r {
                        let cell: GridCell = bomb.target.offset(dx, dz);
                        if world.infection.seed(cell, &world.terrain, tick) {
                            n += 1;
                        }
                    }
                }
                n
            }
        };
        log::debug!("{:?} bomb hit {:?}, infected {}", bomb.area, bomb.target, infected);
        world.emit(GameEvent::Explosion { pos: bomb.pos });
        world.emit(GameEvent::BombImpact {
            cell: bomb.target,
            area: bomb.area,
            infected,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Bomb, Player, Ship};
    use crate::sim::terrain::is_above_sea;
    use crate::tuning::Tuning;

    fn world_with_player() -> WorldState {
        let mut world = WorldState::new(Tuning::default());
        world.players.push(Player::new(0, 0.0));
        world
    }

    #[test]
    fn test_hard_landing_kills() {
        let mut world = world_with_player();
        // One unit above touchdown on the pad, falling at 3.0
        let ship = &mut world.players[0].ship;
        ship.pos.y = LAUNCH_ALT - SHIP_CLEARANCE - 1.0;
        ship.vel = Vec3::new(0.0, 3.0, 0.0);

        update_ships(&mut world, &[PlayerInput::default()]);
        assert!(!world.players[0].alive);
        assert!(world.events.contains(&GameEvent::ShipDestroyed {
            player: 0,
            cause: DeathCause::HardLanding
        }));
    }

    #[test]
    fn test_soft_landing_clamps_to_ground() {
        let mut world = world_with_player();
        let ship = &mut world.players[0].ship;
        ship.pos.y = LAUNCH_ALT - SHIP_CLEARANCE - 1.0;
        ship.vel = Vec3::new(2.0, 1.5, -2.0);

        update_ships(&mut world, &[PlayerInput::default()]);
        let p = &world.players[0];
        assert!(p.alive);
        assert_eq!(p.ship.pos.y, LAUNCH_ALT - SHIP_CLEARANCE);
        assert_eq!(p.ship.vel.y, 0.0);
        assert!(p.ship.vel.x < 2.0 * SHIP_DRAG);
    }

    #[test]
    fn test_sea_crash_is_fatal() {
        let mut world = world_with_player();
        // Find open water away from the pad
        let (x, z) = (-200..200)
            .flat_map(|i| (-200..200).map(move |j| (i as f32 * 97.0, j as f32 * 97.0)))
            .find(|&(x, z)| is_above_sea(world.terrain.altitude(x, z)))
            .expect("water somewhere");
        let ship = &mut world.players[0].ship;
        ship.pos = Vec3::new(x, SEA_LEVEL - SHIP_CLEARANCE - 0.5, z);
        ship.vel = Vec3::new(0.0, 0.6, 0.0);

        update_ships(&mut world, &[PlayerInput::default()]);
        assert!(!world.players[0].alive);
        assert!(world.events.contains(&GameEvent::ShipDestroyed {
            player: 0,
            cause: DeathCause::Sea
        }));
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut world = world_with_player();
        world.players[0].ship.pos.y = -400.0;
        let input = PlayerInput {
            pitch_down: true,
            ..Default::default()
        };
        for _ in 0..200 {
            update_ships(&mut world, &[input]);
        }
        assert!((world.players[0].ship.pitch - PITCH_LIMIT).abs() < 1e-6);
    }

    #[test]
    fn test_thrust_counters_gravity() {
        let mut idle = world_with_player();
        let mut thrusting = world_with_player();
        let input = PlayerInput {
            thrust: true,
            ..Default::default()
        };
        update_ships(&mut idle, &[PlayerInput::default()]);
        update_ships(&mut thrusting, &[input]);
        assert!(thrusting.players[0].ship.pos.y < idle.players[0].ship.pos.y);
    }

    #[test]
    fn test_fire_cadence_and_missile_ammo() {
        let mut world = world_with_player();
        world.players[0].ship.pos.y = -400.0;
        world.players[0].missiles = 1;
        let input = PlayerInput {
            shoot: true,
            fire_missile: true,
            ..Default::default()
        };
        for t in 0..12 {
            world.time_ticks = t;
            update_ships(&mut world, &[input]);
        }
        let p = &world.players[0];
        assert_eq!(p.bullets.len(), 2);
        assert_eq!(p.homing_missiles.len(), 1);
        assert_eq!(p.missiles, 0);
    }

    #[test]
    fn test_missile_speed_is_constant() {
        let mut missile = Projectile {
            id: 1,
            pos: Vec3::ZERO,
            vel: Vec3::new(3.0, 0.0, 1.0),
            ticks_left: 100,
        };
        let target = Vec3::new(-500.0, 200.0, 800.0);
        for i in 0..60 {
            // Alternate between chasing and coasting
            let t = if i % 3 == 0 { None } else { Some(target) };
            steer_missile(&mut missile, t);
            assert!((missile.vel.length() - MISSILE_SPEED).abs() < 1e-3);
        }
    }

    #[test]
    fn test_missile_turns_gradually() {
        let mut missile = Projectile {
            id: 1,
            pos: Vec3::ZERO,
            vel: Vec3::new(MISSILE_SPEED, 0.0, 0.0),
            ticks_left: 100,
        };
        // Target directly behind: one tick must not reverse the heading
        steer_missile(&mut missile, Some(Vec3::new(-1000.0, 0.0, 0.0)));
        assert!(missile.vel.x > 0.0);
    }

    #[test]
    fn test_missile_on_target_keeps_heading() {
        let mut missile = Projectile {
            id: 1,
            pos: Vec3::new(5.0, 5.0, 5.0),
            vel: Vec3::new(0.0, 0.0, MISSILE_SPEED),
            ticks_left: 100,
        };
        steer_missile(&mut missile, Some(Vec3::new(5.0, 5.0, 5.0)));
        assert_eq!(missile.vel, Vec3::new(0.0, 0.0, MISSILE_SPEED));
    }

    #[test]
    fn test_bullet_expires_after_lifetime() {
        let mut world = world_with_player();
        let mut ship = Ship::at_spawn(0.0);
        ship.pos.y = -2000.0;
        ship.pitch = -0.5; // nose up
        world.players[0]
            .bullets
            .push(Projectile::launched(1, &ship, BULLET_SPEED, 3));
        for _ in 0..2 {
            update_projectiles(&mut world);
        }
        assert_eq!(world.players[0].bullets.len(), 1);
        update_projectiles(&mut world);
        assert!(world.players[0].bullets.is_empty());
    }

    #[test]
    fn test_bullet_ground_hit_clears_infection() {
        let mut world = world_with_player();
        let cell = (-100..100)
            .flat_map(|x| (-100..100).map(move |z| GridCell::new(x, z)))
            .find(|&c| world.terrain.is_infectable(c))
            .unwrap();
        world.infection.seed(cell, &world.terrain, 0);
        let (cx, cz) = cell.center(TILE_SIZE);
        let ground = world.terrain.altitude(cx, cz);
        world.players[0].bullets.push(Projectile {
            id: 1,
            pos: Vec3::new(cx, ground - 5.0, cz),
            vel: Vec3::new(0.0, 10.0, 0.0),
            ticks_left: 50,
        });

        update_projectiles(&mut world);
        assert!(world.players[0].bullets.is_empty());
        assert!(world.infection.is_empty());
        assert_eq!(world.players[0].score, world.tuning.scoring.infection_clear);
    }

    #[test]
    fn test_mega_bomb_infects_block() {
        let mut world = WorldState::new(Tuning::default());
        let terrain = &world.terrain;
        let center = (-150..150)
            .flat_map(|x| (-150..150).map(move |z| GridCell::new(x, z)))
            .find(|&c| {
                (-2..=2).all(|dx| (-2..=2).all(|dz| terrain.is_infectable(c.offset(dx, dz))))
            })
            .unwrap();
        let (cx, cz) = center.center(TILE_SIZE);
        let ground = world.terrain.altitude(cx, cz);
        world.bombs.push(Bomb {
            id: 1,
            pos: Vec3::new(cx, ground - 0.5, cz),
            vel: Vec3::new(0.0, 2.0, 0.0),
            target: center,
            area: BombArea::Mega,
        });
        update_bombs(&mut world);
        assert!(world.bombs.is_empty());
        assert_eq!(world.infection.count(), 25);
    }

    #[test]
    fn test_nearest_picks_closest() {
        let pts = [Vec3::new(100.0, 0.0, 0.0), Vec3::new(-10.0, 0.0, 0.0)];
        assert_eq!(nearest(&pts, Vec3::ZERO), Some(pts[1]));
        assert_eq!(nearest(&[], Vec3::ZERO), None);
    }
}
