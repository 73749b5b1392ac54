//! Read-only views for renderers and HUDs

use glam::Vec3;
use serde::Serialize;

use super::level::{Game, GamePhase};
use super::state::{Bomb, BombArea, Enemy, EnemyTag, Player, Projectile, Ship};
use super::terrain::GridCell;

/// Per-player HUD readout
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HudInfo {
    pub score: u64,
    /// Height above ground (or sea), never negative
    pub altitude: f32,
    /// Infected tiles in the world
    pub infection: usize,
    /// Enemies still alive this level
    pub enemies: usize,
    pub missiles: u32,
    pub level: u32,
    pub alive: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShipSnapshot {
    pub player: usize,
    pub alive: bool,
    pub score: u64,
    pub ship: Ship,
}

impl From<&Player> for ShipSnapshot {
    fn from(p: &Player) -> Self {
        Self {
            player: p.id,
            alive: p.alive,
            score: p.score,
            ship: p.ship,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnemySnapshot {
    pub id: u32,
    pub kind: EnemyTag,
    pub pos: Vec3,
}

impl From<&Enemy> for EnemySnapshot {
    fn from(e: &Enemy) -> Self {
        Self {
            id: e.id,
            kind: e.kind.tag(),
            pos: e.pos,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProjectileKind {
    Bullet,
    Missile,
    EnemyBullet,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileSnapshot {
    pub id: u32,
    pub kind: ProjectileKind,
    /// Firing player, `None` for enemy shots
    pub owner: Option<usize>,
    pub pos: Vec3,
    pub vel: Vec3,
}

impl ProjectileSnapshot {
    fn new(p: &Projectile, kind: ProjectileKind, owner: Option<usize>) -> Self {
        Self {
            id: p.id,
            kind,
            owner,
            pos: p.pos,
            vel: p.vel,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BombSnapshot {
    pub id: u32,
    pub pos: Vec3,
    pub area: BombArea,
}

impl From<&Bomb> for BombSnapshot {
    fn from(b: &Bomb) -> Self {
        Self {
            id: b.id,
            pos: b.pos,
            area: b.area,
        }
    }
}

/// Everything a renderer draws for one frame
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub level: u32,
    pub ships: Vec<ShipSnapshot>,
    pub enemies: Vec<EnemySnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub bombs: Vec<BombSnapshot>,
    pub infected: Vec<GridCell>,
}

impl Game {
    /// HUD numbers for one player, `None` if no such player
    pub fn hud(&self, player: usize) -> Option<HudInfo> {
        let world = self.world();
        let p = world.players.get(player)?;
        Some(HudInfo {
            score: p.score,
            altitude: world.terrain.ground_clearance(p.ship.pos).max(0.0),
            infection: world.infection.count(),
            enemies: world.enemies.len(),
            missiles: p.missiles,
            level: self.level(),
            alive: p.alive,
        })
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let world = self.world();
        let mut projectiles = Vec::new();
        for p in &world.players {
            projectiles.extend(
                p.bullets
                    .iter()
                    .map(|b| ProjectileSnapshot::new(b, ProjectileKind::Bullet, Some(p.id))),
            );
            projectiles.extend(
                p.homing_missiles
                    .iter()
                    .map(|m| ProjectileSnapshot::new(m, ProjectileKind::Missile, Some(p.id))),
            );
        }
        projectiles.extend(
            world
                .enemy_bullets
                .iter()
                .map(|b| ProjectileSnapshot::new(b, ProjectileKind::EnemyBullet, None)),
        );

        WorldSnapshot {
            tick: world.time_ticks,
            phase: self.phase(),
            level: self.level(),
            ships: world.players.iter().map(ShipSnapshot::from).collect(),
            enemies: world.enemies.iter().map(EnemySnapshot::from).collect(),
            projectiles,
            bombs: world.bombs.iter().map(BombSnapshot::from).collect(),
            infected: world.infection.iter().map(|t| t.cell).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::sim::level::Game;
    use crate::tuning::Tuning;

    #[test]
    fn test_hud_reflects_world() {
        let mut game = Game::new(Tuning::default());
        assert!(game.hud(0).is_none());
        game.start_game(1);
        let hud = game.hud(0).unwrap();
        assert_eq!(hud.level, 1);
        assert_eq!(hud.enemies, 2);
        assert_eq!(hud.missiles, 1);
        assert_eq!(hud.infection, 0);
        assert!(hud.alive);
        // Spawn hovers 20 units above the pad
        assert!((hud.altitude - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut game = Game::new(Tuning::default());
        game.start_game(2);
        let snap = game.snapshot();
        assert_eq!(snap.ships.len(), 2);
        assert_eq!(snap.enemies.len(), 2);
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"Playing\""));
        assert!(json.contains("\"Seeder\""));
    }
}
