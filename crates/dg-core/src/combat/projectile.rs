//! Monster projectiles
//!
//! Projectiles move in a straight line on the ground plane and are destroyed
//! by their first contact with a living player or when their lifetime runs
//! out. Contact is tested along the whole segment travelled in a tick so fast
//! projectiles cannot skip over a target.

use serde::{Deserialize, Serialize};

use crate::Vec3;
use crate::data::EffectDef;
use crate::geom::segment_hits_circle_xz;
use crate::monster::MonsterId;
use crate::player::PlayerId;

/// Unique identifier for a projectile within an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(pub u32);

/// A live projectile
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: ProjectileId,
    pub source: MonsterId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub damage: i32,
    pub remaining: f32,
    pub radius: f32,
    pub effect: Option<EffectDef>,
}

/// What happened to a projectile during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectileOutcome {
    Hit {
        projectile: Projectile,
        target: PlayerId,
    },
    Expired(ProjectileId),
}

/// Owns every projectile in flight
#[derive(Debug, Clone, Default)]
pub struct ProjectileSimulator {
    projectiles: Vec<Projectile>,
    next_id: u32,
}

impl ProjectileSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Launch a projectile from `origin` toward `target`.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        &mut self,
        source: MonsterId,
        origin: Vec3,
        target: Vec3,
        speed: f32,
        radius: f32,
        lifetime: f32,
        damage: i32,
        effect: Option<EffectDef>,
    ) -> &Projectile {
        self.next_id += 1;
        let (dx, dz) = origin.direction_xz(&target).unwrap_or((0.0, 1.0));
        self.projectiles.push(Projectile {
            id: ProjectileId(self.next_id),
            source,
            position: origin,
            velocity: Vec3::new(dx * speed, 0.0, dz * speed),
            damage,
            remaining: lifetime,
            radius,
            effect,
        });
        let last = self.projectiles.len() - 1;
        &self.projectiles[last]
    }

    /// Move every projectile and test it against the given living players.
    pub fn tick(&mut self, dt: f32, players: &[(PlayerId, Vec3)]) -> Vec<ProjectileOutcome> {
        let mut outcomes = Vec::new();
        let mut kept = Vec::with_capacity(self.projectiles.len());

        for mut p in self.projectiles.drain(..) {
            let start = p.position;
            let end = start.offset_xz(p.velocity.x * dt, p.velocity.z * dt);
            p.position = end;
            p.remaining -= dt;

            let hit = players
                .iter()
                .filter(|(_, pos)| segment_hits_circle_xz(&start, &end, pos, p.radius))
                .min_by(|a, b| start.distance_xz(&a.1).total_cmp(&start.distance_xz(&b.1)))
                .map(|(id, _)| *id);

            if let Some(target) = hit {
                outcomes.push(ProjectileOutcome::Hit {
                    projectile: p,
                    target,
                });
            } else if p.remaining <= 0.0 {
                outcomes.push(ProjectileOutcome::Expired(p.id));
            } else {
                kept.push(p);
            }
        }

        self.projectiles = kept;
        outcomes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.iter()
    }

    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    /// Remove every projectile, returning their ids.
    pub fn clear(&mut self) -> Vec<ProjectileId> {
        self.projectiles.drain(..).map(|p| p.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launch(sim: &mut ProjectileSimulator, lifetime: f32) -> ProjectileId {
        sim.spawn(
            MonsterId(1),
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 10.0),
            10.0,
            0.5,
            lifetime,
            8,
            None,
        )
        .id
    }

    #[test]
    fn test_expires_after_lifetime() {
        let mut sim = ProjectileSimulator::new();
        let id = launch(&mut sim, 0.25);
        assert!(sim.tick(0.1, &[]).is_empty());
        assert!(sim.tick(0.1, &[]).is_empty());
        assert_eq!(sim.tick(0.1, &[]), vec![ProjectileOutcome::Expired(id)]);
        assert!(sim.is_empty());
    }

    #[test]
    fn test_hits_first_player_on_path_once() {
        let mut sim = ProjectileSimulator::new();
        launch(&mut sim, 2.0);
        let players = [
            (PlayerId(2), Vec3::new(0.0, 0.0, 4.0)),
            (PlayerId(1), Vec3::new(0.1, 0.0, 2.0)),
        ];
        // One big step crosses both players; the nearer one is hit.
        let outcomes = sim.tick(0.5, &players);
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            ProjectileOutcome::Hit { target, projectile } => {
                assert_eq!(*target, PlayerId(1));
                assert_eq!(projectile.damage, 8);
            }
            other => panic!("expected hit, got {other:?}"),
        }
        assert!(sim.is_empty());
    }

    #[test]
    fn test_misses_players_off_the_line() {
        let mut sim = ProjectileSimulator::new();
        launch(&mut sim, 2.0);
        let players = [(PlayerId(1), Vec3::new(3.0, 0.0, 2.0))];
        assert!(sim.tick(0.5, &players).is_empty());
        assert_eq!(sim.len(), 1);
    }
}
