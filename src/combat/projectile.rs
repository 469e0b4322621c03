//! Transient projectiles fired by the player and by agents.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::agent::AgentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(pub u64);

/// Who fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileOwner {
    Player,
    Agent(AgentId),
}

/// Launch parameters, before an id is assigned
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileSpec {
    pub origin: Vec3,
    pub direction: Vec3,
    pub speed: f32,
    pub damage: f32,
    pub max_range: f32,
    pub owner: ProjectileOwner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: ProjectileId,
    pub position: Vec3,
    /// Position before the last advance; hit tests use the whole segment
    pub previous: Vec3,
    /// Direction times speed
    pub velocity: Vec3,
    pub damage: f32,
    pub max_range: f32,
    pub traveled: f32,
    pub owner: ProjectileOwner,
}

impl Projectile {
    /// Move along the flight path. Returns false once range is exhausted.
    pub fn advance(&mut self, dt: f32) -> bool {
        let step = self.velocity * dt;
        self.previous = self.position;
        self.position += step;
        self.traveled += step.length();
        !self.is_spent()
    }

    /// Closest approach to `point` over the last step
    pub fn sweep_distance(&self, point: Vec3) -> f32 {
        let path = self.position - self.previous;
        let len2 = path.length_squared();
        if len2 <= f32::EPSILON {
            return self.position.distance(point);
        }
        let t = ((point - self.previous).dot(path) / len2).clamp(0.0, 1.0);
        (self.previous + path * t).distance(point)
    }

    pub fn is_spent(&self) -> bool {
        self.traveled >= self.max_range
    }

    pub fn fired_by_player(&self) -> bool {
        self.owner == ProjectileOwner::Player
    }
}

/// Owned collection of live projectiles
#[derive(Debug, Default)]
pub struct ProjectilePool {
    projectiles: Vec<Projectile>,
    next_id: u64,
}

impl ProjectilePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Launch a projectile. A zero-length direction fires nothing.
    pub fn spawn(&mut self, spec: ProjectileSpec) -> Option<ProjectileId> {
        let direction = spec.direction.try_normalize()?;
        let id = ProjectileId(self.next_id);
        self.next_id += 1;
        self.projectiles.push(Projectile {
            id,
            position: spec.origin,
            previous: spec.origin,
            velocity: direction * spec.speed,
            damage: spec.damage,
            max_range: spec.max_range,
            traveled: 0.0,
            owner: spec.owner,
        });
        Some(id)
    }

    /// Advance everything and drop projectiles past their range
    pub fn advance_all(&mut self, dt: f32) -> usize {
        let before = self.projectiles.len();
        self.projectiles.retain_mut(|p| p.advance(dt));
        before - self.projectiles.len()
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

    /// Remove projectiles by id in one pass
    pub fn remove_all(&mut self, ids: &[ProjectileId]) {
        if ids.is_empty() {
            return;
        }
        self.projectiles.retain(|p| !ids.contains(&p.id));
    }

    pub fn clear(&mut self) {
        self.projectiles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(direction: Vec3) -> ProjectileSpec {
        ProjectileSpec {
            origin: Vec3::ZERO,
            direction,
            speed: 10.0,
            damage: 5.0,
            max_range: 25.0,
            owner: ProjectileOwner::Player,
        }
    }

    #[test]
    fn test_spawn_normalizes_direction() {
        let mut pool = ProjectilePool::new();
        pool.spawn(spec(Vec3::new(0.0, 0.0, -3.0)));
        let p = pool.iter().next().expect("spawned");
        assert_eq!(p.velocity, Vec3::new(0.0, 0.0, -10.0));
    }

    #[test]
    fn test_zero_direction_fires_nothing() {
        let mut pool = ProjectilePool::new();
        assert!(pool.spawn(spec(Vec3::ZERO)).is_none());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_range_exhaustion_discards() {
        let mut pool = ProjectilePool::new();
        pool.spawn(spec(Vec3::X));
        assert_eq!(pool.advance_all(1.0), 0);
        assert_eq!(pool.advance_all(1.0), 0);
        assert_eq!(pool.len(), 1);
        // 30 units traveled > 25 range
        assert_eq!(pool.advance_all(1.0), 1);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_sweep_catches_fast_pass() {
        let mut pool = ProjectilePool::new();
        pool.spawn(ProjectileSpec {
            speed: 60.0,
            ..spec(Vec3::X)
        });
        pool.advance_all(0.1);
        let p = pool.iter().next().expect("in flight");
        // Passed straight through x = 3 within one step
        assert!(p.position.distance(Vec3::new(3.0, 0.0, 0.0)) > 2.9);
        assert!(p.sweep_distance(Vec3::new(3.0, 0.0, 0.0)) < 1e-5);
        assert!((p.sweep_distance(Vec3::new(3.0, 1.0, 0.0)) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_remove_all_by_id() {
        let mut pool = ProjectilePool::new();
        let a = pool.spawn(spec(Vec3::X)).expect("a");
        let b = pool.spawn(spec(Vec3::Z)).expect("b");
        pool.remove_all(&[a]);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.iter().next().map(|p| p.id), Some(b));
    }
}
