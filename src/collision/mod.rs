//! Static collision world.
//!
//! Holds the registry of static colliders (ground plane, boxes, spheres) and
//! resolves a moving sphere against them. Ground height queries go through
//! here too, so terrain structures can raise the walkable surface above the
//! procedural height field.

use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{GROUND_NORMAL_MIN_Y, MAX_RESOLVE_ITERATIONS};
use crate::terrain::HeightField;

const CONTACT_EPSILON: f32 = 1e-4;

/// Registry key for a collider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColliderId(pub u64);

/// Static collision shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Collider {
    /// Infinite ground following the height field
    Plane { normal: Vec3 },
    /// Axis-aligned box
    Box { center: Vec3, half_extents: Vec3 },
    Sphere { center: Vec3, radius: f32 },
}

impl Collider {
    /// Ground plane with an upward normal
    pub fn ground() -> Self {
        Self::Plane { normal: Vec3::Y }
    }

    pub fn cuboid(center: Vec3, half_extents: Vec3) -> Self {
        Self::Box {
            center,
            half_extents: half_extents.abs(),
        }
    }

    pub fn ball(center: Vec3, radius: f32) -> Self {
        Self::Sphere {
            center,
            radius: radius.abs(),
        }
    }

    /// Finite, non-degenerate dimensions
    pub fn is_valid(&self) -> bool {
        match *self {
            Self::Plane { normal } => normal.is_finite() && normal.length_squared() > 0.0,
            Self::Box {
                center,
                half_extents,
            } => center.is_finite() && half_extents.is_finite() && half_extents.cmpgt(Vec3::ZERO).all(),
            Self::Sphere { center, radius } => center.is_finite() && radius.is_finite() && radius > 0.0,
        }
    }

    /// Top of the shape directly above (x, z), if its footprint covers it
    fn top_at(&self, x: f32, z: f32) -> Option<f32> {
        match *self {
            Self::Plane { .. } => None,
            Self::Box {
                center,
                half_extents,
            } => {
                let inside =
                    (x - center.x).abs() <= half_extents.x && (z - center.z).abs() <= half_extents.z;
                inside.then_some(center.y + half_extents.y)
            }
            Self::Sphere { center, radius } => {
                let d2 = (x - center.x).powi(2) + (z - center.z).powi(2);
                let r2 = radius * radius;
                (d2 <= r2).then(|| center.y + (r2 - d2).sqrt())
            }
        }
    }
}

/// Contact between a sphere and a collider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    /// Contact point on the collider surface
    pub point: Vec3,
    /// Push-out direction (unit length)
    pub normal: Vec3,
    /// Overlap depth; zero when just touching
    pub penetration_distance: f32,
    pub collider: ColliderId,
}

/// Outcome of moving a sphere through the collision world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepResult {
    pub position: Vec3,
    pub velocity: Vec3,
    /// A contact normal was steep enough to stand on
    pub grounded: bool,
    pub contacts: usize,
}

/// Collider registry plus the height field it falls back to.
///
/// Iteration order is registration order (removal swaps the last collider
/// into the freed slot). Queries return the first match in that order, not
/// the deepest contact.
pub struct CollisionSystem {
    terrain: Box<dyn HeightField + Send + Sync>,
    colliders: Vec<(ColliderId, Collider)>,
    index: HashMap<ColliderId, usize>,
}

impl CollisionSystem {
    pub fn new(terrain: impl HeightField + Send + Sync + 'static) -> Self {
        Self {
            terrain: Box::new(terrain),
            colliders: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a collider. An existing id is overwritten in place.
    pub fn add_collider(&mut self, id: ColliderId, collider: Collider) {
        match self.index.get(&id) {
            Some(&slot) => self.colliders[slot].1 = collider,
            None => {
                self.index.insert(id, self.colliders.len());
                self.colliders.push((id, collider));
            }
        }
    }

    pub fn remove_collider(&mut self, id: ColliderId) -> Option<Collider> {
        let slot = self.index.remove(&id)?;
        let (_, removed) = self.colliders.swap_remove(slot);
        if let Some(&(moved_id, _)) = self.colliders.get(slot) {
            self.index.insert(moved_id, slot);
        }
        Some(removed)
    }

    pub fn get(&self, id: ColliderId) -> Option<&Collider> {
        self.index.get(&id).map(|&slot| &self.colliders[slot].1)
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ColliderId, Collider)> {
        self.colliders.iter()
    }

    /// Raw procedural ground, ignoring structures
    pub fn terrain_height(&self, x: f32, z: f32) -> f32 {
        self.terrain.height_at(x, z)
    }

    /// Walkable height at (x, z): the highest structure top above the
    /// terrain there, or the terrain itself.
    pub fn height_at_position(&self, x: f32, z: f32) -> f32 {
        let ground = self.terrain_height(x, z);
        self.colliders
            .iter()
            .filter_map(|(_, collider)| collider.top_at(x, z))
            .fold(ground, f32::max)
    }

    /// First collider overlapping a sphere at `position`.
    pub fn check_collision(&self, position: Vec3, radius: f32) -> Option<CollisionResult> {
        self.colliders
            .iter()
            .find_map(|(id, collider)| self.test_collider(*id, collider, position, radius))
    }

    /// Every collider overlapping the sphere, in registry order
    pub fn contacts(&self, position: Vec3, radius: f32) -> Vec<CollisionResult> {
        self.colliders
            .iter()
            .filter_map(|(id, collider)| self.test_collider(*id, collider, position, radius))
            .collect()
    }

    /// Push `position` out of the contact and strip the inward velocity.
    pub fn resolve_collision(position: &mut Vec3, velocity: &mut Vec3, result: &CollisionResult) {
        *position += result.normal * result.penetration_distance;
        let into_surface = velocity.dot(result.normal);
        if into_surface < 0.0 {
            *velocity -= result.normal * into_surface;
        }
    }

    /// Resolve a sphere against every collider, repeating a bounded number of
    /// passes while contacts still push it.
    pub fn move_sphere(&self, position: Vec3, velocity: Vec3, radius: f32) -> SweepResult {
        let mut position = position;
        let mut velocity = velocity;
        let mut grounded = false;
        let mut contacts = 0;

        for _ in 0..MAX_RESOLVE_ITERATIONS {
            let mut pushed = false;
            for (id, collider) in &self.colliders {
                let Some(hit) = self.test_collider(*id, collider, position, radius) else {
                    continue;
                };
                contacts += 1;
                if hit.normal.y > GROUND_NORMAL_MIN_Y {
                    grounded = true;
                }
                Self::resolve_collision(&mut position, &mut velocity, &hit);
                if hit.penetration_distance > CONTACT_EPSILON {
                    pushed = true;
                }
            }
            if !pushed {
                break;
            }
        }

        SweepResult {
            position,
            velocity,
            grounded,
            contacts,
        }
    }

    fn test_collider(
        &self,
        id: ColliderId,
        collider: &Collider,
        position: Vec3,
        radius: f32,
    ) -> Option<CollisionResult> {
        match *collider {
            Collider::Plane { normal } => {
                let ground = self.terrain_height(position.x, position.z);
                let bottom = position.y - radius;
                (bottom <= ground).then(|| CollisionResult {
                    point: Vec3::new(position.x, ground, position.z),
                    normal: normal.try_normalize().unwrap_or(Vec3::Y),
                    penetration_distance: ground - bottom,
                    collider: id,
                })
            }
            Collider::Box {
                center,
                half_extents,
            } => sphere_vs_box(position, radius, center, half_extents).map(
                |(point, normal, penetration_distance)| CollisionResult {
                    point,
                    normal,
                    penetration_distance,
                    collider: id,
                },
            ),
            Collider::Sphere {
                center,
                radius: obstacle_radius,
            } => {
                let delta = position - center;
                let dist = delta.length();
                let reach = radius + obstacle_radius;
                if dist > reach {
                    return None;
                }
                let normal = if dist > CONTACT_EPSILON {
                    delta / dist
                } else {
                    Vec3::Y
                };
                Some(CollisionResult {
                    point: center + normal * obstacle_radius,
                    normal,
                    penetration_distance: reach - dist,
                    collider: id,
                })
            }
        }
    }
}

impl std::fmt::Debug for CollisionSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionSystem")
            .field("colliders", &self.colliders)
            .finish_non_exhaustive()
    }
}

/// Closest-point test; returns (contact point, normal, penetration).
fn sphere_vs_box(
    position: Vec3,
    radius: f32,
    center: Vec3,
    half_extents: Vec3,
) -> Option<(Vec3, Vec3, f32)> {
    let min = center - half_extents;
    let max = center + half_extents;
    let closest = position.clamp(min, max);
    let delta = position - closest;
    let dist = delta.length();

    if dist > radius {
        return None;
    }

    if dist > CONTACT_EPSILON {
        return Some((closest, delta / dist, radius - dist));
    }

    // Centre inside the box: leave through the face of least overlap
    let local = position - center;
    let overlap = half_extents - local.abs();
    let axis = if overlap.x <= overlap.y && overlap.x <= overlap.z {
        Vec3::X
    } else if overlap.y <= overlap.z {
        Vec3::Y
    } else {
        Vec3::Z
    };
    let side = if local.dot(axis) < 0.0 { -1.0 } else { 1.0 };
    let normal = axis * side;
    let depth = overlap.dot(axis);
    let point = position + normal * depth;
    Some((point, normal, depth + radius))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(height: f32) -> CollisionSystem {
        let mut world = CollisionSystem::new(move |_x: f32, _z: f32| height);
        world.add_collider(ColliderId(0), Collider::ground());
        world
    }

    #[test]
    fn test_empty_registry_uses_terrain() {
        let world = CollisionSystem::new(|x: f32, _z: f32| x * 0.5);
        assert!(world.is_empty());
        assert_eq!(world.height_at_position(4.0, 0.0), 2.0);
        assert!(world.check_collision(Vec3::new(0.0, -100.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn test_plane_touching_has_zero_penetration() {
        let world = flat(2.0);
        let hit = world
            .check_collision(Vec3::new(0.0, 2.5, 0.0), 0.5)
            .expect("touching ground");
        assert_eq!(hit.penetration_distance, 0.0);
        assert_eq!(hit.normal, Vec3::Y);
    }

    #[test]
    fn test_plane_above_ground_no_hit() {
        let world = flat(0.0);
        assert!(world.check_collision(Vec3::new(0.0, 0.6, 0.0), 0.5).is_none());
    }

    #[test]
    fn test_box_side_contact() {
        let mut world = CollisionSystem::new(|_x: f32, _z: f32| -100.0_f32);
        world.add_collider(ColliderId(1), Collider::cuboid(Vec3::ZERO, Vec3::ONE));
        let hit = world
            .check_collision(Vec3::new(1.3, 0.0, 0.0), 0.5)
            .expect("overlapping box face");
        assert_eq!(hit.normal, Vec3::X);
        assert!((hit.penetration_distance - 0.2).abs() < 1e-5);
        assert_eq!(hit.point, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_box_centre_inside_pushes_out_shallowest_face() {
        let mut world = CollisionSystem::new(|_x: f32, _z: f32| -100.0_f32);
        world.add_collider(
            ColliderId(1),
            Collider::cuboid(Vec3::ZERO, Vec3::new(2.0, 2.0, 2.0)),
        );
        let hit = world
            .check_collision(Vec3::new(0.0, 0.0, -1.8), 0.5)
            .expect("inside box");
        assert_eq!(hit.normal, Vec3::NEG_Z);
        assert!((hit.penetration_distance - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_sphere_contact() {
        let mut world = CollisionSystem::new(|_x: f32, _z: f32| -100.0_f32);
        world.add_collider(ColliderId(2), Collider::ball(Vec3::ZERO, 1.0));
        let hit = world
            .check_collision(Vec3::new(0.0, 0.0, 1.25), 0.5)
            .expect("overlap");
        assert_eq!(hit.normal, Vec3::Z);
        assert!((hit.penetration_distance - 0.25).abs() < 1e-5);
        assert!(world.check_collision(Vec3::new(0.0, 0.0, 1.6), 0.5).is_none());
    }

    #[test]
    fn test_first_match_not_deepest() {
        let mut world = CollisionSystem::new(|_x: f32, _z: f32| -100.0_f32);
        world.add_collider(ColliderId(1), Collider::ball(Vec3::new(1.4, 0.0, 0.0), 1.0));
        world.add_collider(ColliderId(2), Collider::ball(Vec3::ZERO, 1.0));
        let hit = world.check_collision(Vec3::ZERO, 0.5).expect("two overlaps");
        assert_eq!(hit.collider, ColliderId(1));
        assert_eq!(world.contacts(Vec3::ZERO, 0.5).len(), 2);
    }

    #[test]
    fn test_duplicate_id_last_write_wins() {
        let mut world = flat(0.0);
        world.add_collider(ColliderId(5), Collider::ball(Vec3::ZERO, 1.0));
        world.add_collider(ColliderId(5), Collider::ball(Vec3::X * 10.0, 2.0));
        assert_eq!(world.len(), 2);
        assert_eq!(
            world.get(ColliderId(5)),
            Some(&Collider::ball(Vec3::X * 10.0, 2.0))
        );
    }

    #[test]
    fn test_remove_keeps_index_consistent() {
        let mut world = flat(0.0);
        world.add_collider(ColliderId(1), Collider::ball(Vec3::X, 1.0));
        world.add_collider(ColliderId(2), Collider::ball(Vec3::Z, 1.0));
        assert!(world.remove_collider(ColliderId(0)).is_some());
        assert!(world.remove_collider(ColliderId(0)).is_none());
        assert_eq!(world.get(ColliderId(2)), Some(&Collider::ball(Vec3::Z, 1.0)));
        assert_eq!(world.get(ColliderId(1)), Some(&Collider::ball(Vec3::X, 1.0)));
        assert_eq!(world.len(), 2);
    }

    #[test]
    fn test_resolve_strips_inward_velocity_only() {
        let hit = CollisionResult {
            point: Vec3::ZERO,
            normal: Vec3::Y,
            penetration_distance: 0.3,
            collider: ColliderId(0),
        };
        let mut pos = Vec3::new(0.0, -0.3, 0.0);
        let mut vel = Vec3::new(2.0, -5.0, 1.0);
        CollisionSystem::resolve_collision(&mut pos, &mut vel, &hit);
        assert!(pos.y.abs() < 1e-6);
        assert_eq!(vel, Vec3::new(2.0, 0.0, 1.0));

        // Moving away keeps its velocity
        let mut vel_out = Vec3::new(0.0, 3.0, 0.0);
        CollisionSystem::resolve_collision(&mut pos, &mut vel_out, &hit);
        assert_eq!(vel_out, Vec3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn test_structure_raises_walkable_height() {
        let mut world = flat(0.0);
        world.add_collider(
            ColliderId(9),
            Collider::cuboid(Vec3::new(10.0, 1.0, 10.0), Vec3::new(2.0, 1.0, 2.0)),
        );
        assert_eq!(world.height_at_position(10.0, 10.0), 2.0);
        assert_eq!(world.height_at_position(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_move_sphere_grounds_and_pushes() {
        let mut world = flat(0.0);
        world.add_collider(ColliderId(1), Collider::cuboid(Vec3::new(2.0, 1.0, 0.0), Vec3::ONE));
        let sweep = world.move_sphere(Vec3::new(0.8, 0.3, 0.0), Vec3::new(5.0, -1.0, 0.0), 0.5);
        assert!(sweep.grounded);
        assert!(sweep.position.y >= 0.5 - 1e-4);
        assert!(sweep.position.x <= 0.5 + 1e-4);
        assert!(sweep.velocity.x <= 0.0);
        assert!(sweep.velocity.y >= 0.0);
    }
}
