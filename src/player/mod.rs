//! Player character controller.
//!
//! Turns an input snapshot into camera-relative movement, resolves it
//! against the collision system, and fires the player's weapon.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::agent::steering::wrap_angle;
use crate::collision::CollisionSystem;
use crate::combat::projectile::{ProjectileOwner, ProjectileSpec};
use crate::constants::*;

pub mod input;

pub use input::{Action, InputSnapshot};

/// Tunables for movement, vitals and the weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub spawn: Vec3,
    pub radius: f32,
    pub walk_speed: f32,
    pub max_speed: f32,
    /// Exponential rate at which horizontal velocity approaches the wish velocity
    pub acceleration: f32,
    pub jump_impulse: f32,
    pub gravity: f32,
    pub terminal_velocity: f32,
    pub look_sensitivity: f32,
    pub max_health: f32,
    pub max_armor: f32,
    pub start_ammo: u32,
    pub fire_cooldown: f32,
    pub projectile_damage: f32,
    pub projectile_speed: f32,
    pub projectile_range: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            spawn: Vec3::ZERO,
            radius: PLAYER_RADIUS,
            walk_speed: PLAYER_WALK_SPEED,
            max_speed: PLAYER_MAX_SPEED,
            acceleration: PLAYER_ACCELERATION,
            jump_impulse: PLAYER_JUMP_IMPULSE,
            gravity: GRAVITY,
            terminal_velocity: TERMINAL_VELOCITY,
            look_sensitivity: LOOK_SENSITIVITY,
            max_health: PLAYER_MAX_HEALTH,
            max_armor: PLAYER_MAX_ARMOR,
            start_ammo: PLAYER_START_AMMO,
            fire_cooldown: PLAYER_FIRE_COOLDOWN,
            projectile_damage: PLAYER_PROJECTILE_DAMAGE,
            projectile_speed: PLAYER_PROJECTILE_SPEED,
            projectile_range: PLAYER_PROJECTILE_RANGE,
        }
    }
}

/// Health, armor and ammo shown on the HUD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerVitals {
    pub health: f32,
    pub max_health: f32,
    pub armor: f32,
    pub max_armor: f32,
    pub ammo: u32,
}

impl PlayerVitals {
    pub fn from_config(config: &PlayerConfig) -> Self {
        Self {
            health: config.max_health,
            max_health: config.max_health,
            armor: config.max_armor,
            max_armor: config.max_armor,
            ammo: config.start_ammo,
        }
    }

    /// Apply damage, armor first. Returns the health actually lost.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        if amount.is_nan() || amount <= 0.0 || self.is_dead() {
            return 0.0;
        }
        let absorbed = amount.min(self.armor);
        self.armor -= absorbed;
        let before = self.health;
        self.health = (self.health - (amount - absorbed)).max(0.0);
        before - self.health
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }
}

#[derive(Debug, Clone)]
pub struct PlayerController {
    pub position: Vec3,
    pub velocity: Vec3,
    pub grounded: bool,
    /// Camera yaw; 0 looks down -Z
    pub yaw: f32,
    pub pitch: f32,
    pub vitals: PlayerVitals,
    /// Seconds until the weapon can fire again
    pub fire_cooldown: f32,
    pub config: PlayerConfig,
}

impl PlayerController {
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            position: config.spawn,
            velocity: Vec3::ZERO,
            grounded: false,
            yaw: 0.0,
            pitch: 0.0,
            vitals: PlayerVitals::from_config(&config),
            fire_cooldown: 0.0,
            config,
        }
    }

    /// Put the player on the ground at its spawn column
    pub fn place_on_ground(&mut self, collision: &CollisionSystem) {
        let ground = collision.height_at_position(self.position.x, self.position.z);
        self.position.y = ground + self.config.radius;
        self.velocity = Vec3::ZERO;
        self.grounded = true;
    }

    /// Pointer delta → yaw/pitch. Pitch is clamped short of vertical.
    pub fn apply_look(&mut self, delta: Vec2) {
        if !delta.is_finite() {
            return;
        }
        let sens = self.config.look_sensitivity;
        self.yaw = wrap_angle(self.yaw - delta.x * sens);
        self.pitch = (self.pitch - delta.y * sens).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Horizontal forward from yaw only
    pub fn flat_forward(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    pub fn right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    /// Camera look direction including pitch
    pub fn aim_direction(&self) -> Vec3 {
        let (sin_p, cos_p) = self.pitch.sin_cos();
        Vec3::new(
            -self.yaw.sin() * cos_p,
            sin_p,
            -self.yaw.cos() * cos_p,
        )
    }

    /// Advance one tick. Returns a projectile when the weapon fired.
    pub fn update(
        &mut self,
        input: &InputSnapshot,
        dt: f32,
        collision: &CollisionSystem,
    ) -> Option<ProjectileSpec> {
        self.apply_look(input.look_delta);
        self.update_movement(input, dt, collision);
        self.try_fire(input, dt)
    }

    /// Camera-relative walking, jumping and gravity, resolved against colliders
    pub fn update_movement(&mut self, input: &InputSnapshot, dt: f32, collision: &CollisionSystem) {
        let axes = input.move_axes();
        let wish = (self.flat_forward() * axes.y + self.right() * axes.x) * self.config.walk_speed;

        // Smooth horizontal velocity toward the wish velocity
        let blend = 1.0 - (-self.config.acceleration * dt).exp();
        let mut horizontal = Vec2::new(self.velocity.x, self.velocity.z);
        horizontal = horizontal.lerp(Vec2::new(wish.x, wish.z), blend);
        horizontal = horizontal.clamp_length_max(self.config.max_speed);
        self.velocity.x = horizontal.x;
        self.velocity.z = horizontal.y;

        if input.is_pressed(Action::Jump) && self.grounded {
            self.velocity.y = self.config.jump_impulse;
            self.grounded = false;
        }
        if !self.grounded {
            self.velocity.y = (self.velocity.y + self.config.gravity * dt)
                .max(self.config.terminal_velocity);
        }

        let intended = self.position + self.velocity * dt;
        let sweep = collision.move_sphere(intended, self.velocity, self.config.radius);
        self.position = sweep.position;
        self.velocity = sweep.velocity;
        self.grounded = sweep.grounded;

        // Never sink below the ground; stick to it when barely above
        let floor = collision.height_at_position(self.position.x, self.position.z) + self.config.radius;
        let gap = self.position.y - floor;
        if gap < 0.0 || (gap < GROUND_SNAP_DISTANCE && self.velocity.y <= 0.0) {
            self.position.y = floor;
            self.velocity.y = self.velocity.y.max(0.0);
            self.grounded = true;
        }
    }

    /// Fire if the trigger is held, ammo remains and the cooldown elapsed
    pub fn try_fire(&mut self, input: &InputSnapshot, dt: f32) -> Option<ProjectileSpec> {
        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);
        if !input.is_pressed(Action::Fire) || self.fire_cooldown > 0.0 || self.vitals.ammo == 0 {
            return None;
        }
        self.vitals.ammo -= 1;
        self.fire_cooldown = self.config.fire_cooldown;
        Some(ProjectileSpec {
            origin: self.position,
            direction: self.aim_direction(),
            speed: self.config.projectile_speed,
            damage: self.config.projectile_damage,
            max_range: self.config.projectile_range,
            owner: ProjectileOwner::Player,
        })
    }
}

impl Default for PlayerController {
    fn default() -> Self {
        Self::new(PlayerConfig::default())
    }
}
