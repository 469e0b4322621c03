//! Hostile agents.
//!
//! Archetype = fixed stat profile chosen at spawn. Behaviour is a sum type
//! per archetype class: ground agents (scout, warrior, heavy) patrol, chase
//! and attack; flyers retreat, chase and attack around an orbit. Flight-only
//! fields exist only on the flyer variant.

use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::*;

pub mod ai;
pub mod roster;
pub mod steering;

pub use roster::AgentRoster;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u64);

/// Agent archetype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    Scout,   // fast, fragile
    Warrior, // balanced
    Heavy,   // slow, tanky, hits hard
    Flyer,   // airborne, orbits the player
}

/// Base stats fixed by archetype
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArchetypeStats {
    pub max_health: f32,
    pub speed: f32,
    pub attack_damage: f32,
    pub detection_range: f32,
    pub attack_range: f32,
    /// Height of the body centre above the ground (ground archetypes)
    pub ground_offset: f32,
    /// Collision sphere radius; kept below `ground_offset` so walking agents
    /// clear the terrain
    pub radius: f32,
    pub score_value: u32,
}

impl Archetype {
    pub const ALL: [Archetype; 4] = [Self::Scout, Self::Warrior, Self::Heavy, Self::Flyer];

    pub fn stats(&self) -> ArchetypeStats {
        match self {
            Self::Scout => ArchetypeStats {
                max_health: 50.0,
                speed: 8.0,
                attack_damage: 5.0,
                detection_range: 30.0,
                attack_range: 15.0,
                ground_offset: 1.0,
                radius: 0.6,
                score_value: 100,
            },
            Self::Warrior => ArchetypeStats {
                max_health: 100.0,
                speed: 5.0,
                attack_damage: 10.0,
                detection_range: 25.0,
                attack_range: 12.0,
                ground_offset: 1.5,
                radius: 0.9,
                score_value: 200,
            },
            Self::Heavy => ArchetypeStats {
                max_health: 200.0,
                speed: 3.0,
                attack_damage: 20.0,
                detection_range: 20.0,
                attack_range: 10.0,
                ground_offset: 2.0,
                radius: 1.4,
                score_value: 400,
            },
            Self::Flyer => ArchetypeStats {
                max_health: 75.0,
                speed: 6.0,
                attack_damage: 8.0,
                detection_range: 35.0,
                attack_range: 25.0,
                ground_offset: 0.0,
                radius: 1.0,
                score_value: 300,
            },
        }
    }

    pub fn is_flyer(&self) -> bool {
        matches!(self, Self::Flyer)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Scout => "scout",
            Self::Warrior => "warrior",
            Self::Heavy => "heavy",
            Self::Flyer => "flyer",
        }
    }
}

/// Ground archetype states
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroundState {
    #[default]
    Patrol,
    Chase,
    Attack,
}

/// Flyer states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlyerState {
    Retreat,
    Chase,
    Attack,
}

/// Flat view of the active state, for renderers and HUD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorState {
    Patrol,
    Chase,
    Attack,
    Retreat,
}

impl From<GroundState> for BehaviorState {
    fn from(state: GroundState) -> Self {
        match state {
            GroundState::Patrol => Self::Patrol,
            GroundState::Chase => Self::Chase,
            GroundState::Attack => Self::Attack,
        }
    }
}

impl From<FlyerState> for BehaviorState {
    fn from(state: FlyerState) -> Self {
        match state {
            FlyerState::Retreat => Self::Retreat,
            FlyerState::Chase => Self::Chase,
            FlyerState::Attack => Self::Attack,
        }
    }
}

/// Orbit parameters, flyers only
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightPlan {
    pub state: FlyerState,
    pub circle_radius: f32,
    /// Grows monotonically while the flyer lives
    pub circle_angle: f32,
    /// Target altitude above the ground
    pub flying_height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    Ground {
        state: GroundState,
        patrol_target: Vec3,
    },
    Flyer(FlightPlan),
}

/// Result of applying damage
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Unknown or destroyed agent, or a non-positive amount
    Ignored,
    Damaged { remaining: f32 },
    /// This hit took the agent to zero
    Killed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub archetype: Archetype,
    pub health: f32,
    pub max_health: f32,
    pub position: Vec3,
    /// Smoothed movement velocity
    pub velocity: Vec3,
    /// Yaw in radians; 0 faces +Z
    pub facing: f32,
    pub behavior: Behavior,
    /// Simulation time of the last ranged attack
    pub last_attack: Option<f32>,
    pub destroyed: bool,
    /// Remaining damage-flash time
    pub flash_timer: f32,
}

impl Agent {
    /// Fresh agent with full health. `position.y` is adjusted on the first update.
    pub fn new(id: AgentId, archetype: Archetype, position: Vec3, rng: &mut impl Rng) -> Self {
        let stats = archetype.stats();
        let behavior = if archetype.is_flyer() {
            Behavior::Flyer(FlightPlan {
                state: FlyerState::Chase,
                circle_radius: rng.gen_range(FLYER_RADIUS_RANGE.0..=FLYER_RADIUS_RANGE.1),
                circle_angle: rng.gen_range(0.0..TAU),
                flying_height: rng.gen_range(FLYER_HEIGHT_RANGE.0..=FLYER_HEIGHT_RANGE.1),
            })
        } else {
            Behavior::Ground {
                state: GroundState::Patrol,
                patrol_target: random_patrol_point(position, rng),
            }
        };

        Self {
            id,
            archetype,
            health: stats.max_health,
            max_health: stats.max_health,
            position,
            velocity: Vec3::ZERO,
            facing: 0.0,
            behavior,
            last_attack: None,
            destroyed: false,
            flash_timer: 0.0,
        }
    }

    pub fn stats(&self) -> ArchetypeStats {
        self.archetype.stats()
    }

    pub fn state(&self) -> BehaviorState {
        match self.behavior {
            Behavior::Ground { state, .. } => state.into(),
            Behavior::Flyer(plan) => plan.state.into(),
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.destroyed
    }

    /// Recently hit; renderers flash the agent while this holds
    pub fn is_flashing(&self) -> bool {
        self.flash_timer > 0.0
    }

    /// Apply damage. Zero, negative and post-mortem hits change nothing.
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.destroyed || amount.is_nan() || amount <= 0.0 {
            return DamageOutcome::Ignored;
        }
        self.health = (self.health - amount).max(0.0);
        self.flash_timer = DAMAGE_FLASH_SECS;
        if self.health <= 0.0 {
            self.destroyed = true;
            DamageOutcome::Killed
        } else {
            DamageOutcome::Damaged {
                remaining: self.health,
            }
        }
    }

    pub fn tick_flash(&mut self, dt: f32) {
        self.flash_timer = (self.flash_timer - dt).max(0.0);
    }

    /// Whether the attack cooldown has elapsed at time `now`
    pub fn attack_ready(&self, now: f32) -> bool {
        self.last_attack
            .map_or(true, |last| now - last >= ATTACK_COOLDOWN)
    }
}

/// Random point on the ground plane within PATROL_RADIUS of `origin`
pub fn random_patrol_point(origin: Vec3, rng: &mut impl Rng) -> Vec3 {
    let angle = rng.gen_range(0.0..TAU);
    // sqrt keeps the points uniform over the disc
    let dist = PATROL_RADIUS * rng.gen::<f32>().sqrt();
    Vec3::new(
        origin.x + angle.cos() * dist,
        origin.y,
        origin.z + angle.sin() * dist,
    )
}
