//! Centralized game constants for the battlefield core.
//!
//! These are the defaults behind [`crate::engine::SimConfig`]. Per-archetype
//! stats live in [`crate::agent::Archetype`] as the single source of truth.

// =====================================================
// Terrain
// =====================================================

/// Noise octaves as (amplitude, frequency), coarse to fine
pub const TERRAIN_OCTAVES: [(f32, f32); 3] = [(8.0, 0.01), (4.0, 0.02), (2.0, 0.04)];

/// Side length of a crater grid cell in world units
pub const CRATER_CELL_SIZE: f32 = 80.0;

/// Probability that a crater cell holds a crater
pub const CRATER_CHANCE: f32 = 0.3;

/// Bowl radius around the cell centre
pub const CRATER_RADIUS: f32 = 30.0;

/// Maximum bowl depth at the cell centre
pub const CRATER_DEPTH: f32 = 6.0;

// =====================================================
// Collision
// =====================================================

/// Contact normals steeper than this (normal.y) count as standing ground
pub const GROUND_NORMAL_MIN_Y: f32 = 0.7;

/// Upper bound on push-out passes per movement step
pub const MAX_RESOLVE_ITERATIONS: usize = 4;

// =====================================================
// Agent behaviour
// =====================================================

/// Radius around the agent in which a new patrol point is picked
pub const PATROL_RADIUS: f32 = 20.0;

/// Distance at which a patrol point counts as reached
pub const PATROL_ARRIVAL_DISTANCE: f32 = 2.0;

/// Chasing agents give up beyond detection_range * this
pub const CHASE_GIVE_UP_FACTOR: f32 = 1.5;

/// Attacking agents resume the chase beyond attack_range * this
pub const ATTACK_BREAK_FACTOR: f32 = 1.2;

/// Flyers retreat when the player is closer than this
pub const FLYER_RETREAT_DISTANCE: f32 = 10.0;

/// Flyers close in when the player is farther than this
pub const FLYER_CHASE_DISTANCE: f32 = 25.0;

/// Orbit angular speed for flyers (rad/s)
pub const FLYER_ORBIT_SPEED: f32 = 0.5;

/// Flyer orbit radius range
pub const FLYER_RADIUS_RANGE: (f32, f32) = (15.0, 25.0);

/// Flyer altitude range above the ground
pub const FLYER_HEIGHT_RANGE: (f32, f32) = (8.0, 15.0);

/// Remaining distance below which an agent holds position
pub const MOVE_STOP_DISTANCE: f32 = 0.5;

/// Exponential smoothing rate for agent steps
pub const MOVE_SMOOTHING: f32 = 10.0;

/// Facing turn rate (rad/s)
pub const TURN_RATE: f32 = 5.0;

/// Seconds between ranged attacks
pub const ATTACK_COOLDOWN: f32 = 2.0;

/// Damage flash duration after a hit
pub const DAMAGE_FLASH_SECS: f32 = 0.15;

// =====================================================
// Projectiles & Combat
// =====================================================

/// Speed of projectiles fired by agents
pub const ENEMY_PROJECTILE_SPEED: f32 = 30.0;

/// Range of projectiles fired by agents
pub const ENEMY_PROJECTILE_RANGE: f32 = 100.0;

/// Damage of a player projectile
pub const PLAYER_PROJECTILE_DAMAGE: f32 = 25.0;

/// Speed of player projectiles
pub const PLAYER_PROJECTILE_SPEED: f32 = 60.0;

/// Range of player projectiles
pub const PLAYER_PROJECTILE_RANGE: f32 = 150.0;

/// Projectile hit radius, against agents and against the player
pub const PROJECTILE_HIT_RADIUS: f32 = 1.5;

/// Agents closer than this hurt the player
pub const CONTACT_RADIUS: f32 = 2.0;

/// Damage each touching agent deals per tick
pub const CONTACT_DAMAGE_PER_TICK: f32 = 0.2;

// =====================================================
// Player
// =====================================================

pub const PLAYER_RADIUS: f32 = 0.5;
pub const PLAYER_WALK_SPEED: f32 = 10.0;
pub const PLAYER_MAX_SPEED: f32 = 15.0;
pub const PLAYER_ACCELERATION: f32 = 10.0;
pub const PLAYER_JUMP_IMPULSE: f32 = 8.0;
pub const PLAYER_MAX_HEALTH: f32 = 100.0;
pub const PLAYER_MAX_ARMOR: f32 = 50.0;
pub const PLAYER_START_AMMO: u32 = 120;
pub const PLAYER_FIRE_COOLDOWN: f32 = 0.15;
pub const LOOK_SENSITIVITY: f32 = 0.002;

/// Pitch limit (just under straight up/down)
pub const MAX_PITCH: f32 = 89.0 * std::f32::consts::PI / 180.0;

pub const GRAVITY: f32 = -20.0;
pub const TERMINAL_VELOCITY: f32 = -50.0;

/// Gap below which a descending player sticks to the ground
pub const GROUND_SNAP_DISTANCE: f32 = 0.05;

// =====================================================
// Waves
// =====================================================

/// Slack when comparing a scheduled spawn time against the clock
pub const SPAWN_TIME_EPSILON: f32 = 1e-4;

/// Seconds between automatic wave checks
pub const WAVE_AUTO_ADVANCE_SECS: f32 = 30.0;

/// Auto-advance only fires below this many live agents
pub const WAVE_LOW_WATER_MARK: usize = 5;

/// Spawn ring around the player (min, max radius)
pub const SPAWN_RING: (f32, f32) = (40.0, 60.0);

// =====================================================
// Simulation
// =====================================================

/// Largest delta-time accepted per tick
pub const MAX_TICK_DT: f32 = 0.1;

/// Default RNG seed
pub const DEFAULT_SEED: u64 = 42;
