//! Battlefield Simulation Core
//!
//! Deterministic game logic for a wave-based arena shooter:
//! - Procedural height field (noise octaves + craters)
//! - Static collision world (plane / box / sphere) with push-out response
//! - Enemy agents with distance-driven behaviour state machines
//! - Wave scheduling with time-based pacing
//! - First-person player controller
//! - Projectile and contact combat resolution
//! - Single-threaded tick loop with HUD hooks and a bevy plugin wrapper
//!
//! Rendering, audio, menus and input devices live in the host application.

pub mod agent;
pub mod collision;
pub mod combat;
pub mod constants;
pub mod engine;
pub mod error;
pub mod logging;
pub mod player;
pub mod terrain;
pub mod waves;

pub use engine::{SimConfig, Simulation, SimulationObserver, SimulationPlugin};
pub use error::{SimError, SimResult};
