//! Per-tick input snapshot.
//!
//! The host maps its physical keys and pointer onto these actions; the core
//! never sees key codes.

use std::collections::HashSet;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Player actions (input abstraction layer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    MoveForward,
    MoveBackward,
    StrafeLeft,
    StrafeRight,
    Jump,
    Fire,
}

/// Everything the controller reads in one tick
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub pressed: HashSet<Action>,
    /// Raw pointer delta: x turns (yaw), y looks up/down (pitch)
    pub look_delta: Vec2,
}

impl InputSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, action: Action) -> Self {
        self.pressed.insert(action);
        self
    }

    pub fn with_look(mut self, delta: Vec2) -> Self {
        self.look_delta = delta;
        self
    }

    pub fn is_pressed(&self, action: Action) -> bool {
        self.pressed.contains(&action)
    }

    /// Movement axes in camera space: x = strafe right, y = forward.
    /// Normalized so diagonals are not faster.
    pub fn move_axes(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.is_pressed(Action::MoveForward) {
            dir.y += 1.0;
        }
        if self.is_pressed(Action::MoveBackward) {
            dir.y -= 1.0;
        }
        if self.is_pressed(Action::StrafeRight) {
            dir.x += 1.0;
        }
        if self.is_pressed(Action::StrafeLeft) {
            dir.x -= 1.0;
        }
        dir.normalize_or_zero()
    }
}
