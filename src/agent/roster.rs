//! Active-agent collection.
//!
//! Owns every hostile agent and allocates ids. Destroyed agents stay in the
//! collection until `purge_destroyed` runs its filter pass at the end of a tick.

use bevy::prelude::*;
use rand::Rng;
use tracing::debug;

use super::ai::{settle_agent, update_agent, AiContext};
use super::{Agent, AgentId, Archetype, DamageOutcome};
use crate::collision::CollisionSystem;
use crate::combat::projectile::ProjectilePool;

/// Upper bound on agent-vs-agent separation passes per tick
const SEPARATION_PASSES: usize = 4;

#[derive(Debug, Default)]
pub struct AgentRoster {
    agents: Vec<Agent>,
    next_id: u64,
}

impl AgentRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn an agent at `position`, resting on the ground (or at cruising
    /// altitude for flyers).
    pub fn spawn(
        &mut self,
        archetype: Archetype,
        position: Vec3,
        collision: &CollisionSystem,
        rng: &mut impl Rng,
    ) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;

        let mut agent = Agent::new(id, archetype, position, rng);
        let ground = collision.height_at_position(position.x, position.z);
        agent.position.y = match agent.behavior {
            super::Behavior::Flyer(plan) => ground + plan.flying_height,
            super::Behavior::Ground { .. } => ground + archetype.stats().ground_offset,
        };
        debug!(id = id.0, archetype = archetype.name(), x = position.x, z = position.z, "agent spawned");
        self.agents.push(agent);
        id
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.iter_mut()
    }

    /// Total agents held, including destroyed ones awaiting purge
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Agents that are not destroyed
    pub fn active_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_alive()).count()
    }

    /// Damage an agent by id. Unknown ids are ignored.
    pub fn damage_enemy(&mut self, id: AgentId, amount: f32) -> DamageOutcome {
        self.get_mut(id)
            .map_or(DamageOutcome::Ignored, |agent| agent.take_damage(amount))
    }

    /// Run behaviour, movement and attacks for every live agent.
    /// Hostile shots are launched into `projectiles`; returns how many fired.
    pub fn update(
        &mut self,
        ctx: &AiContext<'_>,
        rng: &mut impl Rng,
        projectiles: &mut ProjectilePool,
    ) -> usize {
        let mut fired = 0;
        for agent in self.agents.iter_mut().filter(|a| a.is_alive()) {
            if let Some(shot) = update_agent(agent, ctx, rng) {
                if projectiles.spawn(shot).is_some() {
                    fired += 1;
                }
            }
        }
        self.separate(ctx.collision);
        fired
    }

    /// Push overlapping live agents apart on the ground plane, then settle
    /// every agent that moved against structures and terrain.
    fn separate(&mut self, collision: &CollisionSystem) {
        let mut moved = vec![false; self.agents.len()];

        for _ in 0..SEPARATION_PASSES {
            let mut pushed = false;
            for i in 0..self.agents.len() {
                let (head, tail) = self.agents.split_at_mut(i + 1);
                let a = &mut head[i];
                if !a.is_alive() {
                    continue;
                }
                for (offset, b) in tail.iter_mut().enumerate() {
                    if !b.is_alive() {
                        continue;
                    }
                    let reach = a.stats().radius + b.stats().radius;
                    // Flyers pass over ground agents
                    if (a.position.y - b.position.y).abs() >= reach {
                        continue;
                    }
                    let apart = Vec2::new(b.position.x - a.position.x, b.position.z - a.position.z);
                    let gap = apart.length();
                    if gap >= reach {
                        continue;
                    }
                    // Exactly stacked: split along +X
                    let dir = apart.try_normalize().unwrap_or(Vec2::X);
                    let push = (reach - gap) * 0.5;
                    a.position.x -= dir.x * push;
                    a.position.z -= dir.y * push;
                    b.position.x += dir.x * push;
                    b.position.z += dir.y * push;
                    moved[i] = true;
                    moved[i + 1 + offset] = true;
                    pushed = true;
                }
            }
            if !pushed {
                break;
            }
        }

        for (agent, moved) in self.agents.iter_mut().zip(moved) {
            if moved {
                settle_agent(agent, collision);
            }
        }
    }

    /// Remove destroyed agents, handing them back for presentation teardown
    pub fn purge_destroyed(&mut self) -> Vec<Agent> {
        if self.agents.iter().all(Agent::is_alive) {
            return Vec::new();
        }
        let (alive, dead): (Vec<_>, Vec<_>) = std::mem::take(&mut self.agents)
            .into_iter()
            .partition(Agent::is_alive);
        self.agents = alive;
        dead
    }

    pub fn clear(&mut self) {
        self.agents.clear();
    }
}
