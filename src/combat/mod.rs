//! Combat resolution.
//!
//! Runs once per tick after all movement. Player projectiles are tested
//! against every live agent, agent projectiles against the player, and
//! agents close to the player deal contact damage. All of it is brute-force
//! loops; a battlefield holds tens of agents.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::agent::{AgentId, AgentRoster, DamageOutcome};
use crate::constants::*;
use crate::player::PlayerVitals;

pub mod projectile;

use projectile::ProjectilePool;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Projectile-to-target distance that counts as a hit
    pub hit_radius: f32,
    /// Agent-to-player distance at which contact damage applies
    pub contact_radius: f32,
    /// Fixed damage per touching agent per tick, independent of dt
    pub contact_damage_per_tick: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            hit_radius: PROJECTILE_HIT_RADIUS,
            contact_radius: CONTACT_RADIUS,
            contact_damage_per_tick: CONTACT_DAMAGE_PER_TICK,
        }
    }
}

/// A kill credited this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kill {
    pub agent: AgentId,
    pub score: u32,
}

/// What happened during one resolution pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombatReport {
    pub hits: u32,
    pub kills: Vec<Kill>,
    /// Agent projectiles that struck the player
    pub player_hits: u32,
    /// Health the player lost, after armor
    pub player_damage: f32,
    /// Player health reached zero during this pass
    pub player_killed: bool,
}

impl CombatReport {
    pub fn score_gained(&self) -> u32 {
        self.kills.iter().map(|k| k.score).sum()
    }
}

/// Player projectiles vs live agents. Each projectile hits at most one
/// agent and is consumed by the hit.
pub fn resolve_projectile_hits(
    projectiles: &mut ProjectilePool,
    roster: &mut AgentRoster,
    config: &CombatConfig,
    report: &mut CombatReport,
) {
    let mut spent = Vec::new();

    for shot in projectiles.iter().filter(|p| p.fired_by_player()) {
        let target = roster
            .iter()
            .filter(|a| a.is_alive())
            .find(|a| shot.sweep_distance(a.position) < config.hit_radius)
            .map(|a| a.id);
        let Some(id) = target else {
            continue;
        };

        spent.push(shot.id);
        report.hits += 1;
        match roster.damage_enemy(id, shot.damage) {
            DamageOutcome::Killed => {
                let score = roster.get(id).map_or(0, |a| a.stats().score_value);
                debug!(agent = id.0, score, "agent killed");
                report.kills.push(Kill { agent: id, score });
            }
            DamageOutcome::Damaged { remaining } => {
                debug!(agent = id.0, remaining, "agent hit");
            }
            DamageOutcome::Ignored => {}
        }
    }

    projectiles.remove_all(&spent);
}

/// Agent projectiles vs the player. A hit applies the shot's damage
/// (armor first) and consumes the projectile.
pub fn resolve_hostile_hits(
    projectiles: &mut ProjectilePool,
    player_position: Vec3,
    vitals: &mut PlayerVitals,
    config: &CombatConfig,
    report: &mut CombatReport,
) {
    if vitals.is_dead() {
        return;
    }
    let mut spent = Vec::new();

    for shot in projectiles.iter().filter(|p| !p.fired_by_player()) {
        if shot.sweep_distance(player_position) >= config.hit_radius {
            continue;
        }
        spent.push(shot.id);
        report.player_hits += 1;
        report.player_damage += vitals.take_damage(shot.damage);
        debug!(damage = shot.damage, health = vitals.health, armor = vitals.armor, "player hit");
        if vitals.is_dead() {
            info!("player shot down");
            report.player_killed = true;
            break;
        }
    }

    projectiles.remove_all(&spent);
}

/// Every agent within contact range deals a fixed amount each tick.
/// A zero-length tick (paused or sanitised dt) deals nothing.
pub fn resolve_contact_damage(
    roster: &AgentRoster,
    player_position: Vec3,
    vitals: &mut PlayerVitals,
    dt: f32,
    config: &CombatConfig,
    report: &mut CombatReport,
) {
    if vitals.is_dead() || dt <= 0.0 {
        return;
    }
    let touching = roster
        .iter()
        .filter(|a| a.is_alive() && a.position.distance(player_position) < config.contact_radius)
        .count();
    if touching == 0 {
        return;
    }

    let amount = config.contact_damage_per_tick * touching as f32;
    report.player_damage += vitals.take_damage(amount);
    if vitals.is_dead() {
        info!(touching, "player overrun");
        report.player_killed = true;
    }
}
