use bevy::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::agent::ai::AiContext;
use crate::agent::{AgentId, AgentRoster, Archetype, BehaviorState, DamageOutcome};
use crate::collision::{Collider, ColliderId, CollisionSystem};
use crate::combat::projectile::{ProjectileId, ProjectilePool};
use crate::combat::{resolve_contact_damage, resolve_hostile_hits, resolve_projectile_hits, CombatReport};
use crate::engine::config::SimConfig;
use crate::error::SimResult;
use crate::logging::TimingSpan;
use crate::player::{InputSnapshot, PlayerController};
use crate::terrain::{HeightField, ProceduralHeightField};
use crate::waves::{PendingSpawn, WaveScheduler};

/// The ground plane is always registered first under this id
pub const GROUND_COLLIDER: ColliderId = ColliderId(0);

/// Hooks for the presentation layer
pub trait SimulationObserver {
    /// Called exactly once, on the tick the game ends
    fn on_game_end(&mut self, _summary: &GameSummary) {}
    /// Called with only the HUD fields that changed this tick
    fn on_stats_update(&mut self, _update: &StatsUpdate) {}
}

impl SimulationObserver for () {}

/// HUD-facing counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    pub wave: usize,
    pub active_agents: usize,
    pub score: u32,
    pub kills: u32,
    pub ammo: u32,
    pub health: f32,
    pub armor: f32,
}

/// Changed fields since the previous notification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsUpdate {
    pub wave: Option<usize>,
    pub active_agents: Option<usize>,
    pub score: Option<u32>,
    pub kills: Option<u32>,
    pub ammo: Option<u32>,
    pub health: Option<f32>,
    pub armor: Option<f32>,
}

impl StatsUpdate {
    pub fn between(old: &GameStats, new: &GameStats) -> Self {
        fn changed<T: PartialEq + Copy>(a: T, b: T) -> Option<T> {
            (a != b).then_some(b)
        }
        Self {
            wave: changed(old.wave, new.wave),
            active_agents: changed(old.active_agents, new.active_agents),
            score: changed(old.score, new.score),
            kills: changed(old.kills, new.kills),
            ammo: changed(old.ammo, new.ammo),
            health: changed(old.health, new.health),
            armor: changed(old.armor, new.armor),
        }
    }

    /// Every field, for the first notification
    pub fn full(stats: &GameStats) -> Self {
        Self {
            wave: Some(stats.wave),
            active_agents: Some(stats.active_agents),
            score: Some(stats.score),
            kills: Some(stats.kills),
            ammo: Some(stats.ammo),
            health: Some(stats.health),
            armor: Some(stats.armor),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub score: u32,
    pub kills: u32,
    pub waves_dispatched: usize,
    pub survived_secs: f32,
    pub ticks: u64,
}

/// What one tick did
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Delta-time actually integrated after sanitising
    pub dt: f32,
    pub spawned: Vec<AgentId>,
    pub purged: Vec<AgentId>,
    pub combat: CombatReport,
    pub player_fired: bool,
    pub agent_shots: usize,
    pub game_over: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub position: Vec3,
    pub velocity: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub grounded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub archetype: Archetype,
    pub position: Vec3,
    pub facing: f32,
    pub state: BehaviorState,
    pub health: f32,
    pub max_health: f32,
    /// Killed but not yet purged; purged ids are listed in `TickReport::purged`
    pub destroyed: bool,
    pub flashing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub id: ProjectileId,
    pub position: Vec3,
    pub hostile: bool,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub elapsed: f32,
    pub player: PlayerSnapshot,
    pub agents: Vec<AgentSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub stats: GameStats,
    pub game_over: bool,
}

/// Owns every container and runs the per-tick order:
/// player → agents → projectiles → combat → purge → waves → hooks.
pub struct Simulation {
    config: SimConfig,
    rng: Xoshiro256PlusPlus,
    collision: CollisionSystem,
    player: PlayerController,
    roster: AgentRoster,
    projectiles: ProjectilePool,
    waves: WaveScheduler,
    score: u32,
    kills: u32,
    /// Last stats reported to an observer; `None` before the first tick
    reported: Option<GameStats>,
    /// Accumulated in f64 so scheduled spawn times stay exact over long runs
    elapsed: f64,
    tick_count: u64,
    game_over: bool,
    game_end_sent: bool,
    next_collider: u64,
}

impl Simulation {
    /// Validated config on the procedural terrain
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        let terrain = ProceduralHeightField::new(config.seed, config.terrain.clone());
        Ok(Self::build(config, terrain))
    }

    /// Validated config on a caller-supplied terrain function
    pub fn with_terrain(
        config: SimConfig,
        terrain: impl HeightField + Send + Sync + 'static,
    ) -> SimResult<Self> {
        config.validate()?;
        Ok(Self::build(config, terrain))
    }

    fn build(config: SimConfig, terrain: impl HeightField + Send + Sync + 'static) -> Self {
        let mut collision = CollisionSystem::new(terrain);
        collision.add_collider(GROUND_COLLIDER, Collider::ground());
        let mut next_collider = GROUND_COLLIDER.0 + 1;
        for structure in &config.structures {
            collision.add_collider(ColliderId(next_collider), *structure);
            next_collider += 1;
        }

        let mut player = PlayerController::new(config.player.clone());
        player.place_on_ground(&collision);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);
        let mut waves = WaveScheduler::new(config.schedule.clone(), config.waves.clone());
        if config.waves.start_first_wave {
            waves.spawn_wave(0.0, None, &mut rng);
        }

        info!(
            seed = config.seed,
            structures = config.structures.len(),
            waves = config.schedule.len(),
            "simulation created"
        );

        let mut sim = Self {
            config,
            rng,
            collision,
            player,
            roster: AgentRoster::new(),
            projectiles: ProjectilePool::new(),
            waves,
            score: 0,
            kills: 0,
            reported: None,
            elapsed: 0.0,
            tick_count: 0,
            game_over: false,
            game_end_sent: false,
            next_collider,
        };
        // Spawns due at t = 0 land before the first tick
        let due = sim.waves.update(0.0, 0.0, 0, &mut sim.rng);
        sim.spawn_due(due);
        sim
    }

    /// Advance one frame. Negative or non-finite `dt` integrates nothing;
    /// large `dt` is clamped. After game over this is a no-op.
    pub fn tick(
        &mut self,
        dt: f32,
        input: &InputSnapshot,
        observer: &mut impl SimulationObserver,
    ) -> TickReport {
        if self.game_over {
            return TickReport {
                game_over: true,
                ..default()
            };
        }
        let _timing = TimingSpan::new("simulation_tick");

        let dt = if dt.is_finite() && dt > 0.0 {
            dt.min(self.config.max_tick_dt)
        } else {
            0.0
        };
        self.elapsed += f64::from(dt);
        self.tick_count += 1;
        let now = self.elapsed();
        let mut report = TickReport {
            dt,
            ..default()
        };

        // 1. Player movement and weapon
        if let Some(shot) = self.player.update(input, dt, &self.collision) {
            report.player_fired = self.projectiles.spawn(shot).is_some();
        }

        // 2. Agents react to the post-movement player position
        let ctx = AiContext {
            dt,
            now,
            player_position: self.player.position,
            collision: &self.collision,
        };
        report.agent_shots = self.roster.update(&ctx, &mut self.rng, &mut self.projectiles);

        // 3. Projectiles fly; range exhaustion discards
        self.projectiles.advance_all(dt);

        // 4. Combat on final positions
        resolve_projectile_hits(
            &mut self.projectiles,
            &mut self.roster,
            &self.config.combat,
            &mut report.combat,
        );
        resolve_hostile_hits(
            &mut self.projectiles,
            self.player.position,
            &mut self.player.vitals,
            &self.config.combat,
            &mut report.combat,
        );
        resolve_contact_damage(
            &self.roster,
            self.player.position,
            &mut self.player.vitals,
            dt,
            &self.config.combat,
            &mut report.combat,
        );
        self.kills += report.combat.kills.len() as u32;
        self.score += report.combat.score_gained();

        // 5. Filter pass after all iteration
        report.purged = self.roster.purge_destroyed().iter().map(|a| a.id).collect();

        // 6. Waves
        let due = self
            .waves
            .update(now, dt, self.roster.active_count(), &mut self.rng);
        report.spawned = self.spawn_due(due);

        // 7. Hooks
        let stats = self.stats();
        let update = match &self.reported {
            Some(previous) => StatsUpdate::between(previous, &stats),
            None => StatsUpdate::full(&stats),
        };
        if !update.is_empty() {
            observer.on_stats_update(&update);
        }
        self.reported = Some(stats);

        if self.player.vitals.is_dead() {
            self.game_over = true;
        }
        if self.game_over && !self.game_end_sent {
            self.game_end_sent = true;
            let summary = self.summary();
            info!(score = summary.score, kills = summary.kills, secs = summary.survived_secs, "game over");
            observer.on_game_end(&summary);
        }
        report.game_over = self.game_over;
        report
    }

    /// Damage an agent directly. Kills are credited like projectile kills.
    pub fn damage_enemy(&mut self, id: AgentId, amount: f32) -> DamageOutcome {
        let outcome = self.roster.damage_enemy(id, amount);
        if outcome == DamageOutcome::Killed {
            let score = self.roster.get(id).map_or(0, |a| a.stats().score_value);
            self.kills += 1;
            self.score += score;
            debug!(agent = id.0, score, "agent killed");
        }
        outcome
    }

    /// Dispatch a wave now; `None` picks the current one
    pub fn spawn_wave(&mut self, wave_index: Option<usize>) -> bool {
        let now = self.elapsed();
        self.waves.spawn_wave(now, wave_index, &mut self.rng)
    }

    /// Place released spawns on the ring around the player
    fn spawn_due(&mut self, due: Vec<PendingSpawn>) -> Vec<AgentId> {
        let mut spawned = Vec::with_capacity(due.len());
        for spawn in due {
            let at = self.waves.spawn_point(self.player.position, &mut self.rng);
            spawned.push(
                self.roster
                    .spawn(spawn.archetype, at, &self.collision, &mut self.rng),
            );
        }
        spawned
    }

    /// Register a static obstacle after the ground and configured structures
    pub fn add_structure(&mut self, collider: Collider) -> ColliderId {
        let id = ColliderId(self.next_collider);
        self.next_collider += 1;
        self.collision.add_collider(id, collider);
        id
    }

    pub fn remove_structure(&mut self, id: ColliderId) -> Option<Collider> {
        if id == GROUND_COLLIDER {
            return None;
        }
        self.collision.remove_collider(id)
    }

    pub fn stats(&self) -> GameStats {
        GameStats {
            wave: self.waves.current_wave_number(),
            active_agents: self.roster.active_count(),
            score: self.score,
            kills: self.kills,
            ammo: self.player.vitals.ammo,
            health: self.player.vitals.health,
            armor: self.player.vitals.armor,
        }
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            score: self.score,
            kills: self.kills,
            waves_dispatched: self.waves.current_wave_number(),
            survived_secs: self.elapsed(),
            ticks: self.tick_count,
        }
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick_count,
            elapsed: self.elapsed(),
            player: PlayerSnapshot {
                position: self.player.position,
                velocity: self.player.velocity,
                yaw: self.player.yaw,
                pitch: self.player.pitch,
                grounded: self.player.grounded,
            },
            agents: self
                .roster
                .iter()
                .map(|a| AgentSnapshot {
                    id: a.id,
                    archetype: a.archetype,
                    position: a.position,
                    facing: a.facing,
                    state: a.state(),
                    health: a.health,
                    max_health: a.max_health,
                    destroyed: a.destroyed,
                    flashing: a.is_flashing(),
                })
                .collect(),
            projectiles: self
                .projectiles
                .iter()
                .map(|p| ProjectileSnapshot {
                    id: p.id,
                    position: p.position,
                    hostile: !p.fired_by_player(),
                })
                .collect(),
            stats: self.stats(),
            game_over: self.game_over,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut PlayerController {
        &mut self.player
    }

    pub fn agents(&self) -> &AgentRoster {
        &self.roster
    }

    pub fn agents_mut(&mut self) -> &mut AgentRoster {
        &mut self.roster
    }

    pub fn projectiles(&self) -> &ProjectilePool {
        &self.projectiles
    }

    pub fn waves(&self) -> &WaveScheduler {
        &self.waves
    }

    pub fn collision(&self) -> &CollisionSystem {
        &self.collision
    }

    /// Spawn an agent at (x, z) outside the wave schedule
    pub fn spawn_agent(&mut self, archetype: Archetype, x: f32, z: f32) -> AgentId {
        self.roster
            .spawn(archetype, Vec3::new(x, 0.0, z), &self.collision, &mut self.rng)
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed as f32
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }
}

impl Default for Simulation {
    fn default() -> Self {
        let config = SimConfig::default();
        let terrain = ProceduralHeightField::new(config.seed, config.terrain.clone());
        Self::build(config, terrain)
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick_count", &self.tick_count)
            .field("elapsed", &self.elapsed)
            .field("agents", &self.roster.len())
            .field("projectiles", &self.projectiles.len())
            .field("game_over", &self.game_over)
            .finish_non_exhaustive()
    }
}
