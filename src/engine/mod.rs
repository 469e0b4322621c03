//! Simulation engine: integration layer
//!
//! Ties the subsystems together behind one owned aggregate:
//!
//!   host input ──► Simulation::tick(dt) ──► snapshot / stats hooks ──► host renderer/HUD
//!
//! Modules:
//!   config     : serializable startup configuration (RON / JSON)
//!   simulation : the `Simulation` aggregate and the fixed per-tick order
//!   plugin     : bevy wrapper ticking the simulation from `Time`

pub mod config;
pub mod plugin;
pub mod simulation;

pub use config::SimConfig;
pub use plugin::{GameEndEvent, SimulationPlugin, SimulationResource, StatsUpdateEvent};
pub use simulation::{
    GameStats, GameSummary, Simulation, SimulationObserver, StatsUpdate, TickReport, WorldSnapshot,
    GROUND_COLLIDER,
};

// =====================================================
// Tests
// =====================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Archetype;
    use crate::collision::Collider;
    use crate::player::{Action, InputSnapshot};
    use bevy::prelude::Vec3;

    #[derive(Default)]
    struct Recorder {
        ends: Vec<GameSummary>,
        updates: Vec<StatsUpdate>,
    }

    impl SimulationObserver for Recorder {
        fn on_game_end(&mut self, summary: &GameSummary) {
            self.ends.push(summary.clone());
        }

        fn on_stats_update(&mut self, update: &StatsUpdate) {
            self.updates.push(update.clone());
        }
    }

    fn quiet_config() -> SimConfig {
        let mut config = SimConfig::default();
        config.waves.start_first_wave = false;
        config
    }

    fn flat_sim() -> Simulation {
        Simulation::with_terrain(quiet_config(), |_x: f32, _z: f32| 0.0_f32).expect("valid config")
    }

    #[test]
    fn test_engine_creation() {
        let sim = Simulation::default();
        assert_eq!(sim.config().seed, 42);
        assert_eq!(sim.tick_count(), 0);
        assert!(!sim.is_game_over());
        // First wave is dispatched at startup
        assert_eq!(sim.waves().current_wave_number(), 1);
    }

    #[test]
    fn test_engine_tick() {
        let mut sim = flat_sim();
        sim.tick(1.0 / 60.0, &InputSnapshot::new(), &mut ());
        assert_eq!(sim.tick_count(), 1);
        sim.tick(1.0 / 60.0, &InputSnapshot::new(), &mut ());
        assert_eq!(sim.tick_count(), 2);
        assert!((sim.elapsed() - 2.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_dt_sanitised() {
        let mut sim = flat_sim();
        assert_eq!(sim.tick(-1.0, &InputSnapshot::new(), &mut ()).dt, 0.0);
        assert_eq!(sim.tick(f32::NAN, &InputSnapshot::new(), &mut ()).dt, 0.0);
        assert_eq!(sim.tick(5.0, &InputSnapshot::new(), &mut ()).dt, 0.1);
    }

    #[test]
    fn test_first_tick_reports_everything_then_only_changes() {
        let mut sim = flat_sim();
        let mut recorder = Recorder::default();
        sim.tick(0.016, &InputSnapshot::new(), &mut recorder);
        assert_eq!(recorder.updates.len(), 1);
        assert!(recorder.updates[0].health.is_some());

        sim.tick(0.016, &InputSnapshot::new(), &mut recorder);
        assert_eq!(recorder.updates.len(), 1);

        sim.tick(0.016, &InputSnapshot::new().with(Action::Fire), &mut recorder);
        let last = recorder.updates.last().expect("ammo update");
        assert_eq!(last.ammo, Some(crate::constants::PLAYER_START_AMMO - 1));
        assert_eq!(last.health, None);
    }

    #[test]
    fn test_game_end_fires_once() {
        let mut sim = flat_sim();
        let at = sim.player().position;
        sim.spawn_agent(Archetype::Heavy, at.x + 0.5, at.z);
        sim.player_mut().vitals.health = 0.2;
        sim.player_mut().vitals.armor = 0.0;

        let mut recorder = Recorder::default();
        for _ in 0..20 {
            sim.tick(0.1, &InputSnapshot::new(), &mut recorder);
        }
        assert!(sim.is_game_over());
        assert_eq!(recorder.ends.len(), 1);
        let ticks = sim.tick_count();
        sim.tick(0.1, &InputSnapshot::new(), &mut recorder);
        assert_eq!(sim.tick_count(), ticks);
    }

    #[test]
    fn test_warrior_fire_ends_the_game() {
        let mut sim = flat_sim();
        let at = sim.player().position;
        sim.spawn_agent(Archetype::Warrior, at.x + 8.0, at.z);

        let mut recorder = Recorder::default();
        let mut first_hit = None;
        for tick in 0..3600 {
            let report = sim.tick(1.0 / 60.0, &InputSnapshot::new(), &mut recorder);
            if first_hit.is_none() && report.combat.player_hits > 0 {
                first_hit = Some(tick);
            }
            if report.game_over {
                break;
            }
        }

        // First shot lands within half a second; 150 points of health and
        // armor go down in fifteen 10-damage shots
        assert!(first_hit.is_some_and(|t| t < 30), "first hit at {first_hit:?}");
        assert!(sim.is_game_over());
        assert_eq!(sim.player().vitals.health, 0.0);
        assert_eq!(recorder.ends.len(), 1);
        assert!(recorder.updates.iter().any(|u| u.armor.is_some()));
        assert!(sim.elapsed() > 25.0);
    }

    #[test]
    fn test_snapshot_flags_destroyed_until_purged() {
        let mut sim = flat_sim();
        let id = sim.spawn_agent(Archetype::Scout, 30.0, -30.0);
        sim.damage_enemy(id, 500.0);
        let snapshot = sim.snapshot();
        assert!(snapshot.agents.iter().any(|a| a.id == id && a.destroyed));

        let report = sim.tick(1.0 / 60.0, &InputSnapshot::new(), &mut ());
        assert_eq!(report.purged, vec![id]);
        assert!(sim.snapshot().agents.is_empty());
    }

    #[test]
    fn test_damage_enemy_credits_kill() {
        let mut sim = flat_sim();
        let id = sim.spawn_agent(Archetype::Warrior, 30.0, 30.0);
        sim.damage_enemy(id, 0.0);
        assert_eq!(sim.stats().kills, 0);
        sim.damage_enemy(id, 150.0);
        sim.damage_enemy(id, 150.0);
        let stats = sim.stats();
        assert_eq!(stats.kills, 1);
        assert_eq!(stats.score, 200);
        assert_eq!(stats.active_agents, 0);
    }

    #[test]
    fn test_structures_registered_after_ground() {
        let mut config = quiet_config();
        config
            .structures
            .push(Collider::cuboid(Vec3::new(10.0, 2.0, 10.0), Vec3::splat(2.0)));
        let mut sim = Simulation::with_terrain(config, |_x: f32, _z: f32| 0.0_f32).expect("valid");
        let ids: Vec<_> = sim.collision().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids[0], GROUND_COLLIDER);
        assert_eq!(ids.len(), 2);
        assert!((sim.collision().height_at_position(10.0, 10.0) - 4.0).abs() < f32::EPSILON);

        assert!(sim.remove_structure(GROUND_COLLIDER).is_none());
        let added = sim.add_structure(Collider::ball(Vec3::ZERO, 1.0));
        assert!(sim.remove_structure(added).is_some());
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut sim = Simulation::default();
        for _ in 0..10 {
            sim.tick(0.05, &InputSnapshot::new(), &mut ());
        }
        let snapshot = sim.snapshot();
        assert_eq!(snapshot.tick, 10);
        let json = serde_json::to_string(&snapshot).expect("serializes");
        let back: WorldSnapshot = serde_json::from_str(&json).expect("parses");
        assert_eq!(back.agents.len(), snapshot.agents.len());
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = || {
            let mut sim = Simulation::default();
            let input = InputSnapshot::new().with(Action::MoveForward).with(Action::Fire);
            for _ in 0..200 {
                sim.tick(1.0 / 30.0, &input, &mut ());
            }
            sim.snapshot()
        };
        assert_eq!(run(), run());
    }
}
