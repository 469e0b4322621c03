//! Headless battlefield run.
//!
//! Loads an optional config file (first argument, `.ron` or `.json`), then
//! plays a scripted player at a fixed 60 Hz step until the game ends or the
//! time limit (`SIM_SECONDS`, default 180) runs out.

use anyhow::{Context, Result};
use bevy::prelude::Vec2;
use tracing::info;

use battlefield_core::engine::{GameSummary, SimConfig, Simulation, SimulationObserver, StatsUpdate};
use battlefield_core::logging::{init_tracing, LogLevel, TracingConfig};
use battlefield_core::player::{Action, InputSnapshot};

const STEP: f32 = 1.0 / 60.0;

/// Logs HUD changes as they arrive
#[derive(Default)]
struct HudLog {
    summary: Option<GameSummary>,
}

impl SimulationObserver for HudLog {
    fn on_game_end(&mut self, summary: &GameSummary) {
        self.summary = Some(summary.clone());
    }

    fn on_stats_update(&mut self, update: &StatsUpdate) {
        if let Some(wave) = update.wave {
            info!(wave, "wave changed");
        }
        if let Some(kills) = update.kills {
            info!(kills, score = update.score, "kill confirmed");
        }
    }
}

/// Circle-strafe while sweeping the camera and holding the trigger
fn scripted_input(tick: u64) -> InputSnapshot {
    let mut input = InputSnapshot::new()
        .with(Action::MoveForward)
        .with(Action::StrafeLeft)
        .with(Action::Fire)
        .with_look(Vec2::new(6.0, 0.0));
    if tick % 180 == 0 {
        input = input.with(Action::Jump);
    }
    input
}

fn main() -> Result<()> {
    let level = std::env::var("SIM_LOG")
        .ok()
        .and_then(|s| s.parse::<LogLevel>().ok())
        .unwrap_or(LogLevel::Info);
    init_tracing(&TracingConfig::default().with_level(level));

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load(&path).with_context(|| format!("loading config {path}"))?,
        None => SimConfig::default(),
    };
    let seconds: f32 = std::env::var("SIM_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(180.0);

    let mut sim = Simulation::new(config).context("building simulation")?;
    let mut hud = HudLog::default();
    let max_ticks = (seconds / STEP).ceil() as u64;

    info!(seconds, seed = sim.config().seed, "headless run starting");
    for tick in 0..max_ticks {
        let report = sim.tick(STEP, &scripted_input(tick), &mut hud);
        if report.game_over {
            break;
        }
    }

    let summary = hud.summary.unwrap_or_else(|| sim.summary());
    let stats = sim.stats();
    info!(
        score = summary.score,
        kills = summary.kills,
        waves = summary.waves_dispatched,
        survived_secs = summary.survived_secs,
        health = stats.health,
        ammo = stats.ammo,
        game_over = sim.is_game_over(),
        "run finished"
    );
    Ok(())
}
