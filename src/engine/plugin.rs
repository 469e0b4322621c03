use bevy::prelude::*;
use std::sync::{Arc, RwLock};
use tracing::warn;

use crate::engine::config::SimConfig;
use crate::engine::simulation::{GameSummary, Simulation, SimulationObserver, StatsUpdate};
use crate::player::InputSnapshot;

/// Runs the simulation from bevy's `Update` schedule.
///
/// The host writes the `InputSnapshot` resource each frame and listens for
/// `GameEndEvent` / `StatsUpdateEvent`.
#[derive(Default)]
pub struct SimulationPlugin {
    pub config: SimConfig,
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let simulation = Simulation::new(self.config.clone()).unwrap_or_else(|err| {
            warn!(%err, "invalid simulation config, falling back to defaults");
            Simulation::default()
        });

        app.insert_resource(SimulationResource(Arc::new(RwLock::new(simulation))))
            .init_resource::<InputSnapshot>()
            .add_event::<GameEndEvent>()
            .add_event::<StatsUpdateEvent>()
            .add_systems(Update, simulation_tick_system);
    }
}

#[derive(Resource, Clone)]
pub struct SimulationResource(pub Arc<RwLock<Simulation>>);

#[derive(Event, Debug, Clone)]
pub struct GameEndEvent(pub GameSummary);

#[derive(Event, Debug, Clone)]
pub struct StatsUpdateEvent(pub StatsUpdate);

/// Collects hook calls during a tick so they can be sent as events after
/// the simulation lock is released
#[derive(Default)]
struct EventSink {
    game_end: Option<GameSummary>,
    updates: Vec<StatsUpdate>,
}

impl SimulationObserver for EventSink {
    fn on_game_end(&mut self, summary: &GameSummary) {
        self.game_end = Some(summary.clone());
    }

    fn on_stats_update(&mut self, update: &StatsUpdate) {
        self.updates.push(update.clone());
    }
}

fn simulation_tick_system(
    time: Res<Time>,
    input: Res<InputSnapshot>,
    sim_res: Res<SimulationResource>,
    mut game_end: EventWriter<GameEndEvent>,
    mut stats: EventWriter<StatsUpdateEvent>,
) {
    let mut sink = EventSink::default();
    if let Ok(mut sim) = sim_res.0.write() {
        sim.tick(time.delta_secs(), &input, &mut sink);
    }
    for update in sink.updates {
        stats.send(StatsUpdateEvent(update));
    }
    if let Some(summary) = sink.game_end {
        game_end.send(GameEndEvent(summary));
    }
}
