//! Wave scheduler.
//!
//! A wave is dispatched by queueing its spawns at `now + i * spawn_delay`.
//! Dispatch marks the wave completed and advances the pointer right away;
//! "completed" means "sent", not "cleared". A pacing timer dispatches the
//! next wave every 30 s while fewer than five agents are alive.

use std::collections::VecDeque;
use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::agent::Archetype;
use crate::constants::*;
use crate::error::{SimError, SimResult};

/// One authored wave
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveDefinition {
    pub enemy_count: u32,
    /// Archetypes drawn uniformly per spawn
    pub archetypes: Vec<Archetype>,
    /// Seconds between consecutive spawns
    pub spawn_delay: f32,
    #[serde(default)]
    pub completed: bool,
}

impl WaveDefinition {
    pub fn new(enemy_count: u32, archetypes: &[Archetype], spawn_delay: f32) -> Self {
        Self {
            enemy_count,
            archetypes: archetypes.to_vec(),
            spawn_delay,
            completed: false,
        }
    }
}

/// A spawn queued for a future tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingSpawn {
    /// Zero-based index of the wave that queued it
    pub wave: usize,
    pub archetype: Archetype,
    pub spawn_at: f32,
}

/// Pacing and placement tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    pub auto_advance_secs: f32,
    pub low_water_mark: usize,
    pub spawn_ring_min: f32,
    pub spawn_ring_max: f32,
    /// Dispatch the first wave when the simulation starts
    pub start_first_wave: bool,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            auto_advance_secs: WAVE_AUTO_ADVANCE_SECS,
            low_water_mark: WAVE_LOW_WATER_MARK,
            spawn_ring_min: SPAWN_RING.0,
            spawn_ring_max: SPAWN_RING.1,
            start_first_wave: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WaveScheduler {
    waves: Vec<WaveDefinition>,
    /// Next wave to dispatch
    current: usize,
    queue: VecDeque<PendingSpawn>,
    /// Time accumulated toward the next auto-advance check
    auto_timer: f32,
    config: WaveConfig,
}

impl WaveScheduler {
    pub fn new(waves: Vec<WaveDefinition>, config: WaveConfig) -> Self {
        // Skip past anything authored as already dispatched
        let current = waves.iter().position(|w| !w.completed).unwrap_or(waves.len());
        Self {
            waves,
            current,
            queue: VecDeque::new(),
            auto_timer: 0.0,
            config,
        }
    }

    /// Five escalating waves
    pub fn default_campaign() -> Vec<WaveDefinition> {
        use Archetype::*;
        vec![
            WaveDefinition::new(5, &[Scout], 2.0),
            WaveDefinition::new(8, &[Scout, Warrior], 1.5),
            WaveDefinition::new(10, &[Scout, Warrior, Flyer], 1.5),
            WaveDefinition::new(12, &[Warrior, Heavy, Flyer], 1.2),
            WaveDefinition::new(15, &[Scout, Warrior, Heavy, Flyer], 1.0),
        ]
    }

    /// Parse a RON list of wave definitions
    pub fn waves_from_ron_str(source: &str) -> SimResult<Vec<WaveDefinition>> {
        let waves: Vec<WaveDefinition> = ron::from_str(source)?;
        for (i, wave) in waves.iter().enumerate() {
            validate_wave(i, wave)?;
        }
        Ok(waves)
    }

    pub fn waves(&self) -> &[WaveDefinition] {
        &self.waves
    }

    pub fn config(&self) -> &WaveConfig {
        &self.config
    }

    /// Zero-based index of the next wave to dispatch
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Number of waves dispatched so far (what the HUD shows)
    pub fn current_wave_number(&self) -> usize {
        self.waves.iter().filter(|w| w.completed).count()
    }

    pub fn waves_remaining(&self) -> usize {
        self.waves.iter().filter(|w| !w.completed).count()
    }

    pub fn all_dispatched(&self) -> bool {
        self.waves_remaining() == 0
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingSpawn> {
        self.queue.iter()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Dispatch a wave: `None` means the current pointer. Missing or
    /// already-completed waves are a silent no-op. Returns whether anything
    /// was queued.
    pub fn spawn_wave(&mut self, now: f32, wave_index: Option<usize>, rng: &mut impl Rng) -> bool {
        let index = wave_index.unwrap_or(self.current);
        let Some(wave) = self.waves.get_mut(index) else {
            return false;
        };
        if wave.completed {
            return false;
        }

        for i in 0..wave.enemy_count {
            let Some(&archetype) = wave.archetypes.choose(rng) else {
                break;
            };
            self.queue.push_back(PendingSpawn {
                wave: index,
                archetype,
                spawn_at: now + i as f32 * wave.spawn_delay,
            });
        }
        wave.completed = true;
        info!(wave = index + 1, enemies = wave.enemy_count, "wave dispatched");

        // Pointer moves to the next wave not yet sent
        if index >= self.current {
            self.current = self.waves[index + 1..]
                .iter()
                .position(|w| !w.completed)
                .map_or(self.waves.len(), |offset| index + 1 + offset);
        }
        // Out-of-order dispatch may leave the queue unsorted
        self.queue
            .make_contiguous()
            .sort_by(|a, b| a.spawn_at.total_cmp(&b.spawn_at));
        true
    }

    /// Advance pacing and release every spawn due at `now`, in schedule order
    pub fn update(&mut self, now: f32, dt: f32, active_agents: usize, rng: &mut impl Rng) -> Vec<PendingSpawn> {
        self.auto_timer += dt;
        if self.auto_timer >= self.config.auto_advance_secs {
            self.auto_timer -= self.config.auto_advance_secs;
            if active_agents < self.config.low_water_mark && !self.all_dispatched() {
                debug!(active_agents, "auto-advancing wave");
                self.spawn_wave(now, None, rng);
            }
        }

        let mut due = Vec::new();
        while let Some(next) = self.queue.front() {
            if next.spawn_at > now + SPAWN_TIME_EPSILON {
                break;
            }
            if let Some(spawn) = self.queue.pop_front() {
                due.push(spawn);
            }
        }
        due
    }

    /// Random point on the spawn ring around `center` (height left at center.y)
    pub fn spawn_point(&self, center: Vec3, rng: &mut impl Rng) -> Vec3 {
        let angle = rng.gen_range(0.0..TAU);
        let (min, max) = (self.config.spawn_ring_min, self.config.spawn_ring_max);
        let radius = if max > min { rng.gen_range(min..=max) } else { min };
        Vec3::new(
            center.x + angle.cos() * radius,
            center.y,
            center.z + angle.sin() * radius,
        )
    }

    /// Drop queued spawns and restart the pacing timer
    pub fn reset_timers(&mut self) {
        self.queue.clear();
        self.auto_timer = 0.0;
    }
}

impl Default for WaveScheduler {
    fn default() -> Self {
        Self::new(Self::default_campaign(), WaveConfig::default())
    }
}

pub(crate) fn validate_wave(index: usize, wave: &WaveDefinition) -> SimResult<()> {
    if wave.archetypes.is_empty() && wave.enemy_count > 0 {
        return Err(SimError::Invalid(format!("wave {} has an empty archetype pool", index + 1)));
    }
    if !wave.spawn_delay.is_finite() || wave.spawn_delay < 0.0 {
        return Err(SimError::Invalid(format!(
            "wave {} spawn delay must be a non-negative number",
            index + 1
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn rng() -> Xoshiro256PlusPlus {
        Xoshiro256PlusPlus::seed_from_u64(11)
    }

    fn scheduler(waves: Vec<WaveDefinition>) -> WaveScheduler {
        WaveScheduler::new(waves, WaveConfig::default())
    }

    #[test]
    fn test_dispatch_completes_immediately() {
        let mut rng = rng();
        let mut waves = scheduler(vec![WaveDefinition::new(3, &[Archetype::Scout], 1.0)]);
        assert!(waves.spawn_wave(0.0, None, &mut rng));
        assert!(waves.waves()[0].completed);
        assert_eq!(waves.current_index(), 1);
        assert_eq!(waves.pending_count(), 3);
        let times: Vec<f32> = waves.pending().map(|p| p.spawn_at).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_release_in_schedule_order() {
        let mut rng = rng();
        let mut waves = scheduler(vec![WaveDefinition::new(3, &[Archetype::Scout], 1.0)]);
        waves.spawn_wave(0.0, None, &mut rng);
        assert_eq!(waves.update(0.0, 0.0, 0, &mut rng).len(), 1);
        assert!(waves.update(0.5, 0.5, 1, &mut rng).is_empty());
        assert_eq!(waves.update(1.0, 0.5, 1, &mut rng).len(), 1);
        assert_eq!(waves.update(2.0, 1.0, 2, &mut rng).len(), 1);
        assert_eq!(waves.pending_count(), 0);
    }

    #[test]
    fn test_release_tolerates_clock_rounding() {
        let mut rng = rng();
        let mut waves = scheduler(vec![WaveDefinition::new(2, &[Archetype::Scout], 1.0)]);
        waves.spawn_wave(0.0, None, &mut rng);
        waves.update(0.0, 0.0, 0, &mut rng);
        // A frame clock that lands a hair short of the scheduled second
        assert_eq!(waves.update(1.0 - 5e-5, 1.0 / 60.0, 1, &mut rng).len(), 1);
        assert!(waves.update(1.5, 0.5, 1, &mut rng).is_empty());
    }

    #[test]
    fn test_completed_or_missing_wave_is_noop() {
        let mut rng = rng();
        let mut waves = scheduler(vec![WaveDefinition::new(2, &[Archetype::Warrior], 1.0)]);
        assert!(waves.spawn_wave(0.0, Some(0), &mut rng));
        assert!(!waves.spawn_wave(0.0, Some(0), &mut rng));
        assert!(!waves.spawn_wave(0.0, Some(7), &mut rng));
        assert!(!waves.spawn_wave(0.0, None, &mut rng));
        assert_eq!(waves.pending_count(), 2);
    }

    #[test]
    fn test_explicit_index_skips_pointer_past_sent_waves() {
        let mut rng = rng();
        let mut waves = scheduler(WaveScheduler::default_campaign());
        waves.spawn_wave(0.0, Some(1), &mut rng);
        // Pointer still on wave 0; after sending it, it jumps over wave 1
        assert_eq!(waves.current_index(), 0);
        waves.spawn_wave(0.0, None, &mut rng);
        assert_eq!(waves.current_index(), 2);
        assert_eq!(waves.current_wave_number(), 2);
    }

    #[test]
    fn test_archetypes_drawn_from_pool() {
        let mut rng = rng();
        let pool = [Archetype::Warrior, Archetype::Heavy];
        let mut waves = scheduler(vec![WaveDefinition::new(40, &pool, 0.1)]);
        waves.spawn_wave(0.0, None, &mut rng);
        assert!(waves.pending().all(|p| pool.contains(&p.archetype)));
    }

    #[test]
    fn test_auto_advance_below_low_water_mark() {
        let mut rng = rng();
        let mut waves = scheduler(WaveScheduler::default_campaign());
        waves.spawn_wave(0.0, None, &mut rng);
        let mut now = 0.0;
        for _ in 0..299 {
            now += 0.1;
            waves.update(now, 0.1, 2, &mut rng);
        }
        assert_eq!(waves.current_wave_number(), 1);
        now += 0.2;
        waves.update(now, 0.2, 2, &mut rng);
        assert_eq!(waves.current_wave_number(), 2);
    }

    #[test]
    fn test_no_auto_advance_under_pressure() {
        let mut rng = rng();
        let mut waves = scheduler(WaveScheduler::default_campaign());
        waves.spawn_wave(0.0, None, &mut rng);
        waves.update(31.0, 31.0, 5, &mut rng);
        assert_eq!(waves.current_wave_number(), 1);
    }

    #[test]
    fn test_no_auto_advance_when_exhausted() {
        let mut rng = rng();
        let mut waves = scheduler(vec![WaveDefinition::new(1, &[Archetype::Scout], 0.0)]);
        waves.spawn_wave(0.0, None, &mut rng);
        waves.update(0.0, 0.0, 0, &mut rng);
        assert!(waves.update(60.0, 60.0, 0, &mut rng).is_empty());
        assert!(waves.all_dispatched());
    }

    #[test]
    fn test_spawn_point_on_ring() {
        let mut rng = rng();
        let waves = WaveScheduler::default();
        let center = Vec3::new(3.0, 0.0, -2.0);
        for _ in 0..50 {
            let p = waves.spawn_point(center, &mut rng);
            let r = Vec2::new(p.x - center.x, p.z - center.z).length();
            assert!((SPAWN_RING.0 - 1e-3..=SPAWN_RING.1 + 1e-3).contains(&r));
        }
    }

    #[test]
    fn test_waves_from_ron() {
        let source = r#"[
            (enemy_count: 3, archetypes: [Scout], spawn_delay: 1.0),
            (enemy_count: 2, archetypes: [Heavy, Flyer], spawn_delay: 0.5),
        ]"#;
        let waves = WaveScheduler::waves_from_ron_str(source).expect("valid waves");
        assert_eq!(waves.len(), 2);
        assert!(!waves[1].completed);
        assert_eq!(waves[1].archetypes, vec![Archetype::Heavy, Archetype::Flyer]);
    }

    #[test]
    fn test_empty_pool_rejected() {
        let source = "[(enemy_count: 3, archetypes: [], spawn_delay: 1.0)]";
        assert!(matches!(
            WaveScheduler::waves_from_ron_str(source),
            Err(SimError::Invalid(_))
        ));
    }
}
