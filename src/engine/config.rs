use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::collision::Collider;
use crate::combat::CombatConfig;
use crate::constants::{DEFAULT_SEED, MAX_TICK_DT};
use crate::error::{SimError, SimResult};
use crate::player::PlayerConfig;
use crate::terrain::TerrainConfig;
use crate::waves::{validate_wave, WaveConfig, WaveDefinition, WaveScheduler};

/// Everything needed to start a simulation. Every section falls back to
/// its defaults when omitted from the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub seed: u64,
    /// Largest delta-time a single tick will integrate
    pub max_tick_dt: f32,
    pub terrain: TerrainConfig,
    pub player: PlayerConfig,
    pub combat: CombatConfig,
    pub waves: WaveConfig,
    pub schedule: Vec<WaveDefinition>,
    /// Static obstacles registered at startup, after the ground plane
    pub structures: Vec<Collider>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            max_tick_dt: MAX_TICK_DT,
            terrain: TerrainConfig::default(),
            player: PlayerConfig::default(),
            combat: CombatConfig::default(),
            waves: WaveConfig::default(),
            schedule: WaveScheduler::default_campaign(),
            structures: Vec::new(),
        }
    }
}

impl SimConfig {
    /// Load from `.ron` or `.json`, picked by extension, then validate.
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let config = match extension.as_str() {
            "ron" => Self::from_ron_str(&content)?,
            "json" => Self::from_json_str(&content)?,
            other => return Err(SimError::UnsupportedFormat(other.to_string())),
        };
        info!(path = %path.display(), seed = config.seed, waves = config.schedule.len(), "config loaded");
        Ok(config)
    }

    pub fn from_ron_str(source: &str) -> SimResult<Self> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(source: &str) -> SimResult<Self> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron_string(&self) -> SimResult<String> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    pub fn to_json_string(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would make the simulation meaningless
    pub fn validate(&self) -> SimResult<()> {
        fn positive(name: &str, value: f32) -> SimResult<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SimError::Invalid(format!("{name} must be positive, got {value}")))
            }
        }

        positive("max_tick_dt", self.max_tick_dt)?;
        positive("player.radius", self.player.radius)?;
        positive("player.walk_speed", self.player.walk_speed)?;
        positive("player.max_speed", self.player.max_speed)?;
        positive("player.max_health", self.player.max_health)?;
        positive("player.projectile_speed", self.player.projectile_speed)?;
        positive("combat.hit_radius", self.combat.hit_radius)?;
        positive("waves.auto_advance_secs", self.waves.auto_advance_secs)?;
        positive("terrain.crater_cell_size", self.terrain.crater_cell_size)?;

        if self.waves.spawn_ring_min > self.waves.spawn_ring_max {
            return Err(SimError::Invalid(format!(
                "spawn ring min {} exceeds max {}",
                self.waves.spawn_ring_min, self.waves.spawn_ring_max
            )));
        }
        if !(0.0..=1.0).contains(&self.terrain.crater_chance) {
            return Err(SimError::Invalid(format!(
                "terrain.crater_chance must be within 0..=1, got {}",
                self.terrain.crater_chance
            )));
        }
        for (i, wave) in self.schedule.iter().enumerate() {
            validate_wave(i, wave)?;
        }
        for (i, structure) in self.structures.iter().enumerate() {
            if !structure.is_valid() {
                return Err(SimError::Invalid(format!("structure {i} has degenerate dimensions")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::prelude::Vec3;

    #[test]
    fn test_defaults_validate() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_ron_fills_defaults() {
        let config = SimConfig::from_ron_str("(seed: 7)").expect("valid config");
        assert_eq!(config.seed, 7);
        assert_eq!(config.schedule.len(), 5);
        assert_eq!(config.player, PlayerConfig::default());
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config = SimConfig::from_ron_str(
            "(terrain: (crater_chance: 0.5), combat: (hit_radius: 2.0), player: (walk_speed: 7.0))",
        )
        .expect("valid config");
        assert_eq!(config.terrain.crater_chance, 0.5);
        assert_eq!(config.terrain.octaves, TerrainConfig::default().octaves);
        assert_eq!(config.combat.hit_radius, 2.0);
        assert_eq!(config.combat.contact_radius, CombatConfig::default().contact_radius);
        assert_eq!(config.player.walk_speed, 7.0);

        let json = SimConfig::from_json_str(r#"{ "terrain": { "crater_depth": 3.0 } }"#).expect("valid json");
        assert_eq!(config.terrain.crater_cell_size, json.terrain.crater_cell_size);
        assert_eq!(json.terrain.crater_depth, 3.0);
    }

    #[test]
    fn test_ron_round_trip() {
        let mut config = SimConfig::default();
        config.structures.push(Collider::cuboid(Vec3::new(5.0, 1.0, 5.0), Vec3::ONE));
        let text = config.to_ron_string().expect("serializes");
        assert_eq!(SimConfig::from_ron_str(&text).expect("parses"), config);
    }

    #[test]
    fn test_negative_radius_rejected() {
        let mut config = SimConfig::default();
        config.player.radius = -1.0;
        assert!(matches!(config.validate(), Err(SimError::Invalid(_))));
    }

    #[test]
    fn test_inverted_spawn_ring_rejected() {
        let mut config = SimConfig::default();
        config.waves.spawn_ring_min = 80.0;
        assert!(config.validate().is_err());
    }
}
