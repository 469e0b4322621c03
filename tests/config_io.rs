//! Configuration file round trips and failure modes

use std::io::Write;

use bevy::prelude::Vec3;
use tempfile::{Builder, NamedTempFile};

use battlefield_core::agent::Archetype;
use battlefield_core::collision::Collider;
use battlefield_core::engine::{SimConfig, Simulation};
use battlefield_core::waves::WaveDefinition;
use battlefield_core::SimError;

fn temp_with_suffix(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().expect("temp file");
    file.write_all(content.as_bytes()).expect("write");
    file.flush().expect("flush");
    file
}

fn custom_config() -> SimConfig {
    let mut config = SimConfig {
        seed: 1234,
        ..SimConfig::default()
    };
    config.schedule = vec![
        WaveDefinition::new(2, &[Archetype::Flyer], 0.5),
        WaveDefinition::new(4, &[Archetype::Heavy, Archetype::Scout], 1.0),
    ];
    config
        .structures
        .push(Collider::cuboid(Vec3::new(20.0, 1.0, -15.0), Vec3::new(4.0, 1.0, 2.0)));
    config.player.walk_speed = 12.0;
    config
}

#[test]
fn ron_file_round_trip() {
    let config = custom_config();
    let text = config.to_ron_string().expect("serialize");
    let file = temp_with_suffix(".ron", &text);
    let loaded = SimConfig::load(file.path()).expect("load ron");
    assert_eq!(loaded, config);
}

#[test]
fn json_file_round_trip() {
    let config = custom_config();
    let text = config.to_json_string().expect("serialize");
    let file = temp_with_suffix(".json", &text);
    let loaded = SimConfig::load(file.path()).expect("load json");
    assert_eq!(loaded, config);
}

#[test]
fn loaded_config_drives_simulation() {
    let file = temp_with_suffix(".ron", "(seed: 99, waves: (start_first_wave: false))");
    let config = SimConfig::load(file.path()).expect("load");
    let sim = Simulation::new(config).expect("valid");
    assert_eq!(sim.config().seed, 99);
    assert_eq!(sim.waves().current_wave_number(), 0);
    assert_eq!(sim.waves().waves().len(), 5);
}

#[test]
fn unknown_extension_rejected() {
    let file = temp_with_suffix(".toml", "seed = 1");
    assert!(matches!(
        SimConfig::load(file.path()),
        Err(SimError::UnsupportedFormat(ext)) if ext == "toml"
    ));
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("absent.ron");
    match SimConfig::load(&path) {
        Err(SimError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected IO error, got {other:?}"),
    }
}

#[test]
fn malformed_ron_rejected() {
    let file = temp_with_suffix(".ron", "(seed: \"not a number\")");
    assert!(matches!(SimConfig::load(file.path()), Err(SimError::Ron(_))));
}

#[test]
fn malformed_json_rejected() {
    let file = temp_with_suffix(".json", "{ \"seed\": ");
    assert!(matches!(SimConfig::load(file.path()), Err(SimError::Json(_))));
}

#[test]
fn invalid_values_rejected() {
    let file = temp_with_suffix(".ron", "(max_tick_dt: 0.0)");
    assert!(matches!(SimConfig::load(file.path()), Err(SimError::Invalid(_))));

    let file = temp_with_suffix(
        ".ron",
        "(schedule: [(enemy_count: 2, archetypes: [], spawn_delay: 1.0)])",
    );
    assert!(matches!(SimConfig::load(file.path()), Err(SimError::Invalid(_))));

    let mut config = SimConfig::default();
    config.structures.push(Collider::ball(Vec3::ZERO, 0.0));
    assert!(Simulation::new(config).is_err());
}
