//! Height field provider.
//!
//! Ground elevation is a pure function of (x, z): three octaves of Perlin
//! noise plus bowl-shaped craters carved into a sparse set of grid cells.
//! Crater activation is hashed from the cell coordinate, so every query
//! inside one cell sees the same crater.

use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::constants::*;

/// Anything that can answer "ground height at (x, z)".
///
/// Closures qualify, so a terrain collaborator can hand in its own function.
pub trait HeightField {
    fn height_at(&self, x: f32, z: f32) -> f32;
}

impl<F> HeightField for F
where
    F: Fn(f32, f32) -> f32,
{
    fn height_at(&self, x: f32, z: f32) -> f32 {
        self(x, z)
    }
}

/// Terrain shape parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// (amplitude, frequency) per octave
    pub octaves: Vec<(f32, f32)>,
    pub crater_cell_size: f32,
    pub crater_chance: f32,
    pub crater_radius: f32,
    pub crater_depth: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            octaves: TERRAIN_OCTAVES.to_vec(),
            crater_cell_size: CRATER_CELL_SIZE,
            crater_chance: CRATER_CHANCE,
            crater_radius: CRATER_RADIUS,
            crater_depth: CRATER_DEPTH,
        }
    }
}

/// Seeded procedural terrain.
#[derive(Debug, Clone)]
pub struct ProceduralHeightField {
    seed: u64,
    perlin: Perlin,
    config: TerrainConfig,
}

impl ProceduralHeightField {
    pub fn new(seed: u64, config: TerrainConfig) -> Self {
        Self {
            seed,
            // Perlin takes a 32-bit seed; fold the high half in
            perlin: Perlin::new((seed ^ (seed >> 32)) as u32),
            config,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Noise part of the height, without craters
    pub fn base_height(&self, x: f32, z: f32) -> f32 {
        self.config
            .octaves
            .iter()
            .enumerate()
            .map(|(i, &(amplitude, frequency))| {
                // Offset each octave so they don't share lattice zeros
                let offset = i as f64 * 17.31;
                let sample = self.perlin.get([
                    f64::from(x * frequency) + offset,
                    f64::from(z * frequency) - offset,
                ]);
                amplitude * sample as f32
            })
            .sum()
    }

    /// Crater cell containing (x, z)
    pub fn crater_cell(&self, x: f32, z: f32) -> (i32, i32) {
        let size = self.config.crater_cell_size;
        ((x / size).floor() as i32, (z / size).floor() as i32)
    }

    /// Whether a crater cell is active. Stable for a given seed and cell.
    pub fn crater_active(&self, cell_x: i32, cell_z: i32) -> bool {
        cell_roll(self.seed, cell_x, cell_z) < self.config.crater_chance
    }

    /// Crater depression at (x, z); zero or negative.
    pub fn crater_offset(&self, x: f32, z: f32) -> f32 {
        let (cell_x, cell_z) = self.crater_cell(x, z);
        if !self.crater_active(cell_x, cell_z) {
            return 0.0;
        }

        let size = self.config.crater_cell_size;
        let center_x = (cell_x as f32 + 0.5) * size;
        let center_z = (cell_z as f32 + 0.5) * size;
        let dist = ((x - center_x).powi(2) + (z - center_z).powi(2)).sqrt();
        let radius = self.config.crater_radius;
        if dist >= radius {
            return 0.0;
        }

        let t = dist / radius;
        -self.config.crater_depth * (1.0 - t * t)
    }
}

impl Default for ProceduralHeightField {
    fn default() -> Self {
        Self::new(DEFAULT_SEED, TerrainConfig::default())
    }
}

impl HeightField for ProceduralHeightField {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        if !x.is_finite() || !z.is_finite() {
            return 0.0;
        }
        self.base_height(x, z) + self.crater_offset(x, z)
    }
}

/// Uniform roll in [0, 1) for a crater cell
fn cell_roll(seed: u64, cell_x: i32, cell_z: i32) -> f32 {
    let mut hasher = Sha3_256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(cell_x.to_le_bytes());
    hasher.update(cell_z.to_le_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    let bits = u64::from_le_bytes(bytes) >> 40;
    bits as f32 / (1u64 << 24) as f32
}
