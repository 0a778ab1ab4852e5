//! The "quantum seed": an 8-bit integer produced offline by measuring a
//! superposed register and written to `quantum_seed.json`. It biases hues,
//! geometry picks, synth detune and scene rotation.

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_SEED: u32 = 137;
pub const FILE_FALLBACK_SEED: u32 = 85;
pub const DEFAULT_SEED_BINARY: &str = "01010101";

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("malformed quantum seed file: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuantumSeed {
    pub value: u32,
    pub binary: String,
}

impl Default for QuantumSeed {
    fn default() -> Self {
        Self {
            value: DEFAULT_SEED,
            binary: DEFAULT_SEED_BINARY.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct SeedFile {
    seed_int: Option<serde_json::Value>,
    seed_binary: Option<String>,
}

impl QuantumSeed {
    /// Parse `quantum_seed.json`. A readable file with missing fields falls
    /// back to seed 85 / `01010101`; `seed_int` may be a number or a numeric
    /// string.
    pub fn from_json(json: &str) -> Result<Self, SeedError> {
        let file: SeedFile = serde_json::from_str(json)?;
        let value = file
            .seed_int
            .as_ref()
            .and_then(|v| match v {
                serde_json::Value::Number(n) => n.as_u64(),
                serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
                _ => None,
            })
            .map(|n| n.min(u32::MAX as u64) as u32)
            .unwrap_or(FILE_FALLBACK_SEED);
        let binary = file
            .seed_binary
            .unwrap_or_else(|| DEFAULT_SEED_BINARY.to_string());
        Ok(Self { value, binary })
    }
}

/// Hue offset in degrees added to every note hue.
#[inline]
pub fn seed_hue_offset(seed: u32) -> f32 {
    seed as f32 * 2.2
}

/// Deterministic per-frame noise in `[0, n)`, the sketch's sin-hash.
#[inline]
pub fn seed_noise(seed: u32, frame: u64, n: f32) -> f32 {
    let x = ((frame as f64 + 1.0) * 0.017 + seed as f64 * 0.113).sin() * 10_000.0;
    ((x - x.floor()) as f32) * n
}

#[inline]
pub fn signed_seed_noise(seed: u32, frame: u64, n: f32) -> f32 {
    (seed_noise(seed, frame, 1.0) * 2.0 - 1.0) * n
}
