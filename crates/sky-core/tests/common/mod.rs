// Shared fixtures for the sky-core integration tests.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::SeedableRng;
use sky_core::{parse_manifest, Player, SoundBank, SoundError};

/// In-memory player: records what the allocator asked of it. Never ends on
/// its own, so only `stop` clears `playing`. A `broken` player stands in for a
/// source that turned out to be unplayable after loading.
#[derive(Debug, Default)]
pub struct MockPlayer {
    pub source: String,
    pub playing: bool,
    pub volume: f32,
    pub rate: f32,
    pub plays: u32,
    pub stops: u32,
    pub broken: bool,
}

impl Player for MockPlayer {
    fn play(&mut self) {
        self.playing = true;
        self.plays += 1;
    }

    fn stop(&mut self) {
        self.playing = false;
        self.stops += 1;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn set_rate(&mut self, rate: f32) {
        self.rate = rate;
    }

    fn is_available(&self) -> bool {
        !self.broken
    }
}

pub fn mock_loader(path: &str) -> Result<MockPlayer, SoundError> {
    if path.contains("missing") {
        return Err(SoundError::Load {
            path: path.to_string(),
            reason: "not found".into(),
        });
    }
    Ok(MockPlayer {
        source: path.to_string(),
        rate: 1.0,
        volume: 1.0,
        broken: path.contains("broken"),
        ..Default::default()
    })
}

pub const FULL_MANIFEST: &str = r#"{
    "pad": ["pad/a.wav", "pad/b.wav"],
    "glass": ["glass/a.wav"],
    "pluck": ["pluck/a.wav"],
    "noise": ["noise/a.wav"],
    "shimmer": ["shimmer/a.wav"],
    "atmos": ["atmos/a.wav", "atmos/b.wav"]
}"#;

pub fn bank_from(json: &str, polyphony: usize) -> SoundBank<MockPlayer> {
    let manifest = parse_manifest(json).expect("manifest");
    SoundBank::load(&manifest, polyphony, mock_loader)
}

pub fn full_bank(polyphony: usize) -> SoundBank<MockPlayer> {
    bank_from(FULL_MANIFEST, polyphony)
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
