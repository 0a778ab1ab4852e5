//! Platform-independent core of quantum-sky: world feeds, sample voices,
//! mode selection, entity spawning and the scene instances both front ends
//! draw.

pub mod config;
pub mod constants;
pub mod engine;
pub mod entity;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod input;
pub mod mode;
pub mod motion;
pub mod pool;
pub mod scene;
pub mod seed;
pub mod sound;
pub mod spawn;
pub mod status;
pub mod synth;
pub mod world;

pub use config::{ConfigError, EngineParams, PopulationCaps};
pub use engine::{NoteOutcome, SkyEngine};
pub use input::{decode_midi, KeyboardAdapter, NoteEvent, PointerTracker};
pub use mode::Mode;
pub use scene::{Camera, InstanceData, Uniforms};
pub use seed::QuantumSeed;
pub use sound::{
    parse_manifest, Player, SoundBank, SoundError, SoundManifest, StealPolicy, VoiceHandle,
};
pub use status::Status;
pub use synth::{midi_to_hz, GlobalEnergy, SynthPatch};
pub use world::{Feed, WorldError, WorldState};
