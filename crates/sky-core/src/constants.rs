// Shared tuning constants used by both web and native frontends.
//
// Distances are in "sketch units" (roughly canvas pixels); the scene builder
// scales them down to world space with `WORLD_SCALE`.

// Voices
pub const VOICE_POLYPHONY: usize = 4; // parallel players per sample file
pub const RELEASE_FADE_MS: f64 = 180.0;
pub const VOICE_VOLUME_MIN: f32 = 0.06;
pub const VOICE_VOLUME_MAX: f32 = 0.35;
pub const FALLBACK_SOUND_GROUP: &str = "glass";

// Atmosphere layer and sparkles
pub const ATMOS_GROUP: &str = "atmos";
pub const SHIMMER_GROUP: &str = "shimmer";
pub const ATMOS_SWAP_MS: (f64, f64) = (22_000.0, 40_000.0);
pub const SHIMMER_EVERY_MS: (f64, f64) = (7_000.0, 12_000.0);
pub const SHIMMER_CHANCE: f64 = 0.6;
pub const GLASS_HIT_CHANCE: f64 = 0.35;

// Population caps (oldest dropped first)
pub const MAX_SHAPES: usize = 180;
pub const MAX_PARTICLES: usize = 1_400;
pub const MAX_CONNECTORS: usize = 240;

// Ambient baseline population
pub const AMBIENT_SPAWN_EVERY_MS: f64 = 900.0;
pub const AMBIENT_PARTICLES: usize = 6;

// Mode selector
pub const MODE_HOLD_MS: (f64, f64) = (4_000.0, 9_000.0);
pub const IDLE_REROLL_CHANCE: f64 = 0.01; // per frame, once the mode expired

// Anchor region half-extents, derived from ISS lon/lat and cloud cover
pub const ANCHOR_HALF_X: f32 = 320.0;
pub const ANCHOR_HALF_Y: f32 = 220.0;
pub const ANCHOR_HALF_Z: f32 = 340.0;

// Hands
pub const RIGHT_HAND_SPLIT: u8 = 60; // C4 and above plays "crystal" material

// Feeds
pub const WEATHER_REFRESH_MS: f64 = 10.0 * 60.0 * 1000.0;
pub const ISS_REFRESH_MS: f64 = 5_000.0;
pub const DEFAULT_LATITUDE: f64 = 19.43; // Mexico City
pub const DEFAULT_LONGITUDE: f64 = -99.13;
pub const ISS_NORAD_ID: u32 = 25544;

// Global energy
pub const ENERGY_MAX: f32 = 4.0;
pub const ENERGY_FRAME_DECAY: f32 = 0.985;
pub const ENERGY_NOTE_OFF_DECAY: f32 = 0.85;
pub const ENERGY_SILENCE_BELOW: f32 = 0.05;

// Scene
pub const WORLD_SCALE: f32 = 0.01; // sketch units -> world units
pub const CAMERA_Z: f32 = 9.0;
pub const CORE_BASE_SIZE: f32 = 80.0;
pub const CORE_ENERGY_SIZE: f32 = 160.0;
pub const CONNECTOR_DOTS: usize = 10;
