/// DOM ids, asset paths and web-audio mix levels.
///
/// Kept free of web-sys types so host tests can include this file directly.
// Elements provided by index.html
pub const CANVAS_ID: &str = "app-canvas";
pub const START_BUTTON_ID: &str = "startBtn";
pub const OVERLAY_ID: &str = "overlay";
pub const STATUS_ID: &str = "status";

// Assets served next to index.html
pub const SOUNDBANK_URL: &str = "soundbank.json";
pub const QUANTUM_SEED_URL: &str = "quantum_seed.json";

// Master bus
pub const MASTER_GAIN: f32 = 0.8;

// Reverb: long dark tail, wet level into master
pub const REVERB_SECONDS: f32 = 6.5;
pub const REVERB_DECAY_TAU: f32 = 2.2;
pub const REVERB_WET: f32 = 0.75;

// Delay: 250 ms, 35% feedback, darkened at 2.4 kHz
pub const DELAY_TIME_SEC: f64 = 0.25;
pub const DELAY_FEEDBACK: f32 = 0.35;
pub const DELAY_TONE_HZ: f32 = 2_400.0;
pub const DELAY_WET: f32 = 0.4;

// Synth sends
pub const SYNTH_REVERB_SEND: f32 = 0.6;
pub const SYNTH_DELAY_SEND: f32 = 0.35;

// Pink-noise loop length for the synth's noise bed
pub const NOISE_SECONDS: f32 = 2.0;

/// Cache-busting query so a freshly generated seed file is always read.
pub fn seed_url(now_ms: f64) -> String {
    format!("{}?nocache={}", QUANTUM_SEED_URL, now_ms as u64)
}
