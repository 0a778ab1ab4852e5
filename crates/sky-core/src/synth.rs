//! Oscillator voice parameters and the global energy envelope that drives
//! the scene's core sphere.

use crate::constants::{
    ENERGY_FRAME_DECAY, ENERGY_MAX, ENERGY_NOTE_OFF_DECAY, ENERGY_SILENCE_BELOW, RIGHT_HAND_SPLIT,
};

pub fn midi_to_hz(midi: f32) -> f32 {
    440.0 * 2.0_f32.powf((midi - 69.0) / 12.0)
}

/// One mono synth setting: a triangle carrier, a detuned saw "metal"
/// partial and a pink-noise bed, all through a resonant lowpass. Gains are
/// final levels; front ends ramp to them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SynthPatch {
    pub carrier_hz: f32,
    pub metal_hz: f32,
    pub carrier_gain: f32,
    pub metal_gain: f32,
    pub noise_gain: f32,
    pub cutoff_hz: f32,
    pub resonance: f32,
}

/// Attack times in seconds for carrier, metal and noise.
pub const SYNTH_ATTACK_S: [f64; 3] = [0.04, 0.05, 0.08];
/// Release times in seconds once energy falls silent.
pub const SYNTH_RELEASE_S: [f64; 3] = [0.25, 0.3, 0.3];

impl SynthPatch {
    pub fn for_note(note: u8, velocity: u8, seed: u32, frame: u64) -> Self {
        let right = note >= RIGHT_HAND_SPLIT;
        let freq = midi_to_hz(note as f32);
        let detune = 0.1 + (seed % 17) as f32 / 16.0 * 0.8;
        let ratio = if right { 2.01 } else { 1.5 };
        let lfo_rate = 0.06 + (seed % 97) as f32 / 96.0 * 0.12;
        let breath = 0.6 + 0.35 * (frame as f32 * lfo_rate).sin();
        let amp = 0.03 + (velocity.clamp(1, 127) - 1) as f32 / 126.0 * 0.19;
        let hand = if right { 1.0 } else { 0.65 };
        let metal = if right { 0.75 } else { 0.55 };
        Self {
            carrier_hz: freq,
            metal_hz: freq * ratio + detune,
            carrier_gain: amp * hand * breath,
            metal_gain: amp * metal * breath,
            noise_gain: amp * 0.15 * hand,
            cutoff_hz: (freq * 2.2).clamp(500.0, 4_500.0),
            resonance: if right { 10.0 } else { 7.0 },
        }
    }
}

/// Smoothed sum of recent note velocities.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlobalEnergy {
    value: f32,
}

impl GlobalEnergy {
    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn note_on(&mut self, velocity: u8) {
        self.value = (self.value + velocity.min(127) as f32 / 127.0).clamp(0.0, ENERGY_MAX);
    }

    /// Returns true once energy has fallen into silence.
    pub fn note_off(&mut self) -> bool {
        self.value *= ENERGY_NOTE_OFF_DECAY;
        self.is_silent()
    }

    pub fn decay_frame(&mut self) {
        self.value *= ENERGY_FRAME_DECAY;
    }

    #[inline]
    pub fn is_silent(&self) -> bool {
        self.value < ENERGY_SILENCE_BELOW
    }
}
