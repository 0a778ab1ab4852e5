// Host-side tests for the procedural audio buffers.

#![allow(dead_code)]
mod dsp {
    include!("../src/dsp.rs");
}

use dsp::*;

#[test]
fn xorshift_noise_stays_in_range() {
    let mut state = 1;
    let samples: Vec<f32> = (0..10_000).map(|_| xorshift_noise(&mut state)).collect();
    assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    let mean = samples.iter().sum::<f32>() / samples.len() as f32;
    assert!(mean.abs() < 0.05);
}

#[test]
fn impulse_length_follows_rate_and_duration() {
    let ir = impulse_response(48_000.0, 6.5, 2.2, 7);
    assert_eq!(ir.len(), 312_000);
    assert_eq!(impulse_response(48_000.0, 0.0, 2.2, 7).len(), 1);
}

#[test]
fn impulse_decays_over_time() {
    let ir = impulse_response(8_000.0, 4.0, 1.0, 3);
    let energy = |s: &[f32]| s.iter().map(|x| x * x).sum::<f32>();
    let head = energy(&ir[..4_000]);
    let tail = energy(&ir[ir.len() - 4_000..]);
    assert!(head > tail * 20.0);
}

#[test]
fn zero_seed_still_produces_noise() {
    let ir = impulse_response(1_000.0, 0.1, 1.0, 0);
    assert!(ir.iter().any(|s| *s != 0.0));
}

#[test]
fn pink_noise_is_bounded_and_deterministic() {
    let a = pink_noise(96_000, 11);
    assert_eq!(a.len(), 96_000);
    assert!(a.iter().all(|s| (-1.0..=1.0).contains(s)));
    assert!(a.iter().any(|s| s.abs() > 0.05));
    assert_eq!(a, pink_noise(96_000, 11));
}
