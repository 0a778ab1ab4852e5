use sky_core::constants::{ENERGY_MAX, RIGHT_HAND_SPLIT};
use sky_core::{midi_to_hz, GlobalEnergy, SynthPatch};

#[test]
fn midi_to_hz_hits_concert_pitch() {
    assert!((midi_to_hz(69.0) - 440.0).abs() < 1e-3);
    assert!((midi_to_hz(81.0) - 880.0).abs() < 1e-2);
    assert!((midi_to_hz(60.0) - 261.626).abs() < 1e-2);
}

#[test]
fn patch_stays_in_range_across_the_keyboard() {
    for note in 0..=127u8 {
        for velocity in [1u8, 64, 127] {
            let p = SynthPatch::for_note(note, velocity, 137, 42);
            assert!((500.0..=4_500.0).contains(&p.cutoff_hz), "cutoff {}", p.cutoff_hz);
            assert!(p.carrier_gain > 0.0 && p.metal_gain > 0.0 && p.noise_gain > 0.0);
            assert!(p.carrier_gain < 0.25);
            assert!(p.metal_hz > p.carrier_hz);
            let expected = if note >= RIGHT_HAND_SPLIT { 10.0 } else { 7.0 };
            assert_eq!(p.resonance, expected);
        }
    }
}

#[test]
fn right_hand_and_harder_notes_are_louder() {
    let left = SynthPatch::for_note(RIGHT_HAND_SPLIT - 1, 100, 0, 0);
    let right = SynthPatch::for_note(RIGHT_HAND_SPLIT, 100, 0, 0);
    assert!(right.carrier_gain > left.carrier_gain);
    assert!(right.noise_gain > left.noise_gain);

    let soft = SynthPatch::for_note(64, 10, 0, 0);
    let hard = SynthPatch::for_note(64, 127, 0, 0);
    assert!(hard.carrier_gain > soft.carrier_gain);
}

#[test]
fn energy_accumulates_and_clamps() {
    let mut e = GlobalEnergy::default();
    assert!(e.is_silent());
    e.note_on(127);
    assert!((e.value() - 1.0).abs() < 1e-6);
    for _ in 0..10 {
        e.note_on(127);
    }
    assert_eq!(e.value(), ENERGY_MAX);
}

#[test]
fn note_offs_decay_energy_into_silence() {
    let mut e = GlobalEnergy::default();
    e.note_on(127);
    assert!(!e.note_off());
    assert!((e.value() - 0.85).abs() < 1e-6);
    let mut offs = 1;
    while !e.note_off() {
        offs += 1;
        assert!(offs < 100);
    }
    assert!(e.value() < 0.05);
}

#[test]
fn frame_decay_is_gentle() {
    let mut e = GlobalEnergy::default();
    e.note_on(127);
    e.decay_frame();
    assert!(e.value() < 1.0 && e.value() > 0.98);
}
