mod common;

use common::*;
use sky_core::sound::{velocity_to_volume, AtmosphereLoop, VoiceAllocator};
use sky_core::{parse_manifest, SoundBank, SoundError, StealPolicy};

fn allocator(json: &str, polyphony: usize) -> VoiceAllocator<MockPlayer> {
    VoiceAllocator::new(bank_from(json, polyphony), StealPolicy::Oldest, 180.0)
}

#[test]
fn manifest_parses_groups_in_order() {
    let m = parse_manifest(FULL_MANIFEST).unwrap();
    assert_eq!(m["pad"], vec!["pad/a.wav", "pad/b.wav"]);
    assert_eq!(m.len(), 6);
    assert!(matches!(
        parse_manifest("{\"pad\": \"a.wav\"}"),
        Err(SoundError::Manifest(_))
    ));
}

#[test]
fn bank_instantiates_polyphony_slots_per_file() {
    let bank = full_bank(4);
    assert_eq!(bank.voices("pad").len(), 2);
    assert!(bank.voices("pad").iter().all(|v| v.slot_count() == 4));
    assert_eq!(bank.total_slots(), 8 * 4);
    assert!(bank.voices("nope").is_empty());
    assert!(!bank.has_playable("nope"));
}

#[test]
fn failing_files_leave_fewer_slots() {
    let bank = bank_from(
        r#"{"pad": ["pad/missing.wav", "pad/ok.wav"], "dead": ["missing.wav"]}"#,
        3,
    );
    assert_eq!(bank.voices("pad")[0].slot_count(), 0);
    assert_eq!(bank.voices("pad")[1].slot_count(), 3);
    assert!(bank.has_playable("pad"));
    assert!(!bank.has_playable("dead"));
}

#[test]
fn empty_bank_allocates_nothing() {
    let mut voices =
        VoiceAllocator::new(SoundBank::<MockPlayer>::empty(), StealPolicy::Oldest, 180.0);
    let mut r = rng(1);
    assert!(voices.note_on(60, 100, "pad", 0.0, &mut r).is_none());
    assert_eq!(voices.active_bindings(), 0);
}

#[test]
fn note_on_binds_and_starts_a_voice() {
    let mut voices = allocator(FULL_MANIFEST, 4);
    let mut r = rng(2);
    let h = voices.note_on(64, 127, "pluck", 0.0, &mut r).unwrap();
    let binding = voices.binding(64).unwrap();
    assert_eq!(binding.handle, h);
    assert_eq!(binding.group, "pluck");
    let p = voices.bank().player(h).unwrap();
    assert!(p.playing);
    assert_eq!(p.volume, velocity_to_volume(127));
    assert!((0.92..=1.08).contains(&p.rate));
}

#[test]
fn retrigger_keeps_one_binding_and_fades_the_old_voice() {
    let mut voices = allocator(FULL_MANIFEST, 4);
    let mut r = rng(3);
    let first = voices.note_on(60, 100, "glass", 0.0, &mut r).unwrap();
    let second = voices.note_on(60, 100, "glass", 10.0, &mut r).unwrap();
    assert_ne!(first, second);
    assert_eq!(voices.active_bindings(), 1);
    assert_eq!(voices.binding(60).unwrap().handle, second);
    assert!(voices.is_releasing(first));
    assert!(!voices.is_releasing(second));
}

#[test]
fn note_off_for_unbound_note_is_a_no_op() {
    let mut voices = allocator(FULL_MANIFEST, 2);
    let mut r = rng(4);
    voices.note_on(60, 90, "pad", 0.0, &mut r);
    assert!(!voices.note_off(61, 5.0));
    assert_eq!(voices.active_bindings(), 1);
    assert_eq!(voices.pending_releases(), 0);
}

#[test]
fn release_fades_volume_then_stops() {
    let mut voices = allocator(FULL_MANIFEST, 2);
    let mut r = rng(5);
    let h = voices.note_on(72, 127, "shimmer", 0.0, &mut r).unwrap();
    let start_volume = voices.bank().player(h).unwrap().volume;
    assert!(voices.note_off(72, 100.0));
    assert!(voices.binding(72).is_none());

    voices.tick(190.0);
    let p = voices.bank().player(h).unwrap();
    assert!(p.playing);
    assert!((p.volume - start_volume * 0.5).abs() < 1e-4);

    voices.tick(280.0);
    let p = voices.bank().player(h).unwrap();
    assert!(!p.playing);
    assert_eq!(p.volume, 0.0);
    assert_eq!(voices.pending_releases(), 0);
}

#[test]
fn oldest_voice_is_stolen_when_all_slots_are_busy() {
    let mut voices = allocator(r#"{"pad": ["pad/a.wav"]}"#, 2);
    let mut r = rng(6);
    let a = voices.note_on(60, 100, "pad", 0.0, &mut r).unwrap();
    let b = voices.note_on(62, 100, "pad", 10.0, &mut r).unwrap();
    let c = voices.note_on(64, 100, "pad", 20.0, &mut r).unwrap();
    assert_eq!(c, a);
    assert_ne!(c, b);
    // the stolen note no longer owns anything
    assert!(voices.binding(60).is_none());
    assert_eq!(voices.binding(64).unwrap().handle, a);
    assert_eq!(voices.active_bindings(), 2);
    assert_eq!(voices.bank().player(a).unwrap().stops, 1);
}

#[test]
fn stealing_a_fading_voice_cancels_its_fade() {
    let mut voices = allocator(r#"{"pad": ["pad/a.wav"]}"#, 1);
    let mut r = rng(7);
    let a = voices.note_on(60, 100, "pad", 0.0, &mut r).unwrap();
    voices.note_off(60, 5.0);
    assert!(voices.is_releasing(a));
    let b = voices.note_on(67, 100, "pad", 10.0, &mut r).unwrap();
    assert_eq!(a, b);
    assert!(!voices.is_releasing(b));
    voices.tick(1_000.0);
    assert!(voices.bank().player(b).unwrap().playing);
}

#[test]
fn one_shots_play_without_binding() {
    let mut voices = allocator(FULL_MANIFEST, 2);
    let mut r = rng(8);
    let h = voices
        .play_one_shot("glass", (0.06, 0.2), (0.9, 1.2), 0.0, &mut r)
        .unwrap();
    let p = voices.bank().player(h).unwrap();
    assert!(p.playing);
    assert!((0.06..=0.2).contains(&p.volume));
    assert!((0.9..=1.2).contains(&p.rate));
    assert_eq!(voices.active_bindings(), 0);
}

#[test]
fn velocity_maps_into_voice_volume_range() {
    assert_eq!(velocity_to_volume(0), 0.06);
    assert!((velocity_to_volume(127) - 0.35).abs() < 1e-6);
    assert!(velocity_to_volume(64) > velocity_to_volume(32));
    assert_eq!(velocity_to_volume(200), velocity_to_volume(127));
}

#[test]
fn atmosphere_is_dormant_until_started() {
    let mut voices = allocator(FULL_MANIFEST, 2);
    let mut atmos = AtmosphereLoop::new();
    let mut r = rng(9);
    atmos.tick(&mut voices, 0.0, &mut r);
    assert!(atmos.current().is_none());

    atmos.start(0.0, &mut r);
    atmos.tick(&mut voices, 0.0, &mut r);
    let bed = atmos.current().expect("atmos bed playing");
    assert_eq!(voices.bank().group_name(bed), Some("atmos"));
    assert!(voices.bank().player(bed).unwrap().playing);
}

#[test]
fn atmosphere_swaps_its_bed_after_the_hold() {
    let mut voices = allocator(FULL_MANIFEST, 2);
    let mut atmos = AtmosphereLoop::new();
    let mut r = rng(10);
    atmos.start(0.0, &mut r);
    atmos.tick(&mut voices, 0.0, &mut r);
    let first = atmos.current().unwrap();

    atmos.tick(&mut voices, 21_000.0, &mut r);
    assert_eq!(atmos.current(), Some(first));

    atmos.tick(&mut voices, 41_000.0, &mut r);
    assert!(atmos.current().is_some());
    assert!(voices.bank().player(first).unwrap().stops >= 1);
}

#[test]
fn unplayable_files_are_never_handed_out() {
    let mut voices = allocator(
        r#"{"pad": ["pad/broken.wav", "pad/ok.wav"], "dead": ["dead/broken.wav"]}"#,
        2,
    );
    assert!(voices.bank().has_playable("pad"));
    assert!(!voices.bank().has_playable("dead"));
    assert_eq!(voices.bank().voices("pad")[0].available_count(), 0);

    let mut r = rng(11);
    for note in 40..60u8 {
        let h = voices.note_on(note, 100, "pad", note as f64, &mut r).unwrap();
        assert_eq!(h.file, 1, "note {note} landed on the broken file");
    }
    assert!(voices.note_on(70, 100, "dead", 100.0, &mut r).is_none());
    assert!(voices
        .play_one_shot("dead", (0.1, 0.2), (1.0, 1.0), 100.0, &mut r)
        .is_none());
}

#[test]
fn arbitrary_policy_steals_exactly_one_busy_slot() {
    for seed in 0..8 {
        let mut voices = VoiceAllocator::new(
            bank_from(r#"{"pad": ["pad/a.wav"]}"#, 3),
            StealPolicy::Arbitrary,
            180.0,
        );
        let mut r = rng(100 + seed);
        let held: Vec<_> = [60u8, 62, 64]
            .iter()
            .enumerate()
            .map(|(i, &n)| (n, voices.note_on(n, 100, "pad", i as f64, &mut r).unwrap()))
            .collect();

        let h = voices.note_on(67, 100, "pad", 30.0, &mut r).unwrap();
        let lost: Vec<_> = held
            .iter()
            .filter(|(n, _)| voices.binding(*n).is_none())
            .collect();
        assert_eq!(lost.len(), 1);
        assert_eq!(lost[0].1, h);
        assert_eq!(voices.bank().player(h).unwrap().stops, 1);
        assert!(voices.bank().player(h).unwrap().playing);
        assert_eq!(voices.binding(67).unwrap().handle, h);
        assert_eq!(voices.active_bindings(), 3);
    }
}

#[test]
fn one_shots_never_steal_a_held_note() {
    let mut voices = allocator(r#"{"glass": ["glass/a.wav"]}"#, 1);
    let mut r = rng(12);
    let h = voices.note_on(60, 100, "glass", 0.0, &mut r).unwrap();
    assert!(voices
        .play_one_shot("glass", (0.06, 0.2), (0.9, 1.2), 10.0, &mut r)
        .is_none());
    assert_eq!(voices.binding(60).unwrap().handle, h);
    assert_eq!(voices.bank().player(h).unwrap().stops, 0);
}

#[test]
fn atmosphere_swap_spares_a_slot_taken_by_a_note() {
    let mut voices = allocator(r#"{"atmos": ["atmos/a.wav"]}"#, 1);
    let mut atmos = AtmosphereLoop::new();
    let mut r = rng(13);
    atmos.start(0.0, &mut r);
    atmos.tick(&mut voices, 0.0, &mut r);
    let bed = atmos.current().unwrap();

    // a note steals the only slot while the bed still points at it
    let held = voices.note_on(60, 100, "atmos", 100.0, &mut r).unwrap();
    assert_eq!(held, bed);

    atmos.tick(&mut voices, 41_000.0, &mut r);
    assert_eq!(voices.binding(60).map(|b| b.handle), Some(held));
    assert!(voices.bank().player(held).unwrap().playing);
    assert!(atmos.current().is_none());

    voices.note_off(60, 41_100.0);
    voices.tick(41_400.0);
    atmos.tick(&mut voices, 90_000.0, &mut r);
    assert!(atmos.current().is_some());
}
