mod common;

use common::rng;
use sky_core::input::{
    note_for_key, pressure_velocity, KEYBOARD_VELOCITY, POINTER_DEFAULT_VELOCITY,
    POINTER_NOTE_POOL,
};
use sky_core::{decode_midi, KeyboardAdapter, NoteEvent, PointerTracker};

#[test]
fn midi_note_on_and_off_on_any_channel() {
    assert_eq!(
        decode_midi(&[0x90, 60, 100]),
        Some(NoteEvent::On { note: 60, velocity: 100 })
    );
    assert_eq!(
        decode_midi(&[0x9f, 61, 1]),
        Some(NoteEvent::On { note: 61, velocity: 1 })
    );
    assert_eq!(decode_midi(&[0x83, 60, 64]), Some(NoteEvent::Off { note: 60 }));
}

#[test]
fn midi_note_on_with_zero_velocity_is_off() {
    assert_eq!(decode_midi(&[0x95, 72, 0]), Some(NoteEvent::Off { note: 72 }));
}

#[test]
fn midi_ignores_short_and_unrelated_messages() {
    assert_eq!(decode_midi(&[]), None);
    assert_eq!(decode_midi(&[0x90, 60]), None);
    // control change, pitch bend, clock
    assert_eq!(decode_midi(&[0xb0, 7, 100]), None);
    assert_eq!(decode_midi(&[0xe0, 0, 64]), None);
    assert_eq!(decode_midi(&[0xf8, 0, 0]), None);
}

#[test]
fn keys_map_case_insensitively() {
    assert_eq!(note_for_key("a"), Some(60));
    assert_eq!(note_for_key("A"), Some(60));
    assert_eq!(note_for_key(";"), Some(76));
    assert_eq!(note_for_key("z"), None);
    assert_eq!(note_for_key("Shift"), None);
    assert_eq!(note_for_key(""), None);
}

#[test]
fn keyboard_ignores_repeats_and_held_keys() {
    let mut keys = KeyboardAdapter::new();
    assert_eq!(
        keys.key_down("d", false),
        Some(NoteEvent::On { note: 64, velocity: KEYBOARD_VELOCITY })
    );
    assert_eq!(keys.key_down("d", true), None);
    assert_eq!(keys.key_down("D", false), None);
    assert_eq!(keys.held_count(), 1);

    assert_eq!(keys.key_up("D"), Some(NoteEvent::Off { note: 64 }));
    assert_eq!(keys.key_up("d"), None);
    assert_eq!(keys.held_count(), 0);
    assert!(keys.key_down("d", false).is_some());
}

#[test]
fn key_up_without_down_produces_nothing() {
    let mut keys = KeyboardAdapter::new();
    assert_eq!(keys.key_up("k"), None);
    assert_eq!(keys.key_up("Escape"), None);
}

#[test]
fn pointer_down_picks_from_the_pentatonic_pool() {
    let mut pointers = PointerTracker::new();
    let mut r = rng(40);
    for id in 0..32 {
        let events = pointers.pointer_down(id, None, &mut r);
        assert_eq!(events.len(), 1);
        match events[0] {
            NoteEvent::On { note, velocity } => {
                assert!(POINTER_NOTE_POOL.contains(&note));
                assert_eq!(velocity, POINTER_DEFAULT_VELOCITY);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(pointers.active_count(), 32);
}

#[test]
fn repeated_pointer_down_releases_the_old_note() {
    let mut pointers = PointerTracker::new();
    let mut r = rng(41);
    pointers.pointer_down(7, None, &mut r);
    let first = pointers.note_for(7).unwrap();

    let events = pointers.pointer_down(7, Some(0.9), &mut r);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], NoteEvent::Off { note: first });
    assert!(matches!(events[1], NoteEvent::On { .. }));
    assert_eq!(pointers.active_count(), 1);

    let second = pointers.note_for(7).unwrap();
    assert_eq!(pointers.pointer_up(7), Some(NoteEvent::Off { note: second }));
    assert_eq!(pointers.pointer_up(7), None);
    assert_eq!(pointers.pointer_up(99), None);
}

#[test]
fn pressure_maps_to_velocity() {
    assert_eq!(pressure_velocity(None), POINTER_DEFAULT_VELOCITY);
    assert_eq!(pressure_velocity(Some(0.0)), POINTER_DEFAULT_VELOCITY);
    assert_eq!(pressure_velocity(Some(0.5)), POINTER_DEFAULT_VELOCITY);
    assert_eq!(pressure_velocity(Some(f32::NAN)), POINTER_DEFAULT_VELOCITY);
    assert_eq!(pressure_velocity(Some(1.0)), 127);
    assert_eq!(pressure_velocity(Some(3.0)), 127);
    assert!(pressure_velocity(Some(0.2)) < pressure_velocity(Some(0.8)));
}
