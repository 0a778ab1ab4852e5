//! Input adapters. MIDI bytes, computer keys and pointers all reduce to
//! [`NoteEvent`]s before reaching the engine.

use fnv::{FnvHashMap, FnvHashSet};
use rand::prelude::*;
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteEvent {
    On { note: u8, velocity: u8 },
    Off { note: u8 },
}

/// Decode a short MIDI channel message. Any channel; anything but note
/// on/off is ignored.
pub fn decode_midi(bytes: &[u8]) -> Option<NoteEvent> {
    let [status, note, velocity, ..] = *bytes else {
        return None;
    };
    let note = note & 0x7f;
    let velocity = velocity & 0x7f;
    match status & 0xf0 {
        0x90 if velocity > 0 => Some(NoteEvent::On { note, velocity }),
        0x90 | 0x80 => Some(NoteEvent::Off { note }),
        _ => None,
    }
}

/// Two-row piano layout starting at middle C.
const KEY_LAYOUT: [(char, u8); 17] = [
    ('a', 60),
    ('w', 61),
    ('s', 62),
    ('e', 63),
    ('d', 64),
    ('f', 65),
    ('t', 66),
    ('g', 67),
    ('y', 68),
    ('h', 69),
    ('u', 70),
    ('j', 71),
    ('k', 72),
    ('o', 73),
    ('l', 74),
    ('p', 75),
    (';', 76),
];

pub const KEYBOARD_VELOCITY: u8 = 100;

/// Case-insensitive; multi-character key names (e.g. "Shift") never map.
pub fn note_for_key(key: &str) -> Option<u8> {
    let mut chars = key.chars();
    let c = chars.next()?.to_ascii_lowercase();
    if chars.next().is_some() {
        return None;
    }
    KEY_LAYOUT.iter().find(|(k, _)| *k == c).map(|&(_, n)| n)
}

#[derive(Default)]
pub struct KeyboardAdapter {
    held: FnvHashSet<u8>,
}

impl KeyboardAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Auto-repeat and already-held keys produce nothing.
    pub fn key_down(&mut self, key: &str, repeat: bool) -> Option<NoteEvent> {
        let note = note_for_key(key)?;
        if repeat || !self.held.insert(note) {
            return None;
        }
        log::trace!("[keys] down {} -> {}", key, note);
        Some(NoteEvent::On {
            note,
            velocity: KEYBOARD_VELOCITY,
        })
    }

    pub fn key_up(&mut self, key: &str) -> Option<NoteEvent> {
        let note = note_for_key(key)?;
        self.held.remove(&note).then_some(NoteEvent::Off { note })
    }

    pub fn held_count(&self) -> usize {
        self.held.len()
    }
}

/// C major pentatonic from C3 to C6.
pub const POINTER_NOTE_POOL: [u8; 16] = [
    48, 50, 52, 55, 57, 60, 62, 64, 67, 69, 72, 74, 76, 79, 81, 84,
];

pub const POINTER_DEFAULT_VELOCITY: u8 = 96;

/// Map pointer pressure to velocity. Devices without pressure report 0 (or
/// 0.5 for a pressed mouse); both fall back to the default.
pub fn pressure_velocity(pressure: Option<f32>) -> u8 {
    match pressure {
        Some(p) if p.is_finite() && p > 0.0 && p != 0.5 => {
            (40.0 + p.clamp(0.0, 1.0) * 87.0).round() as u8
        }
        _ => POINTER_DEFAULT_VELOCITY,
    }
}

/// Notes held per pointer id.
#[derive(Default)]
pub struct PointerTracker {
    active: FnvHashMap<i32, u8>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A repeated down on a tracked id releases its old note first.
    pub fn pointer_down<R: Rng>(
        &mut self,
        id: i32,
        pressure: Option<f32>,
        rng: &mut R,
    ) -> SmallVec<[NoteEvent; 2]> {
        let mut events = SmallVec::new();
        if let Some(old) = self.active.remove(&id) {
            events.push(NoteEvent::Off { note: old });
        }
        let note = POINTER_NOTE_POOL[rng.gen_range(0..POINTER_NOTE_POOL.len())];
        self.active.insert(id, note);
        log::trace!("[pointer] {} down -> {}", id, note);
        events.push(NoteEvent::On {
            note,
            velocity: pressure_velocity(pressure),
        });
        events
    }

    /// Also used for cancel. Unknown ids produce nothing.
    pub fn pointer_up(&mut self, id: i32) -> Option<NoteEvent> {
        self.active.remove(&id).map(|note| NoteEvent::Off { note })
    }

    pub fn note_for(&self, id: i32) -> Option<u8> {
        self.active.get(&id).copied()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}
