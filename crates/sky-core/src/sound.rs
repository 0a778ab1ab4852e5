//! Sample bank, voice allocation and release fades.
//!
//! The bank is generic over [`Player`] so the web front end can back it with
//! `<audio>` elements, the native one with slots in its cpal mixer, and tests
//! with plain structs.

use crate::constants::*;
use fnv::FnvHashMap;
use rand::prelude::*;
use serde::Deserialize;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use thiserror::Error;

/// One independently controllable sample player.
pub trait Player {
    fn play(&mut self);
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
    fn set_volume(&mut self, volume: f32);
    fn set_rate(&mut self, rate: f32);

    /// False once the player has found out its source cannot be played, e.g.
    /// a sample that failed to decode after the player was created.
    fn is_available(&self) -> bool {
        true
    }
}

#[derive(Debug, Error)]
pub enum SoundError {
    #[error("malformed sound manifest: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("failed to load `{path}`: {reason}")]
    Load { path: String, reason: String },
}

/// Group name -> sample file paths, as found in `soundbank.json`.
pub type SoundManifest = BTreeMap<String, Vec<String>>;

pub fn parse_manifest(json: &str) -> Result<SoundManifest, SoundError> {
    Ok(serde_json::from_str(json)?)
}

/// Which busy slot to reuse when every slot of a file is sounding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StealPolicy {
    #[default]
    Oldest,
    Arbitrary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoiceHandle {
    pub group: usize,
    pub file: usize,
    pub slot: usize,
}

struct Slot<P> {
    player: P,
    started_ms: f64,
}

impl<P: Player> Slot<P> {
    #[inline]
    fn is_idle(&self) -> bool {
        self.player.is_available() && !self.player.is_playing()
    }
}

pub struct SoundVoice<P> {
    pub source: String,
    slots: Vec<Slot<P>>,
}

impl<P: Player> SoundVoice<P> {
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn busy_count(&self) -> usize {
        self.slots.iter().filter(|s| s.player.is_playing()).count()
    }

    /// Slots whose player can still sound.
    pub fn available_count(&self) -> usize {
        self.slots.iter().filter(|s| s.player.is_available()).count()
    }
}

struct SoundGroup<P> {
    name: String,
    voices: Vec<SoundVoice<P>>,
}

pub struct SoundBank<P> {
    groups: Vec<SoundGroup<P>>,
    index: FnvHashMap<String, usize>,
}

impl<P: Player> SoundBank<P> {
    pub fn empty() -> Self {
        Self {
            groups: Vec::new(),
            index: FnvHashMap::default(),
        }
    }

    /// Instantiate `polyphony` players per listed file. A file whose loader
    /// fails keeps the slots it already got; the failure is only logged.
    pub fn load<F>(manifest: &SoundManifest, polyphony: usize, mut loader: F) -> Self
    where
        F: FnMut(&str) -> Result<P, SoundError>,
    {
        let mut bank = Self::empty();
        for (name, files) in manifest {
            let mut voices = Vec::with_capacity(files.len());
            for file in files {
                let mut slots = Vec::with_capacity(polyphony);
                for _ in 0..polyphony {
                    match loader(file) {
                        Ok(player) => slots.push(Slot {
                            player,
                            started_ms: f64::NEG_INFINITY,
                        }),
                        Err(e) => {
                            log::warn!("[sound] {}", e);
                            break;
                        }
                    }
                }
                voices.push(SoundVoice {
                    source: file.clone(),
                    slots,
                });
            }
            bank.index.insert(name.clone(), bank.groups.len());
            bank.groups.push(SoundGroup {
                name: name.clone(),
                voices,
            });
        }
        log::info!(
            "[sound] groups={:?} slots={}",
            bank.group_names().collect::<Vec<_>>(),
            bank.total_slots()
        );
        bank
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.name.as_str())
    }

    pub fn voices(&self, group: &str) -> &[SoundVoice<P>] {
        self.index
            .get(group)
            .map(|&gi| self.groups[gi].voices.as_slice())
            .unwrap_or(&[])
    }

    /// True when the group exists and at least one of its files has a slot
    /// that can still sound.
    pub fn has_playable(&self, group: &str) -> bool {
        self.voices(group).iter().any(|v| v.available_count() > 0)
    }

    pub fn total_slots(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|g| g.voices.iter())
            .map(|v| v.slots.len())
            .sum()
    }

    pub fn group_name(&self, handle: VoiceHandle) -> Option<&str> {
        self.groups.get(handle.group).map(|g| g.name.as_str())
    }

    pub fn player(&self, handle: VoiceHandle) -> Option<&P> {
        self.groups
            .get(handle.group)?
            .voices
            .get(handle.file)?
            .slots
            .get(handle.slot)
            .map(|s| &s.player)
    }

    pub fn player_mut(&mut self, handle: VoiceHandle) -> Option<&mut P> {
        self.groups
            .get_mut(handle.group)?
            .voices
            .get_mut(handle.file)?
            .slots
            .get_mut(handle.slot)
            .map(|s| &mut s.player)
    }

    /// When the slot behind `handle` was last handed out.
    pub fn started_ms(&self, handle: VoiceHandle) -> Option<f64> {
        self.groups
            .get(handle.group)?
            .voices
            .get(handle.file)?
            .slots
            .get(handle.slot)
            .map(|s| s.started_ms)
    }

    /// Pick a random file of `group` and return one of its idle slots, or
    /// stop and reuse a busy one according to `policy`. The returned slot is
    /// stamped with `now_ms` but not started. Unavailable players are never
    /// handed out.
    pub fn allocate<R: Rng>(
        &mut self,
        group: &str,
        policy: StealPolicy,
        now_ms: f64,
        rng: &mut R,
    ) -> Option<VoiceHandle> {
        self.pick_slot(group, Some(policy), now_ms, rng)
    }

    /// Like [`SoundBank::allocate`] but only ever returns an idle slot.
    pub fn allocate_idle<R: Rng>(
        &mut self,
        group: &str,
        now_ms: f64,
        rng: &mut R,
    ) -> Option<VoiceHandle> {
        self.pick_slot(group, None, now_ms, rng)
    }

    fn pick_slot<R: Rng>(
        &mut self,
        group: &str,
        steal: Option<StealPolicy>,
        now_ms: f64,
        rng: &mut R,
    ) -> Option<VoiceHandle> {
        let gi = *self.index.get(group)?;
        let voices = &mut self.groups[gi].voices;
        let candidates: SmallVec<[usize; 16]> = voices
            .iter()
            .enumerate()
            .filter(|(_, v)| match steal {
                Some(_) => v.available_count() > 0,
                None => v.slots.iter().any(Slot::is_idle),
            })
            .map(|(i, _)| i)
            .collect();
        let fi = *candidates.choose(rng)?;
        let slots = &mut voices[fi].slots;

        let si = match slots.iter().position(Slot::is_idle) {
            Some(i) => i,
            None => {
                let busy: SmallVec<[usize; 16]> = slots
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.player.is_available())
                    .map(|(i, _)| i)
                    .collect();
                let victim = match steal? {
                    StealPolicy::Oldest => *busy.iter().min_by(|&&a, &&b| {
                        slots[a].started_ms.total_cmp(&slots[b].started_ms)
                    })?,
                    StealPolicy::Arbitrary => *busy.choose(rng)?,
                };
                slots[victim].player.stop();
                log::debug!("[sound] stole {}#{} slot {}", group, fi, victim);
                victim
            }
        };
        slots[si].started_ms = now_ms;
        Some(VoiceHandle {
            group: gi,
            file: fi,
            slot: si,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NoteBinding {
    pub note: u8,
    pub handle: VoiceHandle,
    pub group: String,
    pub volume: f32,
}

#[derive(Clone, Copy, Debug)]
struct PendingRelease {
    handle: VoiceHandle,
    start_ms: f64,
    from_volume: f32,
    duration_ms: f64,
}

#[inline]
pub fn velocity_to_volume(velocity: u8) -> f32 {
    let t = velocity.min(127) as f32 / 127.0;
    VOICE_VOLUME_MIN + (VOICE_VOLUME_MAX - VOICE_VOLUME_MIN) * t
}

/// Playback rate with a slight upward tilt for high notes plus jitter.
#[inline]
fn note_rate<R: Rng>(note: u8, rng: &mut R) -> f32 {
    let tilt = (note as f32 - 60.0) / 127.0 * 0.08;
    (1.0 + tilt + rng.gen_range(-0.04..0.04)).clamp(0.92, 1.08)
}

/// Tracks which voice each sounding note owns and fades released voices out
/// deterministically on [`VoiceAllocator::tick`].
pub struct VoiceAllocator<P> {
    bank: SoundBank<P>,
    bindings: FnvHashMap<u8, NoteBinding>,
    releases: Vec<PendingRelease>,
    policy: StealPolicy,
    fade_ms: f64,
}

impl<P: Player> VoiceAllocator<P> {
    pub fn new(bank: SoundBank<P>, policy: StealPolicy, fade_ms: f64) -> Self {
        Self {
            bank,
            bindings: FnvHashMap::default(),
            releases: Vec::new(),
            policy,
            fade_ms,
        }
    }

    pub fn bank(&self) -> &SoundBank<P> {
        &self.bank
    }

    pub fn binding(&self, note: u8) -> Option<&NoteBinding> {
        self.bindings.get(&note)
    }

    pub fn active_bindings(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_releasing(&self, handle: VoiceHandle) -> bool {
        self.releases.iter().any(|r| r.handle == handle)
    }

    pub fn pending_releases(&self) -> usize {
        self.releases.len()
    }

    /// Start a voice for `note`. A note that is already sounding has its old
    /// voice put into release first, so a note never owns two voices.
    pub fn note_on<R: Rng>(
        &mut self,
        note: u8,
        velocity: u8,
        group: &str,
        now_ms: f64,
        rng: &mut R,
    ) -> Option<VoiceHandle> {
        if let Some(old) = self.bindings.remove(&note) {
            log::debug!("[sound] retrigger note {} releases {:?}", note, old.handle);
            self.begin_release(&old, now_ms);
        }
        let handle = self.bank.allocate(group, self.policy, now_ms, rng)?;
        self.forget(handle);

        let volume = velocity_to_volume(velocity);
        let rate = note_rate(note, rng);
        if let Some(p) = self.bank.player_mut(handle) {
            p.set_volume(volume);
            p.set_rate(rate);
            p.play();
        }
        self.bindings.insert(
            note,
            NoteBinding {
                note,
                handle,
                group: group.to_string(),
                volume,
            },
        );
        Some(handle)
    }

    /// Fade out the voice bound to `note`. Unbound notes are ignored.
    pub fn note_off(&mut self, note: u8, now_ms: f64) -> bool {
        match self.bindings.remove(&note) {
            Some(binding) => {
                self.begin_release(&binding, now_ms);
                true
            }
            None => false,
        }
    }

    /// Fire an unbound sample that plays to its natural end. One-shots only
    /// take idle slots; they never steal from a sounding note.
    pub fn play_one_shot<R: Rng>(
        &mut self,
        group: &str,
        volume: (f32, f32),
        rate: (f32, f32),
        now_ms: f64,
        rng: &mut R,
    ) -> Option<VoiceHandle> {
        let handle = self.bank.allocate_idle(group, now_ms, rng)?;
        self.forget(handle);
        let v = rng.gen_range(volume.0..=volume.1);
        let r = rng.gen_range(rate.0..=rate.1);
        if let Some(p) = self.bank.player_mut(handle) {
            p.set_volume(v);
            p.set_rate(r);
            p.play();
        }
        Some(handle)
    }

    pub fn stop_voice(&mut self, handle: VoiceHandle) {
        self.forget(handle);
        if let Some(p) = self.bank.player_mut(handle) {
            if p.is_playing() {
                p.stop();
            }
        }
    }

    /// Advance release fades; stops players whose fade has completed.
    pub fn tick(&mut self, now_ms: f64) {
        let bank = &mut self.bank;
        self.releases.retain(|r| {
            let Some(p) = bank.player_mut(r.handle) else {
                return false;
            };
            let t = if r.duration_ms > 0.0 {
                ((now_ms - r.start_ms) / r.duration_ms).clamp(0.0, 1.0) as f32
            } else {
                1.0
            };
            if t >= 1.0 {
                p.set_volume(0.0);
                p.stop();
                false
            } else {
                p.set_volume(r.from_volume * (1.0 - t));
                true
            }
        });
    }

    fn begin_release(&mut self, binding: &NoteBinding, now_ms: f64) {
        self.releases.retain(|r| r.handle != binding.handle);
        self.releases.push(PendingRelease {
            handle: binding.handle,
            start_ms: now_ms,
            from_volume: binding.volume,
            duration_ms: self.fade_ms,
        });
    }

    // A reused slot must not keep a stale binding or fade attached to it.
    fn forget(&mut self, handle: VoiceHandle) {
        self.bindings.retain(|_, b| b.handle != handle);
        self.releases.retain(|r| r.handle != handle);
    }
}

/// Background `atmos` layer swapped every 22–40 s plus sparse `shimmer`
/// one-shots. Dormant until [`AtmosphereLoop::start`].
#[derive(Debug, Default)]
pub struct AtmosphereLoop {
    started: bool,
    next_swap_ms: f64,
    next_shimmer_ms: f64,
    current: Option<VoiceHandle>,
    current_started_ms: f64,
}

impl AtmosphereLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn current(&self) -> Option<VoiceHandle> {
        self.current
    }

    pub fn start<R: Rng>(&mut self, now_ms: f64, rng: &mut R) {
        if self.started {
            return;
        }
        self.started = true;
        self.next_swap_ms = now_ms;
        self.next_shimmer_ms = now_ms + rng.gen_range(SHIMMER_EVERY_MS.0..SHIMMER_EVERY_MS.1);
    }

    pub fn tick<P: Player, R: Rng>(
        &mut self,
        voices: &mut VoiceAllocator<P>,
        now_ms: f64,
        rng: &mut R,
    ) {
        if !self.started {
            return;
        }
        if now_ms >= self.next_swap_ms {
            if let Some(old) = self.current.take() {
                // the slot may have been handed to a note since
                if voices.bank().started_ms(old) == Some(self.current_started_ms) {
                    voices.stop_voice(old);
                } else {
                    log::debug!("[sound] atmos bed {:?} was reclaimed", old);
                }
            }
            self.current =
                voices.play_one_shot(ATMOS_GROUP, (0.04, 0.12), (0.85, 1.15), now_ms, rng);
            self.current_started_ms = now_ms;
            self.next_swap_ms = now_ms + rng.gen_range(ATMOS_SWAP_MS.0..ATMOS_SWAP_MS.1);
        }
        if now_ms >= self.next_shimmer_ms {
            if rng.gen_bool(SHIMMER_CHANCE) {
                voices.play_one_shot(SHIMMER_GROUP, (0.05, 0.16), (0.9, 1.2), now_ms, rng);
            }
            self.next_shimmer_ms =
                now_ms + rng.gen_range(SHIMMER_EVERY_MS.0..SHIMMER_EVERY_MS.1);
        }
    }
}
