//! The application context. One `SkyEngine` per front end owns every
//! component; the front end only feeds it events, time and fetched bodies.

use crate::config::EngineParams;
use crate::constants::{
    AMBIENT_SPAWN_EVERY_MS, ATMOS_GROUP, FALLBACK_SOUND_GROUP, GLASS_HIT_CHANCE,
};
use crate::input::NoteEvent;
use crate::mode::{Mode, ModeSelector};
use crate::motion::MotionContext;
use crate::pool::EntityPool;
use crate::scene::{build_instances, InstanceData};
use crate::seed::QuantumSeed;
use crate::sound::{AtmosphereLoop, Player, SoundBank, VoiceAllocator, VoiceHandle};
use crate::spawn::{anchor_point, spawn, spawn_ambient, SpawnRequest};
use crate::synth::{GlobalEnergy, SynthPatch};
use crate::world::{Feed, WorldError, WorldState, WorldUpdater};
use rand::prelude::*;
use smallvec::SmallVec;

/// What a note-on did, so the front end can layer its own synth voice.
#[derive(Clone, Debug)]
pub struct NoteOutcome {
    pub note: u8,
    pub mode: Mode,
    pub voice: Option<VoiceHandle>,
    pub group: Option<String>,
    pub spawned: usize,
    pub patch: SynthPatch,
}

pub struct SkyEngine<P: Player> {
    params: EngineParams,
    world: WorldUpdater,
    voices: VoiceAllocator<P>,
    atmosphere: AtmosphereLoop,
    selector: ModeSelector,
    pool: EntityPool,
    energy: GlobalEnergy,
    seed: QuantumSeed,
    rng: StdRng,
    frame: u64,
    next_ambient_ms: f64,
}

impl<P: Player> SkyEngine<P> {
    pub fn new(params: EngineParams, bank: SoundBank<P>, seed: QuantumSeed, rng: StdRng) -> Self {
        log::info!(
            "[engine] {} sample slots, seed {}, caps {:?}",
            bank.total_slots(),
            seed.value,
            params.caps
        );
        Self {
            world: WorldUpdater::new(params.weather_refresh_ms, params.iss_refresh_ms),
            voices: VoiceAllocator::new(bank, params.steal_policy, params.release_fade_ms),
            atmosphere: AtmosphereLoop::new(),
            selector: ModeSelector::new(params.mode_hold_ms, params.idle_reroll_chance),
            pool: EntityPool::new(params.caps),
            energy: GlobalEnergy::default(),
            seed,
            rng,
            frame: 0,
            next_ambient_ms: 0.0,
            params,
        }
    }

    /// Begin the atmosphere layer. Front ends call this once audio is unlocked.
    pub fn start_audio(&mut self, now_ms: f64) {
        self.atmosphere.start(now_ms, &mut self.rng);
    }

    /// Mode group, then the fallback group, then any playable group other
    /// than the atmosphere bed.
    fn resolve_group(&self, mode: Mode) -> Option<String> {
        let bank = self.voices.bank();
        [mode.sound_group(), FALLBACK_SOUND_GROUP]
            .into_iter()
            .find(|g| bank.has_playable(g))
            .map(str::to_string)
            .or_else(|| {
                bank.group_names()
                    .find(|g| *g != ATMOS_GROUP && bank.has_playable(g))
                    .map(str::to_string)
            })
    }

    pub fn note_on(&mut self, note: u8, velocity: u8, now_ms: f64) -> NoteOutcome {
        let note = note.min(127);
        let velocity = velocity.min(127);
        let world = *self.world.state();
        let anchor = anchor_point(&world);
        let mode = self
            .selector
            .on_note(&world, note, velocity, anchor, now_ms, &mut self.rng);

        let group = self.resolve_group(mode);
        let voice = group
            .as_deref()
            .and_then(|g| self.voices.note_on(note, velocity, g, now_ms, &mut self.rng));
        if self.voices.bank().has_playable(FALLBACK_SOUND_GROUP)
            && self.rng.gen_bool(GLASS_HIT_CHANCE)
        {
            self.voices.play_one_shot(
                FALLBACK_SOUND_GROUP,
                (0.06, 0.2),
                (0.9, 1.2),
                now_ms,
                &mut self.rng,
            );
        }

        let spawned = spawn(
            &mut self.pool,
            SpawnRequest {
                note,
                velocity,
                mode,
                now_ms,
                seed: self.seed.value,
            },
            &world,
            self.selector.attractors(),
            &mut self.rng,
        );
        self.energy.note_on(velocity);
        log::debug!(
            "[engine] note {} vel {} -> {} ({:?}), {} entities",
            note,
            velocity,
            mode,
            group,
            spawned
        );
        NoteOutcome {
            note,
            mode,
            voice,
            group,
            spawned,
            patch: SynthPatch::for_note(note, velocity, self.seed.value, self.frame),
        }
    }

    /// Returns whether a sounding voice was released.
    pub fn note_off(&mut self, note: u8, now_ms: f64) -> bool {
        let released = self.voices.note_off(note, now_ms);
        if self.energy.note_off() {
            log::trace!("[engine] energy fell silent");
        }
        released
    }

    pub fn handle(&mut self, event: NoteEvent, now_ms: f64) -> Option<NoteOutcome> {
        match event {
            NoteEvent::On { note, velocity } => Some(self.note_on(note, velocity, now_ms)),
            NoteEvent::Off { note } => {
                self.note_off(note, now_ms);
                None
            }
        }
    }

    /// Advance one frame: fades, atmosphere, idle drift, ambient population,
    /// motion, render instances, then cull.
    pub fn frame(&mut self, now_ms: f64, instances: &mut Vec<InstanceData>) {
        self.frame += 1;
        self.voices.tick(now_ms);
        self.atmosphere.tick(&mut self.voices, now_ms, &mut self.rng);

        let world = *self.world.state();
        let anchor = anchor_point(&world);
        self.selector.tick_idle(anchor, now_ms, &mut self.rng);

        if now_ms >= self.next_ambient_ms {
            spawn_ambient(
                &mut self.pool,
                self.selector.mode(),
                &world,
                self.seed.value,
                now_ms,
                &mut self.rng,
            );
            self.next_ambient_ms = now_ms + AMBIENT_SPAWN_EVERY_MS;
        }

        self.energy.decay_frame();
        let ctx = MotionContext {
            now_ms,
            frame: self.frame,
            seed: self.seed.value,
            wind_kmh: world.wind_kmh,
            attractors: self.selector.attractors(),
        };
        self.pool.update(&ctx);
        build_instances(&self.pool, self.energy.value(), &ctx, instances);
        self.pool.cull(now_ms);
    }

    pub fn due_feeds(&mut self, now_ms: f64) -> SmallVec<[Feed; 2]> {
        self.world.due_feeds(now_ms)
    }

    pub fn ingest(&mut self, feed: Feed, body: Result<&str, &str>) -> Result<(), WorldError> {
        self.world.ingest(feed, body)
    }

    pub fn feed_url(&self, feed: Feed) -> String {
        match feed {
            Feed::Weather => self.params.weather_url(),
            Feed::Satellite => self.params.satellite_url(),
        }
    }

    pub fn set_quantum_seed(&mut self, seed: QuantumSeed) {
        log::info!("[engine] quantum seed {} ({})", seed.value, seed.binary);
        self.seed = seed;
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn world(&self) -> &WorldState {
        self.world.state()
    }

    pub fn voices(&self) -> &VoiceAllocator<P> {
        &self.voices
    }

    pub fn selector(&self) -> &ModeSelector {
        &self.selector
    }

    pub fn mode(&self) -> Mode {
        self.selector.mode()
    }

    pub fn pool(&self) -> &EntityPool {
        &self.pool
    }

    pub fn energy(&self) -> f32 {
        self.energy.value()
    }

    /// True once note-offs have let the energy decay; front ends release
    /// their synth voice then.
    pub fn is_silent(&self) -> bool {
        self.energy.is_silent()
    }

    pub fn seed(&self) -> &QuantumSeed {
        &self.seed
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn atmosphere(&self) -> &AtmosphereLoop {
        &self.atmosphere
    }
}
