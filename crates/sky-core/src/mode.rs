//! The "surprise engine": picks a visual mode per note from a weight table
//! built from discretized world conditions, holds it for a few seconds, and
//! occasionally drifts to a random mode when idle.

use crate::world::WorldState;
use glam::Vec3;
use rand::prelude::*;
use smallvec::SmallVec;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    Nebula,
    Architecture,
    Synaptic,
    OrbitalRing,
    Spiral,
    StormField,
    GravityWell,
    Clusters,
    Membrane,
}

impl Mode {
    pub const ALL: [Mode; 9] = [
        Mode::Nebula,
        Mode::Architecture,
        Mode::Synaptic,
        Mode::OrbitalRing,
        Mode::Spiral,
        Mode::StormField,
        Mode::GravityWell,
        Mode::Clusters,
        Mode::Membrane,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Nebula => "nebula",
            Mode::Architecture => "architecture",
            Mode::Synaptic => "synaptic",
            Mode::OrbitalRing => "orbital_ring",
            Mode::Spiral => "spiral",
            Mode::StormField => "storm_field",
            Mode::GravityWell => "gravity_well",
            Mode::Clusters => "clusters",
            Mode::Membrane => "membrane",
        }
    }

    /// Sample group this mode prefers for note voices.
    pub fn sound_group(self) -> &'static str {
        match self {
            Mode::Nebula | Mode::Membrane => "pad",
            Mode::Architecture | Mode::OrbitalRing => "glass",
            Mode::Synaptic | Mode::Clusters => "pluck",
            Mode::StormField | Mode::GravityWell => "noise",
            Mode::Spiral => "shimmer",
        }
    }

    pub fn uses_attractors(self) -> bool {
        matches!(self, Mode::Clusters | Mode::Membrane)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wind {
    Calm,
    Breezy,
    Gale,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Temperature {
    Cold,
    Mild,
    Hot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    Low,
    Mid,
    High,
}

/// World state and note reduced to the buckets the weight table is keyed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Conditions {
    pub wind: Wind,
    pub humid: bool,
    pub temperature: Temperature,
    pub register: Register,
    pub hard: bool,
    pub night: bool,
    pub overcast: bool,
}

impl Conditions {
    pub fn new(world: &WorldState, note: u8, velocity: u8) -> Self {
        let wind = if world.wind_kmh >= 30.0 {
            Wind::Gale
        } else if world.wind_kmh >= 12.0 {
            Wind::Breezy
        } else {
            Wind::Calm
        };
        let temperature = if world.temperature_c < 5.0 {
            Temperature::Cold
        } else if world.temperature_c > 26.0 {
            Temperature::Hot
        } else {
            Temperature::Mild
        };
        let register = if note < 48 {
            Register::Low
        } else if note >= 72 {
            Register::High
        } else {
            Register::Mid
        };
        Self {
            wind,
            humid: world.humidity_pct > 70.0,
            temperature,
            register,
            hard: velocity > 100,
            night: !world.is_day,
            overcast: world.cloud_cover_pct > 60.0,
        }
    }
}

/// Integer weight per mode, indexed by [`Mode::index`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeWeights(pub [u32; 9]);

impl ModeWeights {
    #[inline]
    pub fn get(&self, mode: Mode) -> u32 {
        self.0[mode.index()]
    }

    #[inline]
    fn add(&mut self, mode: Mode, w: u32) {
        self.0[mode.index()] += w;
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    /// Draw from the table plus one extra "variety" slot that resolves to a
    /// uniformly random mode.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Mode {
        let total = self.total();
        let mut r = rng.gen_range(0..=total);
        if r == total {
            return Mode::ALL[rng.gen_range(0..Mode::ALL.len())];
        }
        for mode in Mode::ALL {
            let w = self.get(mode);
            if r < w {
                return mode;
            }
            r -= w;
        }
        Mode::Nebula
    }
}

/// Base set plus threshold additions. Pure, so tables can be checked per
/// bucket combination.
pub fn mode_weights(c: Conditions) -> ModeWeights {
    let mut w = ModeWeights([0; 9]);
    for base in [
        Mode::Nebula,
        Mode::Architecture,
        Mode::Synaptic,
        Mode::OrbitalRing,
    ] {
        w.add(base, 1);
    }
    match c.wind {
        Wind::Gale => {
            w.add(Mode::StormField, 3);
            w.add(Mode::Spiral, 1);
        }
        Wind::Breezy => w.add(Mode::Spiral, 1),
        Wind::Calm => w.add(Mode::Architecture, 1),
    }
    if c.humid {
        w.add(Mode::Membrane, 2);
        w.add(Mode::Nebula, 1);
    }
    match c.temperature {
        Temperature::Cold => {
            w.add(Mode::Clusters, 2);
            w.add(Mode::Architecture, 1);
        }
        Temperature::Hot => w.add(Mode::GravityWell, 1),
        Temperature::Mild => {}
    }
    match c.register {
        Register::Low => w.add(Mode::GravityWell, 2),
        Register::High => {
            w.add(Mode::Synaptic, 1);
            w.add(Mode::OrbitalRing, 1);
        }
        Register::Mid => {}
    }
    if c.hard {
        w.add(Mode::StormField, 1);
    }
    if c.night {
        w.add(Mode::Nebula, 1);
        w.add(Mode::Clusters, 1);
    }
    if c.overcast {
        w.add(Mode::Membrane, 1);
    }
    w
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveMode {
    pub mode: Mode,
    pub expires_ms: f64,
}

/// Shared pull targets for cluster and membrane particles.
#[derive(Clone, Debug, PartialEq)]
pub struct AttractorSet {
    pub points: SmallVec<[Vec3; 8]>,
    pub expires_ms: f64,
}

impl AttractorSet {
    #[inline]
    pub fn is_live(&self, now_ms: f64) -> bool {
        now_ms <= self.expires_ms
    }

    pub fn generate<R: Rng>(mode: Mode, anchor: Vec3, expires_ms: f64, rng: &mut R) -> Self {
        let points = match mode {
            Mode::Membrane => {
                let n = rng.gen_range(4..=7);
                (0..n)
                    .map(|_| {
                        anchor
                            + Vec3::new(
                                rng.gen_range(-220.0..220.0),
                                rng.gen_range(-18.0..18.0),
                                rng.gen_range(-220.0..220.0),
                            )
                    })
                    .collect()
            }
            _ => {
                let n = rng.gen_range(3..=6);
                (0..n)
                    .map(|_| {
                        anchor
                            + Vec3::new(
                                rng.gen_range(-180.0..180.0),
                                rng.gen_range(-140.0..140.0),
                                rng.gen_range(-180.0..180.0),
                            )
                    })
                    .collect()
            }
        };
        Self { points, expires_ms }
    }
}

pub struct ModeSelector {
    active: ActiveMode,
    attractors: Option<AttractorSet>,
    hold_ms: (f64, f64),
    idle_chance: f64,
}

impl ModeSelector {
    pub fn new(hold_ms: (f64, f64), idle_chance: f64) -> Self {
        Self {
            active: ActiveMode {
                mode: Mode::Nebula,
                expires_ms: 0.0,
            },
            attractors: None,
            hold_ms,
            idle_chance,
        }
    }

    #[inline]
    pub fn active(&self) -> ActiveMode {
        self.active
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.active.mode
    }

    pub fn attractors(&self) -> Option<&AttractorSet> {
        self.attractors.as_ref()
    }

    /// The most recent note wins immediately.
    pub fn on_note<R: Rng>(
        &mut self,
        world: &WorldState,
        note: u8,
        velocity: u8,
        anchor: Vec3,
        now_ms: f64,
        rng: &mut R,
    ) -> Mode {
        let mode = mode_weights(Conditions::new(world, note, velocity)).sample(rng);
        self.enter(mode, anchor, now_ms, rng);
        mode
    }

    /// Idle drift: after expiry, re-roll uniformly with a small chance per call.
    pub fn tick_idle<R: Rng>(&mut self, anchor: Vec3, now_ms: f64, rng: &mut R) -> Option<Mode> {
        if now_ms <= self.active.expires_ms || !rng.gen_bool(self.idle_chance.clamp(0.0, 1.0)) {
            return None;
        }
        let mode = Mode::ALL[rng.gen_range(0..Mode::ALL.len())];
        self.enter(mode, anchor, now_ms, rng);
        log::debug!("[mode] idle drift -> {}", mode);
        Some(mode)
    }

    fn enter<R: Rng>(&mut self, mode: Mode, anchor: Vec3, now_ms: f64, rng: &mut R) {
        let (lo, hi) = self.hold_ms;
        let hold = if hi > lo { rng.gen_range(lo..hi) } else { lo };
        self.active = ActiveMode {
            mode,
            expires_ms: now_ms + hold,
        };
        if mode.uses_attractors() {
            let set = AttractorSet::generate(mode, anchor, self.active.expires_ms, rng);
            self.attractors = Some(set);
        }
    }
}
