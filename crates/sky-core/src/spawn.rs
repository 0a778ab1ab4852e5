//! Entity spawner: one bespoke placement formula set per mode, all centered
//! on the anchor point derived from the satellite position and cloud cover.

use crate::constants::*;
use crate::entity::{Body, Connector, Geometry, Lifetime, Particle, Shape};
use crate::mode::{AttractorSet, Mode};
use crate::pool::EntityPool;
use crate::seed::seed_hue_offset;
use crate::world::WorldState;
use glam::Vec3;
use rand::prelude::*;
use std::f32::consts::TAU;

#[derive(Clone, Copy, Debug)]
pub struct SpawnRequest {
    pub note: u8,
    pub velocity: u8,
    pub mode: Mode,
    pub now_ms: f64,
    pub seed: u32,
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Linear map with the input clamped to its range.
#[inline]
pub fn map_clamped(v: f32, in_lo: f32, in_hi: f32, out_lo: f32, out_hi: f32) -> f32 {
    let t = ((v - in_lo) / (in_hi - in_lo)).clamp(0.0, 1.0);
    lerp(out_lo, out_hi, t)
}

/// Longitude → x, latitude → y (north up, screen y grows down), cloud → z.
pub fn anchor_point(world: &WorldState) -> Vec3 {
    Vec3::new(
        map_clamped(world.iss_longitude, -180.0, 180.0, -ANCHOR_HALF_X, ANCHOR_HALF_X),
        map_clamped(world.iss_latitude, -90.0, 90.0, ANCHOR_HALF_Y, -ANCHOR_HALF_Y),
        map_clamped(world.cloud_cover_pct, 0.0, 100.0, -ANCHOR_HALF_Z, ANCHOR_HALF_Z),
    )
}

/// Note hue: low notes blue, high notes magenta, rotated by the seed and
/// warmed slightly by temperature.
pub fn note_hue(note: u8, seed: u32, temperature_c: f32) -> f32 {
    let base = map_clamped(note as f32, 21.0, 108.0, 210.0, 360.0);
    let warm = (temperature_c - 15.0).clamp(-30.0, 30.0) * 1.5;
    (base + seed_hue_offset(seed) + warm).rem_euclid(360.0)
}

fn random_dir<R: Rng>(rng: &mut R) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let l2 = v.length_squared();
        if l2 > 1e-4 && l2 <= 1.0 {
            return v / l2.sqrt();
        }
    }
}

#[inline]
fn count(lo: f32, hi: f32, t: f32) -> usize {
    lerp(lo, hi, t).round().max(1.0) as usize
}

struct Batch<'r, R: Rng> {
    rng: &'r mut R,
    anchor: Vec3,
    vel_t: f32,
    hue: f32,
    right_hand: bool,
    req: SpawnRequest,
    wind_kmh: f32,
    spawned: usize,
}

impl<'r, R: Rng> Batch<'r, R> {
    fn signed(&mut self, n: f32) -> f32 {
        self.rng.gen_range(-n..n)
    }

    fn push_shape(&mut self, pool: &mut EntityPool, pos: Vec3, scale: f32, geometry: Geometry) {
        let spin = Vec3::new(self.signed(0.02), self.signed(0.02), self.signed(0.02));
        pool.shapes.push(Shape {
            body: Body::at(pos, self.anchor, self.req.note as f32),
            spin,
            rotation: Vec3::ZERO,
            size: lerp(16.0, 110.0, self.vel_t) * scale,
            hue: self.hue,
            saturation: if self.right_hand { 55.0 } else { 35.0 },
            brightness: if self.right_hand { 95.0 } else { 75.0 },
            alpha: 1.0,
            geometry,
            mode: self.req.mode,
            life: Lifetime::new(self.req.now_ms, lerp(700.0, 2600.0, self.vel_t) as f64),
            note: self.req.note,
        });
        self.spawned += 1;
    }

    fn push_particle(
        &mut self,
        pool: &mut EntityPool,
        pos: Vec3,
        vel: Vec3,
        attractor: Option<usize>,
    ) {
        let radius = lerp(1.5, 5.0, self.vel_t) * self.rng.gen_range(0.7..1.3);
        let hue = self.hue + self.signed(15.0);
        let lifespan = lerp(1200.0, 4200.0, self.vel_t) * self.rng.gen_range(0.8..1.2);
        let phase = self.rng.gen_range(0.0..TAU);
        pool.particles.push(Particle {
            body: Body::at(pos, self.anchor, phase).with_velocity(vel),
            radius,
            hue,
            alpha: 1.0,
            mode: self.req.mode,
            life: Lifetime::new(self.req.now_ms, lifespan as f64),
            attractor,
        });
        self.spawned += 1;
    }

    fn push_connector(&mut self, pool: &mut EntityPool, a: Vec3, b: Vec3) {
        let phase = self.rng.gen_range(0.0..TAU);
        pool.connectors.push(Connector {
            a: Body::at(a, self.anchor, phase),
            b: Body::at(b, self.anchor, phase + 1.3),
            hue: self.hue + 20.0,
            alpha: 1.0,
            weight: lerp(0.6, 2.0, self.vel_t),
            mode: self.req.mode,
            life: Lifetime::new(self.req.now_ms, lerp(600.0, 1800.0, self.vel_t) as f64),
        });
        self.spawned += 1;
    }

    fn scatter(&mut self, radius: f32) -> Vec3 {
        let r = radius * self.rng.gen::<f32>().cbrt();
        self.anchor + random_dir(self.rng) * r
    }
}

/// Spawn the batch for `req.mode`, then trim every list to its cap.
/// Returns the number of entities created.
pub fn spawn<R: Rng>(
    pool: &mut EntityPool,
    req: SpawnRequest,
    world: &WorldState,
    attractors: Option<&AttractorSet>,
    rng: &mut R,
) -> usize {
    let mut b = Batch {
        rng,
        anchor: anchor_point(world),
        vel_t: req.velocity.min(127) as f32 / 127.0,
        hue: note_hue(req.note, req.seed, world.temperature_c),
        right_hand: req.note >= RIGHT_HAND_SPLIT,
        req,
        wind_kmh: world.wind_kmh,
        spawned: 0,
    };
    let live = attractors.filter(|a| a.is_live(req.now_ms) && !a.points.is_empty());

    match req.mode {
        Mode::Nebula => nebula(&mut b, pool),
        Mode::Architecture => architecture(&mut b, pool),
        Mode::Synaptic => synaptic(&mut b, pool),
        Mode::OrbitalRing => orbital_ring(&mut b, pool),
        Mode::Spiral => spiral(&mut b, pool),
        Mode::StormField => storm_field(&mut b, pool),
        Mode::GravityWell => gravity_well(&mut b, pool),
        Mode::Clusters => clusters(&mut b, pool, live),
        Mode::Membrane => membrane(&mut b, pool, live),
    }
    let dropped = pool.trim();
    if dropped > 0 {
        log::trace!("[spawn] trimmed {} oldest entities", dropped);
    }
    b.spawned
}

fn nebula<R: Rng>(b: &mut Batch<R>, pool: &mut EntityPool) {
    b.push_shape(pool, b.anchor, 0.8, Geometry::Sphere);
    let n = count(30.0, 90.0, b.vel_t);
    for _ in 0..n {
        let radius = b.rng.gen_range(60.0..160.0);
        let pos = b.scatter(radius);
        let vel = random_dir(b.rng) * 0.3;
        b.push_particle(pool, pos, vel, None);
    }
}

fn architecture<R: Rng>(b: &mut Batch<R>, pool: &mut EntityPool) {
    let geometry = match Geometry::pick(b.req.seed, b.req.note, b.req.velocity) {
        Geometry::Sphere => Geometry::Box,
        g => g,
    };
    let floors = count(2.0, 5.0, b.vel_t);
    let size = lerp(16.0, 110.0, b.vel_t);
    let mut prev: Option<Vec3> = None;
    for i in 0..floors {
        let pos = b.anchor
            + Vec3::new(
                b.signed(30.0),
                -(i as f32) * size * 0.9,
                b.signed(30.0),
            );
        b.push_shape(pool, pos, 1.0 - i as f32 * 0.12, geometry);
        if let Some(p) = prev {
            b.push_connector(pool, p, pos);
        }
        prev = Some(pos);
    }
    for _ in 0..8 {
        let pos = b.scatter(size * 2.0);
        b.push_particle(pool, pos, Vec3::ZERO, None);
    }
}

fn synaptic<R: Rng>(b: &mut Batch<R>, pool: &mut EntityPool) {
    let n = count(6.0, 14.0, b.vel_t);
    let nodes: Vec<Vec3> = (0..n).map(|_| b.scatter(200.0)).collect();
    for &pos in &nodes {
        let vel = random_dir(b.rng) * 0.8;
        b.push_particle(pool, pos, vel, None);
    }
    for (i, &from) in nodes.iter().enumerate() {
        let links = b.rng.gen_range(1..=2);
        for _ in 0..links {
            let j = b.rng.gen_range(0..nodes.len());
            if j != i {
                b.push_connector(pool, from, nodes[j]);
            }
        }
    }
}

fn orbital_ring<R: Rng>(b: &mut Batch<R>, pool: &mut EntityPool) {
    b.push_shape(pool, b.anchor, 0.6, Geometry::Sphere);
    let n = count(24.0, 72.0, b.vel_t);
    let radius = lerp(80.0, 200.0, b.vel_t);
    let tilt = b.signed(0.5);
    let (ts, tc) = tilt.sin_cos();
    for i in 0..n {
        let theta = i as f32 / n as f32 * TAU;
        let (s, c) = theta.sin_cos();
        let pos = b.anchor + Vec3::new(radius * c, radius * s * ts, radius * s * tc);
        b.push_particle(pool, pos, Vec3::ZERO, None);
    }
}

fn spiral<R: Rng>(b: &mut Batch<R>, pool: &mut EntityPool) {
    let n = count(30.0, 90.0, b.vel_t);
    let twist = b.rng.gen_range(0.0..TAU);
    for i in 0..n {
        let theta = twist + i as f32 * 0.35;
        let r = 8.0 + i as f32 * 3.0;
        let pos = b.anchor + Vec3::new(r * theta.cos(), n as f32 - i as f32 * 2.0, r * theta.sin());
        b.push_particle(pool, pos, Vec3::ZERO, None);
    }
}

fn storm_field<R: Rng>(b: &mut Batch<R>, pool: &mut EntityPool) {
    let n = count(40.0, 120.0, b.vel_t);
    let gust = 1.0 + b.wind_kmh / 40.0;
    for _ in 0..n {
        let pos = b.scatter(12.0);
        let speed = b.rng.gen_range(2.0..6.0) * (0.5 + b.vel_t) * gust;
        let vel = random_dir(b.rng) * speed;
        b.push_particle(pool, pos, vel, None);
    }
    let shards = 1 + (b.vel_t > 0.7) as usize;
    for _ in 0..shards {
        let pos = b.scatter(40.0);
        b.push_shape(pool, pos, 0.5, Geometry::Tetra);
        if let Some(s) = pool.shapes.last_mut() {
            s.spin *= 3.0;
        }
    }
}

fn gravity_well<R: Rng>(b: &mut Batch<R>, pool: &mut EntityPool) {
    b.push_shape(pool, b.anchor, 0.4, Geometry::Sphere);
    let n = count(30.0, 80.0, b.vel_t);
    for _ in 0..n {
        let dir = random_dir(b.rng);
        let pos = b.anchor + dir * b.rng.gen_range(180.0..260.0);
        let tangent = dir.cross(Vec3::Y).normalize_or_zero();
        let vel = tangent * b.rng.gen_range(1.0..2.5);
        b.push_particle(pool, pos, vel, None);
    }
}

fn clusters<R: Rng>(b: &mut Batch<R>, pool: &mut EntityPool, attractors: Option<&AttractorSet>) {
    let n = count(40.0, 100.0, b.vel_t);
    let slots = attractors.map(|a| a.points.len()).unwrap_or(0);
    for i in 0..n {
        let pos = b.scatter(250.0);
        let attractor = (slots > 0).then_some(i % slots.max(1));
        b.push_particle(pool, pos, Vec3::ZERO, attractor);
    }
}

fn membrane<R: Rng>(b: &mut Batch<R>, pool: &mut EntityPool, attractors: Option<&AttractorSet>) {
    let n = count(50.0, 120.0, b.vel_t);
    let slots = attractors.map(|a| a.points.len()).unwrap_or(0);
    for _ in 0..n {
        let r = b.rng.gen::<f32>().sqrt() * 240.0;
        let theta = b.rng.gen_range(0.0..TAU);
        let y = b.signed(6.0);
        let pos = b.anchor + Vec3::new(r * theta.cos(), y, r * theta.sin());
        let attractor = (slots > 0).then(|| b.rng.gen_range(0..slots));
        b.push_particle(pool, pos, Vec3::ZERO, attractor);
    }
}

/// Faint baseline particles so the scene never goes fully dark.
pub fn spawn_ambient<R: Rng>(
    pool: &mut EntityPool,
    mode: Mode,
    world: &WorldState,
    seed: u32,
    now_ms: f64,
    rng: &mut R,
) -> usize {
    let anchor = anchor_point(world);
    let hue = note_hue(60, seed, world.temperature_c);
    for _ in 0..AMBIENT_PARTICLES {
        let pos = anchor + random_dir(rng) * rng.gen_range(40.0..300.0);
        let phase = rng.gen_range(0.0..TAU);
        pool.particles.push(Particle {
            body: Body::at(pos, anchor, phase).with_velocity(random_dir(rng) * 0.15),
            radius: rng.gen_range(1.0..2.5),
            hue: hue + rng.gen_range(-30.0..30.0),
            alpha: 1.0,
            mode,
            life: Lifetime::new(now_ms, rng.gen_range(2_500.0..5_000.0)),
            attractor: None,
        });
    }
    pool.trim();
    AMBIENT_PARTICLES
}
