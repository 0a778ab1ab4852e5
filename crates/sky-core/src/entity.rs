//! Short-lived visual entities. Every entity is pure time-to-live: it fades
//! with its age fraction and is culled once its age exceeds its lifespan.

use crate::mode::{AttractorSet, Mode};
use crate::motion::{profile_for, MotionContext};
use glam::Vec3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lifetime {
    pub birth_ms: f64,
    pub lifespan_ms: f64,
}

impl Lifetime {
    pub fn new(birth_ms: f64, lifespan_ms: f64) -> Self {
        Self {
            birth_ms,
            lifespan_ms,
        }
    }

    #[inline]
    pub fn age(&self, now_ms: f64) -> f64 {
        (now_ms - self.birth_ms).max(0.0)
    }

    /// Age over lifespan; exceeds 1 after expiry.
    #[inline]
    pub fn fraction(&self, now_ms: f64) -> f32 {
        if self.lifespan_ms <= 0.0 {
            return 1.0;
        }
        (self.age(now_ms) / self.lifespan_ms) as f32
    }

    #[inline]
    pub fn alpha(&self, now_ms: f64) -> f32 {
        (1.0 - self.fraction(now_ms)).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn is_expired(&self, now_ms: f64) -> bool {
        self.age(now_ms) > self.lifespan_ms
    }
}

/// Kinematic state shared by every entity variant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub pos: Vec3,
    pub vel: Vec3,
    /// Spawn center the motion profile may orbit or fall toward.
    pub anchor: Vec3,
    /// Per-entity phase offset for the periodic drift terms.
    pub phase: f32,
}

impl Body {
    pub fn at(pos: Vec3, anchor: Vec3, phase: f32) -> Self {
        Self {
            pos,
            vel: Vec3::ZERO,
            anchor,
            phase,
        }
    }

    pub fn with_velocity(mut self, vel: Vec3) -> Self {
        self.vel = vel;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Geometry {
    Sphere,
    Box,
    Tetra,
}

impl Geometry {
    /// `(seed + note + velocity) % 3`.
    pub fn pick(seed: u32, note: u8, velocity: u8) -> Self {
        match (seed as u64 + note as u64 + velocity as u64) % 3 {
            0 => Geometry::Sphere,
            1 => Geometry::Box,
            _ => Geometry::Tetra,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Shape {
    pub body: Body,
    pub spin: Vec3,
    pub rotation: Vec3,
    pub size: f32,
    pub hue: f32,
    pub saturation: f32,
    pub brightness: f32,
    pub alpha: f32,
    pub geometry: Geometry,
    pub mode: Mode,
    pub life: Lifetime,
    pub note: u8,
}

impl Shape {
    pub fn update(&mut self, ctx: &MotionContext) {
        let t = self.life.fraction(ctx.now_ms);
        self.alpha = self.life.alpha(ctx.now_ms);
        profile_for(self.mode).advance(&mut self.body, t, None, ctx);
        self.rotation += self.spin;
        self.spin *= 0.99;
    }

    /// Rendered size shrinks toward 55% as the shape fades.
    #[inline]
    pub fn display_size(&self) -> f32 {
        self.size * (0.55 + self.alpha * 0.65)
    }
}

#[derive(Clone, Debug)]
pub struct Particle {
    pub body: Body,
    pub radius: f32,
    pub hue: f32,
    pub alpha: f32,
    pub mode: Mode,
    pub life: Lifetime,
    pub attractor: Option<usize>,
}

impl Particle {
    pub fn update(&mut self, ctx: &MotionContext) {
        let t = self.life.fraction(ctx.now_ms);
        self.alpha = self.life.alpha(ctx.now_ms);
        let target = self
            .attractor
            .and_then(|i| live_point(ctx.attractors, ctx.now_ms, i));
        profile_for(self.mode).advance(&mut self.body, t, target, ctx);
    }
}

#[inline]
fn live_point(set: Option<&AttractorSet>, now_ms: f64, i: usize) -> Option<Vec3> {
    set.filter(|s| s.is_live(now_ms))
        .and_then(|s| s.points.get(i).copied())
}

/// A line between two drifting endpoints.
#[derive(Clone, Debug)]
pub struct Connector {
    pub a: Body,
    pub b: Body,
    pub hue: f32,
    pub alpha: f32,
    pub weight: f32,
    pub mode: Mode,
    pub life: Lifetime,
}

impl Connector {
    pub fn update(&mut self, ctx: &MotionContext) {
        let t = self.life.fraction(ctx.now_ms);
        self.alpha = self.life.alpha(ctx.now_ms);
        let profile = profile_for(self.mode);
        profile.advance(&mut self.a, t, None, ctx);
        profile.advance(&mut self.b, t, None, ctx);
    }
}
