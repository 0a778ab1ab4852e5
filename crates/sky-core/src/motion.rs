//! One motion profile per mode: how a body moves each frame and how its
//! color evolves over its life. Steps are per frame, in sketch units.

use crate::entity::Body;
use crate::mode::{AttractorSet, Mode};
use crate::seed::{seed_noise, signed_seed_noise};
use glam::Vec3;

/// Read-only frame inputs for motion profiles.
pub struct MotionContext<'a> {
    pub now_ms: f64,
    pub frame: u64,
    pub seed: u32,
    pub wind_kmh: f32,
    pub attractors: Option<&'a AttractorSet>,
}

/// Hue in degrees, saturation and brightness in percent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsb {
    pub h: f32,
    pub s: f32,
    pub b: f32,
}

impl Hsb {
    #[inline]
    pub fn new(h: f32, s: f32, b: f32) -> Self {
        Self {
            h: h.rem_euclid(360.0),
            s: s.clamp(0.0, 100.0),
            b: b.clamp(0.0, 100.0),
        }
    }
}

pub trait MotionProfile: Sync {
    /// Advance `body` by one frame. `t` is the entity's age fraction and
    /// `target` an optional live attractor.
    fn advance(&self, body: &mut Body, t: f32, target: Option<Vec3>, ctx: &MotionContext);

    fn color(&self, hue: f32, t: f32, ctx: &MotionContext) -> Hsb;
}

pub fn profile_for(mode: Mode) -> &'static dyn MotionProfile {
    match mode {
        Mode::Nebula => &NebulaDrift,
        Mode::Architecture => &ArchitectureDrift,
        Mode::Synaptic => &SynapticFlicker,
        Mode::OrbitalRing => &OrbitalSpin,
        Mode::Spiral => &SpiralRise,
        Mode::StormField => &StormGust,
        Mode::GravityWell => &GravityPull,
        Mode::Clusters => &ClusterConverge,
        Mode::Membrane => &MembraneCurl,
    }
}

#[inline]
fn frame_f(ctx: &MotionContext) -> f32 {
    ctx.frame as f32
}

/// Rotate `p` around the vertical axis through `center`.
#[inline]
fn rotate_about_y(p: Vec3, center: Vec3, angle: f32) -> Vec3 {
    let rel = p - center;
    let (s, c) = angle.sin_cos();
    center + Vec3::new(rel.x * c - rel.z * s, rel.y, rel.x * s + rel.z * c)
}

pub struct NebulaDrift;

impl MotionProfile for NebulaDrift {
    fn advance(&self, body: &mut Body, _t: f32, _target: Option<Vec3>, ctx: &MotionContext) {
        let f = frame_f(ctx);
        body.pos += body.vel;
        body.vel *= 0.985;
        body.pos.x += (f * 0.010 + body.phase).sin() * 0.3;
        body.pos.y += (f * 0.012 + body.phase * 0.7).cos() * 0.3;
    }

    fn color(&self, hue: f32, t: f32, _ctx: &MotionContext) -> Hsb {
        Hsb::new(hue + t * 20.0, 40.0, 90.0 - t * 30.0)
    }
}

/// The sketch's original structure drift: three incommensurate sines scaled
/// by seeded per-frame jitter.
pub struct ArchitectureDrift;

impl MotionProfile for ArchitectureDrift {
    fn advance(&self, body: &mut Body, _t: f32, _target: Option<Vec3>, ctx: &MotionContext) {
        let f = frame_f(ctx);
        let drift = 0.4 + seed_noise(ctx.seed, ctx.frame, 0.8);
        body.pos.x += (f * 0.010 + body.phase * 0.11).sin() * drift;
        body.pos.y += (f * 0.012 + body.phase * 0.07).cos() * drift;
        body.pos.z += (f * 0.008 + body.phase * 0.09).sin() * drift;
    }

    fn color(&self, hue: f32, _t: f32, _ctx: &MotionContext) -> Hsb {
        Hsb::new(hue, 45.0, 85.0)
    }
}

pub struct SynapticFlicker;

impl MotionProfile for SynapticFlicker {
    fn advance(&self, body: &mut Body, _t: f32, _target: Option<Vec3>, ctx: &MotionContext) {
        body.pos += body.vel;
        body.vel *= 0.9;
        let k = ctx.frame.wrapping_add(body.phase as u64);
        body.pos.x += signed_seed_noise(ctx.seed, k, 0.6);
        body.pos.y += signed_seed_noise(ctx.seed, k.wrapping_add(17), 0.6);
        body.pos.z += signed_seed_noise(ctx.seed, k.wrapping_add(31), 0.6);
    }

    fn color(&self, hue: f32, _t: f32, ctx: &MotionContext) -> Hsb {
        let pulse = (frame_f(ctx) * 0.2).sin();
        Hsb::new(hue + 30.0, 60.0, 75.0 + 25.0 * pulse)
    }
}

pub struct OrbitalSpin;

impl MotionProfile for OrbitalSpin {
    fn advance(&self, body: &mut Body, t: f32, _target: Option<Vec3>, ctx: &MotionContext) {
        let omega = 0.012 + 0.02 * (1.0 - t.min(1.0));
        body.pos = rotate_about_y(body.pos, body.anchor, omega);
        body.pos.y += (frame_f(ctx) * 0.03 + body.phase).sin() * 0.25;
    }

    fn color(&self, hue: f32, t: f32, _ctx: &MotionContext) -> Hsb {
        Hsb::new(hue - 20.0 * t, 55.0, 95.0)
    }
}

pub struct SpiralRise;

impl MotionProfile for SpiralRise {
    fn advance(&self, body: &mut Body, _t: f32, _target: Option<Vec3>, _ctx: &MotionContext) {
        body.pos = rotate_about_y(body.pos, body.anchor, 0.03);
        let rel = body.pos - body.anchor;
        body.pos = body.anchor + Vec3::new(rel.x * 1.004, rel.y, rel.z * 1.004);
        body.pos.y -= 0.6;
    }

    fn color(&self, hue: f32, t: f32, _ctx: &MotionContext) -> Hsb {
        Hsb::new(hue + 90.0 * t, 65.0, 100.0 - 20.0 * t)
    }
}

pub struct StormGust;

impl MotionProfile for StormGust {
    fn advance(&self, body: &mut Body, _t: f32, _target: Option<Vec3>, ctx: &MotionContext) {
        let f = frame_f(ctx);
        body.vel *= 0.97;
        body.vel.x += ctx.wind_kmh * 0.002;
        body.vel.y += (f * 0.05 + body.phase).sin() * 0.08;
        body.pos += body.vel;
    }

    fn color(&self, hue: f32, t: f32, ctx: &MotionContext) -> Hsb {
        let flash = if seed_noise(ctx.seed, ctx.frame, 1.0) > 0.97 {
            30.0
        } else {
            0.0
        };
        Hsb::new(hue + 180.0, 25.0 + 40.0 * t, 70.0 + flash)
    }
}

pub struct GravityPull;

impl MotionProfile for GravityPull {
    fn advance(&self, body: &mut Body, _t: f32, _target: Option<Vec3>, _ctx: &MotionContext) {
        let to = body.anchor - body.pos;
        let dist = to.length().max(10.0);
        let pull = (60.0 / dist).min(0.8);
        body.vel += to / dist * pull;
        body.vel *= 0.99;
        body.pos += body.vel;
    }

    fn color(&self, hue: f32, t: f32, _ctx: &MotionContext) -> Hsb {
        Hsb::new(hue - 40.0, 70.0, 60.0 + 40.0 * t)
    }
}

pub struct ClusterConverge;

impl MotionProfile for ClusterConverge {
    fn advance(&self, body: &mut Body, t: f32, target: Option<Vec3>, ctx: &MotionContext) {
        match target {
            Some(p) => {
                body.vel += (p - body.pos) * 0.004;
                body.vel *= 0.94;
                body.pos += body.vel;
            }
            None => NebulaDrift.advance(body, t, None, ctx),
        }
    }

    fn color(&self, hue: f32, t: f32, _ctx: &MotionContext) -> Hsb {
        Hsb::new(hue + 10.0, 50.0 + 30.0 * t, 95.0)
    }
}

pub struct MembraneCurl;

impl MotionProfile for MembraneCurl {
    fn advance(&self, body: &mut Body, _t: f32, target: Option<Vec3>, ctx: &MotionContext) {
        let p = body.pos * 0.008;
        let tt = frame_f(ctx) * 0.004;
        // curl of psi = sin(x) * cos(z + t) in the xz plane
        let curl = Vec3::new(-p.x.sin() * (p.z + tt).sin(), 0.0, -p.x.cos() * (p.z + tt).cos());
        body.pos += curl * 0.8 + body.vel;
        body.vel *= 0.96;
        if let Some(c) = target {
            body.pos.y += (c.y - body.pos.y) * 0.05;
            body.pos.x += (c.x - body.pos.x) * 0.002;
            body.pos.z += (c.z - body.pos.z) * 0.002;
        } else {
            body.pos.y += (body.anchor.y - body.pos.y) * 0.02;
        }
    }

    fn color(&self, hue: f32, t: f32, ctx: &MotionContext) -> Hsb {
        let shimmer = (frame_f(ctx) * 0.05).sin() * 10.0;
        Hsb::new(hue + shimmer, 35.0, 85.0 - 25.0 * t)
    }
}
