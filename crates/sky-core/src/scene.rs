//! Turns the entity pool into GPU billboard instances. Sketch units (pixels
//! around the canvas center, y down) become world units (y up) here.

use crate::constants::{
    CAMERA_Z, CONNECTOR_DOTS, CORE_BASE_SIZE, CORE_ENERGY_SIZE, WORLD_SCALE,
};
use crate::entity::Geometry;
use crate::motion::{profile_for, Hsb, MotionContext};
use crate::pool::EntityPool;
use glam::{Mat3, Mat4, Vec3};

pub const SHAPE_SOFT_DISC: f32 = 0.0;
pub const SHAPE_SPHERE: f32 = 1.0;
pub const SHAPE_BOX: f32 = 2.0;
pub const SHAPE_TETRA: f32 = 3.0;
pub const SHAPE_DOT: f32 = 4.0;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceData {
    pub pos: [f32; 3],
    pub scale: f32,
    pub color: [f32; 4],
    pub shape: f32,
    pub angle: f32,
}

/// Right-handed camera with perspective projection.
#[derive(Clone, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn looking_at_origin(aspect: f32) -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, CAMERA_Z),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect,
            fovy_radians: std::f32::consts::FRAC_PI_4,
            znear: 0.1,
            zfar: 100.0,
        }
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect.max(1e-3), self.znear, self.zfar)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn uniforms(&self) -> Uniforms {
        Uniforms {
            view: self.view_matrix().to_cols_array_2d(),
            proj: self.projection_matrix().to_cols_array_2d(),
        }
    }
}

/// HSB (degrees, percent, percent) to linear-ish RGB in 0..1.
pub fn hsb_to_rgb(c: Hsb) -> [f32; 3] {
    let s = c.s / 100.0;
    let v = c.b / 100.0;
    let h = c.h.rem_euclid(360.0) / 60.0;
    let chroma = v * s;
    let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = v - chroma;
    [r + m, g + m, b + m]
}

#[inline]
fn rgba(c: Hsb, alpha: f32) -> [f32; 4] {
    let [r, g, b] = hsb_to_rgb(c);
    [r, g, b, alpha.clamp(0.0, 1.0)]
}

/// Slow whole-scene turn with a gentle nod.
pub fn scene_rotation(frame: u64, seed: u32) -> Mat3 {
    let f = frame as f32;
    Mat3::from_rotation_y(f * 0.0016 + seed as f32 * 0.0009)
        * Mat3::from_rotation_x((f * 0.001).sin() * 0.1)
}

#[inline]
fn to_world(rot: &Mat3, p: Vec3) -> [f32; 3] {
    (*rot * Vec3::new(p.x, -p.y, p.z) * WORLD_SCALE).to_array()
}

#[inline]
pub fn core_size(energy: f32) -> f32 {
    CORE_BASE_SIZE + energy.clamp(0.0, 2.0) * CORE_ENERGY_SIZE
}

fn geometry_tag(g: Geometry) -> f32 {
    match g {
        Geometry::Sphere => SHAPE_SPHERE,
        Geometry::Box => SHAPE_BOX,
        Geometry::Tetra => SHAPE_TETRA,
    }
}

/// Rebuild `out` from the pool. The core sphere comes first so entities blend
/// over it.
pub fn build_instances(
    pool: &EntityPool,
    energy: f32,
    ctx: &MotionContext,
    out: &mut Vec<InstanceData>,
) {
    out.clear();
    let rot = scene_rotation(ctx.frame, ctx.seed);

    // The core is drawn at a tenth of its nominal size as a radius.
    out.push(InstanceData {
        pos: [0.0; 3],
        scale: core_size(energy) * 0.2 * WORLD_SCALE,
        color: rgba(Hsb::new(220.0 + ctx.seed as f32, 40.0, 40.0), 0.6),
        shape: SHAPE_SPHERE,
        angle: 0.0,
    });

    for s in &pool.shapes {
        let t = s.life.fraction(ctx.now_ms);
        let p = profile_for(s.mode).color(s.hue, t, ctx);
        let c = Hsb::new(p.h, (p.s + s.saturation) * 0.5, (p.b + s.brightness) * 0.5);
        out.push(InstanceData {
            pos: to_world(&rot, s.body.pos),
            scale: s.display_size() * WORLD_SCALE,
            color: rgba(c, s.alpha),
            shape: geometry_tag(s.geometry),
            angle: s.rotation.z,
        });
    }

    for p in &pool.particles {
        let t = p.life.fraction(ctx.now_ms);
        let c = profile_for(p.mode).color(p.hue, t, ctx);
        out.push(InstanceData {
            pos: to_world(&rot, p.body.pos),
            scale: p.radius * 2.0 * WORLD_SCALE,
            color: rgba(c, p.alpha),
            shape: SHAPE_SOFT_DISC,
            angle: 0.0,
        });
    }

    for k in &pool.connectors {
        let t = k.life.fraction(ctx.now_ms);
        let c = rgba(profile_for(k.mode).color(k.hue, t, ctx), k.alpha * 0.7);
        for i in 0..CONNECTOR_DOTS {
            let u = i as f32 / (CONNECTOR_DOTS - 1).max(1) as f32;
            out.push(InstanceData {
                pos: to_world(&rot, k.a.pos.lerp(k.b.pos, u)),
                scale: k.weight * 3.0 * WORLD_SCALE,
                color: c,
                shape: SHAPE_DOT,
                angle: 0.0,
            });
        }
    }
}
