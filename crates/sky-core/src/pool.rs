use crate::config::PopulationCaps;
use crate::entity::{Connector, Particle, Shape};
use crate::motion::MotionContext;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PopulationCounts {
    pub shapes: usize,
    pub particles: usize,
    pub connectors: usize,
}

impl PopulationCounts {
    pub fn total(&self) -> usize {
        self.shapes + self.particles + self.connectors
    }
}

/// Every live entity, oldest first within each list.
pub struct EntityPool {
    pub shapes: Vec<Shape>,
    pub particles: Vec<Particle>,
    pub connectors: Vec<Connector>,
    caps: PopulationCaps,
}

#[inline]
fn trim_oldest<T>(list: &mut Vec<T>, cap: usize) -> usize {
    let excess = list.len().saturating_sub(cap);
    if excess > 0 {
        list.drain(..excess);
    }
    excess
}

impl EntityPool {
    pub fn new(caps: PopulationCaps) -> Self {
        Self {
            shapes: Vec::with_capacity(caps.shapes),
            particles: Vec::with_capacity(caps.particles),
            connectors: Vec::with_capacity(caps.connectors),
            caps,
        }
    }

    pub fn caps(&self) -> PopulationCaps {
        self.caps
    }

    pub fn counts(&self) -> PopulationCounts {
        PopulationCounts {
            shapes: self.shapes.len(),
            particles: self.particles.len(),
            connectors: self.connectors.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts().total() == 0
    }

    /// Drop the oldest entries of every list down to its cap. Returns how
    /// many entities were dropped.
    pub fn trim(&mut self) -> usize {
        trim_oldest(&mut self.shapes, self.caps.shapes)
            + trim_oldest(&mut self.particles, self.caps.particles)
            + trim_oldest(&mut self.connectors, self.caps.connectors)
    }

    pub fn update(&mut self, ctx: &MotionContext) {
        for s in &mut self.shapes {
            s.update(ctx);
        }
        for p in &mut self.particles {
            p.update(ctx);
        }
        for c in &mut self.connectors {
            c.update(ctx);
        }
    }

    /// Remove every entity whose age exceeds its lifespan.
    pub fn cull(&mut self, now_ms: f64) -> usize {
        let before = self.counts().total();
        self.shapes.retain(|s| !s.life.is_expired(now_ms));
        self.particles.retain(|p| !p.life.is_expired(now_ms));
        self.connectors.retain(|c| !c.life.is_expired(now_ms));
        before - self.counts().total()
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
        self.particles.clear();
        self.connectors.clear();
    }
}
