mod common;

use common::rng;
use glam::Vec3;
use sky_core::constants::AMBIENT_PARTICLES;
use sky_core::mode::AttractorSet;
use sky_core::pool::EntityPool;
use sky_core::spawn::{anchor_point, note_hue, spawn, spawn_ambient, SpawnRequest};
use sky_core::{Mode, PopulationCaps, WorldState};

fn request(mode: Mode, note: u8, velocity: u8) -> SpawnRequest {
    SpawnRequest {
        note,
        velocity,
        mode,
        now_ms: 0.0,
        seed: 137,
    }
}

fn positions(pool: &EntityPool) -> Vec<Vec3> {
    pool.shapes
        .iter()
        .map(|s| s.body.pos)
        .chain(pool.particles.iter().map(|p| p.body.pos))
        .chain(pool.connectors.iter().flat_map(|c| [c.a.pos, c.b.pos]))
        .collect()
}

#[test]
fn anchor_follows_satellite_and_cloud_cover() {
    let origin = anchor_point(&WorldState {
        iss_latitude: 0.0,
        iss_longitude: 0.0,
        cloud_cover_pct: 50.0,
        ..WorldState::default()
    });
    assert!(origin.length() < 1e-3);

    let corner = anchor_point(&WorldState {
        iss_latitude: 90.0,
        iss_longitude: 180.0,
        cloud_cover_pct: 100.0,
        ..WorldState::default()
    });
    // north is up: screen y shrinks
    assert_eq!(corner, Vec3::new(320.0, -220.0, 340.0));

    let clamped = anchor_point(&WorldState {
        iss_longitude: -999.0,
        cloud_cover_pct: -5.0,
        ..WorldState::default()
    });
    assert_eq!(clamped.x, -320.0);
    assert_eq!(clamped.z, -340.0);
}

#[test]
fn note_hue_wraps_into_degrees() {
    for note in [0u8, 21, 60, 108, 127] {
        for temp in [-40.0, 15.0, 45.0] {
            let h = note_hue(note, 255, temp);
            assert!((0.0..360.0).contains(&h), "hue {h} for note {note}");
        }
    }
    assert!((note_hue(21, 0, 15.0) - 210.0).abs() < 1e-3);
}

#[test]
fn every_mode_spawns_near_the_anchor() {
    let world = WorldState {
        iss_latitude: 20.0,
        iss_longitude: -60.0,
        ..WorldState::default()
    };
    let anchor = anchor_point(&world);
    let mut r = rng(21);
    for mode in Mode::ALL {
        for velocity in [1u8, 64, 127] {
            let mut pool = EntityPool::new(PopulationCaps::default());
            let attractors = AttractorSet::generate(mode, anchor, 10_000.0, &mut r);
            let n = spawn(
                &mut pool,
                request(mode, 60, velocity),
                &world,
                Some(&attractors),
                &mut r,
            );
            assert!(n >= 1, "{mode} spawned nothing");
            assert_eq!(n, pool.counts().total(), "{mode} count mismatch");
            for p in positions(&pool) {
                assert!(
                    p.distance(anchor) < 450.0,
                    "{mode} placed an entity {} away",
                    p.distance(anchor)
                );
            }
        }
    }
}

#[test]
fn harder_notes_spawn_more() {
    let world = WorldState::default();
    let mut soft = EntityPool::new(PopulationCaps::default());
    let mut hard = EntityPool::new(PopulationCaps::default());
    let mut r = rng(22);
    let a = spawn(&mut soft, request(Mode::Nebula, 60, 10), &world, None, &mut r);
    let b = spawn(&mut hard, request(Mode::Nebula, 60, 127), &world, None, &mut r);
    assert!(b > a);
    assert!(hard.shapes[0].size > soft.shapes[0].size);
}

#[test]
fn populations_stay_within_caps() {
    let caps = PopulationCaps {
        shapes: 4,
        particles: 60,
        connectors: 6,
    };
    let mut pool = EntityPool::new(caps);
    let world = WorldState::default();
    let mut r = rng(23);
    for i in 0..60u8 {
        let mode = Mode::ALL[i as usize % Mode::ALL.len()];
        spawn(&mut pool, request(mode, 40 + i, 127), &world, None, &mut r);
        let c = pool.counts();
        assert!(c.shapes <= caps.shapes);
        assert!(c.particles <= caps.particles);
        assert!(c.connectors <= caps.connectors);
    }
}

#[test]
fn trimming_drops_the_oldest_first() {
    let caps = PopulationCaps {
        shapes: 2,
        particles: 10,
        connectors: 2,
    };
    let mut pool = EntityPool::new(caps);
    let world = WorldState::default();
    let mut r = rng(24);
    for note in [50u8, 51, 52] {
        spawn(&mut pool, request(Mode::GravityWell, note, 100), &world, None, &mut r);
    }
    let notes: Vec<u8> = pool.shapes.iter().map(|s| s.note).collect();
    assert_eq!(notes, vec![51, 52]);
}

#[test]
fn clusters_bind_particles_to_live_attractors_only() {
    let world = WorldState::default();
    let anchor = anchor_point(&world);
    let mut r = rng(25);

    let set = AttractorSet::generate(Mode::Clusters, anchor, 5_000.0, &mut r);
    let mut pool = EntityPool::new(PopulationCaps::default());
    spawn(&mut pool, request(Mode::Clusters, 60, 100), &world, Some(&set), &mut r);
    assert!(pool
        .particles
        .iter()
        .all(|p| p.attractor.is_some_and(|i| i < set.points.len())));

    let expired = AttractorSet {
        expires_ms: -1.0,
        ..set
    };
    let mut pool = EntityPool::new(PopulationCaps::default());
    spawn(&mut pool, request(Mode::Clusters, 60, 100), &world, Some(&expired), &mut r);
    assert!(pool.particles.iter().all(|p| p.attractor.is_none()));
}

#[test]
fn right_hand_shapes_are_brighter() {
    let world = WorldState::default();
    let mut r = rng(26);
    let mut pool = EntityPool::new(PopulationCaps::default());
    spawn(&mut pool, request(Mode::Nebula, 48, 100), &world, None, &mut r);
    spawn(&mut pool, request(Mode::Nebula, 72, 100), &world, None, &mut r);
    let (left, right) = (&pool.shapes[0], &pool.shapes[1]);
    assert!(right.brightness > left.brightness);
    assert!(right.saturation > left.saturation);
}

#[test]
fn ambient_spawn_adds_a_fixed_sprinkle() {
    let world = WorldState::default();
    let mut pool = EntityPool::new(PopulationCaps::default());
    let mut r = rng(27);
    let n = spawn_ambient(&mut pool, Mode::Spiral, &world, 137, 0.0, &mut r);
    assert_eq!(n, AMBIENT_PARTICLES);
    assert_eq!(pool.particles.len(), AMBIENT_PARTICLES);
    let anchor = anchor_point(&world);
    assert!(pool
        .particles
        .iter()
        .all(|p| (39.99..=300.01).contains(&p.body.pos.distance(anchor))));
}
