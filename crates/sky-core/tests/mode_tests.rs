mod common;

use common::rng;
use glam::Vec3;
use sky_core::mode::{
    mode_weights, AttractorSet, Conditions, ModeSelector, ModeWeights, Register, Temperature, Wind,
};
use sky_core::{Mode, WorldState};

fn calm_day() -> Conditions {
    Conditions::new(&WorldState::default(), 60, 100)
}

#[test]
fn conditions_bucket_world_and_note() {
    let c = calm_day();
    assert_eq!(c.wind, Wind::Calm);
    assert_eq!(c.temperature, Temperature::Mild);
    assert_eq!(c.register, Register::Mid);
    assert!(!c.humid && !c.hard && !c.night && !c.overcast);

    let stormy = WorldState {
        wind_kmh: 45.0,
        humidity_pct: 90.0,
        temperature_c: -2.0,
        is_day: false,
        cloud_cover_pct: 95.0,
        ..WorldState::default()
    };
    let c = Conditions::new(&stormy, 30, 120);
    assert_eq!(c.wind, Wind::Gale);
    assert_eq!(c.temperature, Temperature::Cold);
    assert_eq!(c.register, Register::Low);
    assert!(c.humid && c.hard && c.night && c.overcast);

    assert_eq!(Conditions::new(&WorldState::default(), 72, 10).register, Register::High);
}

#[test]
fn calm_mild_day_uses_the_base_set_plus_architecture() {
    let w = mode_weights(calm_day());
    assert_eq!(w.get(Mode::Nebula), 1);
    assert_eq!(w.get(Mode::Architecture), 2);
    assert_eq!(w.get(Mode::Synaptic), 1);
    assert_eq!(w.get(Mode::OrbitalRing), 1);
    for m in [
        Mode::Spiral,
        Mode::StormField,
        Mode::GravityWell,
        Mode::Clusters,
        Mode::Membrane,
    ] {
        assert_eq!(w.get(m), 0, "{m} should be off on a calm mild day");
    }
    assert_eq!(w.total(), 5);
}

#[test]
fn gale_and_hard_hits_favor_the_storm() {
    let world = WorldState {
        wind_kmh: 40.0,
        ..WorldState::default()
    };
    let w = mode_weights(Conditions::new(&world, 60, 127));
    assert_eq!(w.get(Mode::StormField), 4);
    assert_eq!(w.get(Mode::Spiral), 1);
    assert_eq!(w.get(Mode::Architecture), 1);
}

#[test]
fn humid_cold_night_adds_membrane_clusters_and_nebula() {
    let world = WorldState {
        humidity_pct: 85.0,
        temperature_c: 0.0,
        is_day: false,
        cloud_cover_pct: 80.0,
        ..WorldState::default()
    };
    let w = mode_weights(Conditions::new(&world, 40, 60));
    assert_eq!(w.get(Mode::Membrane), 3);
    assert_eq!(w.get(Mode::Clusters), 3);
    assert_eq!(w.get(Mode::Nebula), 3);
    assert_eq!(w.get(Mode::GravityWell), 2);
}

#[test]
fn sampling_follows_the_weights() {
    let mut counts = [0u32; 9];
    let w = ModeWeights([0, 0, 0, 0, 0, 9, 0, 0, 0]);
    let mut r = rng(11);
    for _ in 0..2_000 {
        counts[w.sample(&mut r).index()] += 1;
    }
    // 9 of 10 draws hit the table, the variety slot spreads the rest
    assert!(counts[Mode::StormField.index()] > 1_700);
    assert!(counts.iter().sum::<u32>() == 2_000);
}

#[test]
fn sampling_an_empty_table_picks_any_mode() {
    let w = ModeWeights([0; 9]);
    let mut r = rng(12);
    let mut seen = std::collections::HashSet::new();
    for _ in 0..500 {
        seen.insert(w.sample(&mut r));
    }
    assert_eq!(seen.len(), Mode::ALL.len());
}

#[test]
fn note_enters_a_mode_for_the_hold_window() {
    let mut sel = ModeSelector::new((4_000.0, 9_000.0), 0.01);
    let mut r = rng(13);
    let mode = sel.on_note(&WorldState::default(), 60, 100, Vec3::ZERO, 1_000.0, &mut r);
    let active = sel.active();
    assert_eq!(active.mode, mode);
    assert!(active.expires_ms >= 5_000.0 && active.expires_ms < 10_000.0);
}

#[test]
fn idle_drift_waits_for_expiry() {
    let mut sel = ModeSelector::new((4_000.0, 4_000.0), 1.0);
    let mut r = rng(14);
    sel.on_note(&WorldState::default(), 60, 100, Vec3::ZERO, 0.0, &mut r);
    assert!(sel.tick_idle(Vec3::ZERO, 3_999.0, &mut r).is_none());
    assert!(sel.tick_idle(Vec3::ZERO, 4_001.0, &mut r).is_some());
    assert_eq!(sel.active().expires_ms, 8_001.0);
}

#[test]
fn expired_mode_eventually_changes_under_default_chance() {
    let mut sel = ModeSelector::new((4_000.0, 9_000.0), 0.01);
    let mut r = rng(15);
    let start = sel.on_note(&WorldState::default(), 60, 100, Vec3::ZERO, 0.0, &mut r);
    let mut now = 10_000.0;
    let mut changed = false;
    for _ in 0..20_000 {
        now += 16.0;
        if let Some(m) = sel.tick_idle(Vec3::ZERO, now, &mut r) {
            if m != start {
                changed = true;
                break;
            }
        }
    }
    assert!(changed);
}

#[test]
fn attractor_sets_match_their_mode() {
    let mut r = rng(16);
    let anchor = Vec3::new(10.0, -20.0, 30.0);
    let clusters = AttractorSet::generate(Mode::Clusters, anchor, 5_000.0, &mut r);
    assert!((3..=6).contains(&clusters.points.len()));
    let membrane = AttractorSet::generate(Mode::Membrane, anchor, 5_000.0, &mut r);
    assert!((4..=7).contains(&membrane.points.len()));
    assert!(membrane.points.iter().all(|p| (p.y - anchor.y).abs() <= 18.001));
    assert!(clusters.is_live(5_000.0));
    assert!(!clusters.is_live(5_000.1));
}

#[test]
fn attractor_modes_install_a_set_on_entry() {
    let mut sel = ModeSelector::new((4_000.0, 9_000.0), 1.0);
    let mut r = rng(17);
    assert!(sel.attractors().is_none());
    let mut now = 0.0;
    // idle re-rolls are uniform, so an attractor mode turns up quickly
    while !sel.mode().uses_attractors() {
        now += 10_000.0;
        sel.tick_idle(Vec3::ZERO, now, &mut r);
    }
    let set = sel.attractors().expect("attractors installed");
    assert_eq!(set.expires_ms, sel.active().expires_ms);
}

#[test]
fn modes_name_their_sound_group() {
    assert_eq!(Mode::Nebula.sound_group(), "pad");
    assert_eq!(Mode::OrbitalRing.sound_group(), "glass");
    assert_eq!(Mode::Clusters.to_string(), "clusters");
    assert!(Mode::Membrane.uses_attractors());
    assert!(!Mode::Spiral.uses_attractors());
}
