use sky_core::world::WorldUpdater;
use sky_core::{Feed, WorldError, WorldState};

const WEATHER_BODY: &str = r#"{
    "latitude": 19.4, "longitude": -99.1,
    "current": {
        "time": "2024-05-01T12:00",
        "temperature_2m": 28.5,
        "relative_humidity_2m": 81,
        "wind_speed_10m": 34.2,
        "cloud_cover": 75,
        "is_day": 0
    }
}"#;

const SATELLITE_BODY: &str = r#"{
    "name": "iss", "id": 25544,
    "latitude": 51.6, "longitude": -120.25,
    "altitude": 420.1, "velocity": 27581.3
}"#;

#[test]
fn weather_body_overwrites_weather_fields_only() {
    let mut w = WorldState::default();
    w.apply_weather_json(WEATHER_BODY).unwrap();
    assert_eq!(w.temperature_c, 28.5);
    assert_eq!(w.humidity_pct, 81.0);
    assert_eq!(w.wind_kmh, 34.2);
    assert_eq!(w.cloud_cover_pct, 75.0);
    assert!(!w.is_day);
    assert_eq!(w.iss_latitude, WorldState::default().iss_latitude);
}

#[test]
fn satellite_body_overwrites_position_and_velocity() {
    let mut w = WorldState::default();
    w.apply_satellite_json(SATELLITE_BODY).unwrap();
    assert_eq!(w.iss_latitude, 51.6);
    assert_eq!(w.iss_longitude, -120.25);
    assert_eq!(w.iss_velocity_kmh, 27581.3);
    assert_eq!(w.temperature_c, WorldState::default().temperature_c);
}

#[test]
fn out_of_range_values_are_clamped() {
    let mut w = WorldState::default();
    w.apply_satellite_json(r#"{"latitude": 123.0, "longitude": -500.0, "velocity": -3.0}"#)
        .unwrap();
    assert_eq!(w.iss_latitude, 90.0);
    assert_eq!(w.iss_longitude, -180.0);
    assert_eq!(w.iss_velocity_kmh, 0.0);
}

#[test]
fn malformed_weather_leaves_state_untouched() {
    let mut updater = WorldUpdater::new(1_000.0, 1_000.0);
    let before = *updater.state();
    updater.due_feeds(0.0);
    let err = updater
        .ingest(Feed::Weather, Ok("{\"current\": {\"temperature_2m\": \"warm\"}"))
        .unwrap_err();
    assert!(matches!(err, WorldError::Malformed { feed: Feed::Weather, .. }));
    assert_eq!(*updater.state(), before);
}

#[test]
fn missing_fields_are_malformed() {
    let mut w = WorldState::default();
    let before = w;
    assert!(w.apply_weather_json(r#"{"current": {"temperature_2m": 3.0}}"#).is_err());
    assert!(w.apply_satellite_json("[]").is_err());
    assert_eq!(w, before);
}

#[test]
fn fetch_failure_keeps_cached_values_and_clears_in_flight() {
    let mut updater = WorldUpdater::new(1_000.0, 1_000.0);
    updater.due_feeds(0.0);
    updater.ingest(Feed::Weather, Ok(WEATHER_BODY)).unwrap();
    let cached = *updater.state();

    updater.due_feeds(5_000.0);
    assert!(updater.schedule(Feed::Satellite).is_in_flight());
    let err = updater
        .ingest(Feed::Satellite, Err("connection refused"))
        .unwrap_err();
    assert!(matches!(err, WorldError::Fetch { feed: Feed::Satellite, .. }));
    assert!(!updater.schedule(Feed::Satellite).is_in_flight());
    assert_eq!(*updater.state(), cached);
}

#[test]
fn feeds_poll_on_their_own_intervals() {
    let mut updater = WorldUpdater::new(600_000.0, 5_000.0);
    let due = updater.due_feeds(0.0);
    assert_eq!(due.as_slice(), &[Feed::Weather, Feed::Satellite]);

    // in flight: nothing new until ingested
    assert!(updater.due_feeds(10_000.0).is_empty());
    updater.ingest(Feed::Weather, Ok(WEATHER_BODY)).unwrap();
    updater.ingest(Feed::Satellite, Ok(SATELLITE_BODY)).unwrap();

    assert!(updater.due_feeds(4_999.0).is_empty());
    assert_eq!(updater.due_feeds(5_000.0).as_slice(), &[Feed::Satellite]);
    updater.ingest(Feed::Satellite, Ok(SATELLITE_BODY)).unwrap();
    assert_eq!(
        updater.due_feeds(600_000.0).as_slice(),
        &[Feed::Weather, Feed::Satellite]
    );
}

#[test]
fn errors_render_with_feed_name() {
    let err = WorldError::Fetch {
        feed: Feed::Weather,
        reason: "timeout".into(),
    };
    assert_eq!(err.to_string(), "weather fetch failed: timeout");
}
