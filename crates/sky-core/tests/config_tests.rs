use sky_core::constants::{ISS_NORAD_ID, MAX_PARTICLES, VOICE_POLYPHONY};
use sky_core::{ConfigError, EngineParams, StealPolicy};

#[test]
fn defaults_come_from_constants() {
    let p = EngineParams::default();
    assert_eq!(p.polyphony, VOICE_POLYPHONY);
    assert_eq!(p.steal_policy, StealPolicy::Oldest);
    assert_eq!(p.caps.particles, MAX_PARTICLES);
    assert_eq!(p.satellite_id, ISS_NORAD_ID);
    assert!(p.validate().is_ok());
}

#[test]
fn partial_json_keeps_the_other_defaults() {
    let p = EngineParams::from_json(
        r#"{"polyphony": 6, "steal_policy": "arbitrary", "caps": {"shapes": 12}}"#,
    )
    .unwrap();
    assert_eq!(p.polyphony, 6);
    assert_eq!(p.steal_policy, StealPolicy::Arbitrary);
    assert_eq!(p.caps.shapes, 12);
    assert_eq!(p.caps.particles, MAX_PARTICLES);
    assert_eq!(p.release_fade_ms, EngineParams::default().release_fade_ms);
}

#[test]
fn zero_caps_are_rejected() {
    let err = EngineParams::from_json(r#"{"caps": {"connectors": 0}}"#).unwrap_err();
    assert!(matches!(err, ConfigError::ZeroCap("connectors")));
    assert!(matches!(
        EngineParams::from_json("{\"polyphony\": -1}"),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn feed_urls_carry_location_and_satellite() {
    let p = EngineParams {
        latitude: 51.5,
        longitude: -0.12,
        satellite_id: 20580,
        ..EngineParams::default()
    };
    let weather = p.weather_url();
    assert!(weather.contains("latitude=51.5000"));
    assert!(weather.contains("longitude=-0.1200"));
    assert!(weather.contains("cloud_cover"));
    assert!(p.satellite_url().ends_with("/satellites/20580"));
}
