//! Engine parameters.
//!
//! Everything tunable at startup lives in [`EngineParams`]. Defaults come from
//! `constants.rs`; a front end may deserialize a partial JSON object on top of
//! them (missing fields keep their defaults).

use crate::constants::*;
use crate::sound::StealPolicy;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid engine params: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("population cap `{0}` must be at least 1")]
    ZeroCap(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PopulationCaps {
    pub shapes: usize,
    pub particles: usize,
    pub connectors: usize,
}

impl Default for PopulationCaps {
    fn default() -> Self {
        Self {
            shapes: MAX_SHAPES,
            particles: MAX_PARTICLES,
            connectors: MAX_CONNECTORS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    pub polyphony: usize,
    pub steal_policy: StealPolicy,
    pub release_fade_ms: f64,
    pub caps: PopulationCaps,
    pub mode_hold_ms: (f64, f64),
    pub idle_reroll_chance: f64,
    pub weather_refresh_ms: f64,
    pub iss_refresh_ms: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub satellite_id: u32,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            polyphony: VOICE_POLYPHONY,
            steal_policy: StealPolicy::Oldest,
            release_fade_ms: RELEASE_FADE_MS,
            caps: PopulationCaps::default(),
            mode_hold_ms: MODE_HOLD_MS,
            idle_reroll_chance: IDLE_REROLL_CHANCE,
            weather_refresh_ms: WEATHER_REFRESH_MS,
            iss_refresh_ms: ISS_REFRESH_MS,
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            satellite_id: ISS_NORAD_ID,
        }
    }
}

impl EngineParams {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let params: EngineParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.caps.shapes == 0 {
            return Err(ConfigError::ZeroCap("shapes"));
        }
        if self.caps.particles == 0 {
            return Err(ConfigError::ZeroCap("particles"));
        }
        if self.caps.connectors == 0 {
            return Err(ConfigError::ZeroCap("connectors"));
        }
        Ok(())
    }

    pub fn weather_url(&self) -> String {
        format!(
            "https://api.open-meteo.com/v1/forecast?latitude={:.4}&longitude={:.4}\
             &current=temperature_2m,relative_humidity_2m,wind_speed_10m,cloud_cover,is_day",
            self.latitude, self.longitude
        )
    }

    pub fn satellite_url(&self) -> String {
        format!(
            "https://api.wheretheiss.at/v1/satellites/{}",
            self.satellite_id
        )
    }
}
