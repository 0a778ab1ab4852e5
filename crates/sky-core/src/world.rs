//! Environmental signals fed by the weather and satellite services.
//!
//! [`WorldUpdater`] is the only writer of [`WorldState`]. Front ends ask it
//! which feeds are due, fetch the bodies however their platform allows, and
//! hand the result back through [`WorldUpdater::ingest`]. A failed or
//! malformed fetch never touches the cached values.

use serde::Deserialize;
use smallvec::SmallVec;
use std::fmt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldState {
    pub temperature_c: f32,
    pub wind_kmh: f32,
    pub humidity_pct: f32,
    pub is_day: bool,
    pub cloud_cover_pct: f32,
    pub iss_latitude: f32,
    pub iss_longitude: f32,
    pub iss_velocity_kmh: f32,
}

impl Default for WorldState {
    fn default() -> Self {
        Self {
            temperature_c: 15.0,
            wind_kmh: 10.0,
            humidity_pct: 50.0,
            is_day: true,
            cloud_cover_pct: 30.0,
            iss_latitude: 0.0,
            iss_longitude: 0.0,
            iss_velocity_kmh: 27_600.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Feed {
    Weather,
    Satellite,
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feed::Weather => f.write_str("weather"),
            Feed::Satellite => f.write_str("satellite"),
        }
    }
}

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("{feed} fetch failed: {reason}")]
    Fetch { feed: Feed, reason: String },
    #[error("malformed {feed} response: {source}")]
    Malformed {
        feed: Feed,
        #[source]
        source: serde_json::Error,
    },
    #[error("{feed} response carried a non-finite `{field}`")]
    NonFinite { feed: Feed, field: &'static str },
}

#[derive(Deserialize)]
struct WeatherResponse {
    current: CurrentWeather,
}

#[derive(Deserialize)]
struct CurrentWeather {
    temperature_2m: f32,
    relative_humidity_2m: f32,
    wind_speed_10m: f32,
    cloud_cover: f32,
    is_day: u8,
}

#[derive(Deserialize)]
struct SatelliteResponse {
    latitude: f32,
    longitude: f32,
    velocity: f32,
}

fn finite(feed: Feed, field: &'static str, v: f32) -> Result<f32, WorldError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(WorldError::NonFinite { feed, field })
    }
}

impl WorldState {
    /// Overwrite the weather fields from an Open-Meteo `current=` body.
    /// On error nothing is written.
    pub fn apply_weather_json(&mut self, body: &str) -> Result<(), WorldError> {
        let feed = Feed::Weather;
        let parsed: WeatherResponse =
            serde_json::from_str(body).map_err(|source| WorldError::Malformed { feed, source })?;
        let c = parsed.current;
        let temperature_c = finite(feed, "temperature_2m", c.temperature_2m)?;
        let humidity_pct = finite(feed, "relative_humidity_2m", c.relative_humidity_2m)?;
        let wind_kmh = finite(feed, "wind_speed_10m", c.wind_speed_10m)?;
        let cloud_cover_pct = finite(feed, "cloud_cover", c.cloud_cover)?;

        self.temperature_c = temperature_c;
        self.humidity_pct = humidity_pct.clamp(0.0, 100.0);
        self.wind_kmh = wind_kmh.max(0.0);
        self.cloud_cover_pct = cloud_cover_pct.clamp(0.0, 100.0);
        self.is_day = c.is_day != 0;
        Ok(())
    }

    /// Overwrite the satellite fields from a wheretheiss.at body.
    pub fn apply_satellite_json(&mut self, body: &str) -> Result<(), WorldError> {
        let feed = Feed::Satellite;
        let parsed: SatelliteResponse =
            serde_json::from_str(body).map_err(|source| WorldError::Malformed { feed, source })?;
        let lat = finite(feed, "latitude", parsed.latitude)?;
        let lon = finite(feed, "longitude", parsed.longitude)?;
        let vel = finite(feed, "velocity", parsed.velocity)?;

        self.iss_latitude = lat.clamp(-90.0, 90.0);
        self.iss_longitude = lon.clamp(-180.0, 180.0);
        self.iss_velocity_kmh = vel.max(0.0);
        Ok(())
    }
}

/// Fixed-interval poll timer for one feed. A request in flight blocks the next
/// poll until its result is ingested.
#[derive(Clone, Debug)]
pub struct FeedSchedule {
    interval_ms: f64,
    next_due_ms: f64,
    in_flight: bool,
}

impl FeedSchedule {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            next_due_ms: 0.0,
            in_flight: false,
        }
    }

    fn poll(&mut self, now_ms: f64) -> bool {
        if self.in_flight || now_ms < self.next_due_ms {
            return false;
        }
        self.in_flight = true;
        self.next_due_ms = now_ms + self.interval_ms;
        true
    }

    fn complete(&mut self) {
        self.in_flight = false;
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}

pub struct WorldUpdater {
    state: WorldState,
    weather: FeedSchedule,
    satellite: FeedSchedule,
}

impl WorldUpdater {
    pub fn new(weather_interval_ms: f64, satellite_interval_ms: f64) -> Self {
        Self {
            state: WorldState::default(),
            weather: FeedSchedule::new(weather_interval_ms),
            satellite: FeedSchedule::new(satellite_interval_ms),
        }
    }

    #[inline]
    pub fn state(&self) -> &WorldState {
        &self.state
    }

    /// Feeds whose interval has elapsed; each returned feed is now in flight.
    pub fn due_feeds(&mut self, now_ms: f64) -> SmallVec<[Feed; 2]> {
        let mut due = SmallVec::new();
        if self.weather.poll(now_ms) {
            due.push(Feed::Weather);
        }
        if self.satellite.poll(now_ms) {
            due.push(Feed::Satellite);
        }
        due
    }

    /// Apply a fetch outcome. Failures are logged and returned as values; the
    /// cached state is only written on a clean parse.
    pub fn ingest(&mut self, feed: Feed, body: Result<&str, &str>) -> Result<(), WorldError> {
        match feed {
            Feed::Weather => self.weather.complete(),
            Feed::Satellite => self.satellite.complete(),
        }
        let result = match body {
            Ok(text) => match feed {
                Feed::Weather => self.state.apply_weather_json(text),
                Feed::Satellite => self.state.apply_satellite_json(text),
            },
            Err(reason) => Err(WorldError::Fetch {
                feed,
                reason: reason.to_string(),
            }),
        };
        match &result {
            Ok(()) => log::debug!("[world] {} updated: {:?}", feed, self.state),
            Err(e) => log::warn!("[world] keeping cached values: {}", e),
        }
        result
    }

    pub fn schedule(&self, feed: Feed) -> &FeedSchedule {
        match feed {
            Feed::Weather => &self.weather,
            Feed::Satellite => &self.satellite,
        }
    }
}
