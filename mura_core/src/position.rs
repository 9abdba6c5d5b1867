//! Positions and the untrusted shapes they arrive in.
//!
//! Remote documents are parsed into `RawSnapshot` / `RawPosition` first, with
//! every coordinate optional. Only `Position` values that passed the bounds
//! check ever reach the tracker state. A missing coordinate is never read as
//! zero.

use geo::{HaversineDistance, Point};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Valid latitude range in degrees.
pub const LAT_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;

/// Valid longitude range in degrees.
pub const LNG_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// Why a raw report could not become a `Position`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionError {
    #[error("latitude missing")]
    MissingLatitude,

    #[error("longitude missing")]
    MissingLongitude,

    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A WGS84 point, optionally stamped by its producer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in degrees
    pub lat: f64,

    /// Longitude in degrees
    pub lng: f64,

    /// Producer timestamp (seconds, monotonic or wall clock). Informational
    /// only: ordering always follows arrival.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<f64>,
}

impl Position {
    /// Bogotá, the viewer's default map center.
    pub const BOGOTA: Position = Position {
        lat: 4.7110,
        lng: -74.0721,
        ts: None,
    };

    /// Creates a checked position.
    pub fn new(lat: f64, lng: f64) -> Result<Self, PositionError> {
        let p = Self { lat, lng, ts: None };
        p.validate()?;
        Ok(p)
    }

    /// Attaches a producer timestamp.
    pub fn with_ts(mut self, ts: f64) -> Self {
        self.ts = Some(ts);
        self
    }

    /// Checks both coordinates against their ranges. NaN and infinities fail.
    pub fn validate(&self) -> Result<(), PositionError> {
        if !LAT_RANGE.contains(&self.lat) {
            return Err(PositionError::LatitudeOutOfRange(self.lat));
        }
        if !LNG_RANGE.contains(&self.lng) {
            return Err(PositionError::LongitudeOutOfRange(self.lng));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Returns this position displaced by the given degrees, without checks.
    pub fn offset(&self, dlat: f64, dlng: f64) -> Position {
        Position {
            lat: self.lat + dlat,
            lng: self.lng + dlng,
            ts: None,
        }
    }

    /// Great-circle distance in meters.
    pub fn distance_m(&self, other: &Position) -> f64 {
        Point::new(self.lng, self.lat).haversine_distance(&Point::new(other.lng, other.lat))
    }
}

/// The remote session document, as delivered by the snapshot listener.
///
/// Field names follow the document store (`lastLat`, `lastLng`); anything
/// else in the document is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSnapshot {
    #[serde(rename = "lastLat", default)]
    pub last_lat: Option<f64>,

    #[serde(rename = "lastLng", default)]
    pub last_lng: Option<f64>,
}

impl RawSnapshot {
    pub fn new(last_lat: Option<f64>, last_lng: Option<f64>) -> Self {
        Self { last_lat, last_lng }
    }

    /// Parses a session document from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Converts to a checked position.
    pub fn to_position(&self) -> Result<Position, PositionError> {
        let lat = self.last_lat.ok_or(PositionError::MissingLatitude)?;
        let lng = self.last_lng.ok_or(PositionError::MissingLongitude)?;
        Position::new(lat, lng)
    }
}

/// One record of the remote `positions` history query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPosition {
    #[serde(default)]
    pub lat: Option<f64>,

    #[serde(default)]
    pub lng: Option<f64>,

    #[serde(default)]
    pub ts: Option<f64>,
}

impl RawPosition {
    pub fn new(lat: f64, lng: f64, ts: f64) -> Self {
        Self {
            lat: Some(lat),
            lng: Some(lng),
            ts: Some(ts),
        }
    }

    /// Converts to a checked position, carrying the record's timestamp.
    pub fn to_position(&self) -> Result<Position, PositionError> {
        let lat = self.lat.ok_or(PositionError::MissingLatitude)?;
        let lng = self.lng.ok_or(PositionError::MissingLongitude)?;
        let p = Position::new(lat, lng)?;
        Ok(match self.ts {
            Some(ts) => p.with_ts(ts),
            None => p,
        })
    }
}

impl From<Position> for RawPosition {
    fn from(p: Position) -> Self {
        Self {
            lat: Some(p.lat),
            lng: Some(p.lng),
            ts: p.ts,
        }
    }
}
