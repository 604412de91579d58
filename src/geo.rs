//! Coordinates and great-circle distance
//!
//! Pure functions only; everything here is deterministic and unit tested.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::EARTH_RADIUS_M;
use crate::error::GameError;

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    lat: f64,
    lng: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = GameError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.lat, raw.lng)
    }
}

impl Coordinate {
    /// Null island, the default guess map center
    pub const ORIGIN: Coordinate = Coordinate { lat: 0.0, lng: 0.0 };

    pub fn new(lat: f64, lng: f64) -> Result<Self, GameError> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        if !valid {
            return Err(GameError::InvalidCoordinate { lat, lng });
        }
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Planar (lat, lng) vector for interpolation and polygon math
    pub fn as_dvec2(&self) -> DVec2 {
        DVec2::new(self.lat, self.lng)
    }

    /// Build from a planar vector, clamping into the valid ranges
    pub fn from_dvec2(v: DVec2) -> Self {
        Self {
            lat: v.x.clamp(-90.0, 90.0),
            lng: v.y.clamp(-180.0, 180.0),
        }
    }
}

/// Great-circle distance in meters (haversine on a sphere)
pub fn measure_distance(from: Coordinate, to: Coordinate) -> f64 {
    let phi_1 = from.lat.to_radians();
    let phi_2 = to.lat.to_radians();
    let delta_phi = (to.lat - from.lat).to_radians();
    let delta_lambda = (to.lng - from.lng).to_radians();
    let a = (delta_phi / 2.0).sin().powi(2)
        + phi_1.cos() * phi_2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
    EARTH_RADIUS_M * c
}

/// Human readable distance, truncated (never rounded up)
///
/// - below 1 km: meters with one decimal
/// - below 20 km: kilometers with one decimal
/// - otherwise: whole kilometers
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        return format!("{} m", (meters * 10.0).floor() / 10.0);
    }
    if meters < 20000.0 {
        return format!("{} km", (meters / 100.0).floor() / 10.0);
    }
    format!("{} km", (meters / 1000.0).floor())
}

/// Point on the straight (lat, lng) segment from `from` to `to`
///
/// `t` is clamped to [0, 1]; the reveal line sweeps along this path.
pub fn interpolate(from: Coordinate, to: Coordinate, t: f64) -> Coordinate {
    Coordinate::from_dvec2(from.as_dvec2().lerp(to.as_dvec2(), t.clamp(0.0, 1.0)))
}

/// Axis-aligned lat/lng bounds used to fit the overview map
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn around(point: Coordinate) -> Self {
        Self {
            south: point.lat,
            west: point.lng,
            north: point.lat,
            east: point.lng,
        }
    }

    /// Smallest bounds containing every point, `None` when empty
    pub fn enclosing(points: impl IntoIterator<Item = Coordinate>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::around(first), |mut bounds, p| {
            bounds.extend(p);
            bounds
        }))
    }

    pub fn extend(&mut self, point: Coordinate) {
        self.south = self.south.min(point.lat);
        self.north = self.north.max(point.lat);
        self.west = self.west.min(point.lng);
        self.east = self.east.max(point.lng);
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        (self.south..=self.north).contains(&point.lat) && (self.west..=self.east).contains(&point.lng)
    }
}
