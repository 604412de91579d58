//! Scenarios and score curves
//!
//! A scenario is the pluggable ruleset a game is played on: where locations
//! may be drawn from and how a guess distance turns into points.

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::geo::{Bounds, Coordinate};

/// Maps a guess distance to points
///
/// Implementations must be monotonic non-increasing in `distance_m` and never
/// exceed `max_score()`.
pub trait ScoreCurve {
    fn score(&self, distance_m: f64) -> u32;
    fn max_score(&self) -> u32;
}

/// Built-in score curves
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Curve {
    /// `max_score * e^(-d / falloff_m)`
    Exponential { max_score: u32, falloff_m: f64 },
    /// Straight line from `max_score` at 0 m down to 0 at `zero_at_m`
    Linear { max_score: u32, zero_at_m: f64 },
}

impl Default for Curve {
    fn default() -> Self {
        Curve::Exponential {
            max_score: 5000,
            falloff_m: 2_000_000.0,
        }
    }
}

impl Curve {
    pub fn validate(&self) -> Result<(), GameError> {
        let (max_score, length) = match *self {
            Curve::Exponential { max_score, falloff_m } => (max_score, falloff_m),
            Curve::Linear { max_score, zero_at_m } => (max_score, zero_at_m),
        };
        if max_score == 0 {
            return Err(GameError::InvalidCurve("max_score must be positive"));
        }
        if !(length.is_finite() && length > 0.0) {
            return Err(GameError::InvalidCurve("curve length must be a positive distance"));
        }
        Ok(())
    }
}

impl ScoreCurve for Curve {
    fn score(&self, distance_m: f64) -> u32 {
        let distance_m = distance_m.max(0.0);
        let fraction = match *self {
            Curve::Exponential { falloff_m, .. } => (-distance_m / falloff_m).exp(),
            Curve::Linear { zero_at_m, .. } => (1.0 - distance_m / zero_at_m).max(0.0),
        };
        let max = self.max_score();
        ((max as f64 * fraction).round() as u32).min(max)
    }

    fn max_score(&self) -> u32 {
        match *self {
            Curve::Exponential { max_score, .. } | Curve::Linear { max_score, .. } => max_score,
        }
    }
}

/// How candidate locations are spread over a scenario's regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    /// Every region is equally likely regardless of size
    Uniform,
    /// Regions are picked proportionally to their area
    #[default]
    Weighted,
}

/// A playable polygon in (lat, lng) degrees
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    vertices: Vec<Coordinate>,
    #[serde(skip)]
    bounds: Bounds,
}

impl Region {
    pub fn new(vertices: Vec<Coordinate>) -> Result<Self, GameError> {
        if vertices.len() < 3 {
            return Err(GameError::DegenerateRegion(vertices.len()));
        }
        let bounds = Bounds::enclosing(vertices.iter().copied())
            .ok_or(GameError::DegenerateRegion(0))?;
        Ok(Self { vertices, bounds })
    }

    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Even-odd point in polygon test
    pub fn contains(&self, point: Coordinate) -> bool {
        let p = point.as_dvec2();
        let mut inside = false;
        let mut j = self.vertices.len() - 1;
        for i in 0..self.vertices.len() {
            let a = self.vertices[i].as_dvec2();
            let b = self.vertices[j].as_dvec2();
            // x = lat, y = lng; cast the ray along +lat
            if (a.y > p.y) != (b.y > p.y) {
                let cross_x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if p.x < cross_x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Shoelace area in square degrees, scaled by cos(mid latitude)
    pub fn approx_area(&self) -> f64 {
        let points: Vec<DVec2> = self.vertices.iter().map(Coordinate::as_dvec2).collect();
        let twice_area: f64 = points
            .iter()
            .zip(points.iter().cycle().skip(1))
            .map(|(a, b)| a.perp_dot(*b))
            .sum();
        let mid_lat = (self.bounds.south + self.bounds.north) / 2.0;
        (twice_area / 2.0).abs() * mid_lat.to_radians().cos().max(0.0)
    }
}

/// The ruleset a game is played on
pub struct Scenario {
    name: String,
    regions: Vec<Region>,
    curve: Box<dyn ScoreCurve>,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("regions", &self.regions.len())
            .field("max_score", &self.curve.max_score())
            .finish()
    }
}

impl Scenario {
    pub fn new(name: impl Into<String>, regions: Vec<Region>, curve: impl ScoreCurve + 'static) -> Self {
        Self {
            name: name.into(),
            regions,
            curve: Box::new(curve),
        }
    }

    /// The whole globe with the default exponential curve
    pub fn world() -> Self {
        Self::new("World", Vec::new(), Curve::default())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Playable regions; empty means anywhere on earth
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn score(&self, distance_m: f64) -> u32 {
        self.curve.score(distance_m).min(self.max_score())
    }

    pub fn max_score(&self) -> u32 {
        self.curve.max_score()
    }
}

/// Serialized scenario description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    #[serde(default)]
    pub regions: Vec<Vec<Coordinate>>,
    #[serde(default)]
    pub curve: Curve,
}

impl ScenarioConfig {
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn into_scenario(self) -> Result<Scenario, GameError> {
        self.curve.validate()?;
        let regions = self
            .regions
            .into_iter()
            .map(Region::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Scenario::new(self.name, regions, self.curve))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    fn square(lat: f64, lng: f64, size: f64) -> Region {
        Region::new(vec![
            coord(lat, lng),
            coord(lat + size, lng),
            coord(lat + size, lng + size),
            coord(lat, lng + size),
        ])
        .unwrap()
    }

    #[test]
    fn test_exponential_curve_is_monotonic() {
        let curve = Curve::default();
        assert_eq!(curve.score(0.0), 5000);
        let mut last = curve.score(0.0);
        for km in (0..20_000).step_by(250) {
            let score = curve.score(km as f64 * 1000.0);
            assert!(score <= last);
            last = score;
        }
    }

    #[test]
    fn test_linear_curve_bottoms_out() {
        let curve = Curve::Linear {
            max_score: 1000,
            zero_at_m: 10_000.0,
        };
        assert_eq!(curve.score(0.0), 1000);
        assert_eq!(curve.score(5_000.0), 500);
        assert_eq!(curve.score(10_000.0), 0);
        assert_eq!(curve.score(50_000.0), 0);
    }

    #[test]
    fn test_curve_validation() {
        assert!(Curve::default().validate().is_ok());
        let zero = Curve::Linear {
            max_score: 0,
            zero_at_m: 1.0,
        };
        assert!(zero.validate().is_err());
        let negative = Curve::Exponential {
            max_score: 10,
            falloff_m: -1.0,
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_region_contains() {
        let region = square(10.0, 20.0, 5.0);
        assert!(region.contains(coord(12.0, 22.0)));
        assert!(!region.contains(coord(9.0, 22.0)));
        assert!(!region.contains(coord(12.0, 26.0)));
    }

    #[test]
    fn test_region_needs_three_vertices() {
        assert!(Region::new(vec![coord(0.0, 0.0), coord(1.0, 1.0)]).is_err());
    }

    #[test]
    fn test_region_area_scales_with_latitude() {
        let equator = square(0.0, 0.0, 2.0);
        let north = square(60.0, 0.0, 2.0);
        assert!((equator.approx_area() - 4.0).abs() < 0.01);
        assert!(north.approx_area() < equator.approx_area() * 0.6);
    }

    #[test]
    fn test_scenario_from_json() {
        let json = r#"{
            "name": "Benelux",
            "regions": [[
                {"lat": 49.5, "lng": 2.5},
                {"lat": 53.5, "lng": 2.5},
                {"lat": 53.5, "lng": 7.2},
                {"lat": 49.5, "lng": 7.2}
            ]],
            "curve": {"kind": "linear", "max_score": 1000, "zero_at_m": 300000.0}
        }"#;
        let scenario = ScenarioConfig::from_json(json).unwrap().into_scenario().unwrap();
        assert_eq!(scenario.name(), "Benelux");
        assert_eq!(scenario.regions().len(), 1);
        assert_eq!(scenario.max_score(), 1000);
        assert_eq!(scenario.score(0.0), 1000);
    }

    #[test]
    fn test_scenario_rejects_bad_curve() {
        let json = r#"{"name": "x", "curve": {"kind": "linear", "max_score": 0, "zero_at_m": 1.0}}"#;
        let config = ScenarioConfig::from_json(json).unwrap();
        assert!(matches!(config.into_scenario(), Err(GameError::InvalidCurve(_))));
    }
}
