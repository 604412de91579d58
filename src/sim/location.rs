//! Random valid location search
//!
//! Candidates are sampled from the scenario's playable regions and checked
//! against the imagery service until one has a panorama. The search is
//! time-sliced: each [`LocationSource::poll`] spends a small attempt budget
//! and otherwise stays pending, so a region with no imagery never blocks the
//! caller (it simply never resolves).

use std::task::Poll;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::{EARTH_CIRCUMFERENCE_M, REGION_SAMPLE_TRIES};
use crate::geo::Coordinate;
use crate::scoring::{Distribution, Region};

/// Panorama found by the imagery service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panorama {
    pub id: String,
    /// Where the panorama was actually captured
    pub position: Coordinate,
}

/// The true location of a round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub coordinate: Coordinate,
    pub panorama_id: String,
}

impl From<Panorama> for Destination {
    fn from(panorama: Panorama) -> Self {
        Self {
            coordinate: panorama.position,
            panorama_id: panorama.id,
        }
    }
}

/// Imagery collaborator: decides which candidates are playable
pub trait ImageryService {
    /// Nearest panorama within `radius_m` of `near`, if any
    fn find_panorama(&mut self, near: Coordinate, radius_m: f64) -> Option<Panorama>;
}

/// Search radius for a zoom level: the ground width of one map tile
pub fn search_radius_m(zoom: u8) -> f64 {
    EARTH_CIRCUMFERENCE_M / 2f64.powi(zoom as i32)
}

/// One outstanding search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationRequest {
    pub zoom: u8,
    pub radius_m: f64,
    /// Candidates rejected so far
    pub attempts: u64,
}

/// Produces destinations for a session, one request at a time
pub struct LocationSource<S> {
    imagery: S,
    rng: Pcg32,
    regions: Vec<Region>,
    /// Cumulative selection weights, parallel to `regions`
    weights: Vec<f64>,
    pending: Option<LocationRequest>,
    attempts_per_poll: u32,
}

impl<S: ImageryService> LocationSource<S> {
    pub fn new(imagery: S, seed: u64, attempts_per_poll: u32) -> Self {
        Self {
            imagery,
            rng: Pcg32::seed_from_u64(seed),
            regions: Vec::new(),
            weights: Vec::new(),
            pending: None,
            attempts_per_poll: attempts_per_poll.max(1),
        }
    }

    pub fn imagery(&self) -> &S {
        &self.imagery
    }

    /// Replace the playable regions and how they are weighted
    pub fn set_regions(&mut self, regions: &[Region], distribution: Distribution) {
        self.regions = regions.to_vec();
        let mut total = 0.0;
        self.weights = self
            .regions
            .iter()
            .map(|region| {
                total += match distribution {
                    Distribution::Uniform => 1.0,
                    Distribution::Weighted => region.approx_area().max(f64::MIN_POSITIVE),
                };
                total
            })
            .collect();
    }

    /// Start searching for a random valid location
    ///
    /// Only one search runs at a time; returns false (and keeps the running
    /// search) if one is already outstanding.
    pub fn request(&mut self, zoom: u8) -> bool {
        if let Some(pending) = &self.pending {
            log::debug!(
                "Location search already running ({} candidates rejected)",
                pending.attempts
            );
            return false;
        }
        self.pending = Some(LocationRequest {
            zoom,
            radius_m: search_radius_m(zoom),
            attempts: 0,
        });
        true
    }

    /// Drop the outstanding search, if any
    pub fn cancel(&mut self) -> Option<LocationRequest> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<&LocationRequest> {
        self.pending.as_ref()
    }

    /// Spend this poll's attempt budget on the outstanding search
    pub fn poll(&mut self) -> Poll<Destination> {
        let Some(mut request) = self.pending else {
            return Poll::Pending;
        };
        for _ in 0..self.attempts_per_poll {
            let found = self
                .sample_candidate()
                .and_then(|candidate| self.imagery.find_panorama(candidate, request.radius_m));
            if let Some(panorama) = found {
                self.pending = None;
                log::debug!(
                    "Panorama {} accepted after {} rejected candidates",
                    panorama.id,
                    request.attempts
                );
                return Poll::Ready(panorama.into());
            }
            request.attempts += 1;
        }
        self.pending = Some(request);
        Poll::Pending
    }

    /// Random point inside a playable region (or anywhere on earth)
    fn sample_candidate(&mut self) -> Option<Coordinate> {
        if self.regions.is_empty() {
            // Uniform over the sphere
            let z: f64 = self.rng.random_range(-1.0..=1.0);
            let lat = z.asin().to_degrees();
            let lng = self.rng.random_range(-180.0..=180.0);
            return Coordinate::new(lat, lng).ok();
        }

        let total = self.weights.last().copied().unwrap_or(0.0);
        let pick = self.rng.random_range(0.0..total);
        let index = self
            .weights
            .iter()
            .position(|w| pick < *w)
            .unwrap_or(self.regions.len() - 1);
        let bounds = self.regions[index].bounds();

        for _ in 0..REGION_SAMPLE_TRIES {
            let lat = self.rng.random_range(bounds.south..=bounds.north);
            let lng = self.rng.random_range(bounds.west..=bounds.east);
            let candidate = Coordinate::new(lat, lng).ok()?;
            if self.regions[index].contains(candidate) {
                return Some(candidate);
            }
        }
        None
    }
}
