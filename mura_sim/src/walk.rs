//! Seeded random-walk routes for demo mode.
//!
//! Each step displaces the previous point by `(u - 0.5) * delta` degrees on
//! each axis, `u` uniform in [0, 1). Routes are finite and never resumed: a
//! new call starts again from the origin.

use mura_core::Position;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Default number of points in a simulated route.
pub const DEFAULT_STEPS: usize = 40;

/// Default per-axis jitter magnitude in degrees.
pub const DEFAULT_DELTA_DEG: f64 = 0.0008;

/// A finite simulated route, excluding its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    origin: Position,
    points: Vec<Position>,
}

impl Route {
    /// Builds a route from explicit per-step displacements `(dlat, dlng)`.
    pub fn from_deltas(origin: Position, deltas: &[(f64, f64)]) -> Self {
        let mut last = origin;
        let points = deltas
            .iter()
            .map(|&(dlat, dlng)| {
                last = step(&last, dlat, dlng);
                last
            })
            .collect();
        Self { origin, points }
    }

    pub fn origin(&self) -> Position {
        self.origin
    }

    pub fn points(&self) -> &[Position] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<Position> {
        self.points.last().copied()
    }

    pub fn into_points(self) -> Vec<Position> {
        self.points
    }
}

/// Generates jittered routes from a seeded RNG.
pub struct RouteGenerator {
    /// Seed the RNG was created from
    seed: u64,

    rng: ChaCha8Rng,
}

impl RouteGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generates `steps` points starting from `origin`.
    pub fn make_route(&mut self, origin: Position, steps: usize, delta: f64) -> Route {
        let mut last = origin;
        let mut points = Vec::with_capacity(steps);

        for _ in 0..steps {
            let dlat = (self.rng.gen::<f64>() - 0.5) * delta;
            let dlng = (self.rng.gen::<f64>() - 0.5) * delta;
            last = step(&last, dlat, dlng);
            points.push(last);
        }

        Route { origin, points }
    }

    /// A route with the default step count and jitter.
    pub fn default_route(&mut self, origin: Position) -> Route {
        self.make_route(origin, DEFAULT_STEPS, DEFAULT_DELTA_DEG)
    }
}

/// Displaces a point and folds it back onto the globe.
fn step(from: &Position, dlat: f64, dlng: f64) -> Position {
    let mut next = from.offset(dlat, dlng);
    next.lat = next.lat.clamp(-90.0, 90.0);
    if next.lng > 180.0 {
        next.lng -= 360.0;
    } else if next.lng < -180.0 {
        next.lng += 360.0;
    }
    next
}
