//! Uniform rejection sampling of points inside zone polygons.
//!
//! A candidate is drawn uniformly from the zone's bounding rectangle and kept
//! only if it falls inside the zone (boundary included), so accepted points are
//! uniform over the zone's area.

use crate::core::zones::Zone;
use crate::domain::model::{Coordinate, PointPair};
use geo::{Area, BoundingRect, Intersects, Point};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplingError {
    #[error("zone {code} has zero area, no point can be sampled in it")]
    DegenerateZone { code: u64 },

    #[error("no point accepted in zone {code} after {attempts} draws")]
    Exhausted { code: u64, attempts: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub point: Point<f64>,
    /// Draws it took, the accepted one included.
    pub attempts: usize,
}

/// Seeded when reproducibility is wanted, OS entropy otherwise.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

pub fn sample_point<R: Rng>(
    rng: &mut R,
    zone: &Zone,
    max_attempts: usize,
) -> Result<Sample, SamplingError> {
    let degenerate = SamplingError::DegenerateZone { code: zone.code };
    let rect = zone.geometry.bounding_rect().ok_or_else(|| degenerate.clone())?;
    if zone.geometry.unsigned_area() <= 0.0 {
        return Err(degenerate);
    }

    let (min, max) = (rect.min(), rect.max());
    for attempt in 1..=max_attempts {
        let candidate = Point::new(
            rng.random_range(min.x..=max.x),
            rng.random_range(min.y..=max.y),
        );
        if zone.geometry.intersects(&candidate) {
            return Ok(Sample {
                point: candidate,
                attempts: attempt,
            });
        }
    }

    Err(SamplingError::Exhausted {
        code: zone.code,
        attempts: max_attempts,
    })
}

/// `n` pairs with origin and destination drawn independently.
pub fn sample_pairs<R: Rng>(
    rng: &mut R,
    origin: &Zone,
    destination: &Zone,
    n: usize,
    max_attempts: usize,
) -> Result<Vec<PointPair>, SamplingError> {
    let mut pairs = Vec::with_capacity(n);
    for _ in 0..n {
        let a = sample_point(rng, origin, max_attempts)?;
        let b = sample_point(rng, destination, max_attempts)?;
        pairs.push(PointPair::new(
            Coordinate::from(a.point),
            Coordinate::from(b.point),
        ));
    }
    Ok(pairs)
}
