//! Coordinate jitter and H3 cell assignment.
//!
//! Events geocoded without a house number resolve to a street or
//! neighborhood centroid; many such events would pile onto a single
//! coordinate and distort the cell histogram. A small Gaussian jitter
//! spreads them before cell assignment. The RNG seed is an explicit
//! parameter so runs are reproducible.

use h3o::{CellIndex, LatLng, Resolution};
use rand::SeedableRng as _;
use rand::rngs::StdRng;
use rand_distr::{Distribution as _, Normal};

/// H3 resolution for spatial cells (~50 m hexagons).
pub const CELL_RESOLUTION: Resolution = Resolution::Nine;

/// Standard deviation of the coordinate jitter, in meters.
pub const JITTER_SIGMA_METERS: f64 = 30.0;

/// Approximate meters per degree of latitude.
const METERS_PER_DEGREE_LAT: f64 = 111_000.0;

/// Approximate meters per degree of longitude at Recife's latitude.
const METERS_PER_DEGREE_LON: f64 = 110_000.0;

/// Seeded Gaussian jitter source.
pub struct Jitter {
    rng: StdRng,
    lat: Normal<f64>,
    lon: Normal<f64>,
}

impl Jitter {
    /// Creates a jitter source from an explicit seed.
    ///
    /// # Panics
    ///
    /// Panics if the jitter standard deviation constant is not finite,
    /// which cannot happen.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        let sigma_lat = JITTER_SIGMA_METERS / METERS_PER_DEGREE_LAT;
        let sigma_lon = JITTER_SIGMA_METERS / METERS_PER_DEGREE_LON;
        Self {
            rng: StdRng::seed_from_u64(seed),
            lat: Normal::new(0.0, sigma_lat).expect("finite standard deviation"),
            lon: Normal::new(0.0, sigma_lon).expect("finite standard deviation"),
        }
    }

    /// Returns a jittered copy of the given coordinates.
    pub fn apply(&mut self, latitude: f64, longitude: f64) -> (f64, f64) {
        (
            latitude + self.lat.sample(&mut self.rng),
            longitude + self.lon.sample(&mut self.rng),
        )
    }
}

/// Assigns the H3 cell containing the given coordinates.
///
/// Returns `None` for coordinates outside the valid latitude/longitude
/// domain.
#[must_use]
pub fn assign_cell(latitude: f64, longitude: f64) -> Option<CellIndex> {
    LatLng::new(latitude, longitude)
        .ok()
        .map(|coords| coords.to_cell(CELL_RESOLUTION))
}
