//! Core seams of the planner.
//!
//! Kept small so tests and embedding apps can swap in their own routing
//! backends and matrix sources.

use std::sync::Arc;

use crate::error::Result;
use crate::matrix::DistanceMatrix;

/// Anything with a position on the globe.
pub trait Located {
    /// Location coordinates (lat, lng) in degrees.
    fn location(&self) -> (f64, f64);
}

impl Located for (f64, f64) {
    fn location(&self) -> (f64, f64) {
        *self
    }
}

/// A (possibly remote) point-to-point routing computation.
///
/// Implementations answer one query per call and never cache.
pub trait RoutingBackend {
    /// Compute distance/duration tables for `locations` (lat, lng), indexed
    /// by the provided order.
    fn table(&self, locations: &[(f64, f64)]) -> Result<DistanceMatrix>;
}

/// Provides a distance/time matrix for a set of locations.
///
/// The matrix is indexed by the provided location order.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Result<Arc<DistanceMatrix>>;
}

impl<T: DistanceMatrixProvider + ?Sized> DistanceMatrixProvider for Arc<T> {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Result<Arc<DistanceMatrix>> {
        (**self).matrix_for(locations)
    }
}
