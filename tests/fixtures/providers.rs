//! In-memory matrix sources for tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use trip_planner::error::{Result, UpstreamError};
use trip_planner::haversine::HaversineBackend;
use trip_planner::matrix::DistanceMatrix;
use trip_planner::solver::CancelFlag;
use trip_planner::traits::{DistanceMatrixProvider, RoutingBackend};

/// Planar distance in degrees scaled to meters; 10 m/s travel speed.
pub struct EuclideanProvider;

pub fn euclidean_matrix(locations: &[(f64, f64)]) -> DistanceMatrix {
    let distances: Vec<Vec<f64>> = locations
        .iter()
        .map(|a| {
            locations
                .iter()
                .map(|b| ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt() * 111_000.0)
                .collect()
        })
        .collect();
    let durations = distances
        .iter()
        .map(|row| row.iter().map(|meters| meters / 10.0).collect())
        .collect();
    DistanceMatrix::new(distances, durations).expect("square by construction")
}

impl DistanceMatrixProvider for EuclideanProvider {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Result<Arc<DistanceMatrix>> {
        Ok(Arc::new(euclidean_matrix(locations)))
    }
}

/// Always unreachable.
pub struct FailingProvider;

impl DistanceMatrixProvider for FailingProvider {
    fn matrix_for(&self, _locations: &[(f64, f64)]) -> Result<Arc<DistanceMatrix>> {
        Err(UpstreamError::Unavailable("simulated outage".to_string()).into())
    }
}

pub struct FailingBackend;

impl RoutingBackend for FailingBackend {
    fn table(&self, _locations: &[(f64, f64)]) -> Result<DistanceMatrix> {
        Err(UpstreamError::Status(503).into())
    }
}

/// Haversine backend that counts how often it is queried.
#[derive(Clone, Default)]
pub struct CountingBackend {
    inner: HaversineBackend,
    calls: Arc<AtomicUsize>,
}

impl CountingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RoutingBackend for CountingBackend {
    fn table(&self, locations: &[(f64, f64)]) -> Result<DistanceMatrix> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.table(locations)
    }
}

/// Euclidean matrices, but cancels the run the first time a day asks for one.
pub struct CancellingProvider {
    pub cancel: CancelFlag,
}

impl DistanceMatrixProvider for CancellingProvider {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Result<Arc<DistanceMatrix>> {
        self.cancel.cancel();
        EuclideanProvider.matrix_for(locations)
    }
}
