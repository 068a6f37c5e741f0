//! Distance/duration matrices and the bounded cache in front of the router.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use tracing::debug;

use crate::error::{Error, Result, UpstreamError};
use crate::traits::{DistanceMatrixProvider, RoutingBackend};

/// Number of matrices kept before the least recently used one is evicted.
pub const DEFAULT_CACHE_CAPACITY: usize = 200;

/// Square travel tables: distances in meters, durations in seconds.
///
/// Unknown or unreachable legs hold `f64::INFINITY`.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    distances: Vec<Vec<f64>>,
    durations: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    /// Builds a matrix, rejecting tables that are not square or disagree in size.
    pub fn new(distances: Vec<Vec<f64>>, durations: Vec<Vec<f64>>) -> Result<Self> {
        let n = distances.len();
        check_square(&distances, n)?;
        check_square(&durations, n)?;
        Ok(Self {
            distances,
            durations,
        })
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.distances[from][to]
    }

    pub fn duration(&self, from: usize, to: usize) -> f64 {
        self.durations[from][to]
    }

    pub fn distances(&self) -> &[Vec<f64>] {
        &self.distances
    }

    pub fn durations(&self) -> &[Vec<f64>] {
        &self.durations
    }
}

fn check_square(table: &[Vec<f64>], n: usize) -> Result<()> {
    if table.len() != n {
        return Err(UpstreamError::ShapeMismatch {
            expected: n,
            found: table.len(),
        }
        .into());
    }
    if let Some(row) = table.iter().find(|row| row.len() != n) {
        return Err(UpstreamError::ShapeMismatch {
            expected: n,
            found: row.len(),
        }
        .into());
    }
    Ok(())
}

/// Order-sensitive cache key: `lon,lat;lon,lat;...`.
pub fn cache_key(locations: &[(f64, f64)]) -> String {
    locations
        .iter()
        .map(|(lat, lng)| format!("{},{}", lng, lat))
        .collect::<Vec<_>>()
        .join(";")
}

/// LRU-cached matrix provider wrapping a [`RoutingBackend`].
///
/// The cache only affects latency. Lookups, inserts and evictions are
/// serialized by one lock; the backend query runs outside of it, so two
/// concurrent misses on the same key both query and the later insert wins.
pub struct CachedMatrixProvider<B> {
    backend: B,
    cache: Mutex<LruCache<String, Arc<DistanceMatrix>>>,
}

impl<B: RoutingBackend> CachedMatrixProvider<B> {
    pub fn new(backend: B) -> Self {
        Self::with_capacity(backend, DEFAULT_CACHE_CAPACITY)
    }

    /// A zero capacity is bumped to one entry.
    pub fn with_capacity(backend: B, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            backend,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Number of cached matrices.
    pub fn cached_len(&self) -> usize {
        self.lock().len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Arc<DistanceMatrix>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<B: RoutingBackend> DistanceMatrixProvider for CachedMatrixProvider<B> {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Result<Arc<DistanceMatrix>> {
        if locations.is_empty() {
            return Err(Error::invalid_input("no coordinates to route"));
        }

        let key = cache_key(locations);
        if let Some(hit) = self.lock().get(&key) {
            debug!(points = locations.len(), "matrix cache hit");
            return Ok(Arc::clone(hit));
        }

        debug!(points = locations.len(), "matrix cache miss");
        let matrix = self.backend.table(locations)?;
        if matrix.len() != locations.len() {
            return Err(UpstreamError::ShapeMismatch {
                expected: locations.len(),
                found: matrix.len(),
            }
            .into());
        }

        let matrix = Arc::new(matrix);
        self.lock().put(key, Arc::clone(&matrix));
        Ok(matrix)
    }
}
