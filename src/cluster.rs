//! Geographic clustering of places into days.
//!
//! Lloyd-style iteration over great-circle distance:
//!
//! 1. Seed `k` centroids from `k` distinct places drawn at random
//! 2. **Assign**: each place goes to its nearest centroid (lowest index on ties)
//! 3. **Repair**: an empty cluster takes a random place out of a cluster that
//!    can spare one
//! 4. **Update**: each centroid moves to the mean coordinate of its members
//! 5. Stop once no centroid moved more than `epsilon_km`, or at the cap
//!
//! The random source is passed in by the caller so a fixed seed reproduces
//! the same membership.

use rand::Rng;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::haversine::haversine_km;
use crate::model::{Cluster, Place};
use crate::traits::Located;

#[derive(Debug, Clone)]
pub struct ClusterOptions {
    /// Hard cap on assign/update rounds.
    pub max_iterations: usize,
    /// Centroid movement (km) below which a centroid counts as settled.
    pub epsilon_km: f64,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            epsilon_km: 1e-6,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GeoClusterer {
    options: ClusterOptions,
}

impl GeoClusterer {
    pub fn new(options: ClusterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    /// Partition `places` into `min(days, places.len())` non-empty clusters.
    ///
    /// Every place lands in exactly one cluster; members keep input order.
    pub fn cluster<R: Rng + ?Sized>(
        &self,
        places: &[Place],
        days: usize,
        rng: &mut R,
    ) -> Result<Vec<Cluster>> {
        let groups = self.assign(places, days, rng)?;
        Ok(groups
            .into_iter()
            .map(|members| Cluster::new(members.into_iter().map(|i| places[i].clone()).collect()))
            .collect())
    }

    /// Index-level clustering: returns, per cluster, the indices of its members.
    pub fn assign<T: Located, R: Rng + ?Sized>(
        &self,
        items: &[T],
        days: usize,
        rng: &mut R,
    ) -> Result<Vec<Vec<usize>>> {
        if items.is_empty() {
            return Err(Error::invalid_input("places list cannot be empty"));
        }
        if days == 0 {
            return Err(Error::invalid_input("day count must be at least 1"));
        }

        let points: Vec<(f64, f64)> = items.iter().map(Located::location).collect();
        let k = days.min(points.len());

        let mut centroids: Vec<(f64, f64)> = rand::seq::index::sample(rng, points.len(), k)
            .into_iter()
            .map(|i| points[i])
            .collect();
        let mut labels = vec![0usize; points.len()];
        let mut iterations = 0;

        while iterations < self.options.max_iterations {
            iterations += 1;

            for (label, point) in labels.iter_mut().zip(&points) {
                *label = nearest_centroid(*point, &centroids);
            }
            repair_empty_clusters(&mut labels, k, rng);

            let mut changed = false;
            for (c, centroid) in centroids.iter_mut().enumerate() {
                let Some(mean) = mean_location(&points, &labels, c) else {
                    continue;
                };
                if haversine_km(mean, *centroid) > self.options.epsilon_km {
                    *centroid = mean;
                    changed = true;
                }
            }

            if !changed {
                break;
            }
        }

        let mut groups = vec![Vec::new(); k];
        for (i, label) in labels.iter().enumerate() {
            groups[*label].push(i);
        }

        info!(iterations, clusters = k, "clustering finished");
        for (day, members) in groups.iter().enumerate() {
            debug!(day = day + 1, size = members.len(), "cluster size");
        }

        Ok(groups)
    }
}

/// Index of the closest centroid. Strict comparison keeps the first on ties.
fn nearest_centroid(point: (f64, f64), centroids: &[(f64, f64)]) -> usize {
    let mut nearest = 0;
    let mut min_dist = f64::MAX;
    for (i, centroid) in centroids.iter().enumerate() {
        let dist = haversine_km(point, *centroid);
        if dist < min_dist {
            min_dist = dist;
            nearest = i;
        }
    }
    nearest
}

/// Give every empty cluster one member, taken at random from the places whose
/// cluster has at least two members. `k <= labels.len()` guarantees a donor.
fn repair_empty_clusters<R: Rng + ?Sized>(labels: &mut [usize], k: usize, rng: &mut R) {
    let mut sizes = vec![0usize; k];
    for label in labels.iter() {
        sizes[*label] += 1;
    }

    for empty in 0..k {
        if sizes[empty] > 0 {
            continue;
        }
        let donors: Vec<usize> = (0..labels.len())
            .filter(|&i| sizes[labels[i]] > 1)
            .collect();
        if donors.is_empty() {
            break;
        }
        let moved = donors[rng.gen_range(0..donors.len())];
        sizes[labels[moved]] -= 1;
        labels[moved] = empty;
        sizes[empty] += 1;
    }
}

fn mean_location(points: &[(f64, f64)], labels: &[usize], cluster: usize) -> Option<(f64, f64)> {
    let mut count = 0usize;
    let mut lat = 0.0;
    let mut lng = 0.0;
    for (point, label) in points.iter().zip(labels) {
        if *label == cluster {
            count += 1;
            lat += point.0;
            lng += point.1;
        }
    }
    (count > 0).then(|| (lat / count as f64, lng / count as f64))
}
