//! Multi-day planning: cluster places into days, then order each day.

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cluster::GeoClusterer;
use crate::error::{Error, Result};
use crate::matrix::CachedMatrixProvider;
use crate::model::{Anchor, Cluster, FormatterRequest, Place, PlanRequest};
use crate::osrm::{OsrmClient, OsrmConfig};
use crate::solver::{CancelFlag, DailyRouteOptimizer, Route};
use crate::traits::DistanceMatrixProvider;

/// Result of a planning run. `optimized_itineraries[i]` orders `clusters[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub clusters: Vec<Cluster>,
    pub optimized_itineraries: Vec<Route>,
}

impl Itinerary {
    pub fn days(&self) -> usize {
        self.clusters.len()
    }

    /// Number of days that came from the fallback ordering.
    pub fn degraded_days(&self) -> usize {
        self.optimized_itineraries
            .iter()
            .filter(|route| route.is_degraded())
            .count()
    }

    /// Day groups and ordered places per day, as consumed by the itinerary
    /// text generator.
    pub fn formatter_request(&self) -> FormatterRequest {
        FormatterRequest {
            clusters: self
                .clusters
                .iter()
                .map(|cluster| cluster.places.clone())
                .collect(),
            optimized_itineraries: self
                .optimized_itineraries
                .iter()
                .map(|route| route.places.clone())
                .collect(),
        }
    }
}

pub struct TripPlanner<M> {
    clusterer: GeoClusterer,
    optimizer: DailyRouteOptimizer<M>,
}

impl TripPlanner<CachedMatrixProvider<OsrmClient>> {
    /// Planner backed by a cached OSRM client.
    pub fn with_osrm(config: OsrmConfig) -> Result<Self> {
        let provider = CachedMatrixProvider::new(OsrmClient::new(config)?);
        Ok(Self::new(provider))
    }
}

impl<M: DistanceMatrixProvider + Sync> TripPlanner<M> {
    pub fn new(provider: M) -> Self {
        Self::from_parts(GeoClusterer::default(), DailyRouteOptimizer::new(provider))
    }

    pub fn from_parts(clusterer: GeoClusterer, optimizer: DailyRouteOptimizer<M>) -> Self {
        Self {
            clusterer,
            optimizer,
        }
    }

    pub fn clusterer(&self) -> &GeoClusterer {
        &self.clusterer
    }

    pub fn optimizer(&self) -> &DailyRouteOptimizer<M> {
        &self.optimizer
    }

    pub fn plan<R: Rng + ?Sized>(&self, request: &PlanRequest, rng: &mut R) -> Result<Itinerary> {
        self.plan_cancellable(request, rng, &CancelFlag::new())
    }

    /// Plans every day; cancelling `cancel` fails the whole run with
    /// [`Error::Cancelled`].
    pub fn plan_cancellable<R: Rng + ?Sized>(
        &self,
        request: &PlanRequest,
        rng: &mut R,
        cancel: &CancelFlag,
    ) -> Result<Itinerary> {
        self.plan_days(&request.places, &request.hotel, request.days, rng, cancel)
    }

    pub fn plan_days<R: Rng + ?Sized>(
        &self,
        places: &[Place],
        anchor: &Anchor,
        days: i64,
        rng: &mut R,
        cancel: &CancelFlag,
    ) -> Result<Itinerary> {
        if places.is_empty() {
            return Err(Error::invalid_input("places list cannot be empty"));
        }
        if days <= 0 {
            return Err(Error::invalid_input(format!(
                "day count must be positive, got {days}"
            )));
        }
        let days = usize::try_from(days).unwrap_or(usize::MAX);

        let clusters = self.clusterer.cluster(places, days, rng)?;
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let routes = clusters
            .par_iter()
            .map(|cluster| {
                self.optimizer
                    .optimize_cancellable(&cluster.places, anchor, cancel)
            })
            .collect::<Result<Vec<Route>>>()?;

        let itinerary = Itinerary {
            clusters,
            optimized_itineraries: routes,
        };
        info!(
            days = itinerary.days(),
            degraded = itinerary.degraded_days(),
            "itinerary planned"
        );
        Ok(itinerary)
    }
}
