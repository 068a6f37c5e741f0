//! Daily route optimization.
//!
//! For one day's places and the anchor, every visiting order is enumerated
//! depth-first and scored with a weighted cost mixing travel effort, window
//! widths and priority. The anchor is matrix index 0 and closes every route.
//!
//! The search is exponential in the number of places, so it only runs for
//! day-sized groups. Whenever it cannot run (router down, bad matrix, too many
//! places, no reachable ordering, deadline hit) the optimizer degrades to a
//! nearest-first ordering by straight-line distance and says so in the result.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result, UpstreamError};
use crate::haversine::distance_between;
use crate::matrix::DistanceMatrix;
use crate::model::{Anchor, Place};
use crate::traits::{DistanceMatrixProvider, Located};

/// Upper bound on places per search; the visited set is a `u32` bitmask and
/// the path a fixed array.
pub const MAX_SEARCH_PLACES: usize = 16;

/// Weights of the leg cost function.
///
/// ```text
/// cost = distance_km·distance_per_km + duration_min·duration_per_minute
///      + (time_window / window_unit)·time_window
///      + (ideal_window / window_unit)·ideal_window
///      + priority·priority
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CostWeights {
    pub distance_per_km: f64,
    pub duration_per_minute: f64,
    pub time_window: f64,
    pub ideal_window: f64,
    pub priority: f64,
    /// Divisor applied to both window widths.
    pub window_unit: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            distance_per_km: 3.0,
            duration_per_minute: 5.0,
            time_window: 5.0,
            ideal_window: 2.0,
            priority: 3.0,
            window_unit: 30.0,
        }
    }
}

impl CostWeights {
    /// Cost of arriving somewhere over a leg of `distance_m` meters and
    /// `duration_s` seconds.
    pub fn cost(
        &self,
        distance_m: f64,
        duration_s: f64,
        time_window: f64,
        ideal_window: f64,
        priority: f64,
    ) -> f64 {
        (distance_m / 1000.0) * self.distance_per_km
            + (duration_s / 60.0) * self.duration_per_minute
            + (time_window / self.window_unit) * self.time_window
            + (ideal_window / self.window_unit) * self.ideal_window
            + priority * self.priority
    }

    /// Cost of stepping onto `place`.
    pub fn arrival_cost(&self, distance_m: f64, duration_s: f64, place: &Place) -> f64 {
        self.cost(
            distance_m,
            duration_s,
            place.time_window_width(),
            place.ideal_window_width(),
            f64::from(place.priority),
        )
    }

    /// Cost of the closing leg back to the anchor: travel effort only.
    pub fn return_cost(&self, distance_m: f64, duration_s: f64) -> f64 {
        self.cost(distance_m, duration_s, 0.0, 0.0, 0.0)
    }
}

/// [`CostWeights::cost`] with the default weights.
pub fn compute_cost(
    distance_m: f64,
    duration_s: f64,
    time_window: f64,
    ideal_window: f64,
    priority: i32,
) -> f64 {
    CostWeights::default().cost(
        distance_m,
        duration_s,
        time_window,
        ideal_window,
        f64::from(priority),
    )
}

#[derive(Debug, Clone)]
pub struct SolveOptions {
    pub weights: CostWeights,
    /// Days with more places than this skip the search. Clamped to
    /// [`MAX_SEARCH_PLACES`].
    pub max_search_places: usize,
    /// Wall-clock budget for one day's search.
    pub deadline: Option<Duration>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            weights: CostWeights::default(),
            max_search_places: 10,
            deadline: None,
        }
    }
}

/// Shared cancellation switch for a planning run.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a route came from the fallback ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FallbackReason {
    /// The matrix could not be obtained or was unusable.
    Upstream { message: String },
    /// Every ordering contained an unreachable leg.
    NoFiniteRoute,
    TooManyPlaces { count: usize, limit: usize },
    DeadlineExceeded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteOutcome {
    Optimal { cost: f64 },
    Degraded { reason: FallbackReason },
}

/// One day's visiting order. The anchor is implicit at both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub places: Vec<Place>,
    #[serde(flatten)]
    pub outcome: RouteOutcome,
}

impl Route {
    pub fn cost(&self) -> Option<f64> {
        match self.outcome {
            RouteOutcome::Optimal { cost } => Some(cost),
            RouteOutcome::Degraded { .. } => None,
        }
    }

    pub fn is_optimal(&self) -> bool {
        matches!(self.outcome, RouteOutcome::Optimal { .. })
    }

    pub fn is_degraded(&self) -> bool {
        !self.is_optimal()
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match &self.outcome {
            RouteOutcome::Degraded { reason } => Some(reason),
            RouteOutcome::Optimal { .. } => None,
        }
    }
}

/// `places` sorted by straight-line distance from `anchor`, nearest first.
/// Equal distances keep input order.
pub fn fallback_order(places: &[Place], anchor: &Anchor) -> Vec<Place> {
    let mut ordered = places.to_vec();
    ordered.sort_by(|a, b| distance_between(anchor, a).total_cmp(&distance_between(anchor, b)));
    ordered
}

pub struct DailyRouteOptimizer<M> {
    provider: M,
    options: SolveOptions,
}

impl<M: DistanceMatrixProvider> DailyRouteOptimizer<M> {
    pub fn new(provider: M) -> Self {
        Self::with_options(provider, SolveOptions::default())
    }

    pub fn with_options(provider: M, options: SolveOptions) -> Self {
        Self { provider, options }
    }

    pub fn provider(&self) -> &M {
        &self.provider
    }

    pub fn options(&self) -> &SolveOptions {
        &self.options
    }

    /// Best visiting order for `day_places`, or the fallback ordering.
    /// Never fails.
    pub fn optimize(&self, day_places: &[Place], anchor: &Anchor) -> Route {
        match self.run(day_places, anchor, None) {
            Ok(route) => route,
            // Only cancellation aborts a run, and there is no flag here.
            Err(err) => degraded(day_places, anchor, FallbackReason::Upstream {
                message: err.to_string(),
            }),
        }
    }

    /// Like [`optimize`](Self::optimize), but returns [`Error::Cancelled`]
    /// once `cancel` is set. The flag is checked before each top-level branch.
    pub fn optimize_cancellable(
        &self,
        day_places: &[Place],
        anchor: &Anchor,
        cancel: &CancelFlag,
    ) -> Result<Route> {
        self.run(day_places, anchor, Some(cancel))
    }

    fn run(&self, day_places: &[Place], anchor: &Anchor, cancel: Option<&CancelFlag>) -> Result<Route> {
        if cancel.is_some_and(CancelFlag::is_cancelled) {
            return Err(Error::Cancelled);
        }
        if day_places.is_empty() {
            return Ok(Route {
                places: Vec::new(),
                outcome: RouteOutcome::Optimal { cost: 0.0 },
            });
        }

        let limit = self.options.max_search_places.min(MAX_SEARCH_PLACES);
        if day_places.len() > limit {
            return Ok(degraded(day_places, anchor, FallbackReason::TooManyPlaces {
                count: day_places.len(),
                limit,
            }));
        }

        let mut locations = Vec::with_capacity(day_places.len() + 1);
        locations.push(anchor.location());
        locations.extend(day_places.iter().map(Located::location));

        let matrix = match self.fetch_matrix(&locations) {
            Ok(matrix) => matrix,
            Err(err) => {
                return Ok(degraded(day_places, anchor, FallbackReason::Upstream {
                    message: err.to_string(),
                }));
            }
        };

        let search = Search::new(&matrix, day_places, &self.options.weights);
        let guard = Guard {
            cancel,
            started: Instant::now(),
            deadline: self.options.deadline,
        };

        match search.run(&guard) {
            Ok(Some((order, cost))) => {
                info!(places = day_places.len(), cost, "best route found");
                Ok(Route {
                    places: order.iter().map(|&i| day_places[i].clone()).collect(),
                    outcome: RouteOutcome::Optimal { cost },
                })
            }
            Ok(None) => Ok(degraded(day_places, anchor, FallbackReason::NoFiniteRoute)),
            Err(Abort::Deadline) => Ok(degraded(day_places, anchor, FallbackReason::DeadlineExceeded)),
            Err(Abort::Cancelled) => Err(Error::Cancelled),
        }
    }

    fn fetch_matrix(&self, locations: &[(f64, f64)]) -> Result<Arc<DistanceMatrix>> {
        let matrix = self.provider.matrix_for(locations)?;
        if matrix.len() != locations.len() {
            return Err(UpstreamError::ShapeMismatch {
                expected: locations.len(),
                found: matrix.len(),
            }
            .into());
        }
        Ok(matrix)
    }
}

fn degraded(day_places: &[Place], anchor: &Anchor, reason: FallbackReason) -> Route {
    warn!(places = day_places.len(), ?reason, "falling back to distance-sorted order");
    Route {
        places: fallback_order(day_places, anchor),
        outcome: RouteOutcome::Degraded { reason },
    }
}

enum Abort {
    Cancelled,
    Deadline,
}

struct Guard<'a> {
    cancel: Option<&'a CancelFlag>,
    started: Instant,
    deadline: Option<Duration>,
}

impl Guard<'_> {
    fn check(&self) -> std::result::Result<(), Abort> {
        if self.cancel.is_some_and(CancelFlag::is_cancelled) {
            return Err(Abort::Cancelled);
        }
        if self.deadline.is_some_and(|limit| self.started.elapsed() >= limit) {
            return Err(Abort::Deadline);
        }
        Ok(())
    }
}

/// Search state for one branch. Copied into each child, never shared.
#[derive(Clone, Copy)]
struct Branch {
    visited: u32,
    /// Matrix index of the current position (0 = anchor).
    at: usize,
    depth: usize,
    cost: f64,
    path: [u8; MAX_SEARCH_PLACES],
}

impl Branch {
    fn start() -> Self {
        Self {
            visited: 0,
            at: 0,
            depth: 0,
            cost: 0.0,
            path: [0; MAX_SEARCH_PLACES],
        }
    }

    fn step(&self, place: usize, leg_cost: f64) -> Self {
        let mut next = *self;
        next.visited |= 1 << place;
        next.at = place + 1;
        next.path[self.depth] = place as u8;
        next.depth += 1;
        next.cost += leg_cost;
        next
    }
}

struct Best {
    cost: f64,
    order: Option<Vec<usize>>,
}

struct Search {
    n: usize,
    /// `legs[from][to]` over matrix indices; `to == 0` is the return leg.
    legs: Vec<Vec<f64>>,
    /// Bounding is only sound when no leg can lower the running cost.
    prune: bool,
}

impl Search {
    fn new(matrix: &DistanceMatrix, places: &[Place], weights: &CostWeights) -> Self {
        let size = places.len() + 1;
        let legs: Vec<Vec<f64>> = (0..size)
            .map(|from| {
                (0..size)
                    .map(|to| {
                        let distance = matrix.distance(from, to);
                        let duration = matrix.duration(from, to);
                        if to == 0 {
                            weights.return_cost(distance, duration)
                        } else {
                            weights.arrival_cost(distance, duration, &places[to - 1])
                        }
                    })
                    .collect()
            })
            .collect();
        let prune = legs.iter().flatten().all(|cost| *cost >= 0.0);

        Self {
            n: places.len(),
            legs,
            prune,
        }
    }

    /// Best order (indices into the day's places) and its cost; `None` when
    /// no ordering has a finite cost.
    fn run(&self, guard: &Guard<'_>) -> std::result::Result<Option<(Vec<usize>, f64)>, Abort> {
        let mut best = Best {
            cost: f64::INFINITY,
            order: None,
        };
        self.expand(Branch::start(), &mut best, guard)?;
        debug!(cost = best.cost, "search complete");
        Ok(best.order.map(|order| (order, best.cost)))
    }

    fn expand(&self, branch: Branch, best: &mut Best, guard: &Guard<'_>) -> std::result::Result<(), Abort> {
        if branch.depth == self.n {
            let total = branch.cost + self.legs[branch.at][0];
            // Strict: the first ordering found at a given cost is kept.
            if total < best.cost {
                best.cost = total;
                best.order = Some(branch.path[..self.n].iter().map(|&i| usize::from(i)).collect());
            }
            return Ok(());
        }

        for place in 0..self.n {
            if branch.visited & (1 << place) != 0 {
                continue;
            }
            if branch.depth == 0 {
                guard.check()?;
            }

            let next = branch.step(place, self.legs[branch.at][place + 1]);
            if self.prune && next.cost >= best.cost {
                continue;
            }
            self.expand(next, best, guard)?;
        }
        Ok(())
    }
}
