//! Domain data carried through a planning run.
//!
//! Field names serialize in camelCase so the same structs can be used on both
//! sides of the JSON boundary (planning requests in, itineraries out).

use serde::{Deserialize, Serialize};

use crate::traits::Located;

/// A candidate sightseeing place.
///
/// Times are integers in whatever unit the caller picked (usually minutes
/// since midnight). The planner only ever looks at window widths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub open_time: i32,
    #[serde(default)]
    pub close_time: i32,
    #[serde(default)]
    pub ideal_start_time: i32,
    #[serde(default)]
    pub ideal_end_time: i32,
    #[serde(default)]
    pub explore_time: i32,
    /// Lower is more important.
    #[serde(default)]
    pub priority: i32,
}

impl Place {
    /// A place with no windows, zero duration and zero priority.
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            latitude,
            longitude,
            open_time: 0,
            close_time: 0,
            ideal_start_time: 0,
            ideal_end_time: 0,
            explore_time: 0,
            priority: 0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_opening_hours(mut self, open: i32, close: i32) -> Self {
        self.open_time = open;
        self.close_time = close;
        self
    }

    pub fn with_ideal_window(mut self, start: i32, end: i32) -> Self {
        self.ideal_start_time = start;
        self.ideal_end_time = end;
        self
    }

    pub fn with_explore_time(mut self, explore_time: i32) -> Self {
        self.explore_time = explore_time;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Width of the operating window (`close - open`).
    pub fn time_window_width(&self) -> f64 {
        f64::from(self.close_time) - f64::from(self.open_time)
    }

    /// Width of the preferred visiting window (`ideal_end - ideal_start`).
    pub fn ideal_window_width(&self) -> f64 {
        f64::from(self.ideal_end_time) - f64::from(self.ideal_start_time)
    }
}

impl Located for Place {
    fn location(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// The home base every daily route starts and ends at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Anchor {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

impl Located for Anchor {
    fn location(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// Places assigned to one day. Never empty when produced by the clusterer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cluster {
    pub places: Vec<Place>,
}

impl Cluster {
    pub fn new(places: Vec<Place>) -> Self {
        Self { places }
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

/// Inbound planning request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Requested day count. Signed so that bad requests can be reported
    /// instead of failing deserialization.
    pub days: i64,
    pub hotel: Anchor,
    pub places: Vec<Place>,
}

/// Payload handed to the itinerary text generator: day groups plus their
/// visiting orders, index-aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatterRequest {
    pub clusters: Vec<Vec<Place>>,
    pub optimized_itineraries: Vec<Vec<Place>>,
}
