//! trip-planner core
//!
//! Splits candidate sightseeing places into day-sized geographic clusters and
//! orders each day's visits around a fixed home base.

pub mod error;
pub mod model;
pub mod traits;
pub mod haversine;
pub mod matrix;
pub mod osrm;
#[doc(hidden)]
pub mod osrm_data;
pub mod cluster;
pub mod solver;
pub mod planner;

pub use error::{Error, Result, UpstreamError};
