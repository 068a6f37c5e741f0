//! Test fixtures for trip-planner.
//!
//! Provides realistic sightseeing data around Las Vegas plus in-memory
//! matrix sources for driving the optimizer without a router.

#![allow(dead_code)]

pub mod las_vegas_sights;
pub mod providers;

pub use las_vegas_sights::*;
pub use providers::*;
