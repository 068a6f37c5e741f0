//! Las Vegas area sights with plausible opening hours.
//!
//! Coordinates are approximate landmark positions; times are minutes since
//! midnight.

use trip_planner::model::{Anchor, Place};

/// A named sight with coordinates and visiting hints.
#[derive(Debug, Clone)]
pub struct Sight {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub open: i32,
    pub close: i32,
    pub priority: i32,
}

impl Sight {
    pub const fn new(name: &'static str, lat: f64, lng: f64, open: i32, close: i32, priority: i32) -> Self {
        Self {
            name,
            lat,
            lng,
            open,
            close,
            priority,
        }
    }

    pub fn to_place(&self) -> Place {
        Place::new(self.name, self.lat, self.lng)
            .with_opening_hours(self.open, self.close)
            .with_ideal_window(self.open, (self.open + 120).min(self.close))
            .with_explore_time(90)
            .with_priority(self.priority)
    }
}

pub fn strip_hotel() -> Anchor {
    Anchor::new("Bellagio", 36.1126, -115.1767)
}

// ============================================================================
// Downtown
// ============================================================================

pub const DOWNTOWN: &[Sight] = &[
    Sight::new("Fremont Street Experience", 36.1707, -115.1438, 600, 1440, 1),
    Sight::new("Neon Museum", 36.1770, -115.1354, 540, 1380, 1),
    Sight::new("Mob Museum", 36.1728, -115.1410, 540, 1260, 2),
    Sight::new("Springs Preserve", 36.1678, -115.1905, 540, 1020, 3),
];

// ============================================================================
// The Strip
// ============================================================================

pub const STRIP: &[Sight] = &[
    Sight::new("High Roller", 36.1175, -115.1682, 720, 1440, 2),
    Sight::new("Welcome to Las Vegas Sign", 36.0820, -115.1728, 0, 1440, 1),
    Sight::new("The STRAT Tower", 36.1475, -115.1566, 600, 1440, 2),
    Sight::new("Fountains of Bellagio", 36.1126, -115.1745, 900, 1440, 1),
];

// ============================================================================
// Out of town
// ============================================================================

pub const DAY_TRIPS: &[Sight] = &[
    Sight::new("Hoover Dam", 36.0160, -114.7377, 540, 1020, 1),
    Sight::new("Red Rock Canyon", 36.1357, -115.4270, 360, 1200, 1),
    Sight::new("Seven Magic Mountains", 35.8385, -115.2708, 0, 1440, 3),
    Sight::new("Valley of Fire", 36.4297, -114.5136, 420, 1140, 2),
];

pub fn all_sights() -> Vec<Place> {
    DOWNTOWN
        .iter()
        .chain(STRIP)
        .chain(DAY_TRIPS)
        .map(Sight::to_place)
        .collect()
}

pub fn sample_sights(count: usize) -> Vec<Place> {
    all_sights().into_iter().take(count).collect()
}
