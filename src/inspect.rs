//! Debug summaries of a decoded feed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::feeds::FeedGroup;
use crate::model::{Direction, StopTimeUpdate, TransitFeed};

#[derive(Debug, Clone, Serialize)]
pub struct TripSample {
    pub trip_id: String,
    pub route_id: String,
    pub direction: Option<Direction>,
    pub headsign: String,
    pub stop_count: usize,
    /// The first few stops of the trip.
    pub stops: Vec<StopTimeUpdate>,
}

impl TripSample {
    pub fn remaining_stops(&self) -> usize {
        self.stop_count.saturating_sub(self.stops.len())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedSummary {
    pub group: FeedGroup,
    pub timestamp: Option<DateTime<Utc>>,
    pub trip_count: usize,
    pub trips_per_route: BTreeMap<String, usize>,
    pub samples: Vec<TripSample>,
}

/// Counts trips per route and samples the first `samples` trips on `routes`
/// (all routes when empty), keeping `stops_per_trip` stops of each.
pub fn summarize(
    feed: &TransitFeed,
    routes: &[String],
    samples: usize,
    stops_per_trip: usize,
) -> FeedSummary {
    let mut trips_per_route = BTreeMap::new();
    for trip in &feed.trips {
        *trips_per_route.entry(trip.route_id.clone()).or_insert(0) += 1;
    }

    let samples = feed
        .trips_on(routes)
        .take(samples)
        .map(|trip| TripSample {
            trip_id: trip.trip_id.clone(),
            route_id: trip.route_id.clone(),
            direction: trip.direction,
            headsign: trip.headsign.clone(),
            stop_count: trip.stop_time_updates.len(),
            stops: trip
                .stop_time_updates
                .iter()
                .take(stops_per_trip)
                .cloned()
                .collect(),
        })
        .collect();

    FeedSummary {
        group: feed.group,
        timestamp: feed.timestamp,
        trip_count: feed.trips.len(),
        trips_per_route,
        samples,
    }
}
