//! Upcoming departures for one leg of a journey.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::model::{Direction, TransitFeed, Trip, short_trip_id};

/// Which trips and stops make up a leg.
#[derive(Debug, Clone, Default)]
pub struct LegQuery {
    /// Accepted route ids; empty accepts every route.
    pub routes: Vec<String>,
    pub direction: Option<Direction>,
    /// Case-sensitive substring of the trip headsign.
    pub headsign_contains: Option<String>,
    pub origin_stop_ids: Vec<String>,
    pub destination_stop_ids: Vec<String>,
    /// Drop trips that never reach a destination stop after the origin.
    pub require_destination: bool,
    pub limit: usize,
}

/// One trip that serves a leg.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegOption {
    pub trip_id: String,
    pub route_id: String,
    pub direction: Option<Direction>,
    pub headsign: String,
    /// Departure from the origin stop.
    pub departure: DateTime<Utc>,
    /// Arrival at the destination stop, when the feed predicts one.
    pub arrival: Option<DateTime<Utc>>,
}

impl LegOption {
    pub fn short_id(&self) -> &str {
        short_trip_id(&self.trip_id)
    }
}

impl LegQuery {
    fn accepts(&self, trip: &Trip) -> bool {
        if !self.routes.is_empty() && !self.routes.iter().any(|r| r == &trip.route_id) {
            return false;
        }
        if self.direction.is_some() && trip.direction != self.direction {
            return false;
        }
        match &self.headsign_contains {
            Some(text) => trip.headsign.contains(text.as_str()),
            None => true,
        }
    }

    fn is_origin(&self, stop_id: &str) -> bool {
        self.origin_stop_ids.iter().any(|s| s == stop_id)
    }

    fn is_destination(&self, stop_id: &str) -> bool {
        self.destination_stop_ids.iter().any(|s| s == stop_id)
    }

    /// Origin departure and destination arrival of `trip`, if it serves the leg.
    fn evaluate(&self, trip: &Trip, now: DateTime<Utc>) -> Option<LegOption> {
        let mut stops = trip.stop_time_updates.iter();

        let departure = stops
            .by_ref()
            .find(|s| self.is_origin(&s.stop_id) && s.departure.is_some())
            .and_then(|s| s.departure)?;

        if departure <= now {
            return None;
        }

        let mut reaches_destination = false;
        let mut arrival = None;
        for stop in stops.filter(|s| self.is_destination(&s.stop_id)) {
            reaches_destination = true;
            if stop.arrival.is_some() {
                arrival = stop.arrival;
                break;
            }
        }

        if self.require_destination && !reaches_destination {
            return None;
        }

        Some(LegOption {
            trip_id: trip.trip_id.clone(),
            route_id: trip.route_id.clone(),
            direction: trip.direction,
            headsign: trip.headsign.clone(),
            departure,
            arrival,
        })
    }
}

/// Trips of `feed` serving `query` that leave the origin after `now`,
/// earliest first, at most `query.limit` of them.
pub fn find_legs(feed: &TransitFeed, query: &LegQuery, now: DateTime<Utc>) -> Vec<LegOption> {
    let candidates: Vec<&Trip> = feed.trips.iter().filter(|t| query.accepts(t)).collect();
    debug!(
        group = %feed.group,
        candidates = candidates.len(),
        "Trips matching route, direction and headsign"
    );

    let mut options: Vec<LegOption> = candidates
        .into_iter()
        .filter_map(|t| query.evaluate(t, now))
        .collect();

    options.sort_by(|a, b| a.departure.cmp(&b.departure));
    options.truncate(query.limit);
    options
}
