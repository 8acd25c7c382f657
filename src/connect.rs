//! Transfer matching between consecutive legs.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::query::LegOption;

/// A chain of leg options, one per leg, joined at transfers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itinerary {
    pub legs: Vec<LegOption>,
}

impl Itinerary {
    pub fn departure(&self) -> Option<DateTime<Utc>> {
        self.legs.first().map(|l| l.departure)
    }

    pub fn arrival(&self) -> Option<DateTime<Utc>> {
        self.legs.last().and_then(|l| l.arrival)
    }

    /// Door-to-door minutes from the first departure to the final arrival,
    /// rounded to the nearest minute.
    pub fn total_minutes(&self) -> Option<i64> {
        let seconds = (self.arrival()? - self.departure()?).num_seconds();
        Some((seconds as f64 / 60.0).round() as i64)
    }
}

/// The earliest `downstream` option leaving at least `buffer` after
/// `upstream` arrives. `downstream` must be sorted by departure.
///
/// Returns `None` when the upstream option has no predicted arrival.
pub fn best_connection<'a>(
    upstream: &LegOption,
    downstream: &'a [LegOption],
    buffer: Duration,
) -> Option<&'a LegOption> {
    let ready_at = upstream.arrival? + buffer;
    downstream.iter().find(|d| d.departure >= ready_at)
}

/// Builds itineraries starting from each of the first `candidates` options
/// of the first leg, taking the best connection at every transfer.
///
/// Chains that cannot continue (no predicted arrival at a transfer, or no
/// later departure) are dropped.
pub fn chain_itineraries(
    legs: &[Vec<LegOption>],
    buffer: Duration,
    candidates: usize,
) -> Vec<Itinerary> {
    let Some((first, rest)) = legs.split_first() else {
        return Vec::new();
    };

    first
        .iter()
        .take(candidates)
        .filter_map(|start| {
            let mut chain = vec![start.clone()];
            for next in rest {
                let previous = chain.last()?;
                let connection = best_connection(previous, next, buffer)?;
                chain.push(connection.clone());
            }
            Some(Itinerary { legs: chain })
        })
        .collect()
}
