//! Stop-id lookup by station name keywords.

use std::collections::HashSet;

use serde::Serialize;

use crate::model::TransitFeed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeywordMatch {
    /// Every keyword must appear in the stop name.
    #[default]
    All,
    /// At least one keyword must appear.
    Any,
}

#[derive(Debug, Clone, Default)]
pub struct StopSearch {
    pub keywords: Vec<String>,
    pub mode: KeywordMatch,
    /// Only scan trips on these routes; empty scans every trip.
    pub routes: Vec<String>,
}

impl StopSearch {
    pub fn all<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn any<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: KeywordMatch::Any,
            ..Self::all(keywords)
        }
    }

    pub fn on_routes(mut self, routes: Vec<String>) -> Self {
        self.routes = routes;
        self
    }

    /// Splits a station name into lowercase search words:
    /// `"Clinton-Washington Avs"` → `["clinton", "washington", "avs"]`.
    pub fn for_station_name(name: &str) -> Self {
        Self::all(
            name.split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .map(str::to_lowercase),
        )
    }

    fn matches(&self, stop_name: &str) -> bool {
        if self.keywords.is_empty() {
            return false;
        }
        let name = stop_name.to_lowercase();
        let mut hits = self.keywords.iter().map(|k| name.contains(&k.to_lowercase()));
        match self.mode {
            KeywordMatch::All => hits.all(|hit| hit),
            KeywordMatch::Any => hits.any(|hit| hit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopMatch {
    pub stop_id: String,
    pub stop_name: String,
}

/// Stops served by `feed` whose names match `search`, deduplicated by stop
/// id in the order they are first seen.
pub fn find_stops(feed: &TransitFeed, search: &StopSearch) -> Vec<StopMatch> {
    let mut seen = HashSet::new();
    let mut matches = Vec::new();

    for trip in feed.trips_on(&search.routes) {
        for stop in &trip.stop_time_updates {
            if search.matches(&stop.stop_name) && seen.insert(stop.stop_id.as_str()) {
                matches.push(StopMatch {
                    stop_id: stop.stop_id.clone(),
                    stop_name: stop.stop_name.clone(),
                });
            }
        }
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::FeedGroup;
    use crate::model::fixtures::{message, trip_entity};
    use crate::stops::StopCatalog;

    fn ace_feed() -> TransitFeed {
        let msg = message(vec![
            trip_entity(
                "A..N",
                "A",
                &[
                    ("A44N", Some(1), Some(1)),
                    ("A42N", Some(2), Some(2)),
                    ("A38N", Some(5), Some(5)),
                    ("A36N", Some(6), Some(6)),
                ],
            ),
            trip_entity(
                "C..N",
                "C",
                &[("A42N", Some(3), Some(3)), ("A36N", Some(7), Some(7))],
            ),
            trip_entity("E..N", "E", &[("A34N", Some(9), Some(9))]),
        ]);
        TransitFeed::from_message(FeedGroup::Ace, &msg, &StopCatalog::embedded().unwrap())
    }

    #[test]
    fn test_all_keywords_must_match() {
        let found = find_stops(&ace_feed(), &StopSearch::all(["hoyt", "schermerhorn"]));

        assert_eq!(
            found,
            vec![StopMatch {
                stop_id: "A42N".to_string(),
                stop_name: "Hoyt-Schermerhorn Sts".to_string(),
            }]
        );
    }

    #[test]
    fn test_any_keyword_matches_in_first_seen_order() {
        let search = StopSearch::any(["wall", "chambers", "fulton", "canal"])
            .on_routes(vec!["A".to_string(), "C".to_string()]);
        let found = find_stops(&ace_feed(), &search);

        let ids: Vec<_> = found.iter().map(|m| m.stop_id.as_str()).collect();
        // A34N (Canal St) is only served by the E, which is filtered out
        assert_eq!(ids, vec!["A38N", "A36N"]);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let found = find_stops(&ace_feed(), &StopSearch::all(["CLINTON", "Washington"]));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].stop_id, "A44N");
    }

    #[test]
    fn test_station_name_keywords() {
        let search = StopSearch::for_station_name("Clinton-Washington Avs");
        assert_eq!(search.keywords, vec!["clinton", "washington", "avs"]);
        assert_eq!(search.mode, KeywordMatch::All);
    }

    #[test]
    fn test_empty_keywords_match_nothing() {
        assert!(find_stops(&ace_feed(), &StopSearch::default()).is_empty());
    }
}
