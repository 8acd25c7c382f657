//! Trip/stop object graph built from a decoded GTFS-RT feed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::feeds::FeedGroup;
use crate::gtfs_rt::trip_update::StopTimeEvent;
use crate::gtfs_rt::trip_update::stop_time_update::ScheduleRelationship;
use crate::gtfs_rt::{FeedMessage, TripDescriptor, TripUpdate, nyct_trip_descriptor};
use crate::stops::StopCatalog;

/// Serialized as its letter; deserialized through [`FromStr`], so config
/// files accept the same spellings as the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Direction {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "S")]
    South,
    #[serde(rename = "E")]
    East,
    #[serde(rename = "W")]
    West,
}

impl Direction {
    fn from_letter(c: char) -> Option<Direction> {
        match c.to_ascii_uppercase() {
            'N' => Some(Direction::North),
            'S' => Some(Direction::South),
            'E' => Some(Direction::East),
            'W' => Some(Direction::West),
            _ => None,
        }
    }

    /// Reads the direction letter of an NYCT trip id, e.g. `036000_G..S14R`.
    pub fn from_trip_id(trip_id: &str) -> Option<Direction> {
        let (_, rest) = trip_id.split_once('.')?;
        let c = rest.trim_start_matches('.').chars().next()?;
        match c {
            'N' | 'S' => Direction::from_letter(c),
            _ => None,
        }
    }

    /// Reads the platform suffix of an NYCT stop id, e.g. `G35S`.
    pub fn from_stop_id(stop_id: &str) -> Option<Direction> {
        match stop_id.chars().last()? {
            c @ ('N' | 'S') => Direction::from_letter(c),
            _ => None,
        }
    }

    fn from_nyct(direction: nyct_trip_descriptor::Direction) -> Direction {
        match direction {
            nyct_trip_descriptor::Direction::North => Direction::North,
            nyct_trip_descriptor::Direction::East => Direction::East,
            nyct_trip_descriptor::Direction::South => Direction::South,
            nyct_trip_descriptor::Direction::West => Direction::West,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Direction::North => "N",
            Direction::South => "S",
            Direction::East => "E",
            Direction::West => "W",
        };
        f.write_str(letter)
    }
}

impl FromStr for Direction {
    type Err = Error;

    /// Case-insensitive letter, name or `-bound` form: `"S"`, `"south"`,
    /// `"Southbound"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n" | "north" | "northbound" => Ok(Direction::North),
            "s" | "south" | "southbound" => Ok(Direction::South),
            "e" | "east" | "eastbound" => Ok(Direction::East),
            "w" | "west" | "westbound" => Ok(Direction::West),
            _ => Err(Error::UnknownDirection(s.to_string())),
        }
    }
}

impl TryFrom<String> for Direction {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Predicted arrival and departure at one stop of a trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopTimeUpdate {
    pub stop_id: String,
    pub stop_name: String,
    pub arrival: Option<DateTime<Utc>>,
    pub departure: Option<DateTime<Utc>>,
    pub track: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trip {
    pub trip_id: String,
    pub route_id: String,
    pub direction: Option<Direction>,
    /// Name of the trip's last stop.
    pub headsign: String,
    pub train_id: Option<String>,
    pub stop_time_updates: Vec<StopTimeUpdate>,
}

impl Trip {
    /// The last six characters of the trip id, used as a train label.
    pub fn short_id(&self) -> &str {
        short_trip_id(&self.trip_id)
    }
}

/// The last six characters of `trip_id` (the whole id when shorter).
pub fn short_trip_id(trip_id: &str) -> &str {
    match trip_id.char_indices().rev().nth(5) {
        Some((idx, _)) => &trip_id[idx..],
        None => trip_id,
    }
}

/// All trips of one feed group at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitFeed {
    pub group: FeedGroup,
    pub timestamp: Option<DateTime<Utc>>,
    pub trips: Vec<Trip>,
}

impl TransitFeed {
    pub fn from_message(group: FeedGroup, message: &FeedMessage, stops: &StopCatalog) -> Self {
        let trips = message
            .entity
            .iter()
            .filter(|e| !e.is_deleted())
            .filter_map(|e| e.trip_update.as_ref())
            .map(|update| build_trip(update, stops))
            .collect();

        TransitFeed {
            group,
            timestamp: message.header.timestamp.and_then(to_datetime_u64),
            trips,
        }
    }

    /// Trips whose route is in `routes`; every trip when `routes` is empty.
    pub fn trips_on<'a>(&'a self, routes: &'a [String]) -> impl Iterator<Item = &'a Trip> + 'a {
        self.trips
            .iter()
            .filter(move |t| routes.is_empty() || routes.iter().any(|r| r == &t.route_id))
    }
}

fn build_trip(update: &TripUpdate, stops: &StopCatalog) -> Trip {
    let descriptor = &update.trip;
    let trip_id = descriptor.trip_id().to_string();

    let stop_time_updates: Vec<StopTimeUpdate> = update
        .stop_time_update
        .iter()
        .filter(|stu| stu.schedule_relationship() != ScheduleRelationship::Skipped)
        .map(|stu| {
            let stop_id = stu.stop_id().to_string();
            StopTimeUpdate {
                stop_name: stops.name_or_id(&stop_id).to_string(),
                arrival: stu.arrival.as_ref().and_then(event_time),
                departure: stu.departure.as_ref().and_then(event_time),
                track: stu
                    .nyct_stop_time_update
                    .as_ref()
                    .and_then(|n| n.actual_track.clone().or_else(|| n.scheduled_track.clone())),
                stop_id,
            }
        })
        .collect();

    let direction = resolve_direction(descriptor, &stop_time_updates);
    let headsign = stop_time_updates
        .last()
        .map(|s| s.stop_name.clone())
        .unwrap_or_default();

    Trip {
        route_id: descriptor.route_id().to_string(),
        direction,
        headsign,
        train_id: descriptor
            .nyct_trip_descriptor
            .as_ref()
            .and_then(|n| n.train_id.clone()),
        stop_time_updates,
        trip_id,
    }
}

fn resolve_direction(descriptor: &TripDescriptor, stops: &[StopTimeUpdate]) -> Option<Direction> {
    descriptor
        .nyct_trip_descriptor
        .as_ref()
        .filter(|n| n.direction.is_some())
        .map(|n| Direction::from_nyct(n.direction()))
        .or_else(|| Direction::from_trip_id(descriptor.trip_id()))
        .or_else(|| stops.first().and_then(|s| Direction::from_stop_id(&s.stop_id)))
}

fn event_time(event: &StopTimeEvent) -> Option<DateTime<Utc>> {
    event.time.and_then(|t| DateTime::from_timestamp(t, 0))
}

fn to_datetime_u64(secs: u64) -> Option<DateTime<Utc>> {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Builders for GTFS-RT messages shared by the unit tests.

    use crate::gtfs_rt::trip_update::{StopTimeEvent, StopTimeUpdate};
    use crate::gtfs_rt::{FeedEntity, FeedHeader, FeedMessage, TripDescriptor, TripUpdate};

    /// `(stop_id, arrival, departure)` as unix seconds.
    pub type StopTimes<'a> = (&'a str, Option<i64>, Option<i64>);

    pub fn header(timestamp: u64) -> FeedHeader {
        FeedHeader {
            gtfs_realtime_version: "1.0".to_string(),
            timestamp: Some(timestamp),
            incrementality: None,
            feed_version: None,
        }
    }

    pub fn event(time: Option<i64>) -> Option<StopTimeEvent> {
        time.map(|t| StopTimeEvent {
            time: Some(t),
            ..Default::default()
        })
    }

    pub fn trip_entity(trip_id: &str, route_id: &str, stops: &[StopTimes<'_>]) -> FeedEntity {
        FeedEntity {
            id: trip_id.to_string(),
            trip_update: Some(TripUpdate {
                trip: TripDescriptor {
                    trip_id: Some(trip_id.to_string()),
                    route_id: Some(route_id.to_string()),
                    ..Default::default()
                },
                stop_time_update: stops
                    .iter()
                    .map(|(stop_id, arr, dep)| StopTimeUpdate {
                        stop_id: Some(stop_id.to_string()),
                        arrival: event(*arr),
                        departure: event(*dep),
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn message(entities: Vec<FeedEntity>) -> FeedMessage {
        FeedMessage {
            header: header(1_700_000_000),
            entity: entities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::gtfs_rt::{NyctStopTimeUpdate, NyctTripDescriptor};

    fn catalog() -> StopCatalog {
        StopCatalog::embedded().unwrap()
    }

    #[test]
    fn test_direction_from_trip_id() {
        assert_eq!(Direction::from_trip_id("036000_G..S14R"), Some(Direction::South));
        assert_eq!(Direction::from_trip_id("041150_A..N55R"), Some(Direction::North));
        assert_eq!(Direction::from_trip_id("6X.N"), Some(Direction::North));
        assert_eq!(Direction::from_trip_id("no-direction"), None);
        assert_eq!(Direction::from_trip_id("123_G..X"), None);
    }

    #[test]
    fn test_direction_parse_and_display() {
        assert_eq!("S".parse::<Direction>().unwrap(), Direction::South);
        assert_eq!("northbound".parse::<Direction>().unwrap(), Direction::North);
        assert_eq!("SOUTH".parse::<Direction>().unwrap(), Direction::South);
        assert!(matches!(
            "up".parse::<Direction>(),
            Err(Error::UnknownDirection(d)) if d == "up"
        ));
        assert_eq!(Direction::South.to_string(), "S");
    }

    #[test]
    fn test_direction_serde_uses_parser() {
        assert_eq!(serde_json::to_string(&Direction::West).unwrap(), "\"W\"");
        let parsed: Vec<Direction> =
            serde_json::from_str(r#"["N", "south", "Eastbound", "W"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![Direction::North, Direction::South, Direction::East, Direction::West]
        );
        assert!(serde_json::from_str::<Direction>(r#""up""#).is_err());
    }

    #[test]
    fn test_short_trip_id() {
        assert_eq!(short_trip_id("036000_G..S14R"), "..S14R");
        assert_eq!(short_trip_id("G..S"), "G..S");
    }

    #[test]
    fn test_from_message_builds_trips() {
        let msg = message(vec![trip_entity(
            "036000_G..S14R",
            "G",
            &[
                ("G35S", Some(100), Some(130)),
                ("G36S", Some(200), Some(230)),
                ("A42S", Some(300), None),
            ],
        )]);

        let feed = TransitFeed::from_message(FeedGroup::G, &msg, &catalog());

        assert_eq!(feed.group, FeedGroup::G);
        assert_eq!(feed.timestamp, DateTime::from_timestamp(1_700_000_000, 0));
        assert_eq!(feed.trips.len(), 1);

        let trip = &feed.trips[0];
        assert_eq!(trip.route_id, "G");
        assert_eq!(trip.direction, Some(Direction::South));
        assert_eq!(trip.headsign, "Hoyt-Schermerhorn Sts");
        assert_eq!(trip.stop_time_updates[0].stop_name, "Clinton-Washington Avs");
        assert_eq!(
            trip.stop_time_updates[0].departure,
            DateTime::from_timestamp(130, 0)
        );
        assert_eq!(trip.stop_time_updates[2].departure, None);
    }

    #[test]
    fn test_nyct_descriptor_takes_precedence() {
        let mut entity = trip_entity("036000_G..S14R", "G", &[("G35S", Some(100), Some(100))]);
        let update = entity.trip_update.as_mut().unwrap();
        update.trip.nyct_trip_descriptor = Some(NyctTripDescriptor {
            train_id: Some("1G 1000 CHU/CRT".to_string()),
            is_assigned: Some(true),
            direction: Some(nyct_trip_descriptor::Direction::North as i32),
        });
        update.stop_time_update[0].nyct_stop_time_update = Some(NyctStopTimeUpdate {
            scheduled_track: Some("1".to_string()),
            actual_track: None,
        });

        let feed = TransitFeed::from_message(FeedGroup::G, &message(vec![entity]), &catalog());
        let trip = &feed.trips[0];

        assert_eq!(trip.direction, Some(Direction::North));
        assert_eq!(trip.train_id.as_deref(), Some("1G 1000 CHU/CRT"));
        assert_eq!(trip.stop_time_updates[0].track.as_deref(), Some("1"));
    }

    #[test]
    fn test_direction_falls_back_to_stop_suffix() {
        let entity = trip_entity("plain-trip", "C", &[("A42N", Some(100), Some(100))]);
        let feed = TransitFeed::from_message(FeedGroup::Ace, &message(vec![entity]), &catalog());

        assert_eq!(feed.trips[0].direction, Some(Direction::North));
    }

    #[test]
    fn test_skipped_stops_and_deleted_entities_are_dropped() {
        let mut kept = trip_entity(
            "A..N",
            "A",
            &[("A42N", Some(100), Some(110)), ("A41N", Some(200), Some(210))],
        );
        kept.trip_update.as_mut().unwrap().stop_time_update[1].schedule_relationship =
            Some(ScheduleRelationship::Skipped as i32);

        let mut deleted = trip_entity("C..N", "C", &[("A42N", Some(100), Some(110))]);
        deleted.is_deleted = Some(true);

        let feed =
            TransitFeed::from_message(FeedGroup::Ace, &message(vec![kept, deleted]), &catalog());

        assert_eq!(feed.trips.len(), 1);
        assert_eq!(feed.trips[0].stop_time_updates.len(), 1);
        assert_eq!(feed.trips[0].headsign, "Hoyt-Schermerhorn Sts");
    }

    #[test]
    fn test_trips_on_filters_routes() {
        let msg = message(vec![
            trip_entity("A..N", "A", &[]),
            trip_entity("C..N", "C", &[]),
            trip_entity("E..N", "E", &[]),
        ]);
        let feed = TransitFeed::from_message(FeedGroup::Ace, &msg, &catalog());

        let routes = vec!["A".to_string(), "C".to_string()];
        assert_eq!(feed.trips_on(&routes).count(), 2);
        assert_eq!(feed.trips_on(&[]).count(), 3);
        assert_eq!(feed.trips[0].headsign, "");
    }
}
