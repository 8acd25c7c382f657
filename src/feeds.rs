//! NYC Transit real-time feed groups.
//!
//! The MTA publishes one GTFS-RT endpoint per group of subway lines. A route
//! id such as `"C"` is served by exactly one group (`ACE`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Default base URL of the MTA GTFS-RT endpoints.
pub const MTA_BASE_URL: &str = "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds";

/// URL path of the subway service alerts feed.
pub const ALERTS_PATH: &str = "camsys%2Fsubway-alerts";

/// File name of the alerts feed inside a local feed directory.
pub const ALERTS_FILE_NAME: &str = "alerts.pb";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedGroup {
    Ace,
    Bdfm,
    G,
    Jz,
    Nqrw,
    L,
    Numbered,
    Sir,
}

impl FeedGroup {
    pub const ALL: [FeedGroup; 8] = [
        FeedGroup::Ace,
        FeedGroup::Bdfm,
        FeedGroup::G,
        FeedGroup::Jz,
        FeedGroup::Nqrw,
        FeedGroup::L,
        FeedGroup::Numbered,
        FeedGroup::Sir,
    ];

    /// Route ids carried by this group's feed.
    pub fn routes(self) -> &'static [&'static str] {
        match self {
            FeedGroup::Ace => &["A", "C", "E", "H", "FS"],
            FeedGroup::Bdfm => &["B", "D", "F", "FX", "M"],
            FeedGroup::G => &["G"],
            FeedGroup::Jz => &["J", "Z"],
            FeedGroup::Nqrw => &["N", "Q", "R", "W"],
            FeedGroup::L => &["L"],
            FeedGroup::Numbered => &["1", "2", "3", "4", "5", "5X", "6", "6X", "7", "7X", "GS"],
            FeedGroup::Sir => &["SI", "SIR"],
        }
    }

    /// Finds the group whose feed carries `route_id` (case-insensitive).
    pub fn for_route(route_id: &str) -> Option<FeedGroup> {
        let route_id = route_id.trim();
        FeedGroup::ALL.into_iter().find(|group| {
            group
                .routes()
                .iter()
                .any(|r| r.eq_ignore_ascii_case(route_id))
        })
    }

    /// Endpoint path below [`MTA_BASE_URL`].
    pub fn path(self) -> &'static str {
        match self {
            FeedGroup::Ace => "nyct%2Fgtfs-ace",
            FeedGroup::Bdfm => "nyct%2Fgtfs-bdfm",
            FeedGroup::G => "nyct%2Fgtfs-g",
            FeedGroup::Jz => "nyct%2Fgtfs-jz",
            FeedGroup::Nqrw => "nyct%2Fgtfs-nqrw",
            FeedGroup::L => "nyct%2Fgtfs-l",
            FeedGroup::Numbered => "nyct%2Fgtfs",
            FeedGroup::Sir => "nyct%2Fgtfs-si",
        }
    }

    /// Name of the saved feed inside a local feed directory.
    pub fn file_name(self) -> &'static str {
        match self {
            FeedGroup::Ace => "gtfs-ace.pb",
            FeedGroup::Bdfm => "gtfs-bdfm.pb",
            FeedGroup::G => "gtfs-g.pb",
            FeedGroup::Jz => "gtfs-jz.pb",
            FeedGroup::Nqrw => "gtfs-nqrw.pb",
            FeedGroup::L => "gtfs-l.pb",
            FeedGroup::Numbered => "gtfs.pb",
            FeedGroup::Sir => "gtfs-si.pb",
        }
    }
}

impl fmt::Display for FeedGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeedGroup::Ace => "ACE",
            FeedGroup::Bdfm => "BDFM",
            FeedGroup::G => "G",
            FeedGroup::Jz => "JZ",
            FeedGroup::Nqrw => "NQRW",
            FeedGroup::L => "L",
            FeedGroup::Numbered => "1234567",
            FeedGroup::Sir => "SIR",
        };
        f.write_str(name)
    }
}

impl FromStr for FeedGroup {
    type Err = Error;

    /// Accepts a group name (`"ace"`, `"numbered"`) or any route it carries (`"C"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let group = match s.trim().to_ascii_lowercase().as_str() {
            "ace" => Some(FeedGroup::Ace),
            "bdfm" => Some(FeedGroup::Bdfm),
            "jz" => Some(FeedGroup::Jz),
            "nqrw" => Some(FeedGroup::Nqrw),
            "numbered" | "1234567" => Some(FeedGroup::Numbered),
            "sir" => Some(FeedGroup::Sir),
            _ => None,
        };

        group
            .or_else(|| FeedGroup::for_route(s))
            .ok_or_else(|| Error::UnknownFeed(s.to_string()))
    }
}
