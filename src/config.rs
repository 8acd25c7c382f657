//! Journey configuration.
//!
//! Loaded from (in order of precedence, highest first):
//! 1. Environment variables prefixed with `METRO_JOURNEY_`, nested keys
//!    separated by `__` (e.g. `METRO_JOURNEY_FEED__API_KEY`)
//! 2. A TOML file (default `metro_journey.toml`)
//! 3. Built-in defaults describing the Clinton-Washington to Financial
//!    District commute

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::discovery::StopSearch;
use crate::error::{Error, Result};
use crate::feeds::{FeedGroup, MTA_BASE_URL};
use crate::model::Direction;
use crate::query::LegQuery;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "metro_journey.toml";

const ENV_PREFIX: &str = "METRO_JOURNEY_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JourneyConfig {
    pub title: String,
    /// IANA zone used to print times.
    pub timezone: String,
    /// Minimum minutes between an arrival and the connecting departure.
    pub transfer_buffer_minutes: u32,
    /// How many first-leg options are tried when building itineraries.
    pub connection_candidates: usize,
    pub transfer_notes: Vec<String>,
    pub feed: FeedConfig,
    pub legs: Vec<LegConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Base URL of the GTFS-RT endpoints, or a directory of saved `.pb` files.
    pub source: String,
    /// Sent as `x-api-key` when set. Falls back to `MTA_API_KEY`.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// GTFS static `stops.txt`; the embedded catalog is used when unset.
    pub stops_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegConfig {
    /// Short name printed in reports, e.g. `"A/C"`.
    pub label: String,
    /// Feed group or route to fetch; defaults to the group of the first route.
    #[serde(default)]
    pub feed: Option<String>,
    #[serde(default)]
    pub routes: Vec<String>,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub headsign_contains: Option<String>,
    pub from: Station,
    pub to: Station,
    #[serde(default)]
    pub require_destination: bool,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    pub stop_ids: Vec<String>,
    /// Words used to look the station up by name; derived from `name` when empty.
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn default_limit() -> usize {
    5
}

impl Station {
    fn new(name: &str, stop_ids: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            stop_ids: stop_ids.iter().map(|s| s.to_string()).collect(),
            keywords: Vec::new(),
        }
    }

    /// Name search for this station: any configured keyword, or every word
    /// of the name.
    pub fn search(&self) -> StopSearch {
        if self.keywords.is_empty() {
            StopSearch::for_station_name(&self.name)
        } else {
            StopSearch::any(self.keywords.iter().cloned())
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source: MTA_BASE_URL.to_string(),
            api_key: None,
            timeout_secs: 30,
            stops_path: None,
        }
    }
}

impl Default for JourneyConfig {
    fn default() -> Self {
        Self {
            title: "Clinton-Washington → Financial District".to_string(),
            timezone: "America/New_York".to_string(),
            transfer_buffer_minutes: 3,
            connection_candidates: 2,
            transfer_notes: vec![
                "Transfer at Hoyt-Schermerhorn Sts".to_string(),
                "Walking time between G and A/C platforms: ~2-3 minutes".to_string(),
                "A train is express (faster), C train is local".to_string(),
            ],
            feed: FeedConfig::default(),
            legs: vec![
                LegConfig {
                    label: "G".to_string(),
                    feed: None,
                    routes: vec!["G".to_string()],
                    direction: Some(Direction::South),
                    headsign_contains: Some("Church Av".to_string()),
                    from: Station::new("Clinton-Washington Avs", &["G35S"]),
                    to: Station::new("Hoyt-Schermerhorn Sts", &["A42S"]),
                    require_destination: false,
                    limit: 3,
                },
                LegConfig {
                    label: "A/C".to_string(),
                    feed: None,
                    routes: vec!["A".to_string(), "C".to_string()],
                    direction: None,
                    headsign_contains: None,
                    from: Station::new("Hoyt-Schermerhorn Sts", &["A42N", "A42S"]),
                    to: Station {
                        keywords: vec!["chambers".to_string(), "fulton".to_string()],
                        ..Station::new("Financial District", &["A36N", "A36S", "A38N", "A38S"])
                    },
                    require_destination: true,
                    limit: 5,
                },
            ],
        }
    }
}

impl LegConfig {
    /// The feed group this leg is read from.
    pub fn feed_group(&self) -> Result<FeedGroup> {
        match (&self.feed, self.routes.first()) {
            (Some(feed), _) => feed.parse(),
            (None, Some(route)) => {
                FeedGroup::for_route(route).ok_or_else(|| Error::UnknownFeed(route.clone()))
            }
            (None, None) => Err(Error::invalid_config(format!(
                "leg '{}' names neither a feed nor a route",
                self.label
            ))),
        }
    }

    pub fn query(&self) -> LegQuery {
        LegQuery {
            routes: self.routes.clone(),
            direction: self.direction,
            headsign_contains: self.headsign_contains.clone(),
            origin_stop_ids: self.from.stop_ids.clone(),
            destination_stop_ids: self.to.stop_ids.clone(),
            require_destination: self.require_destination,
            limit: self.limit,
        }
    }
}

impl JourneyConfig {
    /// Load configuration from `config_path`, or [`CONFIG_FILE_NAME`] in the
    /// working directory. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, parsing or validation fails.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let config_file = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

        let figment = Figment::new()
            .merge(Serialized::defaults(JourneyConfig::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config: JourneyConfig = figment.extract()?;
        if config.feed.api_key.is_none() {
            config.feed.api_key = std::env::var("MTA_API_KEY").ok().filter(|k| !k.is_empty());
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.legs.is_empty() {
            return Err(Error::invalid_config("at least one leg is required"));
        }

        if self.connection_candidates == 0 {
            return Err(Error::invalid_config(
                "connection_candidates must be greater than 0",
            ));
        }

        if self.feed.timeout_secs == 0 {
            return Err(Error::invalid_config("feed.timeout_secs must be greater than 0"));
        }

        self.tz()?;

        for leg in &self.legs {
            if leg.from.stop_ids.is_empty() || leg.to.stop_ids.is_empty() {
                return Err(Error::invalid_config(format!(
                    "leg '{}' needs origin and destination stop_ids",
                    leg.label
                )));
            }
            if leg.limit == 0 {
                return Err(Error::invalid_config(format!(
                    "leg '{}': limit must be greater than 0",
                    leg.label
                )));
            }
            leg.feed_group()?;
        }

        Ok(())
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| Error::UnknownTimezone(self.timezone.clone()))
    }

    pub fn transfer_buffer(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.transfer_buffer_minutes))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.feed.timeout_secs)
    }

    /// Every route named by a leg, in leg order, without duplicates.
    pub fn routes(&self) -> Vec<String> {
        let mut routes: Vec<String> = Vec::new();
        for route in self.legs.iter().flat_map(|l| &l.routes) {
            if !routes.contains(route) {
                routes.push(route.clone());
            }
        }
        routes
    }
}
