//! Plans a multi-leg commute from live feeds.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{JourneyConfig, LegConfig};
use crate::connect::{Itinerary, chain_itineraries};
use crate::error::Result;
use crate::feeds::FeedGroup;
use crate::model::TransitFeed;
use crate::query::{LegOption, find_legs};
use crate::source::{FeedSource, load_feed};
use crate::stops::StopCatalog;

/// Departures found for one configured leg.
#[derive(Debug, Clone, Serialize)]
pub struct LegReport {
    pub label: String,
    pub from: String,
    pub to: String,
    pub options: Vec<LegOption>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JourneyPlan {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub legs: Vec<LegReport>,
    pub itineraries: Vec<Itinerary>,
    pub transfer_notes: Vec<String>,
}

/// Loads each feed group at most once per plan.
struct FeedCache<'a, S: ?Sized> {
    source: &'a S,
    stops: &'a StopCatalog,
    feeds: HashMap<FeedGroup, TransitFeed>,
}

impl<'a, S: FeedSource + ?Sized> FeedCache<'a, S> {
    fn new(source: &'a S, stops: &'a StopCatalog) -> Self {
        Self {
            source,
            stops,
            feeds: HashMap::new(),
        }
    }

    async fn get(&mut self, group: FeedGroup) -> Result<&TransitFeed> {
        if !self.feeds.contains_key(&group) {
            let feed = load_feed(self.source, group, self.stops).await?;
            self.feeds.insert(group, feed);
        }
        Ok(&self.feeds[&group])
    }
}

/// Upcoming options for `leg`; any failure is logged and yields no options.
async fn leg_options<S: FeedSource + ?Sized>(
    cache: &mut FeedCache<'_, S>,
    leg: &LegConfig,
    now: DateTime<Utc>,
) -> Vec<LegOption> {
    let result = async {
        let group = leg.feed_group()?;
        let feed = cache.get(group).await?;
        Ok::<_, crate::Error>(find_legs(feed, &leg.query(), now))
    }
    .await;

    match result {
        Ok(options) => {
            info!(leg = %leg.label, options = options.len(), "Leg departures found");
            options
        }
        Err(e) => {
            error!(leg = %leg.label, error = %e, "Failed to fetch leg departures");
            Vec::new()
        }
    }
}

/// Departures for every leg of `config`, in leg order.
pub async fn departures<S: FeedSource + ?Sized>(
    source: &S,
    stops: &StopCatalog,
    config: &JourneyConfig,
    now: DateTime<Utc>,
) -> Vec<LegReport> {
    let mut cache = FeedCache::new(source, stops);
    let mut reports = Vec::with_capacity(config.legs.len());

    for leg in &config.legs {
        reports.push(LegReport {
            label: leg.label.clone(),
            from: leg.from.name.clone(),
            to: leg.to.name.clone(),
            options: leg_options(&mut cache, leg, now).await,
        });
    }

    reports
}

/// Fetches every leg and joins them into itineraries.
#[tracing::instrument(skip_all, fields(title = %config.title))]
pub async fn plan_journey<S: FeedSource + ?Sized>(
    source: &S,
    stops: &StopCatalog,
    config: &JourneyConfig,
    now: DateTime<Utc>,
) -> JourneyPlan {
    let legs = departures(source, stops, config, now).await;

    let options: Vec<Vec<LegOption>> = legs.iter().map(|l| l.options.clone()).collect();
    let itineraries = if options.iter().any(Vec::is_empty) {
        warn!("At least one leg has no departures, skipping connections");
        Vec::new()
    } else {
        chain_itineraries(
            &options,
            config.transfer_buffer(),
            config.connection_candidates,
        )
    };
    info!(itineraries = itineraries.len(), "Journey planned");

    JourneyPlan {
        title: config.title.clone(),
        generated_at: now,
        legs,
        itineraries,
        transfer_notes: config.transfer_notes.clone(),
    }
}
