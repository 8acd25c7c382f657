//! Where feed bytes come from: the MTA endpoints or a directory of saved feeds.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::feeds::{ALERTS_FILE_NAME, ALERTS_PATH, FeedGroup};
use crate::fetch::auth::ApiKey;
use crate::fetch::{BasicClient, HttpClient, fetch_bytes};
use crate::gtfs_rt::FeedMessage;
use crate::model::TransitFeed;
use crate::parser::parse_feed;
use crate::stops::StopCatalog;

/// Supplies decoded GTFS-RT messages for a feed group.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_message(&self, group: FeedGroup) -> Result<FeedMessage>;

    /// The subway service alerts feed.
    async fn fetch_alerts(&self) -> Result<FeedMessage>;
}

/// Fetches feeds over HTTP from `<base_url>/<group path>`.
pub struct HttpFeedSource {
    base_url: String,
    client: Box<dyn HttpClient>,
}

impl HttpFeedSource {
    pub fn new(base_url: &str, client: Box<dyn HttpClient>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Builds the client stack: timeouts, plus the `x-api-key` header when a
    /// key is configured.
    pub fn with_key(base_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let basic = BasicClient::with_timeout(timeout)?;
        let client: Box<dyn HttpClient> = match api_key {
            Some(key) => Box::new(ApiKey::mta(basic, key)?),
            None => Box::new(basic),
        };
        Ok(Self::new(base_url, client))
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    #[tracing::instrument(skip(self), fields(url))]
    async fn fetch_path(&self, path: &str) -> Result<FeedMessage> {
        let url = self.url_for(path);
        tracing::Span::current().record("url", url.as_str());

        let fetch_start = std::time::Instant::now();
        let bytes = fetch_bytes(self.client.as_ref(), &url).await?;
        debug!(
            elapsed_ms = fetch_start.elapsed().as_millis() as u64,
            "Feed fetched, parsing"
        );
        parse_feed(&bytes)
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_message(&self, group: FeedGroup) -> Result<FeedMessage> {
        self.fetch_path(group.path()).await
    }

    async fn fetch_alerts(&self) -> Result<FeedMessage> {
        self.fetch_path(ALERTS_PATH).await
    }
}

/// Reads previously saved feeds from a directory, one file per group.
pub struct DirFeedSource {
    dir: PathBuf,
}

impl DirFeedSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read(&self, file_name: &str) -> Result<FeedMessage> {
        let path = self.dir.join(file_name);
        let bytes = std::fs::read(&path).map_err(|e| Error::io(&path, e))?;
        debug!(path = %path.display(), bytes = bytes.len(), "Feed file read");
        parse_feed(&bytes)
    }
}

#[async_trait]
impl FeedSource for DirFeedSource {
    async fn fetch_message(&self, group: FeedGroup) -> Result<FeedMessage> {
        self.read(group.file_name())
    }

    async fn fetch_alerts(&self) -> Result<FeedMessage> {
        self.read(ALERTS_FILE_NAME)
    }
}

/// Chooses a source from one string: `http...` is a base URL, anything else
/// a directory of saved feeds.
pub fn source_from(
    location: &str,
    api_key: Option<&str>,
    timeout: Duration,
) -> Result<Box<dyn FeedSource>> {
    if location.starts_with("http") {
        info!(base_url = location, "Using HTTP feed source");
        Ok(Box::new(HttpFeedSource::with_key(location, api_key, timeout)?))
    } else {
        info!(dir = location, "Using local feed directory");
        Ok(Box::new(DirFeedSource::new(location)))
    }
}

/// Fetches `group` and builds its trip graph.
#[tracing::instrument(skip(source, stops), fields(group = %group))]
pub async fn load_feed<S: FeedSource + ?Sized>(
    source: &S,
    group: FeedGroup,
    stops: &StopCatalog,
) -> Result<TransitFeed> {
    let message = source.fetch_message(group).await?;
    let feed = TransitFeed::from_message(group, &message, stops);
    debug!(trips = feed.trips.len(), "Feed loaded");
    Ok(feed)
}
