//! Error types for metro_journey.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for feed loading, configuration and reporting.
#[derive(Error, Debug)]
pub enum Error {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The feed endpoint answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// A feed URL could not be parsed.
    #[error("invalid feed URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// The bytes were not a valid GTFS-RT `FeedMessage`.
    #[error("failed to decode GTFS-RT feed: {0}")]
    Decode(#[from] prost::DecodeError),

    /// A local file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No NYCT feed carries the requested route or group.
    #[error("no feed group for '{0}'")]
    UnknownFeed(String),

    #[error("unknown direction '{0}'")]
    UnknownDirection(String),

    #[error("unknown time zone '{0}'")]
    UnknownTimezone(String),

    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation { message: String },
}

/// A specialized Result type for metro_journey operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Wrap an I/O error together with the path it happened on.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display() {
        let err = Error::HttpStatus {
            url: "https://example.com/feed".to_string(),
            status: 503,
        };
        assert_eq!(err.to_string(), "https://example.com/feed returned HTTP 503");
    }

    #[test]
    fn test_io_error_keeps_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::io("/tmp/feeds/gtfs-g.pb", io_err);
        let msg = err.to_string();
        assert!(msg.contains("/tmp/feeds/gtfs-g.pb"));
        assert!(msg.contains("file not found"));
    }

    #[test]
    fn test_invalid_config_display() {
        let err = Error::invalid_config("at least one leg is required");
        assert_eq!(
            err.to_string(),
            "invalid configuration: at least one leg is required"
        );
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_unknown_feed_display() {
        let err = Error::UnknownFeed("X".to_string());
        assert_eq!(err.to_string(), "no feed group for 'X'");
    }
}
