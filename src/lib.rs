pub mod alerts;
pub mod config;
pub mod connect;
pub mod discovery;
pub mod error;
pub mod feeds;
pub mod fetch;
pub mod inspect;
pub mod journey;
pub mod model;
pub mod output;
pub mod parser;
pub mod query;
pub mod source;
pub mod stops;

pub use error::{Error, Result};

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
