//! CLI entry point for the metro journey planner.
//!
//! Provides subcommands for inspecting MTA GTFS-RT feeds, discovering stop
//! ids, listing leg departures, planning the configured commute and showing
//! service alerts.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use metro_journey::{
    alerts::active_alerts,
    config::JourneyConfig,
    discovery::{StopSearch, find_stops},
    feeds::FeedGroup,
    inspect::summarize,
    journey::{departures, plan_journey},
    output::{self, DepartureRecord},
    source::{FeedSource, load_feed, source_from},
    stops::StopCatalog,
};
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Trips sampled per feed by `report`.
const REPORT_SAMPLES: usize = 3;
/// Stops printed per sampled trip.
const REPORT_STOPS: usize = 10;

#[derive(Parser)]
#[command(name = "metro_journey")]
#[command(about = "Plan subway journeys from live GTFS-RT feeds", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Feed base URL or a directory of saved feeds; overrides the configured source
    #[arg(short, long, global = true, value_name = "URL_OR_DIR")]
    source: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print trip counts and sample trips from one or more feeds
    Inspect {
        /// Feed group or route, e.g. "ace" or "G"
        #[arg(value_name = "FEED", required = true)]
        feeds: Vec<FeedGroup>,

        /// Only sample trips on these routes
        #[arg(short, long = "route")]
        routes: Vec<String>,

        /// Number of trips to sample
        #[arg(short = 'n', long, default_value_t = 3)]
        samples: usize,

        /// Stops printed per sampled trip
        #[arg(long, default_value_t = 10)]
        stops: usize,
    },
    /// Find stop ids whose names contain the given keywords
    FindStops {
        /// Feed group or route to scan
        #[arg(value_name = "FEED")]
        feed: FeedGroup,

        #[arg(value_name = "KEYWORD", required = true)]
        keywords: Vec<String>,

        /// Match stops containing any keyword instead of all of them
        #[arg(long, default_value_t = false)]
        any: bool,

        /// Only scan trips on these routes
        #[arg(short, long = "route")]
        routes: Vec<String>,
    },
    /// List upcoming departures for each configured leg
    Departures {
        /// Only show the leg with this label
        #[arg(short, long)]
        leg: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,

        /// CSV file to append departures to
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Plan the configured journey
    Plan {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show active service alerts
    Alerts {
        /// Routes to report on; defaults to every route used by the legs
        #[arg(short, long = "route")]
        routes: Vec<String>,
    },
    /// Inspect each leg's feed, look up its stations, then plan the journey
    Report,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/metro_journey.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("metro_journey.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = JourneyConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(source) = cli.source {
        config.feed.source = source;
    }
    let tz = config.tz()?;
    let stops = StopCatalog::load(config.feed.stops_path.as_deref())?;
    let source = source_from(
        &config.feed.source,
        config.feed.api_key.as_deref(),
        config.timeout(),
    )?;
    info!(stops = stops.len(), source = %config.feed.source, "Configuration loaded");

    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Inspect {
            feeds,
            routes,
            samples,
            stops: stops_per_trip,
        } => {
            for group in feeds {
                let feed = load_feed(source.as_ref(), group, &stops).await?;
                let summary = summarize(&feed, &routes, samples, stops_per_trip);
                output::render_summary(&mut stdout, &summary, tz)?;
            }
        }
        Commands::FindStops {
            feed,
            keywords,
            any,
            routes,
        } => {
            let transit = load_feed(source.as_ref(), feed, &stops).await?;
            let heading = keywords.join(" ");
            let search = if any {
                StopSearch::any(keywords)
            } else {
                StopSearch::all(keywords)
            }
            .on_routes(routes);
            let found = find_stops(&transit, &search);
            output::render_stops(&mut stdout, &heading, &found)?;
        }
        Commands::Departures {
            leg,
            json,
            output: csv_path,
        } => {
            if let Some(label) = &leg {
                config.legs.retain(|l| &l.label == label);
                if config.legs.is_empty() {
                    anyhow::bail!("No leg labelled '{label}' in the configuration");
                }
            }

            let now = Utc::now();
            let reports = departures(source.as_ref(), &stops, &config, now).await;

            if let Some(path) = csv_path {
                let records = DepartureRecord::from_reports(&reports, now);
                output::append_record(&path, &records)?;
                info!(path = %path.display(), rows = records.len(), "Departures appended");
            }

            if json {
                output::print_json(&reports)?;
            } else {
                output::render_departures(&mut stdout, &reports, tz)?;
            }
        }
        Commands::Plan { json } => {
            let plan = plan_journey(source.as_ref(), &stops, &config, Utc::now()).await;
            if json {
                output::print_json(&plan)?;
            } else {
                output::render_plan(&mut stdout, &plan, tz)?;
            }
        }
        Commands::Alerts { routes } => {
            let routes = if routes.is_empty() {
                config.routes()
            } else {
                routes
            };
            let message = source.fetch_alerts().await?;
            let alerts = active_alerts(&message, &routes, Utc::now());
            info!(alerts = alerts.len(), "Active alerts found");
            output::render_alerts(&mut stdout, &alerts)?;
        }
        Commands::Report => {
            report(source.as_ref(), &stops, &config, tz, &mut stdout).await?;
        }
    }

    Ok(())
}

/// Dumps each leg's feed and station stop ids, then prints the plan.
#[tracing::instrument(skip_all)]
async fn report<W: std::io::Write>(
    source: &dyn FeedSource,
    stops: &StopCatalog,
    config: &JourneyConfig,
    tz: chrono_tz::Tz,
    out: &mut W,
) -> Result<()> {
    let groups: BTreeSet<FeedGroup> = config
        .legs
        .iter()
        .filter_map(|leg| leg.feed_group().ok())
        .collect();

    for group in groups {
        let feed = match load_feed(source, group, stops).await {
            Ok(feed) => feed,
            Err(e) => {
                warn!(group = %group, error = %e, "Skipping feed inspection");
                continue;
            }
        };

        let leg_routes: Vec<String> = config
            .legs
            .iter()
            .filter(|leg| leg.feed_group().ok() == Some(group))
            .flat_map(|leg| leg.routes.iter().cloned())
            .collect();
        let summary = summarize(&feed, &leg_routes, REPORT_SAMPLES, REPORT_STOPS);
        output::render_summary(out, &summary, tz)?;
        writeln!(out)?;

        for leg in config
            .legs
            .iter()
            .filter(|leg| leg.feed_group().ok() == Some(group))
        {
            for station in [&leg.from, &leg.to] {
                let search = station.search().on_routes(leg.routes.clone());
                let found = find_stops(&feed, &search);
                output::render_stops(out, &station.name, &found)?;
            }
        }
        writeln!(out)?;
    }

    let plan = plan_journey(source, stops, config, Utc::now()).await;
    output::render_plan(out, &plan, tz)?;
    Ok(())
}
