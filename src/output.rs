//! Output formatting and persistence for journey results.
//!
//! Supports human-readable text reports, JSON serialization, and CSV append.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use csv::WriterBuilder;
use serde::Serialize;
use tracing::debug;

use crate::alerts::ActiveAlert;
use crate::discovery::StopMatch;
use crate::error::{Error, Result};
use crate::inspect::FeedSummary;
use crate::journey::{JourneyPlan, LegReport};
use crate::model::Direction;

const RULE_WIDTH: usize = 60;

fn clock(time: Option<DateTime<Utc>>, tz: Tz, format: &str) -> String {
    match time {
        Some(t) => t.with_timezone(&tz).format(format).to_string(),
        None => "N/A".to_string(),
    }
}

/// `HH:MM` in `tz`, or `N/A`.
pub fn hhmm(time: Option<DateTime<Utc>>, tz: Tz) -> String {
    clock(time, tz, "%H:%M")
}

/// `HH:MM:SS` in `tz`, or `N/A`.
pub fn hhmmss(time: Option<DateTime<Utc>>, tz: Tz) -> String {
    clock(time, tz, "%H:%M:%S")
}

/// Writes any serializable value as pretty-printed JSON followed by a newline.
pub fn write_json<W: Write>(w: &mut W, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, value)?;
    writeln!(w).map_err(|e| Error::io("<output>", e))?;
    Ok(())
}

/// Pretty JSON on stdout.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    write_json(&mut io::stdout().lock(), value)
}

fn render_leg_options<W: Write>(w: &mut W, leg: &LegReport, tz: Tz) -> io::Result<()> {
    writeln!(
        w,
        "{} TRAIN OPTIONS ({} → {}):",
        leg.label, leg.from, leg.to
    )?;

    if leg.options.is_empty() {
        writeln!(w, "  No upcoming {} trains found", leg.label)?;
        return Ok(());
    }

    for (i, option) in leg.options.iter().enumerate() {
        writeln!(
            w,
            "  {}. {} Train - Depart {} → Arrive {}",
            i + 1,
            option.route_id,
            hhmm(Some(option.departure), tz),
            hhmm(option.arrival, tz)
        )?;
        writeln!(
            w,
            "     Destination: {} (Train {})",
            option.headsign,
            option.short_id()
        )?;
    }
    Ok(())
}

/// Prints upcoming departures for each leg.
pub fn render_departures<W: Write>(w: &mut W, legs: &[LegReport], tz: Tz) -> io::Result<()> {
    for leg in legs {
        render_leg_options(w, leg, tz)?;
        writeln!(w)?;
    }
    Ok(())
}

/// Prints the full journey report: per-leg options, best connections and
/// transfer notes.
pub fn render_plan<W: Write>(w: &mut W, plan: &JourneyPlan, tz: Tz) -> io::Result<()> {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(w, "{rule}")?;
    writeln!(w, "NYC METRO JOURNEY: {}", plan.title)?;
    writeln!(w, "{rule}")?;
    writeln!(w, "Current time: {}", hhmmss(Some(plan.generated_at), tz))?;

    for leg in &plan.legs {
        writeln!(w)?;
        render_leg_options(w, leg, tz)?;
    }

    if !plan.itineraries.is_empty() {
        writeln!(w)?;
        writeln!(w, "BEST CONNECTION OPTIONS:")?;
        for itinerary in &plan.itineraries {
            let rides: Vec<String> = itinerary
                .legs
                .iter()
                .map(|l| {
                    format!(
                        "{} Train {} → {}",
                        l.route_id,
                        hhmm(Some(l.departure), tz),
                        hhmm(l.arrival, tz)
                    )
                })
                .collect();
            writeln!(w, "  • {}", rides.join(" + "))?;
            match itinerary.total_minutes() {
                Some(total) => writeln!(w, "    Total journey time: {total} minutes")?,
                None => writeln!(w, "    Total time: N/A")?,
            }
        }
    }

    if !plan.transfer_notes.is_empty() {
        writeln!(w)?;
        writeln!(w, "Transfer Info:")?;
        for note in &plan.transfer_notes {
            writeln!(w, "  • {note}")?;
        }
    }

    Ok(())
}

/// Prints a feed debug dump.
pub fn render_summary<W: Write>(w: &mut W, summary: &FeedSummary, tz: Tz) -> io::Result<()> {
    writeln!(
        w,
        "=== {} FEED (updated {}) ===",
        summary.group,
        hhmmss(summary.timestamp, tz)
    )?;
    writeln!(w, "Number of trips in {} feed: {}", summary.group, summary.trip_count)?;
    for (route, count) in &summary.trips_per_route {
        writeln!(w, "  {route} train trips: {count}")?;
    }

    for (i, sample) in summary.samples.iter().enumerate() {
        writeln!(w)?;
        writeln!(w, "Trip {}: {}", i + 1, sample.trip_id)?;
        writeln!(w, "  Route: {}", sample.route_id)?;
        writeln!(w, "  Direction: {}", direction_label(sample.direction))?;
        writeln!(w, "  Headsign: {}", sample.headsign)?;
        writeln!(w, "  Number of stops: {}", sample.stop_count)?;
        writeln!(w, "  Stop IDs in this trip:")?;
        for (j, stop) in sample.stops.iter().enumerate() {
            writeln!(
                w,
                "    {}. {} ({}) - Arr: {}, Dep: {}",
                j + 1,
                stop.stop_id,
                stop.stop_name,
                hhmmss(stop.arrival, tz),
                hhmmss(stop.departure, tz)
            )?;
        }
        if sample.remaining_stops() > 0 {
            writeln!(w, "    ... and {} more stops", sample.remaining_stops())?;
        }
    }
    Ok(())
}

fn direction_label(direction: Option<Direction>) -> String {
    direction.map_or_else(|| "?".to_string(), |d| d.to_string())
}

/// Prints stop-id search results.
pub fn render_stops<W: Write>(w: &mut W, heading: &str, stops: &[StopMatch]) -> io::Result<()> {
    writeln!(w, "Searching for {heading} stops:")?;
    if stops.is_empty() {
        writeln!(w, "  (none found)")?;
    }
    for stop in stops {
        writeln!(w, "  {}: {}", stop.stop_id, stop.stop_name)?;
    }
    Ok(())
}

/// Prints active alerts.
pub fn render_alerts<W: Write>(w: &mut W, alerts: &[ActiveAlert]) -> io::Result<()> {
    if alerts.is_empty() {
        writeln!(w, "No active alerts")?;
        return Ok(());
    }
    for alert in alerts {
        writeln!(
            w,
            "[{}] {}: {}",
            alert.routes.join(","),
            alert.effect,
            alert.header
        )?;
        if let Some(description) = &alert.description {
            writeln!(w, "    {description}")?;
        }
    }
    Ok(())
}

/// One CSV row per leg option, as logged by `departures --output`.
#[derive(Debug, Serialize)]
pub struct DepartureRecord {
    pub recorded_at: DateTime<Utc>,
    pub leg: String,
    pub trip_id: String,
    pub route_id: String,
    pub direction: Option<Direction>,
    pub headsign: String,
    pub departure: DateTime<Utc>,
    pub arrival: Option<DateTime<Utc>>,
}

impl DepartureRecord {
    pub fn from_reports(reports: &[LegReport], recorded_at: DateTime<Utc>) -> Vec<Self> {
        reports
            .iter()
            .flat_map(|leg| {
                leg.options.iter().map(move |o| DepartureRecord {
                    recorded_at,
                    leg: leg.label.clone(),
                    trip_id: o.trip_id.clone(),
                    route_id: o.route_id.clone(),
                    direction: o.direction,
                    headsign: o.headsign.clone(),
                    departure: o.departure,
                    arrival: o.arrival,
                })
            })
            .collect()
    }
}

/// Appends records as rows to a CSV file.
///
/// Writes the header row when the file is new or empty. An empty `records`
/// slice leaves the file untouched.
pub fn append_record<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if records.is_empty() {
        debug!(path = %path.display(), "No CSV records to append");
        return Ok(());
    }

    let needs_header = std::fs::metadata(path).map_or(true, |m| m.len() == 0);
    debug!(path = %path.display(), needs_header, rows = records.len(), "Appending CSV records");

    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| Error::io(path, e))?;

    let mut writer = WriterBuilder::new()
        .has_headers(needs_header) // IMPORTANT when appending
        .from_writer(file);

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush().map_err(|e| Error::io(path, e))?;

    Ok(())
}
