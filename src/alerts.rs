//! Active service alerts for a set of routes.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::gtfs_rt::{Alert, FeedMessage, TimeRange, TranslatedString};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveAlert {
    pub id: String,
    /// Routes from the requested set that the alert names.
    pub routes: Vec<String>,
    pub effect: String,
    pub header: String,
    pub description: Option<String>,
}

/// Alerts in `message` that inform one of `routes` and are in effect at `now`.
pub fn active_alerts(message: &FeedMessage, routes: &[String], now: DateTime<Utc>) -> Vec<ActiveAlert> {
    let now = now.timestamp().max(0) as u64;

    message
        .entity
        .iter()
        .filter(|e| !e.is_deleted())
        .filter_map(|e| e.alert.as_ref().map(|alert| (e.id.as_str(), alert)))
        .filter(|(_, alert)| is_active(alert, now))
        .filter_map(|(id, alert)| {
            let mut informed: Vec<String> = alert
                .informed_entity
                .iter()
                .map(|sel| sel.route_id())
                .filter(|r| routes.iter().any(|wanted| wanted == r))
                .map(str::to_string)
                .collect();
            if informed.is_empty() {
                return None;
            }
            informed.sort();
            informed.dedup();

            Some(ActiveAlert {
                id: id.to_string(),
                routes: informed,
                effect: alert.effect().as_str_name().to_string(),
                header: alert
                    .header_text
                    .as_ref()
                    .and_then(english_text)
                    .unwrap_or_default(),
                description: alert.description_text.as_ref().and_then(english_text),
            })
        })
        .collect()
}

/// No active period means the alert applies for as long as it is published.
fn is_active(alert: &Alert, now: u64) -> bool {
    alert.active_period.is_empty() || alert.active_period.iter().any(|p| covers(p, now))
}

fn covers(period: &TimeRange, now: u64) -> bool {
    period.start.is_none_or(|start| start <= now) && period.end.is_none_or(|end| end >= now)
}

/// The English translation, falling back to the first one.
fn english_text(text: &TranslatedString) -> Option<String> {
    text.translation
        .iter()
        .find(|t| t.language().eq_ignore_ascii_case("en"))
        .or_else(|| text.translation.first())
        .map(|t| t.text.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs_rt::alert::Effect;
    use crate::gtfs_rt::translated_string::Translation;
    use crate::gtfs_rt::{EntitySelector, FeedEntity};
    use crate::model::fixtures::header;

    const NOW: i64 = 1_700_000_000;

    fn text(pairs: &[(&str, Option<&str>)]) -> Option<TranslatedString> {
        Some(TranslatedString {
            translation: pairs
                .iter()
                .map(|(text, lang)| Translation {
                    text: text.to_string(),
                    language: lang.map(str::to_string),
                })
                .collect(),
        })
    }

    fn alert_entity(id: &str, routes: &[&str], periods: Vec<TimeRange>) -> FeedEntity {
        FeedEntity {
            id: id.to_string(),
            alert: Some(Alert {
                active_period: periods,
                informed_entity: routes
                    .iter()
                    .map(|r| EntitySelector {
                        route_id: Some(r.to_string()),
                        ..Default::default()
                    })
                    .collect(),
                effect: Some(Effect::SignificantDelays as i32),
                header_text: text(&[("G trains are delayed", Some("en"))]),
                description_text: text(&[
                    ("<p>G trains are delayed</p>", Some("en-html")),
                    ("We're running fewer trains", Some("en")),
                ]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn period(start: Option<i64>, end: Option<i64>) -> TimeRange {
        TimeRange {
            start: start.map(|s| s as u64),
            end: end.map(|e| e as u64),
        }
    }

    fn feed(entities: Vec<FeedEntity>) -> FeedMessage {
        FeedMessage {
            header: header(NOW as u64),
            entity: entities,
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(NOW, 0).unwrap()
    }

    #[test]
    fn test_active_alert_for_route() {
        let msg = feed(vec![alert_entity(
            "lmm:alert:1",
            &["G", "F", "G"],
            vec![period(Some(NOW - 60), Some(NOW + 60))],
        )]);

        let alerts = active_alerts(&msg, &["G".to_string()], now());

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].routes, vec!["G"]);
        assert_eq!(alerts[0].effect, "SIGNIFICANT_DELAYS");
        assert_eq!(alerts[0].header, "G trains are delayed");
        assert_eq!(
            alerts[0].description.as_deref(),
            Some("We're running fewer trains")
        );
    }

    #[test]
    fn test_inactive_and_unrelated_alerts_are_dropped() {
        let msg = feed(vec![
            alert_entity("past", &["G"], vec![period(None, Some(NOW - 1))]),
            alert_entity("future", &["G"], vec![period(Some(NOW + 1), None)]),
            alert_entity("other-route", &["L"], vec![]),
            alert_entity("open-start", &["G"], vec![period(None, Some(NOW + 1))]),
            alert_entity("no-period", &["G"], vec![]),
        ]);

        let alerts = active_alerts(&msg, &["G".to_string()], now());

        let ids: Vec<_> = alerts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["open-start", "no-period"]);
    }

    #[test]
    fn test_translation_falls_back_to_first() {
        let fallback = TranslatedString {
            translation: vec![Translation {
                text: "Servicio reducido".to_string(),
                language: Some("es".to_string()),
            }],
        };
        assert_eq!(english_text(&fallback).as_deref(), Some("Servicio reducido"));
        assert_eq!(english_text(&TranslatedString::default()), None);
    }
}
