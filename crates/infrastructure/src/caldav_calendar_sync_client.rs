//! CalDAV calendar client writing one iCalendar resource per shift.

use std::fmt::Write;

use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeDelta, Utc};
use reqwest::header::CONTENT_TYPE;
use shiftledger_application::CalendarSyncClient;
use shiftledger_core::{AppError, AppResult};
use shiftledger_domain::Shift;
use tracing::debug;
use uuid::Uuid;

const ICALENDAR_PRODUCT_ID: &str = "-//shiftledger//shift calendar//EN";

/// Longest content line in octets before it must be folded (RFC 5545 section 3.1).
const MAX_LINE_OCTETS: usize = 75;

/// CalDAV client configuration.
#[derive(Clone)]
pub struct CalDavConfig {
    /// Collection URL events are written under.
    pub calendar_url: String,
    /// Basic auth username.
    pub username: String,
    /// Basic auth password.
    pub password: String,
    /// IANA time zone the wall-clock shift times belong to.
    pub timezone: String,
}

/// Calendar client that PUTs `{calendar_url}/{uid}.ics`.
///
/// The event uid doubles as the shift's sync token, so syncing a shift
/// that already has a token replaces the same resource.
#[derive(Clone)]
pub struct CalDavCalendarSyncClient {
    http_client: reqwest::Client,
    config: CalDavConfig,
}

impl CalDavCalendarSyncClient {
    /// Creates a CalDAV client.
    ///
    /// The HTTP client's timeout bounds each sync attempt.
    pub fn new(http_client: reqwest::Client, config: CalDavConfig) -> AppResult<Self> {
        if config.calendar_url.trim().is_empty() {
            return Err(AppError::Validation(
                "CalDAV calendar url must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            http_client,
            config,
        })
    }

    fn event_url(&self, uid: &str) -> String {
        format!("{}/{uid}.ics", self.config.calendar_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CalendarSyncClient for CalDavCalendarSyncClient {
    async fn sync_shift(&self, shift: &Shift) -> AppResult<String> {
        let uid = shift
            .sync_token()
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let body = build_event(shift, uid.as_str(), self.config.timezone.as_str());

        let response = self
            .http_client
            .put(self.event_url(uid.as_str()))
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header(CONTENT_TYPE, "text/calendar; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|error| {
                AppError::SyncFailure(format!(
                    "CalDAV request for shift '{}' failed: {error}",
                    shift.shift_id()
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::SyncFailure(format!(
                "CalDAV server rejected shift '{}' with status {status}",
                shift.shift_id()
            )));
        }

        debug!(shift_id = %shift.shift_id(), uid = %uid, status = %status, "CalDAV event stored");
        Ok(uid)
    }
}

/// Renders a single-event iCalendar document with CRLF line endings.
fn build_event(shift: &Shift, uid: &str, timezone: &str) -> String {
    let start = NaiveDateTime::new(shift.reference_date(), shift.start_time());
    let end = start + TimeDelta::minutes(i64::from(shift.duration_minutes()));
    let category = shift
        .category()
        .map(|category| category.name().to_owned())
        .unwrap_or_else(|| "Shift".to_owned());
    let hours = f64::from(shift.duration_minutes()) / 60.0;

    let mut description = format!(
        "{category} from {} to {} on {}",
        shift.start_time().format("%H:%M"),
        shift.end_time().format("%H:%M"),
        shift.reference_date()
    );
    if let Some(note) = shift.description() {
        description.push('\n');
        description.push_str(note);
    }

    let lines = [
        "BEGIN:VCALENDAR".to_owned(),
        "VERSION:2.0".to_owned(),
        format!("PRODID:{ICALENDAR_PRODUCT_ID}"),
        "BEGIN:VEVENT".to_owned(),
        format!("UID:{uid}"),
        format!("DTSTAMP:{}", Utc::now().format("%Y%m%dT%H%M%SZ")),
        date_time_property("DTSTART", start, timezone),
        date_time_property("DTEND", end, timezone),
        format!("SUMMARY:{}", escape_text(&format!("{category} ({hours:.2}h)"))),
        format!("DESCRIPTION:{}", escape_text(&description)),
        "END:VEVENT".to_owned(),
        "END:VCALENDAR".to_owned(),
    ];

    lines.iter().fold(String::new(), |mut document, line| {
        document.push_str(&fold_line(line));
        document.push_str("\r\n");
        document
    })
}

/// Splits a content line into 75-octet pieces joined by CRLF and a space.
///
/// Pieces never end inside a multi-byte character.
fn fold_line(line: &str) -> String {
    let mut folded = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut line_octets = 0;

    for character in line.chars() {
        let width = character.len_utf8();
        if line_octets + width > MAX_LINE_OCTETS {
            folded.push_str("\r\n ");
            line_octets = 1;
        }
        folded.push(character);
        line_octets += width;
    }

    folded
}

fn date_time_property(name: &str, value: NaiveDateTime, timezone: &str) -> String {
    let formatted = value.format("%Y%m%dT%H%M%S");
    if timezone.eq_ignore_ascii_case("UTC") {
        format!("{name}:{formatted}Z")
    } else {
        format!("{name};TZID={timezone}:{formatted}")
    }
}

/// Escapes TEXT values per RFC 5545 section 3.3.11.
fn escape_text(value: &str) -> String {
    value.chars().fold(String::with_capacity(value.len()), |mut escaped, character| {
        let _ = match character {
            '\\' => escaped.write_str("\\\\"),
            ';' => escaped.write_str("\\;"),
            ',' => escaped.write_str("\\,"),
            '\n' => escaped.write_str("\\n"),
            '\r' => Ok(()),
            other => escaped.write_char(other),
        };
        escaped
    })
}
