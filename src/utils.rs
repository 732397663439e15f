use std::collections::HashSet;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use rand::{Rng, distr::Alphanumeric};

use crate::types::Track;

/// Span of one calendar day in milliseconds, minus the final millisecond.
const DAY_SPAN_MS: i64 = 86_399_999;

/// Which wall clock a calendar day is anchored to.
///
/// The recently-played endpoint reports instants in UTC, so `Utc` is the
/// default for filtering; `Local` matches the user's perception of "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBase {
    Local,
    Utc,
}

/// The inclusive `[00:00:00.000, 23:59:59.999]` span of one calendar date,
/// normalized to UTC instants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// Computes the day window for `date` under the given time base.
    ///
    /// For `TimeBase::Local`, a midnight that does not exist locally (DST
    /// spring-forward) falls back to the UTC interpretation.
    pub fn for_date(date: NaiveDate, time_base: TimeBase) -> Self {
        let midnight = date.and_time(NaiveTime::MIN);
        let start = match time_base {
            TimeBase::Utc => Utc.from_utc_datetime(&midnight),
            TimeBase::Local => Local
                .from_local_datetime(&midnight)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&midnight)),
        };

        DateWindow {
            start,
            end: start + Duration::milliseconds(DAY_SPAN_MS),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// True iff `instant` falls on `target_date` under the given time base.
pub fn is_date(instant: DateTime<Utc>, target_date: NaiveDate, time_base: TimeBase) -> bool {
    DateWindow::for_date(target_date, time_base).contains(instant)
}

/// Parses a `YYYY-MM-DD` date string. Used as a clap value parser, so the
/// error message surfaces directly in CLI output.
pub fn parse_date(input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}'. Use YYYY-MM-DD format.", input))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Removes repeated plays of the same track, keeping the first occurrence
/// and preserving order.
pub fn deduplicate_tracks(tracks: &[Track]) -> Vec<Track> {
    let mut seen = HashSet::new();
    tracks
        .iter()
        .filter(|track| seen.insert(track.id.clone()))
        .cloned()
        .collect()
}

/// Drops entries that would not be playable music tracks: empty id, empty
/// name or no artists.
pub fn filter_music_tracks(tracks: Vec<Track>) -> Vec<Track> {
    tracks
        .into_iter()
        .filter(|track| !track.id.is_empty() && !track.name.is_empty() && !track.artists.is_empty())
        .collect()
}

/// Partitions ids into chunks of at most `chunk_size`, in order.
pub fn chunk_ids(ids: &[String], chunk_size: usize) -> Vec<Vec<String>> {
    ids.chunks(chunk_size).map(|chunk| chunk.to_vec()).collect()
}

/// Generates the opaque OAuth `state` token: 32 alphanumeric characters from
/// a cryptographically secure source.
pub fn generate_state_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Current instant as milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
