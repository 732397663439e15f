use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDate, Utc};
use tokio::time::sleep;

use crate::{
    error::ApiError,
    types::{PlayHistoryItem, RecentlyPlayedResponse, Track},
    utils::{DateWindow, TimeBase, filter_music_tracks},
};

use super::SpotifyClient;

/// Page size of the recently-played endpoint. Also the effective retrieval
/// horizon: Spotify only serves roughly the most recent 50 plays / 24 hours.
pub const PAGE_SIZE: usize = 50;

/// Fixed delay between successful page fetches, to stay under the
/// provider's implicit rate budget.
const PAGE_DELAY: Duration = Duration::from_millis(100);

/// Instrumentation events emitted while a day window is being fetched.
/// Purely observational; emitting them never alters control flow or results.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    Window {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    Page {
        total: usize,
        kept: usize,
        oldest: Option<DateTime<Utc>>,
        newest: Option<DateTime<Utc>>,
    },
}

/// Sink for [`FetchEvent`]s. The CLI plugs in a console printer for
/// `--debug`; tests collect events into a vector.
pub trait FetchObserver {
    fn emit(&mut self, event: FetchEvent);
}

/// Discards all events. The default when debug output is off.
pub struct NoopObserver;

impl FetchObserver for NoopObserver {
    fn emit(&mut self, _event: FetchEvent) {}
}

/// A paginated source of play-history items, newest first.
///
/// [`SpotifyClient`] is the production implementation; tests drive the
/// pagination loop with synthetic sources.
#[allow(async_fn_in_trait)]
pub trait HistorySource {
    /// One page of at most `limit` items played strictly before the
    /// `before` cursor (epoch milliseconds), newest first.
    async fn recently_played(
        &mut self,
        limit: usize,
        before: Option<i64>,
    ) -> Result<Vec<PlayHistoryItem>, ApiError>;
}

impl HistorySource for SpotifyClient {
    async fn recently_played(
        &mut self,
        limit: usize,
        before: Option<i64>,
    ) -> Result<Vec<PlayHistoryItem>, ApiError> {
        let mut url = format!(
            "{uri}/me/player/recently-played?limit={limit}",
            uri = self.api_url(),
            limit = limit
        );
        if let Some(before) = before {
            url.push_str(&format!("&before={}", before));
        }

        let response: RecentlyPlayedResponse = self.get_json(&url).await?;
        Ok(response.items)
    }
}

/// Fetches all tracks played on `target_date`, newest first.
///
/// Paginates the recently-played endpoint backward in time with a `before`
/// cursor (the oldest timestamp seen so far), keeping items whose play
/// instant falls inside the day window. Defaults to the current local date;
/// the membership predicate uses the given time base (UTC by default at the
/// call sites, for consistency with the provider's timestamps).
///
/// Pagination stops when a page is empty, when a page is short (no further
/// pages exist), when the oldest item crosses the start of the day window,
/// or when it crosses the rolling 24-hour retrieval horizon beyond which
/// the endpoint serves nothing. A rate-limited request is retried with the
/// same cursor after the provider-supplied backoff (default 5 s); any other
/// error aborts the fetch.
///
/// Items that are not playable tracks, or that fail to parse, are silently
/// dropped. The final result additionally passes a validity filter
/// (non-empty id and name, at least one artist).
pub async fn fetch_day<S: HistorySource>(
    source: &mut S,
    target_date: Option<NaiveDate>,
    time_base: TimeBase,
    observer: &mut dyn FetchObserver,
) -> Result<Vec<Track>, ApiError> {
    let date = target_date.unwrap_or_else(|| Local::now().date_naive());
    let window = DateWindow::for_date(date, time_base);
    let oldest_allowed = Utc::now() - ChronoDuration::hours(24);

    observer.emit(FetchEvent::Window {
        start: window.start,
        end: window.end,
    });

    let mut collected: Vec<Track> = Vec::new();
    let mut cursor: Option<i64> = None;

    loop {
        let items = match source.recently_played(PAGE_SIZE, cursor).await {
            Ok(items) => items,
            Err(err) if err.is_rate_limited() => {
                // Same cursor again; a retry is not a page advance.
                sleep(err.retry_delay()).await;
                continue;
            }
            Err(err) => return Err(err),
        };

        let total = items.len();
        let parsed = parse_items(items);
        let newest = parsed.first().map(|play| play.played_at);
        let oldest = parsed.last().map(|play| play.played_at);

        let mut kept = 0usize;
        for play in &parsed {
            if let Some(track) = &play.track {
                if window.contains(play.played_at) {
                    collected.push(track.clone());
                    kept += 1;
                }
            }
        }

        observer.emit(FetchEvent::Page {
            total,
            kept,
            oldest,
            newest,
        });

        if total < PAGE_SIZE {
            break;
        }
        let Some(oldest) = oldest else {
            break;
        };
        if oldest < window.start || oldest < oldest_allowed {
            break;
        }

        cursor = Some(oldest.timestamp_millis());
        sleep(PAGE_DELAY).await;
    }

    Ok(filter_music_tracks(collected))
}

struct ParsedPlay {
    played_at: DateTime<Utc>,
    /// `None` for history entries whose underlying media is not a track
    /// (e.g. podcast episodes).
    track: Option<Track>,
}

fn parse_items(items: Vec<PlayHistoryItem>) -> Vec<ParsedPlay> {
    items
        .into_iter()
        .filter_map(|item| {
            let played_at = DateTime::parse_from_rfc3339(&item.played_at)
                .ok()?
                .with_timezone(&Utc);

            let track = item.track.and_then(|t| {
                if t.kind != "track" {
                    return None;
                }
                Some(Track {
                    id: t.id.unwrap_or_default(),
                    name: t.name,
                    artists: t.artists.into_iter().map(|a| a.name).collect(),
                    played_at,
                })
            });

            Some(ParsedPlay { played_at, track })
        })
        .collect()
}
