use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use replaycli::error::ApiError;
use replaycli::spotify::history::{FetchEvent, FetchObserver, HistorySource, fetch_day};
use replaycli::types::{ArtistRef, PlayHistoryItem, PlayedTrack};
use replaycli::utils::{DateWindow, TimeBase};

/// Synthetic paginated source: serves scripted responses in order and
/// records the cursor of every request.
struct MockSource {
    pages: VecDeque<Result<Vec<PlayHistoryItem>, ApiError>>,
    calls: Vec<Option<i64>>,
}

impl MockSource {
    fn new(pages: Vec<Result<Vec<PlayHistoryItem>, ApiError>>) -> Self {
        MockSource {
            pages: pages.into(),
            calls: Vec::new(),
        }
    }
}

impl HistorySource for MockSource {
    async fn recently_played(
        &mut self,
        _limit: usize,
        before: Option<i64>,
    ) -> Result<Vec<PlayHistoryItem>, ApiError> {
        self.calls.push(before);
        self.pages.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

struct Recorder {
    events: Vec<FetchEvent>,
}

impl Recorder {
    fn new() -> Self {
        Recorder { events: Vec::new() }
    }

    fn page_events(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, FetchEvent::Page { .. }))
            .count()
    }
}

impl FetchObserver for Recorder {
    fn emit(&mut self, event: FetchEvent) {
        self.events.push(event);
    }
}

fn play(id: &str, at: DateTime<Utc>) -> PlayHistoryItem {
    PlayHistoryItem {
        track: Some(PlayedTrack {
            id: Some(id.to_string()),
            name: format!("Track {}", id),
            artists: vec![ArtistRef {
                name: "Artist".to_string(),
            }],
            kind: "track".to_string(),
        }),
        played_at: at.to_rfc3339(),
    }
}

/// Today's date in UTC plus its window; items are anchored to the window
/// start so the tests do not depend on the current time of day.
fn today() -> (chrono::NaiveDate, DateWindow) {
    let date = Utc::now().date_naive();
    (date, DateWindow::for_date(date, TimeBase::Utc))
}

#[tokio::test(start_paused = true)]
async fn stops_on_short_page() {
    let (date, window) = today();
    let noon = window.start + Duration::hours(12);

    let page: Vec<PlayHistoryItem> = (0..10)
        .map(|i| play(&format!("t{}", i), noon - Duration::seconds(i * 10)))
        .collect();
    let mut source = MockSource::new(vec![Ok(page)]);
    let mut recorder = Recorder::new();

    let tracks = fetch_day(&mut source, Some(date), TimeBase::Utc, &mut recorder)
        .await
        .unwrap();

    assert_eq!(tracks.len(), 10);
    assert_eq!(source.calls.len(), 1, "a short page ends the pagination");
    assert_eq!(source.calls[0], None);
}

#[tokio::test(start_paused = true)]
async fn stops_when_oldest_crosses_day_start() {
    let (date, window) = today();
    let noon = window.start + Duration::hours(12);

    // Full first page inside the day.
    let page1: Vec<PlayHistoryItem> = (0..50)
        .map(|i| play(&format!("a{}", i), noon - Duration::seconds(i * 10)))
        .collect();
    // Full second page whose oldest item lies before the day window.
    let mut page2: Vec<PlayHistoryItem> = (0..49)
        .map(|i| play(&format!("b{}", i), window.start + Duration::seconds(48 - i)))
        .collect();
    page2.push(play("before", window.start - Duration::seconds(1)));
    // A third page exists but must never be requested.
    let page3 = vec![play("never", window.start - Duration::hours(1))];

    let mut source = MockSource::new(vec![Ok(page1), Ok(page2), Ok(page3)]);
    let mut recorder = Recorder::new();

    let tracks = fetch_day(&mut source, Some(date), TimeBase::Utc, &mut recorder)
        .await
        .unwrap();

    assert_eq!(source.calls.len(), 2, "day fully consumed after page 2");
    // 50 from page 1, 49 in-window from page 2; the pre-window item is
    // filtered out.
    assert_eq!(tracks.len(), 99);
    assert!(tracks.iter().all(|t| t.id != "before" && t.id != "never"));

    // The second request's cursor is the oldest timestamp of page 1.
    let expected_cursor = (noon - Duration::seconds(49 * 10)).timestamp_millis();
    assert_eq!(source.calls[1], Some(expected_cursor));
}

#[tokio::test(start_paused = true)]
async fn stops_at_retrieval_horizon() {
    // A target day far enough back that everything in its window lies
    // beyond the provider's rolling 24-hour horizon.
    let date = (Utc::now() - Duration::days(2)).date_naive();
    let window = DateWindow::for_date(date, TimeBase::Utc);
    let noon = window.start + Duration::hours(12);

    // Full page, entirely inside the window, so neither the short-page nor
    // the day-start condition can fire.
    let page1: Vec<PlayHistoryItem> = (0..50)
        .map(|i| play(&format!("h{}", i), noon - Duration::seconds(i * 10)))
        .collect();
    let page2 = vec![play("never", noon - Duration::hours(1))];

    let mut source = MockSource::new(vec![Ok(page1), Ok(page2)]);
    let mut recorder = Recorder::new();

    let tracks = fetch_day(&mut source, Some(date), TimeBase::Utc, &mut recorder)
        .await
        .unwrap();

    assert_eq!(
        source.calls.len(),
        1,
        "pagination is pointless beyond the 24h horizon"
    );
    assert_eq!(tracks.len(), 50);
}

#[tokio::test(start_paused = true)]
async fn stops_on_empty_page() {
    let (date, _) = today();
    let mut source = MockSource::new(vec![Ok(Vec::new())]);
    let mut recorder = Recorder::new();

    let tracks = fetch_day(&mut source, Some(date), TimeBase::Utc, &mut recorder)
        .await
        .unwrap();

    assert!(tracks.is_empty());
    assert_eq!(source.calls.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_retries_same_page_with_supplied_delay() {
    let (date, window) = today();
    let noon = window.start + Duration::hours(12);

    let page: Vec<PlayHistoryItem> = (0..10)
        .map(|i| play(&format!("r{}", i), noon - Duration::seconds(i * 10)))
        .collect();
    let mut source = MockSource::new(vec![
        Err(ApiError::RateLimited {
            retry_after_secs: Some(2),
        }),
        Ok(page),
    ]);
    let mut recorder = Recorder::new();

    let start = tokio::time::Instant::now();
    let tracks = fetch_day(&mut source, Some(date), TimeBase::Utc, &mut recorder)
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(tracks.len(), 10);
    // Two requests, one logical page.
    assert_eq!(source.calls.len(), 2);
    assert_eq!(source.calls[0], source.calls[1], "cursor must not advance");
    assert_eq!(recorder.page_events(), 1);
    // Retry-After of "2" means a ~2000ms wait.
    assert!(elapsed >= std::time::Duration::from_millis(2000));
    assert!(elapsed < std::time::Duration::from_millis(2500));
}

#[tokio::test(start_paused = true)]
async fn rate_limit_defaults_to_five_seconds() {
    let (date, window) = today();
    let noon = window.start + Duration::hours(12);

    let mut source = MockSource::new(vec![
        Err(ApiError::RateLimited {
            retry_after_secs: None,
        }),
        Ok(vec![play("x", noon)]),
    ]);
    let mut recorder = Recorder::new();

    let start = tokio::time::Instant::now();
    let tracks = fetch_day(&mut source, Some(date), TimeBase::Utc, &mut recorder)
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(tracks.len(), 1);
    assert!(elapsed >= std::time::Duration::from_millis(5000));
    assert!(elapsed < std::time::Duration::from_millis(5500));
}

#[tokio::test(start_paused = true)]
async fn non_rate_limit_error_aborts() {
    let (date, _) = today();
    let mut source = MockSource::new(vec![Err(ApiError::Provider(
        "500 Internal Server Error".to_string(),
    ))]);
    let mut recorder = Recorder::new();

    let result = fetch_day(&mut source, Some(date), TimeBase::Utc, &mut recorder).await;

    assert!(matches!(result, Err(ApiError::Provider(_))));
    assert_eq!(source.calls.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn drops_non_track_and_unparseable_items() {
    let (date, window) = today();
    let noon = window.start + Duration::hours(12);

    let mut episode = play("ep1", noon - Duration::seconds(10));
    if let Some(track) = episode.track.as_mut() {
        track.kind = "episode".to_string();
    }
    let no_track = PlayHistoryItem {
        track: None,
        played_at: (noon - Duration::seconds(20)).to_rfc3339(),
    };
    let bad_timestamp = PlayHistoryItem {
        track: Some(PlayedTrack {
            id: Some("bad".to_string()),
            name: "Bad".to_string(),
            artists: vec![ArtistRef {
                name: "Artist".to_string(),
            }],
            kind: "track".to_string(),
        }),
        played_at: "garbage".to_string(),
    };

    let page = vec![play("ok", noon), episode, no_track, bad_timestamp];
    let mut source = MockSource::new(vec![Ok(page)]);
    let mut recorder = Recorder::new();

    let tracks = fetch_day(&mut source, Some(date), TimeBase::Utc, &mut recorder)
        .await
        .unwrap();

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, "ok");
}

#[tokio::test(start_paused = true)]
async fn emits_window_and_page_events() {
    let (date, window) = today();
    let noon = window.start + Duration::hours(12);

    let page = vec![play("e1", noon), play("e2", noon - Duration::seconds(30))];
    let mut source = MockSource::new(vec![Ok(page)]);
    let mut recorder = Recorder::new();

    let tracks = fetch_day(&mut source, Some(date), TimeBase::Utc, &mut recorder)
        .await
        .unwrap();

    assert_eq!(tracks.len(), 2);
    match &recorder.events[0] {
        FetchEvent::Window { start, end } => {
            assert_eq!(*start, window.start);
            assert_eq!((*end - *start).num_milliseconds(), 86_399_999);
        }
        other => panic!("expected window event first, got {:?}", other),
    }
    match &recorder.events[1] {
        FetchEvent::Page {
            total,
            kept,
            oldest,
            newest,
        } => {
            assert_eq!(*total, 2);
            assert_eq!(*kept, 2);
            assert_eq!(*newest, Some(noon));
            assert_eq!(*oldest, Some(noon - Duration::seconds(30)));
        }
        other => panic!("expected page event, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn fetch_and_deduplicate_two_day_history() {
    let (date, window) = today();
    let noon = window.start + Duration::hours(12);

    // 120 plays spanning two calendar days: 70 on the target day (with 3
    // duplicate ids), 50 on the day before.
    let mut today_items: Vec<PlayHistoryItem> = (0..70)
        .map(|i| play(&format!("t{}", i), noon - Duration::minutes(i)))
        .collect();
    for (dup, original) in [(10usize, 5usize), (20, 15), (30, 25)] {
        let at = noon - Duration::minutes(dup as i64);
        today_items[dup] = play(&format!("t{}", original), at);
    }
    let yesterday_items: Vec<PlayHistoryItem> = (0..50)
        .map(|i| {
            play(
                &format!("y{}", i),
                window.start - Duration::seconds(1) - Duration::minutes(i),
            )
        })
        .collect();

    let mut all_items = today_items;
    all_items.extend(yesterday_items);
    assert_eq!(all_items.len(), 120);

    let page1: Vec<PlayHistoryItem> = all_items[..50].to_vec();
    let page2: Vec<PlayHistoryItem> = all_items[50..100].to_vec();
    let page3: Vec<PlayHistoryItem> = all_items[100..].to_vec();

    let mut source = MockSource::new(vec![Ok(page1), Ok(page2), Ok(page3)]);
    let mut recorder = Recorder::new();

    let tracks = fetch_day(&mut source, Some(date), TimeBase::Utc, &mut recorder)
        .await
        .unwrap();

    // All 70 target-day plays survive the window filter, newest first.
    assert_eq!(tracks.len(), 70);
    assert!(
        tracks
            .windows(2)
            .all(|pair| pair[0].played_at >= pair[1].played_at),
        "newest-first order must be preserved"
    );

    // Page 2 already crossed the day start, so page 3 is never requested.
    assert_eq!(source.calls.len(), 2);

    let unique = replaycli::utils::deduplicate_tracks(&tracks);
    assert_eq!(unique.len(), 67);
    assert_eq!(unique[0].id, "t0");
    assert!(
        unique
            .windows(2)
            .all(|pair| pair[0].played_at >= pair[1].played_at)
    );
}
