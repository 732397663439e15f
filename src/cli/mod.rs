//! # CLI Module
//!
//! User-facing command implementations. Each command loads the
//! configuration, establishes (or verifies) an authenticated session, and
//! delegates to the `spotify` modules, handling user feedback and error
//! presentation.
//!
//! ## Commands
//!
//! - [`auth`] - run the OAuth authorization flow (redirect or manual)
//! - [`logout`] - remove the stored token record
//! - [`list_tracks`] - show the tracks played on a given day
//! - [`create_playlist`] - turn a day of listening history into a playlist
//!
//! All commands report failures through the `error!` macro, which exits the
//! process with a non-zero status.

mod auth;
mod playlist;
mod tracks;

use std::time::Duration;

use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};

pub use auth::auth;
pub use auth::logout;
pub use playlist::create_playlist;
pub use tracks::list_tracks;

use crate::{
    config::Config,
    error,
    error::ApiError,
    info,
    spotify::{
        SpotifyClient,
        history::{FetchEvent, FetchObserver, NoopObserver, fetch_day},
    },
    types::Track,
    utils::TimeBase,
};

fn load_config() -> Config {
    match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => error!("{}", e),
    }
}

/// Prints fetch instrumentation to the console when `--debug` is set.
struct ConsoleObserver;

impl FetchObserver for ConsoleObserver {
    fn emit(&mut self, event: FetchEvent) {
        match event {
            FetchEvent::Window { start, end } => {
                info!("Day window (UTC): {} .. {}", start, end);
            }
            FetchEvent::Page {
                total,
                kept,
                oldest,
                newest,
            } => {
                info!(
                    "Page: {} item(s), {} kept, newest {}, oldest {}",
                    total,
                    kept,
                    newest.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".into()),
                    oldest.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".into()),
                );
            }
        }
    }
}

/// Fetches the day's history with a progress spinner. Debug mode swaps the
/// spinner for per-page instrumentation lines.
async fn fetch_tracks(
    client: &mut SpotifyClient,
    target_date: Option<NaiveDate>,
    debug: bool,
) -> Result<Vec<Track>, ApiError> {
    if debug {
        let mut observer = ConsoleObserver;
        return fetch_day(client, target_date, TimeBase::Utc, &mut observer).await;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_message("Fetching listening history...");
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }

    let mut observer = NoopObserver;
    let result = fetch_day(client, target_date, TimeBase::Utc, &mut observer).await;
    pb.finish_and_clear();
    result
}
