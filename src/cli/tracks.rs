use chrono::{Local, NaiveDate};
use tabled::Table;

use crate::{
    error, info, spotify,
    types::TrackTableRow,
    utils::{deduplicate_tracks, format_date},
};

/// Lists the tracks played on `date` (default: today), deduplicated unless
/// `all` is set.
pub async fn list_tracks(date: Option<NaiveDate>, all: bool, debug: bool) {
    let cfg = super::load_config();

    let mut client = match spotify::auth::ensure_authenticated(&cfg).await {
        Ok(client) => client,
        Err(e) => error!("Failed to list tracks: {}", e),
    };

    let date_label = date.map(format_date).unwrap_or_else(|| "today".to_string());
    info!("Fetching listening history for {}...", date_label);

    let tracks = match super::fetch_tracks(&mut client, date, debug).await {
        Ok(tracks) => tracks,
        Err(e) => error!("Failed to list tracks: {}", e),
    };

    if tracks.is_empty() {
        info!("No tracks found for {}.", date_label);
        return;
    }

    let display_tracks = if all {
        tracks
    } else {
        deduplicate_tracks(&tracks)
    };
    let track_label = if all { "track(s)" } else { "unique track(s)" };
    info!(
        "Found {} {} for {}:",
        display_tracks.len(),
        track_label,
        date_label
    );

    let rows: Vec<TrackTableRow> = display_tracks
        .iter()
        .enumerate()
        .map(|(i, track)| TrackTableRow {
            index: i + 1,
            time: track
                .played_at
                .with_timezone(&Local)
                .format("%H:%M:%S")
                .to_string(),
            name: track.name.clone(),
            artists: track.artists.join(", "),
        })
        .collect();

    println!("{}", Table::new(rows));
}
