use chrono::NaiveDate;

use crate::{
    error, info, spotify, success,
    utils::{deduplicate_tracks, format_date},
};

/// Creates a playlist from the day's deduplicated listening history.
/// `dry_run` previews the playlist name and tracks without any write call.
pub async fn create_playlist(date: Option<NaiveDate>, dry_run: bool, debug: bool) {
    let cfg = super::load_config();

    let mut client = match spotify::auth::ensure_authenticated(&cfg).await {
        Ok(client) => client,
        Err(e) => error!("Failed to create playlist: {}", e),
    };

    let date_label = date.map(format_date).unwrap_or_else(|| "today".to_string());
    info!("Fetching listening history for {}...", date_label);

    let tracks = match super::fetch_tracks(&mut client, date, debug).await {
        Ok(tracks) => tracks,
        Err(e) => error!("Failed to create playlist: {}", e),
    };

    if tracks.is_empty() {
        info!("No tracks found for {}.", date_label);
        return;
    }

    let unique_tracks = deduplicate_tracks(&tracks);
    info!(
        "Found {} unique track(s) for {}.",
        unique_tracks.len(),
        date_label
    );

    let playlist_name = spotify::playlist::generate_playlist_name(date);

    if dry_run {
        info!("=== DRY RUN MODE ===");
        info!("Would create playlist: {}", playlist_name);
        info!("Would add tracks:");
        for (i, track) in unique_tracks.iter().enumerate() {
            println!("  {}. {} - {}", i + 1, track.name, track.artists.join(", "));
        }
        return;
    }

    info!("Creating playlist: {}", playlist_name);
    let description = format!(
        "Automatically created playlist with {} track(s) from {}'s listening history.",
        unique_tracks.len(),
        date_label
    );

    let playlist =
        match spotify::playlist::create(&client, playlist_name, Some(description), false).await {
            Ok(playlist) => playlist,
            Err(e) => error!("Failed to create playlist: {}", e),
        };

    success!("Playlist created: {}", playlist.url);
    info!("Adding {} track(s)...", unique_tracks.len());

    let track_ids: Vec<String> = unique_tracks.iter().map(|t| t.id.clone()).collect();
    if let Err(e) = spotify::playlist::add_tracks(&mut client, &playlist.id, &track_ids).await {
        error!("Failed to create playlist: {}", e);
    }

    success!("Done! Playlist URL: {}", playlist.url);
}
