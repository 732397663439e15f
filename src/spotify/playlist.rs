use std::time::Duration;

use chrono::{Local, NaiveDate};
use tokio::time::sleep;

use crate::{
    error::ApiError,
    info,
    types::{
        AddTracksRequest, AddTracksResponse, CreatePlaylistRequest, CreatePlaylistResponse,
        PlaylistInfo, PlaylistTracksResponse,
    },
    utils::{chunk_ids, format_date},
};

use super::SpotifyClient;

/// Provider limit on track additions per request.
pub const ADD_BATCH_SIZE: usize = 100;

/// Page size for listing playlist tracks.
const LIST_PAGE_SIZE: usize = 100;

/// Delay between batched requests, matching the history fetcher's pacing.
const BATCH_DELAY: Duration = Duration::from_millis(100);

/// Remote playlist mutation and listing endpoints, one request per call.
///
/// [`SpotifyClient`] is the production implementation; tests drive the
/// batching and retry loops with synthetic transports.
#[allow(async_fn_in_trait)]
pub trait PlaylistApi {
    /// Appends `uris` (at most [`ADD_BATCH_SIZE`]) to the playlist.
    async fn add_chunk(
        &mut self,
        playlist_id: &str,
        uris: Vec<String>,
    ) -> Result<AddTracksResponse, ApiError>;

    /// One page of playlist entries starting at `offset`.
    async fn tracks_page(
        &mut self,
        playlist_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<PlaylistTracksResponse, ApiError>;
}

impl PlaylistApi for SpotifyClient {
    async fn add_chunk(
        &mut self,
        playlist_id: &str,
        uris: Vec<String>,
    ) -> Result<AddTracksResponse, ApiError> {
        let url = format!(
            "{uri}/playlists/{id}/tracks",
            uri = self.api_url(),
            id = playlist_id
        );
        self.post_json(&url, &AddTracksRequest { uris }).await
    }

    async fn tracks_page(
        &mut self,
        playlist_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<PlaylistTracksResponse, ApiError> {
        let url = format!(
            "{uri}/playlists/{id}/tracks?offset={offset}&limit={limit}",
            uri = self.api_url(),
            id = playlist_id,
            offset = offset,
            limit = limit
        );
        self.get_json(&url).await
    }
}

/// Creates a playlist for the current user. A single remote call; any
/// failure is wrapped in a descriptive [`ApiError::Playlist`].
pub async fn create(
    client: &SpotifyClient,
    name: String,
    description: Option<String>,
    public: bool,
) -> Result<PlaylistInfo, ApiError> {
    let url = format!("{uri}/me/playlists", uri = client.api_url());
    let body = CreatePlaylistRequest {
        name,
        description: description
            .unwrap_or_else(|| format!("Playlist created on {}", format_date(today()))),
        public,
    };

    let response: CreatePlaylistResponse = client
        .post_json(&url, &body)
        .await
        .map_err(|e| ApiError::Playlist(format!("failed to create playlist: {}", e)))?;

    Ok(PlaylistInfo {
        id: response.id,
        name: response.name,
        url: response.external_urls.spotify,
    })
}

/// Adds tracks to a playlist in chunks of at most 100, in order.
///
/// Waits 100 ms between chunks (not after the last). A rate-limited chunk
/// is retried after the provider-supplied backoff without advancing; any
/// other failure aborts with [`ApiError::Playlist`]. Chunks already
/// committed to the remote playlist are not rolled back.
pub async fn add_tracks<A: PlaylistApi>(
    api: &mut A,
    playlist_id: &str,
    track_ids: &[String],
) -> Result<(), ApiError> {
    let chunks = chunk_ids(track_ids, ADD_BATCH_SIZE);
    let chunk_count = chunks.len();

    let mut index = 0;
    while index < chunk_count {
        let chunk = &chunks[index];
        let uris: Vec<String> = chunk
            .iter()
            .map(|id| format!("spotify:track:{}", id))
            .collect();

        match api.add_chunk(playlist_id, uris).await {
            Ok(_) => {
                if chunk_count > 1 {
                    info!(
                        "Added batch {}/{} ({} tracks)",
                        index + 1,
                        chunk_count,
                        chunk.len()
                    );
                }
                index += 1;
                if index < chunk_count {
                    sleep(BATCH_DELAY).await;
                }
            }
            Err(err) if err.is_rate_limited() => {
                sleep(err.retry_delay()).await;
            }
            Err(err) => {
                return Err(ApiError::Playlist(format!(
                    "failed to add tracks to playlist: {}",
                    err
                )));
            }
        }
    }

    Ok(())
}

/// Lists the track ids of a playlist via forward offset pagination. Used
/// for inspection and verification; the create flow does not depend on it.
pub async fn get_playlist_tracks<A: PlaylistApi>(
    api: &mut A,
    playlist_id: &str,
) -> Result<Vec<String>, ApiError> {
    let mut track_ids: Vec<String> = Vec::new();
    let mut offset = 0usize;

    loop {
        let response = match api.tracks_page(playlist_id, offset, LIST_PAGE_SIZE).await {
            Ok(response) => response,
            Err(err) if err.is_rate_limited() => {
                sleep(err.retry_delay()).await;
                continue;
            }
            Err(err) => return Err(err),
        };

        let count = response.items.len();
        if count == 0 {
            break;
        }

        for item in response.items {
            if let Some(id) = item.track.and_then(|t| t.id) {
                track_ids.push(id);
            }
        }

        if count < LIST_PAGE_SIZE {
            break;
        }

        offset += LIST_PAGE_SIZE;
        sleep(BATCH_DELAY).await;
    }

    Ok(track_ids)
}

/// Deterministic playlist label for a target date; defaults to today.
pub fn generate_playlist_name(target_date: Option<NaiveDate>) -> String {
    let date = target_date.unwrap_or_else(today);
    format!("Today's History - {}", format_date(date))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
