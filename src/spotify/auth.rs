use std::{collections::HashMap, sync::Arc, time::Duration};

use reqwest::Client;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{Mutex, Notify},
};

use crate::{
    config::Config,
    error::ApiError,
    info,
    management::TokenStore,
    server,
    spotify::SpotifyClient,
    success,
    types::{AuthCallback, TokenRecord, TokenResponse},
    utils, warning,
};

/// Scopes requested during authorization: read the listening history, modify
/// private playlists, read the account email.
const SCOPES: [&str; 3] = [
    "user-read-recently-played",
    "playlist-modify-private",
    "user-read-email",
];

/// Establishes an authenticated session, interactively if necessary.
///
/// If a stored token record exists and is unexpired it is adopted without a
/// network call. An expired record with a refresh token triggers a refresh
/// attempt; any refresh failure falls through to the full interactive
/// authorization flow, as does the absence of a record.
pub async fn authenticate(cfg: &Config) -> Result<SpotifyClient, ApiError> {
    let store = TokenStore::new(cfg.token_file.clone());

    if let Some(record) = store.load().await {
        if !record.is_expired() {
            return Ok(session_client(cfg, &record));
        }

        match refresh_access_token(cfg, &record).await {
            Ok(refreshed) => return Ok(session_client(cfg, &refreshed)),
            Err(_) => {
                warning!("Failed to refresh token, starting new authentication flow...");
            }
        }
    }

    start_auth_flow(cfg, false).await
}

/// Non-interactive session establishment for commands that require a prior
/// `auth` run.
///
/// Fails with [`ApiError::Auth`] when no token record exists. An expired
/// record is refreshed; a live one is adopted as-is.
pub async fn ensure_authenticated(cfg: &Config) -> Result<SpotifyClient, ApiError> {
    let store = TokenStore::new(cfg.token_file.clone());

    let record = store.load().await.ok_or_else(|| {
        ApiError::Auth("not authenticated. Please run replaycli auth first.".to_string())
    })?;

    let record = if record.is_expired() {
        refresh_access_token(cfg, &record).await?
    } else {
        record
    };

    Ok(session_client(cfg, &record))
}

/// Runs the full OAuth authorization-code flow.
///
/// Generates a fresh unguessable `state` token, builds the authorization
/// URL, obtains the authorization code either through the local callback
/// listener (redirect mode) or a pasted redirect URL (manual mode), then
/// exchanges the code for tokens and persists them.
pub async fn start_auth_flow(cfg: &Config, manual: bool) -> Result<SpotifyClient, ApiError> {
    let state_token = utils::generate_state_token();
    let auth_url = build_auth_url(cfg, &state_token)?;

    let code = if manual {
        wait_for_manual_callback(cfg, &auth_url, &state_token).await?
    } else {
        wait_for_redirect_callback(cfg, &auth_url, state_token).await?
    };

    let record = exchange_code(cfg, &code).await?;
    success!("Authentication successful!");

    Ok(session_client(cfg, &record))
}

/// Obtains the authorization code via a one-shot local HTTP listener.
///
/// The listener is a scoped resource: it is torn down through the graceful
/// shutdown handle on every exit path - success, rejected callback or
/// timeout - before this function returns, so the port is never left held.
/// The wait is bounded by `cfg.callback_timeout_secs`.
async fn wait_for_redirect_callback(
    cfg: &Config,
    auth_url: &str,
    state_token: String,
) -> Result<String, ApiError> {
    let shared_state = Arc::new(Mutex::new(AuthCallback::new(state_token)));
    let shutdown = Arc::new(Notify::new());

    let handle = server::start_callback_server(
        Arc::clone(&shared_state),
        Arc::clone(&shutdown),
        cfg.callback_port(),
        cfg.callback_path(),
    )
    .await?;

    if webbrowser::open(auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        );
    }
    info!("Waiting for authorization...");

    let outcome = wait_for_outcome(
        &shared_state,
        Duration::from_secs(cfg.callback_timeout_secs),
    )
    .await;

    shutdown.notify_one();
    let _ = handle.await;

    match outcome {
        Some(Ok(code)) => Ok(code),
        Some(Err(message)) => Err(ApiError::Auth(message)),
        None => Err(ApiError::Auth(
            "timed out waiting for the authorization callback".to_string(),
        )),
    }
}

/// Polls the shared callback state until the handler records an outcome or
/// the timeout elapses.
async fn wait_for_outcome(
    shared_state: &Arc<Mutex<AuthCallback>>,
    max_wait: Duration,
) -> Option<Result<String, String>> {
    let start = tokio::time::Instant::now();

    while start.elapsed() < max_wait {
        let mut lock = shared_state.lock().await;
        if lock.outcome.is_some() {
            return lock.outcome.take();
        }
        drop(lock);
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    None
}

/// Obtains the authorization code by asking the user to paste the full
/// redirect URL. The pasted URL goes through the same query extraction and
/// state check as the listener-based flow, just without a listener.
async fn wait_for_manual_callback(
    cfg: &Config,
    auth_url: &str,
    expected_state: &str,
) -> Result<String, ApiError> {
    print!("{}", manual_instructions(auth_url, &cfg.redirect_uri));

    let mut line = String::new();
    let mut reader = BufReader::new(tokio::io::stdin());
    reader
        .read_line(&mut line)
        .await
        .map_err(|e| ApiError::Auth(format!("failed to read redirect URL: {}", e)))?;

    let parsed = reqwest::Url::parse(line.trim())
        .map_err(|e| ApiError::Auth(format!("failed to parse redirect URL: {}", e)))?;
    let params: HashMap<String, String> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    extract_auth_code(&params, expected_state)
}

/// The instructions printed in manual mode. The example redirect mirrors the
/// configured URI, so overridden setups see the shape they will actually get.
pub fn manual_instructions(auth_url: &str, redirect_uri: &str) -> String {
    format!(
        "\n=== Manual Authorization Mode ===\n\
         1. Open this URL in your browser:\n\n   {auth_url}\n\n\
         2. After authorizing, you will be redirected to a URL that looks like:\n   {redirect_uri}?code=...&state=...\n\
         3. Copy the ENTIRE redirect URL and paste it below:\n\n"
    )
}

/// Validates callback query parameters and extracts the authorization code.
///
/// Rejects on a provider-reported `error`, on a missing or mismatched
/// `state`, and on a missing `code` - each with a descriptive cause. Shared
/// by the redirect-mode handler and the manual flow.
pub fn extract_auth_code(
    params: &HashMap<String, String>,
    expected_state: &str,
) -> Result<String, ApiError> {
    if let Some(error) = params.get("error") {
        return Err(ApiError::Auth(format!("authorization error: {}", error)));
    }

    match params.get("state") {
        Some(state) if state == expected_state => {}
        _ => return Err(ApiError::Auth("invalid state parameter".to_string())),
    }

    params
        .get("code")
        .filter(|code| !code.is_empty())
        .cloned()
        .ok_or_else(|| ApiError::Auth("missing authorization code".to_string()))
}

/// Exchanges an authorization code for tokens and persists the record.
pub async fn exchange_code(cfg: &Config, code: &str) -> Result<TokenRecord, ApiError> {
    let token = request_token(
        cfg,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &cfg.redirect_uri),
        ],
    )
    .await
    .map_err(|e| ApiError::Auth(format!("failed to exchange code for tokens: {}", e)))?;

    let refresh_token = token.refresh_token.ok_or_else(|| {
        ApiError::Auth("token response carried no refresh token".to_string())
    })?;

    let record = TokenRecord {
        access_token: token.access_token,
        refresh_token,
        expires_at: utils::now_ms() + token.expires_in * 1000,
    };

    TokenStore::new(cfg.token_file.clone()).save(&record).await?;
    Ok(record)
}

/// Exchanges a refresh token for a fresh access token and persists the
/// updated record. The refresh token itself is preserved unless the
/// provider issues a new one.
pub async fn refresh_access_token(
    cfg: &Config,
    current: &TokenRecord,
) -> Result<TokenRecord, ApiError> {
    let token = request_token(
        cfg,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", &current.refresh_token),
        ],
    )
    .await
    .map_err(|e| ApiError::Auth(format!("failed to refresh access token: {}", e)))?;

    let record = TokenRecord {
        access_token: token.access_token,
        refresh_token: token
            .refresh_token
            .unwrap_or_else(|| current.refresh_token.clone()),
        expires_at: utils::now_ms() + token.expires_in * 1000,
    };

    TokenStore::new(cfg.token_file.clone()).save(&record).await?;
    Ok(record)
}

async fn request_token(cfg: &Config, form: &[(&str, &str)]) -> Result<TokenResponse, ApiError> {
    let client = Client::new();
    let response = client
        .post(&cfg.token_url)
        .basic_auth(&cfg.client_id, Some(&cfg.client_secret))
        .form(form)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Provider(format!(
            "token endpoint returned {}: {}",
            status, body
        )));
    }

    Ok(response.json::<TokenResponse>().await?)
}

/// Builds the user-facing authorization URL. Query parameters go through
/// the url-encoding serializer, so a redirect URI with reserved characters
/// survives intact.
pub fn build_auth_url(cfg: &Config, state: &str) -> Result<String, ApiError> {
    let mut url = reqwest::Url::parse(&cfg.auth_url).map_err(|e| {
        ApiError::Config(format!(
            "invalid authorization URL {}: {}",
            cfg.auth_url, e
        ))
    })?;

    url.query_pairs_mut()
        .append_pair("client_id", &cfg.client_id)
        .append_pair("response_type", "code")
        .append_pair("redirect_uri", &cfg.redirect_uri)
        .append_pair("state", state)
        .append_pair("scope", &SCOPES.join(" "));

    Ok(url.to_string())
}

fn session_client(cfg: &Config, record: &TokenRecord) -> SpotifyClient {
    SpotifyClient::new(cfg.api_url.clone(), record.access_token.clone())
}
