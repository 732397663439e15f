use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, sync::Arc};
use tokio::{
    sync::{Mutex, Notify},
    task::JoinHandle,
};

use crate::{api, error::ApiError, types::AuthCallback, warning};

/// Starts the one-shot OAuth callback listener on the loopback interface.
///
/// The server runs on a background task until `shutdown` is notified; the
/// auth flow triggers that notification on every exit path and awaits the
/// returned handle, so no process lingers holding the port.
pub async fn start_callback_server(
    state: Arc<Mutex<AuthCallback>>,
    shutdown: Arc<Notify>,
    port: u16,
    callback_path: String,
) -> Result<JoinHandle<()>, ApiError> {
    let app = Router::new()
        .route("/health", get(api::health))
        .route(&callback_path, get(api::callback).layer(Extension(state)));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        ApiError::Auth(format!(
            "failed to bind callback listener on {}: {}",
            addr, e
        ))
    })?;

    Ok(tokio::spawn(async move {
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.notified().await });
        if let Err(e) = serve.await {
            warning!("Callback server error: {}", e);
        }
    }))
}
