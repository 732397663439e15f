use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::Mutex;

use crate::{spotify::auth::extract_auth_code, types::AuthCallback};

/// Handles the OAuth redirect from the provider.
///
/// Validates the query parameters against the expected `state` and records
/// the outcome for the waiting auth flow. Only the first completing request
/// counts; the listener is shut down by the flow once an outcome exists.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<Arc<Mutex<AuthCallback>>>,
) -> Html<&'static str> {
    let mut state = shared_state.lock().await;

    if state.outcome.is_some() {
        return Html("<h4>Authorization already completed.</h4>");
    }

    match extract_auth_code(&params, &state.expected_state) {
        Ok(code) => {
            state.outcome = Some(Ok(code));
            Html("<h2>Authorization successful!</h2><p>You can close this window.</p>")
        }
        Err(e) => {
            state.outcome = Some(Err(e.to_string()));
            Html("<h4>Authorization failed.</h4><p>Check the terminal for details.</p>")
        }
    }
}
