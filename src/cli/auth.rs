use crate::{error, management::TokenStore, spotify, success};

/// Runs the authorization flow. With `manual` the copy-paste variant is
/// forced; otherwise a stored or refreshed token is reused when possible and
/// the browser-redirect flow only starts when neither works.
pub async fn auth(manual: bool) {
    let cfg = super::load_config();

    let result = if manual {
        spotify::auth::start_auth_flow(&cfg, true).await
    } else {
        spotify::auth::authenticate(&cfg).await
    };

    match result {
        Ok(_) => success!("Authentication complete!"),
        Err(e) => error!("Authentication failed: {}", e),
    }
}

/// Removes the stored token record. The only path that deletes it.
pub async fn logout() {
    let cfg = super::load_config();

    match TokenStore::new(cfg.token_file.clone()).delete().await {
        Ok(()) => success!("Stored tokens removed."),
        Err(e) => error!("Failed to remove stored tokens: {}", e),
    }
}
