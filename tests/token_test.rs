use std::path::PathBuf;

use replaycli::management::TokenStore;
use replaycli::types::TokenRecord;
use replaycli::utils::now_ms;

fn temp_token_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "replaycli-test-{}-{}.json",
        name,
        std::process::id()
    ))
}

fn record(expires_at: i64) -> TokenRecord {
    TokenRecord {
        access_token: "access-123".to_string(),
        refresh_token: "refresh-456".to_string(),
        expires_at,
    }
}

#[tokio::test]
async fn save_then_load_roundtrip() {
    let path = temp_token_path("roundtrip");
    let store = TokenStore::new(path.clone());

    store.save(&record(1_700_000_000_000)).await.unwrap();
    let loaded = store.load().await.expect("record should load");

    assert_eq!(loaded.access_token, "access-123");
    assert_eq!(loaded.refresh_token, "refresh-456");
    assert_eq!(loaded.expires_at, 1_700_000_000_000);

    // The file format matches the documented camelCase token file.
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"accessToken\""));
    assert!(raw.contains("\"refreshToken\""));
    assert!(raw.contains("\"expiresAt\""));

    store.delete().await.unwrap();
}

#[tokio::test]
async fn save_overwrites_prior_record() {
    let store = TokenStore::new(temp_token_path("overwrite"));

    store.save(&record(1)).await.unwrap();
    store.save(&record(2)).await.unwrap();

    assert_eq!(store.load().await.unwrap().expires_at, 2);
    store.delete().await.unwrap();
}

#[tokio::test]
async fn load_absent_is_none() {
    let store = TokenStore::new(temp_token_path("absent"));
    assert!(store.load().await.is_none());
}

#[tokio::test]
async fn load_corrupt_is_none() {
    let path = temp_token_path("corrupt");
    std::fs::write(&path, "{not valid json").unwrap();

    let store = TokenStore::new(path.clone());
    assert!(store.load().await.is_none());
    assert!(!store.has_valid().await);

    store.delete().await.unwrap();
}

#[tokio::test]
async fn delete_is_idempotent() {
    let store = TokenStore::new(temp_token_path("delete"));

    // Absence is not an error.
    store.delete().await.unwrap();

    store.save(&record(1)).await.unwrap();
    store.delete().await.unwrap();
    assert!(store.load().await.is_none());
    store.delete().await.unwrap();
}

#[tokio::test]
async fn has_valid_checks_expiry() {
    let store = TokenStore::new(temp_token_path("expiry"));

    store.save(&record(now_ms() + 60_000)).await.unwrap();
    assert!(store.has_valid().await);

    store.save(&record(now_ms() - 1)).await.unwrap();
    assert!(!store.has_valid().await);

    store.delete().await.unwrap();
}
