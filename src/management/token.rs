use std::path::PathBuf;

use crate::{error::ApiError, types::TokenRecord, utils};

/// Persists the OAuth token record to a local JSON file.
///
/// The token file is the sole durable state of the application. It is
/// written on first authorization and on every refresh, and removed only by
/// an explicit `logout`. The process is single-instance and single-user;
/// the read-then-write cycle makes no atomicity guarantees.
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: PathBuf) -> Self {
        TokenStore { path }
    }

    /// Writes the record, overwriting any prior content. Fails with
    /// [`ApiError::Persistence`] when the medium is unwritable.
    pub async fn save(&self, record: &TokenRecord) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                async_fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(record)
            .map_err(|e| ApiError::Provider(format!("failed to serialize token record: {}", e)))?;
        async_fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Returns the stored record, or `None` when the file is absent or does
    /// not parse. Corruption is treated as absence, never as an error.
    pub async fn load(&self) -> Option<TokenRecord> {
        let content = async_fs::read_to_string(&self.path).await.ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Removes the record if present. Absence is not an error.
    pub async fn delete(&self) -> Result<(), ApiError> {
        match async_fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApiError::Persistence(e)),
        }
    }

    /// True iff a record exists and its expiry lies strictly in the future.
    pub async fn has_valid(&self) -> bool {
        match self.load().await {
            Some(record) => record.expires_at > utils::now_ms(),
            None => false,
        }
    }
}
