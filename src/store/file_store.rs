//! Append-only JSON-lines credential store.
//!
//! Each line holds one `TokenRecord`. The file survives process restarts,
//! so a still-valid token written by a previous run is reused without a
//! fresh network round trip.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use crate::error::PersistenceError;
use crate::store::record::TokenRecord;

#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
    /// Serializes the uniqueness check and the append across concurrent
    /// callers (the startup eager check and the scheduler's first cycle
    /// can race).
    write_lock: Arc<Mutex<()>>,
}

impl CredentialStore {
    /// Opens (or prepares) the store at `path`, creating parent directories.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .map_err(|e| PersistenceError::Unavailable(e.to_string()))?;
            }
        }
        Ok(Self { path, write_lock: Arc::new(Mutex::new(())) })
    }

    /// Record with the greatest `expires_at` for the given provider, or
    /// `None` when nothing matches. Never returns another provider's record.
    pub async fn latest(&self, provider: &str) -> Result<Option<TokenRecord>, PersistenceError> {
        let records = self.read_all().await?;
        Ok(records
            .into_iter()
            .filter(|r| r.provider == provider)
            .max_by_key(|r| r.expires_at))
    }

    /// Durably appends a new record. Token values are unique across the
    /// whole store; a duplicate fails with `Conflict`.
    pub async fn append(&self, record: &TokenRecord) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().await;

        let existing = self.read_all().await?;
        if existing.iter().any(|r| r.value == record.value) {
            return Err(PersistenceError::Conflict(record.provider.clone()));
        }

        let line = serde_json::to_string(record)
            .map_err(|e| PersistenceError::Unavailable(e.to_string()))?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| PersistenceError::Unavailable(e.to_string()))?;
        writeln!(file, "{line}").map_err(|e| PersistenceError::Unavailable(e.to_string()))?;
        file.sync_data().map_err(|e| PersistenceError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<TokenRecord>, PersistenceError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PersistenceError::Unavailable(e.to_string())),
        };

        let mut records = Vec::new();
        for line in raw.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<TokenRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!("skipping unreadable store line: {e}"),
            }
        }
        Ok(records)
    }
}
