use std::sync::Arc;

use tokio::sync::RwLock;

/// Process-wide holder of the most recently published bearer token.
///
/// Written only by the refresh path, read by any number of concurrent
/// consumers. A publish replaces the whole value under the write lock, so
/// readers observe either the old or the new token, never a partial one.
/// `None` means no token has been published yet.
#[derive(Debug, Clone, Default)]
pub struct ActiveToken {
    inner: Arc<RwLock<Option<String>>>,
}

impl ActiveToken {
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(None)) }
    }

    pub async fn publish(&self, value: String) {
        let mut guard = self.inner.write().await;
        *guard = Some(value);
    }

    pub async fn get(&self) -> Option<String> {
        self.inner.read().await.clone()
    }

    /// Short non-reversible prefix for diagnostic display; never the full
    /// secret.
    pub async fn masked(&self) -> Option<String> {
        self.inner.read().await.as_deref().map(mask_token)
    }
}

/// First four characters plus an ellipsis.
pub fn mask_token(value: &str) -> String {
    let prefix: String = value.chars().take(4).collect();
    format!("{prefix}...")
}
