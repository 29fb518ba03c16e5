use serde::{Deserialize, Serialize};

/// Credential domain identifier for the KIS open API. Constant for this
/// service; the store itself is keyed by provider and can hold others.
pub const PROVIDER_KIS: &str = "kis";

/// One issued token. Records are append-only: never updated or deleted,
/// retained indefinitely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub provider: String,
    /// Opaque bearer-token string, unique across all records.
    pub value: String,
    /// UNIX seconds.
    pub issued_at: i64,
    /// UNIX seconds. Invariant: strictly after `issued_at`.
    pub expires_at: i64,
}

impl TokenRecord {
    /// Seconds of lifetime left at `now`. Negative once expired.
    pub fn remaining_secs(&self, now: i64) -> i64 {
        self.expires_at - now
    }
}
