//! The refresh decision: reuse the stored token while it has enough
//! lifetime left, otherwise exchange credentials for a fresh one.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::cache::active_token::ActiveToken;
use crate::config::credentials::Credentials;
use crate::error::{Error, PersistenceError};
use crate::helpers::time::Clock;
use crate::issuer::TokenIssuer;
use crate::observability::metrics::get_metrics;
use crate::store::file_store::CredentialStore;
use crate::store::record::{TokenRecord, PROVIDER_KIS};

/// Lead time before expiry at which a stored token is no longer reused.
/// Absorbs clock skew and issuance latency so a consumer never holds a
/// token that expires mid-request.
pub const RENEWAL_MARGIN_SECS: i64 = 3600;

pub struct TokenManager {
    store: CredentialStore,
    issuer: TokenIssuer,
    active: ActiveToken,
    credentials: Credentials,
    clock: Arc<dyn Clock>,
    provider: String,
}

impl TokenManager {
    pub fn new(
        store: CredentialStore,
        issuer: TokenIssuer,
        active: ActiveToken,
        credentials: Credentials,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, issuer, active, credentials, clock, provider: PROVIDER_KIS.to_owned() }
    }

    /// Handle to the shared token holder that downstream API clients read.
    pub fn active_token(&self) -> ActiveToken {
        self.active.clone()
    }

    /// Returns a currently-valid bearer token.
    ///
    /// Reuse path (the common case): the latest stored record still has more
    /// than the renewal margin left, so it is published and returned with
    /// zero issuer calls. Otherwise exactly one issuance is attempted; on
    /// success the new record is appended and published. On any failure the
    /// previously published token is left in place — stale-but-present is
    /// preferred over absent.
    pub async fn ensure_valid_token(&self) -> Result<String, Error> {
        let metrics = get_metrics().await;
        let now = self.clock.now_unix();

        if let Some(record) = self.store.latest(&self.provider).await? {
            if record.remaining_secs(now) > RENEWAL_MARGIN_SECS {
                metrics.token_reuse.inc();
                self.active.publish(record.value.clone()).await;
                return Ok(record.value);
            }
            info!(
                provider = %self.provider,
                expires_at = record.expires_at,
                "stored token inside renewal margin, reissuing"
            );
        }

        metrics.issuance_requests.inc();
        let issued = match self
            .issuer
            .issue(&self.credentials.app_key, &self.credentials.app_secret)
            .await
        {
            Ok(issued) => issued,
            Err(e) => {
                metrics.issuance_failures.inc();
                return Err(e);
            }
        };

        let record = TokenRecord {
            provider: self.provider.clone(),
            value: issued.value,
            issued_at: now,
            expires_at: issued.expires_at,
        };

        if let Err(e) = self.store.append(&record).await {
            match e {
                PersistenceError::Conflict(_) => {
                    // Another caller won the race and stored a usable token.
                    warn!(provider = %self.provider, "duplicate token rejected by store, adopting latest record");
                    return match self.store.latest(&self.provider).await? {
                        Some(winner) => {
                            self.active.publish(winner.value.clone()).await;
                            Ok(winner.value)
                        }
                        // The colliding value belongs to another provider, so
                        // nothing usable was stored for ours. The new token was
                        // never persisted and must not be published.
                        None => Err(PersistenceError::Conflict(self.provider.clone()).into()),
                    };
                }
                other => return Err(other.into()),
            }
        }

        metrics.token_expiry_unix.set(record.expires_at);
        self.active.publish(record.value.clone()).await;
        info!(
            provider = %self.provider,
            expires_at = record.expires_at,
            "new token issued and stored"
        );
        Ok(record.value)
    }

    /// One-shot startup check. Failure is logged and surfaced as `None` so
    /// the application can decide whether to abort startup; it never panics
    /// or propagates.
    pub async fn startup_check(&self) -> Option<String> {
        match self.ensure_valid_token().await {
            Ok(token) => Some(token),
            Err(e) => {
                error!("startup token check failed: {e}");
                None
            }
        }
    }
}
