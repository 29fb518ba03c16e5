//! Network exchange of application credentials for a fresh bearer token.
//!
//! One `POST` per call, no internal retry: retry policy belongs to the
//! refresh path and the scheduler, which keeps this a pure request/response
//! mapper.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{Error, IssuanceError};

/// Default authorization endpoint of the KIS open API.
pub const DEFAULT_TOKEN_URL: &str = "https://openapi.koreainvestment.com:9443/oauth2/tokenP";

/// Bound on a single issuance request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Token value plus expiry as returned by the authorization endpoint.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub value: String,
    /// UNIX seconds.
    pub expires_at: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    access_token_token_expired: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TokenIssuer {
    client: Client,
    token_url: String,
}

impl TokenIssuer {
    pub fn new(token_url: impl Into<String>, timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, token_url: token_url.into() })
    }

    /// Performs a single credentials-for-token exchange.
    pub async fn issue(&self, app_key: &str, app_secret: &str) -> Result<IssuedToken, Error> {
        if app_key.trim().is_empty() || app_secret.trim().is_empty() {
            return Err(Error::Configuration(
                "app_key and app_secret must be non-empty".to_owned(),
            ));
        }

        let body = json!({
            "grant_type": "client_credentials",
            "appkey": app_key,
            "appsecret": app_secret,
        });

        let response = self
            .client
            .post(&self.token_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| IssuanceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IssuanceError::Status { status: status.as_u16(), body }.into());
        }

        let text = response
            .text()
            .await
            .map_err(|e| IssuanceError::Transport(e.to_string()))?;
        let parsed: TokenResponse = serde_json::from_str(&text)
            .map_err(|_| IssuanceError::MalformedResponse("access_token"))?;

        let value = parsed
            .access_token
            .filter(|v| !v.is_empty())
            .ok_or(IssuanceError::MalformedResponse("access_token"))?;
        let expired_raw = parsed
            .access_token_token_expired
            .ok_or(IssuanceError::MalformedResponse("access_token_token_expired"))?;
        let expires_at = parse_expiry(&expired_raw)
            .ok_or(IssuanceError::MalformedResponse("access_token_token_expired"))?;

        debug!(expires_at, "token issued by upstream");
        Ok(IssuedToken { value, expires_at })
    }
}

/// KIS reports expiry as `YYYY-MM-DD HH:MM:SS`; RFC 3339 is accepted too.
fn parse_expiry(raw: &str) -> Option<i64> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc().timestamp());
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.timestamp())
}
