// tests/common/mod.rs
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::active_token::ActiveToken;
use crate::config::credentials::Credentials;
use crate::helpers::time::Clock;
use crate::issuer::TokenIssuer;
use crate::manager::TokenManager;
use crate::store::file_store::CredentialStore;

/// Clock that tests move by hand instead of waiting in real time.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn at(now: i64) -> Arc<Self> {
        Arc::new(Self { now: AtomicI64::new(now) })
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

pub fn test_credentials() -> Credentials {
    Credentials {
        app_key: "test-key".to_owned(),
        app_secret: "test-secret".to_owned(),
        account: "12345678-01".to_owned(),
    }
}

pub fn build_manager(store_path: PathBuf, token_url: &str, clock: Arc<dyn Clock>) -> TokenManager {
    let store = CredentialStore::open(store_path).expect("open store");
    let issuer = TokenIssuer::new(token_url, Duration::from_secs(5)).expect("build issuer");
    TokenManager::new(store, issuer, ActiveToken::new(), test_credentials(), clock)
}
