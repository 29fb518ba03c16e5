// The central refresh decision: a stored token with more than the renewal
// margin left is reused with zero issuer calls; anything closer to expiry
// (or nothing stored) triggers exactly one issuance.

#[cfg(test)]
mod test {
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::tempdir;

    use crate::error::{Error, IssuanceError, PersistenceError};
    use crate::manager::RENEWAL_MARGIN_SECS;
    use crate::store::file_store::CredentialStore;
    use crate::store::record::{TokenRecord, PROVIDER_KIS};
    use crate::tests::common::{build_manager, ManualClock};

    const NOW: i64 = 1_700_000_000;

    fn record(value: &str, expires_at: i64) -> TokenRecord {
        TokenRecord {
            provider: PROVIDER_KIS.to_owned(),
            value: value.to_owned(),
            issued_at: NOW - 600,
            expires_at,
        }
    }

    #[tokio::test]
    async fn reuses_stored_token_outside_renewal_margin() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("tokens.jsonl");

        let store = CredentialStore::open(&path).expect("open store");
        store.append(&record("tok_live", NOW + 2 * 3600)).await.expect("append");

        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/tokenP");
                then.status(200).json_body(json!({
                    "access_token": "tok_should_not_be_issued",
                    "access_token_token_expired": "2031-01-01 00:00:00",
                }));
            })
            .await;

        let manager = build_manager(path, &server.url("/oauth2/tokenP"), ManualClock::at(NOW));
        let token = manager.ensure_valid_token().await.expect("ensure");

        assert_eq!(token, "tok_live");
        assert_eq!(mock.hits_async().await, 0, "reuse path must make no network call");
        assert_eq!(manager.active_token().get().await.as_deref(), Some("tok_live"));
    }

    #[tokio::test]
    async fn reissues_when_inside_renewal_margin() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("tokens.jsonl");

        let store = CredentialStore::open(&path).expect("open store");
        store.append(&record("tok_old", NOW + 600)).await.expect("append");

        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/tokenP");
                then.status(200).json_body(json!({
                    "access_token": "tok_new",
                    "access_token_token_expired": "2031-01-01 00:00:00",
                }));
            })
            .await;

        let manager =
            build_manager(path.clone(), &server.url("/oauth2/tokenP"), ManualClock::at(NOW));
        let token = manager.ensure_valid_token().await.expect("ensure");

        assert_eq!(token, "tok_new");
        assert_eq!(mock.hits_async().await, 1);
        assert_eq!(manager.active_token().get().await.as_deref(), Some("tok_new"));

        // exactly one new record appended, with issued_at = now
        let store = CredentialStore::open(&path).expect("reopen store");
        let latest = store.latest(PROVIDER_KIS).await.expect("latest").expect("record");
        assert_eq!(latest.value, "tok_new");
        assert_eq!(latest.issued_at, NOW);
        assert!(latest.expires_at - latest.issued_at > RENEWAL_MARGIN_SECS);
    }

    #[tokio::test]
    async fn issues_when_store_empty() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("tokens.jsonl");

        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/tokenP");
                then.status(200).json_body(json!({
                    "access_token": "tok_abc123",
                    "access_token_token_expired": "2031-01-01 00:00:00",
                }));
            })
            .await;

        let manager =
            build_manager(path.clone(), &server.url("/oauth2/tokenP"), ManualClock::at(NOW));
        let token = manager.ensure_valid_token().await.expect("ensure");

        assert_eq!(token, "tok_abc123");
        assert_eq!(mock.hits_async().await, 1);

        let store = CredentialStore::open(&path).expect("reopen store");
        assert_eq!(
            store.latest(PROVIDER_KIS).await.expect("latest").map(|r| r.value),
            Some("tok_abc123".to_owned())
        );
    }

    #[tokio::test]
    async fn issuer_failure_leaves_active_token_unchanged() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("tokens.jsonl");

        let store = CredentialStore::open(&path).expect("open store");
        store.append(&record("tok_old", NOW + 600)).await.expect("append");

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/tokenP");
                then.status(500).body("upstream down");
            })
            .await;

        let manager = build_manager(path, &server.url("/oauth2/tokenP"), ManualClock::at(NOW));

        // the previous cycle had published the soon-to-expire token
        manager.active_token().publish("tok_old".to_owned()).await;

        match manager.ensure_valid_token().await {
            Err(Error::Issuance(IssuanceError::Status { status, .. })) => assert_eq!(status, 500),
            other => panic!("expected status error, got {other:?}"),
        }
        // stale-but-present is preferred over absent
        assert_eq!(manager.active_token().get().await.as_deref(), Some("tok_old"));
    }

    #[tokio::test]
    async fn startup_check_surfaces_failure_as_none() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("tokens.jsonl");

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/tokenP");
                then.status(500).body("upstream down");
            })
            .await;

        let manager = build_manager(path, &server.url("/oauth2/tokenP"), ManualClock::at(NOW));
        assert!(manager.startup_check().await.is_none());
        assert_eq!(manager.active_token().get().await, None);
    }

    #[tokio::test]
    async fn append_conflict_adopts_latest_record() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("tokens.jsonl");

        // the value the issuer is about to return is already stored, but
        // close enough to expiry that a reissue is triggered
        let store = CredentialStore::open(&path).expect("open store");
        store.append(&record("tok_dup", NOW + 600)).await.expect("append");

        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/tokenP");
                then.status(200).json_body(json!({
                    "access_token": "tok_dup",
                    "access_token_token_expired": "2031-01-01 00:00:00",
                }));
            })
            .await;

        let manager = build_manager(path, &server.url("/oauth2/tokenP"), ManualClock::at(NOW));
        let token = manager.ensure_valid_token().await.expect("conflict is recoverable");

        assert_eq!(token, "tok_dup");
        assert_eq!(mock.hits_async().await, 1);
        assert_eq!(manager.active_token().get().await.as_deref(), Some("tok_dup"));
    }

    #[tokio::test]
    async fn append_conflict_without_usable_record_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("tokens.jsonl");

        // the colliding value belongs to a different provider, so after the
        // conflict there is still nothing stored for ours
        let store = CredentialStore::open(&path).expect("open store");
        store
            .append(&TokenRecord {
                provider: "other".to_owned(),
                value: "tok_dup".to_owned(),
                issued_at: NOW - 600,
                expires_at: NOW + 600,
            })
            .await
            .expect("append");

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/tokenP");
                then.status(200).json_body(json!({
                    "access_token": "tok_dup",
                    "access_token_token_expired": "2031-01-01 00:00:00",
                }));
            })
            .await;

        let manager =
            build_manager(path.clone(), &server.url("/oauth2/tokenP"), ManualClock::at(NOW));

        match manager.ensure_valid_token().await {
            Err(Error::Persistence(PersistenceError::Conflict(provider))) => {
                assert_eq!(provider, PROVIDER_KIS)
            }
            other => panic!("expected conflict error, got {other:?}"),
        }
        // a token that was never persisted must not be published
        assert_eq!(manager.active_token().get().await, None);

        let store = CredentialStore::open(&path).expect("reopen store");
        assert_eq!(store.latest(PROVIDER_KIS).await.expect("latest"), None);
    }
}
