//! Token broker flows against a mocked identity provider

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use graph_client::{
    LoginPrompt, MemoryTokenCache, TokenBroker, TokenCache, TokenSet, TOKEN_CACHE_KEY,
};
use todo_core::CardConfig;

fn test_config() -> CardConfig {
    CardConfig {
        aad_client_id: "client-1".to_string(),
        aad_tenant_id: "tenant-1".to_string(),
        aad_redirect_url: "https://card.example.edu/redirect".to_string(),
        ..CardConfig::default()
    }
}

fn broker_with(
    server: &MockServer,
    cache: Arc<MemoryTokenCache>,
) -> TokenBroker {
    TokenBroker::new(&test_config(), cache, LoginPrompt::Headless).with_authority(server.uri())
}

async fn seed_cache(cache: &MemoryTokenCache, set: &TokenSet) {
    cache
        .store(TOKEN_CACHE_KEY, Some(serde_json::to_string(set).unwrap()))
        .await;
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

#[tokio::test]
async fn silent_acquisition_uses_valid_cached_token() {
    let server = MockServer::start().await;
    let cache = Arc::new(MemoryTokenCache::new());
    seed_cache(
        &cache,
        &TokenSet {
            access_token: "cached".to_string(),
            refresh_token: None,
            expires_at: unix_now() + 3600,
        },
    )
    .await;

    let broker = broker_with(&server, cache);
    assert!(broker.acquire_silently(true).await.unwrap());
    assert_eq!(broker.cached_access_token().await.as_deref(), Some("cached"));
    // No token endpoint call was needed.
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn silent_acquisition_redeems_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/v2.0/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "fresh-token",
            "refresh_token": "rotated-refresh",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryTokenCache::new());
    seed_cache(
        &cache,
        &TokenSet {
            access_token: "stale".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            expires_at: 0,
        },
    )
    .await;

    let broker = broker_with(&server, cache.clone());
    assert!(broker.acquire_silently(false).await.unwrap());

    let stored: TokenSet =
        serde_json::from_str(&cache.get(TOKEN_CACHE_KEY).await.unwrap()).unwrap();
    assert_eq!(stored.access_token, "fresh-token");
    assert_eq!(stored.refresh_token.as_deref(), Some("rotated-refresh"));
}

#[tokio::test]
async fn silent_acquisition_without_cached_session_fails_quietly() {
    let server = MockServer::start().await;
    let cache = Arc::new(MemoryTokenCache::new());
    let broker = broker_with(&server, cache);

    assert!(!broker.acquire_silently(true).await.unwrap());
}

#[tokio::test]
async fn rejected_refresh_clears_the_cached_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/v2.0/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({"error": "invalid_grant"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryTokenCache::new());
    seed_cache(
        &cache,
        &TokenSet {
            access_token: "stale".to_string(),
            refresh_token: Some("dead-refresh".to_string()),
            expires_at: 0,
        },
    )
    .await;

    let broker = broker_with(&server, cache.clone());
    assert!(!broker.acquire_silently(false).await.unwrap());
    assert_eq!(cache.get(TOKEN_CACHE_KEY).await, None);
}

#[tokio::test]
async fn provider_outage_surfaces_as_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryTokenCache::new());
    seed_cache(
        &cache,
        &TokenSet {
            access_token: "stale".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            expires_at: 0,
        },
    )
    .await;

    let broker = broker_with(&server, cache);
    assert!(broker.acquire_silently(false).await.is_err());
}

#[tokio::test]
async fn interactive_login_exchanges_redirect_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/v2.0/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code_verifier="))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "interactive-token",
            "refresh_token": "interactive-refresh",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryTokenCache::new());
    let broker = Arc::new(broker_with(&server, cache));

    let login = {
        let broker = broker.clone();
        tokio::spawn(async move { broker.interactive_login().await })
    };

    // Wait for the authorize URL to be issued, then answer the redirect
    // the way the embedding would.
    let authorize_url = loop {
        if let Some(url) = broker.last_authorize_url() {
            break url;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    };
    let parsed = url::Url::parse(&authorize_url).unwrap();
    let state = parsed
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    assert!(broker.deliver_redirect(&format!("code=auth-code-1&state={state}")));

    assert!(login.await.unwrap().unwrap());
    assert_eq!(
        broker.cached_access_token().await.as_deref(),
        Some("interactive-token")
    );
}

#[tokio::test]
async fn cancelled_login_resolves_to_failure_not_fault() {
    let server = MockServer::start().await;
    let cache = Arc::new(MemoryTokenCache::new());
    let broker = Arc::new(broker_with(&server, cache));

    let login = {
        let broker = broker.clone();
        tokio::spawn(async move { broker.interactive_login().await })
    };

    loop {
        if broker.last_authorize_url().is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    broker.cancel_login();

    assert!(!login.await.unwrap().unwrap());
}

#[tokio::test]
async fn consent_denied_redirect_resolves_to_failure() {
    let server = MockServer::start().await;
    let cache = Arc::new(MemoryTokenCache::new());
    let broker = Arc::new(broker_with(&server, cache));

    let login = {
        let broker = broker.clone();
        tokio::spawn(async move { broker.interactive_login().await })
    };

    loop {
        if broker.last_authorize_url().is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    broker.deliver_redirect("error=access_denied&error_description=user+bailed");

    assert!(!login.await.unwrap().unwrap());
}

#[tokio::test]
async fn logout_clears_cache_even_when_revocation_fails() {
    let server = MockServer::start().await;
    // No logout mock mounted: the provider answers 404 and the broker
    // must not care.
    let cache = Arc::new(MemoryTokenCache::new());
    seed_cache(
        &cache,
        &TokenSet {
            access_token: "cached".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            expires_at: unix_now() + 3600,
        },
    )
    .await;

    let broker = broker_with(&server, cache.clone());
    broker.logout().await;

    assert_eq!(cache.get(TOKEN_CACHE_KEY).await, None);
}
