use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tablegen_auth::{
    AuthError, AuthMethod, CredentialsConfig, CredentialsResolver, KeycloakClient, KeycloakConfig,
    ManualClock,
};

const TOKEN_PATH: &str = "/realms/acme/protocol/openid-connect/token";

fn keycloak_config(server: &MockServer) -> KeycloakConfig {
    KeycloakConfig::new(server.uri(), "acme", "table-client", "s3cret")
}

fn credentials_config(server: &MockServer) -> CredentialsConfig {
    CredentialsConfig {
        graphql_url: Some("https://api.example.com/graphql".into()),
        keycloak: keycloak_config(server),
        ..CredentialsConfig::default()
    }
}

fn token_body(token: &str, expires_in: u64) -> serde_json::Value {
    json!({
        "access_token": token,
        "expires_in": expires_in,
        "token_type": "Bearer",
    })
}

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())
}

#[tokio::test]
async fn client_credentials_grant_is_form_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=table-client"))
        .and(body_string_contains("client_secret=s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("kc-1", 300)))
        .expect(1)
        .mount(&server)
        .await;

    let client = KeycloakClient::new(keycloak_config(&server)).unwrap();
    let token = client.fetch_token().await.unwrap();

    assert_eq!(token.token, "kc-1");
    assert_eq!(token.expires_in, Duration::from_secs(300));
}

#[tokio::test]
async fn token_is_cached_until_renewal_margin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("kc-1", 3600)))
        .expect(2)
        .mount(&server)
        .await;

    let resolver = CredentialsResolver::with_clock(credentials_config(&server), clock()).unwrap();

    let first = resolver.resolve().await;
    assert_eq!(first.method, AuthMethod::Keycloak);
    assert_eq!(first.headers["Authorization"], "Bearer kc-1");
    assert_eq!(first.url.as_deref(), Some("https://api.example.com/graphql"));

    resolver.token_cache().clock().advance(Duration::from_secs(30 * 60));
    let second = resolver.resolve().await;
    assert_eq!(second.headers["Authorization"], "Bearer kc-1");
    assert_eq!(resolver.token_info().expires_in_secs, Some(30 * 60));

    // Inside the five minute renewal margin.
    resolver.token_cache().clock().advance(Duration::from_secs(26 * 60));
    assert!(resolver.token_cache().is_expiring_soon());
    let third = resolver.resolve().await;
    assert_eq!(third.method, AuthMethod::Keycloak);
    assert!(!resolver.token_cache().is_expiring_soon());
}

#[tokio::test]
async fn unauthorized_maps_to_invalid_client_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "unauthorized"})))
        .mount(&server)
        .await;

    let client = KeycloakClient::new(keycloak_config(&server)).unwrap();
    let err = client.fetch_token().await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidClientCredentials));
}

async fn bad_request(code: &str) -> AuthError {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": code,
            "error_description": "rejected",
        })))
        .mount(&server)
        .await;

    let client = KeycloakClient::new(keycloak_config(&server)).unwrap();
    client.fetch_token().await.unwrap_err()
}

#[tokio::test]
async fn bad_request_errors_are_distinguished() {
    assert!(matches!(bad_request("invalid_client").await, AuthError::InvalidClient));
    assert!(matches!(
        bad_request("unauthorized_client").await,
        AuthError::UnauthorizedClient
    ));

    let other = bad_request("invalid_request").await;
    assert!(matches!(other, AuthError::TokenExchangeFailed(ref message) if message.contains("invalid_request: rejected")));
}

#[tokio::test]
async fn missing_access_token_is_an_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"expires_in": 300})))
        .mount(&server)
        .await;

    let client = KeycloakClient::new(keycloak_config(&server)).unwrap();
    let err = client.fetch_token().await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidTokenResponse(_)));
}

#[tokio::test]
async fn failed_exchange_proceeds_without_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut config = credentials_config(&server);
    config.organization_id = Some("org-7".into());
    let resolver = CredentialsResolver::with_clock(config, clock()).unwrap();

    let credentials = resolver.resolve().await;
    assert_eq!(credentials.method, AuthMethod::None);
    assert!(!credentials.headers.contains_key("Authorization"));
    assert_eq!(credentials.headers["X-Organization-Id"], "org-7");
    assert!(!resolver.token_info().has_token);
}

#[tokio::test]
async fn token_request_honors_configured_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("kc-slow", 300))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = keycloak_config(&server).with_timeout(Duration::from_millis(200));
    let client = KeycloakClient::new(config).unwrap();

    let err = client.fetch_token().await.unwrap_err();
    assert!(matches!(&err, AuthError::Http(source) if source.is_timeout()), "{err:?}");
}
