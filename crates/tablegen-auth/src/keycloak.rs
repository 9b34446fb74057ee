//! Keycloak client credentials grant.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::{AuthError, AuthResult, Clock, TokenCache};

const CLIENT_CREDENTIALS_GRANT: &str = "client_credentials";

/// Keycloak realm and client settings.
#[derive(Debug, Clone)]
pub struct KeycloakConfig {
    /// Base URL of the Keycloak server.
    pub url: String,
    /// Realm holding the client.
    pub realm: String,
    /// Client id.
    pub client_id: String,
    /// Client secret.
    pub client_secret: String,
    /// Timeout for the token request.
    pub timeout: Duration,
}

impl Default for KeycloakConfig {
    fn default() -> Self {
        Self::new("", "", "", "")
    }
}

impl KeycloakConfig {
    /// Create a configuration with the default 30 second timeout.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        realm: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            realm: realm.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the token request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a client id and secret are present.
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    /// Names of the settings that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("url", &self.url),
            ("realm", &self.realm),
            ("clientId", &self.client_id),
            ("clientSecret", &self.client_secret),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// Check that every setting is present.
    pub fn validate(&self) -> AuthResult<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            return Ok(());
        }
        let missing = missing.join(", ");
        warn!(missing = %missing, "Keycloak configuration incomplete");
        Err(AuthError::InvalidConfig(format!(
            "missing Keycloak settings: {missing}"
        )))
    }

    /// `<url>/realms/<realm>/protocol/openid-connect/token`.
    pub fn token_url(&self) -> AuthResult<Url> {
        let base = self.url.trim_end_matches('/');
        Ok(Url::parse(&format!(
            "{base}/realms/{}/protocol/openid-connect/token",
            self.realm
        ))?)
    }
}

/// Successful token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// The access token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: u64,
    /// Token type (usually "Bearer").
    #[serde(default)]
    pub token_type: Option<String>,
    /// Granted scopes (space-separated).
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// An access token and its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Bearer token value.
    pub token: String,
    /// Lifetime reported by the server.
    pub expires_in: Duration,
}

/// Fetches access tokens with the client credentials grant.
#[derive(Debug, Clone)]
pub struct KeycloakClient {
    config: KeycloakConfig,
    http_client: Client,
}

impl KeycloakClient {
    /// Create a client with its own HTTP connection pool.
    pub fn new(config: KeycloakConfig) -> AuthResult<Self> {
        let http_client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    /// Cached token from `cache`, or a fresh one stored into it.
    pub async fn access_token<C: Clock>(&self, cache: &TokenCache<C>) -> AuthResult<String> {
        if let Some(token) = cache.get() {
            debug!("Reusing cached Keycloak token");
            return Ok(token);
        }
        let fresh = self.fetch_token().await?;
        cache.store(fresh.token.clone(), fresh.expires_in);
        Ok(fresh.token)
    }

    /// Request a new token from the realm's token endpoint.
    pub async fn fetch_token(&self) -> AuthResult<AccessToken> {
        self.config.validate()?;
        let token_url = self.config.token_url()?;
        info!(realm = %self.config.realm, url = %self.config.url, "Requesting Keycloak token");

        let params = [
            ("grant_type", CLIENT_CREDENTIALS_GRANT),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        let response = self
            .http_client
            .post(token_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Keycloak token request rejected");
            return Err(map_token_error(status, &body));
        }

        let token_response: TokenResponse = response.json().await?;
        let token = token_response
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                AuthError::InvalidTokenResponse("no access_token in Keycloak response".into())
            })?;

        info!(expires_in = token_response.expires_in, "Keycloak token acquired");
        Ok(AccessToken {
            token,
            expires_in: Duration::from_secs(token_response.expires_in),
        })
    }
}

fn map_token_error(status: StatusCode, body: &str) -> AuthError {
    if status == StatusCode::UNAUTHORIZED {
        return AuthError::InvalidClientCredentials;
    }
    let error: TokenErrorResponse = serde_json::from_str(body).unwrap_or_default();
    if status == StatusCode::BAD_REQUEST {
        match error.error.as_str() {
            "invalid_client" => return AuthError::InvalidClient,
            "unauthorized_client" => return AuthError::UnauthorizedClient,
            _ => {}
        }
    }
    if error.error.is_empty() {
        AuthError::TokenExchangeFailed(format!("HTTP {status}"))
    } else {
        AuthError::TokenExchangeFailed(format!(
            "HTTP {status}: {}: {}",
            error.error,
            error.error_description.unwrap_or_default()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_url_joins_realm_path() {
        let config = KeycloakConfig::new("https://sso.example.com/", "acme", "id", "secret");
        assert_eq!(
            config.token_url().unwrap().as_str(),
            "https://sso.example.com/realms/acme/protocol/openid-connect/token"
        );
    }

    #[test]
    fn validate_lists_missing_settings() {
        let config = KeycloakConfig::new("", "acme", "id", "");
        assert_eq!(config.missing_fields(), ["url", "clientSecret"]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("url, clientSecret"));
        assert!(!config.is_configured());
    }

    #[test]
    fn token_errors_map_to_variants() {
        assert!(matches!(
            map_token_error(StatusCode::UNAUTHORIZED, ""),
            AuthError::InvalidClientCredentials
        ));
        assert!(matches!(
            map_token_error(StatusCode::BAD_REQUEST, r#"{"error":"invalid_client"}"#),
            AuthError::InvalidClient
        ));
        assert!(matches!(
            map_token_error(StatusCode::BAD_REQUEST, r#"{"error":"unauthorized_client"}"#),
            AuthError::UnauthorizedClient
        ));

        let other = map_token_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_scope","error_description":"bad scope"}"#,
        );
        assert_eq!(
            other.to_string(),
            "Token exchange failed: HTTP 400 Bad Request: invalid_scope: bad scope"
        );
        assert!(matches!(
            map_token_error(StatusCode::BAD_GATEWAY, "<html>"),
            AuthError::TokenExchangeFailed(_)
        ));
    }
}
