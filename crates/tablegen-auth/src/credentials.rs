//! Endpoint and header resolution from the environment.
//!
//! Authentication methods are tried in a fixed order:
//!
//! 1. `API_TOKEN` as a bearer token.
//! 2. `API_KEY`, with `API_SECRET` when set.
//! 3. Keycloak client credentials, when a client id and secret are set.
//!
//! A failed Keycloak exchange is logged and the request proceeds without
//! authentication.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::{AuthResult, Clock, KeycloakClient, KeycloakConfig, SystemClock, TokenCache, TokenInfo};

/// Header carrying the organization scope.
pub const ORGANIZATION_HEADER: &str = "X-Organization-Id";
/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-API-Key";
/// Header carrying the API secret.
pub const API_SECRET_HEADER: &str = "X-API-Secret";

/// Raw settings, as read from the environment.
#[derive(Debug, Clone, Default)]
pub struct CredentialsConfig {
    /// GraphQL endpoint.
    pub graphql_url: Option<String>,
    /// Organization id sent in [`ORGANIZATION_HEADER`].
    pub organization_id: Option<String>,
    /// Static bearer token.
    pub api_token: Option<String>,
    /// API key.
    pub api_key: Option<String>,
    /// API secret, only used alongside `api_key`.
    pub api_secret: Option<String>,
    /// Keycloak client credentials.
    pub keycloak: KeycloakConfig,
}

impl CredentialsConfig {
    /// Read from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let first = |names: &[&str]| names.iter().find_map(|name| var(name));

        Self {
            graphql_url: first(&["NEXT_PUBLIC_GRAPHQL_API", "GRAPHQL_API_URL"]),
            organization_id: first(&["ORGANIZATION_ID_PLACEHOLDER", "ORGANIZATION_ID"]),
            api_token: var("API_TOKEN"),
            api_key: var("API_KEY"),
            api_secret: var("API_SECRET"),
            keycloak: KeycloakConfig::new(
                var("KEYCLOAK_URL").unwrap_or_default(),
                var("KEYCLOAK_REALM").unwrap_or_default(),
                var("KEYCLOAK_CLIENT_ID").unwrap_or_default(),
                var("KEYCLOAK_CLIENT_SECRET").unwrap_or_default(),
            ),
        }
    }
}

/// How the resolved headers authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// `Authorization: Bearer` from a static token.
    BearerToken,
    /// API key headers.
    ApiKey,
    /// `Authorization: Bearer` from Keycloak.
    Keycloak,
    /// No authentication.
    None,
}

impl AuthMethod {
    /// Stable name for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BearerToken => "bearer_token",
            Self::ApiKey => "api_key",
            Self::Keycloak => "keycloak",
            Self::None => "none",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Endpoint plus the headers to send with every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphqlCredentials {
    /// GraphQL endpoint, if configured.
    pub url: Option<String>,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
    /// Authentication in effect.
    pub method: AuthMethod,
}

impl GraphqlCredentials {
    /// Headers as borrowed pairs.
    pub fn header_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// Resolves [`GraphqlCredentials`], caching Keycloak tokens between calls.
#[derive(Debug)]
pub struct CredentialsResolver<C = SystemClock> {
    config: CredentialsConfig,
    keycloak: Option<KeycloakClient>,
    token_cache: TokenCache<C>,
}

impl CredentialsResolver<SystemClock> {
    /// Resolver on the wall clock.
    pub fn new(config: CredentialsConfig) -> AuthResult<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> CredentialsResolver<C> {
    /// Resolver reading token expiry against `clock`.
    pub fn with_clock(config: CredentialsConfig, clock: C) -> AuthResult<Self> {
        let keycloak = if config.keycloak.is_configured() {
            Some(KeycloakClient::new(config.keycloak.clone())?)
        } else {
            None
        };
        Ok(Self {
            config,
            keycloak,
            token_cache: TokenCache::new(clock),
        })
    }

    /// The Keycloak token cache.
    pub const fn token_cache(&self) -> &TokenCache<C> {
        &self.token_cache
    }

    /// Keycloak token state.
    pub fn token_info(&self) -> TokenInfo {
        self.token_cache.info()
    }

    /// Build the endpoint and headers. Never fails.
    pub async fn resolve(&self) -> GraphqlCredentials {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        if let Some(organization_id) = &self.config.organization_id {
            headers.insert(ORGANIZATION_HEADER.to_string(), organization_id.clone());
        }

        let method = self.authenticate(&mut headers).await;
        debug!(method = %method, headers = headers.len(), "Resolved GraphQL credentials");

        GraphqlCredentials {
            url: self.config.graphql_url.clone(),
            headers,
            method,
        }
    }

    async fn authenticate(&self, headers: &mut BTreeMap<String, String>) -> AuthMethod {
        if let Some(token) = &self.config.api_token {
            headers.insert("Authorization".to_string(), format!("Bearer {token}"));
            return AuthMethod::BearerToken;
        }

        if let Some(key) = &self.config.api_key {
            headers.insert(API_KEY_HEADER.to_string(), key.clone());
            if let Some(secret) = &self.config.api_secret {
                headers.insert(API_SECRET_HEADER.to_string(), secret.clone());
            }
            return AuthMethod::ApiKey;
        }

        let Some(keycloak) = &self.keycloak else {
            return AuthMethod::None;
        };
        match keycloak.access_token(&self.token_cache).await {
            Ok(token) => {
                headers.insert("Authorization".to_string(), format!("Bearer {token}"));
                AuthMethod::Keycloak
            }
            Err(error) => {
                warn!(error = %error, "Failed to get Keycloak token, proceeding without auth");
                AuthMethod::None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> CredentialsConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect();
        CredentialsConfig::from_lookup(|name| vars.get(name).cloned())
    }

    async fn resolve(vars: &[(&str, &str)]) -> GraphqlCredentials {
        CredentialsResolver::new(config(vars)).unwrap().resolve().await
    }

    #[test]
    fn lookup_prefers_public_url_and_placeholder_org() {
        let config = config(&[
            ("NEXT_PUBLIC_GRAPHQL_API", "https://public/graphql"),
            ("GRAPHQL_API_URL", "https://private/graphql"),
            ("ORGANIZATION_ID_PLACEHOLDER", "org-a"),
            ("ORGANIZATION_ID", "org-b"),
        ]);
        assert_eq!(config.graphql_url.as_deref(), Some("https://public/graphql"));
        assert_eq!(config.organization_id.as_deref(), Some("org-a"));
    }

    #[test]
    fn empty_values_are_unset() {
        let config = config(&[
            ("NEXT_PUBLIC_GRAPHQL_API", ""),
            ("GRAPHQL_API_URL", "https://private/graphql"),
            ("API_TOKEN", ""),
        ]);
        assert_eq!(config.graphql_url.as_deref(), Some("https://private/graphql"));
        assert_eq!(config.api_token, None);
    }

    #[tokio::test]
    async fn bearer_token_wins_over_api_key() {
        let credentials = resolve(&[
            ("API_TOKEN", "tok"),
            ("API_KEY", "key"),
            ("KEYCLOAK_CLIENT_ID", "id"),
            ("KEYCLOAK_CLIENT_SECRET", "secret"),
        ])
        .await;

        assert_eq!(credentials.method, AuthMethod::BearerToken);
        assert_eq!(credentials.headers["Authorization"], "Bearer tok");
        assert!(!credentials.headers.contains_key(API_KEY_HEADER));
    }

    #[tokio::test]
    async fn api_key_with_secret() {
        let credentials = resolve(&[
            ("API_KEY", "key"),
            ("API_SECRET", "shh"),
            ("ORGANIZATION_ID", "org-1"),
        ])
        .await;

        assert_eq!(credentials.method, AuthMethod::ApiKey);
        assert_eq!(credentials.headers[API_KEY_HEADER], "key");
        assert_eq!(credentials.headers[API_SECRET_HEADER], "shh");
        assert_eq!(credentials.headers[ORGANIZATION_HEADER], "org-1");
        assert!(!credentials.headers.contains_key("Authorization"));
    }

    #[tokio::test]
    async fn nothing_configured_sends_content_type_only() {
        let credentials = resolve(&[]).await;

        assert_eq!(credentials.method, AuthMethod::None);
        assert_eq!(credentials.url, None);
        assert_eq!(credentials.headers.len(), 1);
        assert_eq!(credentials.headers["Content-Type"], "application/json");
    }

    #[tokio::test]
    async fn incomplete_keycloak_config_degrades_to_no_auth() {
        let credentials = resolve(&[
            ("KEYCLOAK_CLIENT_ID", "id"),
            ("KEYCLOAK_CLIENT_SECRET", "secret"),
        ])
        .await;

        assert_eq!(credentials.method, AuthMethod::None);
        assert!(!credentials.headers.contains_key("Authorization"));
    }
}
