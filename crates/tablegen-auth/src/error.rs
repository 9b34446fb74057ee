//! Credential resolution errors.

/// Errors raised while acquiring credentials.
///
/// The resolver downgrades these to a warning and proceeds without
/// authentication; callers using [`crate::KeycloakClient`] directly see them.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Invalid or incomplete configuration.
    #[error("Invalid auth configuration: {0}")]
    InvalidConfig(String),

    /// The token endpoint rejected the client id/secret pair (HTTP 401).
    #[error("Invalid Keycloak client credentials (client_id/client_secret)")]
    InvalidClientCredentials,

    /// The token endpoint does not know the client (`invalid_client`).
    #[error("Invalid Keycloak client id")]
    InvalidClient,

    /// The client may not use the client-credentials grant (`unauthorized_client`).
    #[error("Client is not authorized for the client credentials grant")]
    UnauthorizedClient,

    /// Any other token endpoint failure.
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// The token endpoint answered without an access token.
    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing failed.
    #[error("URL parsing failed: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type for credential operations.
pub type AuthResult<T> = Result<T, AuthError>;
