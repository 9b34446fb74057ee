//! tablegen auth - credentials for the GraphQL endpoint.
//!
//! Resolves the endpoint URL and request headers from environment
//! settings: a static bearer token, API key headers, or a Keycloak
//! client credentials token cached until shortly before it expires.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

use std::time::Duration;

mod credentials;
mod error;
mod keycloak;
mod token;

pub use credentials::{
    API_KEY_HEADER, API_SECRET_HEADER, AuthMethod, CredentialsConfig, CredentialsResolver,
    GraphqlCredentials, ORGANIZATION_HEADER,
};
pub use error::{AuthError, AuthResult};
pub use keycloak::{AccessToken, KeycloakClient, KeycloakConfig, TokenResponse};
pub use token::{Clock, ManualClock, SystemClock, TokenCache, TokenInfo};

/// How long before expiry a cached token stops being handed out.
pub const DEFAULT_RENEWAL_MARGIN: Duration = Duration::from_secs(5 * 60);
