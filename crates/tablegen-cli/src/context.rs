//! Connection setup shared by every command.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tablegen_auth::{CredentialsConfig, CredentialsResolver};
use tablegen_graphql::{GraphqlClient, QuerySynthesizer, SchemaResolver};
use tracing::info;

/// Options accepted by every command.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// GraphQL endpoint. Falls back to `NEXT_PUBLIC_GRAPHQL_API`, then
    /// `GRAPHQL_API_URL`.
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Request timeout in seconds, for both the GraphQL and the token endpoint.
    #[arg(long, global = true, env = "TABLEGEN_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    pub json_logs: bool,
}

impl GlobalArgs {
    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Layer the command line over credentials read from the environment.
    fn credentials_config(&self, mut config: CredentialsConfig) -> CredentialsConfig {
        if let Some(url) = &self.url {
            config.graphql_url = Some(url.clone());
        }
        config.keycloak = config.keycloak.with_timeout(self.timeout());
        config
    }
}

/// Resolve credentials and build the synthesizer for the configured endpoint.
pub async fn connect(args: &GlobalArgs) -> Result<QuerySynthesizer> {
    let config = args.credentials_config(CredentialsConfig::from_env());
    let resolver =
        CredentialsResolver::new(config).context("failed to set up credential resolution")?;
    let credentials = resolver.resolve().await;

    let endpoint = credentials.url.clone().context(
        "no GraphQL endpoint configured (use --url or set NEXT_PUBLIC_GRAPHQL_API or GRAPHQL_API_URL)",
    )?;
    info!(endpoint = %endpoint, auth = %credentials.method, "Connecting to GraphQL API");

    let client = GraphqlClient::builder(endpoint)
        .with_headers(credentials.header_pairs())
        .context("invalid request header")?
        .with_timeout(args.timeout())
        .build()
        .context("failed to build GraphQL client")?;

    Ok(QuerySynthesizer::new(SchemaResolver::new(Arc::new(client))))
}
