//! `tablegen test` command implementation.

use anyhow::Result;
use tablegen_graphql::QuerySynthesizer;

const TROUBLESHOOTING: &str = "Check that:
  1. The environment variables are set
  2. The API URL is correct
  3. The credentials are valid
  4. The API is online and reachable";

/// Introspect the endpoint and report how many list queries it exposes.
pub async fn run(synthesizer: &QuerySynthesizer) -> Result<()> {
    match synthesizer.available_queries().await {
        Ok(queries) => {
            println!("Connection established.");
            println!("Found {} \"list*\" queries.", queries.len());
            Ok(())
        }
        Err(err) => {
            eprintln!("{TROUBLESHOOTING}");
            Err(anyhow::Error::new(err).context("connection test failed"))
        }
    }
}
