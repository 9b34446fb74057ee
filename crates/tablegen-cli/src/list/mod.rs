//! `tablegen list` command implementation.

use anyhow::{Context, Result};
use tablegen_graphql::QuerySynthesizer;

/// Print the numbered list of `list*` queries.
pub async fn run(synthesizer: &QuerySynthesizer) -> Result<()> {
    let queries = synthesizer
        .available_queries()
        .await
        .context("failed to list queries")?;
    print!("{}", render(&queries));
    Ok(())
}

fn render(queries: &[String]) -> String {
    if queries.is_empty() {
        return "No \"list*\" queries found in the API.\n".to_string();
    }

    let mut out = String::from("Available queries:\n\n");
    for (index, query) in queries.iter().enumerate() {
        out.push_str(&format!("  {}. {query}\n", index + 1));
    }
    out.push_str(&format!("\nTotal: {} queries found\n", queries.len()));
    out.push_str("\nUse `tablegen generate <QUERY>` to generate a query.\n");
    out
}
