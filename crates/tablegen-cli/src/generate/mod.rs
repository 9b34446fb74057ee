//! `tablegen generate` command implementation.
//!
//! # Usage
//!
//! ```text
//! # Full table query
//! tablegen generate listInvoices
//!
//! # Selected top-level fields only
//! tablegen generate listInvoices --fields "id,status,number"
//!
//! # No pagination, filters or ordering
//! tablegen generate listInvoices --simple
//! ```

use anyhow::{Context, Result};
use clap::Args;
use tablegen_graphql::{QuerySynthesizer, TableQueryOptions};

/// Arguments for the `tablegen generate` command.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Root query to generate a table query for.
    pub query: String,

    /// Generate a query without pagination, filters or ordering.
    #[arg(long, short = 's', default_value_t = false)]
    pub simple: bool,

    /// Maximum depth of nested fields.
    #[arg(long, short = 'd', default_value_t = 2)]
    pub depth: usize,

    /// Comma-separated top-level fields to include.
    #[arg(long, short = 'f', value_delimiter = ',')]
    pub fields: Option<Vec<String>>,

    /// Omit pagination variables and metadata.
    #[arg(long, default_value_t = false)]
    pub no_pagination: bool,

    /// Omit the filters variable.
    #[arg(long, default_value_t = false)]
    pub no_filters: bool,

    /// Omit the ordering variables.
    #[arg(long, default_value_t = false)]
    pub no_ordering: bool,
}

impl GenerateArgs {
    fn options(&self) -> TableQueryOptions {
        TableQueryOptions::default()
            .with_pagination(!self.no_pagination)
            .with_filters(!self.no_filters)
            .with_ordering(!self.no_ordering)
            .with_max_depth(self.depth)
    }

    fn selected_fields(&self) -> Option<Vec<String>> {
        let fields: Vec<String> = self
            .fields
            .iter()
            .flatten()
            .map(|field| field.trim())
            .filter(|field| !field.is_empty())
            .map(str::to_string)
            .collect();
        (!fields.is_empty()).then_some(fields)
    }
}

/// Run the generate command.
pub async fn run(synthesizer: &QuerySynthesizer, args: &GenerateArgs) -> Result<()> {
    let (heading, result) = if args.simple {
        (
            "Simple query:".to_string(),
            synthesizer.generate_simple_query(&args.query, args.depth).await,
        )
    } else if let Some(fields) = args.selected_fields() {
        (
            format!("Custom query (fields: {}):", fields.join(", ")),
            synthesizer
                .generate_custom_query(&args.query, fields, args.options())
                .await,
        )
    } else {
        (
            "Table query:".to_string(),
            synthesizer
                .generate_table_query(&args.query, &args.options())
                .await,
        )
    };

    let query = match result {
        Ok(query) => query,
        Err(err) => {
            if err.is_query_not_found() {
                eprintln!("Hint: run `tablegen list` to see the available queries.");
            }
            return Err(err).with_context(|| format!("failed to generate query for '{}'", args.query));
        }
    };

    println!("{heading}\n");
    println!("```graphql\n{query}\n```");
    Ok(())
}
