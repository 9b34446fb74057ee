//! tablegen command-line entrypoint.
//!
//! Generates table queries for the `list*` root queries of a GraphQL API:
//! - `tablegen list` - Discover the available list queries
//! - `tablegen analyze` - Show the resolved field types of a query
//! - `tablegen generate` - Print a paginated, filterable table query
//! - `tablegen test` - Check that the endpoint can be introspected

#![forbid(unsafe_code)]

mod analyze;
mod check;
mod context;
mod generate;
mod list;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use context::GlobalArgs;

/// GraphQL table query generator.
#[derive(Parser)]
#[command(name = "tablegen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the `list*` queries exposed by the API.
    List,

    /// Show the field types of a query's rows.
    ///
    /// Example: tablegen analyze listInvoices --depth 2 --format csv
    Analyze(analyze::AnalyzeArgs),

    /// Generate a table query document.
    ///
    /// Example: tablegen generate listInvoices --fields "id,status,number"
    Generate(generate::GenerateArgs),

    /// Test the connection to the GraphQL API.
    Test,
}

fn init_logging(json: bool) {
    // Logs go to stderr so stdout only carries command output.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.json_logs);

    let synthesizer = context::connect(&cli.global).await?;

    match cli.command {
        Commands::List => list::run(&synthesizer).await,
        Commands::Analyze(args) => analyze::run(&synthesizer, &args).await,
        Commands::Generate(args) => generate::run(&synthesizer, &args).await,
        Commands::Test => check::run(&synthesizer).await,
    }
}
