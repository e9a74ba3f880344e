//! Adit CLI: flattens a content graph into ordered, heading-normalized
//! documents.
//!
//! Reads the graph from a local libSQL database and writes static-site
//! pages, wiki bundles, or a single linear document.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
