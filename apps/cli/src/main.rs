//! ProposalKit CLI: batch processing of exchange-program proposal documents.
//!
//! Scans a proposal tree, builds the inventory and organization lists,
//! formats database resources, reports and removes duplicates, and loads the
//! result into a local catalog.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
