//! Preprint Alert CLI: daily arXiv digest generator.
//!
//! Reads today's arXiv listing, lets a language model pick the papers that
//! match your interests, analyzes each one and writes a narrative report.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
