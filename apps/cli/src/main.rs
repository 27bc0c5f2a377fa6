//! Ghostwriter CLI - AI blogging assistant.
//!
//! Finds trending topics, researches them, drafts posts and publishes the
//! drafts to a Ghost blog, all through a tool-calling chat agent.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli)?;
    ghostwriter_shared::load_dotenv();
    commands::run(cli).await
}
