//! groqspec CLI: build the GROQ specification from the content store.
//!
//! Fetches the spec chapters, writes them as spec-md Markdown, compiles the
//! HTML and renders the version index.

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
