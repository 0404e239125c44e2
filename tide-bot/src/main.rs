//! Binary crate for the `tide-bot` Discord bot.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and loading configuration
//! - Interactive credential setup
//! - Wiring the core interaction flow to the Discord gateway

use clap::Parser;

mod cli;
mod discord;
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
