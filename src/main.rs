mod ai;
mod auth;
mod cli;
mod config;
mod error;
mod generation;
mod insights;
mod orchestrator;
mod output;
mod pipeline;
mod stack;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting PipeLens - CI/CD Pipeline Analysis & Generation");
    cli.execute().await?;

    Ok(())
}
