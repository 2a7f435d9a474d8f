use anyhow::Context;
use clap::Parser;
use estate_cleanser::cli::{init_logging, run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_deref()).context("failed to initialise logging")?;
    run(cli).await.context("estate-cleanser failed")
}
