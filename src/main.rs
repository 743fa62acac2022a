use anyhow::Result;
use clap::Parser;
use rustreq::cli::{Args, RunConfig};
use rustreq::logger::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = RunConfig::from(args);
    tracing::debug!(?config, "starting run");

    rustreq::run(&config).await
}
