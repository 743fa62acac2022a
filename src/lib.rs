//! Configurable HTTP request client and rate-limited load generator.
//!
//! A run either sends one request and echoes the whole exchange, or fans
//! out many copies of the same request concurrently behind a rate gate and
//! reports how they went.

pub mod cli;
pub mod client;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod logger;
pub mod rate;
pub mod single;
pub mod stats;
pub mod template;

use std::sync::Arc;

use anyhow::Result;

use crate::cli::RunConfig;
use crate::client::HttpClient;
use crate::dispatch::{dispatch, RunReport};
use crate::executor::HttpExecutor;

/// Runs a whole invocation: the single-shot echo for one request or fewer,
/// the concurrent dispatcher otherwise.
pub async fn run(config: &RunConfig) -> Result<()> {
    let client = HttpClient::new(config.timeout);

    if config.is_single_shot() {
        return single::run_single(&client, &config.template).await;
    }

    run_concurrent(&client, config).await;
    Ok(())
}

pub async fn run_concurrent(client: &HttpClient, config: &RunConfig) -> RunReport {
    let template = Arc::new(config.template.clone());
    println!("Sending {} requests to {}...", config.requests, template.url());
    if config.per_second > 0 {
        println!("  capped at {} requests/sec", config.per_second);
    }

    let executor = Arc::new(HttpExecutor::new(client.clone(), template));
    let report = dispatch(executor, config.dispatch_options()).await;

    println!("\nFinished {} requests in {:?}", report.total, report.elapsed());
    report.stats.print_stats(report.elapsed());
    report
}
