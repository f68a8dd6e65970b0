//! tudata - fetch and cache TuShare market data
//!
//! Reads the provider token from the environment, dispatches one dataset
//! fetch (served from the file cache when possible), and prints the resulting
//! table to stdout.

use std::time::Duration;

use clap::Parser;
use polars::prelude::DataFrame;
use tracing_subscriber::EnvFilter;

use tudata::cache::FileCache;
use tudata::cli::{compact_date, Cli, Command};
use tudata::config::Config;
use tudata::data::{DataError, FundClient, FuturesClient, IndexClient, MarginClient};
use tudata::pro::ProClient;
use tudata::table;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout stays a clean table.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?
        .with_cache_dir(cli.cache_dir)
        .with_request_delay(Duration::from_millis(cli.delay_ms));

    let pro = ProClient::new(config.token.clone());
    let cache = FileCache::new(config.cache_dir.clone());

    let df = run(cli.command.unwrap_or_default(), &config, pro, cache).await?;
    println!("{df}");

    Ok(())
}

/// Dispatches one subcommand to its dataset access layer
async fn run(
    command: Command,
    config: &Config,
    pro: ProClient,
    cache: FileCache,
) -> Result<DataFrame, DataError> {
    match command {
        Command::FutBasic { exchange } => {
            FuturesClient::new(pro, cache, config.request_delay)
                .basics(&exchange)
                .await
        }
        Command::FutDaily {
            exchange,
            start,
            end,
        } => {
            let futures = FuturesClient::new(pro, cache, config.request_delay);
            let basics = futures.basics(&exchange).await?;
            let ts_codes = table::column_values(&basics, "ts_code")?;
            futures
                .daily(&ts_codes, &compact_date(start), &compact_date(end))
                .await
        }
        Command::IndexDaily {
            ts_code,
            start,
            end,
        } => {
            let start = start.map(compact_date);
            let end = end.map(compact_date);
            IndexClient::new(pro, cache)
                .daily(&ts_code, start.as_deref(), end.as_deref())
                .await
        }
        Command::MarginDetail { dates } => {
            let dates: Vec<String> = dates.into_iter().map(compact_date).collect();
            MarginClient::new(pro, cache, config.request_delay)
                .detail(&dates)
                .await
        }
        Command::FundBasic => {
            FundClient::new(pro, cache, config.request_delay)
                .enhanced_index_basics()
                .await
        }
        Command::FundNav { start, end } => {
            FundClient::new(pro, cache, config.request_delay)
                .enhanced_index_nav(&compact_date(start), &compact_date(end))
                .await
        }
    }
}
