// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

mod config;
mod error;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256};
use clap::{Parser, Subcommand, ValueEnum};
use diff_core::V3Codec;
use diff_db::HeaderRepository;
use diff_node::NodeClient;
use diff_pipeline::{BackfillTarget, ValidatorConfig};
use diff_watcher::RetryPolicy;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::mpsc;

use config::Config;
use error::Error;

/// Storage diff ingestion and reconciliation pipeline.
#[derive(Parser)]
#[command(name = "diff-cli", version)]
struct Cli {
    /// Path to a TOML config file. Missing is fine; env vars and defaults
    /// still apply.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the streaming pipeline: fetch, decode, persist, validate.
    ExtractDiffs {
        #[arg(long, value_enum, default_value = "node")]
        source: Source,
        /// Required when `--source csv`; falls back to `csv_path` in
        /// configuration otherwise.
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Run the backfill loader for one block and print the values it read.
    GetStorageValue {
        #[arg(long)]
        block: i64,
        #[arg(long)]
        address: Address,
        /// May be repeated; every key is read for the same `--address`.
        #[arg(long = "key", required = true)]
        keys: Vec<B256>,
    },
    /// Reset a header's log-check counter so a delegator revisits it.
    ResetHeaderCheckCount {
        #[arg(long)]
        block: i64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Source {
    Csv,
    Node,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    if let Err(e) = run(cli.command, config).await {
        tracing::error!(error = %e, "fatal error");
        return Err(e.into());
    }
    Ok(())
}

async fn run(command: Command, config: Config) -> Result<(), Error> {
    let pool = PgPoolOptions::new().connect(&config.database_url).await?;
    let diffs = Arc::new(diff_db::postgres::PostgresDiffRepository::new(pool.clone()));
    let headers = Arc::new(diff_db::postgres::PostgresHeaderRepository::new(pool));

    match command {
        Command::ExtractDiffs { source, path } => {
            extract_diffs(source, path, config, diffs, headers).await
        }
        Command::GetStorageValue { block, address, keys } => {
            get_storage_value(block, address, keys, config, diffs, headers).await
        }
        Command::ResetHeaderCheckCount { block } => {
            headers.mark_header_unchecked(block).await?;
            tracing::info!(block, "header check count reset");
            Ok(())
        }
    }
}

async fn extract_diffs(
    source: Source,
    path: Option<PathBuf>,
    config: Config,
    diffs: Arc<diff_db::postgres::PostgresDiffRepository>,
    headers: Arc<diff_db::postgres::PostgresHeaderRepository>,
) -> Result<(), Error> {
    let node = Arc::new(diff_node::JsonRpcNodeClient::connect(&config.node_url).await?);
    let csv_path = match source {
        Source::Csv => Some(path.or(config.csv_path.clone()).ok_or(Error::MissingCsvPath)?),
        Source::Node => None,
    };

    let validator_config = ValidatorConfig {
        window: config.validator.window,
        tick: config.validator.tick_secs,
    };
    let validator_node = Arc::clone(&node);
    let validator_headers = Arc::clone(&headers);
    let validator_diffs = Arc::clone(&diffs);
    let validator_task = tokio::spawn(async move {
        diff_pipeline::run_periodic(&*validator_node, &*validator_headers, &*validator_diffs, validator_config).await
    });

    let liveness_path = config.liveness.fetcher_path.clone();
    let policy = RetryPolicy::<Error> {
        is_expected: |_| false,
        max_consecutive_unexpected_errors: config.watcher.max_consecutive_unexpected_errors,
        retry_interval: config.watcher.retry_interval_secs,
    };

    let (_quit_tx, quit_rx) = tokio::sync::watch::channel(false);
    let extractor_fn = {
        let node = Arc::clone(&node);
        let diffs = Arc::clone(&diffs);
        move || {
            let node = Arc::clone(&node);
            let diffs = Arc::clone(&diffs);
            let csv_path = csv_path.clone();
            let liveness_path = liveness_path.clone();
            async move { run_one_pass(source, csv_path, liveness_path, &node, &diffs).await }
        }
    };

    let result = diff_watcher::supervise(extractor_fn, policy, quit_rx).await;
    validator_task.abort();
    result
}

/// One fetch-then-extract pass: fetch runs in its own task so the extractor
/// can drain its channels concurrently with production rather than after
/// the fetcher has already filled (and blocked on) a bounded channel.
async fn run_one_pass(
    source: Source,
    csv_path: Option<PathBuf>,
    liveness_path: Option<PathBuf>,
    node: &Arc<diff_node::JsonRpcNodeClient>,
    diffs: &Arc<diff_db::postgres::PostgresDiffRepository>,
) -> Result<(), Error> {
    let (diffs_tx, diffs_rx) = mpsc::channel(256);
    let (errors_tx, errors_rx) = mpsc::channel(256);

    let fetch_node = Arc::clone(node);
    let fetch_handle = tokio::spawn(async move {
        match source {
            Source::Node => {
                diff_fetcher::fetch_storage_diffs(
                    fetch_node.as_ref(),
                    &V3Codec,
                    liveness_path.as_deref(),
                    &diffs_tx,
                    &errors_tx,
                )
                .await
            }
            Source::Csv => {
                let path = csv_path.expect("csv source requires a path, checked before dispatch");
                diff_fetcher::tail_csv_diffs(
                    path,
                    Duration::from_secs(2),
                    liveness_path.as_deref(),
                    &diffs_tx,
                    &errors_tx,
                )
                .await
            }
        }
    });

    diff_pipeline::extract(diffs_rx, errors_rx, diffs.as_ref()).await?;
    fetch_handle.await.expect("fetch task panicked")?;
    Ok(())
}

async fn get_storage_value(
    block: i64,
    address: Address,
    keys: Vec<B256>,
    config: Config,
    diffs: Arc<diff_db::postgres::PostgresDiffRepository>,
    headers: Arc<diff_db::postgres::PostgresHeaderRepository>,
) -> Result<(), Error> {
    let node = diff_node::JsonRpcNodeClient::connect(&config.node_url).await?;

    let targets = vec![BackfillTarget {
        address,
        storage_keys: keys.clone(),
    }];
    let report = diff_pipeline::backfill(&node, headers.as_ref(), diffs.as_ref(), block, &targets).await?;
    tracing::info!(inserted = report.inserted, already_existing = report.already_existing, "backfill complete");

    for key in keys {
        let wire_value = node.storage_at(address, key, block).await?;
        let value = diff_core::decode_storage_value(&wire_value)?;
        println!("{address} {key} @ {block} = {value}");
    }
    Ok(())
}
