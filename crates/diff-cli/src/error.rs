// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

/// The CLI's own top-level error, composing every crate's error type at
/// the one seam that actually needs all of them together.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("loading configuration: {0}")]
    Config(#[from] config::ConfigError),
    #[error("connecting to postgres: {0}")]
    Database(#[from] sqlx::Error),
    #[error("node error: {0}")]
    Node(#[from] diff_node::Error),
    #[error(transparent)]
    Repository(#[from] diff_db::Error),
    #[error(transparent)]
    Fetch(#[from] diff_fetcher::FetchError),
    #[error(transparent)]
    Extract(#[from] diff_pipeline::ExtractError),
    #[error(transparent)]
    Backfill(#[from] diff_pipeline::BackfillError),
    #[error(transparent)]
    Decode(#[from] diff_core::DecodeError),
    #[error("--source csv requires --path or a configured csv_path")]
    MissingCsvPath,
}
