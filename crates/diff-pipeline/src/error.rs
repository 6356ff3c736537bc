// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

/// Errors from [`crate::extract`]. Only a repository failure or a fatal
/// fetcher error aborts the loop; everything else is logged and the loop
/// continues.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExtractError {
    #[error("repository error: {0}")]
    Repository(#[from] diff_db::Error),
    #[error("fetcher error: {0}")]
    Fetcher(diff_fetcher::FetchError),
}

/// Errors from [`crate::backfill`]. Any variant here aborts the whole
/// backfill run for the requested block.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BackfillError {
    /// No header exists yet for the requested block; nothing was inserted.
    #[error("no header for block {0}")]
    MissingHeader(i64),
    /// The header's `hash` column did not parse as 32 bytes of hex.
    #[error("header hash {hash:?} is not valid hex: {source}")]
    InvalidHeaderHash {
        hash: String,
        #[source]
        source: hex::FromHexError,
    },
    #[error("header hash {0:?} is not 32 bytes")]
    HeaderHashWrongLength(String),
    #[error("node error: {0}")]
    Node(#[from] diff_node::Error),
    #[error("decode error: {0}")]
    Decode(#[from] diff_core::DecodeError),
    #[error("repository error: {0}")]
    Repository(#[from] diff_db::Error),
}

/// Errors from [`crate::validate_once`]. The validator's own periodic
/// driver logs these and moves on to the next tick rather than treating
/// them as fatal to the process.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ValidateError {
    /// A diff's `block_height` fell inside the validation window but no
    /// header exists for it. The window is assumed bounded by headers that
    /// exist by construction, so this signals a broken invariant rather
    /// than a recoverable gap.
    #[error("no header for block {0} inside the validation window")]
    MissingHeader(i64),
    #[error("header hash {0:?} is not valid hex")]
    InvalidHeaderHash(String),
    #[error("header hash {0:?} is not 32 bytes")]
    HeaderHashWrongLength(String),
    #[error("node error: {0}")]
    Node(#[from] diff_node::Error),
    #[error("repository error: {0}")]
    Repository(#[from] diff_db::Error),
}
