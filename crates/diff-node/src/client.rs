// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

use std::pin::Pin;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use diff_db::Header;
use futures::Stream;

use crate::error::Error;

/// A boxed stream of raw state-diff payload bytes, one item per block the
/// node emits a diff for.
pub type PayloadStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, Error>> + Send>>;

/// Abstraction over the execution node this pipeline ingests from.
///
/// Headers returned here have `id == 0`: the node has no concept of our
/// storage row id, only [`diff_db::HeaderRepository::create_or_update_header`]
/// assigns one.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Open a subscription to the node's state-diff stream. The returned
    /// stream yields raw payload bytes; decoding is the fetcher's job.
    async fn subscribe_state_diffs(&self) -> Result<PayloadStream, Error>;

    /// Point-read a single storage slot at a historical block, used by the
    /// backfill loader. Returns the raw (still RLP/hex-wrapped, wire-format
    /// specific) bytes exactly as the node returned them.
    async fn storage_at(&self, address: Address, key: B256, block_number: i64) -> Result<Vec<u8>, Error>;

    /// Fetch the header at an exact block number.
    async fn header_by_number(&self, block_number: i64) -> Result<Header, Error>;

    /// Fetch headers for a batch of block numbers in one round trip.
    async fn headers_by_numbers(&self, block_numbers: &[i64]) -> Result<Vec<Header>, Error>;

    /// The current chain head's block number.
    async fn last_block(&self) -> Result<i64, Error>;
}
