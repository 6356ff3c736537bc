// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

use async_trait::async_trait;

use crate::error::Error;

/// A consumed (not owned) block header: the validator and the backfill
/// loader read these, but nothing in this workspace writes them except the
/// header-ingestion path this crate exposes a trait for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Header {
    pub id: i64,
    pub block_number: i64,
    /// Hex string, `0x`-prefixed, as it arrives from the node.
    pub hash: String,
    /// Opaque JSON blob of the header as the node reported it.
    pub raw: serde_json::Value,
    pub block_timestamp: i64,
}

/// Storage and retrieval of canonical-chain headers.
///
/// `create_or_update_header` implements the 15-block reorg window: a header
/// at a `block_number` already present in the store is replaced if its hash
/// differs and it is strictly fewer than 15 blocks behind the current max
/// block number; a header exactly 15 (or more) blocks back is outside that
/// window and immutable, and the call is a no-op for rows it cannot touch.
#[async_trait]
pub trait HeaderRepository: Send + Sync {
    /// Insert or conditionally replace a header, returning its row id.
    async fn create_or_update_header(&self, header: &Header) -> Result<i64, Error>;

    /// Look up the header persisted for an exact block number, if any.
    async fn header_at(&self, block_number: i64) -> Result<Option<Header>, Error>;

    /// Headers for a contiguous `[start, end]` range, ascending by block
    /// number. Used by the validator to read a sliding window in one query.
    async fn headers_in_range(&self, start: i64, end: i64) -> Result<Vec<Header>, Error>;

    /// The highest block number currently persisted, if any headers exist.
    async fn max_block_number(&self) -> Result<Option<i64>, Error>;

    /// Reset a header's check_count to zero so a log-extraction delegator
    /// will revisit it. Outside this crate's core scope (the delegator
    /// itself is not implemented here) but the column lives on `headers`
    /// and `diff-cli reset-header-check-count` needs somewhere to call.
    async fn mark_header_unchecked(&self, block_number: i64) -> Result<(), Error>;
}

/// The reorg window width: a header within this many blocks of the current
/// max block number may still be replaced if its hash changes.
pub const REORG_WINDOW: i64 = 15;

/// Whether a header at `candidate_block_number` is still eligible for
/// hash-replacement given the store's current `max_block_number`.
///
/// An empty store (`max_block_number` is `None`) accepts any candidate,
/// since there is nothing yet to be "behind" the tip of. A candidate
/// exactly `REORG_WINDOW` blocks back from the max is already outside the
/// window and immutable; only `max - candidate < REORG_WINDOW` is eligible.
pub fn within_reorg_window(candidate_block_number: i64, max_block_number: Option<i64>) -> bool {
    max_block_number
        .map(|max| candidate_block_number > max - REORG_WINDOW)
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_anything_when_store_is_empty() {
        assert!(within_reorg_window(12345, None));
    }

    #[test]
    fn rejects_header_exactly_at_window_edge() {
        assert!(!within_reorg_window(100, Some(115)));
    }

    #[test]
    fn rejects_header_past_window_edge() {
        assert!(!within_reorg_window(99, Some(115)));
    }

    #[test]
    fn accepts_header_at_or_above_max() {
        assert!(within_reorg_window(115, Some(115)));
        assert!(within_reorg_window(200, Some(115)));
    }
}
