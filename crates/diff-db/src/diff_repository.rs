// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

use async_trait::async_trait;
use diff_core::{PersistedDiff, RawDiff};

use crate::error::Error;

/// The outcome of an insert attempt keyed on the diff fingerprint.
///
/// `AlreadyExists` is not an error: every caller in this workspace treats
/// it as a no-op and continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(i64),
    AlreadyExists,
}

/// Storage and retrieval of persisted storage diffs.
#[async_trait]
pub trait DiffRepository: Send + Sync {
    /// Insert a diff by its fingerprint `(hashed_address, block_hash,
    /// block_height, storage_key, storage_value)`. A diff that already
    /// exists under that fingerprint yields `AlreadyExists`, not an error.
    /// Every successful insert starts life as `New` with `from_backfill =
    /// false`; the backfill loader annotates it after the fact with
    /// [`DiffRepository::mark_from_backfill`].
    async fn create_storage_diff(&self, raw: &RawDiff) -> Result<InsertOutcome, Error>;

    /// All diffs whose `block_height` falls in the inclusive range
    /// `[start, end]`, used by the validator to read a sliding window.
    async fn diffs_in_block_range(&self, start: i64, end: i64) -> Result<Vec<PersistedDiff>, Error>;

    /// Demote a `Transformed` diff back to `Pending` after the validator
    /// finds its `block_hash` no longer names the canonical block at its
    /// height. A no-op if the diff is not currently `Transformed`.
    async fn mark_pending(&self, id: i64) -> Result<(), Error>;

    /// Set the `from_backfill` flag on a diff that has already been
    /// inserted. Idempotent: calling it twice leaves the flag `true` and
    /// returns no error.
    async fn mark_from_backfill(&self, id: i64) -> Result<(), Error>;
}
