// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

//! In-memory [`DiffRepository`] and [`HeaderRepository`] doubles, the Rust
//! analogue of `pkg/fakes/MockStorageDiffRepository` /
//! `MockHeaderRepository`: deterministic, no database, safe to construct
//! per-test.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use diff_core::{DiffStatus, PersistedDiff, RawDiff};

use crate::diff_repository::{DiffRepository, InsertOutcome};
use crate::error::Error;
use crate::header::{within_reorg_window, Header, HeaderRepository};

/// An in-memory [`DiffRepository`] keyed on the same fingerprint the
/// Postgres implementation enforces with a unique index.
#[derive(Default)]
pub struct InMemoryDiffRepository {
    inner: Mutex<DiffInner>,
}

#[derive(Default)]
struct DiffInner {
    rows: Vec<PersistedDiff>,
    next_id: i64,
}

impl InMemoryDiffRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of every row currently stored, in insertion order.
    pub fn all(&self) -> Vec<PersistedDiff> {
        self.inner.lock().unwrap().rows.clone()
    }

    pub fn get(&self, id: i64) -> Option<PersistedDiff> {
        self.inner.lock().unwrap().rows.iter().find(|d| d.id == id).cloned()
    }
}

#[async_trait]
impl DiffRepository for InMemoryDiffRepository {
    async fn create_storage_diff(&self, raw: &RawDiff) -> Result<InsertOutcome, Error> {
        let mut inner = self.inner.lock().unwrap();
        if inner.rows.iter().any(|d| d.raw.fingerprint() == raw.fingerprint()) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        inner.next_id += 1;
        let id = inner.next_id;
        inner.rows.push(PersistedDiff {
            id,
            raw: *raw,
            status: DiffStatus::New,
            from_backfill: false,
        });
        Ok(InsertOutcome::Inserted(id))
    }

    async fn diffs_in_block_range(&self, start: i64, end: i64) -> Result<Vec<PersistedDiff>, Error> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .rows
            .iter()
            .filter(|d| d.raw.block_height >= start && d.raw.block_height <= end)
            .cloned()
            .collect())
    }

    async fn mark_pending(&self, id: i64) -> Result<(), Error> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(row) = inner.rows.iter_mut().find(|d| d.id == id) {
            if row.status == DiffStatus::Transformed {
                row.status = DiffStatus::Pending;
            }
        }
        Ok(())
    }

    async fn mark_from_backfill(&self, id: i64) -> Result<(), Error> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(row) = inner.rows.iter_mut().find(|d| d.id == id) {
            row.from_backfill = true;
        }
        Ok(())
    }
}

/// Test-only helper absent from the trait: directly set a diff's status,
/// so validator tests can seed a `Transformed` row without going through
/// the decoder this workspace doesn't implement.
impl InMemoryDiffRepository {
    pub fn set_status(&self, id: i64, status: DiffStatus) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(row) = inner.rows.iter_mut().find(|d| d.id == id) {
            row.status = status;
        }
    }
}

/// An in-memory [`HeaderRepository`] applying the same 15-block
/// reorg-replacement rule as [`crate::postgres::PostgresHeaderRepository`].
#[derive(Default)]
pub struct InMemoryHeaderRepository {
    inner: Mutex<HeaderInner>,
}

#[derive(Default)]
struct HeaderInner {
    by_number: HashMap<i64, Header>,
    next_id: i64,
}

impl InMemoryHeaderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HeaderRepository for InMemoryHeaderRepository {
    async fn create_or_update_header(&self, header: &Header) -> Result<i64, Error> {
        let mut inner = self.inner.lock().unwrap();
        let max_block_number = inner.by_number.keys().copied().max();

        if let Some(existing) = inner.by_number.get(&header.block_number).cloned() {
            if existing.hash != header.hash && within_reorg_window(header.block_number, max_block_number) {
                let replaced = Header {
                    id: existing.id,
                    ..header.clone()
                };
                inner.by_number.insert(header.block_number, replaced);
            }
            return Ok(existing.id);
        }

        inner.next_id += 1;
        let id = inner.next_id;
        inner.by_number.insert(
            header.block_number,
            Header {
                id,
                ..header.clone()
            },
        );
        Ok(id)
    }

    async fn header_at(&self, block_number: i64) -> Result<Option<Header>, Error> {
        Ok(self.inner.lock().unwrap().by_number.get(&block_number).cloned())
    }

    async fn headers_in_range(&self, start: i64, end: i64) -> Result<Vec<Header>, Error> {
        let inner = self.inner.lock().unwrap();
        let mut out: Vec<Header> = inner
            .by_number
            .values()
            .filter(|h| h.block_number >= start && h.block_number <= end)
            .cloned()
            .collect();
        out.sort_by_key(|h| h.block_number);
        Ok(out)
    }

    async fn max_block_number(&self) -> Result<Option<i64>, Error> {
        Ok(self.inner.lock().unwrap().by_number.keys().copied().max())
    }

    async fn mark_header_unchecked(&self, _block_number: i64) -> Result<(), Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;

    fn sample_raw(height: i64) -> RawDiff {
        RawDiff {
            hashed_address: B256::repeat_byte(0xa1),
            block_hash: B256::repeat_byte(0xb2),
            block_height: height,
            storage_key: B256::repeat_byte(0x01),
            storage_value: B256::repeat_byte(0x03),
        }
    }

    #[tokio::test]
    async fn duplicate_insert_is_already_exists() {
        let repo = InMemoryDiffRepository::new();
        let raw = sample_raw(1);
        assert_eq!(
            repo.create_storage_diff(&raw).await.unwrap(),
            InsertOutcome::Inserted(1)
        );
        assert_eq!(
            repo.create_storage_diff(&raw).await.unwrap(),
            InsertOutcome::AlreadyExists
        );
        assert_eq!(repo.all().len(), 1);
    }

    #[tokio::test]
    async fn mark_from_backfill_is_idempotent() {
        let repo = InMemoryDiffRepository::new();
        let raw = sample_raw(1);
        let InsertOutcome::Inserted(id) = repo.create_storage_diff(&raw).await.unwrap() else {
            panic!("expected Inserted")
        };
        repo.mark_from_backfill(id).await.unwrap();
        repo.mark_from_backfill(id).await.unwrap();
        assert!(repo.get(id).unwrap().from_backfill);
    }

    #[tokio::test]
    async fn mark_pending_only_demotes_transformed() {
        let repo = InMemoryDiffRepository::new();
        let raw = sample_raw(1);
        let InsertOutcome::Inserted(id) = repo.create_storage_diff(&raw).await.unwrap() else {
            panic!("expected Inserted")
        };
        // still `New`: mark_pending is a no-op.
        repo.mark_pending(id).await.unwrap();
        assert_eq!(repo.get(id).unwrap().status, DiffStatus::New);

        repo.set_status(id, DiffStatus::Transformed);
        repo.mark_pending(id).await.unwrap();
        assert_eq!(repo.get(id).unwrap().status, DiffStatus::Pending);
    }
}
