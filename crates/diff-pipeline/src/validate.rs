// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

use std::collections::HashMap;
use std::time::Duration;

use diff_db::{DiffRepository, HeaderRepository};
use diff_node::NodeClient;
use tokio::time::MissedTickBehavior;

use crate::error::ValidateError;
use crate::hash::{parse_header_hash, HashParseError};

impl From<HashParseError> for ValidateError {
    fn from(e: HashParseError) -> Self {
        match e {
            HashParseError::InvalidHex(hash, _) => ValidateError::InvalidHeaderHash(hash),
            HashParseError::WrongLength(hash) => ValidateError::HeaderHashWrongLength(hash),
        }
    }
}

/// How far behind the chain head the validator looks, and how often
/// [`run_periodic`] re-checks that window.
#[derive(Debug, Clone, Copy)]
pub struct ValidatorConfig {
    pub window: u64,
    pub tick: Duration,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            window: 15,
            tick: Duration::from_secs(7),
        }
    }
}

/// Tally of one [`validate_once`] pass, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub checked: usize,
    pub demoted: usize,
}

/// Re-check the last `window` blocks' worth of persisted diffs against the
/// canonical header at each diff's `block_height`, demoting any
/// `Transformed` diff whose recorded `block_hash` no longer matches.
///
/// A diff outside the reorg window the headers table itself enforces is,
/// by construction, sitting on a block height for which a canonical header
/// still exists; a missing header inside the window is therefore treated
/// as a broken invariant ([`ValidateError::MissingHeader`]) rather than
/// silently skipped.
pub async fn validate_once<N: NodeClient, H: HeaderRepository, R: DiffRepository>(
    node: &N,
    headers: &H,
    diffs: &R,
    window: u64,
) -> Result<ValidationReport, ValidateError> {
    let head = node.last_block().await?;
    let start = (head - window as i64 + 1).max(0);
    let end = head;

    let canonical: HashMap<i64, diff_db::Header> = headers
        .headers_in_range(start, end)
        .await?
        .into_iter()
        .map(|h| (h.block_number, h))
        .collect();

    let mut report = ValidationReport::default();
    for diff in diffs.diffs_in_block_range(start, end).await? {
        report.checked += 1;
        let header = canonical
            .get(&diff.raw.block_height)
            .ok_or(ValidateError::MissingHeader(diff.raw.block_height))?;
        let canonical_hash = parse_header_hash(&header.hash)?;

        if diff.raw.block_hash != canonical_hash && diff.is_demotable() {
            diffs.mark_pending(diff.id).await?;
            report.demoted += 1;
        }
    }
    Ok(report)
}

/// Run [`validate_once`] on a fixed tick, forever. Each tick is independent:
/// an error from one pass is logged and the loop waits for the next tick
/// rather than aborting, since the next pass starts from a fresh read of
/// the chain head and headers table and is not compromised by the last
/// pass's failure.
pub async fn run_periodic<N: NodeClient, H: HeaderRepository, R: DiffRepository>(
    node: &N,
    headers: &H,
    diffs: &R,
    config: ValidatorConfig,
) -> ! {
    let mut interval = tokio::time::interval(config.tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        match validate_once(node, headers, diffs, config.window).await {
            Ok(report) => {
                tracing::debug!(checked = report.checked, demoted = report.demoted, "validation pass complete");
            }
            Err(e) => {
                tracing::warn!(error = %e, "validation pass failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use diff_core::RawDiff;
    use diff_db::{Header, InMemoryDiffRepository, InMemoryHeaderRepository, InsertOutcome};
    use diff_db::DiffRepository as _;
    use diff_node::MockNodeClient;

    fn sample_header(block_number: i64, hash_byte: u8) -> Header {
        Header {
            id: 0,
            block_number,
            hash: format!("0x{}", hex::encode([hash_byte; 32])),
            raw: serde_json::json!({}),
            block_timestamp: 0,
        }
    }

    fn sample_raw(height: i64, block_hash: B256) -> RawDiff {
        RawDiff {
            hashed_address: B256::repeat_byte(0xa1),
            block_hash,
            block_height: height,
            storage_key: B256::repeat_byte(0x01),
            storage_value: B256::repeat_byte(0x03),
        }
    }

    #[tokio::test]
    async fn demotes_transformed_diff_on_hash_mismatch() {
        let node = MockNodeClient::new();
        node.set_last_block(100);
        let headers = InMemoryHeaderRepository::new();
        headers.create_or_update_header(&sample_header(100, 0xaa)).await.unwrap();
        let diffs = InMemoryDiffRepository::new();

        let stale_hash = B256::repeat_byte(0xff);
        let raw = sample_raw(100, stale_hash);
        let InsertOutcome::Inserted(id) = diffs.create_storage_diff(&raw).await.unwrap() else {
            panic!("expected insert")
        };
        diffs.set_status(id, diff_core::DiffStatus::Transformed);

        let report = validate_once(&node, &headers, &diffs, 15).await.unwrap();
        assert_eq!(report, ValidationReport { checked: 1, demoted: 1 });
        assert_eq!(diffs.get(id).unwrap().status, diff_core::DiffStatus::Pending);
    }

    #[tokio::test]
    async fn leaves_matching_diff_alone() {
        let node = MockNodeClient::new();
        node.set_last_block(100);
        let headers = InMemoryHeaderRepository::new();
        headers.create_or_update_header(&sample_header(100, 0xaa)).await.unwrap();
        let diffs = InMemoryDiffRepository::new();

        let canonical_hash = B256::repeat_byte(0xaa);
        let raw = sample_raw(100, canonical_hash);
        let InsertOutcome::Inserted(id) = diffs.create_storage_diff(&raw).await.unwrap() else {
            panic!("expected insert")
        };
        diffs.set_status(id, diff_core::DiffStatus::Transformed);

        let report = validate_once(&node, &headers, &diffs, 15).await.unwrap();
        assert_eq!(report, ValidationReport { checked: 1, demoted: 0 });
        assert_eq!(diffs.get(id).unwrap().status, diff_core::DiffStatus::Transformed);
    }

    #[tokio::test]
    async fn leaves_non_transformed_diff_alone_even_on_mismatch() {
        let node = MockNodeClient::new();
        node.set_last_block(100);
        let headers = InMemoryHeaderRepository::new();
        headers.create_or_update_header(&sample_header(100, 0xaa)).await.unwrap();
        let diffs = InMemoryDiffRepository::new();

        let stale_hash = B256::repeat_byte(0xff);
        let raw = sample_raw(100, stale_hash);
        // left at `New`.
        let InsertOutcome::Inserted(id) = diffs.create_storage_diff(&raw).await.unwrap() else {
            panic!("expected insert")
        };

        let report = validate_once(&node, &headers, &diffs, 15).await.unwrap();
        assert_eq!(report, ValidationReport { checked: 1, demoted: 0 });
        assert_eq!(diffs.get(id).unwrap().status, diff_core::DiffStatus::New);
    }

    #[tokio::test]
    async fn missing_header_inside_window_is_an_error() {
        let node = MockNodeClient::new();
        node.set_last_block(100);
        let headers = InMemoryHeaderRepository::new();
        let diffs = InMemoryDiffRepository::new();

        let raw = sample_raw(100, B256::repeat_byte(0xaa));
        diffs.create_storage_diff(&raw).await.unwrap();

        let err = validate_once(&node, &headers, &diffs, 15).await.unwrap_err();
        assert!(matches!(err, ValidateError::MissingHeader(100)));
    }
}
