// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

use alloy_primitives::{keccak256, Address, B256};
use diff_core::RawDiff;
use diff_db::{DiffRepository, HeaderRepository, InsertOutcome};
use diff_node::NodeClient;

use crate::error::BackfillError;
use crate::hash::{parse_header_hash, HashParseError};

impl From<HashParseError> for BackfillError {
    fn from(e: HashParseError) -> Self {
        match e {
            HashParseError::InvalidHex(hash, source) => BackfillError::InvalidHeaderHash { hash, source },
            HashParseError::WrongLength(hash) => BackfillError::HeaderHashWrongLength(hash),
        }
    }
}

/// One contract address and the storage slots to reconstruct for it.
pub struct BackfillTarget {
    pub address: Address,
    pub storage_keys: Vec<B256>,
}

/// Tally of what a [`backfill`] run actually did, for the CLI to report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub inserted: usize,
    pub already_existing: usize,
}

/// Reconstruct storage diffs for block `block` from point-in-time storage
/// reads, for every `(address, key)` pair named in `targets`.
///
/// Looks up the header for `block` once; a miss fails the whole run before
/// any node reads happen. For each key: reads the node, inserts via `diffs`,
/// and, only on a genuinely new insert, marks it `from_backfill`. A key
/// whose insert comes back `AlreadyExists` (the diff already arrived via
/// the stream) is skipped silently; the loop continues to the remaining
/// keys for that address and the remaining addresses, rather than
/// returning early on the first duplicate.
pub async fn backfill<N: NodeClient, H: HeaderRepository, R: DiffRepository>(
    node: &N,
    headers: &H,
    diffs: &R,
    block: i64,
    targets: &[BackfillTarget],
) -> Result<BackfillReport, BackfillError> {
    let header = headers
        .header_at(block)
        .await?
        .ok_or(BackfillError::MissingHeader(block))?;
    let block_hash = parse_header_hash(&header.hash)?;

    let mut report = BackfillReport::default();
    for target in targets {
        let hashed_address = keccak256(target.address.as_slice());
        for &storage_key in &target.storage_keys {
            let wire_value = node.storage_at(target.address, storage_key, block).await?;
            let storage_value = diff_core::decode_storage_value(&wire_value)?;

            let raw = RawDiff {
                hashed_address,
                block_hash,
                block_height: block,
                storage_key,
                storage_value,
            };

            match diffs.create_storage_diff(&raw).await? {
                InsertOutcome::AlreadyExists => {
                    tracing::debug!(
                        address = %target.address,
                        ?storage_key,
                        block,
                        "backfill target already persisted, skipping"
                    );
                    report.already_existing += 1;
                }
                InsertOutcome::Inserted(id) => {
                    diffs.mark_from_backfill(id).await?;
                    report.inserted += 1;
                }
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use diff_db::{InMemoryDiffRepository, InMemoryHeaderRepository, Header};
    use diff_node::MockNodeClient;

    fn sample_header(block_number: i64, hash: &str) -> Header {
        Header {
            id: 0,
            block_number,
            hash: hash.to_string(),
            raw: serde_json::json!({}),
            block_timestamp: 0,
        }
    }

    fn rlp_wrapped(bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        alloy_rlp::Encodable::encode(&alloy_primitives::Bytes::copy_from_slice(bytes), &mut out);
        out
    }

    #[tokio::test]
    async fn missing_header_aborts_before_any_node_reads() {
        let node = MockNodeClient::new();
        let headers = InMemoryHeaderRepository::new();
        let diffs = InMemoryDiffRepository::new();

        let targets = vec![BackfillTarget {
            address: Address::repeat_byte(0x11),
            storage_keys: vec![B256::repeat_byte(0x01)],
        }];

        let err = backfill(&node, &headers, &diffs, 100, &targets).await.unwrap_err();
        assert!(matches!(err, BackfillError::MissingHeader(100)));
        assert!(node.storage_at_calls().is_empty());
    }

    #[tokio::test]
    async fn inserts_and_marks_from_backfill_on_success() {
        let node = MockNodeClient::new();
        let headers = InMemoryHeaderRepository::new();
        let diffs = InMemoryDiffRepository::new();

        let header_hash = "0x".to_string() + &"aa".repeat(32);
        headers
            .create_or_update_header(&sample_header(100, &header_hash))
            .await
            .unwrap();

        let address = Address::repeat_byte(0x11);
        let key = B256::repeat_byte(0x01);
        node.set_storage_value(address, key, 100, rlp_wrapped(&[3]));

        let targets = vec![BackfillTarget {
            address,
            storage_keys: vec![key],
        }];

        let report = backfill(&node, &headers, &diffs, 100, &targets).await.unwrap();
        assert_eq!(report, BackfillReport { inserted: 1, already_existing: 0 });

        let rows = diffs.all();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].from_backfill);
    }

    #[tokio::test]
    async fn continues_past_already_exists_to_remaining_keys() {
        let node = MockNodeClient::new();
        let headers = InMemoryHeaderRepository::new();
        let diffs = InMemoryDiffRepository::new();

        let header_hash = "0x".to_string() + &"bb".repeat(32);
        headers
            .create_or_update_header(&sample_header(100, &header_hash))
            .await
            .unwrap();

        let address = Address::repeat_byte(0x22);
        let key1 = B256::repeat_byte(0x01);
        let key2 = B256::repeat_byte(0x02);
        node.set_storage_value(address, key1, 100, rlp_wrapped(&[1]));
        node.set_storage_value(address, key2, 100, rlp_wrapped(&[2]));

        // Pre-insert the diff for key1 via a "stream" insert so the
        // backfill run observes AlreadyExists for it, and does not set
        // from_backfill on it.
        let pre_block_hash = parse_header_hash(&header_hash).unwrap();
        let pre_existing = RawDiff {
            hashed_address: keccak256(address.as_slice()),
            block_hash: pre_block_hash,
            block_height: 100,
            storage_key: key1,
            storage_value: diff_core::right_align(&[1]).unwrap(),
        };
        let pre_id = match diffs.create_storage_diff(&pre_existing).await.unwrap() {
            InsertOutcome::Inserted(id) => id,
            InsertOutcome::AlreadyExists => panic!("expected a fresh insert"),
        };

        let targets = vec![BackfillTarget {
            address,
            storage_keys: vec![key1, key2],
        }];

        let report = backfill(&node, &headers, &diffs, 100, &targets).await.unwrap();
        assert_eq!(report, BackfillReport { inserted: 1, already_existing: 1 });

        assert!(!diffs.get(pre_id).unwrap().from_backfill);
        assert_eq!(diffs.all().len(), 2);
    }
}
