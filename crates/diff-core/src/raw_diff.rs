// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

use alloy_primitives::B256;

use crate::status::DiffStatus;

/// The uniform record produced by every fetcher and the backfill loader,
/// prior to persistence.
///
/// All three wire-format fetchers and the backfill loader converge on this
/// shape; nothing downstream of it needs to know where a diff came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawDiff {
    /// keccak-256 of the 20-byte contract address. For the oldest wire
    /// format the account key arrives pre-hashed and is used verbatim.
    pub hashed_address: B256,
    /// Hash of the block containing the mutation.
    pub block_hash: B256,
    /// Block number of the mutation.
    pub block_height: i64,
    /// The 32-byte storage slot key.
    pub storage_key: B256,
    /// The slot value after the mutation, right-aligned and zero-padded to
    /// 32 bytes.
    pub storage_value: B256,
}

/// The five-field tuple that uniquely identifies a diff in the store.
pub type Fingerprint = (B256, B256, i64, B256, B256);

impl RawDiff {
    /// The fingerprint used as the diff repository's unique insert key.
    pub fn fingerprint(&self) -> Fingerprint {
        (
            self.hashed_address,
            self.block_hash,
            self.block_height,
            self.storage_key,
            self.storage_value,
        )
    }
}

/// A [`RawDiff`] plus the fields the store assigns on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistedDiff {
    /// Monotonically assigned by the store; stable across the diff's
    /// lifetime.
    pub id: i64,
    /// The diff data itself.
    pub raw: RawDiff,
    /// Current lifecycle state.
    pub status: DiffStatus,
    /// Set when this diff originated from the backfill loader rather than a
    /// stream. Orthogonal to `status`.
    pub from_backfill: bool,
}

impl PersistedDiff {
    /// Whether this diff is eligible for the validator's demotion.
    ///
    /// Mirrors `storage_diff_validator.go`'s `isDiffStatusTransformed`: a
    /// diff still in `New` is left alone because nothing has acted on it
    /// yet, so there is nothing to undo.
    pub fn is_demotable(&self) -> bool {
        self.status.can_demote_to_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawDiff {
        RawDiff {
            hashed_address: B256::repeat_byte(0xa1),
            block_hash: B256::repeat_byte(0xb2),
            block_height: 789,
            storage_key: B256::repeat_byte(0x01),
            storage_value: B256::repeat_byte(0x03),
        }
    }

    #[test]
    fn fingerprint_is_all_five_fields() {
        let diff = sample();
        let (addr, block_hash, height, key, value) = diff.fingerprint();
        assert_eq!(addr, diff.hashed_address);
        assert_eq!(block_hash, diff.block_hash);
        assert_eq!(height, diff.block_height);
        assert_eq!(key, diff.storage_key);
        assert_eq!(value, diff.storage_value);
    }

    #[test]
    fn differing_value_changes_fingerprint() {
        let a = sample();
        let mut b = sample();
        b.storage_value = B256::repeat_byte(0x04);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
