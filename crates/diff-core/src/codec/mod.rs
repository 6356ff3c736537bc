// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

//! Decoders for the three historically distinct wire encodings of a geth
//! `statediff` payload, each normalized to a flat `Vec<RawDiff>`.
//!
//! A single trait, [`DecodePayload`], has three implementations, one per
//! wire variant, so the fetcher never has to match on a variant tag at
//! decode time; it is simply generic (or dynamic, via `Box<dyn
//! DecodePayload>`) over whichever codec it was constructed with.

mod value;

pub use value::{decode_storage_value, right_align};

use alloy_primitives::{keccak256, Bytes, B256};
use alloy_rlp::{Decodable, RlpDecodable};

use crate::error::DecodeError;
use crate::raw_diff::RawDiff;

#[derive(Debug, Clone, RlpDecodable)]
struct StorageDiffWire {
    key: Bytes,
    value: Bytes,
}

#[derive(Debug, Clone, RlpDecodable)]
struct AccountDiffWire {
    key: Bytes,
    value: Bytes,
    storage: Vec<StorageDiffWire>,
}

/// Wire shape used by the newest ("filter-event") encoding: a flat
/// structure carrying only the updated-accounts list.
#[derive(Debug, Clone, RlpDecodable)]
struct FlatStateDiffWire {
    block_number: u64,
    block_hash: B256,
    updated_accounts: Vec<AccountDiffWire>,
}

/// Wire shape used by the original ("old account-diff") encoding: three
/// parallel lists of created/updated/deleted accounts.
#[derive(Debug, Clone, RlpDecodable)]
struct NestedStateDiffWire {
    block_number: u64,
    block_hash: B256,
    created_accounts: Vec<AccountDiffWire>,
    updated_accounts: Vec<AccountDiffWire>,
    deleted_accounts: Vec<AccountDiffWire>,
}

impl NestedStateDiffWire {
    /// Flatten the three account lists into one, in the same order the
    /// original converter used (updated, then created, then deleted).
    fn flattened_accounts(self) -> Vec<AccountDiffWire> {
        let mut accounts = self.updated_accounts;
        accounts.extend(self.created_accounts);
        accounts.extend(self.deleted_accounts);
        accounts
    }
}

/// Decodes a single wire payload into zero or more [`RawDiff`]s.
///
/// Implementors must not leak their wire-format details beyond this
/// interface: callers only ever see [`RawDiff`] out the other end.
pub trait DecodePayload {
    /// Decode one payload's worth of bytes, in the account-then-storage
    /// traversal order the payload itself carries them in.
    fn decode(&self, bytes: &[u8]) -> Result<Vec<RawDiff>, DecodeError>;
}

fn diffs_from_accounts(
    accounts: Vec<AccountDiffWire>,
    block_hash: B256,
    block_height: i64,
    hash_address: impl Fn(&[u8]) -> Result<B256, DecodeError>,
) -> Result<Vec<RawDiff>, DecodeError> {
    let mut out = Vec::new();
    for account in accounts {
        let hashed_address = hash_address(&account.key)?;
        for storage in account.storage {
            let storage_key = right_align(&storage.key)?;
            let storage_value = decode_storage_value(&storage.value)?;
            out.push(RawDiff {
                hashed_address,
                block_hash,
                block_height,
                storage_key,
                storage_value,
            });
        }
    }
    Ok(out)
}

/// The original ("old geth patch") encoding: three parallel account lists,
/// a pre-hashed 32-byte account key used verbatim as `hashed_address`.
#[derive(Debug, Clone, Copy, Default)]
pub struct V1Codec;

impl DecodePayload for V1Codec {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<RawDiff>, DecodeError> {
        let mut buf = bytes;
        let wire = NestedStateDiffWire::decode(&mut buf)?;
        let block_hash = wire.block_hash;
        let block_height = wire.block_number as i64;
        let accounts = wire.flattened_accounts();
        diffs_from_accounts(accounts, block_hash, block_height, |key| right_align(key))
    }
}

/// The service-emitted encoding: same wire shape as V1, but only the
/// updated-accounts list is populated, and the key field holds a raw
/// 20-byte account address that must be keccak-256 hashed.
#[derive(Debug, Clone, Copy, Default)]
pub struct V2Codec;

impl DecodePayload for V2Codec {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<RawDiff>, DecodeError> {
        let mut buf = bytes;
        let wire = NestedStateDiffWire::decode(&mut buf)?;
        let block_hash = wire.block_hash;
        let block_height = wire.block_number as i64;
        diffs_from_accounts(wire.updated_accounts, block_hash, block_height, |key| {
            Ok(keccak256(key))
        })
    }
}

/// The filter-event encoding: a flat structure, only updated accounts,
/// address stored raw and keccak-256 hashed by this codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct V3Codec;

impl DecodePayload for V3Codec {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<RawDiff>, DecodeError> {
        let mut buf = bytes;
        let wire = FlatStateDiffWire::decode(&mut buf)?;
        let block_hash = wire.block_hash;
        let block_height = wire.block_number as i64;
        diffs_from_accounts(wire.updated_accounts, block_hash, block_height, |key| {
            Ok(keccak256(key))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_rlp::Encodable;

    fn encode<T: Encodable>(value: &T) -> Vec<u8> {
        let mut out = Vec::new();
        value.encode(&mut out);
        out
    }

    fn rlp_wrapped_value(bytes: &[u8]) -> Bytes {
        let mut out = Vec::new();
        Bytes::copy_from_slice(bytes).encode(&mut out);
        Bytes::from(out)
    }

    #[test]
    fn v3_decodes_one_updated_account_one_slot() {
        let storage = StorageDiffWire {
            key: Bytes::copy_from_slice(&[0u8; 32]),
            value: rlp_wrapped_value(&[3]),
        };
        let account = AccountDiffWire {
            key: Bytes::copy_from_slice(&[0xABu8; 20]),
            value: Bytes::new(),
            storage: vec![storage],
        };
        let wire = FlatStateDiffWire {
            block_number: 789,
            block_hash: B256::repeat_byte(0x22),
            updated_accounts: vec![account],
        };
        let bytes = encode(&wire);

        let diffs = V3Codec.decode(&bytes).unwrap();
        assert_eq!(diffs.len(), 1);
        let diff = diffs[0];
        assert_eq!(diff.hashed_address, keccak256([0xABu8; 20]));
        assert_eq!(diff.block_height, 789);
        let mut expected_value = [0u8; 32];
        expected_value[31] = 3;
        assert_eq!(diff.storage_value, B256::from(expected_value));
    }

    #[test]
    fn v1_flattens_all_three_lists_and_uses_key_verbatim() {
        let make_account = |key_byte: u8| AccountDiffWire {
            key: Bytes::copy_from_slice(&[key_byte; 32]),
            value: Bytes::new(),
            storage: vec![StorageDiffWire {
                key: Bytes::copy_from_slice(&[1u8; 32]),
                value: rlp_wrapped_value(&[9]),
            }],
        };
        let wire = NestedStateDiffWire {
            block_number: 1,
            block_hash: B256::repeat_byte(0x33),
            created_accounts: vec![make_account(0x01)],
            updated_accounts: vec![make_account(0x02)],
            deleted_accounts: vec![make_account(0x03)],
        };
        let bytes = encode(&wire);

        let diffs = V1Codec.decode(&bytes).unwrap();
        assert_eq!(diffs.len(), 3);
        // updated, then created, then deleted.
        assert_eq!(diffs[0].hashed_address, B256::repeat_byte(0x02));
        assert_eq!(diffs[1].hashed_address, B256::repeat_byte(0x01));
        assert_eq!(diffs[2].hashed_address, B256::repeat_byte(0x03));
    }

    #[test]
    fn v2_hashes_raw_address_on_old_wire_shape() {
        let account = AccountDiffWire {
            key: Bytes::copy_from_slice(&[0xCDu8; 20]),
            value: Bytes::new(),
            storage: vec![StorageDiffWire {
                key: Bytes::copy_from_slice(&[2u8; 32]),
                value: rlp_wrapped_value(&[7]),
            }],
        };
        let wire = NestedStateDiffWire {
            block_number: 42,
            block_hash: B256::repeat_byte(0x44),
            created_accounts: vec![],
            updated_accounts: vec![account],
            deleted_accounts: vec![],
        };
        let bytes = encode(&wire);

        let diffs = V2Codec.decode(&bytes).unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].hashed_address, keccak256([0xCDu8; 20]));
    }
}
