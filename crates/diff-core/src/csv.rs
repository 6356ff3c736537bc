// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

//! Parsing for the Parity `--tracing` CSV export format: one storage
//! mutation per line, `contract_address,block_hash,block_height,storage_key,storage_value`.

use alloy_primitives::{keccak256, B256};

use crate::error::DecodeError;
use crate::raw_diff::RawDiff;

const FIELD_COUNT: usize = 5;

/// Parse one already-split CSV row into a [`RawDiff`].
///
/// Unlike the wire codecs, CSV fields are plain hex strings with no RLP
/// wrapping: `storage_key` and `storage_value` are hex-decoded directly
/// into a right-aligned 32-byte value, and `contract_address` is
/// hex-decoded then keccak-256 hashed.
pub fn parse_row(fields: &[&str]) -> Result<RawDiff, DecodeError> {
    if fields.len() != FIELD_COUNT {
        return Err(DecodeError::RowMalformed(fields.len()));
    }
    let [contract_address, block_hash, block_height, storage_key, storage_value] =
        [fields[0], fields[1], fields[2], fields[3], fields[4]];

    let address_bytes = decode_hex_field("contract_address", contract_address)?;
    let hashed_address = keccak256(&address_bytes);
    let block_hash = hash_from_hex_field("block_hash", block_hash)?;
    let block_height: i64 = block_height.parse()?;
    let storage_key = hash_from_hex_field("storage_key", storage_key)?;
    let storage_value = hash_from_hex_field("storage_value", storage_value)?;

    Ok(RawDiff {
        hashed_address,
        block_hash,
        block_height,
        storage_key,
        storage_value,
    })
}

/// Parse one already-split CSV row into a [`RawDiff`], splitting a raw
/// line on commas first.
pub fn parse_line(line: &str) -> Result<RawDiff, DecodeError> {
    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(',').collect();
    parse_row(&fields)
}

fn decode_hex_field(field: &'static str, value: &str) -> Result<Vec<u8>, DecodeError> {
    let trimmed = value.strip_prefix("0x").unwrap_or(value);
    // Mirrors `common.FromHex`: an odd number of hex digits is left-padded
    // with a zero nibble rather than rejected.
    if trimmed.len() % 2 == 1 {
        let padded = format!("0{trimmed}");
        return hex::decode(padded).map_err(|source| DecodeError::InvalidHex { field, source });
    }
    hex::decode(trimmed).map_err(|source| DecodeError::InvalidHex { field, source })
}

/// Decode a hex field into a right-aligned, zero-padded 32-byte hash, the
/// way `common.HexToHash` does in the source: longer inputs are truncated
/// from the left, shorter ones zero-padded on the left.
fn hash_from_hex_field(field: &'static str, value: &str) -> Result<B256, DecodeError> {
    let bytes = decode_hex_field(field, value)?;
    let mut out = [0u8; 32];
    if bytes.len() >= 32 {
        out.copy_from_slice(&bytes[bytes.len() - 32..]);
    } else {
        out[32 - bytes.len()..].copy_from_slice(&bytes);
    }
    Ok(B256::from(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_row() {
        let row = parse_row(&["0x123", "0x456", "789", "0x987", "0x654"]).unwrap();
        assert_eq!(row.hashed_address, keccak256(hex::decode("0123").unwrap()));
        assert_eq!(row.block_height, 789);
        let mut expected_block_hash = [0u8; 32];
        expected_block_hash[31] = 0x56;
        expected_block_hash[30] = 0x04;
        assert_eq!(row.block_hash, B256::from(expected_block_hash));
    }

    #[test]
    fn rejects_short_row() {
        let err = parse_row(&["0x123"]).unwrap_err();
        assert!(matches!(err, DecodeError::RowMalformed(1)));
    }

    #[test]
    fn rejects_malformed_block_height() {
        let err = parse_row(&["", "", "", "", ""]).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidBlockHeight(_)));
    }

    #[test]
    fn parse_line_splits_on_commas() {
        let row = parse_line("0x123,0x456,789,0x987,0x654\n").unwrap();
        assert_eq!(row.block_height, 789);
    }
}
