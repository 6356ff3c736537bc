// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

use alloy_primitives::B256;
use alloy_rlp::Decodable;

use crate::error::DecodeError;

/// Decode a wire storage value into a right-aligned, zero-padded 32-byte
/// slot value.
///
/// The wire value is itself a length-prefixed RLP item wrapping the "real"
/// slot bytes (1-32 bytes, big-endian, with leading zero bytes already
/// stripped the way geth's RLP encoder strips them from integers). This
/// mirrors `FromOldGethStateDiff`/`FromNewGethStateDiff` in the source: the
/// outer struct decode hands us the raw bytes of a nested RLP string, which
/// we decode again here, erroring if decoding it leaves trailing bytes.
pub fn decode_storage_value(wrapped: &[u8]) -> Result<B256, DecodeError> {
    let mut buf = wrapped;
    let inner = alloy_primitives::Bytes::decode(&mut buf)?;
    if !buf.is_empty() {
        return Err(DecodeError::TrailingBytes);
    }
    right_align(&inner)
}

/// Right-align `bytes` into a 32-byte array, zero-padding the left.
pub fn right_align(bytes: &[u8]) -> Result<B256, DecodeError> {
    if bytes.len() > 32 {
        return Err(DecodeError::ValueTooLong(bytes.len()));
    }
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(bytes);
    Ok(B256::from(out))
}
