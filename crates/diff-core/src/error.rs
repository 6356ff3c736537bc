// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

/// Errors produced while decoding a wire payload or a CSV row into a
/// [`crate::RawDiff`].
///
/// These are always non-fatal to the caller: a fetcher logs them on its
/// error channel and moves on to the next payload or row.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The outer RLP wrapper around a storage value could not be decoded.
    #[error("rlp error decoding storage value: {0}")]
    Rlp(#[from] alloy_rlp::Error),
    /// The RLP wrapper decoded but left unconsumed bytes behind.
    #[error("rlp: input contains more than one value")]
    TrailingBytes,
    /// The decoded storage value is wider than the 32-byte slot it came from.
    #[error("storage value is {0} bytes, expected at most 32")]
    ValueTooLong(usize),
    /// A CSV row did not have the expected five comma-separated fields.
    #[error("row malformed: expected 5 fields, got {0}")]
    RowMalformed(usize),
    /// A CSV field that should have been a hex string failed to decode.
    #[error("invalid hex in field {field}: {source}")]
    InvalidHex {
        field: &'static str,
        #[source]
        source: hex::FromHexError,
    },
    /// The block height field of a CSV row was not a valid decimal integer.
    #[error("invalid block height: {0}")]
    InvalidBlockHeight(#[from] std::num::ParseIntError),
    /// A fixed-size field did not decode to the expected byte length.
    #[error("field {field} has wrong length: expected {expected}, got {actual}")]
    WrongLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}
