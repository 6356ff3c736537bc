// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

use alloy_primitives::B256;

/// A header's `hash` column, as stored, failed to parse as 32 bytes of hex.
pub(crate) enum HashParseError {
    InvalidHex(String, hex::FromHexError),
    WrongLength(String),
}

/// Parse a `0x`-prefixed (or bare) hex string into a [`B256`], the way
/// every consumer of [`diff_db::Header::hash`] needs to before comparing it
/// against a [`diff_core::RawDiff::block_hash`].
pub(crate) fn parse_header_hash(hash: &str) -> Result<B256, HashParseError> {
    let trimmed = hash.strip_prefix("0x").unwrap_or(hash);
    let bytes = hex::decode(trimmed).map_err(|source| HashParseError::InvalidHex(hash.to_string(), source))?;
    B256::try_from(bytes.as_slice()).map_err(|_| HashParseError::WrongLength(hash.to_string()))
}
