// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

/// Errors talking to the execution node.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The underlying JSON-RPC transport or call failed.
    #[error("rpc error: {0}")]
    Rpc(#[from] jsonrpsee::core::ClientError),
    /// A response did not deserialize into the expected shape.
    #[error("unexpected response shape: {0}")]
    Deserialization(#[from] serde_json::Error),
    /// A hex-encoded field in a response could not be decoded.
    #[error("invalid hex in node response: {0}")]
    Hex(#[from] hex::FromHexError),
    /// A decimal or hex-integer field in a response could not be parsed.
    #[error("invalid integer in node response: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),
    /// The node has no data for the requested block.
    #[error("no data for block {0}")]
    NotFound(i64),
}
