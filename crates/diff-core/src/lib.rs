// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

//! Normalized data model, wire codecs and CSV row parsing for storage
//! diffs, shared by every other crate in the workspace.
//!
//! This crate has no I/O: everything here is pure decoding and the plain
//! data types the rest of the pipeline passes around.

mod codec;
mod csv;
mod error;
mod raw_diff;
mod status;

pub use codec::{decode_storage_value, right_align, DecodePayload, V1Codec, V2Codec, V3Codec};
pub use csv::{parse_line, parse_row};
pub use error::DecodeError;
pub use raw_diff::{Fingerprint, PersistedDiff, RawDiff};
pub use status::DiffStatus;
