// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

//! The streaming (V1/V2/V3) and CSV-tail fetchers: both normalize their
//! source into [`diff_core::RawDiff`] values pushed onto a channel, with
//! decode errors surfaced on a second channel rather than aborting the run.

mod csv_tail;
mod error;
mod streaming;

pub use csv_tail::tail_csv_diffs;
pub use error::FetchError;
pub use streaming::fetch_storage_diffs;
