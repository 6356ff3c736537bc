// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

//! The diff extractor, the backfill loader, and the sliding-window
//! validator: everything downstream of a fetcher's channels and a
//! [`diff_db::DiffRepository`]/[`diff_db::HeaderRepository`] pair.

mod backfill;
mod error;
mod extract;
mod hash;
mod validate;

pub use backfill::{backfill, BackfillReport, BackfillTarget};
pub use error::{BackfillError, ExtractError, ValidateError};
pub use extract::extract;
pub use validate::{run_periodic, validate_once, ValidationReport, ValidatorConfig};
