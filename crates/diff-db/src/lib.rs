// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

//! Diff and header persistence: repository traits plus a `sqlx`-backed
//! Postgres implementation of each.

mod diff_repository;
mod error;
mod header;
pub mod mock;
pub mod postgres;

pub use diff_repository::{DiffRepository, InsertOutcome};
pub use error::Error;
pub use header::{Header, HeaderRepository, REORG_WINDOW};
pub use mock::{InMemoryDiffRepository, InMemoryHeaderRepository};
