// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

//! `sqlx`-backed Postgres implementations of [`crate::HeaderRepository`]
//! and [`crate::DiffRepository`].

mod diff_repository;
mod header_repository;

pub use diff_repository::PostgresDiffRepository;
pub use header_repository::PostgresHeaderRepository;

use sqlx::error::ErrorKind;

use crate::error::Error;

/// Translate a raw `sqlx::Error` the way both repositories need to:
/// a foreign-key violation becomes `Error::MissingHeader`, everything else
/// is wrapped verbatim.
fn classify_write_error(err: sqlx::Error) -> Error {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.kind() == ErrorKind::ForeignKeyViolation {
            return Error::MissingHeader;
        }
    }
    Error::Database(err)
}
