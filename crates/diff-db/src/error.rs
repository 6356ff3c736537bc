// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

/// Errors surfaced by a [`crate::DiffRepository`] or [`crate::HeaderRepository`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The header a diff insert referenced does not exist yet. Common at
    /// the chain tip when headers lag diffs; callers decide whether that's
    /// expected.
    #[error("referenced header does not exist")]
    MissingHeader,
    /// Any other database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
