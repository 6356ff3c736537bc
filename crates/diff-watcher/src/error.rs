// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

/// Errors writing the liveness marker file.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("writing liveness marker to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
