// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

use std::path::Path;

use crate::error::Error;

/// Write the one-time liveness marker a subsystem writes once it has
/// completed startup (opened its subscription, established its tailer).
/// Presence of the file with non-empty contents is the external readiness
/// signal; the content itself carries no meaning beyond "not empty".
pub async fn write_marker(path: &Path) -> Result<(), Error> {
    tokio::fs::write(path, b"ok")
        .await
        .map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_nonempty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("liveness");
        write_marker(&path).await.unwrap();
        let contents = tokio::fs::read(&path).await.unwrap();
        assert!(!contents.is_empty());
    }
}
