// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

use diff_core::RawDiff;
use diff_db::{DiffRepository, InsertOutcome};
use diff_fetcher::FetchError;
use tokio::sync::mpsc;

use crate::error::ExtractError;

/// The single reader between a fetcher and the diff repository: drains
/// `diffs` forever, persisting each one, and drains `errors` alongside it,
/// logging transient fetch errors and aborting on a fatal one.
///
/// Returns `Ok(())` once both channels have closed (the fetcher is done
/// and will produce nothing further); returns `Err` the moment the
/// repository itself fails or the fetcher reports a fatal error.
pub async fn extract<R: DiffRepository>(
    mut diffs: mpsc::Receiver<RawDiff>,
    mut errors: mpsc::Receiver<FetchError>,
    repo: &R,
) -> Result<(), ExtractError> {
    let mut diffs_open = true;
    let mut errors_open = true;

    loop {
        if !diffs_open && !errors_open {
            return Ok(());
        }

        tokio::select! {
            maybe_diff = diffs.recv(), if diffs_open => {
                match maybe_diff {
                    Some(raw) => {
                        match repo.create_storage_diff(&raw).await? {
                            InsertOutcome::Inserted(id) => {
                                tracing::trace!(id, block_height = raw.block_height, "persisted storage diff");
                            }
                            InsertOutcome::AlreadyExists => {
                                tracing::trace!(block_height = raw.block_height, "storage diff already persisted");
                            }
                        }
                    }
                    None => diffs_open = false,
                }
            }
            maybe_err = errors.recv(), if errors_open => {
                match maybe_err {
                    Some(e) if e.is_fatal() => return Err(ExtractError::Fetcher(e)),
                    Some(e) => tracing::warn!(error = %e, "transient fetch error"),
                    None => errors_open = false,
                }
            }
        }
    }
}
