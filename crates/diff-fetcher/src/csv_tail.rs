// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

use std::path::Path;
use std::time::Duration;

use diff_core::RawDiff;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tokio::sync::mpsc;

use crate::error::FetchError;

/// Follow a CSV file one appended row at a time, parsing each complete
/// line into a [`RawDiff`] and pushing it onto `out_diffs`.
///
/// There is no filesystem-watch primitive in play here: this polls the
/// file's length every `poll_interval` and reads whatever bytes were
/// appended since the last poll, the way the source's `hpcloud/tail`
/// dependency follows a growing file without inotify. A row that fails to
/// parse (wrong field count, bad hex, non-numeric height) is pushed onto
/// `out_errors`; the tailer keeps following the file.
pub async fn tail_csv_diffs(
    path: impl AsRef<Path>,
    poll_interval: Duration,
    liveness_marker_path: Option<&Path>,
    out_diffs: &mpsc::Sender<RawDiff>,
    out_errors: &mpsc::Sender<FetchError>,
) -> Result<(), FetchError> {
    let path = path.as_ref();
    let mut file = tokio::fs::File::open(path).await?;

    if let Some(marker) = liveness_marker_path {
        diff_watcher::write_marker(marker).await?;
    }

    let mut offset: u64 = 0;
    let mut leftover = String::new();

    loop {
        let len = file.metadata().await?.len();
        if len > offset {
            file.seek(SeekFrom::Start(offset)).await?;
            let mut buf = Vec::with_capacity((len - offset) as usize);
            file.read_to_end(&mut buf).await?;
            offset = len;
            leftover.push_str(&String::from_utf8_lossy(&buf));

            while let Some(newline_at) = leftover.find('\n') {
                let line = leftover[..newline_at].to_string();
                leftover.drain(..=newline_at);
                if line.trim().is_empty() {
                    continue;
                }
                match diff_core::parse_line(&line) {
                    Ok(diff) => {
                        if out_diffs.send(diff).await.is_err() {
                            return Ok(());
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, row = %line, "failed to parse csv row, skipping");
                        let _ = out_errors.send(FetchError::Decode(e)).await;
                    }
                }
            }
        }
        tokio::time::sleep(poll_interval).await;
    }
}
