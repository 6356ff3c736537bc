// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

/// Errors a fetcher can surface, whether on `out_errors` (transient) or as
/// its terminal `Result` (fatal).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FetchError {
    /// One payload or CSV row failed to decode. Transient: the fetcher
    /// pushes this on `out_errors` and moves on to the next payload/row.
    #[error("decoding payload: {0}")]
    Decode(#[from] diff_core::DecodeError),
    /// The node returned an error on the subscription stream, or the
    /// initial subscribe call itself failed. Fatal.
    #[error("node error: {0}")]
    Node(#[from] diff_node::Error),
    /// An I/O failure following the CSV tail file. Fatal.
    #[error("reading csv tail: {0}")]
    Io(#[from] std::io::Error),
    /// Writing the startup liveness marker failed. Fatal.
    #[error("writing liveness marker: {0}")]
    Liveness(#[from] diff_watcher::Error),
    /// The terminal condition returned from a fetcher task after a fatal
    /// error was pushed on `out_errors`; carries that error's message so
    /// the caller doesn't need a second handle on the original value.
    #[error("subscription terminated: {0}")]
    Terminated(String),
}

impl FetchError {
    /// `true` for errors that end the fetcher task; `false` for
    /// per-payload/per-row errors the fetcher logs and continues past.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, FetchError::Decode(_))
    }
}
