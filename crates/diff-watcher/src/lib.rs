// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

//! The two-task supervised event-watcher skeleton, a clock-injected
//! throttler, and the liveness-marker writer: the ambient concurrency
//! primitives `diff-fetcher`, `diff-pipeline` and `diff-cli` are built on.

mod clock;
mod error;
mod liveness;
mod supervisor;
mod throttle;

pub use clock::{Clock, FakeClock, SystemClock};
pub use error::Error;
pub use liveness::write_marker;
pub use supervisor::{run, supervise, RetryPolicy};
pub use throttle::Throttler;
