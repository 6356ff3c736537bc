// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

/// Injectable time source for [`crate::Throttler`]: `start`/`elapsed` let
/// the throttler measure how long a call took, `wait_for` is the sleep
/// itself, so tests can substitute a clock that records requested sleeps
/// instead of actually blocking.
#[async_trait]
pub trait Clock: Send + Sync {
    /// A token marking "now"; passed back to `elapsed`.
    fn start(&self) -> Instant;
    /// How long has elapsed since `since`.
    fn elapsed(&self, since: Instant) -> Duration;
    /// Sleep for exactly `duration`. Implementations must treat a zero
    /// duration as a no-op rather than yielding indefinitely.
    async fn wait_for(&self, duration: Duration);
}

/// The real clock: `tokio::time::sleep` under the hood.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn start(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: Instant) -> Duration {
        since.elapsed()
    }

    async fn wait_for(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// A test double that never actually sleeps; it just records every
/// duration it was asked to wait for, in call order.
#[derive(Default)]
pub struct FakeClock {
    requested_waits: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every duration passed to `wait_for`, in call order.
    pub fn requested_waits(&self) -> Vec<Duration> {
        self.requested_waits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn start(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: Instant) -> Duration {
        since.elapsed()
    }

    async fn wait_for(&self, duration: Duration) {
        self.requested_waits.lock().unwrap().push(duration);
    }
}
