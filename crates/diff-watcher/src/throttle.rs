// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

use std::future::Future;
use std::time::Duration;

use crate::clock::Clock;

/// Wraps a callback so that the call plus the sleep that follows it
/// together take at least `min_time`, smoothing out bursts of fast calls
/// against a rate limit without ever delaying a call that already took
/// long enough on its own.
pub struct Throttler<C> {
    clock: C,
    min_time: Duration,
}

impl<C: Clock> Throttler<C> {
    pub fn new(clock: C, min_time: Duration) -> Self {
        Self { clock, min_time }
    }

    /// Run `f`, then sleep just long enough that `f`'s own runtime plus the
    /// sleep add up to `min_time`. If `f` alone took `min_time` or longer,
    /// no sleep happens at all; the duration handed to the clock is never
    /// negative.
    pub async fn call<F, Fut, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let start = self.clock.start();
        let result = f().await;
        let elapsed = self.clock.elapsed(start);
        let remaining = self.min_time.saturating_sub(elapsed);
        self.clock.wait_for(remaining).await;
        result
    }
}
