// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;

/// Bounded-retry policy for one supervised task.
///
/// `is_expected` classifies an error as "nothing to do" (retry after
/// `retry_interval` without touching the error budget) versus genuinely
/// unexpected (counted; the task gives up once the count exceeds
/// `max_consecutive_unexpected_errors`). This is deliberately a function
/// pointer over the error value rather than a string/message comparison,
/// per the source design's own preference.
#[derive(Clone, Copy)]
pub struct RetryPolicy<E> {
    pub is_expected: fn(&E) -> bool,
    pub max_consecutive_unexpected_errors: u32,
    pub retry_interval: Duration,
}

/// Run `f` in a loop, applying `policy`, until either `quit` is signalled
/// or `f` accumulates more than `policy.max_consecutive_unexpected_errors`
/// consecutive unexpected errors (in which case that error is returned).
///
/// Any success resets the consecutive-error count to zero. There is no
/// mid-call cancellation: `quit` is only observed between iterations, so
/// `f` must itself be short-lived.
pub async fn supervise<E, F, Fut>(
    mut f: F,
    policy: RetryPolicy<E>,
    mut quit: watch::Receiver<bool>,
) -> Result<(), E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    let mut consecutive_unexpected = 0u32;
    loop {
        if *quit.borrow() {
            return Ok(());
        }

        match f().await {
            Ok(()) => {
                consecutive_unexpected = 0;
            }
            Err(e) if (policy.is_expected)(&e) => {
                tokio::time::sleep(policy.retry_interval).await;
            }
            Err(e) => {
                consecutive_unexpected += 1;
                if consecutive_unexpected > policy.max_consecutive_unexpected_errors {
                    return Err(e);
                }
            }
        }
    }
}

/// Runs an extractor task and a delegator task in parallel, each under its
/// own [`supervise`] loop, and returns as soon as either one gives up.
///
/// Closes the shared quit signal before returning so the other task stops
/// on its next loop iteration; does not wait for it to actually do so,
/// matching the source's "no mid-call cancellation" design (the process
/// exiting after this returns is what actually reclaims the other task).
pub async fn run<E, F1, Fut1, F2, Fut2>(
    extractor: F1,
    extractor_policy: RetryPolicy<E>,
    delegator: F2,
    delegator_policy: RetryPolicy<E>,
) -> E
where
    F1: FnMut() -> Fut1 + Send + 'static,
    Fut1: Future<Output = Result<(), E>> + Send,
    F2: FnMut() -> Fut2 + Send + 'static,
    Fut2: Future<Output = Result<(), E>> + Send,
    E: Send + 'static,
{
    let (quit_tx, quit_rx1) = watch::channel(false);
    let quit_rx2 = quit_rx1.clone();

    let mut extractor_handle = tokio::spawn(supervise(extractor, extractor_policy, quit_rx1));
    let mut delegator_handle = tokio::spawn(supervise(delegator, delegator_policy, quit_rx2));

    let result = tokio::select! {
        res = &mut extractor_handle => res.expect("extractor task panicked"),
        res = &mut delegator_handle => res.expect("delegator task panicked"),
    };

    let _ = quit_tx.send(true);

    match result {
        Ok(()) => unreachable!("supervise only returns Ok(()) after quit is signalled, which nothing does before this point"),
        Err(e) => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn policy(is_expected: fn(&&'static str) -> bool) -> RetryPolicy<&'static str> {
        RetryPolicy {
            is_expected,
            max_consecutive_unexpected_errors: 2,
            retry_interval: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn expected_errors_never_count_against_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();
        let (_quit_tx, quit_rx) = watch::channel(false);

        let f = move || {
            let calls = calls2.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 5 {
                    Err("nothing to do")
                } else {
                    Ok(())
                }
            }
        };

        let result = tokio::time::timeout(
            Duration::from_secs(1),
            supervise(f, policy(|_| true), quit_rx),
        )
        .await;
        // supervise never returns on its own here (quit never signalled),
        // so this should time out rather than resolve.
        assert!(result.is_err());
        assert!(calls.load(Ordering::SeqCst) >= 5);
    }

    #[tokio::test]
    async fn unexpected_errors_exceed_budget_and_return() {
        let (_quit_tx, quit_rx) = watch::channel(false);
        let f = || async { Err::<(), _>("boom") };

        let result = supervise(f, policy(|_| false), quit_rx).await;
        assert_eq!(result, Err("boom"));
    }

    #[tokio::test]
    async fn success_resets_the_counter() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();
        let (_quit_tx, quit_rx) = watch::channel(false);

        // Pattern: fail, fail, succeed, fail, fail, fail (budget is 2) -> the
        // success in between means the final run is what exceeds budget.
        let f = move || {
            let calls = calls2.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                match n {
                    2 => Ok(()),
                    _ => Err("boom"),
                }
            }
        };

        let result = supervise(f, policy(|_| false), quit_rx).await;
        assert_eq!(result, Err("boom"));
        // 2 fails, 1 success, then 3 more fails before exceeding budget of 2.
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn run_returns_first_unexpected_error_and_stops_the_other() {
        let other_calls = Arc::new(AtomicU32::new(0));
        let other_calls2 = other_calls.clone();

        let extractor = || async { Err::<(), _>("fatal") };
        let delegator = move || {
            let other_calls = other_calls2.clone();
            async move {
                other_calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(())
            }
        };

        let err = run(
            extractor,
            policy(|_| false),
            delegator,
            policy(|_| true),
        )
        .await;
        assert_eq!(err, "fatal");
    }
}
