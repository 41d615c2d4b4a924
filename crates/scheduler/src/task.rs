//! Deferred, cancelable, possibly-failing computations
//!
//! [`AsyncResult`] wraps every external asynchronous primitive (byte fetch,
//! document load, page load, render) behind one shape: a local future that
//! yields `Result<T, Failure>`, optionally paired with a cancellation token.

use crate::{CancellationToken, Failure};
use futures::future::{self, FutureExt, LocalBoxFuture};
use futures::task::{LocalSpawn, LocalSpawnExt};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A deferred computation that either succeeds with `T` or fails
///
/// The computation does not make progress until it is polled, either by
/// awaiting it or by handing it to [`AsyncResult::run`].
///
/// Cancellation is best-effort: [`AsyncResult::cancel`] signals the token the
/// underlying operation was created with, and the operation decides when to
/// observe it. A late completion is not suppressed here; consumers that may
/// have been superseded must discard stale results themselves.
///
/// # Example
///
/// ```
/// use futures::executor::LocalPool;
/// use pageview_scheduler::AsyncResult;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let mut pool = LocalPool::new();
/// let seen = Rc::new(Cell::new(0));
///
/// let sink = Rc::clone(&seen);
/// AsyncResult::new(async { Ok(21 * 2) })
///     .run(&pool.spawner(), move |value| sink.set(value), |_| {})
///     .unwrap();
///
/// pool.run_until_stalled();
/// assert_eq!(seen.get(), 42);
/// ```
pub struct AsyncResult<T> {
    future: LocalBoxFuture<'static, Result<T, Failure>>,
    token: Option<CancellationToken>,
}

impl<T: 'static> AsyncResult<T> {
    /// Wrap a future that cannot be cancelled
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, Failure>> + 'static,
    {
        Self { future: future.boxed_local(), token: None }
    }

    /// Wrap a future that observes `token`
    pub fn cancelable<F>(future: F, token: CancellationToken) -> Self
    where
        F: Future<Output = Result<T, Failure>> + 'static,
    {
        Self { future: future.boxed_local(), token: Some(token) }
    }

    /// An already-succeeded result
    pub fn ok(value: T) -> Self {
        Self::new(future::ready(Ok(value)))
    }

    /// An already-failed result
    pub fn err(failure: Failure) -> Self {
        Self::new(future::ready(Err(failure)))
    }

    /// Transform the success value, keeping the cancellation token
    pub fn map<U, F>(self, f: F) -> AsyncResult<U>
    where
        U: 'static,
        F: FnOnce(T) -> U + 'static,
    {
        AsyncResult { future: self.future.map(|result| result.map(f)).boxed_local(), token: self.token }
    }

    /// The token this computation observes, if it can be cancelled
    pub fn token(&self) -> Option<&CancellationToken> {
        self.token.as_ref()
    }

    /// Request cancellation of the underlying operation
    ///
    /// A no-op for computations created without a token.
    pub fn cancel(&self) {
        if let Some(token) = &self.token {
            token.cancel();
        }
    }

    /// Start the computation on `spawner`
    ///
    /// Exactly one of `on_success` / `on_failure` is invoked, once, when the
    /// computation settles. If the task cannot be spawned, neither callback
    /// runs and a [`Failure::Spawn`] is returned instead.
    pub fn run<S, OnSuccess, OnFailure>(
        self,
        spawner: &S,
        on_success: OnSuccess,
        on_failure: OnFailure,
    ) -> Result<(), Failure>
    where
        S: LocalSpawn + ?Sized,
        OnSuccess: FnOnce(T) + 'static,
        OnFailure: FnOnce(Failure) + 'static,
    {
        spawner
            .spawn_local(async move {
                match self.await {
                    Ok(value) => on_success(value),
                    Err(failure) => on_failure(failure),
                }
            })
            .map_err(Failure::spawn)
    }
}

impl<T> Future for AsyncResult<T> {
    type Output = Result<T, Failure>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.future.as_mut().poll(cx)
    }
}

impl<T> fmt::Debug for AsyncResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncResult").field("token", &self.token).finish_non_exhaustive()
    }
}
