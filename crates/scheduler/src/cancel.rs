//! Cancellation tokens for in-flight operations
//!
//! Provides cancellation tokens that allow running operations to be stopped
//! cooperatively. An operation checks whether it has been cancelled at its
//! own suspension points and stops early; nothing is interrupted from the
//! outside.

use crate::Failure;
use futures::task::AtomicWaker;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError,
};
use std::task::{Context, Poll};

/// Cancellation token for cooperative cancellation
///
/// Operations can periodically check `is_cancelled()` (or `checkpoint()`)
/// to determine if they should stop. Multiple tokens can share the same
/// underlying cancellation state via `Clone`.
///
/// Cancellation is advisory: the operation holding the token decides when
/// (and whether) to observe it.
///
/// # Example
///
/// ```
/// use pageview_scheduler::CancellationToken;
///
/// let token = CancellationToken::new();
/// let render_token = token.clone();
///
/// // In the render operation:
/// // if render_token.is_cancelled() {
/// //     return; // Stop early
/// // }
///
/// token.cancel();
/// assert!(render_token.is_cancelled());
/// ```
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

struct Inner {
    cancelled: AtomicBool,
    waker: AtomicWaker,
    children: Mutex<Vec<CancellationToken>>,
}

impl CancellationToken {
    /// Create a new cancellation token
    ///
    /// The token starts in a non-cancelled state.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                waker: AtomicWaker::new(),
                children: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Cancel this token
    ///
    /// All clones of this token observe the cancellation, and every attached
    /// child token is cancelled as well. This operation is idempotent.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }

        self.inner.waker.wake();

        let children = std::mem::take(
            &mut *self.inner.children.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for child in children {
            child.cancel();
        }
    }

    /// Check if this token has been cancelled
    ///
    /// Returns `true` if `cancel()` has been called on this token, any clone,
    /// or a parent it is attached to.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Attach a child token
    ///
    /// Cancelling this token cancels the child. Cancelling the child does not
    /// affect this token. A child attached to an already cancelled token is
    /// cancelled immediately.
    pub fn attach(&self, child: CancellationToken) {
        let mut children = self.inner.children.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_cancelled() {
            drop(children);
            child.cancel();
            return;
        }
        children.push(child);
    }

    /// Create a new token attached to this one
    pub fn child_token(&self) -> CancellationToken {
        let child = CancellationToken::new();
        self.attach(child.clone());
        child
    }

    /// Cancellation checkpoint
    ///
    /// Returns `Err(Failure::Cancelled)` if the token has been cancelled.
    /// Operations call this between units of work.
    pub fn checkpoint(&self) -> Result<(), Failure> {
        if self.is_cancelled() {
            Err(Failure::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Future that resolves once the token is cancelled
    ///
    /// Only the most recently polled waiter is woken; the token is meant to
    /// be awaited by the single operation that owns it.
    pub fn cancelled(&self) -> WaitForCancellation<'_> {
        WaitForCancellation { token: self }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken").field("cancelled", &self.is_cancelled()).finish()
    }
}

/// Future returned by [`CancellationToken::cancelled`]
#[derive(Debug)]
pub struct WaitForCancellation<'a> {
    token: &'a CancellationToken,
}

impl Future for WaitForCancellation<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.token.is_cancelled() {
            return Poll::Ready(());
        }

        self.token.inner.waker.register(cx.waker());

        // Re-check after registering so a concurrent cancel is not missed
        if self.token.is_cancelled() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}
