//! Fail-fast parallel join
//!
//! Fans a fixed set of [`AsyncResult`]s out as independent tasks and folds
//! their outcomes back into one [`AsyncResult`]: either every value in input
//! order, or the first failure to arrive.

use crate::{AsyncResult, CancellationToken, Failure};
use futures::task::{LocalSpawn, LocalSpawnExt};
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Run every branch concurrently and join the results
///
/// All branches are spawned on `spawner` immediately, so they make progress
/// whether or not the returned result is ever awaited. The joined result
/// resolves to:
///
/// * `Ok(values)` once every branch has succeeded, with `values[i]` taken
///   from `branches[i]` regardless of completion order;
/// * `Err(failure)` as soon as any branch fails. "First" is by arrival, so
///   with equal latencies the reported failure may differ between runs.
///
/// Branches still outstanding after a failure keep running to completion;
/// their outcomes are dropped without touching the joined result.
///
/// Cancelling the joined result cancels every branch token.
///
/// # Example
///
/// ```
/// use futures::executor::LocalPool;
/// use pageview_scheduler::{parallel_join, AsyncResult};
///
/// let mut pool = LocalPool::new();
/// let joined = parallel_join(
///     &pool.spawner(),
///     vec![AsyncResult::ok(1), AsyncResult::ok(2), AsyncResult::ok(3)],
/// );
///
/// assert_eq!(pool.run_until(joined).unwrap(), vec![1, 2, 3]);
/// ```
pub fn parallel_join<T, S>(spawner: &S, branches: Vec<AsyncResult<T>>) -> AsyncResult<Vec<T>>
where
    T: 'static,
    S: LocalSpawn + ?Sized,
{
    if branches.is_empty() {
        return AsyncResult::ok(Vec::new());
    }

    let token = CancellationToken::new();
    let state = Rc::new(RefCell::new(JoinState::new(branches.len())));

    for (index, branch) in branches.into_iter().enumerate() {
        if let Some(branch_token) = branch.token() {
            token.attach(branch_token.clone());
        }

        let branch_state = Rc::clone(&state);
        let spawned = spawner.spawn_local(async move {
            let outcome = branch.await;
            branch_state.borrow_mut().settle(index, outcome);
        });

        if let Err(error) = spawned {
            state.borrow_mut().settle(index, Err(Failure::spawn(error)));
        }
    }

    AsyncResult::cancelable(Join { state }, token)
}

/// Shared result array plus failure latch for one join invocation
struct JoinState<T> {
    values: Vec<Option<T>>,
    remaining: usize,
    failure: Option<Failure>,
    resolved: bool,
    waker: Option<Waker>,
}

impl<T> JoinState<T> {
    fn new(len: usize) -> Self {
        Self {
            values: (0..len).map(|_| None).collect(),
            remaining: len,
            failure: None,
            resolved: false,
            waker: None,
        }
    }

    fn latched(&self) -> bool {
        self.resolved || self.failure.is_some()
    }

    fn settle(&mut self, index: usize, outcome: Result<T, Failure>) {
        if self.latched() {
            log::trace!("join branch {index} settled after the join resolved; ignored");
            return;
        }

        match outcome {
            Ok(value) => {
                self.values[index] = Some(value);
                self.remaining -= 1;
            }
            Err(failure) => {
                log::debug!("join branch {index} failed: {failure}");
                self.failure = Some(failure);
            }
        }

        if let Some(waker) = self.waker.take() {
            waker.wake();
        }
    }
}

struct Join<T> {
    state: Rc<RefCell<JoinState<T>>>,
}

impl<T> Future for Join<T> {
    type Output = Result<Vec<T>, Failure>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.state.borrow_mut();

        if state.resolved {
            return Poll::Pending;
        }

        if let Some(failure) = state.failure.take() {
            state.resolved = true;
            return Poll::Ready(Err(failure));
        }

        if state.remaining == 0 {
            state.resolved = true;
            let values: Vec<T> = state.values.drain(..).flatten().collect();
            return Poll::Ready(Ok(values));
        }

        state.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}
