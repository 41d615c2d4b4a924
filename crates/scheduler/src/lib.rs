//! Pageview Scheduler Library
//!
//! Deferred operations, cooperative cancellation, and fail-fast fan-out.
//!
//! This crate provides the asynchronous building blocks of the page viewer.
//! Every external operation (fetching bytes, loading a document, loading a
//! page, rasterizing a page) is wrapped in an [`AsyncResult`], and groups of
//! per-page operations are combined with [`parallel_join`].
//!
//! Everything here is designed for a single-threaded cooperative executor
//! such as [`futures::executor::LocalPool`]: tasks interleave only at await
//! points, so bookkeeping between suspensions needs no locks.
//!
//! # Example
//!
//! ```
//! use futures::executor::LocalPool;
//! use pageview_scheduler::{parallel_join, AsyncResult, Failure};
//!
//! let mut pool = LocalPool::new();
//!
//! // Fan out three per-page operations, one of which fails
//! let joined = parallel_join(
//!     &pool.spawner(),
//!     vec![
//!         AsyncResult::ok(1),
//!         AsyncResult::err(Failure::render_message(2, "unsupported shading")),
//!         AsyncResult::ok(3),
//!     ],
//! );
//!
//! // The join fails as a whole; no partial results are observable
//! assert!(pool.run_until(joined).is_err());
//! ```

mod cancel;
mod error;
mod join;
mod task;

// Re-export public API
pub use cancel::{CancellationToken, WaitForCancellation};
pub use error::{Cause, Failure};
pub use join::parallel_join;
pub use task::AsyncResult;
