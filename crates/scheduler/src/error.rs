//! Failure taxonomy shared by every deferred operation
//!
//! All failure sources (byte fetch, document load, page load, render) are
//! normalized into one [`Failure`] type carrying a human-readable message and
//! the underlying cause, so callers can join and report them uniformly.

use std::error::Error;
use std::sync::Arc;

/// Shared handle to the original error behind a failure
///
/// Stored behind an `Arc` so failures stay `Clone` and can be handed to
/// several observers.
pub type Cause = Arc<dyn Error + Send + Sync + 'static>;

/// Failure of a deferred operation
#[derive(Debug, Clone, thiserror::Error)]
pub enum Failure {
    /// The raw document bytes could not be retrieved
    #[error("failed to fetch document: {message}")]
    Fetch {
        message: String,
        #[source]
        cause: Option<Cause>,
    },

    /// The document source rejected the bytes
    #[error("failed to load document: {message}")]
    DocumentLoad {
        message: String,
        #[source]
        cause: Option<Cause>,
    },

    /// A page handle could not be obtained (1-based page number)
    #[error("failed to load page {page}: {message}")]
    PageLoad {
        page: usize,
        message: String,
        #[source]
        cause: Option<Cause>,
    },

    /// Rasterization of a page failed (1-based page number)
    #[error("failed to render page {page}: {message}")]
    Render {
        page: usize,
        message: String,
        #[source]
        cause: Option<Cause>,
    },

    /// The operation observed a cancellation request
    #[error("operation was cancelled")]
    Cancelled,

    /// A zoom level that is not a positive finite number
    #[error("invalid zoom level {value}")]
    InvalidZoom { value: f64 },

    /// The executor refused to start a task
    #[error("failed to spawn task: {message}")]
    Spawn { message: String },
}

impl Failure {
    pub fn fetch(message: impl Into<String>, cause: impl Error + Send + Sync + 'static) -> Self {
        Self::Fetch { message: message.into(), cause: Some(Arc::new(cause)) }
    }

    pub fn document_load(
        message: impl Into<String>,
        cause: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self::DocumentLoad { message: message.into(), cause: Some(Arc::new(cause)) }
    }

    pub fn page_load(
        page: usize,
        message: impl Into<String>,
        cause: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self::PageLoad { page, message: message.into(), cause: Some(Arc::new(cause)) }
    }

    pub fn render(
        page: usize,
        message: impl Into<String>,
        cause: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self::Render { page, message: message.into(), cause: Some(Arc::new(cause)) }
    }

    /// Render failure without an underlying error value
    pub fn render_message(page: usize, message: impl Into<String>) -> Self {
        Self::Render { page, message: message.into(), cause: None }
    }

    pub fn spawn(error: futures::task::SpawnError) -> Self {
        Self::Spawn { message: error.to_string() }
    }

    /// Human-readable message, identical in shape for every variant
    pub fn message(&self) -> String {
        match self {
            Self::Fetch { message, .. }
            | Self::DocumentLoad { message, .. }
            | Self::PageLoad { message, .. }
            | Self::Render { message, .. }
            | Self::Spawn { message } => message.clone(),
            Self::Cancelled | Self::InvalidZoom { .. } => self.to_string(),
        }
    }

    /// The original error, when one was recorded
    pub fn cause(&self) -> Option<&Cause> {
        match self {
            Self::Fetch { cause, .. }
            | Self::DocumentLoad { cause, .. }
            | Self::PageLoad { cause, .. }
            | Self::Render { cause, .. } => cause.as_ref(),
            Self::Cancelled | Self::InvalidZoom { .. } | Self::Spawn { .. } => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
