//! Live paginated document view
//!
//! Keeps every page of a document rasterized at the current zoom while the
//! user zooms, rotates and blurs the view. Zoom re-renders each page through
//! its [`RenderSlot`], which guarantees that only the most recent render of a
//! page is ever shown. Rotation and blur are pure style changes applied to the
//! page surfaces.
//!
//! The document source, rasterizer and presentation surface are traits, so
//! the same controller drives a PDF engine ([`EngineSource`],
//! [`EngineRasterizer`]) or a scripted fake in tests.

mod config;
mod controller;
mod engine;
mod session;
mod slot;
mod source;
mod state;
mod surface;

pub use config::{ConfigError, ViewConfig};
pub use controller::{Applied, ViewController};
pub use engine::{EngineDocument, EnginePage, EngineRasterizer, EngineSource};
pub use session::{fetch_file, open_view, OpenedView};
pub use slot::{RenderOutcome, RenderSlot, RenderToken, SlotState};
pub use source::{DocumentSource, Rasterizer, Viewport};
pub use state::{Intent, Transform, UnknownIntent, ViewState, ZoomChange};
pub use surface::{Bitmap, MemorySurface, Surface};
