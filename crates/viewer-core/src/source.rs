//! Collaborator interfaces: where documents, pages and pixels come from.

use crate::surface::Bitmap;
use pageview_scheduler::AsyncResult;

/// Pixel dimensions of a page rendered at `scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
}

/// Turns raw bytes into a document and hands out its pages.
pub trait DocumentSource {
    type Document: 'static;
    type Page: 'static;

    fn load_document(&self, bytes: Vec<u8>) -> AsyncResult<Self::Document>;

    fn page_count(&self, document: &Self::Document) -> usize;

    /// `page_number` is 1-based.
    fn page(&self, document: &Self::Document, page_number: usize) -> AsyncResult<Self::Page>;
}

/// Rasterizes pages into caller-supplied bitmaps.
pub trait Rasterizer {
    type Page: 'static;

    fn viewport(&self, page: &Self::Page, scale: f64) -> Viewport;

    /// Draw `page` into `target` (already sized to `viewport`) and hand the
    /// buffer back once finished.
    ///
    /// The returned result should carry a cancellation token the render
    /// observes; cancellation remains advisory.
    fn render_into(
        &self,
        page: &Self::Page,
        viewport: Viewport,
        target: Bitmap,
    ) -> AsyncResult<Bitmap>;
}
