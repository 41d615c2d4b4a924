//! Adapters from a [`PdfEngine`] to the document source and rasterizer traits.

use crate::source::{DocumentSource, Rasterizer, Viewport};
use crate::surface::Bitmap;
use pageview_scheduler::{AsyncResult, CancellationToken, Failure};
use pdf_engine::{DocumentHandle, OpenSource, PageSize, PdfEngine, PdfEngineError};
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

/// An open engine document; closed when the last page referencing it is dropped.
pub struct EngineDocument<E: PdfEngine> {
    engine: Rc<RefCell<E>>,
    handle: DocumentHandle,
    page_count: usize,
}

impl<E: PdfEngine> EngineDocument<E> {
    pub fn handle(&self) -> DocumentHandle {
        self.handle
    }
}

impl<E: PdfEngine> fmt::Debug for EngineDocument<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineDocument")
            .field("handle", &self.handle)
            .field("page_count", &self.page_count)
            .finish_non_exhaustive()
    }
}

impl<E: PdfEngine> Drop for EngineDocument<E> {
    fn drop(&mut self) {
        let closed = match self.engine.try_borrow_mut() {
            Ok(mut engine) => engine.close(self.handle).map_err(|err| err.to_string()),
            Err(err) => Err(err.to_string()),
        };
        if let Err(err) = closed {
            log::warn!("failed to close document {}: {err}", self.handle.raw());
        }
    }
}

pub struct EnginePage<E: PdfEngine> {
    document: Rc<EngineDocument<E>>,
    index: u32,
    number: usize,
    size: PageSize,
}

impl<E: PdfEngine> fmt::Debug for EnginePage<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnginePage")
            .field("document", &self.document.handle)
            .field("number", &self.number)
            .field("size", &self.size)
            .finish()
    }
}

impl<E: PdfEngine> EnginePage<E> {
    /// 1-based page number
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn size(&self) -> PageSize {
        self.size
    }
}

/// Loads documents and pages through a shared engine
pub struct EngineSource<E> {
    engine: Rc<RefCell<E>>,
}

impl<E: PdfEngine> EngineSource<E> {
    pub fn new(engine: E) -> Self {
        Self { engine: Rc::new(RefCell::new(engine)) }
    }
}

impl<E: PdfEngine + 'static> DocumentSource for EngineSource<E> {
    type Document = Rc<EngineDocument<E>>;
    type Page = EnginePage<E>;

    fn load_document(&self, bytes: Vec<u8>) -> AsyncResult<Self::Document> {
        let engine = Rc::clone(&self.engine);
        AsyncResult::new(async move {
            let handle = engine
                .borrow_mut()
                .open(OpenSource::Bytes(bytes))
                .map_err(|err| Failure::document_load("engine rejected the document", err))?;
            let mut document = EngineDocument { engine, handle, page_count: 0 };

            let page_count = document
                .engine
                .borrow()
                .page_count(handle)
                .map_err(|err| Failure::document_load("could not count pages", err))?;
            document.page_count = page_count as usize;

            log::debug!("opened document {} with {page_count} pages", handle.raw());
            Ok(Rc::new(document))
        })
    }

    fn page_count(&self, document: &Self::Document) -> usize {
        document.page_count
    }

    fn page(&self, document: &Self::Document, page_number: usize) -> AsyncResult<Self::Page> {
        let document = Rc::clone(document);
        AsyncResult::new(async move {
            let index = page_number
                .checked_sub(1)
                .and_then(|index| u32::try_from(index).ok())
                .ok_or(PdfEngineError::PageOutOfRange {
                    page: 0,
                    page_count: document.page_count as u32,
                })
                .map_err(|err| Failure::page_load(page_number, "page numbers start at 1", err))?;

            let size = document
                .engine
                .borrow()
                .page_size(document.handle, index)
                .map_err(|err| Failure::page_load(page_number, "page is not available", err))?;

            Ok(EnginePage { document, index, number: page_number, size })
        })
    }
}

/// Rasterizes [`EnginePage`]s with the engine that loaded them
pub struct EngineRasterizer<E> {
    engine: PhantomData<fn() -> E>,
}

impl<E> EngineRasterizer<E> {
    pub fn new() -> Self {
        Self { engine: PhantomData }
    }
}

impl<E> Default for EngineRasterizer<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PdfEngine + 'static> Rasterizer for EngineRasterizer<E> {
    type Page = EnginePage<E>;

    fn viewport(&self, page: &Self::Page, scale: f64) -> Viewport {
        let (width, height) = page.size.pixels_at(scale);
        Viewport { width, height, scale }
    }

    fn render_into(
        &self,
        page: &Self::Page,
        _viewport: Viewport,
        mut target: Bitmap,
    ) -> AsyncResult<Bitmap> {
        let token = CancellationToken::new();
        let observed = token.clone();
        let document = Rc::clone(&page.document);
        let (index, number) = (page.index, page.number);

        AsyncResult::cancelable(
            async move {
                observed.checkpoint()?;
                document
                    .engine
                    .borrow()
                    .render_into(document.handle, index, &mut target)
                    .map_err(|err| Failure::render(number, "engine failed to rasterize", err))?;
                Ok(target)
            },
            token,
        )
    }
}
