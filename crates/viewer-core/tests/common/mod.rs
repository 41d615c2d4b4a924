#![allow(dead_code)]

use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::task::LocalSpawn;
use pageview_scheduler::{AsyncResult, CancellationToken, Failure};
use std::cell::RefCell;
use std::rc::Rc;
use viewer_core::{
    Bitmap, DocumentSource, MemorySurface, Rasterizer, ViewConfig, ViewController, Viewport,
};

/// Unscaled page size of every scripted page
pub const PAGE_WIDTH: f64 = 100.0;
pub const PAGE_HEIGHT: f64 = 140.0;

pub type ScriptedView = ViewController<ScriptedRasterizer, MemorySurface>;

pub fn spawner(pool: &LocalPool) -> Rc<dyn LocalSpawn> {
    Rc::new(pool.spawner())
}

/// A controller over `pages` scripted pages numbered from 1
pub fn scripted_view(pool: &LocalPool, pages: usize) -> (ScriptedView, ScriptedRasterizer) {
    scripted_view_with(pool, pages, ViewConfig::default())
}

pub fn scripted_view_with(
    pool: &LocalPool,
    pages: usize,
    config: ViewConfig,
) -> (ScriptedView, ScriptedRasterizer) {
    let rasterizer = ScriptedRasterizer::new();
    let view = ViewController::new(
        rasterizer.clone(),
        (1..=pages).collect(),
        |_| MemorySurface::new(),
        spawner(pool),
        config,
    );
    (view, rasterizer)
}

pub fn size_at(scale: f64) -> (u32, u32) {
    ((PAGE_WIDTH * scale).round() as u32, (PAGE_HEIGHT * scale).round() as u32)
}

struct PendingRender {
    page: usize,
    scale: f64,
    target: Bitmap,
    token: CancellationToken,
    sender: oneshot::Sender<Result<Bitmap, Failure>>,
}

#[derive(Default)]
struct Script {
    pending: Vec<PendingRender>,
    calls: usize,
}

/// Rasterizer whose renders finish only when the test releases them
///
/// Renders ignore cancellation on purpose, so a test can deliver a
/// completion after the render was cancelled.
#[derive(Clone, Default)]
pub struct ScriptedRasterizer {
    script: Rc<RefCell<Script>>,
}

impl ScriptedRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `render_into` calls so far
    pub fn calls(&self) -> usize {
        self.script.borrow().calls
    }

    pub fn pending(&self) -> usize {
        self.script.borrow().pending.len()
    }

    pub fn is_cancelled(&self, page: usize, scale: f64) -> bool {
        self.script
            .borrow()
            .pending
            .iter()
            .any(|render| render.page == page && render.scale == scale && render.token.is_cancelled())
    }

    /// Complete every pending render at `scale`
    pub fn release(&self, scale: f64) {
        for render in self.take(|render| render.scale == scale) {
            let _ = render.sender.send(Ok(render.target));
        }
    }

    /// Complete the pending render for one page at `scale`
    pub fn release_page(&self, page: usize, scale: f64) {
        for render in self.take(|render| render.page == page && render.scale == scale) {
            let _ = render.sender.send(Ok(render.target));
        }
    }

    /// Fail the pending render for one page at `scale`
    pub fn fail_page(&self, page: usize, scale: f64, message: &str) {
        for render in self.take(|render| render.page == page && render.scale == scale) {
            let _ = render.sender.send(Err(Failure::render_message(page, message)));
        }
    }

    fn take(&self, matches: impl Fn(&PendingRender) -> bool) -> Vec<PendingRender> {
        let mut script = self.script.borrow_mut();
        let (taken, kept): (Vec<_>, Vec<_>) =
            script.pending.drain(..).partition(|render| matches(render));
        script.pending = kept;
        taken
    }
}

impl Rasterizer for ScriptedRasterizer {
    type Page = usize;

    fn viewport(&self, _page: &usize, scale: f64) -> Viewport {
        let (width, height) = size_at(scale);
        Viewport { width, height, scale }
    }

    fn render_into(&self, page: &usize, viewport: Viewport, target: Bitmap) -> AsyncResult<Bitmap> {
        let (sender, receiver) = oneshot::channel();
        let token = CancellationToken::new();

        let mut script = self.script.borrow_mut();
        script.calls += 1;
        script.pending.push(PendingRender {
            page: *page,
            scale: viewport.scale,
            target,
            token: token.clone(),
            sender,
        });

        AsyncResult::cancelable(
            async move { receiver.await.unwrap_or(Err(Failure::Cancelled)) },
            token,
        )
    }
}

/// Document source over `page_count` numbered pages; one page may be made to fail
pub struct ScriptedSource {
    pub page_count: usize,
    pub failing_page: Option<usize>,
}

impl DocumentSource for ScriptedSource {
    type Document = usize;
    type Page = usize;

    fn load_document(&self, bytes: Vec<u8>) -> AsyncResult<usize> {
        if bytes.is_empty() {
            return AsyncResult::err(Failure::DocumentLoad {
                message: "empty document".to_owned(),
                cause: None,
            });
        }
        AsyncResult::ok(self.page_count)
    }

    fn page_count(&self, document: &usize) -> usize {
        *document
    }

    fn page(&self, _document: &usize, page_number: usize) -> AsyncResult<usize> {
        if self.failing_page == Some(page_number) {
            return AsyncResult::err(Failure::PageLoad {
                page: page_number,
                message: "page tree is damaged".to_owned(),
                cause: None,
            });
        }
        AsyncResult::ok(page_number)
    }
}
