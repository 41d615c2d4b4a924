//! View bootstrap: fetch bytes, load the document, load every page, then
//! hand the pages to a [`ViewController`] and start the first render pass.
//!
//! Any failure before the controller exists is fatal; the view is never
//! partially initialized.

use crate::config::ViewConfig;
use crate::controller::ViewController;
use crate::slot::RenderOutcome;
use crate::source::{DocumentSource, Rasterizer};
use crate::state::ZoomChange;
use crate::surface::Surface;
use futures::task::LocalSpawn;
use pageview_scheduler::{parallel_join, AsyncResult, Failure};
use std::fs;
use std::path::Path;
use std::rc::Rc;

/// Read a document's raw bytes from disk.
pub fn fetch_file(path: impl AsRef<Path>) -> AsyncResult<Vec<u8>> {
    let path = path.as_ref().to_path_buf();
    AsyncResult::new(async move {
        fs::read(&path)
            .map_err(|err| Failure::fetch(format!("cannot read {}", path.display()), err))
    })
}

/// A fully initialized view plus its first render pass
pub struct OpenedView<R: Rasterizer, S: Surface> {
    pub controller: ViewController<R, S>,
    /// Already running; awaiting it is only needed to observe the outcome
    pub initial_render: AsyncResult<Vec<RenderOutcome>>,
}

/// Open a view over the document in `bytes`.
///
/// Pages are requested from `source` concurrently. `surfaces` is called once
/// per page with its 1-based number. The first render pass uses
/// [`ViewConfig::initial_zoom`].
pub fn open_view<D, R, S, F>(
    source: D,
    rasterizer: R,
    bytes: AsyncResult<Vec<u8>>,
    surfaces: F,
    spawner: Rc<dyn LocalSpawn>,
    config: ViewConfig,
) -> AsyncResult<OpenedView<R, S>>
where
    D: DocumentSource + 'static,
    R: Rasterizer<Page = D::Page> + 'static,
    S: Surface + 'static,
    F: FnMut(usize) -> S + 'static,
{
    AsyncResult::new(async move {
        let bytes = bytes.await?;
        log::debug!("fetched {} bytes", bytes.len());

        let document = source.load_document(bytes).await?;
        let page_count = source.page_count(&document);

        let loads = (1..=page_count).map(|number| source.page(&document, number)).collect();
        let pages = parallel_join(&*spawner, loads).await?;
        log::info!("document ready: {page_count} pages");

        let initial_zoom = config.initial_zoom;
        let mut controller = ViewController::new(rasterizer, pages, surfaces, spawner, config);
        let initial_render = controller.set_zoom(ZoomChange::To(initial_zoom));

        Ok(OpenedView { controller, initial_render })
    })
}
