//! View controller
//!
//! Owns the single [`ViewState`] of a document view and every page's
//! [`RenderSlot`]. Zoom changes re-rasterize all pages through
//! [`parallel_join`]; rotation and blur only restyle the surfaces.

use crate::config::ViewConfig;
use crate::slot::{RenderOutcome, RenderSlot, SlotState};
use crate::source::Rasterizer;
use crate::state::{Intent, ViewState, ZoomChange};
use crate::surface::Surface;
use futures::task::LocalSpawn;
use pageview_scheduler::{parallel_join, AsyncResult, Failure};
use std::rc::Rc;

/// Result of [`ViewController::apply`]
#[derive(Debug)]
pub enum Applied {
    /// A zoom intent started a render pass over every page
    Rendering(AsyncResult<Vec<RenderOutcome>>),
    /// Rotation or blur was applied synchronously
    Restyled,
}

impl Applied {
    pub fn into_rendering(self) -> Option<AsyncResult<Vec<RenderOutcome>>> {
        match self {
            Self::Rendering(pass) => Some(pass),
            Self::Restyled => None,
        }
    }
}

pub struct ViewController<R: Rasterizer, S: Surface> {
    state: ViewState,
    config: ViewConfig,
    rasterizer: R,
    slots: Vec<RenderSlot<R::Page, S>>,
    spawner: Rc<dyn LocalSpawn>,
}

impl<R, S> ViewController<R, S>
where
    R: Rasterizer,
    S: Surface + 'static,
{
    /// Build a controller over already-loaded pages.
    ///
    /// `surfaces` is called once per page with the 1-based page number.
    /// Nothing is rendered until the first zoom request.
    pub fn new(
        rasterizer: R,
        pages: Vec<R::Page>,
        mut surfaces: impl FnMut(usize) -> S,
        spawner: Rc<dyn LocalSpawn>,
        config: ViewConfig,
    ) -> Self {
        let state = ViewState::default();
        let slots = pages
            .into_iter()
            .enumerate()
            .map(|(index, page)| {
                let number = index + 1;
                let mut surface = surfaces(number);
                surface.apply_transform(state.transform());
                RenderSlot::new(number, page, surface).with_pixel_budget(config.max_bitmap_pixels)
            })
            .collect();

        Self { state, config, rasterizer, slots, spawner }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn page_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[RenderSlot<R::Page, S>] {
        &self.slots
    }

    /// Slot for a 1-based page number
    pub fn slot(&self, page_number: usize) -> Option<&RenderSlot<R::Page, S>> {
        page_number.checked_sub(1).and_then(|index| self.slots.get(index))
    }

    pub fn slot_states(&self) -> Vec<SlotState> {
        self.slots.iter().map(RenderSlot::state).collect()
    }

    /// Change the zoom and re-render every page at the new scale.
    ///
    /// Renders are spawned immediately and run whether or not the returned
    /// result is awaited. Calling this again before the pass settles
    /// supersedes it page by page; the earlier pass then reports
    /// [`RenderOutcome::Superseded`] for those pages.
    pub fn set_zoom(&mut self, change: ZoomChange) -> AsyncResult<Vec<RenderOutcome>> {
        let requested = change.resolve(self.state.zoom);
        if !requested.is_finite() || requested <= 0.0 {
            log::warn!("rejecting zoom {requested} ({change:?} from {})", self.state.zoom);
            return AsyncResult::err(Failure::InvalidZoom { value: requested });
        }

        let zoom = requested.max(self.config.min_zoom).min(self.config.max_zoom);
        if zoom != requested {
            log::debug!("zoom {requested} clamped to {zoom}");
        }
        self.state.zoom = zoom;

        log::info!("rendering {} pages at zoom {zoom}", self.slots.len());
        let renders =
            self.slots.iter().map(|slot| slot.request(&self.rasterizer, zoom)).collect();
        parallel_join(&*self.spawner, renders)
    }

    /// Rotate every page by `delta` degrees. Rotation accumulates unbounded.
    pub fn set_rotation(&mut self, delta: f64) {
        if !delta.is_finite() {
            log::warn!("ignoring rotation delta {delta}");
            return;
        }
        self.state.rotation += delta;
        self.restyle();
    }

    /// Change the blur radius by `delta` pixels, never going below zero.
    pub fn set_blur(&mut self, delta: f64) {
        if !delta.is_finite() {
            log::warn!("ignoring blur delta {delta}");
            return;
        }
        self.state.blur = (self.state.blur + delta).max(0.0);
        self.restyle();
    }

    /// Apply one user intent with the configured step sizes.
    pub fn apply(&mut self, intent: Intent) -> Applied {
        log::debug!("applying {intent}");
        match intent {
            Intent::ZoomIn => Applied::Rendering(self.set_zoom(ZoomChange::By(self.config.zoom_step))),
            Intent::ZoomOut => {
                Applied::Rendering(self.set_zoom(ZoomChange::By(1.0 / self.config.zoom_step)))
            }
            Intent::RotateClockwise => {
                self.set_rotation(self.config.rotation_step);
                Applied::Restyled
            }
            Intent::RotateCounterClockwise => {
                self.set_rotation(-self.config.rotation_step);
                Applied::Restyled
            }
            Intent::BlurMore => {
                self.set_blur(self.config.blur_step);
                Applied::Restyled
            }
            Intent::BlurLess => {
                self.set_blur(-self.config.blur_step);
                Applied::Restyled
            }
        }
    }

    fn restyle(&self) {
        let transform = self.state.transform();
        for slot in &self.slots {
            slot.apply_transform(transform);
        }
    }
}

impl<R: Rasterizer, S: Surface> Drop for ViewController<R, S> {
    fn drop(&mut self) {
        // Renders still in flight settle as cancelled instead of committing
        for slot in &self.slots {
            slot.cancel();
        }
    }
}
