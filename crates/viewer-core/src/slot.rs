//! Per-page render lifecycle
//!
//! A [`RenderSlot`] owns one page's surface and the render currently in
//! flight for it. Every request gets a fresh token; a finished render may
//! only touch the surface if its token is still the current one, so an
//! older render can never overwrite a newer one no matter when it settles.

use crate::config::DEFAULT_MAX_BITMAP_PIXELS;
use crate::source::Rasterizer;
use crate::state::Transform;
use crate::surface::{Bitmap, Surface};
use pageview_scheduler::{AsyncResult, CancellationToken, Failure};
use std::cell::RefCell;
use std::rc::Rc;

/// Identity of one render request, increasing per slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RenderToken(u64);

impl RenderToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotState {
    Idle,
    Rendering { token: RenderToken, scale: f64 },
    Committed { token: RenderToken, scale: f64 },
    Failed { token: RenderToken },
    /// The current render was cancelled without a newer request replacing it
    Cancelled { token: RenderToken },
}

/// How a single slot request settled, seen from the requester
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderOutcome {
    Committed { page: usize, scale: f64 },
    /// A newer request took over before this one finished; nothing was shown
    Superseded { page: usize },
}

pub struct RenderSlot<P, S> {
    inner: Rc<RefCell<SlotInner<P, S>>>,
}

struct SlotInner<P, S> {
    page_number: usize,
    page: P,
    surface: S,
    issued: u64,
    current: RenderToken,
    in_flight: Option<CancellationToken>,
    state: SlotState,
    committed_scale: Option<f64>,
    max_pixels: u64,
}

impl<P, S: Surface> RenderSlot<P, S> {
    /// `page_number` is 1-based and only used for reporting.
    pub fn new(page_number: usize, page: P, surface: S) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SlotInner {
                page_number,
                page,
                surface,
                issued: 0,
                current: RenderToken::default(),
                in_flight: None,
                state: SlotState::Idle,
                committed_scale: None,
                max_pixels: DEFAULT_MAX_BITMAP_PIXELS,
            })),
        }
    }

    /// Refuse renders whose bitmap would hold more than `max_pixels` pixels.
    pub fn with_pixel_budget(self, max_pixels: u64) -> Self {
        self.inner.borrow_mut().max_pixels = max_pixels;
        self
    }

    pub fn page_number(&self) -> usize {
        self.inner.borrow().page_number
    }

    pub fn state(&self) -> SlotState {
        self.inner.borrow().state
    }

    pub fn current_token(&self) -> RenderToken {
        self.inner.borrow().current
    }

    /// Scale of the bitmap currently shown, if any render has committed.
    pub fn committed_scale(&self) -> Option<f64> {
        self.inner.borrow().committed_scale
    }

    pub fn is_rendering(&self) -> bool {
        self.inner.borrow().in_flight.is_some()
    }

    pub fn with_surface<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        f(&self.inner.borrow().surface)
    }

    pub fn apply_transform(&self, transform: Transform) {
        self.inner.borrow_mut().surface.apply_transform(transform);
    }

    /// Cancel the in-flight render, if any.
    ///
    /// The render still settles; it then reports [`Failure::Cancelled`] and
    /// clears the loading indicator without touching the visible content.
    pub fn cancel(&self) {
        if let Some(token) = &self.inner.borrow().in_flight {
            token.cancel();
        }
    }
}

impl<P: 'static, S: Surface + 'static> RenderSlot<P, S> {
    /// Start rendering this page at `scale`, superseding any earlier request.
    ///
    /// The surface is resized and marked as loading before this returns; the
    /// pixels are swapped in only when the render completes and is still the
    /// latest request. Cancelling the returned result cancels the render.
    ///
    /// The render only progresses while the returned result is awaited or
    /// spawned. Dropping it unsettled cancels the render and, if it is still
    /// the latest request, clears loading and leaves the slot `Cancelled`.
    ///
    /// A viewport larger than the pixel budget fails with
    /// [`Failure::Render`] before anything is allocated; the surface keeps
    /// its size and last frame.
    pub fn request<R>(&self, rasterizer: &R, scale: f64) -> AsyncResult<RenderOutcome>
    where
        R: Rasterizer<Page = P>,
    {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;

        if let Some(previous) = inner.in_flight.take() {
            log::debug!(
                "page {}: cancelling render {} in favour of scale {scale}",
                inner.page_number,
                inner.current.value()
            );
            previous.cancel();
        }

        let viewport = rasterizer.viewport(&inner.page, scale);
        inner.issued += 1;
        let token = RenderToken(inner.issued);
        inner.current = token;

        let pixels = u64::from(viewport.width) * u64::from(viewport.height);
        if pixels > inner.max_pixels {
            let page = inner.page_number;
            inner.state = SlotState::Failed { token };
            inner.surface.set_loading(false);
            log::warn!(
                "page {page}: {}x{} at scale {scale} exceeds the {} pixel budget",
                viewport.width,
                viewport.height,
                inner.max_pixels
            );
            return AsyncResult::err(Failure::render_message(
                page,
                format!(
                    "{}x{} bitmap exceeds the budget of {} pixels",
                    viewport.width, viewport.height, inner.max_pixels
                ),
            ));
        }

        inner.surface.resize(viewport.width, viewport.height);
        inner.state = SlotState::Rendering { token, scale };
        inner.surface.set_loading(true);

        // Never draw into the bitmap that is currently on screen
        let target = Bitmap::new(viewport.width, viewport.height);
        let render = rasterizer.render_into(&inner.page, viewport, target);
        let cancel = render.token().cloned().unwrap_or_default();
        inner.in_flight = Some(cancel.clone());

        log::debug!(
            "page {}: render {} started at {}x{} (scale {scale})",
            inner.page_number,
            token.value(),
            viewport.width,
            viewport.height
        );
        drop(guard);

        let pending = PendingRender {
            slot: Some(Rc::clone(&self.inner)),
            token,
            scale,
            cancel: cancel.clone(),
        };
        AsyncResult::cancelable(
            async move {
                let result = render.await;
                pending.settle(result)
            },
            cancel,
        )
    }
}

/// A started render that has not reached its slot yet
///
/// Dropped before settling (never polled, or its task could not be
/// spawned), it releases the slot instead of leaving it loading.
struct PendingRender<P, S: Surface> {
    slot: Option<Rc<RefCell<SlotInner<P, S>>>>,
    token: RenderToken,
    scale: f64,
    cancel: CancellationToken,
}

impl<P, S: Surface> PendingRender<P, S> {
    fn settle(mut self, result: Result<Bitmap, Failure>) -> Result<RenderOutcome, Failure> {
        match self.slot.take() {
            Some(slot) => settle(&slot, self.token, self.scale, &self.cancel, result),
            None => Err(Failure::Cancelled),
        }
    }
}

impl<P, S: Surface> Drop for PendingRender<P, S> {
    fn drop(&mut self) {
        let Some(slot) = self.slot.take() else {
            return;
        };
        self.cancel.cancel();

        let Ok(mut inner) = slot.try_borrow_mut() else {
            log::warn!("render {} dropped while its slot was busy", self.token.value());
            return;
        };
        if inner.current != self.token {
            return;
        }

        inner.in_flight = None;
        inner.surface.set_loading(false);
        inner.state = SlotState::Cancelled { token: self.token };
        log::debug!(
            "page {}: render {} dropped before it settled",
            inner.page_number,
            self.token.value()
        );
    }
}

fn settle<P, S: Surface>(
    slot: &RefCell<SlotInner<P, S>>,
    token: RenderToken,
    scale: f64,
    cancel: &CancellationToken,
    result: Result<Bitmap, Failure>,
) -> Result<RenderOutcome, Failure> {
    let mut inner = slot.borrow_mut();
    let page = inner.page_number;

    if inner.current != token {
        log::debug!(
            "page {page}: discarding render {} (current is {})",
            token.value(),
            inner.current.value()
        );
        return Ok(RenderOutcome::Superseded { page });
    }

    inner.in_flight = None;
    inner.surface.set_loading(false);

    let result = if cancel.is_cancelled() { Err(Failure::Cancelled) } else { result };

    match result {
        Ok(bitmap) => {
            inner.surface.replace_visible_content(bitmap);
            inner.state = SlotState::Committed { token, scale };
            inner.committed_scale = Some(scale);
            log::debug!("page {page}: committed render {} at scale {scale}", token.value());
            Ok(RenderOutcome::Committed { page, scale })
        }
        Err(Failure::Cancelled) => {
            inner.state = SlotState::Cancelled { token };
            log::debug!("page {page}: render {} cancelled", token.value());
            Err(Failure::Cancelled)
        }
        Err(failure) => {
            inner.state = SlotState::Failed { token };
            log::warn!("page {page}: render at scale {scale} failed: {failure}");
            Err(failure)
        }
    }
}
