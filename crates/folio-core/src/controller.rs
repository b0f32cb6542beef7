//! Page display orchestration.
//!
//! The controller is the only component that touches the rendered surface.
//! Showing a page never blocks: a pending acquisition reports back through
//! the event channel as a [`PageEvent`], and results for pages the user has
//! already left are dropped (the cache keeps them for later).

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};

use crate::cache::{AssetCache, SourceUpgrade};
use crate::config::AcquisitionConfig;
use crate::error::{AcquireError, SurfaceError};
use crate::loader::AssetLoader;
use crate::models::{Locator, PageBounds};
use crate::navigation::MenuView;
use crate::storage::PageStore;

/// The view layer the controller draws on.
///
/// Methods returning `Result` are best effort; their errors are ignored.
pub trait Surface {
    fn show_page(&mut self, page: u32, source: &Locator);

    fn set_loading(&mut self, loading: bool);

    fn show_failure(&mut self, failure: &PageFailure);

    fn clear_failure(&mut self);

    fn scroll_by(&mut self, delta: i32);

    fn scroll_to_top(&mut self) -> Result<(), SurfaceError>;

    fn render_menu(&mut self, menu: &MenuView<'_>);

    fn hide_menu(&mut self);

    /// Scroll the menu entry at `index` into view and give it focus.
    fn reveal(&mut self, index: usize) -> Result<(), SurfaceError>;
}

/// What the user sees when a page cannot be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    pub page: u32,
    pub attempted: Vec<Locator>,
    pub reason: String,
}

impl PageFailure {
    fn from_error(error: &AcquireError) -> Option<Self> {
        match error {
            AcquireError::Exhausted {
                page, attempted, ..
            } => Some(Self {
                page: *page,
                attempted: attempted.clone(),
                reason: error.to_string(),
            }),
            AcquireError::OutOfRange { .. } => None,
        }
    }
}

/// Completion of a display acquisition.
#[derive(Debug, Clone)]
pub struct PageEvent {
    pub page: u32,
    pub result: Result<Locator, AcquireError>,
}

pub struct PageController<L, S, P> {
    cache: AssetCache<L>,
    surface: S,
    store: P,
    bounds: PageBounds,
    candidate_timeout: Duration,
    prefetch_timeout: Duration,
    prefetch_offsets: Vec<i32>,
    current: u32,
    displayed: Option<Locator>,
    failure: Option<PageFailure>,
    events: mpsc::UnboundedSender<PageEvent>,
}

impl<L: AssetLoader, S: Surface, P: PageStore> PageController<L, S, P> {
    pub fn new(
        cache: AssetCache<L>,
        surface: S,
        store: P,
        acquisition: &AcquisitionConfig,
        events: mpsc::UnboundedSender<PageEvent>,
    ) -> Self {
        let bounds = cache.bounds();
        Self {
            cache,
            surface,
            store,
            bounds,
            candidate_timeout: acquisition.candidate_timeout(),
            prefetch_timeout: acquisition.prefetch_timeout(),
            prefetch_offsets: acquisition.prefetch_offsets.clone(),
            current: 1,
            displayed: None,
            failure: None,
            events,
        }
    }

    /// Stored last page, or 1 when missing or outside the document.
    pub fn initial_page(&self) -> u32 {
        self.store
            .load()
            .filter(|p| self.bounds.contains(*p))
            .unwrap_or(1)
    }

    /// Start displaying `page`. Only an out-of-range page fails here; load
    /// failures arrive later as a [`PageEvent`].
    pub fn show(&mut self, page: u32) -> Result<(), AcquireError> {
        if !self.bounds.contains(page) {
            return Err(AcquireError::OutOfRange {
                page,
                total: self.bounds.total(),
            });
        }

        self.current = page;
        self.displayed = None;
        self.failure = None;
        self.surface.clear_failure();

        if let Some(source) = self.cache.source(page) {
            self.display(page, source);
            return Ok(());
        }

        self.surface.set_loading(true);
        let pending = self.cache.acquire(page, self.candidate_timeout);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = pending.await;
            // The receiver only goes away with the viewer.
            let _ = events.send(PageEvent { page, result });
        });
        Ok(())
    }

    pub fn on_page_event(&mut self, event: PageEvent) {
        if event.page != self.current {
            tracing::debug!(page = event.page, current = self.current, "Dropping result for page no longer shown");
            return;
        }
        match event.result {
            Ok(source) => self.display(event.page, source),
            Err(e) => {
                self.surface.set_loading(false);
                tracing::error!(page = event.page, error = %e, "Failed to load page");
                if let Some(failure) = PageFailure::from_error(&e) {
                    self.surface.show_failure(&failure);
                    self.failure = Some(failure);
                }
            }
        }
    }

    /// Re-read the current page's source after a background upgrade.
    pub fn on_upgrade(&mut self, upgrade: &SourceUpgrade) {
        if upgrade.page == self.current {
            self.refresh_displayed();
        }
    }

    /// Re-read the current page's source and redraw if it changed.
    pub fn refresh_displayed(&mut self) {
        if self.displayed.is_none() {
            return;
        }
        let Some(source) = self.cache.source(self.current) else {
            return;
        };
        if self.displayed.as_ref() != Some(&source) {
            tracing::debug!(page = self.current, %source, "Showing upgraded source");
            self.surface.show_page(self.current, &source);
            self.displayed = Some(source);
        }
    }

    /// Re-run acquisition for the page that failed. Returns false when nothing failed.
    pub fn retry(&mut self) -> bool {
        match self.failure.take() {
            Some(failure) => {
                tracing::info!(page = failure.page, "Retrying page");
                self.show(failure.page).is_ok()
            }
            None => false,
        }
    }

    fn display(&mut self, page: u32, source: Locator) {
        self.surface.set_loading(false);
        self.surface.show_page(page, &source);
        self.displayed = Some(source);

        if let Err(e) = self.store.save(page) {
            tracing::warn!(page, "Failed to persist last page: {e}");
        }
        self.prefetch_neighbors(page);
        if let Err(e) = self.surface.scroll_to_top() {
            tracing::trace!("scroll_to_top skipped: {e}");
        }
    }

    fn prefetch_neighbors(&self, page: u32) {
        for neighbor in self.bounds.neighbors(page, &self.prefetch_offsets) {
            let pending = self.cache.acquire(neighbor, self.prefetch_timeout);
            tokio::spawn(async move {
                if let Err(e) = pending.await {
                    tracing::trace!(page = neighbor, error = %e, "Prefetch failed");
                }
            });
        }
    }

    pub fn scroll(&mut self, delta: i32) {
        self.surface.scroll_by(delta);
    }

    pub fn render_menu(&mut self, menu: &MenuView<'_>) {
        self.surface.render_menu(menu);
    }

    pub fn hide_menu(&mut self) {
        self.surface.hide_menu();
    }

    pub fn reveal(&mut self, index: usize) {
        if let Err(e) = self.surface.reveal(index) {
            tracing::trace!(index, "reveal skipped: {e}");
        }
    }
}

impl<L, S, P> PageController<L, S, P> {
    pub fn current_page(&self) -> u32 {
        self.current
    }

    pub fn displayed(&self) -> Option<&Locator> {
        self.displayed.as_ref()
    }

    pub fn failure(&self) -> Option<&PageFailure> {
        self.failure.as_ref()
    }

    pub fn bounds(&self) -> PageBounds {
        self.bounds
    }

    pub fn cache(&self) -> &AssetCache<L> {
        &self.cache
    }

    pub fn subscribe_upgrades(&self) -> broadcast::Receiver<SourceUpgrade> {
        self.cache.subscribe_upgrades()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}
