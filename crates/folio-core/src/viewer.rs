//! The viewer event loop.
//!
//! Remote input passes the [`InputGate`] first, is routed by the
//! [`Navigator`], and ends up as focus movement, a menu transition, or a
//! page display on the [`PageController`]. Acquisition results and source
//! upgrades come back through channels and are applied between inputs, so
//! input handling never waits on a load.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::cache::{AssetCache, SourceUpgrade};
use crate::candidates::CandidateResolver;
use crate::config::{AppConfig, InputConfig};
use crate::controller::{PageController, PageEvent, Surface};
use crate::gate::InputGate;
use crate::loader::AssetLoader;
use crate::models::{Catalog, PageBounds};
use crate::navigation::{MenuEntry, Mode, Navigator, Outcome, RemoteKey};
use crate::storage::PageStore;

/// Everything the viewer reacts to from the outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A remote-control key; subject to the suppression window.
    Key(RemoteKey),
    /// Pointer hover over a menu entry.
    Hover(MenuEntry),
    /// The retry affordance of a failed page.
    Retry,
}

pub struct Viewer<L, S, P> {
    navigator: Navigator,
    controller: PageController<L, S, P>,
    gate: InputGate,
    input: InputConfig,
    events: mpsc::UnboundedReceiver<PageEvent>,
    upgrades: broadcast::Receiver<SourceUpgrade>,
}

impl<L: AssetLoader, S: Surface, P: PageStore> Viewer<L, S, P> {
    pub fn new(config: &AppConfig, loader: L, surface: S, store: P, catalog: Catalog) -> Self {
        let bounds = PageBounds::new(config.document.total_pages);
        let cache = AssetCache::new(
            loader,
            CandidateResolver::new(config.assets.candidates.clone()),
            bounds,
            config.acquisition.upgrade_timeout(),
        );
        let (tx, events) = mpsc::unbounded_channel();
        let controller = PageController::new(cache, surface, store, &config.acquisition, tx);
        let upgrades = controller.subscribe_upgrades();
        let navigator = Navigator::new(
            Arc::new(catalog),
            bounds,
            config.input.scroll_step,
            config.input.jump_pages,
        );

        Self {
            navigator,
            controller,
            gate: InputGate::new(),
            input: config.input.clone(),
            events,
            upgrades,
        }
    }

    /// Show the last viewed page and open the startup grace window.
    pub fn start(&mut self, now: Instant) {
        let page = self.controller.initial_page();
        tracing::info!(page, "Starting viewer");
        if let Err(e) = self.controller.show(page) {
            tracing::error!(error = %e, "Failed to show initial page");
        }
        self.gate.arm(now, self.input.startup_grace());
    }

    pub fn handle(&mut self, input: Input, now: Instant) {
        match input {
            Input::Key(key) => self.handle_key(key, now),
            Input::Hover(entry) => {
                let outcome = self.navigator.hover(&entry);
                self.apply(outcome, now);
            }
            Input::Retry => {
                if !self.controller.retry() {
                    tracing::debug!("Retry requested with no failed page");
                }
            }
        }
    }

    fn handle_key(&mut self, key: RemoteKey, now: Instant) {
        if self.gate.is_suppressed(now) {
            return;
        }
        let outcome = self.navigator.handle(key);
        self.apply(outcome, now);
    }

    fn apply(&mut self, outcome: Outcome, now: Instant) {
        match outcome {
            Outcome::Ignored => {}
            Outcome::Scroll(delta) => self.controller.scroll(delta),
            Outcome::Turn(delta) => {
                let current = self.controller.current_page();
                let target = self.controller.bounds().step(current, delta);
                if target != current {
                    self.show(target, now);
                }
            }
            Outcome::MenuOpened | Outcome::MenuChanged => {
                self.gate.arm(now, self.input.menu_suppress());
                self.render_menu();
            }
            Outcome::MenuUpdated => self.render_menu(),
            Outcome::MenuClosed => {
                self.gate.arm(now, self.input.menu_suppress());
                self.controller.hide_menu();
            }
            Outcome::Navigate(page) => {
                self.controller.hide_menu();
                self.show(page, now);
            }
            Outcome::InvalidInput(_) => {
                self.gate.arm(now, self.input.navigation_suppress());
                self.render_menu();
            }
        }
    }

    fn show(&mut self, page: u32, now: Instant) {
        match self.controller.show(page) {
            Ok(()) => self.gate.arm(now, self.input.navigation_suppress()),
            Err(e) => tracing::warn!(error = %e, "Ignoring navigation"),
        }
    }

    fn render_menu(&mut self) {
        if let Some(view) = self.navigator.menu() {
            self.controller.render_menu(&view);
        }
        if let Some(index) = self.navigator.take_reveal() {
            self.controller.reveal(index);
        }
    }

    /// Apply every acquisition result and upgrade that is already waiting.
    pub fn drain(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.controller.on_page_event(event);
        }
        loop {
            match self.upgrades.try_recv() {
                Ok(upgrade) => self.controller.on_upgrade(&upgrade),
                Err(TryRecvError::Lagged(_)) => self.controller.refresh_displayed(),
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    /// Run until `inputs` closes.
    pub async fn run(mut self, mut inputs: mpsc::Receiver<Input>) {
        self.start(Instant::now());
        loop {
            tokio::select! {
                input = inputs.recv() => match input {
                    Some(input) => self.handle(input, Instant::now()),
                    None => break,
                },
                Some(event) = self.events.recv() => self.controller.on_page_event(event),
                upgrade = self.upgrades.recv() => match upgrade {
                    Ok(upgrade) => self.controller.on_upgrade(&upgrade),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Upgrade notifications lagged");
                        self.controller.refresh_displayed();
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        tracing::info!(page = self.controller.current_page(), "Viewer stopped");
    }
}

impl<L, S, P> Viewer<L, S, P> {
    pub fn mode(&self) -> Mode {
        self.navigator.mode()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn controller(&self) -> &PageController<L, S, P> {
        &self.controller
    }
}
