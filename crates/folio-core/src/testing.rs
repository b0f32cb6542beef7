//! Fakes shared by the unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::controller::{PageFailure, Surface};
use crate::error::{LoadError, SurfaceError};
use crate::loader::AssetLoader;
use crate::models::Locator;
use crate::navigation::{MenuView, Mode};

/// Scripted behavior for one locator.
#[derive(Debug, Clone, Copy)]
pub enum Script {
    Succeed,
    SucceedAfter(Duration),
    Fail,
    /// Never resolves; only the timeout ends the attempt.
    Hang,
}

/// Loader answering from a per-locator script and counting attempts.
/// Clones share scripts and counters.
#[derive(Debug, Clone)]
pub struct ScriptedLoader {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    fallback: Script,
    calls: Arc<Mutex<HashMap<String, usize>>>,
}

impl ScriptedLoader {
    /// Unscripted locators fail.
    pub fn new() -> Self {
        Self::with_fallback(Script::Fail)
    }

    /// Unscripted locators succeed immediately.
    pub fn succeeding() -> Self {
        Self::with_fallback(Script::Succeed)
    }

    fn with_fallback(fallback: Script) -> Self {
        Self {
            scripts: Arc::default(),
            fallback,
            calls: Arc::default(),
        }
    }

    pub fn with(self, locator: &str, script: Script) -> Self {
        self.set(locator, script);
        self
    }

    pub fn set(&self, locator: &str, script: Script) {
        self.scripts
            .lock()
            .unwrap()
            .insert(locator.to_string(), script);
    }

    pub fn calls(&self, locator: &str) -> usize {
        self.calls.lock().unwrap().get(locator).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

impl AssetLoader for ScriptedLoader {
    async fn load(&self, locator: &Locator) -> Result<(), LoadError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(locator.to_string())
            .or_default() += 1;
        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(locator.as_str())
            .copied()
            .unwrap_or(self.fallback);

        match script {
            Script::Succeed => Ok(()),
            Script::SucceedAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Script::Fail => Err(LoadError::Failed {
                locator: locator.clone(),
                reason: "scripted failure".into(),
            }),
            Script::Hang => std::future::pending().await,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Page(u32, Locator),
    Loading(bool),
    Failure(PageFailure),
    ClearFailure,
    Scroll(i32),
    ScrollTop,
    Menu { mode: Mode, active: Option<usize> },
    HideMenu,
    Reveal(usize),
}

/// Surface recording every call. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    calls: Arc<Mutex<Vec<SurfaceCall>>>,
    fail_best_effort: Arc<Mutex<bool>>,
}

impl RecordingSurface {
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Make `scroll_to_top` and `reveal` report unsupported.
    pub fn fail_best_effort(&self) {
        *self.fail_best_effort.lock().unwrap() = true;
    }

    pub fn last_page(&self) -> Option<u32> {
        self.calls().iter().rev().find_map(|c| match c {
            SurfaceCall::Page(page, _) => Some(*page),
            _ => None,
        })
    }

    fn record(&self, call: SurfaceCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn best_effort(&self, call: SurfaceCall) -> Result<(), SurfaceError> {
        if *self.fail_best_effort.lock().unwrap() {
            return Err(SurfaceError::Unsupported("test surface"));
        }
        self.record(call);
        Ok(())
    }
}

impl Surface for RecordingSurface {
    fn show_page(&mut self, page: u32, source: &Locator) {
        self.record(SurfaceCall::Page(page, source.clone()));
    }

    fn set_loading(&mut self, loading: bool) {
        self.record(SurfaceCall::Loading(loading));
    }

    fn show_failure(&mut self, failure: &PageFailure) {
        self.record(SurfaceCall::Failure(failure.clone()));
    }

    fn clear_failure(&mut self) {
        self.record(SurfaceCall::ClearFailure);
    }

    fn scroll_by(&mut self, delta: i32) {
        self.record(SurfaceCall::Scroll(delta));
    }

    fn scroll_to_top(&mut self) -> Result<(), SurfaceError> {
        self.best_effort(SurfaceCall::ScrollTop)
    }

    fn render_menu(&mut self, menu: &MenuView<'_>) {
        self.record(SurfaceCall::Menu {
            mode: menu.mode,
            active: menu.entries.iter().position(|(_, active)| *active),
        });
    }

    fn hide_menu(&mut self) {
        self.record(SurfaceCall::HideMenu);
    }

    fn reveal(&mut self, index: usize) -> Result<(), SurfaceError> {
        self.best_effort(SurfaceCall::Reveal(index))
    }
}
