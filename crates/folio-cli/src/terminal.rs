//! Plain-text rendering surface.

use std::sync::{Arc, Mutex, PoisonError};

use folio_core::controller::{PageFailure, Surface};
use folio_core::error::SurfaceError;
use folio_core::models::Locator;
use folio_core::navigation::{MenuChoice, MenuEntry, MenuView, Mode};

/// Entries of the menu currently on screen, shared with the input reader
/// so `hover <n>` can name a handle.
pub type RenderedMenu = Arc<Mutex<Vec<MenuEntry>>>;

pub struct TerminalSurface {
    menu: RenderedMenu,
    scroll: i32,
}

impl TerminalSurface {
    pub fn new(menu: RenderedMenu) -> Self {
        Self { menu, scroll: 0 }
    }

    fn set_menu(&self, entries: Vec<MenuEntry>) {
        *self.menu.lock().unwrap_or_else(PoisonError::into_inner) = entries;
    }
}

fn title(mode: Mode) -> &'static str {
    match mode {
        Mode::Content => "",
        Mode::MainMenu => "Menu",
        Mode::SectionSearch => "Sections",
        Mode::SubdivisionSearch => "Subdivisions",
        Mode::PageSearch => "Go to page",
    }
}

fn label(entry: &MenuEntry, query: &str) -> String {
    match entry {
        MenuEntry::Choice(MenuChoice::Sections) => "Sections".into(),
        MenuEntry::Choice(MenuChoice::Subdivisions) => "Subdivisions".into(),
        MenuEntry::Choice(MenuChoice::PageNumber) => "Page number".into(),
        MenuEntry::Back => "<- Back".into(),
        MenuEntry::Query => format!("[{query}]"),
        MenuEntry::Result(target) => target.label(),
        MenuEntry::Submit => "Go".into(),
    }
}

impl Surface for TerminalSurface {
    fn show_page(&mut self, page: u32, source: &Locator) {
        println!("page {page}  ({source})");
    }

    fn set_loading(&mut self, loading: bool) {
        if loading {
            println!("loading...");
        }
    }

    fn show_failure(&mut self, failure: &PageFailure) {
        println!("Page {} could not be loaded.", failure.page);
        for locator in &failure.attempted {
            println!("  tried {locator}");
        }
        println!("  type `retry` to try again");
    }

    fn clear_failure(&mut self) {}

    fn scroll_by(&mut self, delta: i32) {
        self.scroll = (self.scroll + delta).max(0);
        println!("scroll {}", self.scroll);
    }

    fn scroll_to_top(&mut self) -> Result<(), SurfaceError> {
        self.scroll = 0;
        Ok(())
    }

    fn render_menu(&mut self, menu: &MenuView<'_>) {
        println!("== {} ==", title(menu.mode));
        for (index, (entry, active)) in menu.entries.iter().enumerate() {
            let marker = if *active { '>' } else { ' ' };
            println!("{marker} {index}: {}", label(entry, menu.query.text()));
        }
        self.set_menu(menu.entries.iter().map(|(e, _)| (*e).clone()).collect());
    }

    fn hide_menu(&mut self) {
        self.set_menu(Vec::new());
        println!("== closed ==");
    }

    fn reveal(&mut self, _index: usize) -> Result<(), SurfaceError> {
        Err(SurfaceError::Unsupported("terminal prints the whole menu"))
    }
}
