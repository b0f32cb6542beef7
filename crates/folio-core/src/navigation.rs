//! Remote-control navigation state machine.
//!
//! The viewer is either showing content or one of the nested menus. The same
//! small key vocabulary means different things per mode, and while the query
//! field has focus it gets first claim on every key.

use std::sync::Arc;

use crate::error::InvalidSearchInput;
use crate::focus::{FocusRing, Step};
use crate::models::{Catalog, NamedTarget, PageBounds};
use crate::normalize;
use crate::text_field::{FieldResponse, TextField};

/// Keys a remote (or keyboard standing in for one) can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteKey {
    Up,
    Down,
    Left,
    Right,
    /// Confirm; Enter on a keyboard.
    Ok,
    /// Dedicated hardware back key.
    Back,
    Escape,
    Backspace,
    PageUp,
    PageDown,
    Home,
    End,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Content,
    MainMenu,
    SectionSearch,
    SubdivisionSearch,
    PageSearch,
}

impl Mode {
    pub fn is_menu(self) -> bool {
        self != Self::Content
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Sections,
    Subdivisions,
    PageNumber,
}

/// A focusable entry of a menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    Choice(MenuChoice),
    Back,
    Query,
    Result(NamedTarget),
    Submit,
}

/// What a routed key asks the rest of the viewer to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ignored,
    /// Scroll the content viewport by this many pixels.
    Scroll(i32),
    /// Show the page this many pages away from the current one.
    Turn(i32),
    /// A menu was opened from content.
    MenuOpened,
    /// Moved between menus.
    MenuChanged,
    /// Focus moved or the query changed inside the open menu.
    MenuUpdated,
    MenuClosed,
    /// Leave the menus and show this page.
    Navigate(u32),
    /// Page search rejected its input; the field is refocused and selected.
    InvalidInput(InvalidSearchInput),
}

/// Render snapshot of the open menu.
#[derive(Debug)]
pub struct MenuView<'a> {
    pub mode: Mode,
    /// Entries with their "is currently active" flag.
    pub entries: Vec<(&'a MenuEntry, bool)>,
    pub query: &'a TextField,
}

/// Index of the query field in search rings: `[Back, Query, ...]`.
const QUERY_INDEX: usize = 1;

pub struct Navigator {
    mode: Mode,
    ring: FocusRing<MenuEntry>,
    query: TextField,
    catalog: Arc<Catalog>,
    bounds: PageBounds,
    scroll_step: i32,
    jump_pages: i32,
}

impl Navigator {
    pub fn new(catalog: Arc<Catalog>, bounds: PageBounds, scroll_step: i32, jump_pages: i32) -> Self {
        Self {
            mode: Mode::Content,
            ring: FocusRing::default(),
            query: TextField::default(),
            catalog,
            bounds,
            scroll_step,
            jump_pages,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn query(&self) -> &TextField {
        &self.query
    }

    pub fn ring(&self) -> &FocusRing<MenuEntry> {
        &self.ring
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Whether focus sits on a text-entry target.
    pub fn focus_in_editable(&self) -> bool {
        matches!(self.ring.active(), Some(MenuEntry::Query))
    }

    pub fn handle(&mut self, key: RemoteKey) -> Outcome {
        match self.mode {
            Mode::Content => self.handle_content(key),
            _ => self.handle_menu(key),
        }
    }

    /// Pointer hover over a menu entry.
    pub fn hover(&mut self, entry: &MenuEntry) -> Outcome {
        if self.mode.is_menu() && self.ring.activate_by_handle(entry) {
            Outcome::MenuUpdated
        } else {
            Outcome::Ignored
        }
    }

    pub fn menu(&self) -> Option<MenuView<'_>> {
        self.mode.is_menu().then(|| MenuView {
            mode: self.mode,
            entries: self.ring.entries().collect(),
            query: &self.query,
        })
    }

    pub fn take_reveal(&mut self) -> Option<usize> {
        self.ring.take_reveal()
    }

    fn handle_content(&mut self, key: RemoteKey) -> Outcome {
        match key {
            // The document reads right to left: left is the next page.
            RemoteKey::Left => Outcome::Turn(1),
            RemoteKey::Right => Outcome::Turn(-1),
            RemoteKey::Up => Outcome::Scroll(-self.scroll_step),
            RemoteKey::Down => Outcome::Scroll(self.scroll_step),
            RemoteKey::PageUp => Outcome::Turn(-self.jump_pages),
            RemoteKey::PageDown => Outcome::Turn(self.jump_pages),
            RemoteKey::Ok => {
                self.open_main_menu();
                Outcome::MenuOpened
            }
            _ => Outcome::Ignored,
        }
    }

    fn handle_menu(&mut self, key: RemoteKey) -> Outcome {
        if self.focus_in_editable() {
            return match self.query.handle(key) {
                FieldResponse::Edited => {
                    if self.is_name_search() {
                        self.refilter();
                    }
                    Outcome::MenuUpdated
                }
                FieldResponse::Consumed => Outcome::MenuUpdated,
                FieldResponse::Submit => self.submit_query(),
            };
        }

        match key {
            RemoteKey::Up => self.step(Step::Prev),
            RemoteKey::Down => self.step(Step::Next),
            RemoteKey::Ok => self.activate(),
            RemoteKey::Back | RemoteKey::Escape | RemoteKey::Backspace => self.back(),
            _ => Outcome::Ignored,
        }
    }

    fn step(&mut self, step: Step) -> Outcome {
        if self.ring.step(step) {
            Outcome::MenuUpdated
        } else {
            Outcome::Ignored
        }
    }

    fn back(&mut self) -> Outcome {
        match self.mode {
            Mode::MainMenu => {
                self.close();
                Outcome::MenuClosed
            }
            Mode::Content => Outcome::Ignored,
            _ => {
                self.open_main_menu();
                Outcome::MenuChanged
            }
        }
    }

    fn activate(&mut self) -> Outcome {
        let Some(entry) = self.ring.active().cloned() else {
            return Outcome::Ignored;
        };
        match entry {
            MenuEntry::Choice(MenuChoice::Sections) => {
                self.open_name_search(Mode::SectionSearch);
                Outcome::MenuChanged
            }
            MenuEntry::Choice(MenuChoice::Subdivisions) => {
                self.open_name_search(Mode::SubdivisionSearch);
                Outcome::MenuChanged
            }
            MenuEntry::Choice(MenuChoice::PageNumber) => {
                self.open_page_search();
                Outcome::MenuChanged
            }
            MenuEntry::Back => {
                self.open_main_menu();
                Outcome::MenuChanged
            }
            MenuEntry::Query => self.submit_query(),
            MenuEntry::Result(target) => self.commit(target.start_page),
            MenuEntry::Submit => self.submit_page_search(),
        }
    }

    /// Enter on the query: page search submits, name searches take the first result.
    fn submit_query(&mut self) -> Outcome {
        if self.mode == Mode::PageSearch {
            return self.submit_page_search();
        }
        let first = self.ring.entries().find_map(|(entry, _)| match entry {
            MenuEntry::Result(target) => Some(target.start_page),
            _ => None,
        });
        match first {
            Some(page) => self.commit(page),
            None => Outcome::Ignored,
        }
    }

    fn submit_page_search(&mut self) -> Outcome {
        match parse_page_query(self.query.text(), self.bounds) {
            Ok(page) => self.commit(page),
            Err(e) => {
                tracing::debug!(query = self.query.text(), error = %e, "Rejected page search");
                self.ring.focus(QUERY_INDEX);
                self.query.select_all();
                Outcome::InvalidInput(e)
            }
        }
    }

    fn commit(&mut self, page: u32) -> Outcome {
        self.close();
        Outcome::Navigate(page)
    }

    fn open_main_menu(&mut self) {
        self.mode = Mode::MainMenu;
        self.query.clear();
        self.ring.set_targets(vec![
            MenuEntry::Choice(MenuChoice::Sections),
            MenuEntry::Choice(MenuChoice::Subdivisions),
            MenuEntry::Choice(MenuChoice::PageNumber),
        ]);
    }

    fn open_name_search(&mut self, mode: Mode) {
        self.mode = mode;
        self.query.clear();
        self.refilter();
    }

    fn open_page_search(&mut self) {
        self.mode = Mode::PageSearch;
        self.query.clear();
        self.ring
            .set_targets(vec![MenuEntry::Back, MenuEntry::Query, MenuEntry::Submit]);
        self.ring.focus(QUERY_INDEX);
    }

    fn close(&mut self) {
        self.mode = Mode::Content;
        self.query.clear();
        self.ring.set_targets(Vec::new());
    }

    fn is_name_search(&self) -> bool {
        matches!(self.mode, Mode::SectionSearch | Mode::SubdivisionSearch)
    }

    /// Rebuild the ring from the query, keeping focus on the query field.
    fn refilter(&mut self) {
        let names = match self.mode {
            Mode::SectionSearch => &self.catalog.sections,
            Mode::SubdivisionSearch => &self.catalog.subdivisions,
            _ => return,
        };
        let folded = normalize::fold(self.query.text());
        let mut targets = vec![MenuEntry::Back, MenuEntry::Query];
        targets.extend(
            names
                .iter()
                .filter(|t| normalize::matches(&t.name, &folded))
                .cloned()
                .map(MenuEntry::Result),
        );
        self.ring.set_targets(targets);
        self.ring.focus(QUERY_INDEX);
    }
}

/// Parse page-search text: drop every non-digit, then require `1..=N`.
pub fn parse_page_query(raw: &str, bounds: PageBounds) -> Result<u32, InvalidSearchInput> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(InvalidSearchInput::NoDigits);
    }
    // Too many digits for u64 is out of range all the same.
    let value = digits.parse::<u64>().unwrap_or(u64::MAX);
    u32::try_from(value)
        .ok()
        .filter(|page| bounds.contains(*page))
        .ok_or(InvalidSearchInput::OutOfRange {
            value,
            total: bounds.total(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(id: u32, name: &str, start_page: u32) -> NamedTarget {
        NamedTarget {
            id: Some(id),
            name: name.into(),
            start_page,
        }
    }

    fn navigator(total: u32) -> Navigator {
        let catalog = Catalog {
            sections: vec![
                target(1, "Al-Fatiha", 1),
                target(2, "Al-Baqara", 2),
                target(3, "Al-Imran", 50),
            ],
            subdivisions: vec![
                NamedTarget {
                    id: None,
                    name: "Part 1".into(),
                    start_page: 1,
                },
                NamedTarget {
                    id: None,
                    name: "Part 2".into(),
                    start_page: 22,
                },
            ],
        };
        Navigator::new(Arc::new(catalog), PageBounds::new(total), 120, 10)
    }

    fn type_text(nav: &mut Navigator, text: &str) {
        for c in text.chars() {
            nav.handle(RemoteKey::Char(c));
        }
    }

    fn result_names(nav: &Navigator) -> Vec<String> {
        nav.ring()
            .entries()
            .filter_map(|(e, _)| match e {
                MenuEntry::Result(t) => Some(t.name.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_content_keys() {
        let mut nav = navigator(604);
        assert_eq!(nav.handle(RemoteKey::Left), Outcome::Turn(1));
        assert_eq!(nav.handle(RemoteKey::Right), Outcome::Turn(-1));
        assert_eq!(nav.handle(RemoteKey::Down), Outcome::Scroll(120));
        assert_eq!(nav.handle(RemoteKey::PageUp), Outcome::Turn(-10));
        assert_eq!(nav.handle(RemoteKey::Backspace), Outcome::Ignored);
        assert_eq!(nav.mode(), Mode::Content);
    }

    #[test]
    fn test_ok_opens_main_menu_with_three_items() {
        let mut nav = navigator(604);
        assert_eq!(nav.handle(RemoteKey::Ok), Outcome::MenuOpened);
        assert_eq!(nav.mode(), Mode::MainMenu);
        assert_eq!(nav.ring().len(), 3);
        assert_eq!(nav.ring().active_index(), Some(0));
        assert_eq!(nav.take_reveal(), Some(0));
    }

    #[test]
    fn test_main_menu_back_closes() {
        let mut nav = navigator(604);
        nav.handle(RemoteKey::Ok);
        assert_eq!(nav.handle(RemoteKey::Escape), Outcome::MenuClosed);
        assert_eq!(nav.mode(), Mode::Content);
        assert!(nav.menu().is_none());
    }

    #[test]
    fn test_main_menu_selects_each_search() {
        let mut nav = navigator(604);
        nav.handle(RemoteKey::Ok);
        nav.handle(RemoteKey::Down);
        assert_eq!(nav.handle(RemoteKey::Ok), Outcome::MenuChanged);
        assert_eq!(nav.mode(), Mode::SubdivisionSearch);

        nav.hover(&MenuEntry::Back);
        nav.handle(RemoteKey::Back);
        assert_eq!(nav.mode(), Mode::MainMenu);
        nav.handle(RemoteKey::Down);
        nav.handle(RemoteKey::Down);
        nav.handle(RemoteKey::Down);
        nav.handle(RemoteKey::Ok);
        assert_eq!(nav.mode(), Mode::PageSearch);
        assert!(nav.focus_in_editable());
    }

    #[test]
    fn test_section_filter_keeps_focus_on_query() {
        let mut nav = navigator(604);
        nav.handle(RemoteKey::Ok);
        nav.handle(RemoteKey::Ok);
        assert_eq!(nav.mode(), Mode::SectionSearch);
        assert_eq!(result_names(&nav).len(), 3);
        assert_eq!(nav.ring().active_index(), Some(1));

        type_text(&mut nav, " BAQ");
        assert_eq!(result_names(&nav), vec!["Al-Baqara".to_string()]);
        assert_eq!(nav.ring().active(), Some(&MenuEntry::Query));
        assert_eq!(nav.ring().len(), 3);
    }

    #[test]
    fn test_filtered_result_commits_navigation() {
        let mut nav = navigator(604);
        nav.handle(RemoteKey::Ok);
        nav.handle(RemoteKey::Ok);
        type_text(&mut nav, "imran");
        assert_eq!(
            nav.hover(&MenuEntry::Result(target(3, "Al-Imran", 50))),
            Outcome::MenuUpdated
        );
        assert!(!nav.focus_in_editable());
        assert_eq!(nav.handle(RemoteKey::Ok), Outcome::Navigate(50));
        assert_eq!(nav.mode(), Mode::Content);
    }

    #[test]
    fn test_enter_in_name_query_takes_first_result() {
        let mut nav = navigator(604);
        nav.handle(RemoteKey::Ok);
        nav.handle(RemoteKey::Ok);
        type_text(&mut nav, "al-");
        assert_eq!(nav.handle(RemoteKey::Ok), Outcome::Navigate(1));

        nav.handle(RemoteKey::Ok);
        nav.handle(RemoteKey::Ok);
        type_text(&mut nav, "zzz");
        assert_eq!(nav.handle(RemoteKey::Ok), Outcome::Ignored);
        assert_eq!(nav.mode(), Mode::SectionSearch);
    }

    #[test]
    fn test_back_entry_returns_to_main_menu() {
        let mut nav = navigator(604);
        nav.handle(RemoteKey::Ok);
        nav.handle(RemoteKey::Ok);
        nav.hover(&MenuEntry::Back);
        assert_eq!(nav.ring().active(), Some(&MenuEntry::Back));
        assert_eq!(nav.handle(RemoteKey::Ok), Outcome::MenuChanged);
        assert_eq!(nav.mode(), Mode::MainMenu);
    }

    #[test]
    fn test_editing_keys_stay_in_query_field() {
        let mut nav = navigator(604);
        nav.handle(RemoteKey::Ok);
        nav.handle(RemoteKey::Down);
        nav.handle(RemoteKey::Down);
        nav.handle(RemoteKey::Ok);
        type_text(&mut nav, "12");

        assert_eq!(nav.handle(RemoteKey::Backspace), Outcome::MenuUpdated);
        assert_eq!(nav.query().text(), "1");
        assert_eq!(nav.handle(RemoteKey::Escape), Outcome::MenuUpdated);
        assert_eq!(nav.handle(RemoteKey::Left), Outcome::MenuUpdated);
        assert_eq!(nav.mode(), Mode::PageSearch);

        // Outside the field Backspace is Back again.
        nav.hover(&MenuEntry::Back);
        assert_eq!(nav.handle(RemoteKey::Backspace), Outcome::MenuChanged);
        assert_eq!(nav.mode(), Mode::MainMenu);
    }

    /// Open a search menu by its main-menu position.
    fn open_search(nav: &mut Navigator, downs: usize) {
        nav.handle(RemoteKey::Ok);
        for _ in 0..downs {
            nav.handle(RemoteKey::Down);
        }
        nav.handle(RemoteKey::Ok);
    }

    #[test]
    fn test_hardware_back_stays_in_query_field() {
        for (downs, mode) in [(0, Mode::SectionSearch), (2, Mode::PageSearch)] {
            let mut nav = navigator(604);
            open_search(&mut nav, downs);
            type_text(&mut nav, "1");
            assert!(nav.focus_in_editable());

            assert_eq!(nav.handle(RemoteKey::Back), Outcome::MenuUpdated);
            assert_eq!(nav.mode(), mode);
            assert_eq!(nav.query().text(), "1");
        }
    }

    #[test]
    fn test_focused_query_keeps_every_non_enter_key() {
        let keys = [
            RemoteKey::Back,
            RemoteKey::Escape,
            RemoteKey::Backspace,
            RemoteKey::Up,
            RemoteKey::Down,
            RemoteKey::Left,
            RemoteKey::Right,
            RemoteKey::PageUp,
            RemoteKey::PageDown,
        ];
        let searches = [
            (0, Mode::SectionSearch),
            (1, Mode::SubdivisionSearch),
            (2, Mode::PageSearch),
        ];
        for (downs, mode) in searches {
            for key in keys {
                let mut nav = navigator(604);
                open_search(&mut nav, downs);
                type_text(&mut nav, "2");
                assert_eq!(nav.mode(), mode);

                nav.handle(key);
                assert_eq!(nav.mode(), mode, "{key:?} in {mode:?}");
                assert!(nav.focus_in_editable(), "{key:?} in {mode:?}");
                assert_eq!(nav.ring().active(), Some(&MenuEntry::Query));
            }
        }
    }

    #[test]
    fn test_page_search_commit() {
        let mut nav = navigator(604);
        nav.handle(RemoteKey::Ok);
        nav.handle(RemoteKey::Down);
        nav.handle(RemoteKey::Down);
        nav.handle(RemoteKey::Ok);
        type_text(&mut nav, "12a3");
        assert_eq!(nav.handle(RemoteKey::Ok), Outcome::Navigate(123));
        assert_eq!(nav.mode(), Mode::Content);
    }

    #[test]
    fn test_page_search_out_of_range_refocuses_field() {
        let mut nav = navigator(100);
        nav.handle(RemoteKey::Ok);
        nav.handle(RemoteKey::Down);
        nav.handle(RemoteKey::Down);
        nav.handle(RemoteKey::Ok);
        type_text(&mut nav, "12a3");
        // Submit through the Go entry rather than Enter.
        nav.hover(&MenuEntry::Submit);
        assert_eq!(nav.ring().active(), Some(&MenuEntry::Submit));

        assert_eq!(
            nav.handle(RemoteKey::Ok),
            Outcome::InvalidInput(InvalidSearchInput::OutOfRange {
                value: 123,
                total: 100
            })
        );
        assert_eq!(nav.mode(), Mode::PageSearch);
        assert!(nav.focus_in_editable());
        assert!(nav.query().is_selected());
    }

    #[test]
    fn test_hover_retargets_focus() {
        let mut nav = navigator(604);
        assert_eq!(nav.hover(&MenuEntry::Back), Outcome::Ignored);
        nav.handle(RemoteKey::Ok);
        nav.take_reveal();
        assert_eq!(
            nav.hover(&MenuEntry::Choice(MenuChoice::PageNumber)),
            Outcome::MenuUpdated
        );
        assert_eq!(nav.ring().active_index(), Some(2));
        assert_eq!(nav.take_reveal(), Some(2));
    }

    #[test]
    fn test_menu_view_flags_active_entry() {
        let mut nav = navigator(604);
        nav.handle(RemoteKey::Ok);
        nav.handle(RemoteKey::Down);
        let view = nav.menu().unwrap();
        assert_eq!(view.mode, Mode::MainMenu);
        let active: Vec<bool> = view.entries.iter().map(|(_, a)| *a).collect();
        assert_eq!(active, vec![false, true, false]);
    }

    #[test]
    fn test_parse_page_query() {
        let bounds = PageBounds::new(604);
        assert_eq!(parse_page_query("12a3", bounds), Ok(123));
        assert_eq!(parse_page_query(" 6 0 4 ", bounds), Ok(604));
        assert_eq!(parse_page_query("abc", bounds), Err(InvalidSearchInput::NoDigits));
        assert_eq!(
            parse_page_query("0", bounds),
            Err(InvalidSearchInput::OutOfRange { value: 0, total: 604 })
        );
        assert!(matches!(
            parse_page_query("99999999999999999999999", bounds),
            Err(InvalidSearchInput::OutOfRange { .. })
        ));
    }
}
