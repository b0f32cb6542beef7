use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FolioError;

/// The valid page range `1..=total` of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBounds {
    total: u32,
}

impl PageBounds {
    /// `total` must be at least 1; config validation guarantees it.
    pub fn new(total: u32) -> Self {
        Self {
            total: total.max(1),
        }
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn contains(&self, page: u32) -> bool {
        (1..=self.total).contains(&page)
    }

    /// Move `delta` pages from `page`, clamped to the document.
    pub fn step(&self, page: u32, delta: i32) -> u32 {
        let target = i64::from(page) + i64::from(delta);
        target.clamp(1, i64::from(self.total)) as u32
    }

    /// Pages at the given offsets from `page` that exist in the document.
    pub fn neighbors<'a>(&self, page: u32, offsets: &'a [i32]) -> impl Iterator<Item = u32> + 'a {
        let total = i64::from(self.total);
        offsets.iter().filter_map(move |&offset| {
            let n = i64::from(page) + i64::from(offset);
            (n >= 1 && n <= total).then_some(n as u32)
        })
    }
}

/// A resource path for one encoding of one page, relative to the asset base.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A searchable entry (section or subdivision) and the page it starts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedTarget {
    #[serde(default)]
    pub id: Option<u32>,
    pub name: String,
    pub start_page: u32,
}

impl NamedTarget {
    /// Display label: `"{id}. {name}"` when an ordinal is present.
    pub fn label(&self) -> String {
        match self.id {
            Some(id) => format!("{id}. {}", self.name),
            None => self.name.clone(),
        }
    }
}

/// The two read-only name lists offered by the search menus.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub sections: Vec<NamedTarget>,
    #[serde(default)]
    pub subdivisions: Vec<NamedTarget>,
}

impl Catalog {
    /// Read a catalog from a TOML file with `[[sections]]` and `[[subdivisions]]` tables.
    pub fn load(path: &Path) -> Result<Self, FolioError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| FolioError::Config(e.to_string()))
    }
}
