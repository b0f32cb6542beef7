use std::time::Duration;

use thiserror::Error;

use crate::models::Locator;

#[derive(Debug, Error)]
pub enum FolioError {
    #[error("config error: {0}")]
    Config(String),

    #[error("persistence error: {0}")]
    Persist(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single candidate attempt.
///
/// Only ever recorded as the "last error" of an acquisition; never shown to
/// the user on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("{locator} timed out after {}ms", .after.as_millis())]
    Timeout { locator: Locator, after: Duration },

    #[error("{locator} failed: {reason}")]
    Failed { locator: Locator, reason: String },
}

/// Outcome of a failed page acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquireError {
    #[error("page {page} is outside 1..={total}")]
    OutOfRange { page: u32, total: u32 },

    #[error("page {page} could not be loaded: {}", last_reason(.last))]
    Exhausted {
        page: u32,
        attempted: Vec<Locator>,
        last: Option<LoadError>,
    },
}

fn last_reason(last: &Option<LoadError>) -> String {
    match last {
        Some(e) => e.to_string(),
        None => "no candidate available".into(),
    }
}

/// Page-search text that does not name a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidSearchInput {
    #[error("no digits in page query")]
    NoDigits,

    #[error("page {value} is outside 1..={total}")]
    OutOfRange { value: u64, total: u32 },
}

/// A best-effort view operation the surface could not perform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("not supported by this surface: {0}")]
    Unsupported(&'static str),
}
