//! Page number → ordered list of resource locators to try.

use crate::config::CandidateTemplate;
use crate::models::Locator;

/// Expands candidate templates for a page, best quality first.
///
/// The resolver is pure: no I/O, same page in, same list out. Position in the
/// returned list is the candidate's quality rank (0 is best).
#[derive(Debug, Clone)]
pub struct CandidateResolver {
    templates: Vec<CandidateTemplate>,
}

impl CandidateResolver {
    /// `templates` must be non-empty and contain a legacy-safe raster entry;
    /// [`AppConfig::validate`](crate::config::AppConfig::validate) checks both.
    /// An empty list falls back to the built-in low-resolution JPEG.
    pub fn new(templates: Vec<CandidateTemplate>) -> Self {
        let templates = if templates.is_empty() {
            vec![CandidateTemplate::new("low", "low/page{page}.jpeg")]
        } else {
            templates
        };
        Self { templates }
    }

    pub fn resolve(&self, page: u32) -> Vec<Locator> {
        let page = page.to_string();
        self.templates
            .iter()
            .map(|t| Locator::new(t.template.replace("{page}", &page)))
            .collect()
    }

    /// Tag of the candidate at `rank`, for logs.
    pub fn tag(&self, rank: usize) -> &str {
        self.templates
            .get(rank)
            .map(|t| t.tag.as_str())
            .unwrap_or("?")
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
