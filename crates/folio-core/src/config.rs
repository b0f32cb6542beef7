use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::FolioError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// File extensions every rendering environment can display.
const LEGACY_SAFE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif"];

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub document: DocumentConfig,
    pub assets: AssetsConfig,
    pub acquisition: AcquisitionConfig,
    pub input: InputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    pub total_pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Directory path or `http(s)://` URL the candidate templates are relative to.
    pub base: String,
    /// Best quality first.
    pub candidates: Vec<CandidateTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTemplate {
    pub tag: String,
    /// Path template with a `{page}` placeholder.
    pub template: String,
}

impl CandidateTemplate {
    pub fn new(tag: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            template: template.into(),
        }
    }

    fn is_legacy_safe(&self) -> bool {
        self.template
            .rsplit_once('.')
            .is_some_and(|(_, ext)| LEGACY_SAFE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    pub candidate_timeout_ms: u64,
    pub prefetch_timeout_ms: u64,
    pub upgrade_timeout_ms: u64,
    pub prefetch_offsets: Vec<i32>,
}

impl AcquisitionConfig {
    pub fn candidate_timeout(&self) -> Duration {
        Duration::from_millis(self.candidate_timeout_ms)
    }

    pub fn prefetch_timeout(&self) -> Duration {
        Duration::from_millis(self.prefetch_timeout_ms)
    }

    pub fn upgrade_timeout(&self) -> Duration {
        Duration::from_millis(self.upgrade_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub navigation_suppress_ms: u64,
    pub menu_suppress_ms: u64,
    pub startup_grace_ms: u64,
    pub scroll_step: i32,
    pub jump_pages: i32,
}

impl InputConfig {
    pub fn navigation_suppress(&self) -> Duration {
        Duration::from_millis(self.navigation_suppress_ms)
    }

    pub fn menu_suppress(&self) -> Duration {
        Duration::from_millis(self.menu_suppress_ms)
    }

    pub fn startup_grace(&self) -> Duration {
        Duration::from_millis(self.startup_grace_ms)
    }
}

impl AppConfig {
    /// Load config: the user file if it exists, otherwise built-in defaults.
    pub fn load() -> Result<Self, FolioError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            Self::load_from(&user_path)
        } else {
            Self::parse(DEFAULT_CONFIG)
        }
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, FolioError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| FolioError::Config(format!("{}: {e}", path.display())))?;
        Self::parse(&content)
    }

    /// Parse and validate a TOML document.
    pub fn parse(content: &str) -> Result<Self, FolioError> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| FolioError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FolioError> {
        if self.document.total_pages == 0 {
            return Err(FolioError::Config("document.total_pages must be at least 1".into()));
        }
        let candidates = &self.assets.candidates;
        if candidates.is_empty() {
            return Err(FolioError::Config("assets.candidates is empty".into()));
        }
        if let Some(bad) = candidates.iter().find(|c| !c.template.contains("{page}")) {
            return Err(FolioError::Config(format!(
                "candidate '{}' has no {{page}} placeholder",
                bad.tag
            )));
        }
        if !candidates.iter().any(CandidateTemplate::is_legacy_safe) {
            return Err(FolioError::Config(
                "assets.candidates needs at least one jpeg/jpg/png/gif entry".into(),
            ));
        }
        Ok(())
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Path to the persisted viewer state.
    pub fn state_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().join("state.json"))
            .unwrap_or_else(|| PathBuf::from("state.json"))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "folio")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}
