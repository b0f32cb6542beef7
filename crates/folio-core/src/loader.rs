//! The "attempt to load, resolves or rejects within a timeout" primitive.
//!
//! Loaders only answer whether a locator is fetchable. The timeout race is a
//! single combinator, [`attempt`], shared by primary resolution, prefetch and
//! background upgrades.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{FolioError, LoadError};
use crate::models::Locator;

/// A source that can fetch page assets.
pub trait AssetLoader: Send + Sync + 'static {
    /// Fetch `locator`, resolving once the asset is known to be usable.
    fn load(&self, locator: &Locator) -> impl Future<Output = Result<(), LoadError>> + Send;
}

/// Race one load against a timer: first of success, failure, or timeout.
pub async fn attempt<L: AssetLoader>(
    loader: &L,
    locator: &Locator,
    limit: Duration,
) -> Result<(), LoadError> {
    match tokio::time::timeout(limit, loader.load(locator)).await {
        Ok(result) => result,
        Err(_) => Err(LoadError::Timeout {
            locator: locator.clone(),
            after: limit,
        }),
    }
}

/// Loads assets from a local directory.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl AssetLoader for FsLoader {
    async fn load(&self, locator: &Locator) -> Result<(), LoadError> {
        let path = self.root.join(locator.as_str());
        let bytes = tokio::fs::read(&path).await.map_err(|e| LoadError::Failed {
            locator: locator.clone(),
            reason: e.to_string(),
        })?;
        if bytes.is_empty() {
            return Err(LoadError::Failed {
                locator: locator.clone(),
                reason: "empty file".into(),
            });
        }
        Ok(())
    }
}

/// Loads assets over HTTP(S) relative to a base URL.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    client: reqwest::Client,
    base: Url,
}

impl HttpLoader {
    pub fn new(base: &str) -> Result<Self, FolioError> {
        // Without a trailing slash `join` would replace the last path segment.
        let base = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        let base = Url::parse(&base).map_err(|e| FolioError::Config(format!("assets.base: {e}")))?;
        let client = reqwest::Client::builder()
            .user_agent("folio")
            .build()
            .map_err(|e| FolioError::Config(e.to_string()))?;
        Ok(Self { client, base })
    }

    fn url_for(&self, locator: &Locator) -> Result<Url, LoadError> {
        self.base
            .join(locator.as_str())
            .map_err(|e| LoadError::Failed {
                locator: locator.clone(),
                reason: e.to_string(),
            })
    }
}

impl AssetLoader for HttpLoader {
    async fn load(&self, locator: &Locator) -> Result<(), LoadError> {
        let failed = |e: reqwest::Error| LoadError::Failed {
            locator: locator.clone(),
            reason: e.to_string(),
        };

        let url = self.url_for(locator)?;
        tracing::debug!(%url, "Fetching page asset");
        let bytes = self
            .client
            .get(url)
            .send()
            .await
            .map_err(failed)?
            .error_for_status()
            .map_err(failed)?
            .bytes()
            .await
            .map_err(failed)?;

        if bytes.is_empty() {
            return Err(LoadError::Failed {
                locator: locator.clone(),
                reason: "empty response".into(),
            });
        }
        Ok(())
    }
}

/// The loader selected by `assets.base`.
#[derive(Debug, Clone)]
pub enum Loader {
    Fs(FsLoader),
    Http(HttpLoader),
}

impl Loader {
    /// `http://` and `https://` bases load over the network, anything else is a directory.
    pub fn from_base(base: &str) -> Result<Self, FolioError> {
        if base.starts_with("http://") || base.starts_with("https://") {
            Ok(Self::Http(HttpLoader::new(base)?))
        } else {
            Ok(Self::Fs(FsLoader::new(base)))
        }
    }
}

impl AssetLoader for Loader {
    async fn load(&self, locator: &Locator) -> Result<(), LoadError> {
        match self {
            Self::Fs(fs) => fs.load(locator).await,
            Self::Http(http) => http.load(locator).await,
        }
    }
}
