//! Per-page asset acquisition with request dedup and background upgrades.
//!
//! Each page has at most one cache entry and at most one acquisition in
//! flight. Candidates are tried strictly in order on the primary path; once
//! one resolves, the better candidates ahead of it are retried in the
//! background and may upgrade the entry's source in place.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt, Shared};
use tokio::sync::broadcast;

use crate::candidates::CandidateResolver;
use crate::error::AcquireError;
use crate::loader::{self, AssetLoader};
use crate::models::{Locator, PageBounds};

/// Capacity of the upgrade notification channel.
const UPGRADE_CHANNEL_CAPACITY: usize = 64;

type SharedAcquisition = Shared<BoxFuture<'static, Result<Locator, AcquireError>>>;

/// Observable state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Pending,
    Loaded,
    Failed,
}

enum CacheEntry {
    Pending(SharedAcquisition),
    Loaded { source: Locator, rank: usize },
    Failed,
}

impl CacheEntry {
    fn status(&self) -> EntryStatus {
        match self {
            Self::Pending(_) => EntryStatus::Pending,
            Self::Loaded { .. } => EntryStatus::Loaded,
            Self::Failed => EntryStatus::Failed,
        }
    }
}

/// Sent when a loaded page's source is replaced by a better candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUpgrade {
    pub page: u32,
    pub source: Locator,
}

/// Acquisition counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcquireStats {
    /// `acquire` calls answered from a loaded entry.
    pub hits: u64,
    /// `acquire` calls that joined an in-flight acquisition.
    pub joined: u64,
    /// Fresh acquisitions started.
    pub started: u64,
    pub failed: u64,
    pub upgraded: u64,
}

struct Inner {
    entries: HashMap<u32, CacheEntry>,
    stats: AcquireStats,
}

/// Owns one entry per page number. Cheap to clone; clones share state.
///
/// `acquire` spawns onto the current tokio runtime and must be called from
/// within one.
pub struct AssetCache<L> {
    loader: Arc<L>,
    resolver: Arc<CandidateResolver>,
    bounds: PageBounds,
    upgrade_timeout: Duration,
    inner: Arc<Mutex<Inner>>,
    upgrades: broadcast::Sender<SourceUpgrade>,
}

impl<L> Clone for AssetCache<L> {
    fn clone(&self) -> Self {
        Self {
            loader: Arc::clone(&self.loader),
            resolver: Arc::clone(&self.resolver),
            bounds: self.bounds,
            upgrade_timeout: self.upgrade_timeout,
            inner: Arc::clone(&self.inner),
            upgrades: self.upgrades.clone(),
        }
    }
}

impl<L: AssetLoader> AssetCache<L> {
    pub fn new(
        loader: L,
        resolver: CandidateResolver,
        bounds: PageBounds,
        upgrade_timeout: Duration,
    ) -> Self {
        let (upgrades, _) = broadcast::channel(UPGRADE_CHANNEL_CAPACITY);
        Self {
            loader: Arc::new(loader),
            resolver: Arc::new(resolver),
            bounds,
            upgrade_timeout,
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                stats: AcquireStats::default(),
            })),
            upgrades,
        }
    }

    /// Resolve the best available source for `page`.
    ///
    /// Loaded entries answer immediately, pending ones are joined, and
    /// missing or failed ones start a fresh acquisition that runs to
    /// completion even if every caller drops its future.
    pub fn acquire(
        &self,
        page: u32,
        timeout: Duration,
    ) -> BoxFuture<'static, Result<Locator, AcquireError>> {
        if !self.bounds.contains(page) {
            return future::ready(Err(AcquireError::OutOfRange {
                page,
                total: self.bounds.total(),
            }))
            .boxed();
        }

        let mut inner = self.lock();
        match inner.entries.get(&page) {
            Some(CacheEntry::Loaded { source, .. }) => {
                let source = source.clone();
                inner.stats.hits += 1;
                tracing::trace!(page, %source, "Cache hit");
                return future::ready(Ok(source)).boxed();
            }
            Some(CacheEntry::Pending(in_flight)) => {
                let in_flight = in_flight.clone();
                inner.stats.joined += 1;
                return in_flight.boxed();
            }
            Some(CacheEntry::Failed) | None => {}
        }

        let acquisition = self.clone().run(page, timeout).boxed().shared();
        inner
            .entries
            .insert(page, CacheEntry::Pending(acquisition.clone()));
        inner.stats.started += 1;
        drop(inner);

        tokio::spawn(acquisition.clone());
        acquisition.boxed()
    }

    async fn run(self, page: u32, timeout: Duration) -> Result<Locator, AcquireError> {
        let candidates = self.resolver.resolve(page);
        let mut last = None;

        for (rank, locator) in candidates.iter().enumerate() {
            match loader::attempt(&*self.loader, locator, timeout).await {
                Ok(()) => {
                    tracing::info!(page, %locator, tag = self.resolver.tag(rank), "Page resolved");
                    self.lock().entries.insert(
                        page,
                        CacheEntry::Loaded {
                            source: locator.clone(),
                            rank,
                        },
                    );
                    for (better_rank, better) in candidates[..rank].iter().enumerate() {
                        self.spawn_upgrade(page, better_rank, better.clone());
                    }
                    return Ok(locator.clone());
                }
                Err(e) => {
                    tracing::debug!(page, error = %e, "Candidate failed");
                    last = Some(e);
                }
            }
        }

        {
            let mut inner = self.lock();
            inner.entries.insert(page, CacheEntry::Failed);
            inner.stats.failed += 1;
        }
        Err(AcquireError::Exhausted {
            page,
            attempted: candidates,
            last,
        })
    }

    /// Fire-and-forget fetch of a better candidate; failures are ignored.
    fn spawn_upgrade(&self, page: u32, rank: usize, locator: Locator) {
        let cache = self.clone();
        tokio::spawn(async move {
            if let Err(e) = loader::attempt(&*cache.loader, &locator, cache.upgrade_timeout).await {
                tracing::trace!(page, error = %e, "Upgrade attempt failed");
                return;
            }
            cache.apply_upgrade(page, rank, locator);
        });
    }

    /// Replace the source only with a strictly better candidate.
    fn apply_upgrade(&self, page: u32, rank: usize, locator: Locator) {
        let mut inner = self.lock();
        let Some(CacheEntry::Loaded {
            source,
            rank: current,
        }) = inner.entries.get_mut(&page)
        else {
            return;
        };
        if rank >= *current {
            return;
        }
        *source = locator.clone();
        *current = rank;
        inner.stats.upgraded += 1;
        drop(inner);

        tracing::info!(page, source = %locator, tag = self.resolver.tag(rank), "Page upgraded");
        // No receivers is fine: nothing is displaying pages yet.
        let _ = self.upgrades.send(SourceUpgrade {
            page,
            source: locator,
        });
    }
}

impl<L> AssetCache<L> {
    /// Current best source of a loaded page. Displays re-read this after upgrades.
    pub fn source(&self, page: u32) -> Option<Locator> {
        match self.lock().entries.get(&page) {
            Some(CacheEntry::Loaded { source, .. }) => Some(source.clone()),
            _ => None,
        }
    }

    pub fn status(&self, page: u32) -> Option<EntryStatus> {
        self.lock().entries.get(&page).map(CacheEntry::status)
    }

    pub fn stats(&self) -> AcquireStats {
        self.lock().stats.clone()
    }

    pub fn subscribe_upgrades(&self) -> broadcast::Receiver<SourceUpgrade> {
        self.upgrades.subscribe()
    }

    pub fn bounds(&self) -> PageBounds {
        self.bounds
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
