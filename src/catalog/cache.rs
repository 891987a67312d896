//! In-memory catalog with TTL, file snapshot and single-flight refresh

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::crawler::CatalogCrawler;
use super::snapshot::SnapshotStore;
use crate::config::Config;
use crate::parser::CatalogEntry;
use crate::scraper::FetchError;

/// Refresh policy for a [`CatalogCache`]
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// How long a refresh stays fresh
    pub ttl: Duration,
    /// Page ceiling for the refresh crawl
    pub max_pages: u32,
    /// Pause between listing pages
    pub page_delay: Duration,
}

impl CacheSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ttl: config.catalog_ttl,
            max_pages: config.catalog_max_pages,
            page_delay: config.catalog_page_delay,
        }
    }
}

/// One consistent state of the catalog
///
/// Entries and identifiers always come from the same refresh.
#[derive(Debug, Clone, Default)]
pub struct CatalogView {
    entries: Arc<Vec<CatalogEntry>>,
    identifiers: Arc<Vec<String>>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl CatalogView {
    fn new(entries: Vec<CatalogEntry>, refreshed_at: DateTime<Utc>) -> Self {
        let identifiers = entries.iter().map(|e| e.id.clone()).collect();
        Self {
            entries: Arc::new(entries),
            identifiers: Arc::new(identifiers),
            refreshed_at: Some(refreshed_at),
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default)]
struct CacheState {
    view: CatalogView,
    refreshed: Option<Instant>,
    generation: u64,
}

/// Process-wide catalog cache
///
/// Reads are served from memory while fresh. Refreshes are serialized: a
/// caller that waited on another refresh reuses its result instead of
/// crawling again.
pub struct CatalogCache {
    crawler: CatalogCrawler,
    snapshot: Option<SnapshotStore>,
    settings: CacheSettings,
    state: RwLock<CacheState>,
    refresh_lock: Mutex<()>,
}

impl CatalogCache {
    pub fn new(
        crawler: CatalogCrawler,
        snapshot: Option<SnapshotStore>,
        settings: CacheSettings,
    ) -> Self {
        Self {
            crawler,
            snapshot,
            settings,
            state: RwLock::new(CacheState::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Current view without triggering any refresh
    pub fn peek(&self) -> CatalogView {
        self.read().view.clone()
    }

    /// Get the catalog, refreshing when forced, empty or stale
    pub async fn get(&self, force_refresh: bool) -> Result<CatalogView, FetchError> {
        let observed = {
            let state = self.read();
            if !force_refresh && self.is_fresh(&state) {
                return Ok(state.view.clone());
            }
            state.generation
        };

        let _guard = self.refresh_lock.lock().await;

        {
            let state = self.read();
            if state.generation != observed && (force_refresh || self.is_fresh(&state)) {
                debug!("Reusing catalog refreshed by a concurrent request");
                return Ok(state.view.clone());
            }
        }

        let memory_empty = self.read().view.is_empty();
        if !force_refresh && memory_empty {
            if let Some(view) = self.load_snapshot().await {
                return Ok(view);
            }
        }

        let entries = self
            .crawler
            .crawl(1, self.settings.max_pages, self.settings.page_delay)
            .await?;
        let view = self.replace(entries);
        self.persist(&view).await;

        info!("Catalog refreshed with {} entries", view.entries().len());
        Ok(view)
    }

    async fn load_snapshot(&self) -> Option<CatalogView> {
        let store = self.snapshot.as_ref()?;
        let entries = store.load().await.filter(|e| !e.is_empty())?;
        info!(
            "Loaded {} catalog entries from {}",
            entries.len(),
            store.path().display()
        );
        Some(self.replace(entries))
    }

    async fn persist(&self, view: &CatalogView) {
        let Some(store) = &self.snapshot else {
            return;
        };
        if view.is_empty() {
            debug!("Not persisting an empty catalog");
            return;
        }
        if let Err(e) = store.save(view.entries()).await {
            warn!(
                "Failed to persist catalog snapshot to {}: {}",
                store.path().display(),
                e
            );
        }
    }

    /// Swap in a new entry list together with its identifier index
    fn replace(&self, entries: Vec<CatalogEntry>) -> CatalogView {
        let mut state = self.write();
        let stamp = next_stamp(state.view.refreshed_at);
        state.view = CatalogView::new(entries, stamp);
        state.refreshed = Some(Instant::now());
        state.generation += 1;
        state.view.clone()
    }

    fn is_fresh(&self, state: &CacheState) -> bool {
        match state.refreshed {
            Some(at) => !state.view.is_empty() && at.elapsed() < self.settings.ttl,
            None => false,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Refresh stamps never repeat or go backwards
fn next_stamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match previous {
        Some(prev) if now <= prev => prev + chrono::Duration::microseconds(1),
        _ => now,
    }
}
