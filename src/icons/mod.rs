//! Session-scoped icon cache keyed by website URL.
//!
//! Entries are either the fetched image bytes or a failure marker; a marker
//! keeps one bad website from being re-fetched on every list render while
//! still letting an explicit invalidation retry it. Invalidation is explicit
//! per URL (on record create, update and delete), never inferred from record
//! counts.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::CacheConfig;
use crate::favicon::FaviconResolver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconEntry {
    Image { bytes: Vec<u8>, content_type: String },
    Failed,
}

pub struct IconCache {
    entries: Cache<String, Arc<IconEntry>>,
    resolver: FaviconResolver,
    concurrency: usize,
    warm_in_flight: AtomicBool,
    completed: AtomicU64,
    total: AtomicU64,
}

impl IconCache {
    pub fn new(resolver: FaviconResolver, concurrency: usize, config: &CacheConfig) -> Self {
        assert!(concurrency > 0, "Fetch concurrency must be positive");
        assert!(
            config.icons_max_capacity >= 16,
            "Icon cache capacity threshold"
        );

        let entries = Cache::builder()
            .max_capacity(config.icons_max_capacity)
            .time_to_live(Duration::from_secs(config.icons_ttl_seconds))
            .time_to_idle(Duration::from_secs(config.icons_ttl_seconds / 2 + 1))
            .build();

        Self {
            entries,
            resolver,
            concurrency,
            warm_in_flight: AtomicBool::new(false),
            completed: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    /// Cache-or-fetch for one website URL. Concurrent lookups for the same
    /// URL coalesce into a single fetch; failures are stored as markers, so
    /// this never returns an error.
    pub async fn lookup(&self, website_url: &str) -> Arc<IconEntry> {
        self.entries
            .get_with(website_url.to_string(), async {
                Arc::new(self.fetch(website_url).await)
            })
            .await
    }

    async fn fetch(&self, website_url: &str) -> IconEntry {
        let Some(icon_url) = self.resolver.resolve(website_url).await else {
            return IconEntry::Failed;
        };
        match self.resolver.fetch_image(&icon_url).await {
            Ok((bytes, content_type)) => {
                debug!("Cached {} byte icon for {website_url}", bytes.len());
                IconEntry::Image {
                    bytes,
                    content_type,
                }
            }
            Err(err) => {
                warn!("Icon download failed for {website_url}: {err}");
                IconEntry::Failed
            }
        }
    }

    /// Kicks off a background warm-up over the given URLs. Returns false when
    /// a warm-up is already running; the in-flight batch is left alone and
    /// keeps reporting its own progress. A started batch runs to completion.
    pub fn start_warm(self: Arc<Self>, urls: Vec<String>) -> bool {
        if self.warm_in_flight.swap(true, AtomicOrdering::SeqCst) {
            return false;
        }
        // Reset before the task runs so progress reads reflect this batch.
        self.completed.store(0, AtomicOrdering::SeqCst);
        self.total.store(urls.len() as u64, AtomicOrdering::SeqCst);

        tokio::spawn(async move {
            Arc::clone(&self).run_warm(urls).await;
            self.warm_in_flight.store(false, AtomicOrdering::SeqCst);
        });
        true
    }

    /// Semaphore-bounded fan-out: each worker resolves and downloads one
    /// URL's icon. Worker failures stay per-URL and never abort the batch.
    async fn run_warm(self: Arc<Self>, urls: Vec<String>) {
        self.completed.store(0, AtomicOrdering::SeqCst);
        self.total.store(urls.len() as u64, AtomicOrdering::SeqCst);
        if urls.is_empty() {
            return;
        }
        info!("Warming icon cache for {} websites", urls.len());

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut workers = JoinSet::new();
        for url in urls {
            let cache = Arc::clone(&self);
            let semaphore = Arc::clone(&semaphore);
            workers.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                cache.lookup(&url).await;
                cache.completed.fetch_add(1, AtomicOrdering::SeqCst);
            });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                warn!("Icon fetch worker failed to join: {err}");
            }
        }

        info!(
            "Icon warm-up finished: {}/{} websites processed",
            self.completed.load(AtomicOrdering::SeqCst),
            self.total.load(AtomicOrdering::SeqCst)
        );
    }

    /// (completed, total) of the most recent warm-up batch.
    pub fn progress(&self) -> (u64, u64) {
        let completed = self.completed.load(AtomicOrdering::SeqCst);
        let total = self.total.load(AtomicOrdering::SeqCst);
        assert!(completed <= total, "Warm-up progress overflowed its total");
        (completed, total)
    }

    pub fn warm_in_flight(&self) -> bool {
        self.warm_in_flight.load(AtomicOrdering::SeqCst)
    }

    /// Drops the entry for one website URL, forcing a re-fetch on next use.
    pub async fn invalidate(&self, website_url: &str) {
        self.entries.invalidate(website_url).await;
    }

    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }
}
