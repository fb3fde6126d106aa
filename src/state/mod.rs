use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde_json::Value;

use crate::config::CacheConfig;
use crate::icons::IconCache;

#[derive(Clone)]
pub struct AppState {
    pub database: DatabaseConnection,
    pub cache: Arc<ApiCache>,
    pub icons: Arc<IconCache>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(database: DatabaseConnection, cache: Arc<ApiCache>, icons: Arc<IconCache>) -> Self {
        assert!(
            Arc::strong_count(&icons) >= 1,
            "Icon cache must be shared"
        );
        Self {
            database,
            cache,
            icons,
            start_time: Instant::now(),
        }
    }
}

pub struct ApiCache {
    pub dashboard_stats: Cache<String, Value>,
}

impl ApiCache {
    pub fn new(config: &CacheConfig) -> Self {
        assert!(
            config.stats_max_capacity >= 1,
            "Stats cache capacity threshold"
        );

        let dashboard_stats = Cache::builder()
            .max_capacity(config.stats_max_capacity)
            .time_to_live(Duration::from_secs(config.stats_ttl_seconds))
            .time_to_idle(Duration::from_secs(config.stats_ttl_seconds / 2 + 1))
            .build();

        Self { dashboard_stats }
    }
}
