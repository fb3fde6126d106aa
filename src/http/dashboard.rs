//! Dashboard HTTP handlers: aggregate status counts and the category
//! histogram behind a short-lived cache.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::airdrop::AirdropStatus;
use crate::state::AppState;
use crate::store;

use super::HttpError;

/// Cache key for the stats payload; mutations invalidate it.
pub const STATS_CACHE_KEY: &str = "dashboard";

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_stats))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    /// All tracked campaigns
    pub total: u64,
    /// Campaigns with status Selesai
    pub completed: u64,
    /// Everything else; total = completed + pending
    pub pending: u64,
    /// Tag occurrence counts, alphabetical by tag
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

async fn get_stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, HttpError> {
    if let Some(cached) = state.cache.dashboard_stats.get(STATS_CACHE_KEY).await {
        let stats: DashboardStats = serde_json::from_value(cached).map_err(|err| {
            HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        })?;
        return Ok(Json(stats));
    }

    let total = store::count_all(&state.database)
        .await
        .map_err(HttpError::from_store)?;
    let completed = store::count_by_status(&state.database, AirdropStatus::Selesai)
        .await
        .map_err(HttpError::from_store)?;
    let pending = store::count_not_status(&state.database, AirdropStatus::Selesai)
        .await
        .map_err(HttpError::from_store)?;
    assert!(
        total == completed + pending,
        "Status counts must partition the table"
    );

    let histogram = store::category_histogram(&state.database)
        .await
        .map_err(HttpError::from_store)?;
    let categories = histogram
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();

    let stats = DashboardStats {
        total,
        completed,
        pending,
        categories,
    };

    let cached: Value = serde_json::to_value(&stats)
        .map_err(|err| HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
    state
        .cache
        .dashboard_stats
        .insert(STATS_CACHE_KEY.to_string(), cached)
        .await;

    Ok(Json(stats))
}
