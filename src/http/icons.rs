//! Website icon HTTP handlers: per-record icon bytes, warm-up trigger and
//! warm-up progress reporting.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use crate::icons::IconEntry;
use crate::state::AppState;
use crate::store;

use super::HttpError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/refresh", post(refresh_icons))
        .route("/progress", get(get_progress))
}

#[derive(Debug, Serialize)]
struct RefreshResponse {
    started: bool,
    scheduled: u64,
    completed: u64,
    total: u64,
}

#[derive(Debug, Serialize)]
struct ProgressResponse {
    completed: u64,
    total: u64,
    fraction: f64,
}

/// Serves the cached icon for one record, fetching it on first use. A record
/// whose website could not be resolved yields a 404 so the frontend can fall
/// back to its placeholder glyph.
pub(super) async fn record_icon(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Response, HttpError> {
    let model = store::find_by_id(&state.database, id)
        .await
        .map_err(HttpError::from_store)?
        .ok_or_else(|| {
            HttpError::new(StatusCode::NOT_FOUND, format!("Airdrop {id} not found"))
        })?;

    let entry = state.icons.lookup(&model.website).await;
    match entry.as_ref() {
        IconEntry::Image {
            bytes,
            content_type,
        } => {
            let headers = [(header::CONTENT_TYPE, content_type.clone())];
            Ok((headers, bytes.clone()).into_response())
        }
        IconEntry::Failed => Err(HttpError::new(
            StatusCode::NOT_FOUND,
            format!("Favicon unavailable for {}", model.website),
        )),
    }
}

/// Starts a background warm-up over every tracked website. When a batch is
/// already running the request is accepted and reports that batch instead of
/// starting another.
async fn refresh_icons(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<RefreshResponse>), HttpError> {
    let urls = store::website_urls(&state.database)
        .await
        .map_err(HttpError::from_store)?;
    let scheduled = urls.len() as u64;

    let started = Arc::clone(&state.icons).start_warm(urls);
    if started {
        info!("Icon warm-up started for {scheduled} websites");
    }

    let (completed, total) = state.icons.progress();
    Ok((
        StatusCode::ACCEPTED,
        Json(RefreshResponse {
            started,
            scheduled,
            completed,
            total,
        }),
    ))
}

async fn get_progress(
    State(state): State<AppState>,
) -> Result<Json<ProgressResponse>, HttpError> {
    let (completed, total) = state.icons.progress();
    let fraction = if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64
    };
    assert!((0.0..=1.0).contains(&fraction), "Progress fraction out of range");

    Ok(Json(ProgressResponse {
        completed,
        total,
        fraction,
    }))
}
