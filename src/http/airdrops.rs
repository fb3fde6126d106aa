//! Airdrop record HTTP handlers.
//!
//! This module provides the CRUD surface over tracked campaigns:
//! - Full listing for the campaign list view
//! - Create with required-field validation
//! - Substring search by project name with in-place update and delete
//!
//! Mutations drop the cached dashboard stats and the affected website's icon
//! entry so both are rebuilt from fresh data on next access.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::airdrop::{
    AirdropStatus, canonicalize_handle, canonicalize_name, canonicalize_notes,
    canonicalize_wallet, canonicalize_website, join_categories,
};
use crate::models::airdrop::AirdropView;
use crate::state::AppState;
use crate::store::{self, NewAirdrop};

use super::icons::record_icon;
use super::{HttpError, dashboard};

/// Maximum results returned by a name search
pub const MAX_SEARCH_RESULTS: u64 = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_airdrops).post(create_airdrop))
        .route("/search", get(search_airdrops))
        .route(
            "/{id}",
            get(get_airdrop).put(update_airdrop).delete(delete_airdrop),
        )
        .route("/{id}/icon", get(record_icon))
}

/// Request body for create and update. `category` is the tag list the form
/// multi-select produces; it is joined for persistence after validation.
#[derive(Debug, Deserialize)]
pub struct AirdropPayload {
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub category: Vec<String>,
    pub website: String,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub instagram: Option<String>,
    pub discord: Option<String>,
    pub wallet: Option<String>,
    pub notes: Option<String>,
}

impl AirdropPayload {
    /// Validates every field; a rejected payload writes nothing.
    fn canonicalize(&self) -> Result<NewAirdrop, HttpError> {
        let name = canonicalize_name(&self.name)
            .map_err(|err| HttpError::new(StatusCode::BAD_REQUEST, err.to_string()))?;
        let status = AirdropStatus::parse(&self.status)
            .map_err(|err| HttpError::new(StatusCode::BAD_REQUEST, err.to_string()))?;
        let category = join_categories(&self.category)
            .map_err(|err| HttpError::new(StatusCode::BAD_REQUEST, err.to_string()))?;
        let website = canonicalize_website(&self.website)
            .map_err(|err| HttpError::new(StatusCode::BAD_REQUEST, err.to_string()))?;
        let twitter = canonicalize_handle(self.twitter.as_deref(), "Twitter handle")
            .map_err(|err| HttpError::new(StatusCode::BAD_REQUEST, err.to_string()))?;
        let telegram = canonicalize_handle(self.telegram.as_deref(), "Telegram handle")
            .map_err(|err| HttpError::new(StatusCode::BAD_REQUEST, err.to_string()))?;
        let instagram = canonicalize_handle(self.instagram.as_deref(), "Instagram handle")
            .map_err(|err| HttpError::new(StatusCode::BAD_REQUEST, err.to_string()))?;
        let discord = canonicalize_handle(self.discord.as_deref(), "Discord handle")
            .map_err(|err| HttpError::new(StatusCode::BAD_REQUEST, err.to_string()))?;
        let wallet = canonicalize_wallet(self.wallet.as_deref())
            .map_err(|err| HttpError::new(StatusCode::BAD_REQUEST, err.to_string()))?;
        let notes = canonicalize_notes(self.notes.as_deref())
            .map_err(|err| HttpError::new(StatusCode::BAD_REQUEST, err.to_string()))?;

        Ok(NewAirdrop {
            name,
            status,
            category,
            website,
            twitter,
            telegram,
            instagram,
            discord,
            wallet,
            notes,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: String,
    limit: Option<u64>,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    query: String,
    results: Vec<AirdropView>,
}

#[derive(Debug, Serialize)]
struct DeletedResponse {
    id: i64,
    deleted: bool,
}

async fn list_airdrops(
    State(state): State<AppState>,
) -> Result<Json<Vec<AirdropView>>, HttpError> {
    let models = store::list_all(&state.database)
        .await
        .map_err(HttpError::from_store)?;
    let views = models.into_iter().map(AirdropView::from_model).collect();
    Ok(Json(views))
}

async fn create_airdrop(
    State(state): State<AppState>,
    Json(payload): Json<AirdropPayload>,
) -> Result<(StatusCode, Json<AirdropView>), HttpError> {
    let new = payload.canonicalize()?;
    let website = new.website.clone();

    let model = store::insert(&state.database, new)
        .await
        .map_err(HttpError::from_store)?;
    info!("Saved airdrop {} ({})", model.name, model.id);

    state
        .cache
        .dashboard_stats
        .invalidate(dashboard::STATS_CACHE_KEY)
        .await;
    state.icons.invalidate(&website).await;

    Ok((StatusCode::CREATED, Json(AirdropView::from_model(model))))
}

async fn get_airdrop(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<AirdropView>, HttpError> {
    let model = store::find_by_id(&state.database, id)
        .await
        .map_err(HttpError::from_store)?
        .ok_or_else(|| {
            HttpError::new(StatusCode::NOT_FOUND, format!("Airdrop {id} not found"))
        })?;
    Ok(Json(AirdropView::from_model(model)))
}

/// Full overwrite of every field except the id.
async fn update_airdrop(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<AirdropPayload>,
) -> Result<Json<AirdropView>, HttpError> {
    let new = payload.canonicalize()?;
    let new_website = new.website.clone();

    let existing = store::find_by_id(&state.database, id)
        .await
        .map_err(HttpError::from_store)?
        .ok_or_else(|| {
            HttpError::new(StatusCode::NOT_FOUND, format!("Airdrop {id} not found"))
        })?;
    let previous_website = existing.website;

    let model = store::update(&state.database, id, new)
        .await
        .map_err(HttpError::from_store)?;
    info!("Updated airdrop {} ({})", model.name, model.id);

    state
        .cache
        .dashboard_stats
        .invalidate(dashboard::STATS_CACHE_KEY)
        .await;
    state.icons.invalidate(&previous_website).await;
    if new_website != previous_website {
        state.icons.invalidate(&new_website).await;
    }

    Ok(Json(AirdropView::from_model(model)))
}

async fn delete_airdrop(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<DeletedResponse>, HttpError> {
    let existing = store::find_by_id(&state.database, id)
        .await
        .map_err(HttpError::from_store)?
        .ok_or_else(|| {
            HttpError::new(StatusCode::NOT_FOUND, format!("Airdrop {id} not found"))
        })?;

    store::delete(&state.database, id)
        .await
        .map_err(HttpError::from_store)?;
    info!("Deleted airdrop {} ({id})", existing.name);

    state
        .cache
        .dashboard_stats
        .invalidate(dashboard::STATS_CACHE_KEY)
        .await;
    state.icons.invalidate(&existing.website).await;

    Ok(Json(DeletedResponse { id, deleted: true }))
}

async fn search_airdrops(
    Query(params): Query<SearchParams>,
    State(state): State<AppState>,
) -> Result<Json<SearchResponse>, HttpError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(HttpError::new(
            StatusCode::BAD_REQUEST,
            "Query parameter 'q' must not be empty".to_string(),
        ));
    }

    let limit = params.limit.unwrap_or(50).clamp(1, MAX_SEARCH_RESULTS);

    let models = store::search_by_name(&state.database, query, limit)
        .await
        .map_err(HttpError::from_store)?;
    let results = models.into_iter().map(AirdropView::from_model).collect();

    Ok(Json(SearchResponse {
        query: query.to_string(),
        results,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str, website: &str) -> AirdropPayload {
        AirdropPayload {
            name: name.to_string(),
            status: "Delay".to_string(),
            category: vec!["Web".to_string(), "Testnet".to_string()],
            website: website.to_string(),
            twitter: Some("  ".to_string()),
            telegram: None,
            instagram: None,
            discord: None,
            wallet: None,
            notes: None,
        }
    }

    #[test]
    fn canonicalize_joins_categories_and_blanks_optionals() {
        let new = payload("Foo", "foo.xyz").canonicalize().unwrap();
        assert_eq!(new.name, "Foo");
        assert_eq!(new.category, "Web,Testnet");
        assert_eq!(new.website, "foo.xyz");
        assert!(new.twitter.is_none());
    }

    #[test]
    fn canonicalize_rejects_missing_required_fields() {
        assert!(payload("", "foo.xyz").canonicalize().is_err());
        assert!(payload("Foo", "   ").canonicalize().is_err());
    }

    #[test]
    fn canonicalize_rejects_unknown_status_and_category() {
        let mut bad_status = payload("Foo", "foo.xyz");
        bad_status.status = "Done".to_string();
        assert!(bad_status.canonicalize().is_err());

        let mut bad_category = payload("Foo", "foo.xyz");
        bad_category.category = vec!["Rugpull".to_string()];
        assert!(bad_category.canonicalize().is_err());
    }
}
