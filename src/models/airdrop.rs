use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::airdrop::split_categories;
use crate::entities::airdrop;

/// API-facing shape of a tracked campaign. The persisted comma-joined
/// category string is split back into tags at this boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AirdropView {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub category: Vec<String>,
    pub website: String,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub instagram: Option<String>,
    pub discord: Option<String>,
    pub wallet: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AirdropView {
    pub fn from_model(model: airdrop::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            status: model.status,
            category: split_categories(&model.category),
            website: model.website,
            twitter: model.twitter,
            telegram: model.telegram,
            instagram: model.instagram,
            discord: model.discord,
            wallet: model.wallet,
            notes: model.notes,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
