//! Airdrop campaign entity, one row per tracked campaign.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "airdrops")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Project name, required
    #[sea_orm(column_type = "String(StringLen::N(128))")]
    pub name: String,
    /// Campaign status, one of the closed status set
    #[sea_orm(column_type = "String(StringLen::N(32))")]
    pub status: String,
    /// Comma-joined category tags, empty string when untagged
    pub category: String,
    /// Project website URL, required
    pub website: String,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub instagram: Option<String>,
    pub discord: Option<String>,
    /// Wallet address used for the campaign
    pub wallet: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
