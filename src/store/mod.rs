//! Persistence layer for airdrop records.
//!
//! Every query goes through sea-orm with bound parameters; the connection
//! handle is injected by the caller rather than held in process-wide state.

use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::airdrop::{AirdropStatus, split_categories};
use crate::entities::airdrop;

const MAX_SEARCH_LIMIT: u64 = 500;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("airdrop {id} not found")]
    NotFound { id: i64 },
}

/// Canonicalized input for insert and update. The caller validates the raw
/// payload; `category` arrives already joined with the persistence delimiter.
#[derive(Debug, Clone)]
pub struct NewAirdrop {
    pub name: String,
    pub status: AirdropStatus,
    pub category: String,
    pub website: String,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub instagram: Option<String>,
    pub discord: Option<String>,
    pub wallet: Option<String>,
    pub notes: Option<String>,
}

pub async fn count_all(database: &DatabaseConnection) -> Result<u64, StoreError> {
    let count = airdrop::Entity::find().count(database).await?;
    Ok(count)
}

pub async fn count_by_status(
    database: &DatabaseConnection,
    status: AirdropStatus,
) -> Result<u64, StoreError> {
    let count = airdrop::Entity::find()
        .filter(airdrop::Column::Status.eq(status.as_str()))
        .count(database)
        .await?;
    Ok(count)
}

pub async fn count_not_status(
    database: &DatabaseConnection,
    status: AirdropStatus,
) -> Result<u64, StoreError> {
    let count = airdrop::Entity::find()
        .filter(airdrop::Column::Status.ne(status.as_str()))
        .count(database)
        .await?;
    Ok(count)
}

pub async fn list_all(database: &DatabaseConnection) -> Result<Vec<airdrop::Model>, StoreError> {
    let models = airdrop::Entity::find()
        .order_by_asc(airdrop::Column::Id)
        .all(database)
        .await?;
    Ok(models)
}

pub async fn find_by_id(
    database: &DatabaseConnection,
    id: i64,
) -> Result<Option<airdrop::Model>, StoreError> {
    let model = airdrop::Entity::find_by_id(id).one(database).await?;
    Ok(model)
}

/// Substring match on the project name. Case-sensitivity follows the SQLite
/// `LIKE` collation of the underlying store.
pub async fn search_by_name(
    database: &DatabaseConnection,
    fragment: &str,
    limit: u64,
) -> Result<Vec<airdrop::Model>, StoreError> {
    assert!(!fragment.is_empty(), "Search fragment must not be empty");
    assert!(limit > 0, "Search limit must be positive");
    assert!(
        limit <= MAX_SEARCH_LIMIT,
        "Search limit exceeds defensive bound"
    );

    let models = airdrop::Entity::find()
        .filter(airdrop::Column::Name.contains(fragment))
        .order_by_asc(airdrop::Column::Id)
        .limit(limit)
        .all(database)
        .await?;
    Ok(models)
}

pub async fn insert(
    database: &DatabaseConnection,
    new: NewAirdrop,
) -> Result<airdrop::Model, StoreError> {
    let now = Utc::now().fixed_offset();
    let active = airdrop::ActiveModel {
        id: NotSet,
        name: Set(new.name),
        status: Set(new.status.as_str().to_string()),
        category: Set(new.category),
        website: Set(new.website),
        twitter: Set(new.twitter),
        telegram: Set(new.telegram),
        instagram: Set(new.instagram),
        discord: Set(new.discord),
        wallet: Set(new.wallet),
        notes: Set(new.notes),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let model = active.insert(database).await?;
    assert!(model.id > 0, "Assigned id must be positive");
    Ok(model)
}

/// Full replace of every field except the id and `created_at`.
pub async fn update(
    database: &DatabaseConnection,
    id: i64,
    new: NewAirdrop,
) -> Result<airdrop::Model, StoreError> {
    let existing = airdrop::Entity::find_by_id(id)
        .one(database)
        .await?
        .ok_or(StoreError::NotFound { id })?;

    let mut active = existing.into_active_model();
    active.name = Set(new.name);
    active.status = Set(new.status.as_str().to_string());
    active.category = Set(new.category);
    active.website = Set(new.website);
    active.twitter = Set(new.twitter);
    active.telegram = Set(new.telegram);
    active.instagram = Set(new.instagram);
    active.discord = Set(new.discord);
    active.wallet = Set(new.wallet);
    active.notes = Set(new.notes);
    active.updated_at = Set(Utc::now().fixed_offset());

    let model = active.update(database).await?;
    assert!(model.id == id, "Update must not reassign the id");
    Ok(model)
}

pub async fn delete(database: &DatabaseConnection, id: i64) -> Result<(), StoreError> {
    let result = airdrop::Entity::delete_by_id(id).exec(database).await?;
    if result.rows_affected == 0 {
        return Err(StoreError::NotFound { id });
    }
    assert!(result.rows_affected == 1, "Primary key delete hit multiple rows");
    Ok(())
}

/// Tag histogram for the dashboard: split every row's category field on the
/// delimiter, trim, drop empties, count occurrences. The BTreeMap keys give
/// the alphabetical order the chart renders in.
pub async fn category_histogram(
    database: &DatabaseConnection,
) -> Result<BTreeMap<String, u64>, StoreError> {
    let rows: Vec<String> = airdrop::Entity::find()
        .select_only()
        .column(airdrop::Column::Category)
        .into_tuple()
        .all(database)
        .await?;

    let mut histogram = BTreeMap::new();
    for row in &rows {
        for tag in split_categories(row) {
            *histogram.entry(tag).or_insert(0u64) += 1;
        }
    }
    Ok(histogram)
}

/// Distinct website URLs across all records, for the icon warm-up fan-out.
pub async fn website_urls(database: &DatabaseConnection) -> Result<Vec<String>, StoreError> {
    let urls: Vec<String> = airdrop::Entity::find()
        .select_only()
        .column(airdrop::Column::Website)
        .distinct()
        .into_tuple()
        .all(database)
        .await?;
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;

    async fn test_database() -> DatabaseConnection {
        let database = Database::connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite connects");
        Migrator::up(&database, None)
            .await
            .expect("migrations apply");
        database
    }

    fn sample(name: &str, status: AirdropStatus, category: &str) -> NewAirdrop {
        NewAirdrop {
            name: name.to_string(),
            status,
            category: category.to_string(),
            website: format!("{}.xyz", name.to_ascii_lowercase()),
            twitter: None,
            telegram: None,
            instagram: None,
            discord: None,
            wallet: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn insert_assigns_fresh_retrievable_ids() {
        let database = test_database().await;

        let first = insert(&database, sample("Foo", AirdropStatus::Delay, "Web,Testnet"))
            .await
            .unwrap();
        let second = insert(&database, sample("Bar", AirdropStatus::Selesai, ""))
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(count_all(&database).await.unwrap(), 2);

        let fetched = find_by_id(&database, first.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Foo");
        assert_eq!(fetched.category, "Web,Testnet");
        assert_eq!(
            split_categories(&fetched.category),
            vec!["Web".to_string(), "Testnet".to_string()]
        );
    }

    #[tokio::test]
    async fn update_replaces_all_fields_except_id() {
        let database = test_database().await;
        let created = insert(&database, sample("Foo", AirdropStatus::Delay, "Web"))
            .await
            .unwrap();

        let replacement = NewAirdrop {
            name: "Renamed".to_string(),
            status: AirdropStatus::Selesai,
            category: "Testnet".to_string(),
            website: "renamed.xyz".to_string(),
            twitter: Some("@renamed".to_string()),
            telegram: None,
            instagram: None,
            discord: Some("discord.gg/renamed".to_string()),
            wallet: Some("0xabc".to_string()),
            notes: Some("migrated".to_string()),
        };
        let updated = update(&database, created.id, replacement).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.status, "Selesai");
        assert_eq!(updated.category, "Testnet");
        assert_eq!(updated.website, "renamed.xyz");
        assert_eq!(updated.twitter.as_deref(), Some("@renamed"));
        assert_eq!(updated.created_at, created.created_at);

        let missing = update(&database, 9_999, sample("X", AirdropStatus::Delay, "")).await;
        assert!(matches!(missing, Err(StoreError::NotFound { id: 9_999 })));
    }

    #[tokio::test]
    async fn delete_removes_record_from_search() {
        let database = test_database().await;
        let created = insert(&database, sample("Zeta", AirdropStatus::Delay, ""))
            .await
            .unwrap();

        assert_eq!(
            search_by_name(&database, "Zeta", 10).await.unwrap().len(),
            1
        );

        delete(&database, created.id).await.unwrap();
        assert!(search_by_name(&database, "Zeta", 10).await.unwrap().is_empty());
        assert!(find_by_id(&database, created.id).await.unwrap().is_none());

        let again = delete(&database, created.id).await;
        assert!(matches!(again, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn search_matches_name_substring() {
        let database = test_database().await;
        insert(&database, sample("Garapan One", AirdropStatus::Delay, ""))
            .await
            .unwrap();
        insert(&database, sample("Garapan Two", AirdropStatus::Selesai, ""))
            .await
            .unwrap();
        insert(&database, sample("Other", AirdropStatus::Delay, ""))
            .await
            .unwrap();

        let hits = search_by_name(&database, "Garapan", 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|m| m.name.starts_with("Garapan")));
    }

    #[tokio::test]
    async fn status_counts_partition_the_table() {
        let database = test_database().await;
        insert(&database, sample("A", AirdropStatus::Selesai, ""))
            .await
            .unwrap();
        insert(&database, sample("B", AirdropStatus::Delay, ""))
            .await
            .unwrap();
        insert(&database, sample("C", AirdropStatus::BelumBerjalan, ""))
            .await
            .unwrap();
        insert(&database, sample("D", AirdropStatus::Selesai, ""))
            .await
            .unwrap();

        let total = count_all(&database).await.unwrap();
        let completed = count_by_status(&database, AirdropStatus::Selesai)
            .await
            .unwrap();
        let pending = count_not_status(&database, AirdropStatus::Selesai)
            .await
            .unwrap();

        assert_eq!(total, 4);
        assert_eq!(completed, 2);
        assert_eq!(total, completed + pending);
    }

    #[tokio::test]
    async fn histogram_counts_tags_alphabetically() {
        let database = test_database().await;
        insert(&database, sample("A", AirdropStatus::Delay, "Web,Testnet"))
            .await
            .unwrap();
        insert(&database, sample("B", AirdropStatus::Delay, "Testnet"))
            .await
            .unwrap();
        insert(&database, sample("C", AirdropStatus::Delay, " Depin , Web "))
            .await
            .unwrap();
        insert(&database, sample("D", AirdropStatus::Delay, ""))
            .await
            .unwrap();

        let histogram = category_histogram(&database).await.unwrap();
        let keys: Vec<&String> = histogram.keys().collect();
        assert_eq!(keys, vec!["Depin", "Testnet", "Web"]);
        assert_eq!(histogram["Web"], 2);
        assert_eq!(histogram["Testnet"], 2);
        assert_eq!(histogram["Depin"], 1);
    }

    #[tokio::test]
    async fn website_urls_are_distinct() {
        let database = test_database().await;
        let mut shared = sample("A", AirdropStatus::Delay, "");
        shared.website = "same.xyz".to_string();
        insert(&database, shared.clone()).await.unwrap();
        let mut other = sample("B", AirdropStatus::Delay, "");
        other.website = "same.xyz".to_string();
        insert(&database, other).await.unwrap();
        insert(&database, sample("C", AirdropStatus::Delay, ""))
            .await
            .unwrap();

        let mut urls = website_urls(&database).await.unwrap();
        urls.sort();
        assert_eq!(urls, vec!["c.xyz".to_string(), "same.xyz".to_string()]);
    }
}
