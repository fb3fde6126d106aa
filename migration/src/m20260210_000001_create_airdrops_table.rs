use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::Expr;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One flat table holds every tracked campaign; categories are stored
        // comma-joined, socials/wallet/notes are nullable free text.
        manager
            .create_table(
                Table::create()
                    .table(Airdrops::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Airdrops::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Airdrops::Name)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Airdrops::Status)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Airdrops::Category).text().not_null())
                    .col(ColumnDef::new(Airdrops::Website).text().not_null())
                    .col(ColumnDef::new(Airdrops::Twitter).text())
                    .col(ColumnDef::new(Airdrops::Telegram).text())
                    .col(ColumnDef::new(Airdrops::Instagram).text())
                    .col(ColumnDef::new(Airdrops::Discord).text())
                    .col(ColumnDef::new(Airdrops::Wallet).text())
                    .col(ColumnDef::new(Airdrops::Notes).text())
                    .col(
                        ColumnDef::new(Airdrops::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Airdrops::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index for substring search by project name
        manager
            .create_index(
                Index::create()
                    .name("idx_airdrops_name")
                    .table(Airdrops::Table)
                    .col(Airdrops::Name)
                    .to_owned(),
            )
            .await?;

        // Index for the dashboard status counts
        manager
            .create_index(
                Index::create()
                    .name("idx_airdrops_status")
                    .table(Airdrops::Table)
                    .col(Airdrops::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Airdrops::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Airdrops {
    Table,
    Id,
    Name,
    Status,
    Category,
    Website,
    Twitter,
    Telegram,
    Instagram,
    Discord,
    Wallet,
    Notes,
    CreatedAt,
    UpdatedAt,
}
