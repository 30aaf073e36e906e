use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create index_constituents table: effective-dated membership intervals
        manager
            .create_table(
                Table::create()
                    .table(IndexConstituents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IndexConstituents::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(IndexConstituents::IndexId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IndexConstituents::Symbol)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IndexConstituents::EffectiveDate)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(IndexConstituents::EndDate).date().null())
                    .col(ColumnDef::new(IndexConstituents::CompanyName).string().null())
                    .col(ColumnDef::new(IndexConstituents::Sector).string().null())
                    .col(ColumnDef::new(IndexConstituents::SubIndustry).string().null())
                    .col(
                        ColumnDef::new(IndexConstituents::DateAddedToIndex)
                            .date()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(IndexConstituents::ExtractedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IndexConstituents::DataSource)
                            .string()
                            .not_null(),
                    )
                    // Inline so the constraint also applies on SQLite
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_index_constituents_index_id")
                            .from(IndexConstituents::Table, IndexConstituents::IndexId)
                            .to(Indices::Table, Indices::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Retried reconciliations must not duplicate an interval
        manager
            .create_index(
                Index::create()
                    .name("idx_index_constituents_unique")
                    .table(IndexConstituents::Table)
                    .col(IndexConstituents::IndexId)
                    .col(IndexConstituents::Symbol)
                    .col(IndexConstituents::EffectiveDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_index_constituents_symbol")
                    .table(IndexConstituents::Table)
                    .col(IndexConstituents::Symbol)
                    .to_owned(),
            )
            .await?;

        // As-of queries filter on the effective interval
        manager
            .create_index(
                Index::create()
                    .name("idx_index_constituents_dates")
                    .table(IndexConstituents::Table)
                    .col(IndexConstituents::EffectiveDate)
                    .col(IndexConstituents::EndDate)
                    .to_owned(),
            )
            .await?;

        // Current-membership queries filter on (index_id, end_date IS NULL)
        manager
            .create_index(
                Index::create()
                    .name("idx_index_constituents_active")
                    .table(IndexConstituents::Table)
                    .col(IndexConstituents::IndexId)
                    .col(IndexConstituents::EndDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(IndexConstituents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum IndexConstituents {
    Table,
    Id,
    IndexId,
    Symbol,
    EffectiveDate,
    EndDate,
    CompanyName,
    Sector,
    SubIndustry,
    DateAddedToIndex,
    ExtractedAt,
    DataSource,
}

#[derive(DeriveIden)]
enum Indices {
    Table,
    Id,
}
