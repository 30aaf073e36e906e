use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create indices table: registry of tracked equity indices
        manager
            .create_table(
                Table::create()
                    .table(Indices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Indices::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Indices::IndexCode)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Indices::IndexName).string().not_null())
                    .col(ColumnDef::new(Indices::Description).text().null())
                    .col(ColumnDef::new(Indices::Country).string().null())
                    .col(
                        ColumnDef::new(Indices::AssetClass)
                            .string()
                            .not_null()
                            .default("equity"),
                    )
                    .col(ColumnDef::new(Indices::DataSource).string().null())
                    .col(
                        ColumnDef::new(Indices::CreatedAt)
                            .timestamp()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(ColumnDef::new(Indices::LastUpdated).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_indices_index_code")
                    .table(Indices::Table)
                    .col(Indices::IndexCode)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Indices::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Indices {
    Table,
    Id,
    IndexCode,
    IndexName,
    Description,
    Country,
    AssetClass,
    DataSource,
    CreatedAt,
    LastUpdated,
}
