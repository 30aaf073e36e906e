use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create risk_factors table: one row per tracked instrument/source
        manager
            .create_table(
                Table::create()
                    .table(RiskFactors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RiskFactors::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RiskFactors::Symbol).string().not_null())
                    .col(ColumnDef::new(RiskFactors::AssetClass).string().not_null())
                    .col(ColumnDef::new(RiskFactors::AssetSubclass).string().null())
                    .col(ColumnDef::new(RiskFactors::Description).text().null())
                    .col(ColumnDef::new(RiskFactors::Currency).string_len(3).null())
                    .col(ColumnDef::new(RiskFactors::Country).string().null())
                    .col(ColumnDef::new(RiskFactors::Sector).string().null())
                    .col(ColumnDef::new(RiskFactors::DataSource).string().not_null())
                    .col(
                        ColumnDef::new(RiskFactors::Frequency)
                            .string()
                            .not_null()
                            .default("daily"),
                    )
                    .col(ColumnDef::new(RiskFactors::StartDate).date().null())
                    .col(ColumnDef::new(RiskFactors::EndDate).date().null())
                    .col(ColumnDef::new(RiskFactors::LastUpdated).timestamp().null())
                    .col(
                        ColumnDef::new(RiskFactors::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(RiskFactors::CreatedAt)
                            .timestamp()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await?;

        // One risk factor per (symbol, asset class, source)
        manager
            .create_index(
                Index::create()
                    .name("idx_risk_factors_unique")
                    .table(RiskFactors::Table)
                    .col(RiskFactors::Symbol)
                    .col(RiskFactors::AssetClass)
                    .col(RiskFactors::DataSource)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_risk_factors_symbol")
                    .table(RiskFactors::Table)
                    .col(RiskFactors::Symbol)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RiskFactors::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RiskFactors {
    Table,
    Id,
    Symbol,
    AssetClass,
    AssetSubclass,
    Description,
    Currency,
    Country,
    Sector,
    DataSource,
    Frequency,
    StartDate,
    EndDate,
    LastUpdated,
    IsActive,
    CreatedAt,
}
