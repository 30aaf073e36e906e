use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create timeseries_data table: one row per (risk factor, date) bar
        manager
            .create_table(
                Table::create()
                    .table(TimeseriesData::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TimeseriesData::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TimeseriesData::RiskFactorId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TimeseriesData::Date).date().not_null())
                    .col(ColumnDef::new(TimeseriesData::Open).double().null())
                    .col(ColumnDef::new(TimeseriesData::High).double().null())
                    .col(ColumnDef::new(TimeseriesData::Low).double().null())
                    .col(ColumnDef::new(TimeseriesData::Close).double().not_null())
                    .col(ColumnDef::new(TimeseriesData::AdjClose).double().null())
                    .col(ColumnDef::new(TimeseriesData::Volume).double().null())
                    .col(
                        ColumnDef::new(TimeseriesData::DataQuality)
                            .string()
                            .not_null()
                            .default("good"),
                    )
                    // Inline so the constraint also applies on SQLite
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_timeseries_data_risk_factor_id")
                            .from(TimeseriesData::Table, TimeseriesData::RiskFactorId)
                            .to(RiskFactors::Table, RiskFactors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Upsert target: one bar per risk factor per day
        manager
            .create_index(
                Index::create()
                    .name("idx_timeseries_data_unique")
                    .table(TimeseriesData::Table)
                    .col(TimeseriesData::RiskFactorId)
                    .col(TimeseriesData::Date)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_timeseries_data_date")
                    .table(TimeseriesData::Table)
                    .col(TimeseriesData::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TimeseriesData::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TimeseriesData {
    Table,
    Id,
    RiskFactorId,
    Date,
    Open,
    High,
    Low,
    Close,
    AdjClose,
    Volume,
    DataQuality,
}

#[derive(DeriveIden)]
enum RiskFactors {
    Table,
    Id,
}
