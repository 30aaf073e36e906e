pub use sea_orm_migration::prelude::*;

mod m20260115_000001_create_risk_factors;
mod m20260115_000002_create_timeseries_data;
mod m20260120_000001_create_indices;
mod m20260120_000002_create_index_constituents;
mod m20260125_000001_create_sync_status;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260115_000001_create_risk_factors::Migration),
            Box::new(m20260115_000002_create_timeseries_data::Migration),
            Box::new(m20260120_000001_create_indices::Migration),
            Box::new(m20260120_000002_create_index_constituents::Migration),
            Box::new(m20260125_000001_create_sync_status::Migration),
        ]
    }
}
