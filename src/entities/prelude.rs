pub use super::index_constituents::Entity as IndexConstituents;
pub use super::indices::Entity as Indices;
pub use super::risk_factors::Entity as RiskFactors;
pub use super::sync_status::Entity as SyncStatus;
pub use super::timeseries_data::Entity as TimeseriesData;
