mod rollups;
mod schema;
mod store;

pub use rollups::{
    CustomerSegment, MonthRollup, ProductPerformance, QuarterRollup, Segment, YearRollup,
    HIGH_VALUE_THRESHOLD, MEDIUM_VALUE_THRESHOLD,
};
pub use schema::WAREHOUSE_VERSIONED_SCHEMAS;
pub use store::{date_key, DateDimension, SqliteWarehouse, WarehouseBuildSummary};
