//! Retail ETL Library
//!
//! Extracts raw customer, product and sales CSV exports, cleans them, loads
//! them into a normalized SQLite store and reports on data quality. The
//! product document store and the star-schema warehouse are built on top.

pub mod clean;
pub mod cli_style;
pub mod config;
pub mod document_store;
pub mod extract;
pub mod load;
pub mod pipeline;
pub mod report;
pub mod retail_store;
pub mod sqlite_persistence;
pub mod transform;
pub mod warehouse;

// Re-export commonly used types for convenience
pub use document_store::SqliteDocumentStore;
pub use pipeline::{run, run_stages, PipelineOptions, PipelineOutcome};
pub use report::QualityReport;
pub use retail_store::SqliteRetailStore;
pub use transform::OrderGrouping;
pub use warehouse::SqliteWarehouse;
