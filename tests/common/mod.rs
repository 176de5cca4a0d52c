//! Common test infrastructure
//!
//! End-to-end tests run the pipeline against CSV files written to a fresh
//! temporary directory. Tests should only import from this module.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::TestWorkspace;
//!
//! #[test]
//! fn test_load() {
//!     let workspace = TestWorkspace::with_default_sources();
//!     let outcome = retail_etl::pipeline::run(&workspace.options()).unwrap();
//!     assert_eq!(outcome.summary.loaded.customers, 3);
//! }
//! ```

mod constants;
mod fixtures;

pub use constants::*;
pub use fixtures::TestWorkspace;
