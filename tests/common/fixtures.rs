//! Temporary data directories holding the three CSV sources.

#![allow(dead_code)]

use super::constants::*;
use retail_etl::clean::CleanOptions;
use retail_etl::config::{DEFAULT_CUSTOMERS_FILE, DEFAULT_PRODUCTS_FILE, DEFAULT_SALES_FILE};
use retail_etl::extract::SourcePaths;
use retail_etl::pipeline::PipelineOptions;
use retail_etl::transform::OrderGrouping;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestWorkspace {
    // Keeps the directory alive for the duration of the test
    _dir: TempDir,
    pub data_dir: PathBuf,
    pub db_dir: PathBuf,
    pub report_dir: PathBuf,
}

impl TestWorkspace {
    pub fn new(customers: &str, products: &str, sales: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let data_dir = dir.path().join("raw");
        let db_dir = dir.path().join("db");
        fs::create_dir_all(&data_dir).expect("Failed to create data dir");
        fs::create_dir_all(&db_dir).expect("Failed to create db dir");

        let workspace = Self {
            data_dir,
            db_dir,
            report_dir: dir.path().join("reports"),
            _dir: dir,
        };
        workspace.write_source(DEFAULT_CUSTOMERS_FILE, customers);
        workspace.write_source(DEFAULT_PRODUCTS_FILE, products);
        workspace.write_source(DEFAULT_SALES_FILE, sales);
        workspace
    }

    pub fn with_default_sources() -> Self {
        Self::new(CUSTOMERS_CSV, PRODUCTS_CSV, SALES_CSV)
    }

    pub fn write_source(&self, file_name: &str, content: &str) {
        fs::write(self.data_dir.join(file_name), content).expect("Failed to write source");
    }

    pub fn remove_source(&self, file_name: &str) {
        fs::remove_file(self.data_dir.join(file_name)).expect("Failed to remove source");
    }

    pub fn write_documents(&self) -> PathBuf {
        let path = self.data_dir.join("product_documents.json");
        fs::write(&path, DOCUMENTS_JSON).expect("Failed to write documents");
        path
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_dir.join("retail.db")
    }

    pub fn sources(&self) -> SourcePaths {
        SourcePaths {
            customers: self.data_dir.join(DEFAULT_CUSTOMERS_FILE),
            products: self.data_dir.join(DEFAULT_PRODUCTS_FILE),
            sales: self.data_dir.join(DEFAULT_SALES_FILE),
        }
    }

    pub fn options(&self) -> PipelineOptions {
        self.options_with(OrderGrouping::CustomerDate)
    }

    pub fn options_with(&self, grouping: OrderGrouping) -> PipelineOptions {
        PipelineOptions {
            sources: self.sources(),
            db_path: self.db_path(),
            report_dir: self.report_dir.clone(),
            clean: CleanOptions::default(),
            grouping,
        }
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }
}
