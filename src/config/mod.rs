mod file_config;

pub use file_config::{CleaningConfig, FileConfig, SourcesConfig};

use crate::clean::{
    CleanOptions, DEFAULT_CATEGORIES, DEFAULT_DATE_FORMATS, DEFAULT_PHONE_COUNTRY_CODE,
};
use crate::extract::SourcePaths;
use crate::pipeline::PipelineOptions;
use crate::transform::OrderGrouping;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_CUSTOMERS_FILE: &str = "customers_raw.csv";
pub const DEFAULT_PRODUCTS_FILE: &str = "products_raw.csv";
pub const DEFAULT_SALES_FILE: &str = "sales_raw.csv";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub data_dir: Option<PathBuf>,
    pub db_dir: Option<PathBuf>,
    pub report_dir: Option<PathBuf>,
    pub documents_snapshot: Option<PathBuf>,
    pub phone_country_code: Option<String>,
    pub order_grouping: OrderGrouping,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub db_dir: PathBuf,
    pub report_dir: PathBuf,
    pub documents_snapshot: Option<PathBuf>,
    pub sources: SourcePaths,
    pub clean: CleanOptions,
    pub order_grouping: OrderGrouping,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .or_else(|| cli.data_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("data_dir must be specified via --data-dir or in config file")
            })?;
        if !data_dir.is_dir() {
            bail!("Data directory does not exist: {:?}", data_dir);
        }

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .unwrap_or_else(|| data_dir.clone());
        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let report_dir = file
            .report_dir
            .map(PathBuf::from)
            .or_else(|| cli.report_dir.clone())
            .unwrap_or_else(|| db_dir.clone());

        let documents_snapshot = file
            .documents_snapshot
            .map(PathBuf::from)
            .or_else(|| cli.documents_snapshot.clone());

        let sources_file = file.sources.unwrap_or_default();
        let sources = SourcePaths {
            customers: data_dir.join(
                sources_file
                    .customers
                    .as_deref()
                    .unwrap_or(DEFAULT_CUSTOMERS_FILE),
            ),
            products: data_dir.join(
                sources_file
                    .products
                    .as_deref()
                    .unwrap_or(DEFAULT_PRODUCTS_FILE),
            ),
            sales: data_dir.join(sources_file.sales.as_deref().unwrap_or(DEFAULT_SALES_FILE)),
        };

        let cleaning = file.cleaning.unwrap_or_default();
        let clean = CleanOptions {
            phone_country_code: cleaning
                .phone_country_code
                .or_else(|| cli.phone_country_code.clone())
                .unwrap_or_else(|| DEFAULT_PHONE_COUNTRY_CODE.to_string()),
            date_formats: cleaning.date_formats.unwrap_or_else(|| {
                DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect()
            }),
            categories: cleaning.categories.unwrap_or_else(|| {
                DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect()
            }),
        };
        if clean.date_formats.is_empty() {
            bail!("cleaning.date_formats must list at least one format");
        }
        if clean.phone_country_code.is_empty()
            || !clean.phone_country_code.chars().all(|c| c.is_ascii_digit())
        {
            bail!(
                "Invalid phone country code: {:?}",
                clean.phone_country_code
            );
        }

        let order_grouping = match file.order_grouping {
            Some(s) => match parse_order_grouping(&s) {
                Some(grouping) => grouping,
                None => bail!("Unknown order_grouping: {}", s),
            },
            None => cli.order_grouping,
        };

        Ok(Self {
            data_dir,
            db_dir,
            report_dir,
            documents_snapshot,
            sources,
            clean,
            order_grouping,
        })
    }

    pub fn retail_db_path(&self) -> PathBuf {
        self.db_dir.join("retail.db")
    }

    pub fn documents_db_path(&self) -> PathBuf {
        self.db_dir.join("documents.db")
    }

    pub fn warehouse_db_path(&self) -> PathBuf {
        self.db_dir.join("warehouse.db")
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            sources: self.sources.clone(),
            db_path: self.retail_db_path(),
            report_dir: self.report_dir.clone(),
            clean: self.clean.clone(),
            grouping: self.order_grouping,
        }
    }
}

/// Parses an order grouping string into OrderGrouping.
/// Uses clap's ValueEnum trait for parsing.
fn parse_order_grouping(s: &str) -> Option<OrderGrouping> {
    OrderGrouping::from_str(s, true)
        .or_else(|_| OrderGrouping::from_str(&s.replace('_', "-"), true))
        .ok()
}
