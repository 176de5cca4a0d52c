//! Wires the stages together: Extract, Clean, Transform, Load, Report.

use crate::clean::{clean_all, CleanOptions};
use crate::extract::{extract_all, RawSources, SourcePaths};
use crate::load::{load, LoadSummary};
use crate::report::QualityReport;
use crate::retail_store::SqliteRetailStore;
use crate::transform::{transform, OrderGrouping};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Clone, Debug)]
pub struct PipelineOptions {
    pub sources: SourcePaths,
    pub db_path: PathBuf,
    pub report_dir: PathBuf,
    pub clean: CleanOptions,
    pub grouping: OrderGrouping,
}

#[derive(Debug)]
pub struct PipelineOutcome {
    pub report: QualityReport,
    pub summary: LoadSummary,
    pub text_report: PathBuf,
    pub json_report: PathBuf,
}

/// Clean, transform and load already-extracted rows into `store`.
pub fn run_stages(
    raw: &RawSources,
    store: &mut SqliteRetailStore,
    clean_options: &CleanOptions,
    grouping: OrderGrouping,
    generated_at: DateTime<Utc>,
) -> Result<(QualityReport, LoadSummary)> {
    let cleaned = clean_all(raw, clean_options);
    let mut transformed = transform(&cleaned, grouping);
    let summary = load(store, &mut transformed.entities, &transformed.keys)?;
    let report = QualityReport::build(&cleaned, &transformed, &summary, generated_at);
    Ok((report, summary))
}

/// Full run against the configured files. The report is only written when
/// the load succeeded.
pub fn run(options: &PipelineOptions) -> Result<PipelineOutcome> {
    let started = Instant::now();
    info!("Starting ETL run");

    let raw = extract_all(&options.sources)?;
    let mut store = SqliteRetailStore::new(&options.db_path)
        .with_context(|| format!("Cannot open relational store {:?}", options.db_path))?;

    let (report, summary) =
        run_stages(&raw, &mut store, &options.clean, options.grouping, Utc::now())?;
    let (text_report, json_report) = report.write_to(&options.report_dir)?;

    info!(
        "ETL run finished in {:.2?}: {} anomalies recorded",
        started.elapsed(),
        report.anomalies.len()
    );
    Ok(PipelineOutcome {
        report,
        summary,
        text_report,
        json_report,
    })
}
