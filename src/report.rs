//! Data-quality report, folded from the clean and transform outputs.

use crate::clean::{Anomaly, AnomalyAction, CleanedSource, CleanedSources};
use crate::extract::SourceKind;
use crate::load::LoadSummary;
use crate::retail_store::EntityCounts;
use crate::transform::TransformOutput;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const TEXT_REPORT_FILE: &str = "data_quality_report.txt";
pub const JSON_REPORT_FILE: &str = "data_quality_report.json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub source: SourceKind,
    pub total: usize,
    /// Rows that made it into the store as their own entity.
    pub clean: usize,
    pub rejected: usize,
    pub merged: usize,
    /// Rows with at least one repaired field.
    pub repaired: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct QualityReport {
    pub generated_at: DateTime<Utc>,
    pub sources: Vec<SourceSummary>,
    pub loaded: EntityCounts,
    pub orders_dropped: usize,
    pub anomalies: Vec<Anomaly>,
}

fn summarize<T>(
    source: &CleanedSource<T>,
    anomalies: &[Anomaly],
    unresolved: usize,
) -> SourceSummary {
    let total = source.rows.len();
    let rejected = source.count_rejected() + unresolved;
    let merged = source.count_merged();
    let repaired = anomalies
        .iter()
        .filter(|a| a.source == source.kind && a.action == AnomalyAction::Repaired)
        .map(|a| a.row)
        .collect::<HashSet<_>>()
        .len();
    SourceSummary {
        source: source.kind,
        total,
        clean: total.saturating_sub(rejected + merged),
        rejected,
        merged,
        repaired,
    }
}

impl QualityReport {
    pub fn build(
        cleaned: &CleanedSources,
        transformed: &TransformOutput,
        load: &LoadSummary,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let mut anomalies: Vec<Anomaly> = cleaned
            .customers
            .anomalies
            .iter()
            .chain(&cleaned.products.anomalies)
            .chain(&cleaned.sales.anomalies)
            .chain(&transformed.anomalies)
            .cloned()
            .collect();
        anomalies.sort_by_key(|a| (source_rank(a.source), a.row));

        let sources = vec![
            summarize(&cleaned.customers, &anomalies, 0),
            summarize(&cleaned.products, &anomalies, 0),
            summarize(&cleaned.sales, &anomalies, transformed.rejected_lines.len()),
        ];

        Self {
            generated_at,
            sources,
            loaded: load.loaded,
            orders_dropped: transformed.orders_dropped,
            anomalies,
        }
    }

    pub fn summary(&self, kind: SourceKind) -> Option<&SourceSummary> {
        self.sources.iter().find(|s| s.source == kind)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "DATA QUALITY REPORT");
        let _ = writeln!(
            out,
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:<10} {:>8} {:>8} {:>8} {:>8} {:>8}",
            "source", "total", "clean", "rejected", "merged", "repaired"
        );
        for s in &self.sources {
            let _ = writeln!(
                out,
                "{:<10} {:>8} {:>8} {:>8} {:>8} {:>8}",
                s.source.name(),
                s.total,
                s.clean,
                s.rejected,
                s.merged,
                s.repaired
            );
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Loaded customers:   {}", self.loaded.customers);
        let _ = writeln!(out, "Loaded products:    {}", self.loaded.products);
        let _ = writeln!(out, "Loaded orders:      {}", self.loaded.orders);
        let _ = writeln!(out, "Loaded order items: {}", self.loaded.order_items);
        let _ = writeln!(out, "Orders dropped:     {}", self.orders_dropped);
        let _ = writeln!(out);
        let _ = writeln!(out, "Anomalies ({}):", self.anomalies.len());
        for a in &self.anomalies {
            let original = match &a.original_value {
                Some(value) => format!(" [original: '{}']", value),
                None => String::new(),
            };
            let _ = writeln!(
                out,
                "  {} row {} {} {}: {}{}",
                a.source,
                a.row,
                a.field,
                a.action.as_str(),
                a.detail,
                original
            );
        }
        out
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize quality report")
    }

    /// Write the text and JSON renditions into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> Result<(PathBuf, PathBuf)> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create report directory {:?}", dir))?;
        let text_path = dir.join(TEXT_REPORT_FILE);
        let json_path = dir.join(JSON_REPORT_FILE);
        fs::write(&text_path, self.to_text())
            .with_context(|| format!("Failed to write {:?}", text_path))?;
        fs::write(&json_path, self.to_json()?)
            .with_context(|| format!("Failed to write {:?}", json_path))?;
        info!("Wrote quality report to {:?} and {:?}", text_path, json_path);
        Ok((text_path, json_path))
    }
}

fn source_rank(kind: SourceKind) -> usize {
    SourceKind::ALL
        .iter()
        .position(|k| *k == kind)
        .unwrap_or(SourceKind::ALL.len())
}
