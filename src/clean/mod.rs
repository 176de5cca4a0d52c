//! Clean & validate stage.
//!
//! Each raw row ends up as exactly one [`RowOutcome`]: kept as a typed record,
//! rejected with a reason, or merged into an earlier row sharing its business
//! key. Every deviation from the raw input is also recorded as an [`Anomaly`],
//! so the data-quality report can be derived by folding over the results.

mod customers;
pub mod fields;
mod products;
mod sales;

pub use customers::{clean_customers, CustomerRecord};
pub use fields::FieldError;
pub use products::{clean_products, ProductKey, ProductRecord};
pub use sales::{clean_sales, sales_price_medians, SaleRecord};

use crate::extract::{RawRow, RawSources, SourceKind};
use serde::Serialize;
use tracing::{debug, info};

pub const DEFAULT_DATE_FORMATS: &[&str] =
    &["%Y-%m-%d", "%d/%m/%Y", "%m-%d-%Y", "%m/%d/%Y", "%d-%m-%Y"];
pub const DEFAULT_CATEGORIES: &[&str] = &["Electronics", "Fashion", "Groceries"];
pub const DEFAULT_PHONE_COUNTRY_CODE: &str = "91";
pub const DEFAULT_ORDER_STATUS: &str = "Pending";
pub const UNKNOWN_CATEGORY: &str = "Unknown";

#[derive(Clone, Debug)]
pub struct CleanOptions {
    pub phone_country_code: String,
    pub date_formats: Vec<String>,
    pub categories: Vec<String>,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            phone_country_code: DEFAULT_PHONE_COUNTRY_CODE.to_string(),
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect(),
            categories: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyAction {
    Repaired,
    Rejected,
    Merged,
}

impl AnomalyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyAction::Repaired => "repaired",
            AnomalyAction::Rejected => "rejected",
            AnomalyAction::Merged => "merged",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Anomaly {
    pub source: SourceKind,
    pub row: usize,
    pub field: String,
    pub original_value: Option<String>,
    pub action: AnomalyAction,
    pub detail: String,
}

impl Anomaly {
    pub fn new(
        source: SourceKind,
        row: usize,
        field: impl Into<String>,
        original_value: Option<&str>,
        action: AnomalyAction,
        detail: impl Into<String>,
    ) -> Self {
        let anomaly = Self {
            source,
            row,
            field: field.into(),
            original_value: original_value.map(str::to_string),
            action,
            detail: detail.into(),
        };
        debug!(
            "{} row {} {}: {} ({})",
            anomaly.source,
            anomaly.row,
            anomaly.action.as_str(),
            anomaly.field,
            anomaly.detail
        );
        anomaly
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RowOutcome<T> {
    Valid(T),
    Rejected { reason: String },
    /// Folded into the row with the given index, which holds the merged record.
    Merged { into: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub struct CleanedRow<T> {
    pub row: usize,
    pub outcome: RowOutcome<T>,
}

#[derive(Clone, Debug)]
pub struct CleanedSource<T> {
    pub kind: SourceKind,
    pub rows: Vec<CleanedRow<T>>,
    pub anomalies: Vec<Anomaly>,
}

impl<T> CleanedSource<T> {
    fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            rows: Vec::new(),
            anomalies: Vec::new(),
        }
    }

    /// Surviving records in first-seen order, with their row index.
    pub fn valid(&self) -> impl Iterator<Item = (usize, &T)> {
        self.rows.iter().filter_map(|r| match &r.outcome {
            RowOutcome::Valid(record) => Some((r.row, record)),
            _ => None,
        })
    }

    pub fn count_rejected(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r.outcome, RowOutcome::Rejected { .. }))
            .count()
    }

    pub fn count_merged(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r.outcome, RowOutcome::Merged { .. }))
            .count()
    }

    /// Kind plus valid, rejected and merged row counts.
    fn counts(&self) -> (SourceKind, usize, usize, usize) {
        (
            self.kind,
            self.valid().count(),
            self.count_rejected(),
            self.count_merged(),
        )
    }

    fn push_rejected(&mut self, row: usize, rejection: Rejection) {
        let reason = rejection.error.to_string();
        self.anomalies.push(Anomaly::new(
            self.kind,
            row,
            rejection.error.field(),
            rejection.original.as_deref(),
            AnomalyAction::Rejected,
            reason.clone(),
        ));
        self.rows.push(CleanedRow {
            row,
            outcome: RowOutcome::Rejected { reason },
        });
    }

    fn push_valid(&mut self, row: usize, record: T, repairs: Vec<Anomaly>) -> usize {
        self.anomalies.extend(repairs);
        self.rows.push(CleanedRow {
            row,
            outcome: RowOutcome::Valid(record),
        });
        self.rows.len() - 1
    }

    /// Fold `record` into the kept row at `position` using `merge`.
    fn push_merged(
        &mut self,
        row: usize,
        position: usize,
        record: T,
        repairs: Vec<Anomaly>,
        key_field: &str,
        key_value: &str,
        merge: impl FnOnce(&mut T, T),
    ) {
        let target = &mut self.rows[position];
        let into = target.row;
        if let RowOutcome::Valid(existing) = &mut target.outcome {
            merge(existing, record);
        }
        self.anomalies.extend(repairs);
        self.anomalies.push(Anomaly::new(
            self.kind,
            row,
            key_field,
            Some(key_value),
            AnomalyAction::Merged,
            format!("duplicate {} merged into row {}", key_field, into),
        ));
        self.rows.push(CleanedRow {
            row,
            outcome: RowOutcome::Merged { into },
        });
    }
}

/// Cleaned output of all three sources.
#[derive(Clone, Debug)]
pub struct CleanedSources {
    pub customers: CleanedSource<CustomerRecord>,
    pub products: CleanedSource<ProductRecord>,
    pub sales: CleanedSource<SaleRecord>,
}

/// Sales are cleaned first: their unit prices feed the imputation of
/// missing product prices.
pub fn clean_all(raw: &RawSources, options: &CleanOptions) -> CleanedSources {
    let customers = clean_customers(&raw.customers, options);
    let sales = clean_sales(&raw.sales, options);
    let price_hints = sales_price_medians(&sales);
    let products = clean_products(&raw.products, options, &price_hints);

    let tallies = [customers.counts(), products.counts(), sales.counts()];
    for (kind, valid, rejected, merged) in tallies {
        info!(
            "Cleaned {}: {} valid, {} rejected, {} merged",
            kind, valid, rejected, merged
        );
    }

    CleanedSources {
        customers,
        products,
        sales,
    }
}

/// A row-level rejection, carrying the offending raw value.
#[derive(Debug)]
struct Rejection {
    error: FieldError,
    original: Option<String>,
}

/// Per-row helper: reads cleaned cells and collects repair anomalies that are
/// only committed if the row survives.
struct RowContext<'a> {
    kind: SourceKind,
    raw: &'a RawRow,
    repairs: Vec<Anomaly>,
}

impl<'a> RowContext<'a> {
    fn new(kind: SourceKind, raw: &'a RawRow) -> Self {
        Self {
            kind,
            raw,
            repairs: Vec::new(),
        }
    }

    fn raw(&self, field: &str) -> Option<&'a str> {
        self.raw.get(field)
    }

    fn text(&self, field: &str) -> Option<String> {
        fields::clean_text(self.raw(field))
    }

    fn required(&self, field: &'static str) -> Result<String, Rejection> {
        self.text(field).ok_or_else(|| Rejection {
            error: FieldError::Missing(field),
            original: self.raw(field).map(str::to_string),
        })
    }

    /// Parse a present cell, turning a parse failure into a rejection.
    fn parse<T>(
        &self,
        field: &'static str,
        value: &str,
        parser: impl FnOnce(&'static str, &str) -> Result<T, FieldError>,
    ) -> Result<T, Rejection> {
        parser(field, value).map_err(|error| Rejection {
            error,
            original: self.raw(field).map(str::to_string),
        })
    }

    fn repaired(&mut self, field: &str, detail: impl Into<String>) {
        let original = self.raw(field);
        self.repairs.push(Anomaly::new(
            self.kind,
            self.raw.index,
            field,
            original,
            AnomalyAction::Repaired,
            detail,
        ));
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::extract::RawRow;

    pub fn raw_row(index: usize, pairs: &[(&str, &str)]) -> RawRow {
        RawRow {
            index,
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}
