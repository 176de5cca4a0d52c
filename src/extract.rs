//! Extract stage: reads the three CSV sources into untyped rows.
//!
//! Nothing is interpreted here beyond the header check; every value is kept as
//! the raw string found in the file.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// The three tabular inputs of the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Customers,
    Products,
    Sales,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [
        SourceKind::Customers,
        SourceKind::Products,
        SourceKind::Sales,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Customers => "customers",
            SourceKind::Products => "products",
            SourceKind::Sales => "sales",
        }
    }

    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            SourceKind::Customers => &[
                "customer_id",
                "first_name",
                "last_name",
                "email",
                "phone",
                "city",
                "registration_date",
            ],
            SourceKind::Products => &[
                "product_id",
                "product_name",
                "category",
                "price",
                "stock_quantity",
            ],
            SourceKind::Sales => &[
                "transaction_id",
                "customer_id",
                "product_id",
                "quantity",
                "unit_price",
                "transaction_date",
                "status",
            ],
        }
    }

    pub fn optional_columns(&self) -> &'static [&'static str] {
        match self {
            SourceKind::Sales => &["order_id"],
            _ => &[],
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot read {kind} source {path:?}: {error}")]
    File {
        kind: SourceKind,
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("malformed {kind} source {path:?}: {detail}")]
    Format {
        kind: SourceKind,
        path: PathBuf,
        detail: String,
    },
}

/// One data row of a source file.
#[derive(Clone, Debug, PartialEq)]
pub struct RawRow {
    /// 1-based index of the data row, header excluded.
    pub index: usize,
    pub values: HashMap<String, String>,
}

impl RawRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }
}

#[derive(Clone, Debug)]
pub struct SourcePaths {
    pub customers: PathBuf,
    pub products: PathBuf,
    pub sales: PathBuf,
}

impl SourcePaths {
    pub fn path_for(&self, kind: SourceKind) -> &Path {
        match kind {
            SourceKind::Customers => &self.customers,
            SourceKind::Products => &self.products,
            SourceKind::Sales => &self.sales,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RawSources {
    pub customers: Vec<RawRow>,
    pub products: Vec<RawRow>,
    pub sales: Vec<RawRow>,
}

pub fn extract_all(paths: &SourcePaths) -> Result<RawSources, ExtractError> {
    let customers = extract_source(SourceKind::Customers, &paths.customers)?;
    let products = extract_source(SourceKind::Products, &paths.products)?;
    let sales = extract_source(SourceKind::Sales, &paths.sales)?;
    Ok(RawSources {
        customers,
        products,
        sales,
    })
}

pub fn extract_source(kind: SourceKind, path: &Path) -> Result<Vec<RawRow>, ExtractError> {
    let file = File::open(path).map_err(|error| ExtractError::File {
        kind,
        path: path.to_path_buf(),
        error,
    })?;
    let rows = read_source(kind, file, path)?;
    info!("Read {} {} rows from {:?}", rows.len(), kind, path);
    Ok(rows)
}

/// Parse CSV content from any reader. `path` is only used in error messages.
pub fn read_source<R: Read>(
    kind: SourceKind,
    reader: R,
    path: &Path,
) -> Result<Vec<RawRow>, ExtractError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| csv_error(kind, path, e))?
        .iter()
        .map(normalize_header)
        .collect();

    check_header(kind, &headers).map_err(|detail| ExtractError::Format {
        kind,
        path: path.to_path_buf(),
        detail,
    })?;

    let mut rows = Vec::new();
    for (position, record) in csv_reader.records().enumerate() {
        let record = record.map_err(|e| csv_error(kind, path, e))?;
        let values = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(RawRow {
            index: position + 1,
            values,
        });
    }
    Ok(rows)
}

fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

fn check_header(kind: SourceKind, headers: &[String]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for header in headers {
        if !seen.insert(header.as_str()) {
            return Err(format!("duplicate column '{}'", header));
        }
        let known = kind.required_columns().contains(&header.as_str())
            || kind.optional_columns().contains(&header.as_str());
        if !known {
            return Err(format!("unexpected column '{}'", header));
        }
    }

    let missing: Vec<&str> = kind
        .required_columns()
        .iter()
        .copied()
        .filter(|column| !seen.contains(column))
        .collect();
    if !missing.is_empty() {
        return Err(format!("missing columns: {}", missing.join(", ")));
    }
    Ok(())
}

fn csv_error(kind: SourceKind, path: &Path, error: csv::Error) -> ExtractError {
    let detail = error.to_string();
    match error.into_kind() {
        csv::ErrorKind::Io(error) => ExtractError::File {
            kind,
            path: path.to_path_buf(),
            error,
        },
        _ => ExtractError::Format {
            kind,
            path: path.to_path_buf(),
            detail,
        },
    }
}
