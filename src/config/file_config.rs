use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Locations (can override CLI)
    pub data_dir: Option<String>,
    pub db_dir: Option<String>,
    pub report_dir: Option<String>,
    pub documents_snapshot: Option<String>,

    // Input file names, relative to data_dir
    pub sources: Option<SourcesConfig>,

    // Cleaning rules
    pub cleaning: Option<CleaningConfig>,

    /// "customer_date" or "per_transaction"
    pub order_grouping: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SourcesConfig {
    pub customers: Option<String>,
    pub products: Option<String>,
    pub sales: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CleaningConfig {
    pub phone_country_code: Option<String>,
    pub date_formats: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
data_dir = "/srv/retail/raw"
db_dir = "/srv/retail/db"
report_dir = "/srv/retail/reports"
order_grouping = "per_transaction"

[sources]
customers = "clients.csv"

[cleaning]
phone_country_code = "44"
date_formats = ["%Y-%m-%d"]
categories = ["Electronics", "Home"]
"#
        )
        .unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.data_dir.as_deref(), Some("/srv/retail/raw"));
        assert_eq!(config.order_grouping.as_deref(), Some("per_transaction"));
        let sources = config.sources.unwrap();
        assert_eq!(sources.customers.as_deref(), Some("clients.csv"));
        assert!(sources.sales.is_none());
        let cleaning = config.cleaning.unwrap();
        assert_eq!(cleaning.phone_country_code.as_deref(), Some("44"));
        assert_eq!(cleaning.categories.unwrap().len(), 2);
    }

    #[test]
    fn test_empty_config_is_all_defaults() {
        let file = NamedTempFile::new().unwrap();
        let config = FileConfig::load(file.path()).unwrap();
        assert!(config.data_dir.is_none());
        assert!(config.cleaning.is_none());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "data_dir = [").unwrap();
        let err = FileConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
