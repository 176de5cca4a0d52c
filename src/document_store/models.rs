//! Product documents: the catalog as self-contained JSON records with their
//! reviews embedded.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub user: String,
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
    pub date: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductDocument {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i64,
    /// Free-form, category specific attributes.
    #[serde(default)]
    pub specs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<Seller>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl ProductDocument {
    pub fn average_rating(&self) -> Option<f64> {
        if self.reviews.is_empty() {
            return None;
        }
        let sum: i64 = self.reviews.iter().map(|r| r.rating).sum();
        Some(sum as f64 / self.reviews.len() as f64)
    }
}

/// Outcome of replacing the collection from a snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DocumentLoadSummary {
    pub loaded: usize,
    pub skipped: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RatedProduct {
    pub product_id: String,
    pub name: String,
    pub average_rating: f64,
    pub review_count: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub product_count: u32,
    pub average_price: Decimal,
    pub total_stock: i64,
}
