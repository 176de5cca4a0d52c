//! SQLite-backed store of product documents.

use super::models::*;
use super::schema::DOCUMENT_VERSIONED_SCHEMAS;
use super::validation::{validate_document, validate_review, ValidationError};
use crate::clean::fields::round_money;
use crate::retail_store::{money_from_cents, money_from_row, money_to_sql};
use crate::sqlite_persistence::initialize_schema;
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

pub struct SqliteDocumentStore {
    conn: Connection,
}

fn parse_document(text: &str) -> rusqlite::Result<ProductDocument> {
    serde_json::from_str(text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

impl SqliteDocumentStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open document database {:?}", db_path))?;
        initialize_schema(&conn, DOCUMENT_VERSIONED_SCHEMAS, "document")?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn, DOCUMENT_VERSIONED_SCHEMAS, "document")?;
        Ok(Self { conn })
    }

    /// Replace the whole collection with the documents in `snapshot`, a JSON
    /// array. Entries that don't deserialize or don't validate are skipped.
    pub fn load_documents(&mut self, snapshot: &str) -> Result<DocumentLoadSummary> {
        let entries: Vec<Value> =
            serde_json::from_str(snapshot).context("Document snapshot is not a JSON array")?;

        let mut summary = DocumentLoadSummary::default();
        let mut seen = HashSet::new();
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM product_documents", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO product_documents (product_id, category, price, document)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, entry) in entries.into_iter().enumerate() {
                let checked = serde_json::from_value::<ProductDocument>(entry)
                    .map_err(|e| ValidationError::Malformed(e.to_string()))
                    .and_then(|mut document| {
                        validate_document(&document)?;
                        document.price = round_money(document.price);
                        if !seen.insert(document.product_id.clone()) {
                            return Err(ValidationError::DuplicateId(document.product_id));
                        }
                        Ok(document)
                    });
                let document = match checked {
                    Ok(document) => document,
                    Err(e) => {
                        warn!("Skipping document #{}: {}", position + 1, e);
                        summary.skipped += 1;
                        continue;
                    }
                };
                stmt.execute(params![
                    document.product_id,
                    document.category,
                    money_to_sql(document.price),
                    serde_json::to_string(&document)?,
                ])?;
                summary.loaded += 1;
            }
        }
        tx.commit()?;
        info!(
            "Loaded {} product documents, skipped {}",
            summary.loaded, summary.skipped
        );
        Ok(summary)
    }

    pub fn load_snapshot_file(&mut self, path: &Path) -> Result<DocumentLoadSummary> {
        let snapshot = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read document snapshot {:?}", path))?;
        self.load_documents(&snapshot)
    }

    pub fn get(&self, product_id: &str) -> Result<Option<ProductDocument>> {
        let document = self
            .conn
            .query_row(
                "SELECT document FROM product_documents WHERE product_id = ?1",
                params![product_id],
                |row| parse_document(&row.get::<_, String>(0)?),
            )
            .optional()?;
        Ok(document)
    }

    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM product_documents", [], |r| r.get(0))?;
        Ok(n as usize)
    }

    /// Documents of `category`, cheapest first, optionally capped at `max_price`.
    pub fn find_by_category(
        &self,
        category: &str,
        max_price: Option<Decimal>,
    ) -> Result<Vec<ProductDocument>> {
        let max_cents = match max_price {
            Some(price) => (price * Decimal::ONE_HUNDRED)
                .round()
                .to_i64()
                .with_context(|| format!("Price {} out of range", price))?,
            None => i64::MAX,
        };
        let mut stmt = self.conn.prepare(
            "SELECT document FROM product_documents
             WHERE category = ?1 COLLATE NOCASE
               AND CAST(ROUND(price * 100) AS INTEGER) <= ?2
             ORDER BY CAST(ROUND(price * 100) AS INTEGER), product_id",
        )?;
        let rows = stmt.query_map(params![category, max_cents], |row| {
            parse_document(&row.get::<_, String>(0)?)
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Products whose average review rating is at least `min_average`, best first.
    pub fn products_with_min_rating(&self, min_average: f64) -> Result<Vec<RatedProduct>> {
        let mut stmt = self.conn.prepare(
            "SELECT d.product_id,
                    json_extract(d.document, '$.name'),
                    AVG(json_extract(r.value, '$.rating')) AS average_rating,
                    COUNT(*)
             FROM product_documents d, json_each(d.document, '$.reviews') r
             GROUP BY d.product_id
             HAVING average_rating >= ?1
             ORDER BY average_rating DESC, d.product_id",
        )?;
        let rows = stmt.query_map(params![min_average], |row| {
            Ok(RatedProduct {
                product_id: row.get(0)?,
                name: row.get(1)?,
                average_rating: row.get(2)?,
                review_count: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Append `review` to the embedded reviews of `product_id`.
    pub fn add_review(&mut self, product_id: &str, review: Review) -> Result<ProductDocument> {
        validate_review(&review)?;
        let tx = self.conn.transaction()?;
        let current = tx
            .query_row(
                "SELECT document FROM product_documents WHERE product_id = ?1",
                params![product_id],
                |row| parse_document(&row.get::<_, String>(0)?),
            )
            .optional()?;
        let Some(mut document) = current else {
            bail!("No product document with id {}", product_id);
        };
        document.reviews.push(review);
        tx.execute(
            "UPDATE product_documents SET document = ?1 WHERE product_id = ?2",
            params![serde_json::to_string(&document)?, product_id],
        )?;
        tx.commit()?;
        Ok(document)
    }

    /// Per category: document count, average price and total stock.
    pub fn category_stats(&self) -> Result<Vec<CategoryStats>> {
        let mut stmt = self.conn.prepare(
            "SELECT category,
                    COUNT(*),
                    SUM(CAST(ROUND(price * 100) AS INTEGER)),
                    SUM(COALESCE(json_extract(document, '$.stock'), 0))
             FROM product_documents
             GROUP BY category
             ORDER BY category",
        )?;
        let rows = stmt.query_map([], |row| {
            let count: u32 = row.get(1)?;
            let total = money_from_cents(row.get(2)?);
            Ok(CategoryStats {
                category: row.get(0)?,
                product_count: count,
                average_price: round_money(total / Decimal::from(count.max(1))),
                total_stock: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Stored price of a document, read from its indexed column.
    pub fn price_of(&self, product_id: &str) -> Result<Option<Decimal>> {
        Ok(self
            .conn
            .query_row(
                "SELECT price FROM product_documents WHERE product_id = ?1",
                params![product_id],
                |row| money_from_row(row, 0),
            )
            .optional()?)
    }
}
