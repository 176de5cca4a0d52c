//! Warehouse database and its population from the relational store.

use super::schema::WAREHOUSE_VERSIONED_SCHEMAS;
use crate::retail_store::{money_to_sql, SqliteRetailStore};
use crate::sqlite_persistence::initialize_schema;
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::info;

/// A row of `dim_date`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateDimension {
    pub date_key: i64,
    pub full_date: NaiveDate,
    pub day_of_week: String,
    pub day_of_month: u32,
    pub month: u32,
    pub month_name: String,
    pub quarter: String,
    pub year: i32,
    pub is_weekend: bool,
}

impl DateDimension {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            date_key: date_key(date),
            full_date: date,
            day_of_week: date.format("%A").to_string(),
            day_of_month: date.day(),
            month: date.month(),
            month_name: date.format("%B").to_string(),
            quarter: format!("Q{}", (date.month() - 1) / 3 + 1),
            year: date.year(),
            is_weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
        }
    }
}

pub fn date_key(date: NaiveDate) -> i64 {
    date.year() as i64 * 10_000 + date.month() as i64 * 100 + date.day() as i64
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WarehouseBuildSummary {
    pub dates: usize,
    pub products: usize,
    pub customers: usize,
    pub facts: usize,
}

pub struct SqliteWarehouse {
    conn: Connection,
}

impl SqliteWarehouse {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open warehouse database {:?}", db_path))?;
        initialize_schema(&conn, WAREHOUSE_VERSIONED_SCHEMAS, "warehouse")?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn, WAREHOUSE_VERSIONED_SCHEMAS, "warehouse")?;
        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Drop and repopulate the whole star schema from `store`, in one transaction.
    pub fn build_from_store(&mut self, store: &SqliteRetailStore) -> Result<WarehouseBuildSummary> {
        let source = store.snapshot()?;
        let schema = &WAREHOUSE_VERSIONED_SCHEMAS[WAREHOUSE_VERSIONED_SCHEMAS.len() - 1];

        let order_dates: HashMap<i64, (NaiveDate, i64)> = source
            .orders
            .iter()
            .map(|o| (o.id, (o.order_date, o.customer_id)))
            .collect();
        let dates: BTreeSet<NaiveDate> = source.orders.iter().map(|o| o.order_date).collect();

        let tx = self.conn.transaction()?;
        schema.drop_tables(&tx)?;
        schema.create(&tx)?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO dim_date (date_key, full_date, day_of_week, day_of_month, month,
                                       month_name, quarter, year, is_weekend)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for date in &dates {
                let d = DateDimension::from_date(*date);
                stmt.execute(params![
                    d.date_key,
                    d.full_date,
                    d.day_of_week,
                    d.day_of_month,
                    d.month,
                    d.month_name,
                    d.quarter,
                    d.year,
                    d.is_weekend,
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO dim_product
                   (product_key, product_id, product_name, category, list_price)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for p in &source.products {
                stmt.execute(params![p.id, p.id, p.name, p.category, money_to_sql(p.price)])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO dim_customer (customer_key, customer_id, full_name, email, city)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for c in &source.customers {
                stmt.execute(params![
                    c.id,
                    c.id,
                    format!("{} {}", c.first_name, c.last_name),
                    c.email,
                    c.city,
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO fact_sales (sale_key, date_key, product_key, customer_key, order_id,
                                         quantity, unit_price, total_amount)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for item in &source.items {
                let (order_date, customer_id) = order_dates
                    .get(&item.order_id)
                    .copied()
                    .with_context(|| {
                        format!("Order item {} has no order {}", item.id, item.order_id)
                    })?;
                stmt.execute(params![
                    item.id,
                    date_key(order_date),
                    item.product_id,
                    customer_id,
                    item.order_id,
                    item.quantity,
                    money_to_sql(item.unit_price),
                    money_to_sql(item.subtotal),
                ])?;
            }
        }
        tx.commit()?;

        let summary = WarehouseBuildSummary {
            dates: dates.len(),
            products: source.products.len(),
            customers: source.customers.len(),
            facts: source.items.len(),
        };
        info!(
            "Built warehouse: {} dates, {} products, {} customers, {} facts",
            summary.dates, summary.products, summary.customers, summary.facts
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_dimension() {
        let d = DateDimension::from_date(NaiveDate::from_ymd_opt(2024, 8, 17).unwrap());
        assert_eq!(d.date_key, 20240817);
        assert_eq!(d.day_of_week, "Saturday");
        assert_eq!(d.month_name, "August");
        assert_eq!(d.quarter, "Q3");
        assert!(d.is_weekend);

        let d = DateDimension::from_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(d.quarter, "Q1");
        assert_eq!(d.day_of_week, "Monday");
        assert!(!d.is_weekend);
    }

    #[test]
    fn test_build_from_empty_store() {
        let store = SqliteRetailStore::open_in_memory().unwrap();
        let mut warehouse = SqliteWarehouse::open_in_memory().unwrap();
        let summary = warehouse.build_from_store(&store).unwrap();
        assert_eq!(summary, WarehouseBuildSummary::default());
    }
}
