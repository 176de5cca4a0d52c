//! SQLite-backed relational store.

use super::models::*;
use super::schema::RETAIL_VERSIONED_SCHEMAS;
use crate::sqlite_persistence::initialize_schema;
use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Canonical TEXT form of a money amount.
pub(crate) fn money_to_sql(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

/// Read a money column written by [`money_to_sql`].
pub(crate) fn money_from_row(row: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Money amount from an integer count of cents, as produced by the
/// `CAST(ROUND(x * 100) AS INTEGER)` aggregations.
pub(crate) fn money_from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

pub struct SqliteRetailStore {
    conn: Connection,
}

impl SqliteRetailStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        let conn = Connection::open_with_flags(
            db_path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open retail database {:?}", db_path))?;
        initialize_schema(&conn, RETAIL_VERSIONED_SCHEMAS, "retail")?;
        info!("Opened retail store at {:?}", db_path);
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn, RETAIL_VERSIONED_SCHEMAS, "retail")?;
        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Delete every row, children before parents.
    pub fn reset(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        for table in RETAIL_VERSIONED_SCHEMAS[RETAIL_VERSIONED_SCHEMAS.len() - 1]
            .table_names()
            .rev()
        {
            let deleted = tx.execute(&format!("DELETE FROM {}", table), [])?;
            debug!("Reset {}: {} rows deleted", table, deleted);
        }
        tx.commit()?;
        Ok(())
    }

    pub fn insert_customers(&mut self, customers: &[Customer]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO customers (customer_id, first_name, last_name, email, phone, city,
                                        registration_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for c in customers {
                stmt.execute(params![
                    c.id,
                    c.first_name,
                    c.last_name,
                    c.email,
                    c.phone,
                    c.city,
                    c.registration_date,
                ])
                .with_context(|| format!("Failed to insert customer {} ({})", c.id, c.email))?;
            }
        }
        tx.commit()?;
        Ok(customers.len())
    }

    pub fn insert_products(&mut self, products: &[Product]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO products (product_id, product_name, category, price, stock_quantity)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for p in products {
                stmt.execute(params![
                    p.id,
                    p.name,
                    p.category,
                    money_to_sql(p.price),
                    p.stock_quantity,
                ])
                .with_context(|| format!("Failed to insert product {} ({})", p.id, p.name))?;
            }
        }
        tx.commit()?;
        Ok(products.len())
    }

    pub fn insert_orders(&mut self, orders: &[Order]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO orders (order_id, customer_id, order_date, total_amount, status)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for o in orders {
                stmt.execute(params![
                    o.id,
                    o.customer_id,
                    o.order_date,
                    money_to_sql(o.total_amount),
                    o.status,
                ])
                .with_context(|| format!("Failed to insert order {}", o.id))?;
            }
        }
        tx.commit()?;
        Ok(orders.len())
    }

    pub fn insert_order_items(&mut self, items: &[OrderItem]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO order_items (order_item_id, order_id, product_id, quantity,
                                          unit_price, subtotal)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for i in items {
                stmt.execute(params![
                    i.id,
                    i.order_id,
                    i.product_id,
                    i.quantity,
                    money_to_sql(i.unit_price),
                    money_to_sql(i.subtotal),
                ])
                .with_context(|| format!("Failed to insert order item {}", i.id))?;
            }
        }
        tx.commit()?;
        Ok(items.len())
    }

    pub fn list_customers(&self) -> Result<Vec<Customer>> {
        let mut stmt = self.conn.prepare(
            "SELECT customer_id, first_name, last_name, email, phone, city, registration_date
             FROM customers ORDER BY customer_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Customer {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                email: row.get(3)?,
                phone: row.get(4)?,
                city: row.get(5)?,
                registration_date: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn list_products(&self) -> Result<Vec<Product>> {
        let mut stmt = self.conn.prepare(
            "SELECT product_id, product_name, category, price, stock_quantity
             FROM products ORDER BY product_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Product {
                id: row.get(0)?,
                name: row.get(1)?,
                category: row.get(2)?,
                price: money_from_row(row, 3)?,
                stock_quantity: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn list_orders(&self) -> Result<Vec<Order>> {
        let mut stmt = self.conn.prepare(
            "SELECT order_id, customer_id, order_date, total_amount, status
             FROM orders ORDER BY order_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Order {
                id: row.get(0)?,
                customer_id: row.get(1)?,
                order_date: row.get(2)?,
                total_amount: money_from_row(row, 3)?,
                status: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn list_order_items(&self) -> Result<Vec<OrderItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT order_item_id, order_id, product_id, quantity, unit_price, subtotal
             FROM order_items ORDER BY order_item_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(OrderItem {
                id: row.get(0)?,
                order_id: row.get(1)?,
                product_id: row.get(2)?,
                quantity: row.get(3)?,
                unit_price: money_from_row(row, 4)?,
                subtotal: money_from_row(row, 5)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Read back everything, in the same shape a load writes.
    pub fn snapshot(&self) -> Result<EntitySet> {
        Ok(EntitySet {
            customers: self.list_customers()?,
            products: self.list_products()?,
            orders: self.list_orders()?,
            items: self.list_order_items()?,
        })
    }

    pub fn counts(&self) -> Result<EntityCounts> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
            Ok(n as usize)
        };
        Ok(EntityCounts {
            customers: count("customers")?,
            products: count("products")?,
            orders: count("orders")?,
            order_items: count("order_items")?,
        })
    }
}
