//! Business queries over the relational store.
//!
//! Money is summed as integer cents in SQL and turned back into
//! [`Decimal`] on the way out.

use super::store::{money_from_cents, SqliteRetailStore};
use anyhow::{Context, Result};
use rusqlite::params;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

pub const DEFAULT_MIN_ORDERS: u32 = 2;
pub const DEFAULT_MIN_SPENT: Decimal = Decimal::from_parts(5000, 0, 0, false, 0);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomerPurchases {
    pub customer_id: i64,
    pub name: String,
    pub email: String,
    pub order_count: u32,
    pub total_spent: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategorySales {
    pub category: String,
    pub products_sold: u32,
    pub total_quantity: i64,
    pub revenue: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthlySales {
    pub month: u32,
    pub order_count: u32,
    pub revenue: Decimal,
    pub cumulative_revenue: Decimal,
}

fn to_cents(amount: Decimal) -> Result<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .with_context(|| format!("Amount {} out of range", amount))
}

impl SqliteRetailStore {
    /// Customers with at least `min_orders` orders and a total spend strictly
    /// above `min_spent`, biggest spenders first.
    pub fn customer_purchase_history(
        &self,
        min_orders: u32,
        min_spent: Decimal,
    ) -> Result<Vec<CustomerPurchases>> {
        let mut stmt = self.conn().prepare(
            "SELECT c.customer_id,
                    c.first_name || ' ' || c.last_name,
                    c.email,
                    COUNT(o.order_id) AS order_count,
                    SUM(CAST(ROUND(o.total_amount * 100) AS INTEGER)) AS spent_cents
             FROM customers c
             JOIN orders o ON o.customer_id = c.customer_id
             GROUP BY c.customer_id
             HAVING order_count >= ?1 AND spent_cents > ?2
             ORDER BY spent_cents DESC, c.customer_id",
        )?;
        let rows = stmt.query_map(params![min_orders, to_cents(min_spent)?], |row| {
            Ok(CustomerPurchases {
                customer_id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                order_count: row.get(3)?,
                total_spent: money_from_cents(row.get(4)?),
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Per category: distinct products sold, units and revenue. Highest revenue first.
    pub fn product_sales_by_category(&self) -> Result<Vec<CategorySales>> {
        let mut stmt = self.conn().prepare(
            "SELECT p.category,
                    COUNT(DISTINCT p.product_id),
                    SUM(oi.quantity),
                    SUM(CAST(ROUND(oi.subtotal * 100) AS INTEGER)) AS revenue_cents
             FROM order_items oi
             JOIN products p ON p.product_id = oi.product_id
             GROUP BY p.category
             ORDER BY revenue_cents DESC, p.category",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CategorySales {
                category: row.get(0)?,
                products_sold: row.get(1)?,
                total_quantity: row.get(2)?,
                revenue: money_from_cents(row.get(3)?),
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Orders and revenue for each month of `year` that had any, with a running total.
    pub fn monthly_sales_trend(&self, year: i32) -> Result<Vec<MonthlySales>> {
        let mut stmt = self.conn().prepare(
            "SELECT CAST(strftime('%m', order_date) AS INTEGER) AS month,
                    COUNT(*),
                    SUM(CAST(ROUND(total_amount * 100) AS INTEGER))
             FROM orders
             WHERE strftime('%Y', order_date) = ?1
             GROUP BY month
             ORDER BY month",
        )?;
        let rows = stmt
            .query_map(params![format!("{:04}", year)], |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut cumulative = Decimal::ZERO;
        Ok(rows
            .into_iter()
            .map(|(month, order_count, cents)| {
                let revenue = money_from_cents(cents);
                cumulative += revenue;
                MonthlySales {
                    month,
                    order_count,
                    revenue,
                    cumulative_revenue: cumulative,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retail_store::{Customer, Order, OrderItem, Product};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Two customers; customer 1 places three orders, customer 2 one.
    fn populated_store() -> SqliteRetailStore {
        let mut store = SqliteRetailStore::open_in_memory().unwrap();
        let customers = [(1, "Anil", "anil@example.com"), (2, "Divya", "divya@example.com")]
            .into_iter()
            .map(|(id, first, email)| Customer {
                id,
                first_name: first.to_string(),
                last_name: "K".to_string(),
                email: email.to_string(),
                phone: None,
                city: None,
                registration_date: None,
            })
            .collect::<Vec<_>>();
        store.insert_customers(&customers).unwrap();

        let products = vec![
            Product {
                id: 1,
                name: "Laptop".to_string(),
                category: "Electronics".to_string(),
                price: Decimal::new(4500000, 2),
                stock_quantity: 3,
            },
            Product {
                id: 2,
                name: "Shirt".to_string(),
                category: "Fashion".to_string(),
                price: Decimal::new(79999, 2),
                stock_quantity: 10,
            },
        ];
        store.insert_products(&products).unwrap();

        // (order id, customer, date, [(product, qty, unit price cents)])
        let plan: Vec<(i64, i64, NaiveDate, Vec<(i64, i64, i64)>)> = vec![
            (1, 1, date(2024, 1, 10), vec![(1, 1, 4500000)]),
            (2, 1, date(2024, 1, 20), vec![(2, 2, 79999)]),
            (3, 2, date(2024, 3, 5), vec![(2, 1, 79999)]),
            (4, 1, date(2023, 12, 31), vec![(2, 1, 10000)]),
        ];
        let mut orders = Vec::new();
        let mut items = Vec::new();
        for (order_id, customer_id, order_date, lines) in plan {
            let mut total = Decimal::ZERO;
            for (product_id, quantity, cents) in lines {
                let unit_price = Decimal::new(cents, 2);
                let subtotal = unit_price * Decimal::from(quantity);
                total += subtotal;
                items.push(OrderItem {
                    id: items.len() as i64 + 1,
                    order_id,
                    product_id,
                    quantity,
                    unit_price,
                    subtotal,
                });
            }
            orders.push(Order {
                id: order_id,
                customer_id,
                order_date,
                total_amount: total,
                status: "Completed".to_string(),
            });
        }
        store.insert_orders(&orders).unwrap();
        store.insert_order_items(&items).unwrap();
        store
    }

    #[test]
    fn test_customer_purchase_history() {
        let store = populated_store();
        let rows = store
            .customer_purchase_history(DEFAULT_MIN_ORDERS, DEFAULT_MIN_SPENT)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].customer_id, 1);
        assert_eq!(rows[0].name, "Anil K");
        assert_eq!(rows[0].order_count, 3);
        assert_eq!(rows[0].total_spent, Decimal::new(4669998, 2));

        let everyone = store.customer_purchase_history(1, Decimal::ZERO).unwrap();
        assert_eq!(everyone.len(), 2);
        assert_eq!(everyone[1].total_spent, Decimal::new(79999, 2));
    }

    #[test]
    fn test_product_sales_by_category() {
        let store = populated_store();
        let rows = store.product_sales_by_category().unwrap();
        assert_eq!(
            rows,
            vec![
                CategorySales {
                    category: "Electronics".to_string(),
                    products_sold: 1,
                    total_quantity: 1,
                    revenue: Decimal::new(4500000, 2),
                },
                CategorySales {
                    category: "Fashion".to_string(),
                    products_sold: 1,
                    total_quantity: 4,
                    revenue: Decimal::new(249997, 2),
                },
            ]
        );
    }

    #[test]
    fn test_monthly_sales_trend() {
        let store = populated_store();
        let rows = store.monthly_sales_trend(2024).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].month, 1);
        assert_eq!(rows[0].order_count, 2);
        assert_eq!(rows[0].revenue, Decimal::new(4659998, 2));
        assert_eq!(rows[1].month, 3);
        assert_eq!(rows[1].cumulative_revenue, Decimal::new(4739997, 2));

        assert!(store.monthly_sales_trend(2019).unwrap().is_empty());
    }
}
