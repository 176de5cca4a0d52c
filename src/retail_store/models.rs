//! Entities of the normalized relational store.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub registration_date: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub stock_quantity: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub order_date: NaiveDate,
    pub total_amount: Decimal,
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Everything a single load writes, in dependency order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntitySet {
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub orders: Vec<Order>,
    pub items: Vec<OrderItem>,
}

/// Row counts per table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub customers: usize,
    pub products: usize,
    pub orders: usize,
    pub order_items: usize,
}

impl EntitySet {
    pub fn counts(&self) -> EntityCounts {
        EntityCounts {
            customers: self.customers.len(),
            products: self.products.len(),
            orders: self.orders.len(),
            order_items: self.items.len(),
        }
    }
}
