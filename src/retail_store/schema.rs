//! Relational schema: customers, products, orders and their line items.
//!
//! Money columns are TEXT holding a canonical two-decimal amount, dates are
//! TEXT `YYYY-MM-DD`.

use crate::sqlite_column;
use crate::sqlite_persistence::{ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema};

const CUSTOMERS_TABLE: Table = Table {
    name: "customers",
    columns: &[
        sqlite_column!("customer_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("first_name", &SqlType::Text, non_null = true),
        sqlite_column!("last_name", &SqlType::Text, non_null = true),
        sqlite_column!("email", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("phone", &SqlType::Text),
        sqlite_column!("city", &SqlType::Text),
        sqlite_column!("registration_date", &SqlType::Text),
    ],
    indices: &[("idx_customers_city", "city")],
};

const PRODUCTS_TABLE: Table = Table {
    name: "products",
    columns: &[
        sqlite_column!("product_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("product_name", &SqlType::Text, non_null = true),
        sqlite_column!("category", &SqlType::Text, non_null = true),
        sqlite_column!("price", &SqlType::Text, non_null = true),
        sqlite_column!(
            "stock_quantity",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[("idx_products_category", "category")],
};

const ORDERS_TABLE: Table = Table {
    name: "orders",
    columns: &[
        sqlite_column!("order_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "customer_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "customers",
                foreign_column: "customer_id",
                on_delete: ForeignKeyOnChange::Restrict,
            })
        ),
        sqlite_column!("order_date", &SqlType::Text, non_null = true),
        sqlite_column!("total_amount", &SqlType::Text, non_null = true),
        sqlite_column!(
            "status",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'Pending'")
        ),
    ],
    indices: &[
        ("idx_orders_customer", "customer_id"),
        ("idx_orders_date", "order_date"),
    ],
};

const ORDER_ITEMS_TABLE: Table = Table {
    name: "order_items",
    columns: &[
        sqlite_column!("order_item_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "order_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "orders",
                foreign_column: "order_id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "product_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "products",
                foreign_column: "product_id",
                on_delete: ForeignKeyOnChange::Restrict,
            })
        ),
        sqlite_column!("quantity", &SqlType::Integer, non_null = true),
        sqlite_column!("unit_price", &SqlType::Text, non_null = true),
        sqlite_column!("subtotal", &SqlType::Text, non_null = true),
    ],
    indices: &[
        ("idx_order_items_order", "order_id"),
        ("idx_order_items_product", "product_id"),
    ],
};

/// Tables in dependency order: referenced tables come first.
pub const RETAIL_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        CUSTOMERS_TABLE,
        PRODUCTS_TABLE,
        ORDERS_TABLE,
        ORDER_ITEMS_TABLE,
    ],
}];
