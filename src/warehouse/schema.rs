//! Star schema: three dimensions around one fact table at order-item grain.

use crate::sqlite_column;
use crate::sqlite_persistence::{ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema};

const DIM_DATE_TABLE: Table = Table {
    name: "dim_date",
    columns: &[
        // YYYYMMDD
        sqlite_column!("date_key", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("full_date", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("day_of_week", &SqlType::Text, non_null = true),
        sqlite_column!("day_of_month", &SqlType::Integer, non_null = true),
        sqlite_column!("month", &SqlType::Integer, non_null = true),
        sqlite_column!("month_name", &SqlType::Text, non_null = true),
        sqlite_column!("quarter", &SqlType::Text, non_null = true),
        sqlite_column!("year", &SqlType::Integer, non_null = true),
        sqlite_column!("is_weekend", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_dim_date_year_month", "year, month")],
};

const DIM_PRODUCT_TABLE: Table = Table {
    name: "dim_product",
    columns: &[
        sqlite_column!("product_key", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("product_id", &SqlType::Integer, non_null = true),
        sqlite_column!("product_name", &SqlType::Text, non_null = true),
        sqlite_column!("category", &SqlType::Text, non_null = true),
        sqlite_column!("list_price", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_dim_product_category", "category")],
};

const DIM_CUSTOMER_TABLE: Table = Table {
    name: "dim_customer",
    columns: &[
        sqlite_column!("customer_key", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("customer_id", &SqlType::Integer, non_null = true),
        sqlite_column!("full_name", &SqlType::Text, non_null = true),
        sqlite_column!("email", &SqlType::Text, non_null = true),
        sqlite_column!("city", &SqlType::Text),
    ],
    indices: &[("idx_dim_customer_city", "city")],
};

const FACT_SALES_TABLE: Table = Table {
    name: "fact_sales",
    columns: &[
        sqlite_column!("sale_key", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "date_key",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "dim_date",
                foreign_column: "date_key",
                on_delete: ForeignKeyOnChange::Restrict,
            })
        ),
        sqlite_column!(
            "product_key",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "dim_product",
                foreign_column: "product_key",
                on_delete: ForeignKeyOnChange::Restrict,
            })
        ),
        sqlite_column!(
            "customer_key",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "dim_customer",
                foreign_column: "customer_key",
                on_delete: ForeignKeyOnChange::Restrict,
            })
        ),
        sqlite_column!("order_id", &SqlType::Integer, non_null = true),
        sqlite_column!("quantity", &SqlType::Integer, non_null = true),
        sqlite_column!("unit_price", &SqlType::Text, non_null = true),
        sqlite_column!("total_amount", &SqlType::Text, non_null = true),
    ],
    indices: &[
        ("idx_fact_sales_date", "date_key"),
        ("idx_fact_sales_product", "product_key"),
        ("idx_fact_sales_customer", "customer_key"),
    ],
};

pub const WAREHOUSE_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        DIM_DATE_TABLE,
        DIM_PRODUCT_TABLE,
        DIM_CUSTOMER_TABLE,
        FACT_SALES_TABLE,
    ],
}];
