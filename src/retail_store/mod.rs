mod models;
mod queries;
mod schema;
mod store;

pub use models::*;
pub use queries::{
    CategorySales, CustomerPurchases, MonthlySales, DEFAULT_MIN_ORDERS, DEFAULT_MIN_SPENT,
};
pub use schema::RETAIL_VERSIONED_SCHEMAS;
pub use store::SqliteRetailStore;
pub(crate) use store::{money_from_cents, money_from_row, money_to_sql};
