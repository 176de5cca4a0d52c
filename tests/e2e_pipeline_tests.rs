//! End-to-end tests for the Extract, Clean, Transform, Load and Report run.
//!
//! Every test writes the CSV fixtures from `common::constants` into its own
//! temporary directory and runs the pipeline against a file-backed store.

mod common;

use common::*;
use retail_etl::extract::{ExtractError, SourceKind};
use retail_etl::pipeline;
use retail_etl::report::{JSON_REPORT_FILE, TEXT_REPORT_FILE};
use retail_etl::retail_store::SqliteRetailStore;
use retail_etl::transform::{mismatched_order_totals, OrderGrouping};
use rust_decimal::Decimal;
use std::fs;

fn money(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[test]
fn test_full_run_loads_clean_entities() {
    let workspace = TestWorkspace::with_default_sources();

    let outcome = pipeline::run(&workspace.options()).unwrap();

    let loaded = outcome.summary.loaded;
    assert_eq!(loaded.customers, LOADED_CUSTOMERS);
    assert_eq!(loaded.products, LOADED_PRODUCTS);
    assert_eq!(loaded.orders, LOADED_ORDERS);
    assert_eq!(loaded.order_items, LOADED_ORDER_ITEMS);

    let store = SqliteRetailStore::new(workspace.db_path()).unwrap();
    let counts = store.counts().unwrap();
    assert_eq!(counts, loaded);
}

#[test]
fn test_customers_deduplicated_by_email() {
    let workspace = TestWorkspace::with_default_sources();
    pipeline::run(&workspace.options()).unwrap();

    let store = SqliteRetailStore::new(workspace.db_path()).unwrap();
    let customers = store.list_customers().unwrap();
    let emails: Vec<&str> = customers.iter().map(|c| c.email.as_str()).collect();
    assert_eq!(
        emails,
        vec![
            "rahul.sharma@gmail.com",
            "priya.patel@yahoo.com",
            "sneha.reddy@gmail.com"
        ]
    );

    // The duplicate row had no phone, the known one is kept.
    assert_eq!(customers[0].phone.as_deref(), Some("+91-9876543210"));
    assert_eq!(customers[0].city.as_deref(), Some("Mumbai"));
    assert_eq!(customers[2].city.as_deref(), Some("Hyderabad"));
}

#[test]
fn test_malformed_email_is_excluded_and_reported() {
    let workspace = TestWorkspace::with_default_sources();
    let outcome = pipeline::run(&workspace.options()).unwrap();

    let store = SqliteRetailStore::new(workspace.db_path()).unwrap();
    assert!(store
        .list_customers()
        .unwrap()
        .iter()
        .all(|c| c.email != "not-an-email"));

    let anomaly = outcome
        .report
        .anomalies
        .iter()
        .find(|a| a.source == SourceKind::Customers && a.field == "email")
        .unwrap();
    assert_eq!(anomaly.row, 3);
    assert_eq!(anomaly.original_value.as_deref(), Some("not-an-email"));
}

#[test]
fn test_products_repaired_rejected_and_merged() {
    let workspace = TestWorkspace::with_default_sources();
    let outcome = pipeline::run(&workspace.options()).unwrap();

    let store = SqliteRetailStore::new(workspace.db_path()).unwrap();
    let products = store.list_products().unwrap();
    let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Laptop Pro", "T-Shirt", "Rice 5kg"]);

    // Later duplicate row wins
    assert_eq!(products[0].price, money("47000.00"));
    assert_eq!(products[0].stock_quantity, 45);
    // Missing stock
    assert_eq!(products[1].stock_quantity, 0);
    // Missing price comes from the median sale price
    assert_eq!(products[2].price, money("450.00"));

    let summary = outcome.report.summary(SourceKind::Products).unwrap();
    assert_eq!(summary.total, 5);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.merged, 1);
    assert_eq!(summary.clean, 3);
    assert_eq!(summary.repaired, 2);
}

#[test]
fn test_orders_grouped_by_customer_and_date() {
    let workspace = TestWorkspace::with_default_sources();
    let outcome = pipeline::run(&workspace.options()).unwrap();

    let store = SqliteRetailStore::new(workspace.db_path()).unwrap();
    let orders = store.list_orders().unwrap();
    let totals: Vec<Decimal> = orders.iter().map(|o| o.total_amount).collect();
    assert_eq!(
        totals,
        vec![
            money("46599.00"),
            money("1800.00"),
            money("46000.00"),
            money("900.00")
        ]
    );
    // C004 is the same person as C001
    assert_eq!(orders[0].customer_id, orders[2].customer_id);
    assert_eq!(orders[0].status, "Completed");
    assert_eq!(orders[1].status, "Pending");

    let snapshot = store.snapshot().unwrap();
    assert!(mismatched_order_totals(&snapshot).is_empty());

    // T008 only referenced the rejected product
    assert_eq!(outcome.report.orders_dropped, 1);
    let sales = outcome.report.summary(SourceKind::Sales).unwrap();
    assert_eq!(sales.total, 9);
    assert_eq!(sales.merged, 1);
    assert_eq!(sales.rejected, 3);
    assert_eq!(sales.clean, 5);
}

#[test]
fn test_per_transaction_grouping() {
    let workspace = TestWorkspace::with_default_sources();
    let outcome = pipeline::run(&workspace.options_with(OrderGrouping::PerTransaction)).unwrap();

    assert_eq!(outcome.summary.loaded.orders, 5);
    assert_eq!(outcome.summary.loaded.order_items, 5);
}

#[test]
fn test_rerun_is_idempotent() {
    let workspace = TestWorkspace::with_default_sources();

    pipeline::run(&workspace.options()).unwrap();
    let first = SqliteRetailStore::new(workspace.db_path())
        .unwrap()
        .snapshot()
        .unwrap();

    pipeline::run(&workspace.options()).unwrap();
    let second = SqliteRetailStore::new(workspace.db_path())
        .unwrap()
        .snapshot()
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_report_files_written() {
    let workspace = TestWorkspace::with_default_sources();
    let outcome = pipeline::run(&workspace.options()).unwrap();

    assert_eq!(
        outcome.text_report,
        workspace.report_dir().join(TEXT_REPORT_FILE)
    );
    let text = fs::read_to_string(&outcome.text_report).unwrap();
    assert!(text.starts_with("DATA QUALITY REPORT"));
    assert!(text.contains("not-an-email"));
    assert!(text.contains("Loaded customers:   3"));

    let json_text = fs::read_to_string(workspace.report_dir().join(JSON_REPORT_FILE)).unwrap();
    let json: serde_json::Value = serde_json::from_str(&json_text).unwrap();
    let sources = json["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 3);
    assert_eq!(sources[0]["source"], "customers");
    assert_eq!(sources[0]["rejected"], 1);
    assert_eq!(json["loaded"]["orders"], LOADED_ORDERS);
    assert_eq!(
        json["anomalies"].as_array().unwrap().len(),
        outcome.report.anomalies.len()
    );
}

#[test]
fn test_missing_source_file_is_fatal() {
    let workspace = TestWorkspace::with_default_sources();
    workspace.remove_source("sales_raw.csv");

    let err = pipeline::run(&workspace.options()).unwrap_err();
    match err.downcast_ref::<ExtractError>() {
        Some(ExtractError::File { kind, .. }) => assert_eq!(*kind, SourceKind::Sales),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!workspace.report_dir().join(TEXT_REPORT_FILE).exists());
}

#[test]
fn test_bad_header_is_fatal() {
    let workspace = TestWorkspace::with_default_sources();
    workspace.write_source(
        "products_raw.csv",
        "product_id,product_name,price,stock_quantity\nP001,Laptop,45000,5\n",
    );

    let err = pipeline::run(&workspace.options()).unwrap_err();
    match err.downcast_ref::<ExtractError>() {
        Some(ExtractError::Format { kind, detail, .. }) => {
            assert_eq!(*kind, SourceKind::Products);
            assert!(detail.contains("category"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_failed_run_keeps_previous_load() {
    let workspace = TestWorkspace::with_default_sources();
    pipeline::run(&workspace.options()).unwrap();

    workspace.write_source("customers_raw.csv", "customer_id,nickname\nC001,Rahul\n");
    assert!(pipeline::run(&workspace.options()).is_err());

    let store = SqliteRetailStore::new(workspace.db_path()).unwrap();
    assert_eq!(store.counts().unwrap().customers, LOADED_CUSTOMERS);
}

#[test]
fn test_header_order_and_case_do_not_matter() {
    let workspace = TestWorkspace::with_default_sources();
    workspace.write_source(
        "customers_raw.csv",
        "Email,Customer_ID,First_Name,Last_Name,Phone,City,Registration_Date\n\
         a@b.com,C001,Ana,Silva,,porto,2023-05-01\n",
    );
    workspace.write_source(
        "sales_raw.csv",
        "transaction_id,customer_id,product_id,quantity,unit_price,transaction_date,status\n\
         T1,C001,P003,1,799.50,2024-04-01,completed\n",
    );

    let outcome = pipeline::run(&workspace.options()).unwrap();
    assert_eq!(outcome.summary.loaded.customers, 1);
    assert_eq!(outcome.summary.loaded.orders, 1);

    let store = SqliteRetailStore::new(workspace.db_path()).unwrap();
    assert_eq!(store.list_customers().unwrap()[0].city.as_deref(), Some("Porto"));
}

#[test]
fn test_oversized_amounts_reject_only_their_rows() {
    let workspace = TestWorkspace::with_default_sources();
    workspace.write_source(
        "sales_raw.csv",
        "transaction_id,customer_id,product_id,quantity,unit_price,transaction_date,status\n\
         T1,C001,P003,9223372036854775807,100000000000,2024-04-01,completed\n\
         T2,C001,P003,1,79228162514264337593543950335,2024-04-01,completed\n\
         T3,C001,P003,2,799.50,2024-04-01,completed\n",
    );

    let outcome = pipeline::run(&workspace.options()).unwrap();
    assert_eq!(outcome.summary.loaded.orders, 1);
    assert_eq!(outcome.summary.loaded.order_items, 1);

    let sales = outcome.report.summary(SourceKind::Sales).unwrap();
    assert_eq!(sales.rejected, 2);
    let fields: Vec<&str> = outcome
        .report
        .anomalies
        .iter()
        .filter(|a| a.source == SourceKind::Sales)
        .map(|a| a.field.as_str())
        .collect();
    assert_eq!(fields, vec!["quantity", "unit_price"]);

    let store = SqliteRetailStore::new(workspace.db_path()).unwrap();
    assert_eq!(store.list_orders().unwrap()[0].total_amount, money("1599.00"));
}
