//! Load stage: writes an entity set into the relational store.
//!
//! Tables are emptied first, then filled parent-first with one transaction per
//! entity set. Ids come from the [`KeyRegistry`], so re-running a load over the
//! same input reproduces the same rows.

use crate::retail_store::{EntityCounts, EntitySet, SqliteRetailStore};
use crate::transform::{recompute_order_totals, KeyRegistry};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Customers,
    Products,
    Orders,
    OrderItems,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Customers => "customers",
            EntityKind::Products => "products",
            EntityKind::Orders => "orders",
            EntityKind::OrderItems => "order items",
        })
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to reset the relational store")]
    Reset(#[source] anyhow::Error),

    #[error("failed to load {entity}")]
    Entity {
        entity: EntityKind,
        #[source]
        source: anyhow::Error,
    },

    #[error("{entity} entity {id} references unknown {target} {target_id}")]
    DanglingReference {
        entity: EntityKind,
        id: i64,
        target: EntityKind,
        target_id: i64,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub loaded: EntityCounts,
}

/// Every foreign key in `entities` must point at an id the registry handed out.
fn check_references(entities: &EntitySet, keys: &KeyRegistry) -> Result<(), LoadError> {
    for order in &entities.orders {
        if !keys.is_customer(order.customer_id) {
            return Err(LoadError::DanglingReference {
                entity: EntityKind::Orders,
                id: order.id,
                target: EntityKind::Customers,
                target_id: order.customer_id,
            });
        }
    }
    for item in &entities.items {
        if !keys.is_order(item.order_id) {
            return Err(LoadError::DanglingReference {
                entity: EntityKind::OrderItems,
                id: item.id,
                target: EntityKind::Orders,
                target_id: item.order_id,
            });
        }
        if !keys.is_product(item.product_id) {
            return Err(LoadError::DanglingReference {
                entity: EntityKind::OrderItems,
                id: item.id,
                target: EntityKind::Products,
                target_id: item.product_id,
            });
        }
    }
    Ok(())
}

/// Replace the store's contents with `entities`.
///
/// Order totals are recomputed from the items before anything is written. On
/// failure, entity sets committed before the failing one stay in the store.
pub fn load(
    store: &mut SqliteRetailStore,
    entities: &mut EntitySet,
    keys: &KeyRegistry,
) -> Result<LoadSummary, LoadError> {
    check_references(entities, keys)?;
    recompute_order_totals(entities);

    store.reset().map_err(LoadError::Reset)?;

    let wrap =
        |entity: EntityKind| move |source: anyhow::Error| LoadError::Entity { entity, source };

    let customers = store
        .insert_customers(&entities.customers)
        .map_err(wrap(EntityKind::Customers))?;
    info!("Loaded {} customers", customers);

    let products = store
        .insert_products(&entities.products)
        .map_err(wrap(EntityKind::Products))?;
    info!("Loaded {} products", products);

    let orders = store
        .insert_orders(&entities.orders)
        .map_err(wrap(EntityKind::Orders))?;
    info!("Loaded {} orders", orders);

    let order_items = store
        .insert_order_items(&entities.items)
        .map_err(wrap(EntityKind::OrderItems))?;
    info!("Loaded {} order items", order_items);

    Ok(LoadSummary {
        loaded: EntityCounts {
            customers,
            products,
            orders,
            order_items,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::{clean_all, test_support::raw_row, CleanOptions};
    use crate::extract::RawSources;
    use crate::transform::{transform, OrderGrouping, TransformOutput};
    use rust_decimal::Decimal;

    fn transformed() -> TransformOutput {
        let sources = RawSources {
            customers: vec![raw_row(
                1,
                &[
                    ("customer_id", "C001"),
                    ("first_name", "Kiran"),
                    ("last_name", "Das"),
                    ("email", "kiran@example.com"),
                    ("phone", "9876543210"),
                    ("city", "kolkata"),
                    ("registration_date", "2023-07-01"),
                ],
            )],
            products: vec![raw_row(
                1,
                &[
                    ("product_id", "P001"),
                    ("product_name", "Kettle"),
                    ("category", "Groceries"),
                    ("price", "1200"),
                    ("stock_quantity", "8"),
                ],
            )],
            sales: vec![
                raw_row(
                    1,
                    &[
                        ("transaction_id", "T1"),
                        ("customer_id", "C001"),
                        ("product_id", "P001"),
                        ("quantity", "2"),
                        ("unit_price", "1199.99"),
                        ("transaction_date", "2024-04-01"),
                        ("status", "completed"),
                    ],
                ),
                raw_row(
                    2,
                    &[
                        ("transaction_id", "T2"),
                        ("customer_id", "C001"),
                        ("product_id", "P001"),
                        ("quantity", "1"),
                        ("unit_price", "1200"),
                        ("transaction_date", "2024-04-01"),
                        ("status", "completed"),
                    ],
                ),
            ],
        };
        transform(
            &clean_all(&sources, &CleanOptions::default()),
            OrderGrouping::CustomerDate,
        )
    }

    #[test]
    fn test_load_writes_everything() {
        let mut output = transformed();
        let mut store = SqliteRetailStore::open_in_memory().unwrap();
        let summary = load(&mut store, &mut output.entities, &output.keys).unwrap();

        assert_eq!(
            summary.loaded,
            EntityCounts {
                customers: 1,
                products: 1,
                orders: 1,
                order_items: 2,
            }
        );
        let orders = store.list_orders().unwrap();
        assert_eq!(orders[0].total_amount, Decimal::new(359998, 2));
    }

    #[test]
    fn test_reload_is_idempotent() {
        let mut store = SqliteRetailStore::open_in_memory().unwrap();

        let mut first = transformed();
        load(&mut store, &mut first.entities, &first.keys).unwrap();
        let after_first = store.snapshot().unwrap();

        let mut second = transformed();
        load(&mut store, &mut second.entities, &second.keys).unwrap();
        assert_eq!(store.snapshot().unwrap(), after_first);
    }

    #[test]
    fn test_stale_totals_are_recomputed() {
        let mut output = transformed();
        output.entities.orders[0].total_amount = Decimal::ONE;
        let mut store = SqliteRetailStore::open_in_memory().unwrap();
        load(&mut store, &mut output.entities, &output.keys).unwrap();
        assert_eq!(
            store.list_orders().unwrap()[0].total_amount,
            Decimal::new(359998, 2)
        );
    }

    #[test]
    fn test_dangling_reference_is_fatal_before_writing() {
        let mut output = transformed();
        output.entities.items[1].product_id = 99;
        let mut store = SqliteRetailStore::open_in_memory().unwrap();
        let err = load(&mut store, &mut output.entities, &output.keys).unwrap_err();
        assert!(matches!(
            err,
            LoadError::DanglingReference {
                entity: EntityKind::OrderItems,
                target: EntityKind::Products,
                target_id: 99,
                ..
            }
        ));
        assert_eq!(store.counts().unwrap(), EntityCounts::default());
    }

    #[test]
    fn test_constraint_violation_names_failing_set() {
        let mut output = transformed();
        let duplicate = output.entities.items[0].clone();
        output.entities.items.push(duplicate);
        let mut store = SqliteRetailStore::open_in_memory().unwrap();
        let err = load(&mut store, &mut output.entities, &output.keys).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Entity {
                entity: EntityKind::OrderItems,
                ..
            }
        ));
        let counts = store.counts().unwrap();
        assert_eq!(counts.orders, 1);
        assert_eq!(counts.order_items, 0);
    }
}
