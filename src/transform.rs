//! Transform stage: turns cleaned records into relational entities.
//!
//! Surrogate ids are handed out in first-seen order by a [`KeyRegistry`], which
//! is returned alongside the entities and travels with them into the load.

use crate::clean::{
    fields::round_money, Anomaly, AnomalyAction, CleanedSources, ProductKey, SaleRecord,
    DEFAULT_ORDER_STATUS,
};
use crate::extract::SourceKind;
use crate::retail_store::{Customer, EntitySet, Order, OrderItem, Product};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

/// How sales lines are grouped into orders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OrderGrouping {
    /// One order per customer and day, split further by an explicit order reference.
    #[default]
    CustomerDate,
    /// Every sales line is its own order.
    PerTransaction,
}

/// Business key of an order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OrderKey {
    pub customer_id: i64,
    pub order_date: NaiveDate,
    pub reference: Option<String>,
}

impl OrderKey {
    fn for_line(grouping: OrderGrouping, customer_id: i64, row: usize, sale: &SaleRecord) -> Self {
        let reference = match grouping {
            OrderGrouping::CustomerDate => sale.order_ref.clone(),
            OrderGrouping::PerTransaction => Some(
                sale.transaction_id
                    .clone()
                    .unwrap_or_else(|| format!("row-{}", row)),
            ),
        };
        Self {
            customer_id,
            order_date: sale.date,
            reference,
        }
    }
}

/// Business key to surrogate id mapping for every entity kind.
#[derive(Debug, Default)]
pub struct KeyRegistry {
    customers_by_email: HashMap<String, i64>,
    customer_refs: HashMap<String, i64>,
    products_by_key: HashMap<ProductKey, i64>,
    product_refs: HashMap<String, i64>,
    orders: HashMap<OrderKey, i64>,
}

impl KeyRegistry {
    fn register_customer(&mut self, email: &str) -> i64 {
        let next = self.customers_by_email.len() as i64 + 1;
        *self
            .customers_by_email
            .entry(email.to_string())
            .or_insert(next)
    }

    fn register_product(&mut self, key: ProductKey) -> i64 {
        let next = self.products_by_key.len() as i64 + 1;
        *self.products_by_key.entry(key).or_insert(next)
    }

    fn register_order(&mut self, key: OrderKey) -> i64 {
        let next = self.orders.len() as i64 + 1;
        *self.orders.entry(key).or_insert(next)
    }

    /// Map a raw source reference to `id`. The first mapping of a reference wins.
    fn alias(refs: &mut HashMap<String, i64>, raw_ref: &str, id: i64, what: &str) {
        match refs.get(raw_ref) {
            Some(&existing) if existing != id => warn!(
                "Raw {} id {} already maps to {}, ignoring mapping to {}",
                what, raw_ref, existing, id
            ),
            Some(_) => {}
            None => {
                refs.insert(raw_ref.to_string(), id);
            }
        }
    }

    pub fn customer_id(&self, raw_ref: &str) -> Option<i64> {
        self.customer_refs.get(raw_ref).copied()
    }

    pub fn customer_id_by_email(&self, email: &str) -> Option<i64> {
        self.customers_by_email.get(&email.to_lowercase()).copied()
    }

    pub fn product_id(&self, raw_ref: &str) -> Option<i64> {
        self.product_refs.get(raw_ref).copied()
    }

    pub fn product_id_by_key(&self, key: &ProductKey) -> Option<i64> {
        self.products_by_key.get(key).copied()
    }

    pub fn order_id(&self, key: &OrderKey) -> Option<i64> {
        self.orders.get(key).copied()
    }

    pub fn customer_count(&self) -> usize {
        self.customers_by_email.len()
    }

    pub fn product_count(&self) -> usize {
        self.products_by_key.len()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn is_customer(&self, id: i64) -> bool {
        id >= 1 && id as usize <= self.customer_count()
    }

    pub fn is_product(&self, id: i64) -> bool {
        id >= 1 && id as usize <= self.product_count()
    }

    pub fn is_order(&self, id: i64) -> bool {
        id >= 1 && id as usize <= self.order_count()
    }
}

#[derive(Debug)]
pub struct TransformOutput {
    pub entities: EntitySet,
    pub keys: KeyRegistry,
    pub anomalies: Vec<Anomaly>,
    /// Sales rows that passed cleaning but could not be resolved.
    pub rejected_lines: Vec<usize>,
    pub orders_dropped: usize,
}

struct OrderDraft {
    key: OrderKey,
    first_row: usize,
    status: Option<String>,
    accepted: usize,
    total: Decimal,
}

struct AcceptedLine {
    draft: usize,
    product_id: i64,
    quantity: i64,
    unit_price: Decimal,
    subtotal: Decimal,
}

pub fn transform(cleaned: &CleanedSources, grouping: OrderGrouping) -> TransformOutput {
    let mut keys = KeyRegistry::default();
    let mut entities = EntitySet::default();
    let mut anomalies = Vec::new();
    let mut rejected_lines = Vec::new();

    for (_, record) in cleaned.customers.valid() {
        let id = keys.register_customer(&record.email);
        for raw_id in &record.raw_ids {
            KeyRegistry::alias(&mut keys.customer_refs, raw_id, id, "customer");
        }
        entities.customers.push(Customer {
            id,
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            city: record.city.clone(),
            registration_date: record.registration_date,
        });
    }

    for (_, record) in cleaned.products.valid() {
        let id = keys.register_product(record.key());
        if let Some(natural_id) = &record.natural_id {
            KeyRegistry::alias(&mut keys.product_refs, natural_id, id, "product");
        }
        entities.products.push(Product {
            id,
            name: record.name.clone(),
            category: record.category.clone(),
            price: record.price,
            stock_quantity: record.stock_quantity,
        });
    }

    let mut drafts: Vec<OrderDraft> = Vec::new();
    let mut draft_index: HashMap<OrderKey, usize> = HashMap::new();
    let mut lines: Vec<AcceptedLine> = Vec::new();

    for (row, sale) in cleaned.sales.valid() {
        let Some(customer_id) = keys.customer_id(&sale.customer_ref) else {
            anomalies.push(Anomaly::new(
                SourceKind::Sales,
                row,
                "customer_id",
                Some(&sale.customer_ref),
                AnomalyAction::Rejected,
                format!("unknown customer reference {}", sale.customer_ref),
            ));
            rejected_lines.push(row);
            continue;
        };

        let key = OrderKey::for_line(grouping, customer_id, row, sale);
        let draft = *draft_index.entry(key.clone()).or_insert_with(|| {
            drafts.push(OrderDraft {
                key,
                first_row: row,
                status: None,
                accepted: 0,
                total: Decimal::ZERO,
            });
            drafts.len() - 1
        });

        let Some(product_id) = keys.product_id(&sale.product_ref) else {
            anomalies.push(Anomaly::new(
                SourceKind::Sales,
                row,
                "product_id",
                Some(&sale.product_ref),
                AnomalyAction::Rejected,
                format!("unknown product reference {}", sale.product_ref),
            ));
            rejected_lines.push(row);
            continue;
        };

        let order = &mut drafts[draft];
        let amounts = Decimal::from(sale.quantity)
            .checked_mul(sale.unit_price)
            .map(round_money)
            .and_then(|subtotal| Some((subtotal, order.total.checked_add(subtotal)?)));
        let Some((subtotal, total)) = amounts else {
            anomalies.push(Anomaly::new(
                SourceKind::Sales,
                row,
                "quantity",
                Some(&sale.quantity.to_string()),
                AnomalyAction::Rejected,
                format!(
                    "amount of {} x {} is out of range",
                    sale.quantity, sale.unit_price
                ),
            ));
            rejected_lines.push(row);
            continue;
        };
        order.total = total;
        order.accepted += 1;
        if sale.status.is_some() {
            order.status = sale.status.clone();
        }
        lines.push(AcceptedLine {
            draft,
            product_id,
            quantity: sale.quantity,
            unit_price: sale.unit_price,
            subtotal,
        });
    }

    let mut order_ids: Vec<Option<i64>> = Vec::with_capacity(drafts.len());
    let mut orders_dropped = 0;
    for draft in &drafts {
        if draft.accepted == 0 {
            orders_dropped += 1;
            anomalies.push(Anomaly::new(
                SourceKind::Sales,
                draft.first_row,
                "order",
                None,
                AnomalyAction::Rejected,
                format!(
                    "order of customer {} on {} dropped: no resolvable items",
                    draft.key.customer_id, draft.key.order_date
                ),
            ));
            order_ids.push(None);
            continue;
        }
        let id = keys.register_order(draft.key.clone());
        order_ids.push(Some(id));
        entities.orders.push(Order {
            id,
            customer_id: draft.key.customer_id,
            order_date: draft.key.order_date,
            total_amount: Decimal::ZERO,
            status: draft
                .status
                .clone()
                .unwrap_or_else(|| DEFAULT_ORDER_STATUS.to_string()),
        });
    }

    for line in lines {
        let Some(order_id) = order_ids[line.draft] else {
            continue;
        };
        entities.items.push(OrderItem {
            id: entities.items.len() as i64 + 1,
            order_id,
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
            subtotal: line.subtotal,
        });
    }

    recompute_order_totals(&mut entities);

    info!(
        "Transformed {} customers, {} products, {} orders, {} order items \
         ({} lines rejected, {} orders dropped)",
        entities.customers.len(),
        entities.products.len(),
        entities.orders.len(),
        entities.items.len(),
        rejected_lines.len(),
        orders_dropped
    );

    TransformOutput {
        entities,
        keys,
        anomalies,
        rejected_lines,
        orders_dropped,
    }
}

/// Set every order's total to the sum of its items' subtotals.
pub fn recompute_order_totals(entities: &mut EntitySet) {
    let mut totals: HashMap<i64, Decimal> = HashMap::new();
    for item in &entities.items {
        let total = totals.entry(item.order_id).or_default();
        *total = total.saturating_add(item.subtotal);
    }
    for order in &mut entities.orders {
        order.total_amount = round_money(totals.get(&order.id).copied().unwrap_or_default());
    }
}

/// Orders whose recorded total differs from the sum of their items.
pub fn mismatched_order_totals(entities: &EntitySet) -> Vec<i64> {
    let mut totals: HashMap<i64, Decimal> = HashMap::new();
    for item in &entities.items {
        let total = totals.entry(item.order_id).or_default();
        *total = total.saturating_add(item.subtotal);
    }
    let with_items: HashSet<i64> = totals.keys().copied().collect();
    entities
        .orders
        .iter()
        .filter(|order| {
            !with_items.contains(&order.id)
                || totals.get(&order.id).copied().unwrap_or_default() != order.total_amount
        })
        .map(|order| order.id)
        .collect()
}
