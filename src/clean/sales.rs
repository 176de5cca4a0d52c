use super::fields::{median, parse_date, parse_money, parse_quantity, title_case};
use super::{CleanOptions, CleanedSource, Rejection, RowContext};
use crate::extract::{RawRow, SourceKind};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq)]
pub struct SaleRecord {
    pub transaction_id: Option<String>,
    /// Explicit order reference, when the source carries one.
    pub order_ref: Option<String>,
    pub customer_ref: String,
    pub product_ref: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub date: NaiveDate,
    pub status: Option<String>,
}

impl SaleRecord {
    fn absorb(&mut self, newer: SaleRecord) {
        *self = newer;
    }
}

pub fn clean_sales(rows: &[RawRow], options: &CleanOptions) -> CleanedSource<SaleRecord> {
    let mut cleaned = CleanedSource::new(SourceKind::Sales);
    let mut by_transaction: HashMap<String, usize> = HashMap::new();

    for raw in rows {
        let mut ctx = RowContext::new(SourceKind::Sales, raw);
        match clean_sale_row(&mut ctx, options) {
            Err(rejection) => cleaned.push_rejected(raw.index, rejection),
            Ok(record) => {
                let repairs = std::mem::take(&mut ctx.repairs);
                let transaction_id = record.transaction_id.clone();
                match transaction_id
                    .as_ref()
                    .and_then(|id| by_transaction.get(id).copied())
                {
                    Some(position) => {
                        let id = transaction_id.unwrap_or_default();
                        cleaned.push_merged(
                            raw.index,
                            position,
                            record,
                            repairs,
                            "transaction_id",
                            &id,
                            SaleRecord::absorb,
                        );
                    }
                    None => {
                        let position = cleaned.push_valid(raw.index, record, repairs);
                        if let Some(id) = transaction_id {
                            by_transaction.insert(id, position);
                        }
                    }
                }
            }
        }
    }
    cleaned
}

fn clean_sale_row(
    ctx: &mut RowContext<'_>,
    options: &CleanOptions,
) -> Result<SaleRecord, Rejection> {
    let transaction_id = ctx.text("transaction_id");
    let customer_ref = ctx.required("customer_id")?;
    let product_ref = ctx.required("product_id")?;

    let quantity = ctx.required("quantity")?;
    let quantity = ctx.parse("quantity", &quantity, parse_quantity)?;

    let unit_price = ctx.required("unit_price")?;
    let unit_price = ctx.parse("unit_price", &unit_price, parse_money)?;

    let date = ctx.required("transaction_date")?;
    let date = ctx.parse("transaction_date", &date, |field, value| {
        parse_date(field, value, &options.date_formats)
    })?;

    Ok(SaleRecord {
        transaction_id,
        order_ref: ctx.text("order_id"),
        customer_ref,
        product_ref,
        quantity,
        unit_price,
        date,
        status: ctx.text("status").map(|s| title_case(&s)),
    })
}

/// Median sale unit price per raw product id, over the surviving sales lines.
pub fn sales_price_medians(sales: &CleanedSource<SaleRecord>) -> HashMap<String, Decimal> {
    let mut prices: HashMap<String, Vec<Decimal>> = HashMap::new();
    for (_, sale) in sales.valid() {
        prices
            .entry(sale.product_ref.clone())
            .or_default()
            .push(sale.unit_price);
    }
    prices
        .into_iter()
        .filter_map(|(product, mut values)| median(&mut values).map(|m| (product, m)))
        .collect()
}
