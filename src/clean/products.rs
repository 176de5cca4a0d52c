use super::fields::{normalize_category, parse_money, parse_stock};
use super::{CleanOptions, CleanedSource, Rejection, RowContext, UNKNOWN_CATEGORY};
use crate::extract::{RawRow, SourceKind};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;

/// Business key of a product: its natural id when the source has one,
/// otherwise the (case-folded) name and category pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ProductKey {
    NaturalId(String),
    NameCategory(String, String),
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductKey::NaturalId(id) => f.write_str(id),
            ProductKey::NameCategory(name, category) => write!(f, "{}/{}", name, category),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProductRecord {
    pub natural_id: Option<String>,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub stock_quantity: i64,
}

impl ProductRecord {
    pub fn key(&self) -> ProductKey {
        match &self.natural_id {
            Some(id) => ProductKey::NaturalId(id.clone()),
            None => {
                ProductKey::NameCategory(self.name.to_lowercase(), self.category.to_lowercase())
            }
        }
    }

    fn absorb(&mut self, newer: ProductRecord) {
        self.name = newer.name;
        self.category = newer.category;
        self.price = newer.price;
        self.stock_quantity = newer.stock_quantity;
    }
}

/// `price_hints` maps a raw product id to the median unit price observed in
/// sales; it is used to fill in a missing list price.
pub fn clean_products(
    rows: &[RawRow],
    options: &CleanOptions,
    price_hints: &HashMap<String, Decimal>,
) -> CleanedSource<ProductRecord> {
    let mut cleaned = CleanedSource::new(SourceKind::Products);
    let mut by_key: HashMap<ProductKey, usize> = HashMap::new();

    for raw in rows {
        let mut ctx = RowContext::new(SourceKind::Products, raw);
        match clean_product_row(&mut ctx, options, price_hints) {
            Err(rejection) => cleaned.push_rejected(raw.index, rejection),
            Ok(record) => {
                let repairs = std::mem::take(&mut ctx.repairs);
                let key = record.key();
                match by_key.get(&key) {
                    Some(&position) => {
                        let key_field = match key {
                            ProductKey::NaturalId(_) => "product_id",
                            ProductKey::NameCategory(..) => "product_name",
                        };
                        cleaned.push_merged(
                            raw.index,
                            position,
                            record,
                            repairs,
                            key_field,
                            &key.to_string(),
                            ProductRecord::absorb,
                        );
                    }
                    None => {
                        let position = cleaned.push_valid(raw.index, record, repairs);
                        by_key.insert(key, position);
                    }
                }
            }
        }
    }
    cleaned
}

fn clean_product_row(
    ctx: &mut RowContext<'_>,
    options: &CleanOptions,
    price_hints: &HashMap<String, Decimal>,
) -> Result<ProductRecord, Rejection> {
    let natural_id = ctx.text("product_id");
    let name = ctx.required("product_name")?;

    let category = match ctx.text("category") {
        Some(value) => normalize_category(&value, &options.categories),
        None => {
            ctx.repaired("category", format!("missing category set to {}", UNKNOWN_CATEGORY));
            UNKNOWN_CATEGORY.to_string()
        }
    };

    let price = match ctx.text("price") {
        Some(value) => ctx.parse("price", &value, parse_money)?,
        None => {
            let hint = natural_id.as_ref().and_then(|id| price_hints.get(id));
            match hint {
                Some(&median) => {
                    ctx.repaired(
                        "price",
                        format!("missing price imputed from sales median {}", median),
                    );
                    median
                }
                None => {
                    return Err(Rejection {
                        error: super::FieldError::Missing("price"),
                        original: ctx.raw("price").map(str::to_string),
                    })
                }
            }
        }
    };

    let stock_quantity = match ctx.text("stock_quantity") {
        Some(value) => ctx.parse("stock_quantity", &value, parse_stock)?,
        None => {
            ctx.repaired("stock_quantity", "missing stock quantity set to 0");
            0
        }
    };

    Ok(ProductRecord {
        natural_id,
        name,
        category,
        price,
        stock_quantity,
    })
}
