//! OLAP rollups over the star schema.

use super::store::SqliteWarehouse;
use crate::clean::fields::round_money;
use crate::retail_store::money_from_cents;
use anyhow::Result;
use rusqlite::params;
use rust_decimal::Decimal;
use serde::Serialize;

pub const HIGH_VALUE_THRESHOLD: Decimal = Decimal::from_parts(50_000, 0, 0, false, 0);
pub const MEDIUM_VALUE_THRESHOLD: Decimal = Decimal::from_parts(20_000, 0, 0, false, 0);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthRollup {
    pub month: u32,
    pub month_name: String,
    pub revenue: Decimal,
    pub quantity: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuarterRollup {
    pub quarter: String,
    pub revenue: Decimal,
    pub quantity: i64,
    pub months: Vec<MonthRollup>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct YearRollup {
    pub year: i32,
    pub revenue: Decimal,
    pub quantity: i64,
    pub quarters: Vec<QuarterRollup>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProductPerformance {
    pub product_id: i64,
    pub product_name: String,
    pub category: String,
    pub quantity: i64,
    pub revenue: Decimal,
    /// Share of total revenue, in percent with two decimals.
    pub revenue_share: Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Segment {
    High,
    Medium,
    Low,
}

impl Segment {
    pub fn for_spend(total: Decimal) -> Self {
        if total > HIGH_VALUE_THRESHOLD {
            Segment::High
        } else if total >= MEDIUM_VALUE_THRESHOLD {
            Segment::Medium
        } else {
            Segment::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Segment::High => "High Value",
            Segment::Medium => "Medium Value",
            Segment::Low => "Low Value",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomerSegment {
    pub segment: Segment,
    pub customer_count: u32,
    pub revenue: Decimal,
}

impl SqliteWarehouse {
    /// Revenue and units by year, then quarter, then month.
    pub fn time_drilldown(&self) -> Result<Vec<YearRollup>> {
        let mut stmt = self.conn().prepare(
            "SELECT d.year, d.quarter, d.month, d.month_name,
                    SUM(CAST(ROUND(f.total_amount * 100) AS INTEGER)),
                    SUM(f.quantity)
             FROM fact_sales f
             JOIN dim_date d ON d.date_key = f.date_key
             GROUP BY d.year, d.quarter, d.month, d.month_name
             ORDER BY d.year, d.month",
        )?;
        let months = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i32>(0)?,
                    row.get::<_, String>(1)?,
                    MonthRollup {
                        month: row.get(2)?,
                        month_name: row.get(3)?,
                        revenue: money_from_cents(row.get(4)?),
                        quantity: row.get(5)?,
                    },
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut years: Vec<YearRollup> = Vec::new();
        for (year, quarter, month) in months {
            if years.last().map(|y| y.year) != Some(year) {
                years.push(YearRollup {
                    year,
                    revenue: Decimal::ZERO,
                    quantity: 0,
                    quarters: Vec::new(),
                });
            }
            let Some(year_rollup) = years.last_mut() else {
                continue;
            };
            year_rollup.revenue += month.revenue;
            year_rollup.quantity += month.quantity;

            if year_rollup.quarters.last().map(|q| q.quarter.as_str()) != Some(quarter.as_str()) {
                year_rollup.quarters.push(QuarterRollup {
                    quarter,
                    revenue: Decimal::ZERO,
                    quantity: 0,
                    months: Vec::new(),
                });
            }
            if let Some(quarter_rollup) = year_rollup.quarters.last_mut() {
                quarter_rollup.revenue += month.revenue;
                quarter_rollup.quantity += month.quantity;
                quarter_rollup.months.push(month);
            }
        }
        Ok(years)
    }

    /// Best-selling products by revenue, with their share of all revenue.
    pub fn top_products(&self, limit: usize) -> Result<Vec<ProductPerformance>> {
        let total_cents: i64 = self.conn().query_row(
            "SELECT COALESCE(SUM(CAST(ROUND(total_amount * 100) AS INTEGER)), 0) FROM fact_sales",
            [],
            |r| r.get(0),
        )?;
        let total = money_from_cents(total_cents);

        let mut stmt = self.conn().prepare(
            "SELECT p.product_id, p.product_name, p.category,
                    SUM(f.quantity),
                    SUM(CAST(ROUND(f.total_amount * 100) AS INTEGER)) AS revenue_cents
             FROM fact_sales f
             JOIN dim_product p ON p.product_key = f.product_key
             GROUP BY p.product_key
             ORDER BY revenue_cents DESC, p.product_id
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            let revenue = money_from_cents(row.get(4)?);
            Ok(ProductPerformance {
                product_id: row.get(0)?,
                product_name: row.get(1)?,
                category: row.get(2)?,
                quantity: row.get(3)?,
                revenue,
                revenue_share: if total.is_zero() {
                    Decimal::ZERO
                } else {
                    round_money(revenue * Decimal::ONE_HUNDRED / total)
                },
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Customers bucketed by lifetime spend. Empty segments are omitted.
    pub fn customer_segments(&self) -> Result<Vec<CustomerSegment>> {
        let mut stmt = self.conn().prepare(
            "SELECT customer_key, SUM(CAST(ROUND(total_amount * 100) AS INTEGER))
             FROM fact_sales
             GROUP BY customer_key",
        )?;
        let spends = stmt
            .query_map([], |row| Ok(money_from_cents(row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut segments: Vec<CustomerSegment> = Vec::new();
        for spend in spends {
            let segment = Segment::for_spend(spend);
            match segments.iter_mut().find(|s| s.segment == segment) {
                Some(existing) => {
                    existing.customer_count += 1;
                    existing.revenue += spend;
                }
                None => segments.push(CustomerSegment {
                    segment,
                    customer_count: 1,
                    revenue: spend,
                }),
            }
        }
        segments.sort_by_key(|s| s.segment);
        Ok(segments)
    }
}
