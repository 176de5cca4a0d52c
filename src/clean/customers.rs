use super::fields::{normalize_email, normalize_phone, parse_date, title_case};
use super::{CleanOptions, CleanedSource, Rejection, RowContext};
use crate::extract::{RawRow, SourceKind};
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq)]
pub struct CustomerRecord {
    /// Raw `customer_id`s that resolve to this customer, in first-seen order.
    pub raw_ids: Vec<String>,
    pub first_name: String,
    pub last_name: String,
    /// Normalized (lower-case) email, the business key.
    pub email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub registration_date: Option<NaiveDate>,
}

impl CustomerRecord {
    /// Last-write-wins on non-key fields; a missing value never erases a known one.
    fn absorb(&mut self, newer: CustomerRecord) {
        for raw_id in newer.raw_ids {
            if !self.raw_ids.contains(&raw_id) {
                self.raw_ids.push(raw_id);
            }
        }
        self.first_name = newer.first_name;
        self.last_name = newer.last_name;
        if newer.phone.is_some() {
            self.phone = newer.phone;
        }
        if newer.city.is_some() {
            self.city = newer.city;
        }
        if newer.registration_date.is_some() {
            self.registration_date = newer.registration_date;
        }
    }
}

pub fn clean_customers(rows: &[RawRow], options: &CleanOptions) -> CleanedSource<CustomerRecord> {
    let mut cleaned = CleanedSource::new(SourceKind::Customers);
    let mut by_email: HashMap<String, usize> = HashMap::new();

    for raw in rows {
        let mut ctx = RowContext::new(SourceKind::Customers, raw);
        match clean_customer_row(&mut ctx, options) {
            Err(rejection) => cleaned.push_rejected(raw.index, rejection),
            Ok(record) => {
                let repairs = std::mem::take(&mut ctx.repairs);
                match by_email.get(&record.email) {
                    Some(&position) => {
                        let email = record.email.clone();
                        cleaned.push_merged(
                            raw.index,
                            position,
                            record,
                            repairs,
                            "email",
                            &email,
                            CustomerRecord::absorb,
                        );
                    }
                    None => {
                        let email = record.email.clone();
                        let position = cleaned.push_valid(raw.index, record, repairs);
                        by_email.insert(email, position);
                    }
                }
            }
        }
    }
    cleaned
}

fn clean_customer_row(
    ctx: &mut RowContext<'_>,
    options: &CleanOptions,
) -> Result<CustomerRecord, Rejection> {
    let raw_id = ctx.text("customer_id");
    let first_name = ctx.required("first_name")?;
    let last_name = ctx.required("last_name")?;

    let email = ctx.required("email")?;
    let email = ctx.parse("email", &email, normalize_email)?;

    let phone = match ctx.text("phone") {
        Some(value) => {
            let phone = normalize_phone(&value, &options.phone_country_code);
            if phone.is_none() {
                ctx.repaired("phone", "unparseable phone number set to null");
            }
            phone
        }
        None => None,
    };

    let city = ctx.text("city").map(|city| title_case(&city));

    let registration_date = match ctx.text("registration_date") {
        Some(value) => Some(ctx.parse("registration_date", &value, |field, value| {
            parse_date(field, value, &options.date_formats)
        })?),
        None => None,
    };

    Ok(CustomerRecord {
        raw_ids: raw_id.into_iter().collect(),
        first_name,
        last_name,
        email,
        phone,
        city,
        registration_date,
    })
}
