//! Field-level normalizers shared by the per-source cleaners.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use thiserror::Error;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)+$").unwrap();
}

/// Cell contents that spreadsheet exports use to mean "no value".
const NULL_PLACEHOLDERS: &[&str] = &["nan", "none", "null", "n/a"];

/// Largest accepted price or unit price (one billion).
pub const MAX_MONEY: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Largest accepted quantity on a single sale line.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Why a single field could not be accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} '{value}' is not a valid email address")]
    InvalidEmail { field: &'static str, value: String },

    #[error("{field} '{value}' does not match any accepted date format")]
    InvalidDate { field: &'static str, value: String },

    #[error("{field} '{value}' is not a number")]
    NotNumeric { field: &'static str, value: String },

    #[error("{field} '{value}' must not be negative")]
    Negative { field: &'static str, value: String },

    #[error("{field} '{value}' must be greater than zero")]
    NotPositive { field: &'static str, value: String },

    #[error("{field} '{value}' is out of range")]
    OutOfRange { field: &'static str, value: String },
}

impl FieldError {
    pub fn field(&self) -> &'static str {
        match self {
            FieldError::Missing(field) => *field,
            FieldError::InvalidEmail { field, .. }
            | FieldError::InvalidDate { field, .. }
            | FieldError::NotNumeric { field, .. }
            | FieldError::Negative { field, .. }
            | FieldError::NotPositive { field, .. }
            | FieldError::OutOfRange { field, .. } => *field,
        }
    }
}

/// Trim, collapse inner whitespace runs, and map empty or placeholder cells to `None`.
pub fn clean_text(raw: Option<&str>) -> Option<String> {
    let collapsed = raw?.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() || NULL_PLACEHOLDERS.contains(&collapsed.to_lowercase().as_str()) {
        None
    } else {
        Some(collapsed)
    }
}

pub fn normalize_email(field: &'static str, value: &str) -> Result<String, FieldError> {
    let email = value.to_lowercase();
    if EMAIL_RE.is_match(&email) {
        Ok(email)
    } else {
        Err(FieldError::InvalidEmail {
            field,
            value: value.to_string(),
        })
    }
}

/// Canonical phone format `+<country>-<last 10 digits>`; `None` when fewer
/// than ten digits are present.
pub fn normalize_phone(value: &str, country_code: &str) -> Option<String> {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 10 {
        return None;
    }
    Some(format!("+{}-{}", country_code, &digits[digits.len() - 10..]))
}

pub fn title_case(value: &str) -> String {
    value
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Map a category through the controlled vocabulary, case-insensitively.
/// Values outside the vocabulary are title-cased.
pub fn normalize_category(value: &str, vocabulary: &[String]) -> String {
    vocabulary
        .iter()
        .find(|known| known.eq_ignore_ascii_case(value))
        .cloned()
        .unwrap_or_else(|| title_case(value))
}

/// Try each format in order; the first one that parses wins.
pub fn parse_date(
    field: &'static str,
    value: &str,
    formats: &[String],
) -> Result<NaiveDate, FieldError> {
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .ok_or_else(|| FieldError::InvalidDate {
            field,
            value: value.to_string(),
        })
}

/// Round a monetary amount to cents, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn parse_decimal(field: &'static str, value: &str) -> Result<Decimal, FieldError> {
    Decimal::from_str(value).map_err(|_| FieldError::NotNumeric {
        field,
        value: value.to_string(),
    })
}

pub fn parse_money(field: &'static str, value: &str) -> Result<Decimal, FieldError> {
    let amount = parse_decimal(field, value)?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(FieldError::Negative {
            field,
            value: value.to_string(),
        });
    }
    if amount > MAX_MONEY {
        return Err(FieldError::OutOfRange {
            field,
            value: value.to_string(),
        });
    }
    Ok(round_money(amount))
}

/// Integers written as `3` or `3.0` are accepted; `3.5` is not.
fn parse_integer(field: &'static str, value: &str) -> Result<i64, FieldError> {
    if let Ok(n) = value.parse::<i64>() {
        return Ok(n);
    }
    let not_numeric = || FieldError::NotNumeric {
        field,
        value: value.to_string(),
    };
    let decimal = parse_decimal(field, value)?;
    if !decimal.fract().is_zero() {
        return Err(not_numeric());
    }
    decimal.to_i64().ok_or_else(not_numeric)
}

pub fn parse_quantity(field: &'static str, value: &str) -> Result<i64, FieldError> {
    let n = parse_integer(field, value)?;
    if n <= 0 {
        return Err(FieldError::NotPositive {
            field,
            value: value.to_string(),
        });
    }
    if n > MAX_QUANTITY {
        return Err(FieldError::OutOfRange {
            field,
            value: value.to_string(),
        });
    }
    Ok(n)
}

pub fn parse_stock(field: &'static str, value: &str) -> Result<i64, FieldError> {
    let n = parse_integer(field, value)?;
    if n < 0 {
        return Err(FieldError::Negative {
            field,
            value: value.to_string(),
        });
    }
    Ok(n)
}

/// Median of a non-empty set of amounts, rounded to cents.
pub fn median(values: &mut [Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    values.sort();
    let mid = values.len() / 2;
    let median = if values.len() % 2 == 0 {
        let (low, high) = (values[mid - 1], values[mid]);
        low.checked_add(high)
            .map(|sum| sum / Decimal::TWO)
            .unwrap_or_else(|| low + (high - low) / Decimal::TWO)
    } else {
        values[mid]
    };
    Some(round_money(median))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn default_formats() -> Vec<String> {
        ["%Y-%m-%d", "%d/%m/%Y", "%m-%d-%Y", "%m/%d/%Y", "%d-%m-%Y"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text(Some("  Rahul   Sharma ")), Some("Rahul Sharma".to_string()));
        assert_eq!(clean_text(Some("   ")), None);
        assert_eq!(clean_text(Some("NaN")), None);
        assert_eq!(clean_text(Some("null")), None);
        assert_eq!(clean_text(None), None);
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("email", "Rahul.Sharma@Gmail.com").unwrap(),
            "rahul.sharma@gmail.com"
        );
        for bad in ["not-an-email", "a@b", "@gmail.com", "a@@b.com", "a b@c.com", "a@.com"] {
            assert!(
                matches!(
                    normalize_email("email", bad),
                    Err(FieldError::InvalidEmail { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(
            normalize_phone("9876543210", "91"),
            Some("+91-9876543210".to_string())
        );
        assert_eq!(
            normalize_phone("+91 98765-43210", "91"),
            Some("+91-9876543210".to_string())
        );
        assert_eq!(
            normalize_phone("0-9876543210", "91"),
            Some("+91-9876543210".to_string())
        );
        assert_eq!(normalize_phone("12345", "91"), None);
        assert_eq!(normalize_phone("call me", "91"), None);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("new delhi"), "New Delhi");
        assert_eq!(title_case("MUMBAI"), "Mumbai");
        assert_eq!(title_case("home & kitchen"), "Home & Kitchen");
    }

    #[test]
    fn test_normalize_category() {
        let vocabulary = vec!["Electronics".to_string(), "Fashion".to_string()];
        assert_eq!(normalize_category("electronics", &vocabulary), "Electronics");
        assert_eq!(normalize_category("FASHION", &vocabulary), "Fashion");
        assert_eq!(normalize_category("home decor", &vocabulary), "Home Decor");
    }

    #[test]
    fn test_parse_date_formats() {
        let formats = default_formats();
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(parse_date("d", "2024-01-15", &formats).unwrap(), expected);
        assert_eq!(parse_date("d", "15/01/2024", &formats).unwrap(), expected);
        assert_eq!(parse_date("d", "01-15-2024", &formats).unwrap(), expected);
        assert_eq!(parse_date("d", "15-01-2024", &formats).unwrap(), expected);
        assert!(matches!(
            parse_date("d", "2024/99/99", &formats),
            Err(FieldError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(
            parse_money("price", "50000.00").unwrap(),
            Decimal::new(5000000, 2)
        );
        assert_eq!(parse_money("price", "19.995").unwrap(), Decimal::new(2000, 2));
        assert_eq!(parse_money("price", "0").unwrap(), Decimal::ZERO);
        assert!(matches!(
            parse_money("price", "-5"),
            Err(FieldError::Negative { field: "price", .. })
        ));
        assert!(matches!(
            parse_money("price", "abc"),
            Err(FieldError::NotNumeric { .. })
        ));
    }

    #[test]
    fn test_huge_amounts_are_out_of_range() {
        assert_eq!(parse_money("unit_price", "1000000000").unwrap(), MAX_MONEY);
        assert!(matches!(
            parse_money("unit_price", "1000000000.01"),
            Err(FieldError::OutOfRange { field: "unit_price", .. })
        ));
        assert!(matches!(
            parse_money("unit_price", "79228162514264337593543950335"),
            Err(FieldError::OutOfRange { .. })
        ));

        assert_eq!(parse_quantity("quantity", "1000000").unwrap(), MAX_QUANTITY);
        assert!(matches!(
            parse_quantity("quantity", "9223372036854775807"),
            Err(FieldError::OutOfRange { field: "quantity", .. })
        ));
    }

    #[test]
    fn test_parse_quantity_and_stock() {
        assert_eq!(parse_quantity("quantity", "3").unwrap(), 3);
        assert_eq!(parse_quantity("quantity", "3.0").unwrap(), 3);
        assert!(matches!(
            parse_quantity("quantity", "0"),
            Err(FieldError::NotPositive { .. })
        ));
        assert!(matches!(
            parse_quantity("quantity", "-2"),
            Err(FieldError::NotPositive { .. })
        ));
        assert!(matches!(
            parse_quantity("quantity", "2.5"),
            Err(FieldError::NotNumeric { .. })
        ));
        assert_eq!(parse_stock("stock_quantity", "0").unwrap(), 0);
        assert!(matches!(
            parse_stock("stock_quantity", "-1"),
            Err(FieldError::Negative { .. })
        ));
    }

    #[test]
    fn test_median() {
        let mut odd = vec![Decimal::new(300, 0), Decimal::new(100, 0), Decimal::new(200, 0)];
        assert_eq!(median(&mut odd), Some(Decimal::new(20000, 2)));

        let mut even = vec![Decimal::new(100, 0), Decimal::new(201, 0)];
        assert_eq!(median(&mut even), Some(Decimal::new(15050, 2)));

        assert_eq!(median(&mut []), None);

        let mut huge = vec![Decimal::MAX, Decimal::MAX];
        assert_eq!(median(&mut huge), Some(Decimal::MAX));
    }
}
