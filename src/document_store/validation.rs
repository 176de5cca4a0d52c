//! Checks applied to product documents before they are stored.

use super::models::{ProductDocument, Review};
use rust_decimal::Decimal;
use thiserror::Error;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' is required but was empty")]
    EmptyField { field: &'static str },

    #[error("Field '{field}' must be non-negative, got {value}")]
    NegativeValue { field: &'static str, value: String },

    #[error("Review rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(i64),

    #[error("Product document '{0}' appears more than once")]
    DuplicateId(String),

    #[error("Not a product document: {0}")]
    Malformed(String),
}

pub type ValidationResult<T> = Result<T, ValidationError>;

pub fn validate_review(review: &Review) -> ValidationResult<()> {
    if review.user.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: "user" });
    }
    if !(MIN_RATING..=MAX_RATING).contains(&review.rating) {
        return Err(ValidationError::RatingOutOfRange(review.rating));
    }
    Ok(())
}

pub fn validate_document(document: &ProductDocument) -> ValidationResult<()> {
    if document.product_id.trim().is_empty() {
        return Err(ValidationError::EmptyField {
            field: "product_id",
        });
    }
    if document.name.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: "name" });
    }
    if document.category.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: "category" });
    }
    if document.price < Decimal::ZERO {
        return Err(ValidationError::NegativeValue {
            field: "price",
            value: document.price.to_string(),
        });
    }
    if document.stock < 0 {
        return Err(ValidationError::NegativeValue {
            field: "stock",
            value: document.stock.to_string(),
        });
    }
    for review in &document.reviews {
        validate_review(review)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::Map;

    fn make_valid_review() -> Review {
        Review {
            user: "U001".to_string(),
            rating: 4,
            comment: "Good".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
        }
    }

    fn make_valid_document() -> ProductDocument {
        ProductDocument {
            product_id: "ELEC001".to_string(),
            name: "Phone".to_string(),
            category: "Electronics".to_string(),
            price: Decimal::new(1999900, 2),
            stock: 3,
            specs: Map::new(),
            seller: None,
            reviews: vec![make_valid_review()],
        }
    }

    #[test]
    fn test_valid_document_passes() {
        assert!(validate_document(&make_valid_document()).is_ok());
    }

    #[test]
    fn test_missing_id_rejected() {
        let mut document = make_valid_document();
        document.product_id = "  ".to_string();
        assert_eq!(
            validate_document(&document),
            Err(ValidationError::EmptyField {
                field: "product_id"
            })
        );
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut document = make_valid_document();
        document.price = Decimal::new(-1, 0);
        assert!(matches!(
            validate_document(&document),
            Err(ValidationError::NegativeValue { field: "price", .. })
        ));
    }

    #[test]
    fn test_rating_bounds() {
        let mut review = make_valid_review();
        review.rating = 0;
        assert_eq!(
            validate_review(&review),
            Err(ValidationError::RatingOutOfRange(0))
        );
        review.rating = 6;
        assert!(validate_review(&review).is_err());
        review.rating = 5;
        assert!(validate_review(&review).is_ok());

        let mut document = make_valid_document();
        document.reviews[0].rating = 9;
        assert_eq!(
            validate_document(&document),
            Err(ValidationError::RatingOutOfRange(9))
        );
    }
}
