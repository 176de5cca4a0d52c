mod models;
mod schema;
mod store;
mod validation;

pub use models::*;
pub use store::SqliteDocumentStore;
pub use validation::{validate_document, validate_review, ValidationError, ValidationResult};
