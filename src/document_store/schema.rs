use crate::sqlite_column;
use crate::sqlite_persistence::{SqlType, Table, VersionedSchema};

/// One row per product; `document` holds the full JSON. Category and price
/// are copied out of the document so they can be filtered without parsing it.
const PRODUCT_DOCUMENTS_TABLE: Table = Table {
    name: "product_documents",
    columns: &[
        sqlite_column!("product_id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("category", &SqlType::Text, non_null = true),
        sqlite_column!("price", &SqlType::Text, non_null = true),
        sqlite_column!("document", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_product_documents_category", "category")],
};

pub const DOCUMENT_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[PRODUCT_DOCUMENTS_TABLE],
}];
