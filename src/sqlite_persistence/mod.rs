mod versioned_schema;

pub use versioned_schema::{
    initialize_schema, Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
    BASE_DB_VERSION,
};
