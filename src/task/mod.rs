//! Task records: field schema, validation and server-assigned fields.

pub mod document;
pub mod schema;
pub mod validation;

pub use document::{TaskDocument, STORAGE_ID};
pub use validation::{check_extension_fields, validate, ExtensionFieldError, FieldErrors, ValidationMode};
