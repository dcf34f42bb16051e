//! Source -> target format tables per conversion category.
//!
//! A built-in table ships with the crate; [`FormatCatalog::refresh`] swaps in
//! the service's own table when it can be fetched and keeps the built-in one
//! otherwise.

mod builtin;
mod catalog;

pub use builtin::{builtin_allowed_extensions, builtin_table};
pub use catalog::{normalize_format, FormatCatalog};
pub(crate) use catalog::parse_supported_formats;

use std::collections::BTreeMap;

/// Source format -> supported target formats, without leading dots.
pub type FormatTable = BTreeMap<String, Vec<String>>;
