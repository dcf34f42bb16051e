//! Format catalog with built-in fallback.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::{info, warn};

use crate::error::ConversionError;
use crate::files::file_extension;
use crate::service::ConvertClient;
use crate::task::Category;
use crate::transport::Transport;

use super::builtin::{builtin_allowed_extensions, builtin_table};
use super::FormatTable;

/// Canonical spelling of a format name: trimmed, no leading dot, lower-case.
pub fn normalize_format(format: &str) -> String {
    format.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Parse a `/supported-formats` body:
/// `{ "<category>": { "supportedConversions": { "<source>": ["<target>", ...] } } }`.
///
/// Entries whose value is not an array are skipped; non-string targets are
/// ignored.
pub(crate) fn parse_supported_formats(
    category: Category,
    body: &Value,
) -> Result<FormatTable, ConversionError> {
    let conversions = body
        .get(category.as_str())
        .and_then(|c| c.get("supportedConversions"))
        .and_then(Value::as_object)
        .ok_or_else(|| {
            ConversionError::protocol(format!(
                "supported formats response has no {category}.supportedConversions"
            ))
        })?;

    Ok(conversions
        .iter()
        .filter_map(|(source, targets)| {
            let targets = targets.as_array()?;
            let targets = targets
                .iter()
                .filter_map(Value::as_str)
                .map(normalize_format)
                .filter(|t| !t.is_empty())
                .collect();
            Some((normalize_format(source), targets))
        })
        .collect())
}

/// Conversion tables for every category.
#[derive(Debug, Clone)]
pub struct FormatCatalog {
    tables: HashMap<Category, FormatTable>,
    remote: HashSet<Category>,
}

impl Default for FormatCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatCatalog {
    /// Catalog populated with the built-in tables.
    pub fn new() -> Self {
        let tables = Category::ALL
            .iter()
            .map(|c| (*c, builtin_table(*c)))
            .collect();
        Self {
            tables,
            remote: HashSet::new(),
        }
    }

    pub fn table(&self, category: Category) -> &FormatTable {
        // every category is populated in new()
        &self.tables[&category]
    }

    /// Whether the table for `category` came from the service.
    pub fn is_remote(&self, category: Category) -> bool {
        self.remote.contains(&category)
    }

    /// Known source formats for `category`, sorted.
    pub fn sources(&self, category: Category) -> Vec<&str> {
        self.table(category).keys().map(String::as_str).collect()
    }

    /// Targets reachable from `source`; empty when the source is unknown.
    pub fn targets_for(&self, category: Category, source: &str) -> &[String] {
        self.table(category)
            .get(&normalize_format(source))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn supports(&self, category: Category, source: &str, target: &str) -> bool {
        let target = normalize_format(target);
        self.targets_for(category, source).contains(&target)
    }

    /// Dot-prefixed file extensions accepted for files of `source` format.
    pub fn allowed_extensions(&self, source: &str) -> Vec<String> {
        builtin_allowed_extensions(source)
    }

    /// Whether `file_name` has an extension allowed for `source`.
    pub fn accepts_file(&self, source: &str, file_name: &str) -> bool {
        let ext = file_extension(file_name);
        !ext.is_empty() && self.allowed_extensions(source).contains(&ext)
    }

    /// Replace the table for `category`.
    pub fn set_table(&mut self, category: Category, table: FormatTable) {
        self.tables.insert(category, table);
        self.remote.insert(category);
    }

    /// Fetch the service's table for `category`.
    ///
    /// Any failure, or an empty remote table, keeps the current table.
    /// Returns whether the remote table was applied.
    pub async fn refresh<T: Transport>(
        &mut self,
        client: &ConvertClient<T>,
        category: Category,
    ) -> bool {
        match client.supported_formats(category).await {
            Ok(table) if !table.is_empty() => {
                info!(
                    category = %category,
                    sources = table.len(),
                    "Loaded supported formats from service"
                );
                self.set_table(category, table);
                true
            }
            Ok(_) => {
                warn!(category = %category, "Service returned no formats, keeping built-in table");
                false
            }
            Err(e) => {
                warn!(category = %category, error = %e, "Failed to load supported formats, keeping built-in table");
                false
            }
        }
    }
}
