//! Error-code table.
//!
//! Every compiled contract owns a [`CodeTable`]: the ordered list of response
//! codes a route may produce, each tagged with the [`CodeCategory`] that
//! contributed it. Codes are inserted at most once; the first writer wins.
//!
//! Three bootstrap codes are always present, in this order:
//!
//! | Index | Code | Message |
//! |-------|------|---------|
//! | 0 | `success` | Success |
//! | 1 | `exception` | Unknown exception |
//! | 2 | `param_unknown` | Unknown parameter |
//!
//! `param_missing` is inserted at index 2 by the contract compiler when a
//! route has at least one required parameter.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Code returned when the handler completed normally.
pub const SUCCESS: &str = "success";

/// Code returned when the handler failed unexpectedly.
pub const EXCEPTION: &str = "exception";

/// Code returned when the request carried an undeclared parameter.
pub const PARAM_UNKNOWN: &str = "param_unknown";

/// Code returned when a required parameter was absent.
pub const PARAM_MISSING: &str = "param_missing";

/// Position at which `param_missing` is inserted into the code index.
pub const PARAM_MISSING_INDEX: usize = 2;

/// The source that contributed an error code to a contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CodeCategory {
    /// Bootstrap codes shared by every contract.
    Common,
    /// Codes raised by the plugin registered under the given key.
    Plugin(String),
    /// Codes raised by parameter type validation.
    Type,
    /// Codes declared by the handler with `raise` directives.
    Biz,
}

impl fmt::Display for CodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Common => f.write_str("common"),
            Self::Plugin(key) => write!(f, "plugin:{key}"),
            Self::Type => f.write_str("type"),
            Self::Biz => f.write_str("biz"),
        }
    }
}

impl FromStr for CodeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "common" => Ok(Self::Common),
            "type" => Ok(Self::Type),
            "biz" => Ok(Self::Biz),
            other => other
                .strip_prefix("plugin:")
                .filter(|key| !key.is_empty())
                .map(|key| Self::Plugin(key.to_string()))
                .ok_or_else(|| format!("unknown code category: {other}")),
        }
    }
}

impl From<CodeCategory> for String {
    fn from(category: CodeCategory) -> Self {
        category.to_string()
    }
}

impl TryFrom<String> for CodeCategory {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A code and its human-readable message, as declared by a type or plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSpec {
    /// Machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl CodeSpec {
    /// Creates a new code declaration.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// One entry of a [`CodeTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCode {
    /// Machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Where the code came from.
    pub category: CodeCategory,
}

/// Ordered, deduplicated table of response codes.
///
/// # Example
///
/// ```
/// use docket_core::{CodeCategory, CodeTable};
///
/// let mut codes = CodeTable::with_bootstrap();
/// assert!(codes.insert("id_not_exist", "Record does not exist.", CodeCategory::Biz));
/// assert!(!codes.insert("id_not_exist", "Ignored", CodeCategory::Biz));
///
/// assert_eq!(codes.message("id_not_exist"), Some("Record does not exist."));
/// assert_eq!(codes.index(), vec!["success", "exception", "param_unknown", "id_not_exist"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTable {
    entries: IndexMap<String, ErrorCode>,
}

impl CodeTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding the bootstrap codes.
    #[must_use]
    pub fn with_bootstrap() -> Self {
        let mut table = Self::new();
        table.insert(SUCCESS, "Success", CodeCategory::Common);
        table.insert(EXCEPTION, "Unknown exception", CodeCategory::Common);
        table.insert(PARAM_UNKNOWN, "Unknown parameter", CodeCategory::Common);
        table
    }

    /// Appends a code unless it is already present.
    ///
    /// Returns `true` if the code was inserted.
    pub fn insert(
        &mut self,
        code: impl Into<String>,
        message: impl Into<String>,
        category: CodeCategory,
    ) -> bool {
        let code = code.into();
        if self.entries.contains_key(&code) {
            return false;
        }
        let entry = ErrorCode {
            code: code.clone(),
            message: message.into(),
            category,
        };
        self.entries.insert(code, entry);
        true
    }

    /// Inserts a code at `index` unless it is already present.
    ///
    /// An index past the end appends.
    pub fn insert_at(
        &mut self,
        index: usize,
        code: impl Into<String>,
        message: impl Into<String>,
        category: CodeCategory,
    ) -> bool {
        let code = code.into();
        if self.entries.contains_key(&code) {
            return false;
        }
        let entry = ErrorCode {
            code: code.clone(),
            message: message.into(),
            category,
        };
        let index = index.min(self.entries.len());
        self.entries.shift_insert(index, code, entry);
        true
    }

    /// Returns the entry for a code.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&ErrorCode> {
        self.entries.get(code)
    }

    /// Returns the message registered for a code.
    #[must_use]
    pub fn message(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(|entry| entry.message.as_str())
    }

    /// Returns `true` if the code is registered.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    /// Returns the position of a code in the table.
    #[must_use]
    pub fn position(&self, code: &str) -> Option<usize> {
        self.entries.get_index_of(code)
    }

    /// Returns the codes in order.
    #[must_use]
    pub fn index(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Iterates over the entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorCode> {
        self.entries.values()
    }

    /// Returns the number of codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table holds no codes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for CodeTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.entries.values())
    }
}

impl<'de> Deserialize<'de> for CodeTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entries = Vec::<ErrorCode>::deserialize(deserializer)?;
        let mut table = Self::new();
        for entry in entries {
            table.insert(entry.code, entry.message, entry.category);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_order() {
        let table = CodeTable::with_bootstrap();
        assert_eq!(table.index(), vec![SUCCESS, EXCEPTION, PARAM_UNKNOWN]);
        assert!(table.iter().all(|e| e.category == CodeCategory::Common));
    }

    #[test]
    fn test_first_writer_wins() {
        let mut table = CodeTable::new();
        assert!(table.insert("dup", "first", CodeCategory::Biz));
        assert!(!table.insert("dup", "second", CodeCategory::Type));

        let entry = table.get("dup").unwrap();
        assert_eq!(entry.message, "first");
        assert_eq!(entry.category, CodeCategory::Biz);
    }

    #[test]
    fn test_insert_at_shifts_later_codes() {
        let mut table = CodeTable::with_bootstrap();
        table.insert("id_not_exist", "Record does not exist.", CodeCategory::Biz);
        table.insert_at(PARAM_MISSING_INDEX, PARAM_MISSING, "Missing parameter", CodeCategory::Common);

        assert_eq!(
            table.index(),
            vec![SUCCESS, EXCEPTION, PARAM_MISSING, PARAM_UNKNOWN, "id_not_exist"]
        );
        assert_eq!(table.position(PARAM_UNKNOWN), Some(3));
    }

    #[test]
    fn test_insert_at_past_end_appends() {
        let mut table = CodeTable::new();
        table.insert_at(10, "only", "Only", CodeCategory::Biz);
        assert_eq!(table.index(), vec!["only"]);
    }

    #[test]
    fn test_category_display_and_parse() {
        let cases = [
            (CodeCategory::Common, "common"),
            (CodeCategory::Type, "type"),
            (CodeCategory::Biz, "biz"),
            (CodeCategory::Plugin("token".to_string()), "plugin:token"),
        ];
        for (category, text) in cases {
            assert_eq!(category.to_string(), text);
            assert_eq!(text.parse::<CodeCategory>().unwrap(), category);
        }
        assert!("plugin:".parse::<CodeCategory>().is_err());
        assert!("other".parse::<CodeCategory>().is_err());
    }

    #[test]
    fn test_table_serializes_as_ordered_list() {
        let mut table = CodeTable::with_bootstrap();
        table.insert("token_invalid", "Invalid token", CodeCategory::Plugin("token".into()));

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json[3]["code"], "token_invalid");
        assert_eq!(json[3]["category"], "plugin:token");

        let back: CodeTable = serde_json::from_value(json).unwrap();
        assert_eq!(back, table);
    }
}
