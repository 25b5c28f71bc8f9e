//! Strongly-typed warehouse table names and deterministic name derivation.

use crate::node::RefKind;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Strongly-typed wrapper for warehouse table names.
///
/// Prevents accidental mixing of physical table names with node names,
/// column names, or other string types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableName(String);

impl TableName {
    /// Create a new `TableName`, panicking in debug builds if the name is empty.
    pub fn new(name: impl Into<String>) -> Self {
        let s = name.into();
        debug_assert!(!s.is_empty(), "TableName must not be empty");
        Self(s)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for TableName {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TableName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for TableName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TableName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for TableName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TableName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<String> for TableName {
    fn eq(&self, other: &String) -> bool {
        self.0 == *other
    }
}

/// Collapse a user-supplied name into a stable physical identifier:
/// lower-cased, runs of non-alphanumeric characters collapsed to a single
/// underscore, leading/trailing underscores trimmed.
///
/// The derivation must be stable across runs so re-execution always
/// overwrites the same physical table.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_sep = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.extend(ch.to_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Default table name for a node without a custom output name.
pub fn derive_table_name(kind: RefKind, id: u64) -> TableName {
    TableName::new(format!("{}_{}", kind.binding_prefix(), id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_lowercases_and_collapses() {
        assert_eq!(slugify("Clean Orders (v2)"), "clean_orders_v2");
        assert_eq!(slugify("already_clean"), "already_clean");
        assert_eq!(slugify("A--B__C"), "a_b_c");
    }

    #[test]
    fn test_slugify_trims_separators() {
        assert_eq!(slugify("  spaces  "), "spaces");
        assert_eq!(slugify("___"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_slugify_is_stable() {
        let a = slugify("Quarterly Totals!");
        let b = slugify("Quarterly Totals!");
        assert_eq!(a, b);
    }

    #[test]
    fn test_derive_table_name() {
        assert_eq!(derive_table_name(RefKind::Join, 12), "join_12");
        assert_eq!(
            derive_table_name(RefKind::TextAnalytics, 3),
            "text_analytics_3"
        );
    }

    #[test]
    fn test_table_name_equality_and_borrow() {
        use std::collections::HashMap;
        let name = TableName::new("orders");
        assert_eq!(name, "orders");
        let mut map: HashMap<TableName, i32> = HashMap::new();
        map.insert(name, 1);
        assert_eq!(map.get("orders"), Some(&1));
    }

    #[test]
    fn test_table_name_serde_transparent() {
        let name = TableName::new("orders");
        assert_eq!(serde_json::to_string(&name).unwrap(), r#""orders""#);
    }
}
