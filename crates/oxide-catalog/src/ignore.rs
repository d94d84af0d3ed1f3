//! Ignore-list filter.
//!
//! Schemas and tables excluded from introspection. Values are stored as
//! given and compared lower-cased, so the same filter applies regardless of
//! how a caller spelled the names.

use std::collections::BTreeSet;

use serde::Serialize;

/// Case-insensitive schema/table exclusion rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IgnoreList {
    schemas: BTreeSet<String>,
    tables: BTreeSet<String>,
    table_prefixes: BTreeSet<String>,
    table_suffixes: BTreeSet<String>,
}

fn insert(set: &mut BTreeSet<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        set.insert(value.to_string());
    }
}

fn lowered(set: &BTreeSet<String>) -> BTreeSet<String> {
    set.iter().map(|v| v.to_lowercase()).collect()
}

impl IgnoreList {
    /// Creates an empty ignore list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignores a schema. Blank input is ignored.
    pub fn add_schema(&mut self, name: &str) {
        insert(&mut self.schemas, name);
    }

    /// Ignores a table by exact name. Blank input is ignored.
    pub fn add_table(&mut self, name: &str) {
        insert(&mut self.tables, name);
    }

    /// Ignores tables whose name starts with `prefix`. Blank input is ignored.
    pub fn add_table_prefix(&mut self, prefix: &str) {
        insert(&mut self.table_prefixes, prefix);
    }

    /// Ignores tables whose name ends with `suffix`. Blank input is ignored.
    pub fn add_table_suffix(&mut self, suffix: &str) {
        insert(&mut self.table_suffixes, suffix);
    }

    /// Ignored schema names, lower-cased.
    #[must_use]
    pub fn schemas(&self) -> BTreeSet<String> {
        lowered(&self.schemas)
    }

    /// Ignored table names, lower-cased.
    #[must_use]
    pub fn tables(&self) -> BTreeSet<String> {
        lowered(&self.tables)
    }

    /// Ignored table prefixes, lower-cased.
    #[must_use]
    pub fn table_prefixes(&self) -> BTreeSet<String> {
        lowered(&self.table_prefixes)
    }

    /// Ignored table suffixes, lower-cased.
    #[must_use]
    pub fn table_suffixes(&self) -> BTreeSet<String> {
        lowered(&self.table_suffixes)
    }

    /// Resolves the effective filter for one introspection call: names the
    /// caller asked for explicitly are never ignored.
    #[must_use]
    pub fn resolve(&self, schema_names: &[String], table_names: &[String]) -> TableFilter {
        let schema_names = normalize(schema_names);
        let table_names = normalize(table_names);
        let mut ignore_schemas = self.schemas();
        let mut ignore_tables = self.tables();
        for name in &schema_names {
            ignore_schemas.remove(name);
        }
        for name in &table_names {
            ignore_tables.remove(name);
        }
        TableFilter {
            schema_names,
            table_names,
            ignore_schemas,
            ignore_tables,
            ignore_prefixes: self.table_prefixes(),
            ignore_suffixes: self.table_suffixes(),
        }
    }
}

fn normalize(names: &[String]) -> BTreeSet<String> {
    names
        .iter()
        .map(|n| n.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect()
}

/// The filter applied by one introspection call. Empty name sets mean "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableFilter {
    /// Schemas to include (lower-cased).
    pub schema_names: BTreeSet<String>,
    /// Tables to include (lower-cased).
    pub table_names: BTreeSet<String>,
    /// Schemas to exclude (lower-cased).
    pub ignore_schemas: BTreeSet<String>,
    /// Tables to exclude (lower-cased).
    pub ignore_tables: BTreeSet<String>,
    /// Table-name prefixes to exclude (lower-cased).
    pub ignore_prefixes: BTreeSet<String>,
    /// Table-name suffixes to exclude (lower-cased).
    pub ignore_suffixes: BTreeSet<String>,
}

impl TableFilter {
    /// Returns `true` if a table row surviving the catalog-level filter must
    /// still be dropped. Both names are expected lower-cased.
    #[must_use]
    pub fn excludes(&self, schema: &str, table: &str) -> bool {
        self.ignore_schemas.contains(schema)
            || self.ignore_tables.contains(table)
            || self.ignore_prefixes.iter().any(|p| table.starts_with(p.as_str()))
            || self.ignore_suffixes.iter().any(|s| table.ends_with(s.as_str()))
    }

    /// Returns `true` if a schema passes the include and exclude sets.
    #[must_use]
    pub fn includes_schema(&self, schema: &str) -> bool {
        (self.schema_names.is_empty() || self.schema_names.contains(schema))
            && !self.ignore_schemas.contains(schema)
    }

    /// Returns `true` if a table passes every include and exclude rule.
    #[must_use]
    pub fn includes_table(&self, schema: &str, table: &str) -> bool {
        self.includes_schema(schema)
            && (self.table_names.is_empty() || self.table_names.contains(table))
            && !self.excludes(schema, table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_lower_case_and_skip_blank() {
        let mut list = IgnoreList::new();
        list.add_schema("MySQL");
        list.add_schema("   ");
        list.add_table_prefix("TMP_");
        list.add_table_suffix("_BAK");

        assert_eq!(list.schemas().into_iter().collect::<Vec<_>>(), vec!["mysql"]);
        assert!(list.table_prefixes().contains("tmp_"));
        assert!(list.table_suffixes().contains("_bak"));
        assert!(list.tables().is_empty());
    }

    #[test]
    fn test_excludes() {
        let mut list = IgnoreList::new();
        list.add_schema("sys");
        list.add_table("Audit");
        list.add_table_prefix("tmp_");
        list.add_table_suffix("_bak");
        let filter = list.resolve(&[], &[]);

        assert!(filter.excludes("sys", "users"));
        assert!(filter.excludes("shop", "audit"));
        assert!(filter.excludes("shop", "tmp_orders"));
        assert!(filter.excludes("shop", "orders_bak"));
        assert!(!filter.excludes("shop", "orders"));
    }

    #[test]
    fn test_resolve_keeps_explicit_names() {
        let mut list = IgnoreList::new();
        list.add_schema("sys");
        list.add_table("audit");
        let filter = list.resolve(&["SYS".to_string()], &[" Audit ".to_string()]);

        assert!(filter.schema_names.contains("sys"));
        assert!(filter.ignore_schemas.is_empty());
        assert!(filter.ignore_tables.is_empty());
        assert!(filter.includes_schema("sys"));
        assert!(!filter.includes_schema("shop"));
        assert!(filter.includes_table("sys", "audit"));
        assert!(!filter.includes_table("sys", "users"));
    }
}
