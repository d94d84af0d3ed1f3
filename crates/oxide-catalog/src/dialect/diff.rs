//! Table comparison and the statement ordering shared by every dialect.

use std::collections::{HashMap, HashSet};

use super::{join_statements, same_text, CatalogDialect};
use crate::error::Result;
use crate::model::{Column, Index, PrimaryKey, Table};

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn pk_columns_differ(new: &PrimaryKey, old: &PrimaryKey) -> bool {
    key(&new.name) != key(&old.name) || new.column_names() != old.column_names()
}

fn in_key(pk: Option<&PrimaryKey>, column: &str) -> bool {
    pk.is_some_and(|pk| pk.column_names().contains(&key(column)))
}

/// The structural differences between two versions of a table, by
/// lower-cased name and in the order the columns and indexes appear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDiff {
    /// Columns only in the new table.
    pub added_columns: Vec<String>,
    /// Columns only in the old table.
    pub dropped_columns: Vec<String>,
    /// Columns in both whose rendered form differs.
    pub changed_columns: Vec<String>,
    /// The primary key was added, removed, renamed or re-keyed.
    pub primary_key_changed: bool,
    /// Indexes only in the new table.
    pub added_indices: Vec<String>,
    /// Indexes only in the old table.
    pub dropped_indices: Vec<String>,
    /// Indexes in both whose uniqueness or columns differ.
    pub changed_indices: Vec<String>,
}

impl TableDiff {
    /// Compares `old` against `new`, rendering columns with `dialect`.
    /// Indexes that back either primary key are left to the key comparison.
    pub fn new<D>(dialect: &D, new: &Table, old: &Table) -> Self
    where
        D: CatalogDialect + ?Sized,
    {
        let mut diff = Self::default();

        let old_columns: HashMap<String, &Column> =
            old.columns.iter().map(|c| (key(&c.name), c)).collect();
        let new_names: HashSet<String> = new.columns.iter().map(|c| key(&c.name)).collect();
        for column in &new.columns {
            let name = key(&column.name);
            match old_columns.get(&name) {
                None => diff.added_columns.push(name),
                Some(old_column) if dialect.column_changed(column, old_column) => {
                    diff.changed_columns.push(name);
                }
                Some(_) => {}
            }
        }
        diff.dropped_columns = old
            .columns
            .iter()
            .map(|c| key(&c.name))
            .filter(|name| !new_names.contains(name))
            .collect();

        diff.primary_key_changed = match (&new.primary_key, &old.primary_key) {
            (None, None) => false,
            (Some(new_pk), Some(old_pk)) => pk_columns_differ(new_pk, old_pk),
            _ => true,
        };

        let key_names: HashSet<String> = [&new.primary_key, &old.primary_key]
            .into_iter()
            .flatten()
            .map(|pk| key(&pk.name))
            .collect();
        let secondary = |table: &'_ Table| -> Vec<(String, Index)> {
            table
                .indices
                .iter()
                .filter(|i| !key_names.contains(&key(&i.name)))
                .map(|i| (key(&i.name), i.clone()))
                .collect()
        };
        let old_indices: HashMap<String, Index> = secondary(old).into_iter().collect();
        let new_indices = secondary(new);
        let new_index_names: HashSet<&String> = new_indices.iter().map(|(n, _)| n).collect();
        for (name, index) in &new_indices {
            match old_indices.get(name) {
                None => diff.added_indices.push(name.clone()),
                Some(old_index)
                    if old_index.unique != index.unique
                        || old_index.column_names() != index.column_names() =>
                {
                    diff.changed_indices.push(name.clone());
                }
                Some(_) => {}
            }
        }
        diff.dropped_indices = secondary(old)
            .into_iter()
            .map(|(name, _)| name)
            .filter(|name| !new_index_names.contains(name))
            .collect();

        diff
    }

    /// Returns `true` when nothing structural differs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added_columns.is_empty()
            && self.dropped_columns.is_empty()
            && self.changed_columns.is_empty()
            && !self.primary_key_changed
            && self.added_indices.is_empty()
            && self.dropped_indices.is_empty()
            && self.changed_indices.is_empty()
    }
}

pub(super) fn alter_table<D>(dialect: &D, new: &Table, old: &Table) -> Result<String>
where
    D: CatalogDialect + ?Sized,
{
    let mut parts = Vec::new();

    // Key members are snapshots; render them from the current columns.
    let mut new = new.clone();
    new.refresh_keys();
    let new = &new;
    let mut old = old.clone();
    old.refresh_keys();

    // Everything after a rename addresses the table by its new name.
    if key(&new.name) != key(&old.name) {
        parts.push(dialect.rename_table(&old.name, &new.name)?);
        old.set_name(new.name.clone());
    }
    if !same_text(new.comment.as_deref(), old.comment.as_deref()) {
        parts.push(dialect.alter_table_comment(new)?);
    }

    let diff = TableDiff::new(dialect, new, &old);
    let old_pk = old.primary_key.as_ref();
    let new_pk = new.primary_key.as_ref();

    for name in diff.dropped_indices.iter().chain(&diff.changed_indices) {
        if let Some(index) = old.index(name) {
            parts.push(dialect.drop_index(index)?);
        }
    }

    if diff.primary_key_changed {
        if let Some(pk) = old_pk {
            parts.push(dialect.drop_primary_key(pk)?);
        }
    }

    // Auto-increment on key columns is demoted with the old key and promoted
    // with the new one, so column statements must not touch it.
    let effective_old = |column: &Column| {
        let mut column = column.clone();
        if diff.primary_key_changed && in_key(old_pk, &column.name) {
            column.auto_increment = false;
        }
        column
    };
    let effective_new = |column: &Column| {
        let mut column = column.clone();
        if diff.primary_key_changed && in_key(new_pk, &column.name) {
            column.auto_increment = false;
        }
        column
    };

    for name in &diff.added_columns {
        if let Some(column) = new.column(name) {
            parts.push(dialect.create_column(&effective_new(column))?);
        }
    }
    for name in &diff.changed_columns {
        if let (Some(new_column), Some(old_column)) = (new.column(name), old.column(name)) {
            let new_column = effective_new(new_column);
            let old_column = effective_old(old_column);
            if dialect.column_changed(&new_column, &old_column) {
                parts.push(dialect.alter_column(&new_column, &old_column)?);
            }
        }
    }
    for name in &diff.dropped_columns {
        if let Some(column) = old.column(name) {
            parts.push(dialect.drop_column(column)?);
        }
    }

    if diff.primary_key_changed {
        if let Some(pk) = new_pk {
            parts.push(dialect.create_primary_key(pk)?);
        }
    }

    for name in diff.added_indices.iter().chain(&diff.changed_indices) {
        if let Some(index) = new.index(name) {
            parts.push(dialect.create_index(index)?);
        }
    }

    Ok(join_statements(parts))
}

pub(super) fn rebuild_table<D>(dialect: &D, table: &Table) -> Result<String>
where
    D: CatalogDialect + ?Sized,
{
    let name = dialect.to_literal(&table.name)?;
    let mut tmp = table.clone();
    tmp.set_name(format!("{}__tmp", table.name.trim()));
    tmp.indices.clear();
    if let Some(pk) = &mut tmp.primary_key {
        pk.name.clear();
    }
    let tmp_name = dialect.to_literal(&tmp.name)?;

    let columns = table
        .columns
        .iter()
        .map(|c| dialect.to_literal(&c.name))
        .collect::<Result<Vec<_>>>()?
        .join(", ");

    let create = dialect.create_table(&tmp)?;
    if create.is_empty() {
        return Ok(String::new());
    }
    let mut parts = vec![
        create,
        format!("insert into {tmp_name} ({columns}) select {columns} from {name};"),
    ];
    for column in tmp.columns.iter().filter(|c| c.auto_increment) {
        parts.push(dialect.reset_auto_increment(column)?);
    }
    parts.push(dialect.drop_table(table)?);
    parts.push(dialect.rename_table(&tmp.name, &table.name)?);

    let key_name = table.primary_key.as_ref().map(|pk| key(&pk.name));
    for index in &table.indices {
        if Some(key(&index.name)) != key_name {
            parts.push(dialect.create_index(index)?);
        }
    }
    Ok(join_statements(parts))
}
