//! Schema-level structural sync.
//!
//! Compares a source schema with a target schema and emits the DDL that
//! makes the target match the source: tables present only in the source are
//! created, tables present in both are altered, and tables present only in
//! the target are dropped. Objects are matched by lower-cased name.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::dialect::{join_statements, CatalogDialect};
use crate::error::Result;
use crate::model::{Schema, Sequence, Table};

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Options for [`struct_sync`].
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Also sync sequences.
    pub sequences: bool,
    /// Restricts the sync to these tables (case-insensitive). Empty means
    /// every table; tables outside a non-empty list are never created,
    /// altered or dropped.
    pub tables: Vec<String>,
}

impl SyncOptions {
    /// Creates default options (all tables, no sequences).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables sequence sync.
    #[must_use]
    pub const fn with_sequences(mut self) -> Self {
        self.sequences = true;
        self
    }

    /// Restricts the sync to the named tables.
    #[must_use]
    pub fn with_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables = tables.into_iter().map(Into::into).collect();
        self
    }

    fn includes_table(&self, name: &str) -> bool {
        self.tables.is_empty() || self.tables.iter().any(|t| key(t) == key(name))
    }
}

/// Returns the DDL that turns `target` into `source`, or an empty string if
/// they are structurally identical.
///
/// # Errors
///
/// Propagates invalid-argument errors from the dialect.
pub fn struct_sync(
    dialect: &dyn CatalogDialect,
    source: &Schema,
    target: &Schema,
    options: &SyncOptions,
) -> Result<String> {
    let mut statements = Vec::new();

    let source_tables: Vec<&Table> = source
        .tables
        .iter()
        .filter(|t| options.includes_table(&t.name))
        .collect();
    let target_tables: HashMap<String, &Table> = target
        .tables
        .iter()
        .filter(|t| options.includes_table(&t.name))
        .map(|t| (key(&t.name), t))
        .collect();
    let source_names: BTreeSet<String> = source_tables.iter().map(|t| key(&t.name)).collect();

    for table in &source_tables {
        match target_tables.get(&key(&table.name)) {
            Some(existing) => statements.push(dialect.alter_table(table, existing)?),
            None => statements.push(dialect.create_table(table)?),
        }
    }
    for table in &target.tables {
        if options.includes_table(&table.name) && !source_names.contains(&key(&table.name)) {
            statements.push(dialect.drop_table(table)?);
        }
    }

    if options.sequences {
        sync_sequences(dialect, source, target, &mut statements)?;
    }

    let sql = join_statements(statements);
    debug!(
        source = %source.name,
        target = %target.name,
        tables = options.tables.len(),
        empty = sql.is_empty(),
        "Structural sync computed"
    );
    Ok(sql)
}

fn sync_sequences(
    dialect: &dyn CatalogDialect,
    source: &Schema,
    target: &Schema,
    statements: &mut Vec<String>,
) -> Result<()> {
    let target_sequences: HashMap<String, &Sequence> =
        target.sequences.iter().map(|s| (key(&s.name), s)).collect();
    let source_names: BTreeSet<String> = source.sequences.iter().map(|s| key(&s.name)).collect();

    for sequence in &source.sequences {
        match target_sequences.get(&key(&sequence.name)) {
            Some(existing) => statements.push(dialect.alter_sequence(sequence, existing)?),
            None => statements.push(dialect.create_sequence(sequence)?),
        }
    }
    for sequence in &target.sequences {
        if !source_names.contains(&key(&sequence.name)) {
            statements.push(dialect.drop_sequence(sequence)?);
        }
    }
    Ok(())
}

/// Returns the creation statements of the schema's routines, restricted to
/// `names` (case-insensitive) unless it is empty. Routines recorded for a
/// different dialect are skipped.
///
/// # Errors
///
/// Propagates invalid-argument errors from the dialect.
pub fn procedure_ddl(dialect: &dyn CatalogDialect, schema: &Schema, names: &[String]) -> Result<String> {
    let wanted: BTreeSet<String> = names.iter().map(|n| key(n)).collect();
    let mut statements = Vec::new();
    for procedure in &schema.procedures {
        if wanted.is_empty() || wanted.contains(&key(&procedure.name)) {
            statements.push(dialect.create_procedure(procedure)?);
        }
    }
    Ok(join_statements(statements))
}
