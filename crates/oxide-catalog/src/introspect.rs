//! Catalog introspection.
//!
//! Builds the schema model from a fixed sequence of catalog queries:
//! schemas, tables, columns, column comments, indexes, sequences and
//! routines. Each step joins onto the objects earlier steps produced, and a
//! row whose owner is missing (filtered out, or dropped between two queries)
//! is skipped rather than treated as an error.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, trace, warn};

use crate::client::{CatalogClient, NamedParams, RenameMode};
use crate::dialect::CatalogDialect;
use crate::error::Result;
use crate::ignore::TableFilter;
use crate::model::{sort_schemas, Column, Index, PrimaryKey, Procedure, Schema, Sequence, Table};
use crate::value::{get_bool, get_i64, get_lower, get_string, Row};

struct Loader<'a, C> {
    client: &'a C,
    dialect: &'a dyn CatalogDialect,
    filter: &'a TableFilter,
    schemas: BTreeMap<String, Schema>,
}

impl<C> Loader<'_, C>
where
    C: CatalogClient,
{
    async fn fetch<F>(&self, step: &str, build: F) -> Result<Vec<Row>>
    where
        F: FnOnce(&TableFilter, &mut NamedParams) -> Option<String>,
    {
        let mut params = NamedParams::new();
        let Some(sql) = build(self.filter, &mut params) else {
            return Ok(Vec::new());
        };
        let rows = self.client.query_many(&sql, &params, RenameMode::None).await?;
        debug!(step, rows = rows.len(), "Catalog query finished");
        Ok(rows)
    }

    fn schema_entry(&mut self, name: &str) -> &mut Schema {
        let db_type = self.dialect.db_type();
        self.schemas
            .entry(name.to_string())
            .or_insert_with(|| Schema::new(db_type, name))
    }

    fn table_mut(&mut self, schema: &str, table: &str) -> Option<&mut Table> {
        self.schemas.get_mut(schema)?.table_mut(table)
    }

    async fn load_schemas(&mut self) -> Result<()> {
        let dialect = self.dialect;
        for row in self.fetch("schemas", |f, p| Some(dialect.schemas_sql(f, p))).await? {
            let name = get_lower(&row, "schemaName");
            if !name.is_empty() && self.filter.includes_schema(&name) {
                self.schema_entry(&name);
            }
        }
        Ok(())
    }

    async fn load_tables(&mut self) -> Result<()> {
        let dialect = self.dialect;
        for row in self.fetch("tables", |f, p| Some(dialect.tables_sql(f, p))).await? {
            let schema_name = get_lower(&row, "schemaName");
            let table_name = get_lower(&row, "tableName");
            if table_name.is_empty() {
                warn!(schema = %schema_name, "Skipping table row without a name");
                continue;
            }
            if !self.filter.includes_table(&schema_name, &table_name) {
                trace!(schema = %schema_name, table = %table_name, "Table filtered out");
                continue;
            }
            let schema = self.schema_entry(&schema_name);
            if schema.table(&table_name).is_some() {
                continue;
            }
            let mut table = Table::new(schema.owner(), table_name);
            table.comment = get_string(&row, "comment").filter(|c| !c.trim().is_empty());
            schema.add_table(table);
        }
        Ok(())
    }

    async fn load_columns(&mut self) -> Result<()> {
        let dialect = self.dialect;
        for row in self.fetch("columns", |f, p| Some(dialect.columns_sql(f, p))).await? {
            let schema_name = get_lower(&row, "schemaName");
            let table_name = get_lower(&row, "tableName");
            let Some(table) = self.table_mut(&schema_name, &table_name) else {
                trace!(schema = %schema_name, table = %table_name, "Skipping column of unknown table");
                continue;
            };
            let mut column = Column::new(get_lower(&row, "columnName"), "");
            dialect.fill_column(&mut column, &row);
            column.attributes = row;
            table.add_column(column);
        }

        for row in self
            .fetch("column comments", |f, p| dialect.column_comments_sql(f, p))
            .await?
        {
            let schema_name = get_lower(&row, "schemaName");
            let table_name = get_lower(&row, "tableName");
            let column = self
                .table_mut(&schema_name, &table_name)
                .and_then(|t| t.column_mut(&get_lower(&row, "columnName")));
            if let Some(column) = column {
                column.comment = get_string(&row, "columnComment").filter(|c| !c.trim().is_empty());
            }
        }
        Ok(())
    }

    async fn load_indices(&mut self) -> Result<()> {
        let dialect = self.dialect;
        for row in self.fetch("indices", |f, p| Some(dialect.indices_sql(f, p))).await? {
            let entry = dialect.index_entry(&row);
            let Some(table) = self.table_mut(&entry.schema, &entry.table) else {
                continue;
            };
            let Some(column) = table.column_mut(&entry.column) else {
                trace!(table = %entry.table, column = %entry.column, "Skipping index of unknown column");
                continue;
            };
            column.part_of_index = true;
            column.part_of_unique_index |= entry.unique;
            column.part_of_primary_key |= entry.primary;
            let snapshot = column.clone();

            let owner = table.table_ref();
            if table.index(&entry.name).is_none() {
                let mut index = Index::new(owner.clone(), entry.name.clone(), entry.unique);
                index.attributes = row.clone();
                table.indices.push(index);
            }
            if let Some(index) = table.index_mut(&entry.name) {
                if !index.columns.iter().any(|c| c.name == snapshot.name) {
                    index.columns.push(snapshot.clone());
                }
            }
            if entry.primary {
                let pk = table.primary_key.get_or_insert_with(|| {
                    let mut pk = PrimaryKey::new(owner, entry.name.clone());
                    pk.attributes = row.clone();
                    pk
                });
                if !pk.columns.iter().any(|c| c.name == snapshot.name) {
                    pk.columns.push(snapshot);
                }
            }
        }
        Ok(())
    }

    async fn load_sequences(&mut self) -> Result<()> {
        let dialect = self.dialect;
        for row in self.fetch("sequences", |f, p| dialect.sequences_sql(f, p)).await? {
            let schema_name = get_lower(&row, "schemaName");
            if !self.filter.includes_schema(&schema_name) {
                continue;
            }
            let schema = self.schema_entry(&schema_name);
            let mut sequence = Sequence::new(schema.owner(), get_lower(&row, "name"));
            sequence.min_value = get_i64(&row, "minValue");
            sequence.max_value = get_i64(&row, "maxValue");
            sequence.increment = get_i64(&row, "increment");
            sequence.cycle = get_bool(&row, "cycle", false);
            schema.add_sequence(sequence);
        }
        Ok(())
    }

    async fn load_routines(&mut self) -> Result<()> {
        let dialect = self.dialect;
        let mut arguments: HashMap<(String, String), Vec<Row>> = HashMap::new();
        for row in self
            .fetch("routine arguments", |f, p| dialect.routine_arguments_sql(f, p))
            .await?
        {
            let key = (get_lower(&row, "schemaName"), get_lower(&row, "specificName"));
            arguments.entry(key).or_default().push(row);
        }

        // One routine may span several rows (one per source line).
        let mut routines: Vec<(Row, String)> = Vec::new();
        let mut positions: HashMap<(String, String, String, String), usize> = HashMap::new();
        for row in self.fetch("routines", |f, p| Some(dialect.routines_sql(f, p))).await? {
            let key = (
                get_lower(&row, "schemaName"),
                get_lower(&row, "type"),
                get_lower(&row, "name"),
                get_lower(&row, "specificName"),
            );
            let text = get_string(&row, "definition").unwrap_or_default();
            if let Some(&position) = positions.get(&key) {
                routines[position].1.push_str(&text);
            } else {
                positions.insert(key, routines.len());
                routines.push((row, text));
            }
        }

        for (head, body) in routines {
            let schema_name = get_lower(&head, "schemaName");
            let Some(schema) = self.schemas.get_mut(&schema_name) else {
                trace!(schema = %schema_name, "Skipping routine of unknown schema");
                continue;
            };
            let args = arguments
                .get(&(schema_name.clone(), get_lower(&head, "specificName")))
                .map_or(&[][..], Vec::as_slice);
            let mut procedure = Procedure::new(
                schema.owner(),
                get_lower(&head, "name"),
                get_lower(&head, "type") == "function",
            );
            procedure.definition = dialect.routine_definition(&head, &body, args);
            procedure.attributes = head;
            schema.add_procedure(procedure);
        }
        Ok(())
    }
}

/// Reads every schema that passes `filter`, with its tables, columns,
/// indexes, primary keys, sequences and routines. The result is sorted by
/// schema name, tables by name, columns by ordinal position.
///
/// # Errors
///
/// Propagates the first failing catalog query; no partial result is
/// returned.
pub async fn load_schemas<C>(
    client: &C,
    dialect: &dyn CatalogDialect,
    filter: &TableFilter,
) -> Result<Vec<Schema>>
where
    C: CatalogClient,
{
    let mut loader = Loader {
        client,
        dialect,
        filter,
        schemas: BTreeMap::new(),
    };
    loader.load_schemas().await?;
    loader.load_tables().await?;
    loader.load_columns().await?;
    loader.load_indices().await?;
    loader.load_sequences().await?;
    loader.load_routines().await?;

    let mut result: Vec<Schema> = loader.schemas.into_values().collect();
    sort_schemas(&mut result);
    info!(
        dialect = %dialect.db_type(),
        schemas = result.len(),
        tables = result.iter().map(|s| s.tables.len()).sum::<usize>(),
        "Catalog loaded"
    );
    Ok(result)
}
