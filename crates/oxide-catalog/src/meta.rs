//! Dialect facade: one object per database connection combining the
//! client, the dialect and a caller-configured ignore list.

use tracing::debug;

use crate::client::{CatalogClient, SqlxClient};
use crate::dialect::{dialect_for, CatalogDialect};
use crate::error::{require_name, Result};
use crate::ignore::IgnoreList;
use crate::introspect::load_schemas;
use crate::model::{DbType, Schema, Table};

/// Default pool size used by [`CatalogMeta::connect`].
pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;

/// Entry point for reading a catalog and generating DDL against it.
#[derive(Debug)]
pub struct CatalogMeta<C> {
    client: C,
    db_type: DbType,
    ignore: IgnoreList,
}

impl CatalogMeta<SqlxClient> {
    /// Connects to `url` and selects the dialect from its scheme.
    ///
    /// # Errors
    ///
    /// Returns an error for unsupported schemes or connection failures.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = SqlxClient::connect(url, DEFAULT_MAX_CONNECTIONS).await?;
        let db_type = client.db_type();
        Ok(Self::new(client, db_type))
    }
}

impl<C> CatalogMeta<C>
where
    C: CatalogClient,
{
    /// Wraps a client; the ignore list starts with the dialect's system
    /// schemas and tables.
    #[must_use]
    pub fn new(client: C, db_type: DbType) -> Self {
        let ignore = dialect_for(db_type).default_ignores();
        Self {
            client,
            db_type,
            ignore,
        }
    }

    /// The dialect this facade introspects and generates DDL for.
    #[must_use]
    pub fn dialect(&self) -> &'static dyn CatalogDialect {
        dialect_for(self.db_type)
    }

    /// The database type of the connection.
    #[must_use]
    pub const fn db_type(&self) -> DbType {
        self.db_type
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// The active ignore list.
    #[must_use]
    pub const fn ignore_list(&self) -> &IgnoreList {
        &self.ignore
    }

    /// Excludes a schema from introspection.
    pub fn add_ignore_schema(&mut self, name: &str) {
        self.ignore.add_schema(name);
    }

    /// Excludes a table from introspection.
    pub fn add_ignore_table(&mut self, name: &str) {
        self.ignore.add_table(name);
    }

    /// Excludes tables starting with `prefix`.
    pub fn add_ignore_table_prefix(&mut self, prefix: &str) {
        self.ignore.add_table_prefix(prefix);
    }

    /// Excludes tables ending with `suffix`.
    pub fn add_ignore_table_suffix(&mut self, suffix: &str) {
        self.ignore.add_table_suffix(suffix);
    }

    /// Returns the connection's active schema, lower-cased.
    ///
    /// # Errors
    ///
    /// Propagates query failures.
    pub async fn current_schema(&self) -> Result<Option<String>> {
        let sql = self.dialect().current_schema_sql();
        let schema = self
            .client
            .query_string(sql)
            .await?
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        debug!(schema = ?schema, "Resolved current schema");
        Ok(schema)
    }

    /// Introspects the named schemas and tables. Empty slices mean "all";
    /// the ignore list always applies except to names requested here.
    ///
    /// # Errors
    ///
    /// Propagates the first failing catalog query.
    pub async fn get_schemas(
        &self,
        schema_names: &[String],
        table_names: &[String],
    ) -> Result<Vec<Schema>> {
        let filter = self.ignore.resolve(schema_names, table_names);
        load_schemas(&self.client, self.dialect(), &filter).await
    }

    /// Introspects every schema that is not ignored.
    ///
    /// # Errors
    ///
    /// Propagates the first failing catalog query.
    pub async fn get_all_schemas(&self) -> Result<Vec<Schema>> {
        self.get_schemas(&[], &[]).await
    }

    /// Introspects one schema; `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Fails on a blank name or a failing catalog query.
    pub async fn get_schema(&self, name: &str) -> Result<Option<Schema>> {
        let name = require_name("schema", name)?.to_lowercase();
        let schemas = self.get_schemas(&[name.clone()], &[]).await?;
        Ok(schemas.into_iter().find(|s| s.name == name))
    }

    /// Introspects the connection's active schema; `None` if the database
    /// reports none.
    ///
    /// # Errors
    ///
    /// Propagates query failures.
    pub async fn get_current_schema(&self) -> Result<Option<Schema>> {
        match self.current_schema().await? {
            Some(name) => self.get_schema(&name).await,
            None => Ok(None),
        }
    }

    /// Introspects one table; `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Fails on a blank name or a failing catalog query.
    pub async fn get_table(&self, schema: &str, table: &str) -> Result<Option<Table>> {
        let schema = require_name("schema", schema)?.to_lowercase();
        let table = require_name("table", table)?.to_lowercase();
        let schemas = self
            .get_schemas(&[schema.clone()], &[table.clone()])
            .await?;
        Ok(schemas
            .into_iter()
            .find(|s| s.name == schema)
            .and_then(|mut s| {
                let position = s.tables.iter().position(|t| t.name == table)?;
                Some(s.tables.swap_remove(position))
            }))
    }
}
