//! Schema object model.
//!
//! Every introspection call builds a fresh graph of these types. Children keep
//! a small owner handle ([`SchemaRef`] / [`TableRef`]) instead of a pointer to
//! their parent, so a [`Column`] can report its table name without the model
//! forming reference cycles. Names produced by introspection are lower-cased;
//! all lookups compare names case-insensitively.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CatalogError;
use crate::value::Row;

/// Database dialect tag carried by every schema object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// MySQL / MariaDB.
    MySql,
    /// PostgreSQL.
    PostgreSql,
    /// Oracle (introspection only).
    Oracle,
}

impl DbType {
    /// Returns the dialect name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::PostgreSql => "postgresql",
            Self::Oracle => "oracle",
        }
    }

    /// Detects the dialect from a connection URL scheme.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnsupportedDatabase`] for unknown schemes.
    pub fn from_url(url: &str) -> Result<Self, CatalogError> {
        let scheme = url.split(':').next().unwrap_or_default();
        scheme.parse()
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DbType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Self::PostgreSql),
            "oracle" => Ok(Self::Oracle),
            other => Err(CatalogError::UnsupportedDatabase(other.to_string())),
        }
    }
}

/// Owner handle pointing at a schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SchemaRef {
    /// Dialect of the owning schema.
    pub db_type: DbType,
    /// Schema name.
    pub schema: String,
}

/// Owner handle pointing at a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TableRef {
    /// Dialect of the owning schema.
    pub db_type: DbType,
    /// Schema name.
    pub schema: String,
    /// Table name.
    pub table: String,
}

impl TableRef {
    fn detached() -> Self {
        Self {
            db_type: DbType::MySql,
            schema: String::new(),
            table: String::new(),
        }
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

// =============================================================================
// Schema
// =============================================================================

/// A database schema and everything it owns.
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    /// Dialect this schema was read from.
    pub db_type: DbType,
    /// Schema name.
    pub name: String,
    /// Tables, sorted by name.
    pub tables: Vec<Table>,
    /// Sequences (empty on dialects without them).
    pub sequences: Vec<Sequence>,
    /// Stored functions and procedures.
    pub procedures: Vec<Procedure>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new(db_type: DbType, name: impl Into<String>) -> Self {
        Self {
            db_type,
            name: name.into(),
            tables: Vec::new(),
            sequences: Vec::new(),
            procedures: Vec::new(),
        }
    }

    /// Returns the owner handle for objects in this schema.
    #[must_use]
    pub fn owner(&self) -> SchemaRef {
        SchemaRef {
            db_type: self.db_type,
            schema: self.name.clone(),
        }
    }

    /// Finds a table by name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| same_name(&t.name, name))
    }

    /// Finds a table by name for mutation.
    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| same_name(&t.name, name))
    }

    /// Finds a sequence by name.
    #[must_use]
    pub fn sequence(&self, name: &str) -> Option<&Sequence> {
        self.sequences.iter().find(|s| same_name(&s.name, name))
    }

    /// Finds a procedure by name.
    #[must_use]
    pub fn procedure(&self, name: &str) -> Option<&Procedure> {
        self.procedures.iter().find(|p| same_name(&p.name, name))
    }

    /// Attaches a table, re-homing it and its children onto this schema.
    pub fn add_table(&mut self, mut table: Table) {
        table.set_owner(self.owner());
        self.tables.push(table);
    }

    /// Builder form of [`Schema::add_table`].
    #[must_use]
    pub fn with_table(mut self, table: Table) -> Self {
        self.add_table(table);
        self
    }

    /// Attaches a sequence.
    pub fn add_sequence(&mut self, mut sequence: Sequence) {
        sequence.owner = self.owner();
        self.sequences.push(sequence);
    }

    /// Attaches a procedure.
    pub fn add_procedure(&mut self, mut procedure: Procedure) {
        procedure.owner = self.owner();
        self.procedures.push(procedure);
    }

    /// Sorts tables and schema objects by name and each table's columns by
    /// ordinal position.
    pub fn sort(&mut self) {
        self.tables.sort_by(|a, b| a.name.cmp(&b.name));
        for table in &mut self.tables {
            table.sort();
        }
        self.sequences.sort_by(|a, b| a.name.cmp(&b.name));
        self.procedures.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

/// Sorts a schema list by name, then every schema's contents.
pub fn sort_schemas(schemas: &mut [Schema]) {
    schemas.sort_by(|a, b| a.name.cmp(&b.name));
    for schema in schemas {
        schema.sort();
    }
}

// =============================================================================
// Table
// =============================================================================

/// A base table.
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    /// Owning schema.
    #[serde(skip)]
    pub owner: SchemaRef,
    /// Table name.
    pub name: String,
    /// Table comment.
    pub comment: Option<String>,
    /// Columns, sorted by ordinal position.
    pub columns: Vec<Column>,
    /// Indexes, including the one backing the primary key where the catalog
    /// reports it as an index.
    pub indices: Vec<Index>,
    /// Primary key, if any.
    pub primary_key: Option<PrimaryKey>,
}

impl Table {
    /// Creates an empty table owned by `owner`.
    #[must_use]
    pub fn new(owner: SchemaRef, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
            comment: None,
            columns: Vec::new(),
            indices: Vec::new(),
            primary_key: None,
        }
    }

    /// Returns the owner handle for this table's children.
    #[must_use]
    pub fn table_ref(&self) -> TableRef {
        TableRef {
            db_type: self.owner.db_type,
            schema: self.owner.schema.clone(),
            table: self.name.clone(),
        }
    }

    /// Returns the dialect this table was read from.
    #[must_use]
    pub const fn db_type(&self) -> DbType {
        self.owner.db_type
    }

    /// Returns the owning schema name.
    #[must_use]
    pub fn schema_name(&self) -> &str {
        &self.owner.schema
    }

    /// Renames the table and updates every child's owner handle.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.rehome();
    }

    fn set_owner(&mut self, owner: SchemaRef) {
        self.owner = owner;
        self.rehome();
    }

    fn rehome(&mut self) {
        let owner = self.table_ref();
        for column in &mut self.columns {
            column.owner = owner.clone();
        }
        for index in &mut self.indices {
            index.owner = owner.clone();
            for column in &mut index.columns {
                column.owner = owner.clone();
            }
        }
        if let Some(pk) = &mut self.primary_key {
            pk.owner = owner.clone();
            for column in &mut pk.columns {
                column.owner = owner.clone();
            }
        }
    }

    /// Finds a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| same_name(&c.name, name))
    }

    /// Finds a column by name for mutation.
    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| same_name(&c.name, name))
    }

    /// Finds an index by name.
    #[must_use]
    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indices.iter().find(|i| same_name(&i.name, name))
    }

    /// Finds an index by name for mutation.
    pub fn index_mut(&mut self, name: &str) -> Option<&mut Index> {
        self.indices.iter_mut().find(|i| same_name(&i.name, name))
    }

    /// Attaches a column. A column without an ordinal position is placed last.
    pub fn add_column(&mut self, mut column: Column) {
        column.owner = self.table_ref();
        if column.ordinal_position <= 0 {
            column.ordinal_position = i32::try_from(self.columns.len() + 1).unwrap_or(i32::MAX);
        }
        self.columns.push(column);
    }

    /// Builder form of [`Table::add_column`].
    #[must_use]
    pub fn with_column(mut self, column: Column) -> Self {
        self.add_column(column);
        self
    }

    /// Sets the table comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Adds an index over the named columns. Unknown column names are ignored.
    #[must_use]
    pub fn with_index(mut self, name: impl Into<String>, unique: bool, columns: &[&str]) -> Self {
        let mut index = Index::new(self.table_ref(), name, unique);
        for column_name in columns {
            if let Some(column) = self.column_mut(column_name) {
                column.part_of_index = true;
                column.part_of_unique_index |= unique;
                index.columns.push(column.clone());
            }
        }
        self.indices.push(index);
        self
    }

    /// Sets the primary key over the named columns. Unknown column names are
    /// ignored.
    #[must_use]
    pub fn with_primary_key(mut self, name: impl Into<String>, columns: &[&str]) -> Self {
        let mut pk = PrimaryKey::new(self.table_ref(), name);
        for column_name in columns {
            if let Some(column) = self.column_mut(column_name) {
                column.part_of_primary_key = true;
                pk.columns.push(column.clone());
            }
        }
        self.primary_key = Some(pk);
        self
    }

    /// Re-reads the columns of every index and of the primary key from the
    /// table, so key members reflect the table's current column definitions.
    /// Members whose column no longer exists are dropped.
    pub fn refresh_keys(&mut self) {
        let columns = &self.columns;
        let current = |members: &mut Vec<Column>| {
            *members = members
                .iter()
                .filter_map(|m| columns.iter().find(|c| same_name(&c.name, &m.name)).cloned())
                .collect();
        };
        for index in &mut self.indices {
            current(&mut index.columns);
        }
        if let Some(pk) = &mut self.primary_key {
            current(&mut pk.columns);
        }
    }

    /// Sorts columns by ordinal position.
    pub fn sort(&mut self) {
        self.columns.sort_by_key(|c| c.ordinal_position);
    }
}

// =============================================================================
// Column
// =============================================================================

/// A table column.
#[derive(Debug, Clone, Serialize)]
pub struct Column {
    /// Owning table.
    #[serde(skip)]
    pub owner: TableRef,
    /// Column name.
    pub name: String,
    /// Column comment.
    pub comment: Option<String>,
    /// Raw dialect data type name, e.g. `varchar` or `int8`.
    pub data_type: String,
    /// Numeric precision (or datetime precision when the catalog has no
    /// numeric precision).
    pub size: i32,
    /// Numeric scale.
    pub decimal_digits: i32,
    /// Character length.
    pub width: i32,
    /// Default value text as stored by the catalog.
    pub default_value: Option<String>,
    /// 1-based position in the table.
    pub ordinal_position: i32,
    /// NOT NULL constraint.
    pub not_null: bool,
    /// Auto-increment / identity column.
    pub auto_increment: bool,
    /// Part of the primary key.
    pub part_of_primary_key: bool,
    /// Part of any index.
    pub part_of_index: bool,
    /// Part of a unique index.
    pub part_of_unique_index: bool,
    /// The raw catalog row this column was read from.
    pub attributes: Row,
}

impl Column {
    /// Creates a detached column; attach it with [`Table::add_column`].
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            owner: TableRef::detached(),
            name: name.into(),
            comment: None,
            data_type: data_type.into(),
            size: 0,
            decimal_digits: 0,
            width: 0,
            default_value: None,
            ordinal_position: 0,
            not_null: false,
            auto_increment: false,
            part_of_primary_key: false,
            part_of_index: false,
            part_of_unique_index: false,
            attributes: Row::new(),
        }
    }

    /// Returns the owning table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.owner.table
    }

    /// Returns the owning schema name.
    #[must_use]
    pub fn schema_name(&self) -> &str {
        &self.owner.schema
    }

    /// Returns the dialect this column was read from.
    #[must_use]
    pub const fn db_type(&self) -> DbType {
        self.owner.db_type
    }

    /// Sets the numeric precision.
    #[must_use]
    pub const fn size(mut self, size: i32) -> Self {
        self.size = size;
        self
    }

    /// Sets the numeric scale.
    #[must_use]
    pub const fn decimal_digits(mut self, digits: i32) -> Self {
        self.decimal_digits = digits;
        self
    }

    /// Sets the character length.
    #[must_use]
    pub const fn width(mut self, width: i32) -> Self {
        self.width = width;
        self
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Marks the column auto-incrementing.
    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Sets the default value text.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Sets the comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Records a raw catalog attribute.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<crate::value::CatalogValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// Index / PrimaryKey
// =============================================================================

/// A table index. Columns are snapshots of the table's columns, in
/// sequence-in-index order.
#[derive(Debug, Clone, Serialize)]
pub struct Index {
    /// Owning table.
    #[serde(skip)]
    pub owner: TableRef,
    /// Index name.
    pub name: String,
    /// Unique index.
    pub unique: bool,
    /// Indexed columns in index order.
    pub columns: Vec<Column>,
    /// The raw catalog row of the index's first column.
    pub attributes: Row,
}

impl Index {
    /// Creates an empty index.
    #[must_use]
    pub fn new(owner: TableRef, name: impl Into<String>, unique: bool) -> Self {
        Self {
            owner,
            name: name.into(),
            unique,
            columns: Vec::new(),
            attributes: Row::new(),
        }
    }

    /// Returns the owning table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.owner.table
    }

    /// Returns the indexed column names, lower-cased.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.to_lowercase()).collect()
    }
}

/// A primary key. Always unique; the name is a dialect-specific constraint
/// name (`primary` on MySQL).
#[derive(Debug, Clone, Serialize)]
pub struct PrimaryKey {
    /// Owning table.
    #[serde(skip)]
    pub owner: TableRef,
    /// Constraint name.
    pub name: String,
    /// Key columns in key order.
    pub columns: Vec<Column>,
    /// The raw catalog row of the key's first column.
    pub attributes: Row,
}

impl PrimaryKey {
    /// Creates an empty primary key.
    #[must_use]
    pub fn new(owner: TableRef, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
            columns: Vec::new(),
            attributes: Row::new(),
        }
    }

    /// Returns the owning table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.owner.table
    }

    /// Returns the key column names, lower-cased.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.to_lowercase()).collect()
    }
}

// =============================================================================
// Sequence / Procedure
// =============================================================================

/// A sequence generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sequence {
    /// Owning schema.
    #[serde(skip)]
    pub owner: SchemaRef,
    /// Sequence name.
    pub name: String,
    /// Minimum value.
    pub min_value: Option<i64>,
    /// Maximum value.
    pub max_value: Option<i64>,
    /// Increment.
    pub increment: Option<i64>,
    /// Whether the sequence wraps around.
    pub cycle: bool,
}

impl Sequence {
    /// Creates a sequence with no explicit bounds.
    #[must_use]
    pub fn new(owner: SchemaRef, name: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
            min_value: None,
            max_value: None,
            increment: None,
            cycle: false,
        }
    }
}

/// A stored function or procedure.
#[derive(Debug, Clone, Serialize)]
pub struct Procedure {
    /// Owning schema.
    #[serde(skip)]
    pub owner: SchemaRef,
    /// Routine name.
    pub name: String,
    /// `true` for functions, `false` for procedures.
    pub function: bool,
    /// Reconstructed creation statement.
    pub definition: String,
    /// The raw catalog row.
    pub attributes: Row,
}

impl Procedure {
    /// Creates a procedure.
    #[must_use]
    pub fn new(owner: SchemaRef, name: impl Into<String>, function: bool) -> Self {
        Self {
            owner,
            name: name.into(),
            function,
            definition: String::new(),
            attributes: Row::new(),
        }
    }

    /// Returns the dialect the routine was read from.
    #[must_use]
    pub const fn db_type(&self) -> DbType {
        self.owner.db_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Table {
        let schema = Schema::new(DbType::MySql, "shop");
        Table::new(schema.owner(), "users")
            .with_column(Column::new("name", "varchar").width(64))
            .with_column(Column::new("id", "bigint").not_null())
            .with_primary_key("primary", &["id"])
            .with_index("idx_name", false, &["NAME", "missing"])
    }

    #[test]
    fn test_add_column_assigns_owner_and_position() {
        let table = users();
        assert_eq!(table.columns[0].ordinal_position, 1);
        assert_eq!(table.columns[1].ordinal_position, 2);
        assert_eq!(table.columns[1].table_name(), "users");
        assert_eq!(table.columns[1].schema_name(), "shop");
    }

    #[test]
    fn test_lookups_ignore_case() {
        let table = users();
        assert!(table.column("ID").is_some());
        assert!(table.index("IDX_NAME").is_some());
        assert!(table.column("nope").is_none());
    }

    #[test]
    fn test_builders_skip_unknown_columns_and_set_flags() {
        let table = users();
        let index = table.index("idx_name").unwrap();
        assert_eq!(index.column_names(), vec!["name"]);
        assert!(table.column("name").unwrap().part_of_index);
        assert!(table.column("id").unwrap().part_of_primary_key);
        assert_eq!(table.primary_key.as_ref().unwrap().column_names(), vec!["id"]);
    }

    #[test]
    fn test_refresh_keys_follows_column_changes() {
        let mut table = users();
        table.column_mut("id").unwrap().data_type = "int".to_string();
        table.columns.retain(|c| c.name != "name");
        table.refresh_keys();

        assert_eq!(table.primary_key.as_ref().unwrap().columns[0].data_type, "int");
        assert!(table.index("idx_name").unwrap().columns.is_empty());
    }

    #[test]
    fn test_rehoming_updates_children() {
        let mut schema = Schema::new(DbType::PostgreSql, "public");
        schema.add_table(users());
        let table = schema.table_mut("users").unwrap();
        table.set_name("accounts");

        assert_eq!(table.columns[0].owner.db_type, DbType::PostgreSql);
        assert_eq!(table.columns[0].table_name(), "accounts");
        assert_eq!(table.primary_key.as_ref().unwrap().table_name(), "accounts");
        assert_eq!(table.indices[0].columns[0].schema_name(), "public");
    }

    #[test]
    fn test_sort_orders_tables_and_columns() {
        let mut schema = Schema::new(DbType::MySql, "shop");
        let owner = schema.owner();
        let mut orders = Table::new(owner.clone(), "orders");
        let mut late = Column::new("total", "decimal");
        late.ordinal_position = 3;
        let mut early = Column::new("id", "bigint");
        early.ordinal_position = 1;
        orders.add_column(late);
        orders.add_column(early);
        schema.add_table(orders);
        schema.add_table(Table::new(owner, "accounts"));

        let mut schemas = vec![Schema::new(DbType::MySql, "zeta"), schema];
        sort_schemas(&mut schemas);

        assert_eq!(schemas[0].name, "shop");
        assert_eq!(schemas[0].tables[0].name, "accounts");
        let cols: Vec<_> = schemas[0].tables[1].columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(cols, vec!["id", "total"]);
    }

    #[test]
    fn test_db_type_from_url() {
        assert_eq!(DbType::from_url("mysql://root@localhost/shop").unwrap(), DbType::MySql);
        assert_eq!(DbType::from_url("postgres://localhost/db").unwrap(), DbType::PostgreSql);
        assert_eq!(DbType::from_url("postgresql://localhost/db").unwrap(), DbType::PostgreSql);
        assert!(DbType::from_url("sqlite:db.sqlite3").is_err());
    }
}
