//! Database dialect implementations.
//!
//! A dialect bundles everything engine-specific: identifier quoting, type
//! rendering, the catalog queries that feed introspection and the DDL
//! templates. The set is closed ([`DbType`]) and a dialect is picked once per
//! connection with [`dialect_for`].
//!
//! DDL methods default to returning an empty string, which is how a dialect
//! declares a feature unsupported; callers can invoke every method on every
//! dialect.

mod diff;
mod mysql;
mod oracle;
mod postgres;

pub use diff::TableDiff;
pub use mysql::MySqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;

use crate::client::NamedParams;
use crate::error::{require_name, CatalogError, Result};
use crate::ignore::{IgnoreList, TableFilter};
use crate::model::{Column, DbType, Index, PrimaryKey, Procedure, Sequence, Table};
use crate::typemap::{self, ColumnType};
use crate::value::{get_bool, get_lower, Row};

/// Separator between generated statements.
pub const LINE: &str = "\n";

/// Characters that force an identifier to be quoted.
const NEEDS_QUOTE: &[char] = &[
    '~', '`', '!', '@', '#', '%', '^', '&', '*', '(', ')', '-', '+', '=', '[', ']', '{', '}',
    '|', '\\', ';', ':', '\'', '"', ',', '.', '<', '>', '/', '?',
];

static MYSQL: MySqlDialect = MySqlDialect;
static POSTGRES: PostgresDialect = PostgresDialect;
static ORACLE: OracleDialect = OracleDialect;

/// Returns the dialect implementation for a database type.
#[must_use]
pub fn dialect_for(db_type: DbType) -> &'static dyn CatalogDialect {
    match db_type {
        DbType::MySql => &MYSQL,
        DbType::PostgreSql => &POSTGRES,
        DbType::Oracle => &ORACLE,
    }
}

/// Joins statement fragments, skipping empty ones.
#[must_use]
pub fn join_statements<I>(parts: I) -> String
where
    I: IntoIterator<Item = String>,
{
    parts
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join(LINE)
}

/// Trims trailing newlines and guarantees a terminating semicolon.
#[must_use]
pub fn finish_statement(sql: &str) -> String {
    let sql = sql.trim_end();
    if sql.is_empty() || sql.ends_with(';') {
        sql.to_string()
    } else {
        format!("{sql};")
    }
}

pub(crate) fn same_text(a: Option<&str>, b: Option<&str>) -> bool {
    a.unwrap_or_default().trim() == b.unwrap_or_default().trim()
}

/// One row of the index/primary-key catalog query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Schema name, lower-cased.
    pub schema: String,
    /// Table name, lower-cased.
    pub table: String,
    /// Index or constraint name, lower-cased.
    pub name: String,
    /// Column name, lower-cased.
    pub column: String,
    /// Unique index.
    pub unique: bool,
    /// The row describes the primary key.
    pub primary: bool,
}

/// Engine-specific formatting, type mapping, catalog queries and DDL.
pub trait CatalogDialect: Send + Sync {
    /// Returns the database type this dialect serves.
    fn db_type(&self) -> DbType;

    /// Returns the identifier quote character.
    fn quote_char(&self) -> char;

    /// Schemas and tables every connection of this dialect ignores.
    fn default_ignores(&self) -> IgnoreList {
        IgnoreList::new()
    }

    // =========================================================================
    // Identifier & literal formatting
    // =========================================================================

    /// Trims and lower-cases an identifier, quoting it only when it contains
    /// whitespace or punctuation.
    ///
    /// # Errors
    ///
    /// Fails on a blank name.
    fn to_literal(&self, name: &str) -> Result<String> {
        let name = require_name("name", name)?.to_lowercase();
        if name
            .chars()
            .any(|c| c.is_whitespace() || NEEDS_QUOTE.contains(&c))
        {
            let quote = self.quote_char();
            Ok(format!("{quote}{name}{quote}"))
        } else {
            Ok(name)
        }
    }

    /// Escapes text for embedding in a single-quoted SQL string.
    fn to_comment(&self, text: &str) -> String {
        text.trim().replace('\'', "''")
    }

    // =========================================================================
    // Type & default mapping
    // =========================================================================

    /// Returns the exact type string the catalog reported for a column of
    /// this dialect, if any.
    fn native_type(&self, column: &Column) -> Option<String> {
        if column.db_type() != self.db_type() {
            return None;
        }
        column
            .attributes
            .get("column_type")
            .and_then(crate::value::CatalogValue::as_string)
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
    }

    /// Renders the SQL type of a column.
    fn column_type(&self, column: &Column) -> String {
        self.native_type(column)
            .unwrap_or_else(|| self.render_type(&typemap::map_type(column, self.db_type())))
    }

    /// Renders a mapped type. Dialects override this for their quirks and
    /// fall back to [`generic_type`].
    fn render_type(&self, ty: &ColumnType) -> String {
        generic_type(ty)
    }

    /// Renders the default clause value of a column, or `None` when the
    /// column has no default. Auto-increment columns never carry one.
    fn default_value(&self, column: &Column) -> Option<String> {
        if column.auto_increment {
            return None;
        }
        let value = typemap::map_default(column, self.db_type())?;
        if is_sql_expression(&value, is_numeric_type(&column.data_type)) {
            Some(value)
        } else {
            Some(format!("'{}'", value.replace('\'', "''")))
        }
    }

    /// Returns `true` when two columns would render differently.
    fn column_changed(&self, new: &Column, old: &Column) -> bool {
        !new.name.trim().eq_ignore_ascii_case(old.name.trim())
            || !same_text(new.comment.as_deref(), old.comment.as_deref())
            || new.auto_increment != old.auto_increment
            || new.not_null != old.not_null
            || self.column_type(new) != self.column_type(old)
            || self.default_value(new) != self.default_value(old)
    }

    // =========================================================================
    // Catalog queries
    // =========================================================================

    /// Query returning the active schema name.
    fn current_schema_sql(&self) -> &'static str;

    /// Schema names (`schemaName`).
    fn schemas_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> String;

    /// Base tables (`schemaName`, `tableName`, `comment`).
    fn tables_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> String;

    /// Columns, keyed by `schemaName`, `tableName` and `columnName`.
    fn columns_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> String;

    /// Populates a column from its catalog row.
    fn fill_column(&self, column: &mut Column, row: &Row);

    /// Column comments for catalogs that keep them apart from the columns.
    fn column_comments_sql(&self, _filter: &TableFilter, _params: &mut NamedParams) -> Option<String> {
        None
    }

    /// Index and primary-key members in (schema, table, index, position)
    /// order.
    fn indices_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> String;

    /// Interprets one row of [`CatalogDialect::indices_sql`].
    fn index_entry(&self, row: &Row) -> IndexEntry {
        let kind = get_lower(row, "type");
        IndexEntry {
            schema: get_lower(row, "schemaName"),
            table: get_lower(row, "tableName"),
            name: get_lower(row, "name"),
            column: get_lower(row, "columnName"),
            unique: get_bool(row, "unique", false),
            primary: kind == "primary key" || kind == "p",
        }
    }

    /// Sequences (`schemaName`, `name`, `minValue`, `maxValue`, `increment`,
    /// `cycle`); `None` on dialects without sequences.
    fn sequences_sql(&self, _filter: &TableFilter, _params: &mut NamedParams) -> Option<String> {
        None
    }

    /// Stored routines (`schemaName`, `name`, `type`, `definition`,
    /// `specificName`). Several rows of the same routine are concatenated.
    fn routines_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> String;

    /// Routine parameters (`schemaName`, `specificName`, ...) for catalogs
    /// that do not return a full signature with the routine.
    fn routine_arguments_sql(&self, _filter: &TableFilter, _params: &mut NamedParams) -> Option<String> {
        None
    }

    /// Reconstructs a creation statement from a routine's first row, its
    /// concatenated body and its parameter rows.
    fn routine_definition(&self, head: &Row, body: &str, arguments: &[Row]) -> String;

    // =========================================================================
    // Tables
    // =========================================================================

    /// `CREATE TABLE` plus comments and secondary indexes.
    ///
    /// # Errors
    ///
    /// Fails on blank names.
    fn create_table(&self, _table: &Table) -> Result<String> {
        Ok(String::new())
    }

    /// `DROP TABLE`.
    ///
    /// # Errors
    ///
    /// Fails on a blank table name.
    fn drop_table(&self, _table: &Table) -> Result<String> {
        Ok(String::new())
    }

    /// Renames a table.
    ///
    /// # Errors
    ///
    /// Fails on blank names.
    fn rename_table(&self, _old_name: &str, _new_name: &str) -> Result<String> {
        Ok(String::new())
    }

    /// Sets (or clears) the table comment.
    ///
    /// # Errors
    ///
    /// Fails on a blank table name.
    fn alter_table_comment(&self, _table: &Table) -> Result<String> {
        Ok(String::new())
    }

    /// Transforms `old` into `new`: rename, comment, then the structural
    /// diff of columns, primary key and indexes.
    ///
    /// # Errors
    ///
    /// Fails on blank names.
    fn alter_table(&self, new: &Table, old: &Table) -> Result<String> {
        diff::alter_table(self, new, old)
    }

    /// Rebuilds a table so its physical column order matches `table`.
    ///
    /// # Errors
    ///
    /// Fails on blank names.
    fn rebuild_table(&self, table: &Table) -> Result<String> {
        diff::rebuild_table(self, table)
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// Column definition as used inside `CREATE TABLE` and `ADD COLUMN`.
    ///
    /// # Errors
    ///
    /// Fails on a blank column name.
    fn column_definition(&self, _column: &Column) -> Result<String> {
        Ok(String::new())
    }

    /// Adds a column.
    ///
    /// # Errors
    ///
    /// Fails on blank names.
    fn create_column(&self, _column: &Column) -> Result<String> {
        Ok(String::new())
    }

    /// Transforms column `old` into `new`.
    ///
    /// # Errors
    ///
    /// Fails on blank names.
    fn alter_column(&self, _new: &Column, _old: &Column) -> Result<String> {
        Ok(String::new())
    }

    /// Drops a column.
    ///
    /// # Errors
    ///
    /// Fails on blank names.
    fn drop_column(&self, _column: &Column) -> Result<String> {
        Ok(String::new())
    }

    /// Turns the auto-increment flag of an existing column on or off.
    ///
    /// # Errors
    ///
    /// Fails on blank names.
    fn set_auto_increment(&self, _column: &Column, _enabled: bool) -> Result<String> {
        Ok(String::new())
    }

    /// Moves the auto-increment counter of a column past the existing rows.
    ///
    /// # Errors
    ///
    /// Fails on blank names.
    fn reset_auto_increment(&self, _column: &Column) -> Result<String> {
        Ok(String::new())
    }

    // =========================================================================
    // Primary keys
    // =========================================================================

    /// The bare `ADD PRIMARY KEY` statement.
    ///
    /// # Errors
    ///
    /// Fails on blank names.
    fn add_primary_key(&self, _pk: &PrimaryKey) -> Result<String> {
        Ok(String::new())
    }

    /// The bare `DROP PRIMARY KEY` statement.
    ///
    /// # Errors
    ///
    /// Fails on blank names.
    fn remove_primary_key(&self, _pk: &PrimaryKey) -> Result<String> {
        Ok(String::new())
    }

    /// Creates a primary key, then promotes its auto-increment columns and
    /// resets their counters.
    ///
    /// # Errors
    ///
    /// Fails on blank names or an empty key.
    fn create_primary_key(&self, pk: &PrimaryKey) -> Result<String> {
        if pk.columns.is_empty() {
            return Err(CatalogError::invalid("primary key", "has no columns"));
        }
        let mut parts = vec![self.add_primary_key(pk)?];
        for column in pk.columns.iter().filter(|c| c.auto_increment) {
            parts.push(self.set_auto_increment(column, true)?);
            parts.push(self.reset_auto_increment(column)?);
        }
        Ok(join_statements(parts))
    }

    /// Demotes the key's auto-increment columns, then drops the key.
    ///
    /// # Errors
    ///
    /// Fails on blank names.
    fn drop_primary_key(&self, pk: &PrimaryKey) -> Result<String> {
        let mut parts = Vec::new();
        for column in pk.columns.iter().filter(|c| c.auto_increment) {
            parts.push(self.set_auto_increment(column, false)?);
        }
        parts.push(self.remove_primary_key(pk)?);
        Ok(join_statements(parts))
    }

    /// Replaces a primary key. `None` on either side means create-only or
    /// drop-only.
    ///
    /// # Errors
    ///
    /// Fails when both sides are absent or on blank names.
    fn alter_primary_key(&self, new: Option<&PrimaryKey>, old: Option<&PrimaryKey>) -> Result<String> {
        match (new, old) {
            (None, None) => Err(CatalogError::invalid("primary key", "requires a new or old key")),
            (Some(new), None) => self.create_primary_key(new),
            (None, Some(old)) => self.drop_primary_key(old),
            (Some(new), Some(old)) => Ok(join_statements([
                self.drop_primary_key(old)?,
                self.create_primary_key(new)?,
            ])),
        }
    }

    // =========================================================================
    // Indexes
    // =========================================================================

    /// `CREATE [UNIQUE] INDEX`.
    ///
    /// # Errors
    ///
    /// Fails on blank names.
    fn create_index(&self, _index: &Index) -> Result<String> {
        Ok(String::new())
    }

    /// Drops an index; the form depends on the index's uniqueness.
    ///
    /// # Errors
    ///
    /// Fails on blank names.
    fn drop_index(&self, _index: &Index) -> Result<String> {
        Ok(String::new())
    }

    /// Indexes are never altered in place: drop the old, create the new.
    ///
    /// # Errors
    ///
    /// Fails on blank names.
    fn alter_index(&self, new: &Index, old: &Index) -> Result<String> {
        Ok(join_statements([self.drop_index(old)?, self.create_index(new)?]))
    }

    // =========================================================================
    // Sequences & procedures
    // =========================================================================

    /// `CREATE SEQUENCE`.
    ///
    /// # Errors
    ///
    /// Fails on a blank name.
    fn create_sequence(&self, _sequence: &Sequence) -> Result<String> {
        Ok(String::new())
    }

    /// Renames a sequence and updates changed attributes.
    ///
    /// # Errors
    ///
    /// Fails on a blank name.
    fn alter_sequence(&self, _new: &Sequence, _old: &Sequence) -> Result<String> {
        Ok(String::new())
    }

    /// `DROP SEQUENCE`.
    ///
    /// # Errors
    ///
    /// Fails on a blank name.
    fn drop_sequence(&self, _sequence: &Sequence) -> Result<String> {
        Ok(String::new())
    }

    /// Emits the stored creation statement of a routine of this dialect.
    ///
    /// # Errors
    ///
    /// Fails on a blank name.
    fn create_procedure(&self, procedure: &Procedure) -> Result<String> {
        require_name("procedure", &procedure.name)?;
        if procedure.db_type() != self.db_type() {
            return Ok(String::new());
        }
        Ok(finish_statement(&procedure.definition))
    }

    /// Drops a routine of this dialect.
    ///
    /// # Errors
    ///
    /// Fails on a blank name.
    fn drop_procedure(&self, procedure: &Procedure) -> Result<String> {
        require_name("procedure", &procedure.name)?;
        if procedure.db_type() != self.db_type() {
            return Ok(String::new());
        }
        self.drop_routine(procedure)
    }

    /// The dialect's `DROP FUNCTION` / `DROP PROCEDURE` statement.
    ///
    /// # Errors
    ///
    /// Fails on a blank name.
    fn drop_routine(&self, _procedure: &Procedure) -> Result<String> {
        Ok(String::new())
    }
}

/// Renders a type from its name and size parameters: temporal types bare,
/// character types with their length, numeric types with precision and
/// scale.
#[must_use]
pub fn generic_type(ty: &ColumnType) -> String {
    let data_type = ty.data_type.as_str();
    if data_type.contains("time") || data_type.contains("date") {
        data_type.to_string()
    } else if data_type.contains("char") || ty.size <= 0 {
        if ty.width > 0 {
            format!("{data_type}({})", ty.width)
        } else if ty.size > 0 {
            format!("{data_type}({})", ty.size)
        } else {
            data_type.to_string()
        }
    } else if ty.decimal_digits > 0 {
        format!("{data_type}({}, {})", ty.size, ty.decimal_digits)
    } else {
        format!("{data_type}({})", ty.size)
    }
}

/// Returns `true` for numeric and boolean type names, whose defaults are
/// written without quotes.
#[must_use]
pub fn is_numeric_type(data_type: &str) -> bool {
    let lower = data_type.trim().to_lowercase();
    let base = lower
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or_default();
    matches!(
        base,
        "tinyint"
            | "smallint"
            | "mediumint"
            | "int"
            | "integer"
            | "bigint"
            | "int2"
            | "int4"
            | "int8"
            | "smallserial"
            | "serial"
            | "bigserial"
            | "serial2"
            | "serial4"
            | "serial8"
            | "decimal"
            | "numeric"
            | "number"
            | "float"
            | "float4"
            | "float8"
            | "double"
            | "real"
            | "money"
            | "bit"
            | "bool"
            | "boolean"
            | "year"
            | "binary_float"
            | "binary_double"
    )
}

/// `name(...)` or `schema.name(...)`.
fn is_function_call(value: &str) -> bool {
    let Some((name, _)) = value.split_once('(') else {
        return false;
    };
    let name = name.trim_end();
    value.ends_with(')')
        && name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Returns `true` for default values that are SQL as written: quoted
/// literals, casts, function calls and keywords. Bare numbers count only
/// for numeric columns, so `007` on a text column stays a string.
#[must_use]
pub fn is_sql_expression(value: &str, numeric: bool) -> bool {
    let lower = value.trim().to_lowercase();
    if is_function_call(&lower) {
        return true;
    }
    if let Some((head, _)) = lower.split_once("::") {
        return head.starts_with('(') || is_sql_expression(head, true);
    }
    (numeric && lower.parse::<f64>().is_ok())
        || lower.starts_with('\'')
        || lower.starts_with("b'")
        || lower.starts_with("x'")
        || lower.starts_with("current_timestamp")
        || matches!(
            lower.as_str(),
            "null"
                | "true"
                | "false"
                | "current_date"
                | "current_time"
                | "current_user"
                | "localtime"
                | "localtimestamp"
                | "sysdate"
        )
}

/// Appends `and <expr> in (...)` / `not in (...)` filters on a schema and an
/// optional table expression.
pub(crate) fn push_filters(
    sql: &mut String,
    filter: &TableFilter,
    params: &mut NamedParams,
    schema_expr: &str,
    table_expr: Option<&str>,
) {
    if !filter.schema_names.is_empty() {
        let list = params.where_in(&filter.schema_names);
        sql.push_str(&format!("and lower({schema_expr}) in ({list}) "));
    }
    if let Some(table_expr) = table_expr {
        if !filter.table_names.is_empty() {
            let list = params.where_in(&filter.table_names);
            sql.push_str(&format!("and lower({table_expr}) in ({list}) "));
        }
    }
    if !filter.ignore_schemas.is_empty() {
        let list = params.where_in(&filter.ignore_schemas);
        sql.push_str(&format!("and lower({schema_expr}) not in ({list}) "));
    }
    if let Some(table_expr) = table_expr {
        if !filter.ignore_tables.is_empty() {
            let list = params.where_in(&filter.ignore_tables);
            sql.push_str(&format!("and lower({table_expr}) not in ({list}) "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ignore::IgnoreList;

    #[test]
    fn test_to_literal_quotes_only_when_needed() {
        let mysql = dialect_for(DbType::MySql);
        let pg = dialect_for(DbType::PostgreSql);

        assert_eq!(mysql.to_literal("orders").unwrap(), "orders");
        assert_eq!(mysql.to_literal("  Orders ").unwrap(), "orders");
        assert_eq!(mysql.to_literal("My Table").unwrap(), "`my table`");
        assert_eq!(pg.to_literal("My Table").unwrap(), "\"my table\"");
        assert_eq!(pg.to_literal("order-items").unwrap(), "\"order-items\"");
        assert_eq!(pg.to_literal("user_id").unwrap(), "user_id");
    }

    #[test]
    fn test_to_literal_rejects_blank() {
        let err = dialect_for(DbType::MySql).to_literal("  ").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidArgument(_)));
    }

    #[test]
    fn test_to_comment_escapes_quotes() {
        let mysql = dialect_for(DbType::MySql);
        assert_eq!(mysql.to_comment(" it's a table "), "it''s a table");
    }

    #[test]
    fn test_generic_type() {
        let ty = |data_type: &str, size, decimal_digits, width| ColumnType {
            data_type: data_type.to_string(),
            size,
            decimal_digits,
            width,
        };
        assert_eq!(generic_type(&ty("varchar", 0, 0, 64)), "varchar(64)");
        assert_eq!(generic_type(&ty("decimal", 20, 4, 0)), "decimal(20, 4)");
        assert_eq!(generic_type(&ty("number", 19, 0, 0)), "number(19)");
        assert_eq!(generic_type(&ty("datetime", 3, 0, 0)), "datetime");
        assert_eq!(generic_type(&ty("text", 0, 0, 0)), "text");
    }

    #[test]
    fn test_is_sql_expression() {
        assert!(is_sql_expression("0", true));
        assert!(is_sql_expression("-1.5", true));
        assert!(is_sql_expression("'abc'", false));
        assert!(is_sql_expression("CURRENT_TIMESTAMP", false));
        assert!(is_sql_expression("now()", false));
        assert!(is_sql_expression("pg_catalog.gen_random_uuid()", false));
        assert!(is_sql_expression("NULL", false));
        assert!(is_sql_expression("'x'::character varying", false));
        assert!(is_sql_expression("NULL::numeric", false));
        assert!(is_sql_expression("nextval('seq'::regclass)", false));
        assert!(!is_sql_expression("abc", false));
        assert!(!is_sql_expression("pending", false));
    }

    #[test]
    fn test_string_defaults_stay_quoted() {
        assert!(!is_sql_expression("007", false));
        assert!(!is_sql_expression("n/a (none)", false));
        assert!(!is_sql_expression("a::b c", false));
        assert!(is_numeric_type("decimal(20,4)"));
        assert!(is_numeric_type("int unsigned"));
        assert!(!is_numeric_type("point"));
        assert!(!is_numeric_type("varchar"));
    }

    #[test]
    fn test_finish_statement() {
        assert_eq!(finish_statement("select 1\n\n"), "select 1;");
        assert_eq!(finish_statement("select 1;\n"), "select 1;");
        assert_eq!(finish_statement(""), "");
    }

    #[test]
    fn test_push_filters_binds_every_name() {
        let mut list = IgnoreList::new();
        list.add_schema("sys");
        let filter = list.resolve(&["shop".to_string()], &["users".to_string()]);
        let mut params = NamedParams::new();
        let mut sql = String::new();
        push_filters(&mut sql, &filter, &mut params, "table_schema", Some("table_name"));

        assert_eq!(
            sql,
            "and lower(table_schema) in (:param_0) \
             and lower(table_name) in (:param_1) \
             and lower(table_schema) not in (:param_2) "
        );
        assert_eq!(params.get("param_2"), Some("sys"));
    }

    #[test]
    fn test_procedure_of_other_dialect_is_skipped() {
        use crate::model::Schema;
        let schema = Schema::new(DbType::PostgreSql, "public");
        let mut procedure = Procedure::new(schema.owner(), "refresh", true);
        procedure.definition = "create function refresh() returns void as $$ $$ language sql;".to_string();

        let mysql = dialect_for(DbType::MySql);
        assert_eq!(mysql.create_procedure(&procedure).unwrap(), "");
        assert_eq!(mysql.drop_procedure(&procedure).unwrap(), "");
    }
}
