//! Cross-dialect type and default-value mapping.
//!
//! A column read from one engine keeps its native type name (`int8`,
//! `varchar2`, `longtext`). Before another dialect renders it, the type is
//! translated here with a fixed table per (source, target) pair. Columns
//! rendered by their own dialect pass through untouched.

use crate::model::{Column, DbType};

/// A dialect-specific type name with its size parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    /// Lower-cased type name.
    pub data_type: String,
    /// Numeric precision.
    pub size: i32,
    /// Numeric scale.
    pub decimal_digits: i32,
    /// Character length.
    pub width: i32,
}

impl ColumnType {
    /// Captures the type fields of a column.
    #[must_use]
    pub fn of(column: &Column) -> Self {
        Self {
            data_type: column.data_type.trim().to_lowercase(),
            size: column.size,
            decimal_digits: column.decimal_digits,
            width: column.width,
        }
    }

    fn numeric(data_type: &str, size: i32, decimal_digits: i32) -> Self {
        Self {
            data_type: data_type.to_string(),
            size,
            decimal_digits,
            width: 0,
        }
    }

    fn character(data_type: &str, width: i32) -> Self {
        Self {
            data_type: data_type.to_string(),
            size: 0,
            decimal_digits: 0,
            width,
        }
    }

    /// Renames the type, keeping its precision but dropping any length.
    fn renamed(&self, data_type: &str) -> Self {
        Self {
            data_type: data_type.to_string(),
            width: 0,
            ..self.clone()
        }
    }
}

/// Translates a column's type into the `target` dialect's vocabulary.
#[must_use]
pub fn map_type(column: &Column, target: DbType) -> ColumnType {
    let source = ColumnType::of(column);
    if column.db_type() == target {
        return source;
    }
    let mapped = match (column.db_type(), target) {
        (DbType::MySql, DbType::PostgreSql) => mysql_to_postgres(&source),
        (DbType::MySql, DbType::Oracle) => mysql_to_oracle(&source),
        (DbType::Oracle, DbType::MySql) => oracle_to_mysql(&source),
        (DbType::Oracle, DbType::PostgreSql) => oracle_to_postgres(&source),
        (DbType::PostgreSql, DbType::MySql) => postgres_to_mysql(&source),
        (DbType::PostgreSql, DbType::Oracle) => postgres_to_oracle(&source),
        _ => None,
    };
    mapped.unwrap_or(source)
}

fn mysql_to_postgres(ty: &ColumnType) -> Option<ColumnType> {
    Some(match ty.data_type.as_str() {
        "tinyint" | "smallint" => ColumnType::numeric("int2", 16, 0),
        "mediumint" | "int" | "integer" => ColumnType::numeric("int4", 32, 0),
        "bigint" => ColumnType::numeric("int8", 64, 0),
        "float" => ColumnType::numeric("float4", 24, 0),
        "double" => ColumnType::numeric("float8", 53, 0),
        "decimal" => ColumnType::numeric("numeric", ty.size, ty.decimal_digits),
        "char" => ColumnType::character("bpchar", ty.width),
        "varchar" => ColumnType::character("varchar", ty.width),
        "tinytext" | "text" | "mediumtext" | "longtext" => ColumnType::character("text", 0),
        "year" | "date" => ty.renamed("date"),
        "time" => ty.renamed("time"),
        "datetime" | "timestamp" => ty.renamed("timestamp"),
        "boolean" => ty.renamed("bool"),
        "json" => ty.renamed("json"),
        "bit" | "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" => {
            ty.renamed("bytea")
        }
        _ => return None,
    })
}

fn mysql_to_oracle(ty: &ColumnType) -> Option<ColumnType> {
    Some(match ty.data_type.as_str() {
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" => {
            ColumnType::numeric("number", 11, 0)
        }
        "bigint" => ColumnType::numeric("number", 19, 0),
        "float" => ColumnType::character("binary_float", 0),
        "double" => ColumnType::character("binary_double", 0),
        "decimal" => ColumnType::numeric("number", ty.size, ty.decimal_digits),
        "char" => ColumnType::character("char", ty.width),
        "varchar" => ColumnType::character("varchar2", ty.width),
        "tinytext" => ColumnType::character("varchar2", 255),
        "text" | "mediumtext" | "longtext" => ColumnType::character("clob", 0),
        "year" | "time" | "date" => ty.renamed("date"),
        "datetime" | "timestamp" => ty.renamed("timestamp"),
        "boolean" => ColumnType::numeric("number", 1, 0),
        "bit" | "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" => {
            ty.renamed("blob")
        }
        _ => return None,
    })
}

fn oracle_to_mysql(ty: &ColumnType) -> Option<ColumnType> {
    Some(match ty.data_type.as_str() {
        "number" => ColumnType::numeric("decimal", ty.size, ty.decimal_digits),
        "integer" => ColumnType::numeric("int", 10, 0),
        "float" | "binary_float" | "real" => ColumnType::numeric("float", 12, 0),
        "double" | "binary_double" => ColumnType::numeric("double", 22, 0),
        "char" | "nchar" => ColumnType::character("char", ty.width),
        "varchar2" | "nvarchar2" => ColumnType::character("varchar", ty.width),
        "clob" | "nclob" => ty.renamed("longtext"),
        "date" => ty.renamed("date"),
        "boolean" => ColumnType::numeric("tinyint", 3, 0),
        "blob" | "raw" | "long raw" => ty.renamed("longblob"),
        other if other.starts_with("timestamp") => ty.renamed("datetime"),
        _ => return None,
    })
}

fn oracle_to_postgres(ty: &ColumnType) -> Option<ColumnType> {
    Some(match ty.data_type.as_str() {
        "number" => ColumnType::numeric("numeric", ty.size, ty.decimal_digits),
        "integer" => ty.renamed("int4"),
        "float" | "binary_float" | "real" => ty.renamed("float4"),
        "double" | "binary_double" => ty.renamed("float8"),
        "char" | "nchar" => ColumnType::character("bpchar", ty.width),
        "varchar2" | "nvarchar2" => ColumnType::character("varchar", ty.width),
        "clob" | "nclob" => ty.renamed("text"),
        "date" => ty.renamed("date"),
        "boolean" => ty.renamed("bool"),
        "blob" | "raw" | "long raw" => ty.renamed("bytea"),
        other if other.starts_with("timestamp") && other.contains("time zone") => {
            ty.renamed("timestamptz")
        }
        other if other.starts_with("timestamp") => ty.renamed("timestamp"),
        _ => return None,
    })
}

fn postgres_to_mysql(ty: &ColumnType) -> Option<ColumnType> {
    Some(match ty.data_type.as_str() {
        "int2" | "smallint" | "smallserial" => ColumnType::numeric("smallint", 5, 0),
        "int4" | "integer" | "serial" => ColumnType::numeric("int", 10, 0),
        "int8" | "bigint" | "bigserial" => ColumnType::numeric("bigint", 19, 0),
        "decimal" | "numeric" => ColumnType::numeric("decimal", ty.size, ty.decimal_digits),
        "float4" | "real" => ColumnType::numeric("float", 12, 0),
        "double" | "float8" | "double precision" => ColumnType::numeric("double", 22, 0),
        "varchar" | "character varying" => ColumnType::character("varchar", ty.width),
        "bpchar" | "character" | "char" => ColumnType::character("char", ty.width),
        "text" => ty.renamed("longtext"),
        "timestamp" | "timestamptz" | "timestamp without time zone"
        | "timestamp with time zone" => ty.renamed("datetime"),
        "date" => ty.renamed("date"),
        "time" | "timetz" | "time without time zone" | "time with time zone" => {
            ty.renamed("time")
        }
        "bool" | "boolean" => ColumnType::numeric("tinyint", 1, 0),
        "json" | "jsonb" => ty.renamed("json"),
        "bytea" => ty.renamed("longblob"),
        _ => return None,
    })
}

fn postgres_to_oracle(ty: &ColumnType) -> Option<ColumnType> {
    Some(match ty.data_type.as_str() {
        "int2" | "smallint" | "smallserial" | "int4" | "integer" | "serial" => {
            ColumnType::numeric("number", 11, 0)
        }
        "int8" | "bigint" | "bigserial" => ColumnType::numeric("number", 19, 0),
        "decimal" | "numeric" => ColumnType::numeric("number", ty.size, ty.decimal_digits),
        "float4" | "real" => ColumnType::character("binary_float", 0),
        "double" | "float8" | "double precision" => ColumnType::character("binary_double", 0),
        "varchar" | "character varying" => ColumnType::character("varchar2", ty.width),
        "bpchar" | "character" | "char" => ColumnType::character("char", ty.width),
        "text" => ty.renamed("clob"),
        "timestamp" | "timestamp without time zone" | "time" | "time without time zone" => {
            ty.renamed("timestamp")
        }
        "timestamptz" | "timestamp with time zone" | "timetz" | "time with time zone" => {
            ty.renamed("timestamp with time zone")
        }
        "date" => ty.renamed("date"),
        "bool" | "boolean" => ColumnType::numeric("number", 1, 0),
        "bytea" => ty.renamed("blob"),
        _ => return None,
    })
}

/// Translates a column's default value into the `target` dialect. Blank
/// defaults and defaults with no equivalent (sequence calls) yield `None`.
#[must_use]
pub fn map_default(column: &Column, target: DbType) -> Option<String> {
    let value = column.default_value.as_deref()?.trim();
    if value.is_empty() {
        return None;
    }
    if column.db_type() == target {
        return Some(value.to_string());
    }
    let lower = value.to_lowercase();
    let is_now = |prefixes: &[&str]| prefixes.iter().any(|p| lower.starts_with(p));
    let mapped = match (column.db_type(), target) {
        (DbType::MySql, DbType::PostgreSql) if is_now(&["current_timestamp"]) => "now()".to_string(),
        (DbType::MySql, DbType::Oracle) if is_now(&["current_timestamp"]) => "sysdate".to_string(),
        (DbType::Oracle, DbType::MySql) if is_now(&["sysdate"]) => "current_timestamp(3)".to_string(),
        (DbType::Oracle, DbType::PostgreSql) if is_now(&["sysdate"]) => "now()".to_string(),
        (DbType::PostgreSql, _) => {
            let now = if target == DbType::Oracle {
                "sysdate"
            } else {
                "current_timestamp(3)"
            };
            if is_now(&["now()", "current_timestamp", "localtimestamp"]) {
                now.to_string()
            } else if lower.starts_with("nextval(") || (lower.contains("::") && lower.ends_with(')')) {
                String::new()
            } else if let Some(pos) = value.find("::") {
                // '-1'::integer or NULL::numeric
                value[..pos].to_string()
            } else {
                value.to_string()
            }
        }
        _ => value.to_string(),
    };
    Some(mapped).filter(|v| !v.is_empty())
}
