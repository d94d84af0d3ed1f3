//! sqlx-backed client for MySQL and PostgreSQL.

use std::sync::LazyLock;

use regex::Regex;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use tracing::{debug, warn};

use super::{CatalogClient, NamedParams, RenameMode};
use crate::error::{CatalogError, Result};
use crate::model::DbType;
use crate::value::{CatalogValue, Row};

static PLACEHOLDER: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r":(param_\d+)\b"));

/// A connection pool for one of the sqlx-supported dialects.
#[derive(Debug, Clone)]
pub enum SqlxClient {
    /// MySQL pool.
    MySql(MySqlPool),
    /// PostgreSQL pool.
    Postgres(PgPool),
}

impl SqlxClient {
    /// Connects to `url`; the scheme selects the dialect.
    ///
    /// # Errors
    ///
    /// Fails for schemes sqlx cannot serve here (including Oracle) and for
    /// connection errors.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        match DbType::from_url(url)? {
            DbType::MySql => {
                let pool = MySqlPoolOptions::new()
                    .max_connections(max_connections)
                    .connect(url)
                    .await?;
                Ok(Self::MySql(pool))
            }
            DbType::PostgreSql => {
                let pool = PgPoolOptions::new()
                    .max_connections(max_connections)
                    .connect(url)
                    .await?;
                Ok(Self::Postgres(pool))
            }
            DbType::Oracle => Err(CatalogError::UnsupportedDatabase(
                "oracle has no sqlx driver".to_string(),
            )),
        }
    }

    /// Returns the dialect of the underlying pool.
    #[must_use]
    pub const fn db_type(&self) -> DbType {
        match self {
            Self::MySql(_) => DbType::MySql,
            Self::Postgres(_) => DbType::PostgreSql,
        }
    }
}

/// Rewrites `:param_N` placeholders into positional ones and returns the
/// values in the order they must be bound.
fn positional(
    sql: &str,
    params: &NamedParams,
    db_type: DbType,
) -> Result<(String, Vec<String>)> {
    let pattern = PLACEHOLDER
        .as_ref()
        .map_err(|e| CatalogError::Query(format!("placeholder pattern: {e}")))?;
    let mut values = Vec::new();
    let mut missing = None;
    let rewritten = pattern.replace_all(sql, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        if let Some(value) = params.get(name) {
            values.push(value.to_string());
        } else {
            missing = Some(name.to_string());
        }
        match db_type {
            DbType::PostgreSql => format!("${}", values.len()),
            _ => "?".to_string(),
        }
    });
    if let Some(name) = missing {
        return Err(CatalogError::invalid(&name, "is not bound"));
    }
    Ok((rewritten.into_owned(), values))
}

impl CatalogClient for SqlxClient {
    async fn query_string(&self, sql: &str) -> Result<Option<String>> {
        debug!(dialect = %self.db_type(), sql, "Scalar query");
        let value = match self {
            Self::MySql(pool) => {
                let row = sqlx::query(sql).fetch_optional(pool).await?;
                row.map(|r| mysql_value(&r, 0))
            }
            Self::Postgres(pool) => {
                let row = sqlx::query(sql).fetch_optional(pool).await?;
                row.map(|r| pg_value(&r, 0))
            }
        };
        Ok(value.and_then(|v| v.as_string()))
    }

    async fn query_many(
        &self,
        sql: &str,
        params: &NamedParams,
        rename: RenameMode,
    ) -> Result<Vec<Row>> {
        let (sql, values) = positional(sql, params, self.db_type())?;
        debug!(dialect = %self.db_type(), params = values.len(), "Catalog query");
        match self {
            Self::MySql(pool) => {
                let mut query = sqlx::query(&sql);
                for value in &values {
                    query = query.bind(value);
                }
                let rows = query.fetch_all(pool).await?;
                Ok(rows
                    .iter()
                    .map(|r| {
                        r.columns()
                            .iter()
                            .map(|c| (rename.apply(c.name()), mysql_value(r, c.ordinal())))
                            .collect()
                    })
                    .collect())
            }
            Self::Postgres(pool) => {
                let mut query = sqlx::query(&sql);
                for value in &values {
                    query = query.bind(value);
                }
                let rows = query.fetch_all(pool).await?;
                Ok(rows
                    .iter()
                    .map(|r| {
                        r.columns()
                            .iter()
                            .map(|c| (rename.apply(c.name()), pg_value(r, c.ordinal())))
                            .collect()
                    })
                    .collect())
            }
        }
    }
}

// =============================================================================
// Value decoding
// =============================================================================

fn mysql_value(row: &MySqlRow, index: usize) -> CatalogValue {
    match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return CatalogValue::Null,
        Ok(_) => {}
        Err(_) => return CatalogValue::Null,
    }
    let type_name = row.column(index).type_info().name().to_ascii_uppercase();

    if type_name.contains("INT") {
        if type_name.contains("UNSIGNED") {
            if let Ok(v) = row.try_get::<u64, _>(index) {
                return CatalogValue::UInt(v);
            }
        } else if let Ok(v) = row.try_get::<i64, _>(index) {
            return CatalogValue::Int(v);
        }
    }
    match type_name.as_str() {
        "BOOLEAN" => {
            if let Ok(v) = row.try_get::<bool, _>(index) {
                return CatalogValue::Bool(v);
            }
        }
        "FLOAT" | "DOUBLE" => {
            if let Ok(v) = row.try_get::<f64, _>(index) {
                return CatalogValue::Float(v);
            }
        }
        "DATETIME" | "TIMESTAMP" => {
            if let Ok(v) = row.try_get::<chrono::NaiveDateTime, _>(index) {
                return CatalogValue::Text(v.to_string());
            }
        }
        "DATE" => {
            if let Ok(v) = row.try_get::<chrono::NaiveDate, _>(index) {
                return CatalogValue::Text(v.to_string());
            }
        }
        _ => {}
    }
    if let Ok(v) = row.try_get::<String, _>(index) {
        return CatalogValue::Text(v);
    }
    // information_schema reports some text columns with a binary collation,
    // and DECIMAL travels as text in the binary protocol.
    if let Ok(v) = row.try_get_unchecked::<String, _>(index) {
        return CatalogValue::Text(v);
    }
    if let Ok(v) = row.try_get_unchecked::<Vec<u8>, _>(index) {
        return CatalogValue::Bytes(v);
    }
    warn!(column = row.column(index).name(), type_name, "Undecodable MySQL value");
    CatalogValue::Null
}

fn pg_value(row: &PgRow, index: usize) -> CatalogValue {
    match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return CatalogValue::Null,
        Ok(_) => {}
        Err(_) => return CatalogValue::Null,
    }
    let type_name = row.column(index).type_info().name().to_ascii_uppercase();

    let decoded = match type_name.as_str() {
        "INT2" => row.try_get::<i16, _>(index).map(|v| CatalogValue::Int(i64::from(v))),
        "INT4" => row.try_get::<i32, _>(index).map(|v| CatalogValue::Int(i64::from(v))),
        "INT8" => row.try_get::<i64, _>(index).map(CatalogValue::Int),
        "BOOL" => row.try_get::<bool, _>(index).map(CatalogValue::Bool),
        "FLOAT4" => row
            .try_get::<f32, _>(index)
            .map(|v| CatalogValue::Float(f64::from(v))),
        "FLOAT8" => row.try_get::<f64, _>(index).map(CatalogValue::Float),
        "TIMESTAMP" => row
            .try_get::<chrono::NaiveDateTime, _>(index)
            .map(|v| CatalogValue::Text(v.to_string())),
        "BYTEA" => row.try_get::<Vec<u8>, _>(index).map(CatalogValue::Bytes),
        _ => row.try_get::<String, _>(index).map(CatalogValue::Text),
    };
    decoded.unwrap_or_else(|e| {
        warn!(column = row.column(index).name(), type_name, error = %e, "Undecodable PostgreSQL value");
        CatalogValue::Null
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> (NamedParams, String) {
        let mut params = NamedParams::new();
        let list = params.where_in(["shop", "crm"]);
        (params, list)
    }

    #[test]
    fn test_positional_mysql() {
        let (params, list) = params();
        let sql = format!("select 1 where lower(table_schema) in ({list})");
        let (sql, values) = positional(&sql, &params, DbType::MySql).unwrap();
        assert_eq!(sql, "select 1 where lower(table_schema) in (?, ?)");
        assert_eq!(values, vec!["shop", "crm"]);
    }

    #[test]
    fn test_positional_postgres_keeps_casts() {
        let (params, list) = params();
        let sql = format!("select a::text from t where s in ({list})");
        let (sql, values) = positional(&sql, &params, DbType::PostgreSql).unwrap();
        assert_eq!(sql, "select a::text from t where s in ($1, $2)");
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_positional_unbound_placeholder() {
        let err = positional("select :param_3", &NamedParams::new(), DbType::MySql).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidArgument(_)));
    }
}
