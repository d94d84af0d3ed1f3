//! In-memory client answering catalog queries from canned rows.

use std::sync::{Mutex, PoisonError};

use super::{CatalogClient, NamedParams, RenameMode};
use crate::error::{CatalogError, Result};
use crate::value::Row;

/// A recorded query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedQuery {
    /// SQL text as issued.
    pub sql: String,
    /// Bound parameters as `(name, value)` pairs.
    pub params: Vec<(String, String)>,
}

#[derive(Debug, Default)]
struct Responses {
    scalars: Vec<(String, Option<String>)>,
    rows: Vec<(String, Vec<Row>)>,
    failures: Vec<String>,
}

/// A [`CatalogClient`] that matches each query against registered SQL
/// fragments. The first fragment contained in the query wins; unmatched
/// queries return no rows. Every query is recorded.
#[derive(Debug, Default)]
pub struct MemoryClient {
    responses: Responses,
    executed: Mutex<Vec<ExecutedQuery>>,
}

impl MemoryClient {
    /// Creates a client with no canned responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers scalar queries containing `fragment` with `value`.
    #[must_use]
    pub fn with_scalar(mut self, fragment: &str, value: Option<&str>) -> Self {
        self.responses
            .scalars
            .push((fragment.to_string(), value.map(str::to_string)));
        self
    }

    /// Answers row queries containing `fragment` with `rows`.
    #[must_use]
    pub fn with_rows(mut self, fragment: &str, rows: Vec<Row>) -> Self {
        self.responses.rows.push((fragment.to_string(), rows));
        self
    }

    /// Fails queries containing `fragment`.
    #[must_use]
    pub fn with_failure(mut self, fragment: &str) -> Self {
        self.responses.failures.push(fragment.to_string());
        self
    }

    /// Returns every query issued so far.
    #[must_use]
    pub fn executed(&self) -> Vec<ExecutedQuery> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, sql: &str, params: &NamedParams) -> Result<()> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ExecutedQuery {
                sql: sql.to_string(),
                params: params
                    .iter()
                    .map(|(n, v)| (n.to_string(), v.to_string()))
                    .collect(),
            });
        match self.responses.failures.iter().find(|f| sql.contains(f.as_str())) {
            Some(fragment) => Err(CatalogError::Query(format!("canned failure for '{fragment}'"))),
            None => Ok(()),
        }
    }
}

impl CatalogClient for MemoryClient {
    async fn query_string(&self, sql: &str) -> Result<Option<String>> {
        self.record(sql, &NamedParams::new())?;
        Ok(self
            .responses
            .scalars
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()))
            .and_then(|(_, value)| value.clone()))
    }

    async fn query_many(
        &self,
        sql: &str,
        params: &NamedParams,
        rename: RenameMode,
    ) -> Result<Vec<Row>> {
        self.record(sql, params)?;
        let rows = self
            .responses
            .rows
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default();
        Ok(rows
            .into_iter()
            .map(|row| row.into_iter().map(|(k, v)| (rename.apply(&k), v)).collect())
            .collect())
    }
}
