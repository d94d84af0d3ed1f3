//! SQL execution client contract.
//!
//! Introspection only needs two primitives from a database client: a scalar
//! text query and a parameterized multi-row query. [`SqlxClient`] provides
//! them over a sqlx pool; [`MemoryClient`] answers from canned rows.

mod memory;
mod pool;

use std::future::Future;

pub use memory::{ExecutedQuery, MemoryClient};
pub use pool::SqlxClient;

use crate::error::Result;
use crate::value::Row;

/// How result column names are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenameMode {
    /// Column names exactly as aliased in the SQL.
    #[default]
    None,
    /// Column names lower-cased.
    LowerCase,
}

impl RenameMode {
    /// Applies the rename rule to one column name.
    #[must_use]
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::None => name.to_string(),
            Self::LowerCase => name.to_lowercase(),
        }
    }
}

/// Named query parameters bound to `:param_N` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedParams {
    values: Vec<(String, String)>,
}

impl NamedParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds each value to a fresh placeholder and returns the placeholder
    /// list for an `IN (...)` clause, e.g. `:param_0, :param_1`.
    pub fn where_in<I, S>(&mut self, values: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut placeholders = Vec::new();
        for value in values {
            let name = format!("param_{}", self.values.len());
            placeholders.push(format!(":{name}"));
            self.values.push((name, value.as_ref().to_string()));
        }
        placeholders.join(", ")
    }

    /// Looks up a bound value by placeholder name (without the colon).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Number of bound values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bound values in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// The queries the introspector needs from a database client.
pub trait CatalogClient: Send + Sync {
    /// Runs a query and returns the first column of the first row as text.
    fn query_string(&self, sql: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Runs a query with named parameters and returns every row.
    fn query_many(
        &self,
        sql: &str,
        params: &NamedParams,
        rename: RenameMode,
    ) -> impl Future<Output = Result<Vec<Row>>> + Send;
}
