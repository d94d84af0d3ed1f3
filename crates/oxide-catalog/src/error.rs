//! Error types for catalog introspection and DDL synthesis.

/// Errors that can occur while reading a catalog or generating DDL.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A required argument was blank or absent.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Database error while running a catalog query.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Query failure reported by a non-sqlx client.
    #[error("Query error: {0}")]
    Query(String),

    /// The connection URL does not name a supported database.
    #[error("Unsupported database: {0}")]
    UnsupportedDatabase(String),
}

impl CatalogError {
    /// Builds a [`CatalogError::InvalidArgument`] naming the offending argument.
    #[must_use]
    pub fn invalid(argument: &str, reason: &str) -> Self {
        Self::InvalidArgument(format!("'{argument}' {reason}"))
    }
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Returns the trimmed value, or an invalid-argument error if it is blank.
pub(crate) fn require_name<'a>(argument: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::invalid(argument, "must not be blank"));
    }
    Ok(trimmed)
}
