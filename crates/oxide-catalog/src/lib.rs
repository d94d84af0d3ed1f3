//! Relational catalog introspection and DDL synthesis.
//!
//! `oxide-catalog` reads the live structure of a database (schemas, tables,
//! columns, indexes, primary keys, sequences and stored routines) into a
//! normalized model, and generates dialect-correct DDL that moves a database
//! from one structural state to another.
//!
//! # Architecture
//!
//! - **Model** - `Schema`, `Table`, `Column`, `Index`, `PrimaryKey`,
//!   `Sequence` and `Procedure`, with lightweight owner handles
//! - **Client** - The two queries introspection needs, backed by sqlx
//! - **Dialect** - Per-database catalog queries, quoting, type mapping and
//!   DDL statements (MySQL, PostgreSQL; Oracle for introspection only)
//! - **Meta** - One facade per connection with a configurable ignore list
//! - **Sync** - Schema-level diff that emits create/alter/drop DDL
//!
//! # Example
//!
//! ```rust,ignore
//! use oxide_catalog::prelude::*;
//!
//! let mut meta = CatalogMeta::connect("mysql://root@localhost/shop").await?;
//! meta.add_ignore_table_prefix("tmp_");
//!
//! if let Some(table) = meta.get_table("shop", "users").await? {
//!     println!("{}", meta.dialect().create_table(&table)?);
//! }
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Print the active schema
//! oxide-catalog -d mysql://root@localhost/shop current-schema
//!
//! # Dump the model as JSON
//! oxide-catalog -d postgres://localhost/shop inspect --schema public --json
//!
//! # DDL that turns the target database into the source
//! oxide-catalog -d postgres://localhost/prod sync --source postgres://localhost/dev
//!
//! # Same, limited to two tables; other target tables are left alone
//! oxide-catalog -d postgres://localhost/prod sync --source postgres://localhost/dev \
//!     --table users --table orders
//! ```

pub mod client;
pub mod dialect;
pub mod error;
pub mod ignore;
pub mod introspect;
pub mod meta;
pub mod model;
pub mod sync;
pub mod typemap;
pub mod value;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::client::{CatalogClient, NamedParams, RenameMode, SqlxClient};
    pub use crate::dialect::{
        dialect_for, CatalogDialect, MySqlDialect, OracleDialect, PostgresDialect, TableDiff,
    };
    pub use crate::error::{CatalogError, Result};
    pub use crate::ignore::{IgnoreList, TableFilter};
    pub use crate::introspect::load_schemas;
    pub use crate::meta::CatalogMeta;
    pub use crate::model::{
        Column, DbType, Index, PrimaryKey, Procedure, Schema, SchemaRef, Sequence, Table,
        TableRef,
    };
    pub use crate::sync::{procedure_ddl, struct_sync, SyncOptions};
    pub use crate::typemap::ColumnType;
    pub use crate::value::{CatalogValue, Row};
}
