//! oxide-catalog CLI
//!
//! Command-line tool for inspecting database catalogs and printing DDL.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use oxide_catalog::prelude::*;

/// Catalog introspection and DDL generation.
#[derive(Parser)]
#[command(name = "oxide-catalog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (mysql:// or postgres://).
    #[arg(short, long, env = "DATABASE_URL")]
    database: String,

    #[command(flatten)]
    ignore: IgnoreArgs,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct IgnoreArgs {
    /// Schema to skip (repeatable).
    #[arg(long = "ignore-schema", global = true)]
    schemas: Vec<String>,

    /// Table to skip (repeatable).
    #[arg(long = "ignore-table", global = true)]
    tables: Vec<String>,

    /// Skip tables starting with this prefix (repeatable).
    #[arg(long = "ignore-prefix", global = true)]
    prefixes: Vec<String>,

    /// Skip tables ending with this suffix (repeatable).
    #[arg(long = "ignore-suffix", global = true)]
    suffixes: Vec<String>,
}

impl IgnoreArgs {
    fn apply<C: CatalogClient>(&self, meta: &mut CatalogMeta<C>) {
        for name in &self.schemas {
            meta.add_ignore_schema(name);
        }
        for name in &self.tables {
            meta.add_ignore_table(name);
        }
        for prefix in &self.prefixes {
            meta.add_ignore_table_prefix(prefix);
        }
        for suffix in &self.suffixes {
            meta.add_ignore_table_suffix(suffix);
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the connection's active schema.
    CurrentSchema,

    /// Print the introspected schema model.
    Inspect {
        /// Schema to read (all if not specified).
        #[arg(short, long)]
        schema: Vec<String>,

        /// Table to read (all if not specified).
        #[arg(short, long)]
        table: Vec<String>,

        /// Print the model as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print create statements for a schema.
    Ddl {
        /// Schema to read (the active schema if not specified).
        #[arg(short, long)]
        schema: Option<String>,

        /// Table to include (all if not specified).
        #[arg(short, long)]
        table: Vec<String>,
    },

    /// Print the DDL that makes the target database match a source database.
    Sync {
        /// Source database URL.
        #[arg(long)]
        source: String,

        /// Source schema (the source's active schema if not specified).
        #[arg(long)]
        source_schema: Option<String>,

        /// Target schema (the target's active schema if not specified).
        #[arg(long)]
        target_schema: Option<String>,

        /// Table to sync (repeatable; all if not specified). Unlisted
        /// target tables are left alone.
        #[arg(short, long)]
        table: Vec<String>,

        /// Also sync sequences.
        #[arg(long)]
        sequences: bool,

        /// Also print routine definitions from the source.
        #[arg(long)]
        procedures: bool,
    },
}

async fn resolve_schema<C: CatalogClient>(
    meta: &CatalogMeta<C>,
    name: Option<String>,
) -> anyhow::Result<String> {
    match name {
        Some(name) => Ok(name),
        None => meta
            .current_schema()
            .await?
            .context("database reports no active schema; pass one explicitly"),
    }
}

fn print_summary(schemas: &[Schema]) {
    for schema in schemas {
        println!("{} ({})", schema.name, schema.db_type);
        for table in &schema.tables {
            let key = table
                .primary_key
                .as_ref()
                .map(|pk| pk.column_names().join(", "))
                .unwrap_or_default();
            println!(
                "  {:<40} columns={:<4} indices={:<3} pk=[{}]",
                table.name,
                table.columns.len(),
                table.indices.len(),
                key
            );
        }
        for sequence in &schema.sequences {
            println!("  sequence {}", sequence.name);
        }
        for procedure in &schema.procedures {
            let kind = if procedure.function { "function" } else { "procedure" };
            println!("  {kind} {}", procedure.name);
        }
    }
}

fn create_ddl(dialect: &dyn CatalogDialect, schema: &Schema) -> oxide_catalog::error::Result<String> {
    let mut statements = Vec::new();
    for table in &schema.tables {
        statements.push(dialect.create_table(table)?);
    }
    for sequence in &schema.sequences {
        statements.push(dialect.create_sequence(sequence)?);
    }
    statements.push(procedure_ddl(dialect, schema, &[])?);
    Ok(oxide_catalog::dialect::join_statements(statements))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Connect to database
    let mut meta = CatalogMeta::connect(&cli.database).await?;
    cli.ignore.apply(&mut meta);
    info!(dialect = %meta.db_type(), "Connected");

    match cli.command {
        Commands::CurrentSchema => {
            let schema = meta.current_schema().await?.unwrap_or_default();
            println!("{schema}");
        }

        Commands::Inspect {
            schema,
            table,
            json,
        } => {
            let schemas = meta.get_schemas(&schema, &table).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&schemas)?);
            } else {
                print_summary(&schemas);
            }
        }

        Commands::Ddl { schema, table } => {
            let name = resolve_schema(&meta, schema).await?;
            let schemas = meta.get_schemas(&[name.clone()], &table).await?;
            let Some(schema) = schemas.first() else {
                anyhow::bail!("schema '{name}' not found");
            };
            println!("{}", create_ddl(meta.dialect(), schema)?);
        }

        Commands::Sync {
            source,
            source_schema,
            target_schema,
            table,
            sequences,
            procedures,
        } => {
            let mut source_meta = CatalogMeta::connect(&source).await?;
            cli.ignore.apply(&mut source_meta);

            let source_name = resolve_schema(&source_meta, source_schema).await?;
            let target_name = resolve_schema(&meta, target_schema).await?;
            let source_schema = source_meta
                .get_schemas(&[source_name.clone()], &table)
                .await?
                .into_iter()
                .next()
                .with_context(|| format!("source schema '{source_name}' not found"))?;
            let target_schema = meta
                .get_schemas(&[target_name.clone()], &table)
                .await?
                .into_iter()
                .next()
                .unwrap_or_else(|| Schema::new(meta.db_type(), target_name.to_lowercase()));

            let mut options = SyncOptions::new().with_tables(table);
            if sequences {
                options = options.with_sequences();
            }
            let dialect = meta.dialect();
            let mut sql = struct_sync(dialect, &source_schema, &target_schema, &options)?;
            if procedures {
                let routines = procedure_ddl(dialect, &source_schema, &[])?;
                sql = oxide_catalog::dialect::join_statements([sql, routines]);
            }

            if sql.is_empty() {
                info!(source = %source_name, target = %target_name, "Schemas are in sync");
            } else {
                println!("{sql}");
            }
        }
    }

    Ok(())
}
