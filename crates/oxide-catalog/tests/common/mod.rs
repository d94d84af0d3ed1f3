#![allow(dead_code)]

use oxide_catalog::client::MemoryClient;
use oxide_catalog::model::{Column, DbType, Schema, Table};
use oxide_catalog::value::Row;

/// Builds a catalog row from text pairs.
pub fn row(pairs: &[(&str, &str)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).into()))
        .collect()
}

/// Builds a catalog row, treating `None` as SQL NULL.
pub fn row_opt(pairs: &[(&str, Option<&str>)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.map(str::to_string).into()))
        .collect()
}

fn mysql_column(schema: &str, table: &str, name: &str, position: &str, extra: &[(&str, &str)]) -> Row {
    let mut row = row(&[
        ("schemaName", schema),
        ("tableName", table),
        ("columnName", name),
        ("ordinalPosition", position),
        ("isNullable", "YES"),
    ]);
    for (k, v) in extra {
        row.insert((*k).to_string(), (*v).into());
    }
    row
}

/// A MySQL catalog with two schemas. Rows arrive in catalog order, which is
/// deliberately not the sorted order, and include rows the introspector must
/// drop: tables matching the default ignore rules and columns/index entries
/// whose owner is missing.
pub fn mysql_catalog() -> MemoryClient {
    MemoryClient::new()
        .with_scalar("select database()", Some("SHOP"))
        .with_rows(
            "information_schema.schemata",
            vec![
                row(&[("schemaName", "shop")]),
                row(&[("schemaName", "crm")]),
                row(&[("schemaName", "mysql")]),
            ],
        )
        .with_rows(
            "information_schema.tables",
            vec![
                row(&[("schemaName", "shop"), ("tableName", "users"), ("comment", "Site users")]),
                row(&[("schemaName", "shop"), ("tableName", "orders"), ("comment", "")]),
                row(&[("schemaName", "shop"), ("tableName", "tmp_import")]),
                row(&[("schemaName", "shop"), ("tableName", "orders_bak")]),
                row(&[("schemaName", "shop"), ("tableName", "audit")]),
                row(&[("schemaName", "crm"), ("tableName", "contacts")]),
                row(&[("schemaName", "mysql"), ("tableName", "user")]),
            ],
        )
        .with_rows(
            "information_schema.columns",
            vec![
                mysql_column("shop", "users", "email", "2", &[
                    ("dataType", "varchar"),
                    ("width", "128"),
                    ("column_type", "varchar(128)"),
                    ("columnKey", "UNI"),
                ]),
                mysql_column("shop", "users", "id", "1", &[
                    ("dataType", "bigint"),
                    ("size", "19"),
                    ("column_type", "bigint unsigned"),
                    ("columnKey", "PRI"),
                    ("isNullable", "NO"),
                    ("extra", "auto_increment"),
                ]),
                mysql_column("shop", "users", "created_at", "3", &[
                    ("dataType", "datetime"),
                    ("datetime_precision", "3"),
                    ("column_type", "datetime(3)"),
                    ("isNullable", "NO"),
                    ("defaultValue", "CURRENT_TIMESTAMP(3)"),
                    ("columnComment", "Creation time"),
                ]),
                mysql_column("shop", "orders", "total", "2", &[
                    ("dataType", "decimal"),
                    ("size", "20"),
                    ("decimalDigits", "4"),
                    ("column_type", "decimal(20,4)"),
                    ("defaultValue", "0.0000"),
                ]),
                mysql_column("shop", "orders", "id", "1", &[
                    ("dataType", "int"),
                    ("size", "10"),
                    ("column_type", "int"),
                    ("isNullable", "NO"),
                    ("columnKey", "PRI"),
                ]),
                mysql_column("shop", "orders", "user_id", "3", &[
                    ("dataType", "bigint"),
                    ("size", "19"),
                    ("column_type", "bigint unsigned"),
                    ("columnKey", "MUL"),
                ]),
                mysql_column("shop", "tmp_import", "id", "1", &[("dataType", "int")]),
                mysql_column("shop", "vanished", "id", "1", &[("dataType", "int")]),
                mysql_column("crm", "contacts", "name", "1", &[
                    ("dataType", "varchar"),
                    ("width", "64"),
                ]),
            ],
        )
        .with_rows(
            "information_schema.statistics",
            vec![
                row(&[("schemaName", "shop"), ("tableName", "orders"), ("name", "idx_orders_user"), ("columnName", "user_id"), ("nonUnique", "1")]),
                row(&[("schemaName", "shop"), ("tableName", "orders"), ("name", "idx_orders_user"), ("columnName", "total"), ("nonUnique", "1")]),
                row(&[("schemaName", "shop"), ("tableName", "orders"), ("name", "PRIMARY"), ("columnName", "id"), ("nonUnique", "0")]),
                row(&[("schemaName", "shop"), ("tableName", "users"), ("name", "PRIMARY"), ("columnName", "id"), ("nonUnique", "0")]),
                row(&[("schemaName", "shop"), ("tableName", "users"), ("name", "uk_users_email"), ("columnName", "email"), ("nonUnique", "0")]),
                row(&[("schemaName", "shop"), ("tableName", "users"), ("name", "idx_phantom"), ("columnName", "phone"), ("nonUnique", "1")]),
            ],
        )
        .with_rows(
            "information_schema.parameters",
            vec![
                row(&[("schemaName", "shop"), ("specificName", "order_count"), ("name", "p_user"), ("dataType", "bigint"), ("mode", "")]),
                row(&[("schemaName", "shop"), ("specificName", "purge_orders"), ("name", "p_days"), ("dataType", "int"), ("mode", "IN")]),
            ],
        )
        .with_rows(
            "information_schema.routines",
            vec![
                row(&[
                    ("schemaName", "shop"),
                    ("name", "order_count"),
                    ("type", "FUNCTION"),
                    ("returnType", "int"),
                    ("deterministic", "YES"),
                    ("specificName", "order_count"),
                    ("definition", "begin\n  return (select count(*) from orders where user_id = p_user);\nend\n"),
                ]),
                row(&[
                    ("schemaName", "shop"),
                    ("name", "purge_orders"),
                    ("type", "PROCEDURE"),
                    ("deterministic", "NO"),
                    ("specificName", "purge_orders"),
                    ("definition", "begin\n  delete from orders;\nend"),
                ]),
            ],
        )
}

/// A PostgreSQL catalog with one schema, an identity key, a serial column,
/// column comments, a sequence and a function.
pub fn postgres_catalog() -> MemoryClient {
    MemoryClient::new()
        .with_scalar("current_schema()", Some("public"))
        .with_rows(
            "from pg_namespace",
            vec![row(&[("schemaName", "public")]), row(&[("schemaName", "pg_catalog")])],
        )
        .with_rows(
            "pg_description d",
            vec![
                row(&[("schemaName", "public"), ("tableName", "accounts"), ("comment", "Customer accounts")]),
                row(&[("schemaName", "public"), ("tableName", "pg_locks")]),
            ],
        )
        .with_rows(
            "information_schema.columns",
            vec![
                row_opt(&[
                    ("schemaName", Some("public")),
                    ("tableName", Some("accounts")),
                    ("columnName", Some("id")),
                    ("isNullable", Some("NO")),
                    ("dataType", Some("int8")),
                    ("size", Some("64")),
                    ("ordinalPosition", Some("1")),
                    ("is_identity", Some("YES")),
                    ("defaultValue", None),
                ]),
                row_opt(&[
                    ("schemaName", Some("public")),
                    ("tableName", Some("accounts")),
                    ("columnName", Some("balance")),
                    ("isNullable", Some("YES")),
                    ("dataType", Some("numeric")),
                    ("size", Some("12")),
                    ("decimalDigits", Some("2")),
                    ("ordinalPosition", Some("3")),
                    ("is_identity", Some("NO")),
                    ("defaultValue", Some("0")),
                ]),
                row_opt(&[
                    ("schemaName", Some("public")),
                    ("tableName", Some("accounts")),
                    ("columnName", Some("legacy_no")),
                    ("isNullable", Some("NO")),
                    ("dataType", Some("int4")),
                    ("size", Some("32")),
                    ("ordinalPosition", Some("2")),
                    ("is_identity", Some("NO")),
                    ("defaultValue", Some("nextval('accounts_legacy_no_seq'::regclass)")),
                ]),
                row_opt(&[
                    ("schemaName", Some("public")),
                    ("tableName", Some("accounts")),
                    ("columnName", Some("opened_at")),
                    ("isNullable", Some("NO")),
                    ("dataType", Some("timestamptz")),
                    ("datetime_precision", Some("6")),
                    ("ordinalPosition", Some("4")),
                    ("is_identity", Some("NO")),
                    ("defaultValue", Some("now()")),
                ]),
            ],
        )
        .with_rows(
            "col_description(a.attrelid",
            vec![row(&[
                ("schemaName", "public"),
                ("tableName", "accounts"),
                ("columnName", "balance"),
                ("columnComment", "Current balance"),
            ])],
        )
        .with_rows(
            "information_schema.table_constraints",
            vec![
                row(&[("schemaName", "public"), ("tableName", "accounts"), ("name", "accounts_pkey"), ("columnName", "id"), ("unique", "true"), ("type", "PRIMARY KEY")]),
                row(&[("schemaName", "public"), ("tableName", "accounts"), ("name", "accounts_pkey"), ("columnName", "id"), ("unique", "true"), ("type", "INDEX")]),
                row(&[("schemaName", "public"), ("tableName", "accounts"), ("name", "idx_accounts_opened"), ("columnName", "opened_at"), ("unique", "false"), ("type", "INDEX")]),
            ],
        )
        .with_rows(
            "information_schema.sequences",
            vec![row(&[
                ("schemaName", "public"),
                ("name", "invoice_no"),
                ("minValue", "1"),
                ("maxValue", "999999"),
                ("increment", "1"),
                ("cycle", "YES"),
            ])],
        )
        .with_rows(
            "from pg_proc",
            vec![row(&[
                ("schemaName", "public"),
                ("name", "touch"),
                ("type", "FUNCTION"),
                ("definition", "\nbegin\n  return now();\nend;\n"),
                ("arguments", "p_id bigint"),
                ("identityArguments", "p_id bigint"),
                ("returnType", "timestamp with time zone"),
                ("language", "plpgsql"),
                ("specificName", "16402"),
            ])],
        )
}

/// A hand-built MySQL `users` table: auto-increment integer key and a
/// nullable varchar.
pub fn mysql_users() -> Table {
    let schema = Schema::new(DbType::MySql, "shop");
    Table::new(schema.owner(), "users")
        .with_column(Column::new("id", "int").size(10).not_null().auto_increment())
        .with_column(Column::new("name", "varchar").width(64))
        .with_primary_key("PRIMARY", &["id"])
}

/// The PostgreSQL counterpart of [`mysql_users`].
pub fn postgres_users() -> Table {
    let schema = Schema::new(DbType::PostgreSql, "public");
    Table::new(schema.owner(), "users")
        .with_column(Column::new("id", "int4").size(32).not_null().auto_increment())
        .with_column(Column::new("name", "varchar").width(64))
        .with_primary_key("users_pkey", &["id"])
}
