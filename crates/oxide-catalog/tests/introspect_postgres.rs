//! PostgreSQL catalog introspection through the facade, against canned
//! catalog rows.

mod common;

use oxide_catalog::client::MemoryClient;
use oxide_catalog::dialect::CatalogDialect;
use oxide_catalog::meta::CatalogMeta;
use oxide_catalog::model::DbType;

use common::postgres_catalog;

fn meta() -> CatalogMeta<MemoryClient> {
    CatalogMeta::new(postgres_catalog(), DbType::PostgreSql)
}

#[tokio::test]
async fn test_system_schemas_and_tables_are_ignored() {
    let schemas = meta().get_all_schemas().await.unwrap();
    assert_eq!(schemas.len(), 1);
    assert_eq!(schemas[0].name, "public");
    let tables: Vec<_> = schemas[0].tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tables, vec!["accounts"]);
}

#[tokio::test]
async fn test_not_null_reads_is_nullable_inverted() {
    let table = meta().get_table("public", "accounts").await.unwrap().unwrap();

    assert!(table.column("id").unwrap().not_null);
    assert!(!table.column("balance").unwrap().not_null);
    assert!(table.column("opened_at").unwrap().not_null);
}

#[tokio::test]
async fn test_identity_serial_and_comments() {
    let table = meta().get_table("public", "accounts").await.unwrap().unwrap();

    let columns: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(columns, vec!["id", "legacy_no", "balance", "opened_at"]);

    assert!(table.column("id").unwrap().auto_increment);
    assert!(table.column("legacy_no").unwrap().auto_increment);
    assert!(!table.column("balance").unwrap().auto_increment);

    assert_eq!(table.comment.as_deref(), Some("Customer accounts"));
    assert_eq!(
        table.column("balance").unwrap().comment.as_deref(),
        Some("Current balance")
    );
    assert_eq!(table.column("opened_at").unwrap().size, 6);
}

#[tokio::test]
async fn test_primary_key_and_indexes() {
    let table = meta().get_table("public", "accounts").await.unwrap().unwrap();

    let pk = table.primary_key.as_ref().unwrap();
    assert_eq!(pk.name, "accounts_pkey");
    assert_eq!(pk.column_names(), vec!["id"]);

    // The key's backing index is reported twice but recorded once.
    let key_index = table.index("accounts_pkey").unwrap();
    assert_eq!(key_index.columns.len(), 1);
    assert!(key_index.unique);

    let opened = table.index("idx_accounts_opened").unwrap();
    assert!(!opened.unique);
    assert!(table.column("opened_at").unwrap().part_of_index);
}

#[tokio::test]
async fn test_sequences_and_routines() {
    let schema = meta().get_schema("public").await.unwrap().unwrap();

    let sequence = schema.sequence("invoice_no").unwrap();
    assert_eq!(sequence.min_value, Some(1));
    assert_eq!(sequence.max_value, Some(999_999));
    assert_eq!(sequence.increment, Some(1));
    assert!(sequence.cycle);

    let touch = schema.procedure("touch").unwrap();
    assert!(touch.function);
    assert_eq!(
        touch.definition,
        "create or replace function touch(p_id bigint)\n    returns timestamp with time zone\n    language plpgsql\nas\n$$\nbegin\n  return now();\nend;\n$$;"
    );
}

#[tokio::test]
async fn test_introspected_table_recreates_itself() {
    let meta = meta();
    let table = meta.get_table("public", "accounts").await.unwrap().unwrap();
    let sql = meta.dialect().create_table(&table).unwrap();

    assert_eq!(
        sql,
        "create table accounts\n\
         (\n    \
         id int8 generated by default as identity not null,\n    \
         legacy_no int4 generated by default as identity not null,\n    \
         balance numeric(12, 2) default 0,\n    \
         opened_at timestamptz default now() not null,\n    \
         constraint accounts_pkey primary key (id)\n\
         );\n\
         comment on table accounts is 'Customer accounts';\n\
         comment on column accounts.balance is 'Current balance';\n\
         create index idx_accounts_opened on accounts (opened_at);"
    );
    assert_eq!(meta.dialect().alter_table(&table, &table).unwrap(), "");
}
