//! Behavior every DDL-capable dialect must share: no-op diffs, quoting,
//! create-table shape, index replacement, primary-key auto-increment
//! handling and cross-dialect routine skipping.

mod common;

use oxide_catalog::dialect::{dialect_for, CatalogDialect, TableDiff};
use oxide_catalog::error::CatalogError;
use oxide_catalog::model::{Column, DbType, Procedure, Schema, Sequence};

use common::{mysql_users, postgres_users};

const DDL_DIALECTS: [DbType; 2] = [DbType::MySql, DbType::PostgreSql];

// =============================================================================
// No-op diffs
// =============================================================================

#[test]
fn test_identical_objects_produce_no_statements() {
    for (db_type, table) in [(DbType::MySql, mysql_users()), (DbType::PostgreSql, postgres_users())] {
        let dialect = dialect_for(db_type);
        let table = table.with_index("idx_name", false, &["name"]).with_comment("People");

        assert_eq!(dialect.alter_table(&table, &table).unwrap(), "", "{db_type}");
        assert!(TableDiff::new(dialect, &table, &table).is_empty());

        let schema = Schema::new(db_type, "s");
        let mut sequence = Sequence::new(schema.owner(), "seq");
        sequence.increment = Some(1);
        assert_eq!(dialect.alter_sequence(&sequence, &sequence).unwrap(), "");
    }
}

#[test]
fn test_identical_introspected_oracle_table_is_noop() {
    let dialect = dialect_for(DbType::Oracle);
    let schema = Schema::new(DbType::Oracle, "hr");
    let table = oxide_catalog::model::Table::new(schema.owner(), "emp")
        .with_column(Column::new("id", "number").size(10));
    assert_eq!(dialect.alter_table(&table, &table).unwrap(), "");
    assert_eq!(dialect.create_table(&table).unwrap(), "");
}

// =============================================================================
// Identifier formatting
// =============================================================================

#[test]
fn test_to_literal_quotes_by_dialect() {
    let mysql = dialect_for(DbType::MySql);
    let pg = dialect_for(DbType::PostgreSql);

    for dialect in [mysql, pg] {
        assert_eq!(dialect.to_literal("orders").unwrap(), "orders");
        assert_eq!(dialect.to_literal("  ORDERS ").unwrap(), "orders");
        assert!(matches!(
            dialect.to_literal(""),
            Err(CatalogError::InvalidArgument(_))
        ));
    }
    assert_eq!(mysql.to_literal("My Table").unwrap(), "`my table`");
    assert_eq!(pg.to_literal("My Table").unwrap(), "\"my table\"");
    assert_eq!(mysql.to_comment("it's"), "it''s");
}

// =============================================================================
// Create table
// =============================================================================

#[test]
fn test_create_table_shape_mysql() {
    let sql = dialect_for(DbType::MySql).create_table(&mysql_users()).unwrap();
    assert_eq!(
        sql,
        "create table users\n\
         (\n    \
         id int not null auto_increment,\n    \
         name varchar(64) null,\n    \
         primary key (id)\n\
         );"
    );
}

#[test]
fn test_create_table_shape_postgres() {
    let sql = dialect_for(DbType::PostgreSql).create_table(&postgres_users()).unwrap();
    assert_eq!(
        sql,
        "create table users\n\
         (\n    \
         id int4 generated by default as identity not null,\n    \
         name varchar(64),\n    \
         constraint users_pkey primary key (id)\n\
         );"
    );
}

#[test]
fn test_create_table_across_dialects() {
    let pg = dialect_for(DbType::PostgreSql).create_table(&mysql_users()).unwrap();
    assert_eq!(
        pg,
        "create table users\n\
         (\n    \
         id int4 generated by default as identity not null,\n    \
         name varchar(64),\n    \
         constraint users_pkey primary key (id)\n\
         );"
    );

    let mysql = dialect_for(DbType::MySql).create_table(&postgres_users()).unwrap();
    assert!(mysql.contains("    id int not null auto_increment,\n"));
    assert!(mysql.contains("    name varchar(64) null,\n"));
}

// =============================================================================
// Indexes
// =============================================================================

#[test]
fn test_alter_index_is_drop_then_create() {
    let expected = [
        (DbType::MySql, "drop index idx_name on users;"),
        (DbType::PostgreSql, "drop index if exists idx_name;"),
    ];
    for (db_type, drop) in expected {
        let dialect = dialect_for(db_type);
        let base = if db_type == DbType::MySql { mysql_users() } else { postgres_users() };
        let old = base.clone().with_index("idx_name", false, &["name"]);
        let new = base.with_index("idx_name", false, &["id", "name"]);

        let sql = dialect.alter_index(&new.indices[0], &old.indices[0]).unwrap();
        let lines: Vec<&str> = sql.lines().collect();
        assert_eq!(lines, vec![drop, "create index idx_name on users (id, name);"]);
        assert!(!sql.contains("alter index"));
    }
}

#[test]
fn test_mysql_unique_index_is_dropped_as_key() {
    let table = mysql_users().with_index("uk_name", true, &["name"]);
    let sql = dialect_for(DbType::MySql).drop_index(&table.indices[0]).unwrap();
    assert_eq!(sql, "alter table users drop key uk_name;");
}

// =============================================================================
// Primary keys and auto-increment
// =============================================================================

#[test]
fn test_drop_primary_key_demotes_auto_increment_first() {
    let expected = [
        (
            DbType::MySql,
            mysql_users(),
            vec![
                "alter table users modify column id int not null;",
                "alter table users drop primary key;",
            ],
        ),
        (
            DbType::PostgreSql,
            postgres_users(),
            vec![
                "alter table users alter column id drop identity if exists;",
                "alter table users drop constraint users_pkey;",
            ],
        ),
    ];
    for (db_type, table, statements) in expected {
        let pk = table.primary_key.as_ref().unwrap();
        let sql = dialect_for(db_type).drop_primary_key(pk).unwrap();
        assert_eq!(sql.lines().collect::<Vec<_>>(), statements, "{db_type}");
    }
}

#[test]
fn test_alter_primary_key_requires_a_side() {
    for db_type in DDL_DIALECTS {
        let err = dialect_for(db_type).alter_primary_key(None, None).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidArgument(_)));
    }
}

#[test]
fn test_rekey_orders_drop_add_create_and_promote() {
    let schema = Schema::new(DbType::PostgreSql, "public");
    let old = postgres_users();
    let new = oxide_catalog::model::Table::new(schema.owner(), "users")
        .with_column(Column::new("id", "int4").size(32).not_null().auto_increment())
        .with_column(Column::new("name", "varchar").width(64))
        .with_column(Column::new("email", "varchar").width(128).not_null())
        .with_primary_key("users_pkey", &["id", "email"]);

    let sql = dialect_for(DbType::PostgreSql).alter_table(&new, &old).unwrap();
    assert_eq!(
        sql.lines().collect::<Vec<_>>(),
        vec![
            "alter table users alter column id drop identity if exists;",
            "alter table users drop constraint users_pkey;",
            "alter table users add column email varchar(128) not null;",
            "alter table users add constraint users_pkey primary key (id, email);",
            "alter table users alter column id add generated by default as identity;",
            "select setval(pg_get_serial_sequence('users', 'id'), coalesce(max(id), 0) + 1, false) from users;",
        ]
    );
}

#[test]
fn test_rekey_promotes_with_current_column_type() {
    let schema = Schema::new(DbType::MySql, "shop");
    let old = mysql_users();
    let mut new = oxide_catalog::model::Table::new(schema.owner(), "users")
        .with_column(Column::new("id", "int").size(10).not_null().auto_increment())
        .with_column(Column::new("name", "varchar").width(64))
        .with_column(Column::new("k", "int").size(10).not_null())
        .with_primary_key("PRIMARY", &["id", "k"]);
    let id = new.column_mut("id").unwrap();
    id.data_type = "bigint".to_string();
    id.size = 19;

    let sql = dialect_for(DbType::MySql).alter_table(&new, &old).unwrap();
    assert_eq!(
        sql.lines().collect::<Vec<_>>(),
        vec![
            "alter table users modify column id int not null;",
            "alter table users drop primary key;",
            "alter table users add column k int not null;",
            "alter table users modify column id bigint not null;",
            "alter table users add primary key (id, k);",
            "alter table users modify column id bigint not null auto_increment;",
            "alter table users auto_increment = 1;",
        ]
    );
}

#[test]
fn test_dependent_index_dropped_before_column() {
    let schema = Schema::new(DbType::MySql, "shop");
    let old = mysql_users().with_index("idx_name", false, &["name"]);
    let new = oxide_catalog::model::Table::new(schema.owner(), "users")
        .with_column(Column::new("id", "int").size(10).not_null().auto_increment())
        .with_column(Column::new("email", "varchar").width(128))
        .with_primary_key("PRIMARY", &["id"])
        .with_index("uk_email", true, &["email"]);

    let sql = dialect_for(DbType::MySql).alter_table(&new, &old).unwrap();
    assert_eq!(
        sql.lines().collect::<Vec<_>>(),
        vec![
            "drop index idx_name on users;",
            "alter table users add column email varchar(128) null;",
            "alter table users drop column name;",
            "create unique index uk_email on users (email);",
        ]
    );
}

// =============================================================================
// Defaults
// =============================================================================

#[test]
fn test_text_defaults_stay_quoted() {
    let schema = Schema::new(DbType::MySql, "shop");
    let table = oxide_catalog::model::Table::new(schema.owner(), "codes")
        .with_column(Column::new("code", "varchar").width(8).default_value("007"))
        .with_column(Column::new("label", "varchar").width(32).default_value("n/a (none)"))
        .with_column(Column::new("priority", "int").size(10).default_value("7"));

    let mysql = dialect_for(DbType::MySql).create_table(&table).unwrap();
    assert!(mysql.contains("    code varchar(8) null default '007',\n"));
    assert!(mysql.contains("    label varchar(32) null default 'n/a (none)',\n"));
    assert!(mysql.contains("    priority int null default 7\n"));

    let pg = dialect_for(DbType::PostgreSql).create_table(&table).unwrap();
    assert!(pg.contains("    code varchar(8) default '007',\n"));
    assert!(pg.contains("    label varchar(32) default 'n/a (none)',\n"));
}

// =============================================================================
// Procedures
// =============================================================================

#[test]
fn test_procedure_of_other_dialect_is_skipped() {
    let mysql_schema = Schema::new(DbType::MySql, "shop");
    let mut procedure = Procedure::new(mysql_schema.owner(), "purge", false);
    procedure.definition = "create procedure purge()\nbegin end".to_string();

    let pg = dialect_for(DbType::PostgreSql);
    assert_eq!(pg.create_procedure(&procedure).unwrap(), "");
    assert_eq!(pg.drop_procedure(&procedure).unwrap(), "");

    let mysql = dialect_for(DbType::MySql);
    assert_eq!(
        mysql.create_procedure(&procedure).unwrap(),
        "create procedure purge()\nbegin end;"
    );
    assert_eq!(
        mysql.drop_procedure(&procedure).unwrap(),
        "drop procedure if exists purge;"
    );
}
