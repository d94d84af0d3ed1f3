//! Oracle dialect: catalog introspection only. Every DDL operation keeps the
//! trait default and yields an empty string.

use super::{finish_statement, push_filters, CatalogDialect};
use crate::client::NamedParams;
use crate::ignore::{IgnoreList, TableFilter};
use crate::model::{Column, DbType};
use crate::value::{get_bool, get_i32, get_lower, get_string, Row};

/// Oracle dialect implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDialect;

const SYSTEM_SCHEMAS: &[&str] = &[
    "system",
    "sys",
    "outln",
    "dip",
    "oracle_ocm",
    "dbsnmp",
    "appqossys",
    "wmsys",
    "exfsys",
    "ctxsys",
    "anonymous",
    "xdb",
    "xs$null",
    "mdsys",
    "si_informtn_schema",
    "ordplugins",
    "orddata",
    "ordsys",
    "olapsys",
    "mddata",
    "spatial_wfs_admin_usr",
    "spatial_csw_admin_usr",
    "sysman",
    "mgmt_view",
    "apex_030200",
    "apex_public_user",
    "flows_files",
    "owbsys",
    "owbsys_audit",
    "scott",
];

impl CatalogDialect for OracleDialect {
    fn db_type(&self) -> DbType {
        DbType::Oracle
    }

    fn quote_char(&self) -> char {
        '"'
    }

    fn default_ignores(&self) -> IgnoreList {
        let mut list = IgnoreList::new();
        for schema in SYSTEM_SCHEMAS {
            list.add_schema(schema);
        }
        list
    }

    fn current_schema_sql(&self) -> &'static str {
        "select sys_context('userenv', 'current_schema') from dual"
    }

    fn schemas_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> String {
        let mut sql = String::from("select username as \"schemaName\" from sys.all_users where 1=1 ");
        push_filters(&mut sql, filter, params, "username", None);
        sql.push_str("order by username");
        sql
    }

    fn tables_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> String {
        let mut sql = String::from(
            "select \
                a.owner      as \"schemaName\", \
                a.table_name as \"tableName\", \
                b.comments   as \"comment\" \
             from sys.all_tables a \
                left join sys.all_tab_comments b on (a.owner = b.owner and a.table_name = b.table_name) \
             where a.iot_type is null ",
        );
        push_filters(&mut sql, filter, params, "a.owner", Some("a.table_name"));
        sql.push_str("order by a.owner, a.table_name");
        sql
    }

    fn columns_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> String {
        let mut sql = String::from(
            "select \
                a.owner          as \"schemaName\", \
                a.table_name     as \"tableName\", \
                a.column_name    as \"columnName\", \
                b.comments       as \"columnComment\", \
                a.nullable       as \"isNullable\", \
                a.data_type      as \"dataType\", \
                a.data_precision as \"size\", \
                a.data_scale     as \"decimalDigits\", \
                a.data_length    as \"width\", \
                a.data_default   as \"defaultValue\", \
                a.column_id      as \"ordinalPosition\", \
                a.char_length    as \"char_length\", \
                a.character_set_name as \"character_set_name\" \
             from sys.all_tab_columns a \
                left join sys.all_col_comments b on (a.owner = b.owner \
                    and a.table_name = b.table_name and a.column_name = b.column_name) \
             where 1=1 ",
        );
        push_filters(&mut sql, filter, params, "a.owner", Some("a.table_name"));
        sql.push_str("order by a.owner, a.table_name, a.column_id");
        sql
    }

    fn fill_column(&self, column: &mut Column, row: &Row) {
        column.comment = get_string(row, "columnComment").filter(|c| !c.trim().is_empty());
        column.not_null = !get_bool(row, "isNullable", true);
        column.data_type = get_lower(row, "dataType");
        column.size = get_i32(row, "size", 0);
        column.decimal_digits = get_i32(row, "decimalDigits", 0);
        column.width = get_i32(row, "width", 0);
        column.default_value = get_string(row, "defaultValue").map(|d| d.trim().to_string());
        column.ordinal_position = get_i32(row, "ordinalPosition", 0);
        column.auto_increment = false;
    }

    fn indices_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> String {
        let mut sql = String::from(
            "select \
                a.owner           as \"schemaName\", \
                a.table_name      as \"tableName\", \
                a.constraint_name as \"name\", \
                b.column_name     as \"columnName\", \
                'true'            as \"unique\", \
                a.constraint_type as \"type\", \
                b.position        as \"position\" \
             from sys.all_constraints a \
                left join sys.all_cons_columns b on (a.owner = b.owner \
                    and a.table_name = b.table_name and a.constraint_name = b.constraint_name) \
             where a.constraint_type in ('P') ",
        );
        push_filters(&mut sql, filter, params, "a.owner", Some("a.table_name"));
        sql.push_str(
            "union \
             select \
                a.owner           as \"schemaName\", \
                a.table_name      as \"tableName\", \
                a.index_name      as \"name\", \
                b.column_name     as \"columnName\", \
                decode(a.uniqueness, 'UNIQUE', 'true', 'false') as \"unique\", \
                a.index_type      as \"type\", \
                b.column_position as \"position\" \
             from sys.all_indexes a \
                left join sys.all_ind_columns b on (a.table_owner = b.table_owner \
                    and a.index_name = b.index_name and a.table_name = b.table_name) \
             where 1=1 ",
        );
        push_filters(&mut sql, filter, params, "a.owner", Some("a.table_name"));
        sql.push_str("order by \"schemaName\", \"tableName\", \"name\", \"position\"");
        sql
    }

    fn sequences_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> Option<String> {
        let mut sql = String::from(
            "select \
                sequence_owner as \"schemaName\", \
                sequence_name  as \"name\", \
                min_value      as \"minValue\", \
                max_value      as \"maxValue\", \
                increment_by   as \"increment\", \
                cycle_flag     as \"cycle\", \
                order_flag     as \"order_flag\", \
                cache_size     as \"cache_size\", \
                last_number    as \"last_number\" \
             from sys.all_sequences \
             where 1=1 ",
        );
        push_filters(&mut sql, filter, params, "sequence_owner", None);
        sql.push_str("order by sequence_owner, sequence_name");
        Some(sql)
    }

    fn routines_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> String {
        let mut sql = String::from(
            "select \
                owner as \"schemaName\", \
                name  as \"name\", \
                type  as \"type\", \
                text  as \"definition\", \
                line  as \"line\" \
             from sys.all_source \
             where type in ('FUNCTION', 'PROCEDURE') ",
        );
        push_filters(&mut sql, filter, params, "owner", None);
        sql.push_str("order by owner, type, name, line");
        sql
    }

    fn routine_definition(&self, _head: &Row, body: &str, _arguments: &[Row]) -> String {
        finish_statement(&format!("create or replace {}", body.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Schema, Table};

    #[test]
    fn test_ddl_is_unsupported() {
        let schema = Schema::new(DbType::Oracle, "hr");
        let table = Table::new(schema.owner(), "employees")
            .with_column(Column::new("id", "number").size(10).not_null())
            .with_primary_key("pk_employees", &["id"]);

        assert_eq!(OracleDialect.create_table(&table).unwrap(), "");
        assert_eq!(OracleDialect.drop_table(&table).unwrap(), "");
        assert_eq!(OracleDialect.alter_table(&table, &table).unwrap(), "");
        assert_eq!(
            OracleDialect
                .drop_primary_key(table.primary_key.as_ref().unwrap())
                .unwrap(),
            ""
        );
        assert_eq!(OracleDialect.rebuild_table(&table).unwrap(), "");
    }

    #[test]
    fn test_default_ignores() {
        let ignores = OracleDialect.default_ignores().schemas();
        assert!(ignores.contains("sys"));
        assert!(ignores.contains("xs$null"));
        assert_eq!(ignores.len(), SYSTEM_SCHEMAS.len());
    }

    #[test]
    fn test_fill_column() {
        let mut row = Row::new();
        row.insert("isNullable".into(), "N".into());
        row.insert("dataType".into(), "VARCHAR2".into());
        row.insert("width".into(), 100.into());
        row.insert("defaultValue".into(), "'x' \n".into());

        let mut column = Column::new("code", "");
        OracleDialect.fill_column(&mut column, &row);
        assert!(column.not_null);
        assert_eq!(column.data_type, "varchar2");
        assert_eq!(column.width, 100);
        assert_eq!(column.default_value.as_deref(), Some("'x'"));
    }

    #[test]
    fn test_routine_definition_joins_source_lines() {
        let body = "PROCEDURE touch AS\nBEGIN\n  NULL;\nEND;\n";
        assert_eq!(
            OracleDialect.routine_definition(&Row::new(), body, &[]),
            "create or replace PROCEDURE touch AS\nBEGIN\n  NULL;\nEND;"
        );
    }
}
