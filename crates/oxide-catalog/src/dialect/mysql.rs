//! MySQL dialect.

use super::{finish_statement, join_statements, push_filters, CatalogDialect, IndexEntry, LINE};
use crate::client::NamedParams;
use crate::error::{require_name, Result};
use crate::ignore::{IgnoreList, TableFilter};
use crate::model::{Column, DbType, Index, PrimaryKey, Procedure, Table};
use crate::typemap::ColumnType;
use crate::value::{get_bool, get_i32, get_lower, get_string, Row};

/// MySQL dialect implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    fn columns_list(&self, columns: &[Column]) -> Result<String> {
        Ok(columns
            .iter()
            .map(|c| self.to_literal(&c.name))
            .collect::<Result<Vec<_>>>()?
            .join(", "))
    }

    fn modify_column(&self, column: &Column) -> Result<String> {
        Ok(format!(
            "alter table {} modify column {};",
            self.to_literal(column.table_name())?,
            self.column_definition(column)?
        ))
    }
}

fn comment_of(comment: Option<&str>) -> Option<&str> {
    comment.map(str::trim).filter(|c| !c.is_empty())
}

impl CatalogDialect for MySqlDialect {
    fn db_type(&self) -> DbType {
        DbType::MySql
    }

    fn quote_char(&self) -> char {
        '`'
    }

    fn default_ignores(&self) -> IgnoreList {
        let mut list = IgnoreList::new();
        for schema in ["information_schema", "mysql", "performance_schema", "sys"] {
            list.add_schema(schema);
        }
        list
    }

    fn render_type(&self, ty: &ColumnType) -> String {
        let data_type = ty.data_type.as_str();
        match data_type {
            "datetime" | "timestamp" | "time" if (1..=6).contains(&ty.size) => {
                format!("{data_type}({})", ty.size)
            }
            "varchar" if ty.width <= 0 => "varchar(255)".to_string(),
            "smallint" | "mediumint" | "int" | "integer" | "bigint" | "float" | "double"
            | "date" | "year" | "json" | "tinytext" | "text" | "mediumtext" | "longtext"
            | "tinyblob" | "blob" | "mediumblob" | "longblob" | "datetime" | "timestamp"
            | "time" => data_type.to_string(),
            _ => super::generic_type(ty),
        }
    }

    // =========================================================================
    // Catalog queries
    // =========================================================================

    fn current_schema_sql(&self) -> &'static str {
        "select database() from dual"
    }

    fn schemas_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> String {
        let mut sql = String::from(
            "select schema_name as `schemaName` from information_schema.schemata where 1=1 ",
        );
        push_filters(&mut sql, filter, params, "schema_name", None);
        sql.push_str("order by schema_name");
        sql
    }

    fn tables_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> String {
        let mut sql = String::from(
            "select \
                table_schema  as `schemaName`, \
                table_name    as `tableName`, \
                table_comment as `comment` \
             from information_schema.tables \
             where table_type = 'BASE TABLE' ",
        );
        push_filters(&mut sql, filter, params, "table_schema", Some("table_name"));
        sql.push_str("order by table_schema, table_name");
        sql
    }

    fn columns_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> String {
        let mut sql = String::from(
            "select \
                table_schema             as `schemaName`, \
                table_name               as `tableName`, \
                column_name              as `columnName`, \
                column_comment           as `columnComment`, \
                column_key               as `columnKey`, \
                is_nullable              as `isNullable`, \
                data_type                as `dataType`, \
                numeric_precision        as `size`, \
                numeric_scale            as `decimalDigits`, \
                character_maximum_length as `width`, \
                column_default           as `defaultValue`, \
                ordinal_position         as `ordinalPosition`, \
                column_type              as `column_type`, \
                datetime_precision       as `datetime_precision`, \
                extra                    as `extra` \
             from information_schema.columns \
             where 1=1 ",
        );
        push_filters(&mut sql, filter, params, "table_schema", Some("table_name"));
        sql.push_str("order by table_schema, table_name, ordinal_position");
        sql
    }

    fn fill_column(&self, column: &mut Column, row: &Row) {
        column.comment = get_string(row, "columnComment").filter(|c| !c.trim().is_empty());
        match get_lower(row, "columnKey").as_str() {
            "pri" => {
                column.part_of_primary_key = true;
                column.part_of_index = true;
                column.part_of_unique_index = true;
            }
            "uni" => {
                column.part_of_index = true;
                column.part_of_unique_index = true;
            }
            "mul" => column.part_of_index = true,
            _ => {}
        }
        column.auto_increment = get_lower(row, "extra").contains("auto_increment");
        column.not_null = !get_bool(row, "isNullable", true);
        column.data_type = get_lower(row, "dataType");
        column.size = get_i32(row, "size", 0);
        if column.size == 0 {
            column.size = get_i32(row, "datetime_precision", 0);
        }
        column.decimal_digits = get_i32(row, "decimalDigits", 0);
        column.width = get_i32(row, "width", 0);
        column.default_value = get_string(row, "defaultValue");
        column.ordinal_position = get_i32(row, "ordinalPosition", 0);
    }

    fn indices_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> String {
        let mut sql = String::from(
            "select \
                table_schema as `schemaName`, \
                table_name   as `tableName`, \
                index_name   as `name`, \
                seq_in_index as `order`, \
                column_name  as `columnName`, \
                non_unique   as `nonUnique`, \
                index_type   as `index_type` \
             from information_schema.statistics \
             where 1=1 ",
        );
        push_filters(&mut sql, filter, params, "table_schema", Some("table_name"));
        sql.push_str("order by table_schema, table_name, index_name, seq_in_index, column_name");
        sql
    }

    fn index_entry(&self, row: &Row) -> IndexEntry {
        let name = get_lower(row, "name");
        IndexEntry {
            schema: get_lower(row, "schemaName"),
            table: get_lower(row, "tableName"),
            column: get_lower(row, "columnName"),
            unique: !get_bool(row, "nonUnique", false),
            primary: name == "primary",
            name,
        }
    }

    fn routines_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> String {
        let mut sql = String::from(
            "select \
                routine_schema     as `schemaName`, \
                routine_name       as `name`, \
                routine_type       as `type`, \
                routine_definition as `definition`, \
                dtd_identifier     as `returnType`, \
                is_deterministic   as `deterministic`, \
                sql_data_access    as `dataAccess`, \
                routine_comment    as `comment`, \
                specific_name      as `specificName` \
             from information_schema.routines \
             where lower(routine_type) in ('procedure', 'function') ",
        );
        push_filters(&mut sql, filter, params, "routine_schema", None);
        sql.push_str("order by routine_schema, routine_type, routine_name");
        sql
    }

    fn routine_arguments_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> Option<String> {
        let mut sql = String::from(
            "select \
                specific_schema  as `schemaName`, \
                specific_name    as `specificName`, \
                ordinal_position as `position`, \
                parameter_mode   as `mode`, \
                parameter_name   as `name`, \
                dtd_identifier   as `dataType` \
             from information_schema.parameters \
             where ordinal_position > 0 ",
        );
        push_filters(&mut sql, filter, params, "specific_schema", None);
        sql.push_str("order by specific_schema, specific_name, ordinal_position");
        Some(sql)
    }

    fn routine_definition(&self, head: &Row, body: &str, arguments: &[Row]) -> String {
        let name = get_lower(head, "name");
        let function = get_lower(head, "type") == "function";
        let arguments = arguments
            .iter()
            .map(|arg| {
                let name = get_string(arg, "name").unwrap_or_default();
                let data_type = get_lower(arg, "dataType");
                if function {
                    format!("{name} {data_type}")
                } else {
                    format!("{} {name} {data_type}", get_lower(arg, "mode"))
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        let body = body.trim();
        if function {
            let returns = get_lower(head, "returnType");
            let deterministic = if get_bool(head, "deterministic", false) {
                format!("deterministic{LINE}")
            } else {
                String::new()
            };
            finish_statement(&format!(
                "create function {name}({arguments}) returns {returns}{LINE}{deterministic}{body}"
            ))
        } else {
            finish_statement(&format!("create procedure {name}({arguments}){LINE}{body}"))
        }
    }

    // =========================================================================
    // DDL
    // =========================================================================

    fn create_table(&self, table: &Table) -> Result<String> {
        let name = self.to_literal(&table.name)?;
        let mut lines = table
            .columns
            .iter()
            .map(|c| self.column_definition(c).map(|def| format!("    {def}")))
            .collect::<Result<Vec<_>>>()?;
        if let Some(pk) = table.primary_key.as_ref().filter(|pk| !pk.columns.is_empty()) {
            lines.push(format!("    primary key ({})", self.columns_list(&pk.columns)?));
        }
        let mut sql = format!("create table {name}{LINE}({LINE}{}{LINE})", lines.join(&format!(",{LINE}")));
        if let Some(comment) = comment_of(table.comment.as_deref()) {
            sql.push_str(&format!(" comment '{}'", self.to_comment(comment)));
        }
        sql.push(';');

        let key_name = table.primary_key.as_ref().map(|pk| pk.name.to_lowercase());
        let mut parts = vec![sql];
        for index in &table.indices {
            if Some(index.name.to_lowercase()) != key_name {
                parts.push(self.create_index(index)?);
            }
        }
        Ok(join_statements(parts))
    }

    fn drop_table(&self, table: &Table) -> Result<String> {
        Ok(format!("drop table {};", self.to_literal(&table.name)?))
    }

    fn rename_table(&self, old_name: &str, new_name: &str) -> Result<String> {
        Ok(format!(
            "alter table {} rename to {};",
            self.to_literal(old_name)?,
            self.to_literal(new_name)?
        ))
    }

    fn alter_table_comment(&self, table: &Table) -> Result<String> {
        Ok(format!(
            "alter table {} comment '{}';",
            self.to_literal(&table.name)?,
            self.to_comment(table.comment.as_deref().unwrap_or_default())
        ))
    }

    fn column_definition(&self, column: &Column) -> Result<String> {
        let mut def = format!("{} {}", self.to_literal(&column.name)?, self.column_type(column));
        def.push_str(if column.not_null { " not null" } else { " null" });
        if let Some(default) = self.default_value(column) {
            def.push_str(&format!(" default {default}"));
        }
        if column.auto_increment {
            def.push_str(" auto_increment");
        }
        if let Some(comment) = comment_of(column.comment.as_deref()) {
            def.push_str(&format!(" comment '{}'", self.to_comment(comment)));
        }
        Ok(def)
    }

    fn create_column(&self, column: &Column) -> Result<String> {
        Ok(format!(
            "alter table {} add column {};",
            self.to_literal(column.table_name())?,
            self.column_definition(column)?
        ))
    }

    fn alter_column(&self, new: &Column, old: &Column) -> Result<String> {
        if self.to_literal(&new.name)? == self.to_literal(&old.name)? {
            return self.modify_column(new);
        }
        Ok(format!(
            "alter table {} change column {} {};",
            self.to_literal(new.table_name())?,
            self.to_literal(&old.name)?,
            self.column_definition(new)?
        ))
    }

    fn drop_column(&self, column: &Column) -> Result<String> {
        Ok(format!(
            "alter table {} drop column {};",
            self.to_literal(column.table_name())?,
            self.to_literal(&column.name)?
        ))
    }

    fn set_auto_increment(&self, column: &Column, enabled: bool) -> Result<String> {
        let mut column = column.clone();
        column.auto_increment = enabled;
        self.modify_column(&column)
    }

    fn reset_auto_increment(&self, column: &Column) -> Result<String> {
        Ok(format!(
            "alter table {} auto_increment = 1;",
            self.to_literal(column.table_name())?
        ))
    }

    fn add_primary_key(&self, pk: &PrimaryKey) -> Result<String> {
        Ok(format!(
            "alter table {} add primary key ({});",
            self.to_literal(pk.table_name())?,
            self.columns_list(&pk.columns)?
        ))
    }

    fn remove_primary_key(&self, pk: &PrimaryKey) -> Result<String> {
        Ok(format!("alter table {} drop primary key;", self.to_literal(pk.table_name())?))
    }

    fn create_index(&self, index: &Index) -> Result<String> {
        Ok(format!(
            "create {}index {} on {} ({});",
            if index.unique { "unique " } else { "" },
            self.to_literal(&index.name)?,
            self.to_literal(index.table_name())?,
            self.columns_list(&index.columns)?
        ))
    }

    fn drop_index(&self, index: &Index) -> Result<String> {
        let name = self.to_literal(&index.name)?;
        let table = self.to_literal(index.table_name())?;
        if index.unique {
            Ok(format!("alter table {table} drop key {name};"))
        } else {
            Ok(format!("drop index {name} on {table};"))
        }
    }

    fn drop_routine(&self, procedure: &Procedure) -> Result<String> {
        let name = self.to_literal(require_name("procedure", &procedure.name)?)?;
        let kind = if procedure.function { "function" } else { "procedure" };
        Ok(format!("drop {kind} if exists {name};"))
    }
}
