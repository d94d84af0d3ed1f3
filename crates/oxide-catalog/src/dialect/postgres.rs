//! PostgreSQL dialect.
//!
//! Catalog queries cast every selected column (`::text`, `::int4`, ...) so
//! the client always decodes a known wire type, and alias with quoted
//! identifiers to keep the camel-case keys the introspector reads.

use super::{finish_statement, join_statements, push_filters, same_text, CatalogDialect, LINE};
use crate::client::NamedParams;
use crate::error::{require_name, Result};
use crate::ignore::{IgnoreList, TableFilter};
use crate::model::{Column, DbType, Index, PrimaryKey, Procedure, Sequence, Table};
use crate::typemap::ColumnType;
use crate::value::{get_bool, get_i32, get_lower, get_string, Row};

/// PostgreSQL dialect implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

fn text_of(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

impl PostgresDialect {
    fn columns_list(&self, columns: &[Column]) -> Result<String> {
        Ok(columns
            .iter()
            .map(|c| self.to_literal(&c.name))
            .collect::<Result<Vec<_>>>()?
            .join(", "))
    }

    /// Constraint name of a primary key: the catalog's own name when the key
    /// was read from PostgreSQL, `<table>_pkey` otherwise.
    fn constraint_name(&self, pk: &PrimaryKey) -> Result<String> {
        match text_of(Some(&pk.name)) {
            Some(name) if pk.owner.db_type == DbType::PostgreSql => self.to_literal(name),
            _ => {
                let table = require_name("table", pk.table_name())?;
                self.to_literal(&format!("{}_pkey", table.to_lowercase()))
            }
        }
    }

    fn comment_value(&self, comment: Option<&str>) -> String {
        text_of(comment).map_or_else(|| "null".to_string(), |c| format!("'{}'", self.to_comment(c)))
    }

    fn column_comment(&self, column: &Column) -> Result<String> {
        Ok(format!(
            "comment on column {}.{} is {};",
            self.to_literal(column.table_name())?,
            self.to_literal(&column.name)?,
            self.comment_value(column.comment.as_deref())
        ))
    }

    fn identity(&self, column: &Column) -> Result<String> {
        let table = self.to_literal(column.table_name())?;
        let name = self.to_literal(&column.name)?;
        let mut parts = Vec::new();
        if text_of(column.default_value.as_deref()).is_some() {
            parts.push(format!("alter table {table} alter column {name} drop default;"));
        }
        parts.push(format!(
            "alter table {table} alter column {name} add generated by default as identity;"
        ));
        Ok(join_statements(parts))
    }
}

impl CatalogDialect for PostgresDialect {
    fn db_type(&self) -> DbType {
        DbType::PostgreSql
    }

    fn quote_char(&self) -> char {
        '"'
    }

    fn default_ignores(&self) -> IgnoreList {
        let mut list = IgnoreList::new();
        for schema in ["information_schema", "pg_catalog", "pg_toast", "pg_global"] {
            list.add_schema(schema);
        }
        for table in [
            "pg_stat_activity",
            "pg_tables",
            "pg_views",
            "pg_indexes",
            "pg_attribute",
            "pg_type",
            "pg_roles",
            "pg_namespace",
            "pg_constraint",
            "pg_database",
            "pg_stat_replication",
            "pg_locks",
        ] {
            list.add_table(table);
        }
        list
    }

    fn render_type(&self, ty: &ColumnType) -> String {
        let data_type = ty.data_type.as_str();
        if let Some(element) = data_type.strip_prefix('_') {
            return format!("{element}[]");
        }
        match data_type {
            "timestamp" | "timestamptz" | "time" | "timetz" if (1..=5).contains(&ty.size) => {
                format!("{data_type}({})", ty.size)
            }
            "int2" | "int4" | "int8" | "smallint" | "integer" | "bigint" | "float4" | "float8"
            | "real" | "double precision" | "smallserial" | "serial" | "bigserial" | "text"
            | "bytea" | "bool" | "boolean" | "date" | "json" | "jsonb" | "uuid" | "xml"
            | "inet" | "cidr" | "macaddr" | "money" | "oid" | "tsvector" | "interval"
            | "timestamp" | "timestamptz" | "time" | "timetz" => data_type.to_string(),
            _ => super::generic_type(ty),
        }
    }

    // =========================================================================
    // Catalog queries
    // =========================================================================

    fn current_schema_sql(&self) -> &'static str {
        "select current_schema()"
    }

    fn schemas_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> String {
        let mut sql = String::from(
            "select nspname::text as \"schemaName\" \
             from pg_namespace \
             where nspname not like 'pg_temp%' and nspname not like 'pg_toast_temp%' ",
        );
        push_filters(&mut sql, filter, params, "nspname", None);
        sql.push_str("order by nspname");
        sql
    }

    fn tables_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> String {
        let mut sql = String::from(
            "select \
                n.nspname::text     as \"schemaName\", \
                c.relname::text     as \"tableName\", \
                d.description::text as \"comment\" \
             from pg_class c \
                join pg_namespace n on n.oid = c.relnamespace \
                left join pg_description d on (d.objoid = c.oid and d.objsubid = 0) \
             where c.relkind in ('r', 'p') and not c.relispartition ",
        );
        push_filters(&mut sql, filter, params, "n.nspname", Some("c.relname"));
        sql.push_str("order by n.nspname, c.relname");
        sql
    }

    fn columns_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> String {
        let mut sql = String::from(
            "select \
                a.table_schema::text             as \"schemaName\", \
                a.table_name::text               as \"tableName\", \
                a.column_name::text              as \"columnName\", \
                a.is_nullable::text              as \"isNullable\", \
                a.udt_name::text                 as \"dataType\", \
                a.numeric_precision::int4        as \"size\", \
                a.numeric_scale::int4            as \"decimalDigits\", \
                a.character_maximum_length::int4 as \"width\", \
                a.column_default::text           as \"defaultValue\", \
                a.ordinal_position::int4         as \"ordinalPosition\", \
                a.is_identity::text              as \"is_identity\", \
                a.datetime_precision::int4       as \"datetime_precision\", \
                a.udt_schema::text               as \"udt_schema\", \
                a.data_type::text                as \"data_type\" \
             from information_schema.columns a \
                left join information_schema.views b on (a.table_catalog = b.table_catalog \
                    and a.table_schema = b.table_schema and a.table_name = b.table_name) \
             where b.table_schema is null ",
        );
        push_filters(&mut sql, filter, params, "a.table_schema", Some("a.table_name"));
        sql.push_str("order by a.table_schema, a.table_name, a.ordinal_position");
        sql
    }

    fn fill_column(&self, column: &mut Column, row: &Row) {
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
        column.auto_increment = get_bool(row, "is_identity", false)
            || get_lower(row, "defaultValue").starts_with("nextval(");
    }

    fn column_comments_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> Option<String> {
        let mut sql = String::from(
            "select \
                n.nspname::text                              as \"schemaName\", \
                c.relname::text                              as \"tableName\", \
                a.attname::text                              as \"columnName\", \
                col_description(a.attrelid, a.attnum)::text as \"columnComment\" \
             from pg_class c \
                join pg_attribute a on (c.oid = a.attrelid) \
                join pg_namespace n on (n.oid = c.relnamespace) \
             where a.attnum > 0 \
                and not a.attisdropped \
                and c.relkind in ('r', 'p') \
                and col_description(a.attrelid, a.attnum) is not null ",
        );
        push_filters(&mut sql, filter, params, "n.nspname", Some("c.relname"));
        sql.push_str("order by n.nspname, c.relname, a.attnum");
        Some(sql)
    }

    fn indices_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> String {
        let mut sql = String::from(
            "select \
                tc.table_schema::text    as \"schemaName\", \
                tc.table_name::text      as \"tableName\", \
                tc.constraint_name::text as \"name\", \
                kc.column_name::text     as \"columnName\", \
                true                     as \"unique\", \
                tc.constraint_type::text as \"type\", \
                kc.ordinal_position::int4 as \"position\" \
             from information_schema.table_constraints tc \
                join information_schema.key_column_usage kc on (kc.constraint_schema = tc.constraint_schema \
                    and kc.constraint_name = tc.constraint_name and kc.table_name = tc.table_name) \
             where tc.constraint_type = 'PRIMARY KEY' ",
        );
        push_filters(&mut sql, filter, params, "tc.table_schema", Some("tc.table_name"));
        sql.push_str(
            "union all \
             select \
                n.nspname::text, \
                t.relname::text, \
                i.relname::text, \
                a.attname::text, \
                x.indisunique, \
                'INDEX'::text, \
                array_position(x.indkey::int2[], a.attnum)::int4 \
             from pg_index x \
                join pg_class i on i.oid = x.indexrelid \
                join pg_class t on t.oid = x.indrelid \
                join pg_attribute a on (a.attrelid = t.oid and a.attnum = any(x.indkey)) \
                join pg_namespace n on n.oid = t.relnamespace \
             where t.relkind in ('r', 'p') ",
        );
        push_filters(&mut sql, filter, params, "n.nspname", Some("t.relname"));
        sql.push_str("order by \"schemaName\", \"tableName\", \"name\", \"position\"");
        sql
    }

    fn sequences_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> Option<String> {
        let mut sql = String::from(
            "select \
                sequence_schema::text as \"schemaName\", \
                sequence_name::text   as \"name\", \
                minimum_value::int8   as \"minValue\", \
                maximum_value::int8   as \"maxValue\", \
                increment::int8       as \"increment\", \
                cycle_option::text    as \"cycle\" \
             from information_schema.sequences \
             where 1=1 ",
        );
        push_filters(&mut sql, filter, params, "sequence_schema", None);
        sql.push_str("order by sequence_schema, sequence_name");
        Some(sql)
    }

    fn routines_sql(&self, filter: &TableFilter, params: &mut NamedParams) -> String {
        let mut sql = String::from(
            "select \
                n.nspname::text                                    as \"schemaName\", \
                p.proname::text                                    as \"name\", \
                case p.prokind when 'p' then 'PROCEDURE' else 'FUNCTION' end as \"type\", \
                p.prosrc::text                                     as \"definition\", \
                pg_get_function_arguments(p.oid)::text             as \"arguments\", \
                pg_get_function_identity_arguments(p.oid)::text    as \"identityArguments\", \
                pg_get_function_result(p.oid)::text                as \"returnType\", \
                l.lanname::text                                    as \"language\", \
                p.oid::text                                        as \"specificName\" \
             from pg_proc p \
                join pg_namespace n on n.oid = p.pronamespace \
                join pg_language l on l.oid = p.prolang \
             where p.prokind in ('f', 'p') ",
        );
        push_filters(&mut sql, filter, params, "n.nspname", None);
        sql.push_str("order by n.nspname, p.proname, p.oid");
        sql
    }

    fn routine_definition(&self, head: &Row, body: &str, _arguments: &[Row]) -> String {
        let name = get_lower(head, "name");
        let arguments = get_string(head, "arguments").unwrap_or_default();
        let language = get_lower(head, "language");
        let body = body.trim_matches(|c| c == '\n' || c == '\r');
        let tag = if body.contains("$$") { "$body$" } else { "$$" };
        let header = if get_lower(head, "type") == "procedure" {
            format!("create or replace procedure {name}({arguments})")
        } else {
            let returns = get_string(head, "returnType").unwrap_or_default();
            format!("create or replace function {name}({arguments}){LINE}    returns {returns}")
        };
        finish_statement(&format!(
            "{header}{LINE}    language {language}{LINE}as{LINE}{tag}{LINE}{body}{LINE}{tag}"
        ))
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
        let pk = table.primary_key.as_ref().filter(|pk| !pk.columns.is_empty());
        if let Some(pk) = pk {
            lines.push(format!(
                "    constraint {} primary key ({})",
                self.constraint_name(pk)?,
                self.columns_list(&pk.columns)?
            ));
        }
        let mut parts = vec![format!(
            "create table {name}{LINE}({LINE}{}{LINE});",
            lines.join(&format!(",{LINE}"))
        )];
        if text_of(table.comment.as_deref()).is_some() {
            parts.push(self.alter_table_comment(table)?);
        }
        for column in &table.columns {
            if text_of(column.comment.as_deref()).is_some() {
                parts.push(self.column_comment(column)?);
            }
        }
        let key_name = table.primary_key.as_ref().map(|pk| pk.name.to_lowercase());
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
            "comment on table {} is {};",
            self.to_literal(&table.name)?,
            self.comment_value(table.comment.as_deref())
        ))
    }

    fn column_definition(&self, column: &Column) -> Result<String> {
        let mut def = format!("{} {}", self.to_literal(&column.name)?, self.column_type(column));
        if column.auto_increment {
            def.push_str(" generated by default as identity");
        }
        if let Some(default) = self.default_value(column) {
            def.push_str(&format!(" default {default}"));
        }
        if column.not_null {
            def.push_str(" not null");
        }
        Ok(def)
    }

    fn create_column(&self, column: &Column) -> Result<String> {
        let mut parts = vec![format!(
            "alter table {} add column {};",
            self.to_literal(column.table_name())?,
            self.column_definition(column)?
        )];
        if text_of(column.comment.as_deref()).is_some() {
            parts.push(self.column_comment(column)?);
        }
        Ok(join_statements(parts))
    }

    fn alter_column(&self, new: &Column, old: &Column) -> Result<String> {
        let table = self.to_literal(new.table_name())?;
        let old_name = self.to_literal(&old.name)?;
        let name = self.to_literal(&new.name)?;
        let mut parts = Vec::new();

        if old.auto_increment && !new.auto_increment {
            parts.push(format!("alter table {table} alter column {old_name} drop identity if exists;"));
        }
        if name != old_name {
            parts.push(format!("alter table {table} rename column {old_name} to {name};"));
        }
        let data_type = self.column_type(new);
        if data_type != self.column_type(old) {
            parts.push(format!(
                "alter table {table} alter column {name} type {data_type} using {name}::{data_type};"
            ));
        }
        let default = self.default_value(new);
        if default != self.default_value(old) {
            parts.push(match default {
                Some(value) => format!("alter table {table} alter column {name} set default {value};"),
                None => format!("alter table {table} alter column {name} drop default;"),
            });
        }
        if new.not_null != old.not_null {
            let action = if new.not_null { "set" } else { "drop" };
            parts.push(format!("alter table {table} alter column {name} {action} not null;"));
        }
        if !same_text(new.comment.as_deref(), old.comment.as_deref()) {
            parts.push(self.column_comment(new)?);
        }
        if new.auto_increment && !old.auto_increment {
            parts.push(format!(
                "alter table {table} alter column {name} add generated by default as identity;"
            ));
        }
        Ok(join_statements(parts))
    }

    fn drop_column(&self, column: &Column) -> Result<String> {
        Ok(format!(
            "alter table {} drop column {};",
            self.to_literal(column.table_name())?,
            self.to_literal(&column.name)?
        ))
    }

    fn set_auto_increment(&self, column: &Column, enabled: bool) -> Result<String> {
        if enabled {
            return self.identity(column);
        }
        Ok(format!(
            "alter table {} alter column {} drop identity if exists;",
            self.to_literal(column.table_name())?,
            self.to_literal(&column.name)?
        ))
    }

    fn reset_auto_increment(&self, column: &Column) -> Result<String> {
        let table = self.to_literal(column.table_name())?;
        let name = self.to_literal(&column.name)?;
        // The column argument is taken literally, not parsed as an identifier.
        let raw = self.to_comment(&require_name("column", &column.name)?.to_lowercase());
        Ok(format!(
            "select setval(pg_get_serial_sequence('{}', '{raw}'), coalesce(max({name}), 0) + 1, false) from {table};",
            self.to_comment(&table)
        ))
    }

    fn add_primary_key(&self, pk: &PrimaryKey) -> Result<String> {
        Ok(format!(
            "alter table {} add constraint {} primary key ({});",
            self.to_literal(pk.table_name())?,
            self.constraint_name(pk)?,
            self.columns_list(&pk.columns)?
        ))
    }

    fn remove_primary_key(&self, pk: &PrimaryKey) -> Result<String> {
        Ok(format!(
            "alter table {} drop constraint {};",
            self.to_literal(pk.table_name())?,
            self.constraint_name(pk)?
        ))
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
        Ok(format!("drop index if exists {};", self.to_literal(&index.name)?))
    }

    fn create_sequence(&self, sequence: &Sequence) -> Result<String> {
        let mut sql = format!("create sequence {}", self.to_literal(&sequence.name)?);
        if let Some(increment) = sequence.increment {
            sql.push_str(&format!(" increment by {increment}"));
        }
        if let Some(min) = sequence.min_value {
            sql.push_str(&format!(" minvalue {min}"));
        }
        if let Some(max) = sequence.max_value {
            sql.push_str(&format!(" maxvalue {max}"));
        }
        if sequence.cycle {
            sql.push_str(" cycle");
        }
        sql.push(';');
        Ok(sql)
    }

    fn alter_sequence(&self, new: &Sequence, old: &Sequence) -> Result<String> {
        let name = self.to_literal(&new.name)?;
        let old_name = self.to_literal(&old.name)?;
        let mut parts = Vec::new();
        if name != old_name {
            parts.push(format!("alter sequence {old_name} rename to {name};"));
        }
        let mut changes = String::new();
        if new.increment != old.increment {
            changes.push_str(&format!(" increment by {}", new.increment.unwrap_or(1)));
        }
        if new.min_value != old.min_value {
            changes.push_str(&new.min_value.map_or_else(|| " no minvalue".to_string(), |v| format!(" minvalue {v}")));
        }
        if new.max_value != old.max_value {
            changes.push_str(&new.max_value.map_or_else(|| " no maxvalue".to_string(), |v| format!(" maxvalue {v}")));
        }
        if new.cycle != old.cycle {
            changes.push_str(if new.cycle { " cycle" } else { " no cycle" });
        }
        if !changes.is_empty() {
            parts.push(format!("alter sequence {name}{changes};"));
        }
        Ok(join_statements(parts))
    }

    fn drop_sequence(&self, sequence: &Sequence) -> Result<String> {
        Ok(format!("drop sequence {};", self.to_literal(&sequence.name)?))
    }

    fn drop_routine(&self, procedure: &Procedure) -> Result<String> {
        let name = self.to_literal(&procedure.name)?;
        let kind = if procedure.function { "function" } else { "procedure" };
        let arguments = get_string(&procedure.attributes, "identityArguments").unwrap_or_default();
        Ok(format!("drop {kind} {name}({arguments});"))
    }
}
