//! Read-only queries against the Firebird system catalog.
//!
//! The catalog (`rdb$relations`, `rdb$relation_fields`, `rdb$fields`,
//! `rdb$collations`) is queried like ordinary data. The query generator and
//! search-term builder call [`table_column`]/[`column`] once per column per
//! generation run — metadata is deliberately not cached, so generation
//! self-adapts to schema changes at the cost of one round trip per column.

use asupersync::{Cx, Outcome};
use fbsql_core::{Driver, Error, FieldType, Row, Value, quote};

use crate::client::FirebirdClient;

/// Declared shape of one catalog column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    /// Declared length in characters (zero for non-character types).
    pub length: u32,
    /// Declared type.
    pub field_type: FieldType,
    /// Name of the domain the column is sourced from.
    pub source_domain: String,
    /// Collation name, `"NONE"` when the column has no explicit collation.
    pub collation: String,
}

// Column and table names are interpolated as escaped literals rather than
// bound parameters so the lookup stays a single self-contained statement.
fn lookup_sql(column: &str, table: Option<&str>) -> String {
    let mut sql = format!(
        "select first 1 \
         f.rdb$field_length as flength, \
         f.rdb$field_type as ftype, \
         trim(rf.rdb$field_source) as fsource, \
         trim(coalesce(c.rdb$collation_name, 'NONE')) as cname \
         from rdb$relation_fields rf \
         inner join rdb$fields f on rf.rdb$field_source = f.rdb$field_name \
         left join rdb$collations c on (\
         c.rdb$collation_id = f.rdb$collation_id \
         and c.rdb$character_set_id = f.rdb$character_set_id) \
         where upper(rf.rdb$field_name) = upper({})",
        quote(column)
    );
    if let Some(table) = table {
        sql.push_str(&format!(
            " and upper(rf.rdb$relation_name) = upper({})",
            quote(table)
        ));
    }
    sql
}

fn metadata_from_row(row: &Row) -> ColumnMetadata {
    let length = row
        .get("flength")
        .and_then(Value::as_i64)
        .unwrap_or(0)
        .max(0) as u32;
    let field_type = row
        .get("ftype")
        .and_then(Value::as_i64)
        .map_or(FieldType::Unknown, FieldType::from_code);
    let source_domain = row
        .get("fsource")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let collation = row
        .get("cname")
        .and_then(Value::as_str)
        .unwrap_or("NONE")
        .to_string();
    ColumnMetadata {
        length,
        field_type,
        source_domain,
        collation,
    }
}

/// Metadata of `column` in `table`, matched case-insensitively.
pub async fn table_column<D: Driver>(
    cx: &Cx,
    client: &FirebirdClient<D>,
    table: &str,
    column: &str,
) -> Outcome<Option<ColumnMetadata>, Error> {
    lookup(cx, client, &lookup_sql(column, Some(table))).await
}

/// Metadata of the first catalog column named `column`, regardless of table.
pub async fn column<D: Driver>(
    cx: &Cx,
    client: &FirebirdClient<D>,
    column: &str,
) -> Outcome<Option<ColumnMetadata>, Error> {
    lookup(cx, client, &lookup_sql(column, None)).await
}

async fn lookup<D: Driver>(
    cx: &Cx,
    client: &FirebirdClient<D>,
    sql: &str,
) -> Outcome<Option<ColumnMetadata>, Error> {
    match client.execute(cx, sql, &[]).await {
        Outcome::Ok(rows) => Outcome::Ok(rows.first().map(metadata_from_row)),
        Outcome::Err(e) => Outcome::Err(e),
        Outcome::Cancelled(r) => Outcome::Cancelled(r),
        Outcome::Panicked(p) => Outcome::Panicked(p),
    }
}

/// One field of a user relation, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationField {
    pub name: String,
    pub field_type: FieldType,
}

/// Names of all non-system tables, ordered by name.
pub async fn relations<D: Driver>(
    cx: &Cx,
    client: &FirebirdClient<D>,
) -> Outcome<Vec<String>, Error> {
    let sql = "select trim(rdb$relation_name) as rname \
               from rdb$relations \
               where rdb$system_flag = 0 \
               order by rdb$relation_name";
    match client.execute(cx, sql, &[]).await {
        Outcome::Ok(rows) => Outcome::Ok(
            rows.iter()
                .filter_map(|row| row.get("rname").and_then(Value::as_str))
                .map(str::to_string)
                .collect(),
        ),
        Outcome::Err(e) => Outcome::Err(e),
        Outcome::Cancelled(r) => Outcome::Cancelled(r),
        Outcome::Panicked(p) => Outcome::Panicked(p),
    }
}

/// Fields of one table, ordered by field position.
///
/// Combined with [`FieldType::scalar_kind`] this is the introspection
/// surface the external schema emitter consumes.
pub async fn relation_fields<D: Driver>(
    cx: &Cx,
    client: &FirebirdClient<D>,
    table: &str,
) -> Outcome<Vec<RelationField>, Error> {
    let sql = format!(
        "select trim(rf.rdb$field_name) as fname, f.rdb$field_type as ftype \
         from rdb$relation_fields rf \
         inner join rdb$fields f on f.rdb$field_name = rf.rdb$field_source \
         where rf.rdb$relation_name = {} \
         order by rf.rdb$field_position",
        quote(table)
    );
    match client.execute(cx, &sql, &[]).await {
        Outcome::Ok(rows) => Outcome::Ok(
            rows.iter()
                .map(|row| RelationField {
                    name: row
                        .get("fname")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                    field_type: row
                        .get("ftype")
                        .and_then(Value::as_i64)
                        .map_or(FieldType::Unknown, FieldType::from_code),
                })
                .collect(),
        ),
        Outcome::Err(e) => Outcome::Err(e),
        Outcome::Cancelled(r) => Outcome::Cancelled(r),
        Outcome::Panicked(p) => Outcome::Panicked(p),
    }
}
