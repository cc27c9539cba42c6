//! Metadata-driven upsert/update statement generation.
//!
//! The generator never sees a static column map. For every column in the
//! request it looks up the declared type, length, and collation in the
//! system catalog and derives the literal from that:
//!
//! - DATE/TIME columns truncate a timestamp value to the matching component;
//!   TIMESTAMP columns shift it by the local timezone offset, because the
//!   server expects naive local time rather than UTC;
//! - character columns normalize path separators, upper-case (unless the
//!   column is listed in `original_case`), trim, clamp to the declared
//!   length, and wrap in a `cast(... as varchar(N) character set WIN1252)`
//!   sized to the final string — blob columns are exempt from case folding
//!   and clamping, and `original_character_set` drops the charset clause;
//! - columns without catalog metadata fall back to a plain escaped literal.
//!
//! One catalog round trip per column per call is the accepted cost:
//! generation happens per logical write, not per row in bulk.

use asupersync::{Cx, Outcome};
use chrono::{Local, NaiveDateTime, Offset};
use fbsql_core::{Driver, Error, FieldType, Value, escape, quote};

use crate::catalog::{self, ColumnMetadata};
use crate::client::FirebirdClient;

/// What kind of statement to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// `update or insert ... matching (...) returning ...`
    Upsert,
    /// `update ... set ... where pk = ...`
    Update,
}

/// An ordered, sparse column→value map.
///
/// Insertion order is the generation order. A column that was never set is
/// absent — "do not touch this column" — which is distinct from setting it
/// to [`Value::Null`] ("set to SQL NULL").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column, replacing an existing value in place.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    /// Remove a column, returning its value.
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(name, _)| name == column)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == column)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C: Into<String>, V: Into<Value>> FromIterator<(C, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (C, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (column, value) in iter {
            record.set(column, value);
        }
        record
    }
}

/// Request for one generated statement.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    mode: QueryMode,
    table: String,
    data: Record,
    primary_key: String,
    original_case: Vec<String>,
    original_character_set: Vec<String>,
    matching: Option<Vec<String>>,
    returning: Option<Vec<String>>,
}

impl GenerateRequest {
    /// Start an upsert request for `table`.
    pub fn upsert(table: impl Into<String>) -> Self {
        Self::new(QueryMode::Upsert, table)
    }

    /// Start an update request for `table`.
    pub fn update(table: impl Into<String>) -> Self {
        Self::new(QueryMode::Update, table)
    }

    fn new(mode: QueryMode, table: impl Into<String>) -> Self {
        Self {
            mode,
            table: table.into(),
            data: Record::new(),
            primary_key: String::new(),
            original_case: Vec::new(),
            original_character_set: Vec::new(),
            matching: None,
            returning: None,
        }
    }

    /// Name the primary key column.
    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    /// Set one column value.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.set(column, value);
        self
    }

    /// Replace the whole data record.
    pub fn data(mut self, data: Record) -> Self {
        self.data = data;
        self
    }

    /// Upsert on these columns instead of the primary key. The primary key
    /// is then excluded from the value list.
    pub fn matching<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.matching = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Columns returned by the upsert (defaults to the primary key).
    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Columns whose casing must be preserved.
    pub fn original_case<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.original_case = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Columns cast without the `character set WIN1252` clause.
    pub fn original_character_set<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.original_character_set = columns.into_iter().map(Into::into).collect();
        self
    }
}

/// A generated statement and its column/value fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedQuery {
    /// The full statement text.
    pub sql: String,
    /// The comma-joined column list.
    pub columns: String,
    /// The comma-joined value/assignment list.
    pub values: String,
}

/// Generates upsert and update statements against a live catalog.
#[derive(Debug)]
pub struct QueryGenerator<'a, D: Driver> {
    client: &'a FirebirdClient<D>,
}

impl<'a, D: Driver> QueryGenerator<'a, D> {
    pub fn new(client: &'a FirebirdClient<D>) -> Self {
        Self { client }
    }

    /// Generate a statement for `request`.
    ///
    /// A primary key absent from the data is inserted as an explicit null so
    /// the upsert can detect a to-be-generated key; when matching columns
    /// are given the primary key is dropped instead, since matching replaces
    /// primary-key equality as the upsert key.
    #[tracing::instrument(level = "debug", skip_all, fields(table = %request.table))]
    pub async fn generate(
        &self,
        cx: &Cx,
        request: GenerateRequest,
    ) -> Outcome<GeneratedQuery, Error> {
        let GenerateRequest {
            mode,
            table,
            mut data,
            primary_key,
            original_case,
            original_character_set,
            matching,
            returning,
        } = request;

        if !data.contains(&primary_key) {
            data.set(primary_key.clone(), Value::Null);
        }
        if matching.is_some() {
            data.remove(&primary_key);
        }

        let mut columns = Vec::with_capacity(data.len());
        let mut values = Vec::with_capacity(data.len());

        for (column, value) in data.iter() {
            let meta = match catalog::table_column(cx, self.client, &table, column).await {
                Outcome::Ok(meta) => meta,
                Outcome::Err(e) => return Outcome::Err(e),
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            };

            let fragment = render_fragment(
                column,
                value,
                meta.as_ref(),
                original_case.iter().any(|c| c == column),
                original_character_set.iter().any(|c| c == column),
                mode,
            );

            columns.push(column.to_string());
            values.push(fragment);
        }

        let columns_text = columns.join(", ");
        let values_text = values.join(", ");

        let sql = match mode {
            QueryMode::Upsert => {
                let matching_text = matching
                    .map_or_else(|| primary_key.clone(), |cols| cols.join(", "));
                let returning_text = returning
                    .map_or_else(|| primary_key.clone(), |cols| cols.join(", "));
                format!(
                    "update or insert into {table} ({columns_text}) \
                     values ({values_text}) \
                     matching ({matching_text}) \
                     returning {returning_text}"
                )
            }
            QueryMode::Update => {
                let pk_value = data.get(&primary_key).cloned().unwrap_or(Value::Null);
                format!(
                    "update {table} set {values_text} \
                     where {primary_key} = {}",
                    escape(&pk_value)
                )
            }
        };

        Outcome::Ok(GeneratedQuery {
            sql,
            columns: columns_text,
            values: values_text,
        })
    }
}

fn render_fragment(
    column: &str,
    value: &Value,
    meta: Option<&ColumnMetadata>,
    original_case: bool,
    original_character_set: bool,
    mode: QueryMode,
) -> String {
    let Some(meta) = meta else {
        return assign(column, escape(value), mode);
    };

    match value {
        Value::Text(text) => {
            let text = text.replace('\\', "/");
            let text = if meta.field_type == FieldType::Blob {
                // Blobs are never length-clamped or case-folded.
                text
            } else if original_case {
                clamp_chars(text.trim(), meta.length as usize)
            } else {
                clamp_chars(text.to_uppercase().trim(), meta.length as usize)
            };

            let width = text.chars().count().max(1);
            let literal = quote(&text);
            let cast = if original_character_set {
                format!("cast({literal} as varchar({width}))")
            } else {
                format!("cast({literal} as varchar({width}) character set WIN1252)")
            };
            assign(column, cast, mode)
        }
        Value::Timestamp(ts) => {
            let literal = escape(&fit_to_column(*ts, meta.field_type));
            assign(column, literal, mode)
        }
        _ => assign(column, escape(value), mode),
    }
}

fn assign(column: &str, expr: String, mode: QueryMode) -> String {
    match mode {
        QueryMode::Upsert => expr,
        QueryMode::Update => format!("{column} = {expr}"),
    }
}

fn clamp_chars(text: &str, length: usize) -> String {
    text.chars().take(length).collect()
}

/// Reduce a timestamp value to what the target column stores.
fn fit_to_column(ts: NaiveDateTime, field_type: FieldType) -> Value {
    match field_type {
        FieldType::Date => Value::Text(ts.format("%Y-%m-%d").to_string()),
        FieldType::Time => Value::Text(ts.format("%H:%M:%S").to_string()),
        FieldType::Timestamp => Value::Timestamp(shift_to_server_local(ts)),
        _ => Value::Timestamp(ts),
    }
}

/// The server interprets timestamp literals as naive local time, so undo the
/// local UTC offset before formatting.
fn shift_to_server_local(ts: NaiveDateTime) -> NaiveDateTime {
    let offset = i64::from(Local::now().offset().fix().local_minus_utc());
    ts - chrono::Duration::seconds(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn varchar(length: u32) -> ColumnMetadata {
        ColumnMetadata {
            length,
            field_type: FieldType::Varchar,
            source_domain: "VARCHAR_DOM".to_string(),
            collation: "WIN_PTBR".to_string(),
        }
    }

    fn typed(field_type: FieldType) -> ColumnMetadata {
        ColumnMetadata {
            length: 0,
            field_type,
            source_domain: String::new(),
            collation: "NONE".to_string(),
        }
    }

    #[test]
    fn varchar_upper_cases_trims_and_clamps_to_catalog_length() {
        let fragment = render_fragment(
            "name",
            &Value::Text("hello world".into()),
            Some(&varchar(10)),
            false,
            false,
            QueryMode::Upsert,
        );
        assert_eq!(
            fragment,
            "cast('HELLO WORL' as varchar(10) character set WIN1252)"
        );
    }

    #[test]
    fn original_case_skips_upper_casing_but_still_clamps() {
        let fragment = render_fragment(
            "name",
            &Value::Text("  hello world  ".into()),
            Some(&varchar(10)),
            true,
            false,
            QueryMode::Upsert,
        );
        assert_eq!(
            fragment,
            "cast('hello worl' as varchar(10) character set WIN1252)"
        );
    }

    #[test]
    fn original_character_set_drops_the_charset_clause() {
        let fragment = render_fragment(
            "name",
            &Value::Text("abc".into()),
            Some(&varchar(10)),
            false,
            true,
            QueryMode::Upsert,
        );
        assert_eq!(fragment, "cast('ABC' as varchar(3))");
    }

    #[test]
    fn empty_string_casts_with_minimum_width_one() {
        let fragment = render_fragment(
            "name",
            &Value::Text(String::new()),
            Some(&varchar(10)),
            false,
            false,
            QueryMode::Upsert,
        );
        assert_eq!(fragment, "cast('' as varchar(1) character set WIN1252)");
    }

    #[test]
    fn blob_text_is_neither_clamped_nor_folded() {
        let meta = ColumnMetadata {
            length: 8,
            field_type: FieldType::Blob,
            source_domain: String::new(),
            collation: "NONE".to_string(),
        };
        let fragment = render_fragment(
            "notes",
            &Value::Text("a long mixed-Case note".into()),
            Some(&meta),
            false,
            false,
            QueryMode::Upsert,
        );
        assert_eq!(
            fragment,
            "cast('a long mixed-Case note' as varchar(22) character set WIN1252)"
        );
    }

    #[test]
    fn backslashes_become_forward_slashes() {
        let fragment = render_fragment(
            "path",
            &Value::Text(r"c:\data\file".into()),
            Some(&varchar(60)),
            true,
            false,
            QueryMode::Upsert,
        );
        assert_eq!(
            fragment,
            "cast('c:/data/file' as varchar(12) character set WIN1252)"
        );
    }

    #[test]
    fn update_mode_prefixes_the_assignment() {
        let fragment = render_fragment(
            "name",
            &Value::Text("ann".into()),
            Some(&varchar(10)),
            false,
            false,
            QueryMode::Update,
        );
        assert_eq!(
            fragment,
            "name = cast('ANN' as varchar(3) character set WIN1252)"
        );
    }

    #[test]
    fn missing_metadata_falls_back_to_plain_literal() {
        let upsert = render_fragment(
            "name",
            &Value::Text("ann".into()),
            None,
            false,
            false,
            QueryMode::Upsert,
        );
        assert_eq!(upsert, "'ann'");

        let update = render_fragment("n", &Value::Int(3), None, false, false, QueryMode::Update);
        assert_eq!(update, "n = 3");
    }

    #[test]
    fn date_column_truncates_to_date_component() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 30, 5)
            .unwrap();
        let fragment = render_fragment(
            "created_on",
            &Value::Timestamp(ts),
            Some(&typed(FieldType::Date)),
            false,
            false,
            QueryMode::Upsert,
        );
        assert_eq!(fragment, "'2024-03-09'");
    }

    #[test]
    fn time_column_truncates_to_time_component() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 30, 5)
            .unwrap();
        let fragment = render_fragment(
            "created_at",
            &Value::Timestamp(ts),
            Some(&typed(FieldType::Time)),
            false,
            false,
            QueryMode::Upsert,
        );
        assert_eq!(fragment, "'14:30:05'");
    }

    #[test]
    fn timestamp_column_shifts_by_local_offset() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 30, 5)
            .unwrap();
        let expected = escape(&Value::Timestamp(shift_to_server_local(ts)));
        let fragment = render_fragment(
            "updated_at",
            &Value::Timestamp(ts),
            Some(&typed(FieldType::Timestamp)),
            false,
            false,
            QueryMode::Upsert,
        );
        assert_eq!(fragment, expected);
    }

    #[test]
    fn record_preserves_insertion_order_and_presence() {
        let mut record = Record::new();
        record.set("b", 1_i64);
        record.set("a", 2_i64);
        record.set("b", 3_i64);
        let order: Vec<&str> = record.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["b", "a"]);
        assert_eq!(record.get("b"), Some(&Value::Int(3)));
        assert!(!record.contains("c"));
    }
}
