//! Free-text search predicate builder.
//!
//! Builds a `where`-fragment combining an exact primary-key match with a
//! fuzzy multi-token match over a set of searchable columns. Each column is
//! resolved against the catalog to pick a cast that makes it comparable as
//! text:
//!
//! - varchar with no explicit collation casts to `VARCHAR(120)` in WIN1252;
//! - varchar sourced from a non-varchar domain casts to `VARCHAR(500)`;
//! - blobs cast through the legacy [`LEGACY_TEXT_DOMAIN`] domain;
//! - everything else passes through unchanged.
//!
//! The resulting predicate text is embedded by the caller; an empty string
//! means "no filter".

use asupersync::{Cx, Outcome};
use fbsql_core::{Driver, Error, FieldType, Value, escape};

use crate::catalog::{self, ColumnMetadata};
use crate::client::{FirebirdClient, LEGACY_TEXT_DOMAIN};

/// Request for one search predicate.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    search: String,
    primary_key: String,
    columns: Vec<String>,
}

impl SearchRequest {
    pub fn new(search: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            primary_key: primary_key.into(),
            columns: Vec::new(),
        }
    }

    /// Add one searchable column.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Add several searchable columns.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }
}

/// Builds search predicates against a live catalog.
#[derive(Debug)]
pub struct SearchTerms<'a, D: Driver> {
    client: &'a FirebirdClient<D>,
}

impl<'a, D: Driver> SearchTerms<'a, D> {
    pub fn new(client: &'a FirebirdClient<D>) -> Self {
        Self { client }
    }

    /// Build the predicate for `request`.
    ///
    /// Empty search text or a missing primary key yields an empty string.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn build(&self, cx: &Cx, request: SearchRequest) -> Outcome<String, Error> {
        let SearchRequest {
            search,
            primary_key,
            columns,
        } = request;

        if search.is_empty() || primary_key.is_empty() {
            return Outcome::Ok(String::new());
        }

        let mut parts = Vec::with_capacity(columns.len());
        for column in &columns {
            let meta = match catalog::column(cx, self.client, column).await {
                Outcome::Ok(meta) => meta,
                Outcome::Err(e) => return Outcome::Err(e),
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            };
            parts.push(format!("coalesce({}, '')", column_expr(column, meta.as_ref())));
        }

        let concat = parts.join(" || ' ' || ");
        let haystack = format!("upper(cast({concat} as {LEGACY_TEXT_DOMAIN}))");

        let tokens: Vec<String> = search
            .split_whitespace()
            .map(|token| {
                format!(
                    "{haystack} like '%{}%'",
                    token.to_uppercase().replace('\'', "''")
                )
            })
            .collect();
        let token_text = tokens.join(" and ");

        Outcome::Ok(format!(
            "upper({primary_key}) = upper({}) or ({token_text})",
            escape(&Value::from(search.as_str()))
        ))
    }
}

/// Catalog-aware text cast for one searchable column.
fn column_expr(column: &str, meta: Option<&ColumnMetadata>) -> String {
    let Some(meta) = meta else {
        return column.to_string();
    };
    match meta.field_type {
        FieldType::Varchar if meta.collation == "NONE" => {
            format!("cast({column} as VARCHAR(120) character set WIN1252)")
        }
        FieldType::Varchar if !meta.source_domain.starts_with("VARCHAR") => {
            format!("cast({column} as VARCHAR(500) character set WIN1252)")
        }
        FieldType::Blob => format!("cast({column} as {LEGACY_TEXT_DOMAIN})"),
        _ => column.to_string(),
    }
}
