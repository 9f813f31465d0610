//! Named-replacement SQL and raw row fetching.
//!
//! Query builders write `:name` placeholders and collect their values in a
//! [`Replacements`] map. [`BuiltQuery::to_statement`] rewrites the
//! placeholders to positional `$n` parameters in first-appearance order.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use peertube_common::{AppError, AppResult};
use sea_orm::{ConnectionTrait, DbBackend, FromQueryResult, JsonValue, Statement, Value};

use super::row::{SqlRow, row_count};

/// Values of the named placeholders of a query.
pub type Replacements = BTreeMap<String, Value>;

/// SQL text with named placeholders and their values.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    /// SQL with `:name` placeholders.
    pub sql: String,
    /// Placeholder values.
    pub replacements: Replacements,
}

impl BuiltQuery {
    /// Create a query from its parts.
    #[must_use]
    pub const fn new(sql: String, replacements: Replacements) -> Self {
        Self { sql, replacements }
    }

    /// Build the positional `PostgreSQL` statement.
    pub fn to_statement(&self) -> AppResult<Statement> {
        let (sql, values) = bind_named(&self.sql, &self.replacements)?;
        Ok(Statement::from_sql_and_values(DbBackend::Postgres, sql, values))
    }
}

/// Rewrite `:name` placeholders to `$n`.
///
/// Quoted identifiers, string literals, dollar-quoted bodies, comments and
/// `::` casts are left untouched. A name used several times maps to the same
/// position.
pub fn bind_named(sql: &str, replacements: &Replacements) -> AppResult<(String, Vec<Value>)> {
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut positions: BTreeMap<&str, usize> = BTreeMap::new();

    let bytes = sql.as_bytes();
    let mut i = 0;
    let mut quote: Option<u8> = None;

    while i < bytes.len() {
        let c = bytes[i];

        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            let ch_len = utf8_len(c);
            out.push_str(&sql[i..i + ch_len]);
            i += ch_len;
            continue;
        }

        match c {
            b'\'' | b'"' => {
                quote = Some(c);
                out.push(c as char);
                i += 1;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                let end = sql[i..].find('\n').map_or(sql.len(), |n| i + n);
                out.push_str(&sql[i..end]);
                i = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = sql[i + 2..].find("*/").map_or(sql.len(), |n| i + 2 + n + 2);
                out.push_str(&sql[i..end]);
                i = end;
            }
            b'$' if i == 0 || !is_ident_byte(bytes[i - 1]) => match dollar_tag(&sql[i..]) {
                Some(tag) => {
                    let body = i + tag.len();
                    let end = sql[body..].find(tag).map_or(sql.len(), |n| body + n + tag.len());
                    out.push_str(&sql[i..end]);
                    i = end;
                }
                None => {
                    out.push('$');
                    i += 1;
                }
            },
            b':' if bytes.get(i + 1) == Some(&b':') => {
                out.push_str("::");
                i += 2;
            }
            b':' if bytes.get(i + 1).is_some_and(|b| b.is_ascii_alphabetic()) => {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }

                let name = &sql[start..end];
                let position = match positions.get(name) {
                    Some(position) => *position,
                    None => {
                        let value = replacements.get(name).ok_or_else(|| {
                            AppError::Internal(format!("Missing replacement for :{name}"))
                        })?;
                        values.push(value.clone());
                        positions.insert(name, values.len());
                        values.len()
                    }
                };

                let _ = write!(out, "${position}");
                i = end;
            }
            _ => {
                let ch_len = utf8_len(c);
                out.push_str(&sql[i..i + ch_len]);
                i += ch_len;
            }
        }
    }

    Ok((out, values))
}

/// Opening delimiter of a dollar-quoted string: `$$` or `$tag$`.
fn dollar_tag(sql: &str) -> Option<&str> {
    let bytes = sql.as_bytes();
    let mut end = 1;

    if bytes.get(end).is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_') {
        while bytes.get(end).is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_') {
            end += 1;
        }
    }

    (bytes.get(end) == Some(&b'$')).then(|| &sql[..=end])
}

const fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

const fn utf8_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}

/// Run a query and return its rows as flattened JSON objects.
pub async fn run_query<C: ConnectionTrait>(db: &C, query: &BuiltQuery) -> AppResult<Vec<SqlRow>> {
    let statement = query.to_statement()?;

    tracing::debug!(sql = %statement.sql, "Running raw query");

    let rows = JsonValue::find_by_statement(statement)
        .all(db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(rows
        .into_iter()
        .filter_map(|row| match row {
            JsonValue::Object(map) => Some(map),
            _ => None,
        })
        .collect())
}

/// Read the `total` column of a count query.
#[must_use]
pub fn parse_row_count(rows: &[SqlRow]) -> u64 {
    rows.first()
        .and_then(|row| row_count(row, "total"))
        .map_or(0, |total| total.max(0) as u64)
}

/// Render a list of integer ids (plus raw SQL expressions) for an `IN (...)`.
///
/// An empty list renders `NULL` so the surrounding `IN` matches nothing.
#[must_use]
pub fn create_safe_in(ids: &[i32], extra: &[&str]) -> String {
    let mut parts: Vec<String> = ids.iter().map(ToString::to_string).collect();
    parts.extend(extra.iter().map(|e| (*e).to_string()));

    if parts.is_empty() {
        return "NULL".to_string();
    }

    parts.join(", ")
}

/// Project the columns of one join: `"Video->VideoChannel"."id" AS "Video.VideoChannel.id"`.
#[must_use]
pub fn build_select_attributes(table_alias: &str, attributes: &[&str]) -> Vec<String> {
    let alias_prefix = table_alias.replace("->", ".");

    attributes
        .iter()
        .map(|attribute| format!(r#""{table_alias}"."{attribute}" AS "{alias_prefix}.{attribute}""#))
        .collect()
}

/// Escape `LIKE` metacharacters of a user-provided search term.
#[must_use]
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);

    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}
