//! Flattened SQL rows and the identity-key fold used to rebuild graphs from them.
//!
//! A flattened row carries every joined entity side by side, each column
//! aliased with the dotted path of its join (`VideoChannel.Account.Actor.id`).
//! A joined entity is present in a row when its key column is truthy: a null
//! or zero id means the outer join found nothing.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// One flattened row, keyed by column alias.
pub type SqlRow = Map<String, Value>;

/// Identity of a joined entity inside a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    Int(i64),
    Text(String),
}

/// Read a key column, following the truthiness rules of the row producer.
#[must_use]
pub fn row_key(row: &SqlRow, column: &str) -> Option<RowKey> {
    match row.get(column)? {
        Value::Number(n) => n.as_i64().filter(|v| *v != 0).map(RowKey::Int),
        Value::String(s) if !s.is_empty() => Some(RowKey::Text(s.clone())),
        _ => None,
    }
}

/// Read an integer id column.
#[must_use]
pub fn row_id(row: &SqlRow, column: &str) -> Option<i32> {
    match row_key(row, column)? {
        RowKey::Int(v) => i32::try_from(v).ok(),
        RowKey::Text(s) => s.parse().ok(),
    }
}

/// Read an aggregate counter, which drivers may hand back as a number or a numeric string.
#[must_use]
pub fn row_count(row: &SqlRow, column: &str) -> Option<i64> {
    match row.get(column)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Copy the columns of one join out of a row, stripping the join prefix.
#[must_use]
pub fn grab(row: &SqlRow, attributes: &[&str], prefix: &str) -> SqlRow {
    attributes
        .iter()
        .map(|attribute| {
            let key = if prefix.is_empty() {
                (*attribute).to_string()
            } else {
                format!("{prefix}.{attribute}")
            };

            let value = row.get(&key).cloned().unwrap_or(Value::Null);
            ((*attribute).to_string(), value)
        })
        .collect()
}

/// Decode the columns of one join into a graph node.
///
/// Undecodable data is logged and treated as absent.
#[must_use]
pub fn decode<T: DeserializeOwned>(row: &SqlRow, attributes: &[&str], prefix: &str) -> Option<T> {
    match serde_json::from_value(Value::Object(grab(row, attributes, prefix))) {
        Ok(model) => Some(model),
        Err(e) => {
            tracing::error!(prefix = prefix, error = %e, "Cannot decode joined row");
            None
        }
    }
}

/// How a joined entity is identified in a flattened row.
#[derive(Debug, Clone, Copy)]
pub enum Identity {
    /// The entity's own primary key.
    Column(&'static str),
    /// Foreign keys of a join-table row.
    Composite(&'static [&'static str]),
}

/// Whether an identity is unique over the whole result or per top-level row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    /// Prefixed with the top-level `id` column: the same entity is attached
    /// again under every top-level entity it appears with.
    PerRoot,
}

/// Declaration of one joined entity kind.
#[derive(Debug, Clone, Copy)]
pub struct JoinSpec {
    /// Dedup namespace. Kinds sharing a namespace share identities.
    pub kind: &'static str,
    /// Column alias prefix of the join.
    pub prefix: &'static str,
    /// Column whose truthiness tells whether the join matched.
    pub presence: &'static str,
    pub identity: Identity,
    pub scope: Scope,
}

impl JoinSpec {
    /// Entity identified by its own `<prefix>.id` column.
    #[must_use]
    pub const fn by_id(kind: &'static str, prefix: &'static str, id_column: &'static str) -> Self {
        Self {
            kind,
            prefix,
            presence: id_column,
            identity: Identity::Column(id_column),
            scope: Scope::Global,
        }
    }

    /// Join-table entity identified by a composite foreign key.
    #[must_use]
    pub const fn by_composite(
        kind: &'static str,
        prefix: &'static str,
        presence: &'static str,
        columns: &'static [&'static str],
    ) -> Self {
        Self {
            kind,
            prefix,
            presence,
            identity: Identity::Composite(columns),
            scope: Scope::Global,
        }
    }

    /// Same spec, deduplicated per top-level row.
    #[must_use]
    pub const fn per_root(self) -> Self {
        Self {
            scope: Scope::PerRoot,
            ..self
        }
    }

    /// Identity of this entity in `row`, or `None` when the join did not match.
    #[must_use]
    pub fn identity_of(&self, row: &SqlRow) -> Option<Vec<RowKey>> {
        row_key(row, self.presence)?;

        let mut key = Vec::with_capacity(3);

        if self.scope == Scope::PerRoot {
            key.push(row_key(row, "id")?);
        }

        match self.identity {
            Identity::Column(column) => key.push(row_key(row, column)?),
            Identity::Composite(columns) => {
                for column in columns {
                    key.push(row_key(row, column)?);
                }
            }
        }

        Some(key)
    }
}

/// Per-call record of every joined entity already attached.
#[derive(Debug, Default)]
pub struct RowFolder {
    done: HashSet<(&'static str, Vec<RowKey>)>,
}

impl RowFolder {
    /// Create an empty folder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the entity of `spec` in `row` as seen.
    ///
    /// Returns `false` when the join did not match or the entity was already seen.
    pub fn first_seen(&mut self, row: &SqlRow, spec: &JoinSpec) -> bool {
        match spec.identity_of(row) {
            Some(key) => self.done.insert((spec.kind, key)),
            None => false,
        }
    }

    /// Decode the entity of `spec` in `row` the first time it is seen.
    pub fn take<T: DeserializeOwned>(
        &mut self,
        row: &SqlRow,
        spec: &JoinSpec,
        attributes: &[&str],
    ) -> Option<T> {
        if !self.first_seen(row, spec) {
            return None;
        }

        decode(row, attributes, spec.prefix)
    }
}
