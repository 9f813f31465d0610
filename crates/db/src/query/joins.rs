//! Registry of the joins a query builder already emitted.

use std::collections::HashSet;
use std::hash::Hash;

/// Ordered, idempotent list of join clauses keyed by a join identifier.
#[derive(Debug)]
pub struct JoinRegistry<J> {
    built: HashSet<J>,
    joins: Vec<String>,
}

impl<J> Default for JoinRegistry<J> {
    fn default() -> Self {
        Self {
            built: HashSet::new(),
            joins: Vec::new(),
        }
    }
}

impl<J: Eq + Hash> JoinRegistry<J> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the join produced by `sql` unless `id` was already joined.
    ///
    /// Returns `true` when the join was added.
    pub fn ensure_join(&mut self, id: J, sql: impl FnOnce() -> String) -> bool {
        if !self.built.insert(id) {
            return false;
        }

        self.joins.push(sql());
        true
    }

    /// Whether `id` was joined.
    #[must_use]
    pub fn contains(&self, id: &J) -> bool {
        self.built.contains(id)
    }

    /// Join clauses in insertion order.
    #[must_use]
    pub fn sql(&self) -> String {
        self.joins.join(" ")
    }
}
