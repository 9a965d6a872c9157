use std::sync::{Mutex, MutexGuard, PoisonError};

use course_core::model::Statement;

/// A batched statement and whether it was queued with `force_send`.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub statement: Statement,
    pub force_send: bool,
}

/// Append-only buffer of statements waiting for a grouped send.
///
/// Reading the buffer for a flush leaves it untouched; only `clear` empties it.
#[derive(Debug, Default)]
pub struct BatchStore {
    pending: Mutex<Vec<BatchEntry>>,
}

impl BatchStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, statement: Statement, force_send: bool) {
        self.lock().push(BatchEntry {
            statement,
            force_send,
        });
    }

    pub fn extend(&self, statements: impl IntoIterator<Item = Statement>, force_send: bool) {
        self.lock().extend(statements.into_iter().map(|statement| BatchEntry {
            statement,
            force_send,
        }));
    }

    /// Copy of the pending entries in append order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<BatchEntry> {
        self.lock().clone()
    }

    /// Pending statements in append order, without their send flags.
    #[must_use]
    pub fn statements(&self) -> Vec<Statement> {
        self.lock()
            .iter()
            .map(|entry| entry.statement.clone())
            .collect()
    }

    /// Drop every pending statement, returning how many were removed.
    pub fn clear(&self) -> usize {
        let mut pending = self.lock();
        let removed = pending.len();
        pending.clear();
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Appends are all-or-nothing, so a poisoned buffer is still consistent.
    fn lock(&self) -> MutexGuard<'_, Vec<BatchEntry>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(verb: &str) -> Statement {
        Statement::with_verb_id(verb)
    }

    #[test]
    fn keeps_append_order_across_push_and_extend() {
        let store = BatchStore::new();
        store.push(statement("a"), false);
        store.extend([statement("b"), statement("c")], true);
        store.push(statement("d"), false);

        let verbs: Vec<_> = store
            .statements()
            .iter()
            .map(|s| s.verb_id().unwrap().to_owned())
            .collect();
        assert_eq!(verbs, ["a", "b", "c", "d"]);

        let forced: Vec<_> = store.snapshot().iter().map(|e| e.force_send).collect();
        assert_eq!(forced, [false, true, true, false]);
    }

    #[test]
    fn snapshot_does_not_drain() {
        let store = BatchStore::new();
        store.push(statement("a"), false);

        assert_eq!(store.snapshot().len(), 1);
        assert_eq!(store.snapshot().len(), 1);
        assert_eq!(store.clear(), 1);
        assert!(store.is_empty());
    }
}
