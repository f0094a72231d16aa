//! Deferred statement edits for the structural (AST) output.
//!
//! The declaration walk only reads the tree. Everything it wants changed is
//! recorded here by statement span and applied by the rewriter once the walk
//! and finalize are done.

use indexmap::IndexMap;
use oxc_span::Span;

use crate::scope::BodyKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementEdit {
    /// Drop the statement from its list.
    Remove,
    /// Replace an export statement with the declaration it wraps.
    Unwrap,
    /// Replace `export default <expr>` with the registration call.
    ExportDefaultExpression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Statement list that owns the statement.
    pub container: BodyKey,
    pub edit: StatementEdit,
}

#[derive(Debug, Default)]
pub struct RemovalLedger {
    entries: IndexMap<Span, LedgerEntry>,
}

impl RemovalLedger {
    pub fn new() -> Self {
        RemovalLedger::default()
    }

    pub fn remove(&mut self, container: BodyKey, span: Span) {
        self.record(container, span, StatementEdit::Remove);
    }

    pub fn unwrap_declaration(&mut self, container: BodyKey, span: Span) {
        self.record(container, span, StatementEdit::Unwrap);
    }

    pub fn rewrite_default(&mut self, container: BodyKey, span: Span) {
        self.record(container, span, StatementEdit::ExportDefaultExpression);
    }

    fn record(&mut self, container: BodyKey, span: Span, edit: StatementEdit) {
        let previous = self.entries.insert(span, LedgerEntry { container, edit });
        assert!(
            previous.is_none(),
            "statement [{}, {}) was scheduled twice",
            span.start,
            span.end
        );
    }

    pub fn get(&self, span: Span) -> Option<&LedgerEntry> {
        self.entries.get(&span)
    }

    /// Whether the statement at `span` must leave the list `container`.
    pub fn is_removed_from(&self, container: BodyKey, span: Span) -> bool {
        match self.entries.get(&span) {
            Some(entry) if entry.edit == StatementEdit::Remove => {
                assert_eq!(
                    entry.container, container,
                    "statement [{}, {}) is owned by another list",
                    span.start, span.end
                );
                true
            }
            _ => false,
        }
    }

    /// Spans of default-exported expressions, in walk order.
    pub fn default_expressions(&self) -> impl Iterator<Item = Span> + '_ {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.edit == StatementEdit::ExportDefaultExpression)
            .map(|(span, _)| *span)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
