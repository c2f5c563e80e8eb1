//! Accumulating diagnostic sink.

use std::io::{self, Write};

use crate::{Diagnostic, Severity};

/// Ordered collection of diagnostics appended by label operations.
///
/// Operations record [`Diagnostics::len`] on entry and compare on exit to
/// learn whether they produced messages; the sink itself never decides
/// whether a message is fatal.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Append a continuation line to the previous message.
    pub fn push_continuation(&mut self, message: impl Into<String>) {
        let id = self
            .items
            .last()
            .map(|d| d.id.clone())
            .unwrap_or_default();
        self.items
            .push(Diagnostic::new(id, Severity::Continue, message, None));
    }

    /// Whether any message is waiting to be drained.
    pub fn has_pending(&self) -> bool {
        !self.items.is_empty()
    }

    /// Number of pending messages.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the sink is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All pending messages in append order.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    /// Messages appended after `mark` (a value previously returned by [`len`](Self::len)).
    pub fn since(&self, mark: usize) -> &[Diagnostic] {
        &self.items[mark.min(self.items.len())..]
    }

    /// Count of `Error`/`Fatal` messages appended after `mark`.
    pub fn errors_since(&self, mark: usize) -> usize {
        self.since(mark)
            .iter()
            .filter(|d| d.severity.is_error())
            .count()
    }

    /// Drop messages appended after `mark`.
    pub fn truncate(&mut self, mark: usize) {
        self.items.truncate(mark);
    }

    /// Remove and return every pending message.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.items)
    }

    /// Write every pending message to `out`, one per line, and clear the sink.
    ///
    /// With `include_severity` each line is prefixed with `severity[code]: `;
    /// continuation lines are indented instead of prefixed.
    pub fn drain_to(&mut self, out: &mut impl Write, include_severity: bool) -> io::Result<()> {
        for d in self.items.drain(..) {
            match (include_severity, d.severity) {
                (_, Severity::Continue) => writeln!(out, "    {}", d.message)?,
                (true, _) => writeln!(out, "{d}")?,
                (false, _) => writeln!(out, "{}", d.message)?,
            }
        }
        out.flush()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}
