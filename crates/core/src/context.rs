//! Mutable state threaded through every label operation.

use odl_toolchain_diagnostics::Diagnostics;

use crate::config::LabelConfig;

/// Running record counters of the record writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordCounters {
    /// Records emitted so far by the current write.
    pub written: usize,
    /// Records the current write must reach, padding if short. 0 means no
    /// padding target.
    pub needed: usize,
}

/// Caller-owned context for a sequence of label operations.
///
/// One context drives one logical session: diagnostics accumulate across
/// calls until drained, and the writer's settings live here rather than in
/// process-wide state.
#[derive(Debug, Default)]
pub struct LabelContext {
    /// Accumulated diagnostics.
    pub diagnostics: Diagnostics,
    /// Engine settings.
    pub config: LabelConfig,
    /// When set, serialization omits the closing `END` statement.
    pub suppress_end: bool,
    /// Record counters of the writer.
    pub records: RecordCounters,
}

impl LabelContext {
    /// A context with the given configuration.
    pub fn new(config: LabelConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }
}
