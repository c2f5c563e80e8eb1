//! ODL toolchain core library.
//!
//! Reads, queries, edits, and writes ODL (Object Description Language)
//! labels of the kind used by planetary data archives. The main entry points
//! are [`read_label_file`] / [`parse_label`] for loading, [`find_object`] /
//! [`find_parameter`] for lookup, the [`mutate`] functions for editing, and
//! [`write_label`] / [`attach_data`] for record-disciplined output.
//!
//! Every operation takes a caller-owned [`LabelContext`]; there is no
//! process-wide state.

#![warn(missing_docs)]

/// Engine configuration loaded from JSON.
pub mod config;
/// Caller-owned operation context.
pub mod context;
mod error;
/// Value and units text rendering.
pub mod format;
/// ODL grammar: lexer, parser, emitter, and JSON dump.
pub mod grammar;
/// Object and parameter lookup.
pub mod locate;
/// Tree edits and value fetches.
pub mod mutate;
/// Data pointer encoding, decoding, and relocation.
pub mod pointer;
/// Label file loading.
pub mod reader;
/// Record-disciplined label output.
pub mod record;
/// SFDU wrapper label detection.
pub mod sfdu;
mod status;
/// Label tree arena.
pub mod tree;

// ── Convenience re-exports ──────────────────────────────────────────────────
// Flat imports for the most common entry points. The full module paths
// remain available for less common types.

// Errors and outcomes
pub use error::LabelError;
pub use status::{Ambiguity, Lookup, Outcome, Status};

// Context and configuration
pub use config::{ConfigError, LabelConfig, RecordType, Terminator, load_config_from_str};
pub use context::{LabelContext, RecordCounters};

// Tree
pub use tree::{AggregateKind, LabelTree, ObjectId, ParamId, ParamKind, Value, ValueShape};

// Grammar
pub use grammar::dump::to_pretty_json;
pub use grammar::emit::{EmitConfig, StatementSink, emit_label};
pub use grammar::parser::ParseCounts;

// Lookup and edits
pub use locate::{ObjectQuery, ParamQuery, find_object, find_parameter};

// Pointers
pub use pointer::{PointerDescriptor, adjust_pointers, get_pointer, replace_pointer};

// Files
pub use reader::{ParsedLabel, parse_label, read_label_file};
pub use record::{RecordRequest, WriteOptions, WriteSummary, attach_data, write_label};
pub use sfdu::{WrapperFraming, WrapperLabels, scan_wrappers};

// Diagnostics (re-exported from the diagnostics crate)
pub use odl_toolchain_diagnostics::{Diagnostic, Diagnostics, Severity, Span, codes};
