//! Diagnostics for the ODL toolchain.
//!
//! Provides [`Diagnostic`], [`Severity`], [`Span`], and [`LineIndex`] types
//! used to report errors, warnings, and informational messages from the
//! grammar, the wrapper scanner, and the record writer. Diagnostic codes are
//! defined in the [`codes`] module; [`Diagnostics`] is the accumulating sink
//! that label operations append to.

#![warn(missing_docs)]

/// Diagnostic ID constants.
pub mod codes;
mod sink;

pub use sink::Diagnostics;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

// ── LineIndex ────────────────────────────────────────────────────────────

/// Maps byte offsets in a source string to line and column positions.
///
/// Lines and columns are **0-indexed** internally. Use [`LineIndex::line_col`]
/// to get a `(line, col)` pair and add 1 when displaying to users.
///
/// Both `\n` and a lone `\r` start a new line, since labels written with the
/// CR stream discipline use bare carriage returns.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line.
    /// `line_starts[0]` is always 0.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Build a `LineIndex` from source text.
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = vec![0usize];
        for (i, &b) in bytes.iter().enumerate() {
            match b {
                b'\n' => line_starts.push(i + 1),
                b'\r' if bytes.get(i + 1) != Some(&b'\n') => line_starts.push(i + 1),
                _ => {}
            }
        }
        Self { line_starts }
    }

    /// Convert a byte offset to a 0-indexed `(line, column)` pair.
    ///
    /// If `offset` is past the end of the source, the last line is returned
    /// with the column measured from that line's start.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next.saturating_sub(1),
        };
        let col = offset.saturating_sub(self.line_starts[line]);
        (line, col)
    }

    /// Byte offset of the start of the given 0-indexed line.
    ///
    /// Returns `None` if `line` is out of bounds.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Total number of lines (at least 1, even for empty input).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Severity level for a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Severity {
    /// Hard error: the input or operation is invalid.
    Error,
    /// Warning: the operation completed but the result may be surprising.
    Warn,
    /// Informational note.
    Info,
    /// Unrecoverable condition; the operation was abandoned.
    Fatal,
    /// Continuation line of the preceding message.
    Continue,
}

impl Severity {
    /// Returns `true` for `Error` and `Fatal`.
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error | Severity::Fatal)
    }
}

/// Byte span in the source input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    /// Byte offset of the first character (0-based).
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl Span {
    /// Create a span covering `[start, end)`.
    ///
    /// Panics if `end < start`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(end >= start, "Span end ({end}) < start ({start})");
        Self { start, end }
    }

    /// Create a zero-width span at the given position.
    pub fn empty(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }
}

/// A diagnostic message produced by a label operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Unique diagnostic code (e.g., `"ODL1001"`).
    pub id: Cow<'static, str>,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable diagnostic message.
    pub message: String,
    /// Optional byte span in the source input that this diagnostic relates to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Machine-readable context for tooling. Keys and values are free-form strings.
    ///
    /// Uses `BTreeMap` for deterministic key ordering in serialized output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

impl Diagnostic {
    /// Create a diagnostic with the given fields.
    pub fn new(
        id: impl Into<Cow<'static, str>>,
        severity: Severity,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            message: message.into(),
            span,
            context: None,
        }
    }

    /// Shorthand for an `Error` diagnostic.
    pub fn error(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Error, message, span)
    }

    /// Shorthand for a `Warn` diagnostic.
    pub fn warn(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Warn, message, span)
    }

    /// Shorthand for an `Info` diagnostic.
    pub fn info(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        Self::new(id, Severity::Info, message, span)
    }

    /// Attach machine-readable context metadata (builder pattern).
    pub fn with_context(mut self, ctx: BTreeMap<String, String>) -> Self {
        self.context = Some(ctx);
        self
    }

    /// Returns the human-readable explanation for this diagnostic's code, if available.
    pub fn explain(&self) -> Option<&'static str> {
        explain(&self.id)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warn => write!(f, "warn"),
            Severity::Info => write!(f, "info"),
            Severity::Fatal => write!(f, "fatal"),
            Severity::Continue => write!(f, "continue"),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.id, self.message)
    }
}

/// Returns the human-readable explanation for a diagnostic code, if known.
pub fn explain(id: &str) -> Option<&'static str> {
    let text = match id {
        codes::PARSER_UNEXPECTED_TOKEN => {
            "A token appeared where the label grammar does not allow it. Statements have the form KEYWORD = VALUE, OBJECT = CLASS, or END_OBJECT = CLASS."
        }
        codes::PARSER_MISSING_VALUE => {
            "An assignment has nothing after '='. Every keyword needs a value; use NULL or 'N/A' for an intentionally empty one."
        }
        codes::PARSER_UNTERMINATED_STRING => {
            "A quoted string or symbol was opened but never closed before the end of the label."
        }
        codes::PARSER_UNTERMINATED_UNITS => {
            "A units expression starting with '<' has no closing '>'."
        }
        codes::PARSER_INVALID_UNITS => {
            "A units expression must be unit names combined with '*' and '/', each optionally raised with '**N'."
        }
        codes::PARSER_UNBALANCED_END => {
            "END_OBJECT or END_GROUP appeared without a matching OBJECT or GROUP statement."
        }
        codes::PARSER_MISSING_END_OBJECT => {
            "An OBJECT or GROUP block was still open when the label ended."
        }
        codes::PARSER_END_CLASS_MISMATCH => {
            "The class named on END_OBJECT/END_GROUP differs from the class of the block it closes."
        }
        codes::PARSER_MISSING_END => "The label text has no terminating END statement.",
        codes::PARSER_UNTERMINATED_COMMENT => "A '/*' comment was never closed with '*/'.",
        codes::PARSER_NON_ASCII => {
            "Label text must be 7-bit ASCII; non-ASCII bytes are kept but may not survive other tools."
        }
        codes::PARSER_INVALID_NUMBER => {
            "A numeric literal is malformed or does not fit a 64-bit integer."
        }
        codes::PARSER_UNBALANCED_LIST => {
            "A '(' sequence or '{' set was not closed with the matching bracket."
        }
        codes::SFDU_DEPRECATED => {
            "The file starts with the deprecated NJPL wrapper prefix; current files use CCSD."
        }
        codes::SFDU_UNEXPECTED_VERSION => "A wrapper header carries an unexpected version digit.",
        codes::SFDU_UNEXPECTED_CLASS => "A wrapper header carries an unexpected class letter.",
        codes::SFDU_UNEXPECTED_SPARE => "A wrapper spare byte is not '0'.",
        codes::SFDU_UNEXPECTED_DDID => {
            "A wrapper data description identifier differs from the expected value."
        }
        codes::SFDU_CORRUPT_HEADER => {
            "Wrapper header bytes are structurally corrupt; the framing cannot be trusted."
        }
        codes::SFDU_UNKNOWN_DELIMITER => {
            "The second wrapper declares a delimitation code that is not recognized, so the extent of the label cannot be determined."
        }
        codes::SFDU_MISSING_END_MARKER => {
            "The wrapper declares start-marker delimitation but its end marker was not found; the label is treated as extending to end of file."
        }
        codes::SFDU_UNEXPECTED_DELIMITER => {
            "The first wrapper's delimiter byte differs from the expected value."
        }
        codes::SFDU_MISSING_SECOND_WRAPPER => {
            "The first wrapper is not followed by a second wrapper label; only the top framing is kept."
        }
        codes::RECORD_TYPE_UNSUPPORTED => {
            "The requested record type cannot be written on this platform."
        }
        codes::RECORD_TYPE_UNRECOGNIZED => {
            "RECORD_TYPE must be FIXED_LENGTH, STREAM, VARIABLE_LENGTH, or UNDEFINED."
        }
        codes::RECORD_BYTES_INVALID => {
            "Fixed-length output needs RECORD_BYTES to be a positive integer."
        }
        codes::RECORD_COUNT_OVERFLOW => {
            "The rewritten label grew past the record count reserved for it; attached pointers are now wrong."
        }
        codes::POINTER_MALFORMED => {
            "A pointer must be N, N <BYTES>, (\"file\", N), or (\"file\", N <BYTES>)."
        }
        codes::POINTER_UPDATE_FAILED => {
            "An attached pointer could not be rewritten while shifting offsets."
        }
        codes::VALUE_SHAPE_INVALID => {
            "Replacement value text must parse to exactly one value or value list."
        }
        _ => return None,
    };
    Some(text)
}
