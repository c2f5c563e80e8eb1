//! Diagnostic ID constants.
//!
//! Use these instead of string literals to get compile-time typo detection
//! and IDE autocomplete. Ranges: `ODL1xxx` grammar, `ODL2xxx` wrapper
//! framing, `ODL3xxx` record writer, `ODL4xxx` pointers and mutation.

// ── Grammar ─────────────────────────────────────────────────────────────

/// A token appeared where the grammar did not allow it.
pub const PARSER_UNEXPECTED_TOKEN: &str = "ODL1001";
/// An assignment had no value after `=`.
pub const PARSER_MISSING_VALUE: &str = "ODL1002";
/// A quoted string or symbol ran to end of input.
pub const PARSER_UNTERMINATED_STRING: &str = "ODL1003";
/// A `<units>` expression had no closing `>`.
pub const PARSER_UNTERMINATED_UNITS: &str = "ODL1004";
/// A units expression could not be parsed.
pub const PARSER_INVALID_UNITS: &str = "ODL1005";
/// `END_OBJECT`/`END_GROUP` without a matching opener.
pub const PARSER_UNBALANCED_END: &str = "ODL1006";
/// An aggregate was still open at end of input.
pub const PARSER_MISSING_END_OBJECT: &str = "ODL1007";
/// `END_OBJECT = X` named a different class than its opener.
pub const PARSER_END_CLASS_MISMATCH: &str = "ODL1008";
/// The label has no `END` statement.
pub const PARSER_MISSING_END: &str = "ODL1009";
/// A `/*` comment was never closed.
pub const PARSER_UNTERMINATED_COMMENT: &str = "ODL1010";
/// Non-ASCII bytes in label text.
pub const PARSER_NON_ASCII: &str = "ODL1011";
/// A numeric literal was malformed or out of range.
pub const PARSER_INVALID_NUMBER: &str = "ODL1012";
/// A `(` or `{` value list was not closed.
pub const PARSER_UNBALANCED_LIST: &str = "ODL1013";

// ── Wrapper framing (SFDU) ──────────────────────────────────────────────

/// The file uses the deprecated `NJPL` wrapper prefix.
pub const SFDU_DEPRECATED: &str = "ODL2001";
/// A wrapper version digit was not the expected one.
pub const SFDU_UNEXPECTED_VERSION: &str = "ODL2002";
/// A wrapper class letter was not the expected one.
pub const SFDU_UNEXPECTED_CLASS: &str = "ODL2003";
/// A wrapper spare byte was not `0`.
pub const SFDU_UNEXPECTED_SPARE: &str = "ODL2004";
/// A wrapper data description identifier was not the expected one.
pub const SFDU_UNEXPECTED_DDID: &str = "ODL2005";
/// Wrapper header bytes are structurally corrupt.
pub const SFDU_CORRUPT_HEADER: &str = "ODL2006";
/// The second wrapper declares an unknown delimitation code.
pub const SFDU_UNKNOWN_DELIMITER: &str = "ODL2007";
/// The end marker of a start-marker wrapper was not found.
pub const SFDU_MISSING_END_MARKER: &str = "ODL2008";
/// The first wrapper's delimiter byte was not the expected one.
pub const SFDU_UNEXPECTED_DELIMITER: &str = "ODL2009";
/// A current-generation first wrapper is not followed by a second wrapper.
pub const SFDU_MISSING_SECOND_WRAPPER: &str = "ODL2010";

// ── Record writer ───────────────────────────────────────────────────────

/// The requested record type is not supported on this platform.
pub const RECORD_TYPE_UNSUPPORTED: &str = "ODL3001";
/// `RECORD_TYPE` holds a value the writer does not know.
pub const RECORD_TYPE_UNRECOGNIZED: &str = "ODL3002";
/// `RECORD_BYTES` is missing or not a positive integer.
pub const RECORD_BYTES_INVALID: &str = "ODL3003";
/// The rewritten label needed more records than were reserved for it.
pub const RECORD_COUNT_OVERFLOW: &str = "ODL3004";

// ── Pointers and mutation ───────────────────────────────────────────────

/// A pointer value has none of the four recognized forms.
pub const POINTER_MALFORMED: &str = "ODL4001";
/// An attached pointer could not be rewritten during offset adjustment.
pub const POINTER_UPDATE_FAILED: &str = "ODL4002";
/// Replacement value text did not parse to exactly one value list.
pub const VALUE_SHAPE_INVALID: &str = "ODL4003";
