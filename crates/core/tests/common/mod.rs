//! Shared test helpers for `odl_toolchain_core` integration tests.

#![allow(unreachable_pub)]

use std::path::PathBuf;

use odl_toolchain_core::{Diagnostic, LabelContext, LabelTree, Terminator, parse_label};

// ─── Parse helpers ───────────────────────────────────────────────────────────

/// Parse `text` with a fresh LF-terminated context, asserting no grammar errors.
#[allow(dead_code)]
pub fn parse(text: &str) -> (LabelTree, LabelContext) {
    let mut ctx = lf_context();
    let parsed = parse_label(text, &mut ctx).expect("parse_label");
    assert_eq!(
        parsed.counts.errors, 0,
        "unexpected grammar errors: {:?}",
        ctx.diagnostics.iter().collect::<Vec<_>>()
    );
    (parsed.tree, ctx)
}

/// A default context that writes `\n` regardless of platform.
#[allow(dead_code)]
pub fn lf_context() -> LabelContext {
    let mut ctx = LabelContext::default();
    ctx.config.terminator = Terminator::Lf;
    ctx
}

// ─── Diagnostic helpers ──────────────────────────────────────────────────────

/// Diagnostic codes in the order they were appended.
#[allow(dead_code)]
pub fn diag_ids(ctx: &LabelContext) -> Vec<String> {
    ctx.diagnostics.iter().map(|d| d.id.to_string()).collect()
}

/// Find first diagnostic with the given code.
#[allow(dead_code)]
pub fn find_diag<'a>(ctx: &'a LabelContext, code: &str) -> &'a Diagnostic {
    ctx.diagnostics
        .iter()
        .find(|d| &*d.id == code)
        .unwrap_or_else(|| panic!("expected diagnostic {code}"))
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

/// The repository's `samples/` directory.
#[allow(dead_code)]
pub fn samples_dir() -> PathBuf {
    let mut root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    // crates/core -> repo root
    root.pop();
    root.pop();
    root.join("samples")
}

/// A small image label with one attached record-located pointer.
#[allow(dead_code)]
pub const IMAGE_LABEL: &str = "\
PDS_VERSION_ID = PDS3
RECORD_TYPE = FIXED_LENGTH
RECORD_BYTES = 80
FILE_RECORDS = 100
LABEL_RECORDS = 3
^IMAGE = 4
OBJECT = IMAGE
  LINES = 10
  LINE_SAMPLES = 80
  SAMPLE_BITS = 8
END_OBJECT = IMAGE
END
";
