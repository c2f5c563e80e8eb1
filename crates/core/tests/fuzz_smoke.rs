//! Fuzz smoke tests for the label lexer, parser, and wrapper scanner.
//!
//! These tests feed random, adversarial, and edge-case inputs to the engine
//! to verify it never panics and that spans and emitted text stay sound.
//!
//! A simple deterministic PRNG provides reproducible randomness.

mod common;

use std::io::Cursor;

use odl_toolchain_core::grammar::lexer::tokenize;
use odl_toolchain_core::{LabelContext, emit_label, parse_label, scan_wrappers};

// ─── Simple deterministic PRNG (LCG) ────────────────────────────────────────

struct SimpleRng(u64);

impl SimpleRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range(&mut self, max: usize) -> usize {
        (self.next() >> 33) as usize % max
    }

    fn gen_bytes(&mut self, len: usize) -> Vec<u8> {
        (0..len).map(|_| (self.next() >> 56) as u8).collect()
    }

    fn gen_from(&mut self, alphabet: &[u8], len: usize) -> String {
        (0..len)
            .map(|_| alphabet[self.gen_range(alphabet.len())] as char)
            .collect()
    }
}

// ─── Invariant checking ─────────────────────────────────────────────────────

/// Parse `input` and assert span soundness. When the parse is clean,
/// the emitted text must parse error-free too.
fn fuzz_parse(input: &str) {
    for tok in tokenize(input) {
        assert!(tok.start <= tok.end && tok.end <= input.len());
        assert_eq!(tok.text, &input[tok.start..tok.end]);
    }

    let mut ctx = LabelContext::default();
    let parsed = parse_label(input, &mut ctx).expect("parse never fails on resources");
    for diag in &ctx.diagnostics {
        if let Some(span) = diag.span {
            assert!(
                span.start <= span.end && span.end <= input.len(),
                "Diagnostic span {span:?} out of bounds for input of {} bytes: {diag:?}",
                input.len()
            );
        }
    }

    if parsed.counts.is_clean() {
        let emitted = emit_label(&parsed.tree, &ctx.config.emit);
        let mut again = LabelContext::default();
        let reparsed = parse_label(&emitted, &mut again).unwrap();
        assert_eq!(
            reparsed.counts.errors, 0,
            "emitted text did not re-parse:\ninput: {input:?}\nemitted:\n{emitted}"
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Category A: Random input
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn parser_no_panic_random_bytes() {
    let mut rng = SimpleRng::new(0xCAFE_BABE);
    for len in [0, 1, 2, 5, 10, 50, 100, 500, 1000, 5000] {
        for _ in 0..20 {
            let bytes = rng.gen_bytes(len);
            fuzz_parse(&String::from_utf8_lossy(&bytes));
        }
    }
}

#[test]
fn parser_no_panic_random_label_like() {
    let mut rng = SimpleRng::new(0xBAAD_F00D);
    let alphabet: &[u8] = b"ABCXYZ_019#.-:T =^(){},\"'<>/*\nEND_OBJECTGROUP";
    for len in [1, 5, 20, 100, 500] {
        for _ in 0..30 {
            fuzz_parse(&rng.gen_from(alphabet, len));
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Category B: Adversarial statements
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn parser_no_panic_adversarial_statements() {
    let cases = [
        "",
        "=",
        "^",
        "^=",
        "END_OBJECT",
        "END_OBJECT = X\nEND",
        "OBJECT =",
        "OBJECT = X\nOBJECT = Y\nEND",
        "A = (((",
        "A = ((1, 2), 3)",
        "A = {",
        "A = \"",
        "A = '",
        "A = 1 <",
        "A = 1 <>",
        "A = 1 <**>",
        "A = 16#FFFFFFFFFFFFFFFFFFFF#",
        "A = 99999999999999999999999",
        "A = 2001-13-45T99:99:99",
        "/*",
        "A = 1 /* unterminated",
        "A = 1\nEND = 2\nEND",
        "GROUP = G\nEND_OBJECT = G\nEND",
    ];
    for case in cases {
        fuzz_parse(case);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Category C: Wrapper scanner
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn wrapper_scan_no_panic() {
    let mut rng = SimpleRng::new(0x5EED_0001);
    let prefixes: [&[u8]; 4] = [
        b"CCSD3ZF0000100000001CCSD3KS0PDSX",
        b"CCSD3ZF0000100000001CCSD3KA0PDSX",
        b"CCSD3ZF0000100000001",
        b"NJPL3KS0L015",
    ];
    for prefix in prefixes {
        for len in [0, 1, 7, 8, 30, 300] {
            let mut bytes = prefix.to_vec();
            bytes.extend(rng.gen_bytes(len));
            let mut ctx = LabelContext::default();
            ctx.config.wrapper_scan.chunk_size = 32;
            ctx.config.wrapper_scan.max_chunks = 3;
            let mut reader = Cursor::new(bytes);
            let _ = scan_wrappers(&mut reader, &mut ctx).unwrap();
            assert_eq!(reader.position(), 0);
        }
    }
}
