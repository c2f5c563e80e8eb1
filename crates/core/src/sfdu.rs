//! Wrapper (SFDU) scanner: legacy fixed-field framing around a label.
//!
//! A framed file starts with two 20-byte wrapper labels:
//!
//! ```text
//! offset  0..4   domain      "CCSD" (or deprecated "NJPL")
//!         4      version     '3'
//!         5      class       'Z' first, 'I' or 'K' second
//!         6      delimiter   'F' first; A-F or S second
//!         7      spare       '0'
//!         8..12  DDID        "0001" first, "PDSX" second
//!        12..20  value       length or end-marker suffix
//! ```
//!
//! With delimiter `S` the label body runs up to an end marker
//! `CCSD$$MARKER<value>` (or `NJPL$$MARKER<value>`) found later in the file.

use std::io::{self, Read, Seek, SeekFrom};

use odl_toolchain_diagnostics::{Diagnostic, codes};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::WrapperScanConfig;
use crate::context::LabelContext;
use crate::status::Outcome;

/// Size of one wrapper label.
pub const WRAPPER_LEN: usize = 20;

const DOMAIN: &[u8; 4] = b"CCSD";
const DEPRECATED_DOMAIN: &[u8; 4] = b"NJPL";
const MARKER_TAG: &[u8] = b"$$MARKER";
const DELIMITERS: &[u8] = b"ABCDEFS";

/// One framing record: its text and the byte range it governs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrapperFraming {
    /// Wrapper text as found in the file.
    pub label_text: String,
    /// First byte after the framing text.
    pub begin_offset: u64,
    /// End of the governed range, or -1 for end of file.
    pub end_offset: i64,
}

/// Top framing and, when the label closes with an end marker, the bottom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrapperLabels {
    /// Leading wrapper labels; `begin_offset..end_offset` is the label body.
    pub top: WrapperFraming,
    /// Trailing end marker, positioned at `begin_offset..end_offset`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<WrapperFraming>,
}

/// Accessors over one 20-byte wrapper label.
struct Fields<'a>(&'a [u8]);

impl Fields<'_> {
    fn domain(&self) -> &[u8] {
        &self.0[0..4]
    }
    fn version(&self) -> u8 {
        self.0[4]
    }
    fn class(&self) -> u8 {
        self.0[5]
    }
    fn delimiter(&self) -> u8 {
        self.0[6]
    }
    fn spare(&self) -> u8 {
        self.0[7]
    }
    fn ddid(&self) -> &[u8] {
        &self.0[8..12]
    }
    fn value(&self) -> &[u8] {
        &self.0[12..20]
    }
}

/// Collects diagnostics for one scan.
struct Report {
    diagnostics: Vec<Diagnostic>,
    fatal: bool,
}

impl Report {
    fn warn(&mut self, code: &'static str, message: String) {
        warn!(code, %message, "wrapper deviation");
        self.diagnostics.push(Diagnostic::warn(code, message, None));
    }

    fn error(&mut self, code: &'static str, message: String) {
        warn!(code, %message, "wrapper unusable");
        self.fatal = true;
        self.diagnostics.push(Diagnostic::error(code, message, None));
    }

    fn expect_byte(&mut self, code: &'static str, what: &str, found: u8, accepted: &[u8]) {
        if !accepted.contains(&found) {
            self.warn(
                code,
                format!(
                    "{what} is '{}', expected {}",
                    char::from(found).escape_default(),
                    accepted
                        .iter()
                        .map(|&b| format!("'{}'", char::from(b)))
                        .collect::<Vec<_>>()
                        .join(" or ")
                ),
            );
        }
    }

    /// Version and class must at least be alphanumeric.
    fn structural(&mut self, which: &str, fields: &Fields<'_>) -> bool {
        for (what, b) in [("version", fields.version()), ("class", fields.class())] {
            if !b.is_ascii_alphanumeric() {
                self.error(
                    codes::SFDU_CORRUPT_HEADER,
                    format!("{which} wrapper {what} byte 0x{b:02X} is not alphanumeric"),
                );
                return false;
            }
        }
        true
    }
}

/// Scan `reader` for wrapper framing.
///
/// `Done(None)` means the file is not framed. Field deviations produce
/// `Warning`; a corrupt version/class byte or an unknown delimiter on the
/// second wrapper produces `Error`. Diagnostics are also appended to the
/// context. The reader is rewound to offset 0 before returning.
pub fn scan_wrappers<R: Read + Seek>(
    reader: &mut R,
    ctx: &mut LabelContext,
) -> io::Result<Outcome<Option<WrapperLabels>>> {
    let mut report = Report {
        diagnostics: Vec::new(),
        fatal: false,
    };
    let scanned = scan(reader, &ctx.config.wrapper_scan, &mut report);
    reader.seek(SeekFrom::Start(0))?;
    let labels = scanned?;

    ctx.diagnostics.extend(report.diagnostics.iter().cloned());
    if report.fatal {
        return Ok(Outcome::Error);
    }
    Ok(Outcome::with_diagnostics(labels, report.diagnostics))
}

fn scan<R: Read + Seek>(
    reader: &mut R,
    limits: &WrapperScanConfig,
    report: &mut Report,
) -> io::Result<Option<WrapperLabels>> {
    reader.seek(SeekFrom::Start(0))?;
    let mut prefix = Vec::with_capacity(2 * WRAPPER_LEN + 2);
    reader
        .by_ref()
        .take(2 * WRAPPER_LEN as u64 + 2)
        .read_to_end(&mut prefix)?;
    if prefix.len() < WRAPPER_LEN {
        return Ok(None);
    }
    let first = Fields(&prefix[..WRAPPER_LEN]);

    if first.domain() == DEPRECATED_DOMAIN {
        report.warn(
            codes::SFDU_DEPRECATED,
            "NJPL wrapper labels are deprecated; treating the label as running to end of file"
                .into(),
        );
        return Ok(Some(single_wrapper(&prefix)));
    }
    if first.domain() != DOMAIN {
        return Ok(None);
    }

    if !report.structural("first", &first) {
        return Ok(None);
    }
    report.expect_byte(codes::SFDU_UNEXPECTED_VERSION, "first wrapper version", first.version(), b"3");
    report.expect_byte(codes::SFDU_UNEXPECTED_CLASS, "first wrapper class", first.class(), b"Z");
    report.expect_byte(
        codes::SFDU_UNEXPECTED_DELIMITER,
        "first wrapper delimiter",
        first.delimiter(),
        b"F",
    );
    report.expect_byte(codes::SFDU_UNEXPECTED_SPARE, "first wrapper spare", first.spare(), b"0");
    if first.ddid() != b"0001" {
        report.warn(
            codes::SFDU_UNEXPECTED_DDID,
            format!(
                "first wrapper DDID is '{}', expected '0001'",
                String::from_utf8_lossy(first.ddid())
            ),
        );
    }

    let has_second = prefix.len() >= 2 * WRAPPER_LEN && {
        let domain = &prefix[WRAPPER_LEN..WRAPPER_LEN + 4];
        domain == DOMAIN || domain == DEPRECATED_DOMAIN
    };
    if !has_second {
        report.warn(
            codes::SFDU_MISSING_SECOND_WRAPPER,
            "first wrapper is not followed by a second wrapper label".into(),
        );
        return Ok(Some(single_wrapper(&prefix)));
    }
    let second = Fields(&prefix[WRAPPER_LEN..2 * WRAPPER_LEN]);
    if !report.structural("second", &second) {
        return Ok(None);
    }
    report.expect_byte(codes::SFDU_UNEXPECTED_VERSION, "second wrapper version", second.version(), b"3");
    report.expect_byte(codes::SFDU_UNEXPECTED_CLASS, "second wrapper class", second.class(), b"IK");
    report.expect_byte(codes::SFDU_UNEXPECTED_SPARE, "second wrapper spare", second.spare(), b"0");
    if second.ddid() != b"PDSX" {
        report.warn(
            codes::SFDU_UNEXPECTED_DDID,
            format!(
                "second wrapper DDID is '{}', expected 'PDSX'",
                String::from_utf8_lossy(second.ddid())
            ),
        );
    }
    if !DELIMITERS.contains(&second.delimiter()) {
        report.error(
            codes::SFDU_UNKNOWN_DELIMITER,
            format!(
                "second wrapper delimiter '{}' is not a recognized delimitation code",
                char::from(second.delimiter()).escape_default()
            ),
        );
        return Ok(None);
    }

    let header = &prefix[..2 * WRAPPER_LEN];
    let begin = (2 * WRAPPER_LEN + line_break_len(&prefix[2 * WRAPPER_LEN..])) as u64;
    let mut top = WrapperFraming {
        label_text: String::from_utf8_lossy(header).into_owned(),
        begin_offset: begin,
        end_offset: -1,
    };

    let bottom = match second.delimiter() {
        b'S' => {
            let suffix = second.value();
            match find_end_marker(reader, begin, suffix, limits)? {
                Some((at, marker)) => {
                    top.end_offset = at as i64;
                    Some(WrapperFraming {
                        label_text: String::from_utf8_lossy(&marker).into_owned(),
                        begin_offset: at,
                        end_offset: (at + marker.len() as u64) as i64,
                    })
                }
                None => {
                    report.warn(
                        codes::SFDU_MISSING_END_MARKER,
                        format!(
                            "no end marker '$$MARKER{}' within {} bytes; label runs to end of file",
                            String::from_utf8_lossy(suffix),
                            limits.chunk_size * limits.max_chunks
                        ),
                    );
                    None
                }
            }
        }
        b'A' => {
            // Value field is an ASCII byte count of the labelled data.
            let count = std::str::from_utf8(second.value())
                .ok()
                .and_then(|s| s.trim().parse::<u64>().ok());
            if let Some(n) = count {
                top.end_offset = (begin + n) as i64;
            }
            None
        }
        _ => None,
    };
    debug!(begin, end = top.end_offset, bottom = bottom.is_some(), "wrapper labels found");
    Ok(Some(WrapperLabels { top, bottom }))
}

fn single_wrapper(prefix: &[u8]) -> WrapperLabels {
    let begin = WRAPPER_LEN + line_break_len(&prefix[WRAPPER_LEN..]);
    WrapperLabels {
        top: WrapperFraming {
            label_text: String::from_utf8_lossy(&prefix[..WRAPPER_LEN]).into_owned(),
            begin_offset: begin as u64,
            end_offset: -1,
        },
        bottom: None,
    }
}

/// Length of a CR, LF, or CRLF at the start of `bytes`.
fn line_break_len(bytes: &[u8]) -> usize {
    match bytes {
        [b'\r', b'\n', ..] => 2,
        [b'\r' | b'\n', ..] => 1,
        _ => 0,
    }
}

/// Search forward from `from` for either marker spelling, reading at most
/// `max_chunks` chunks. The tail of each chunk is carried over so a marker
/// split across a chunk boundary is still found.
fn find_end_marker<R: Read + Seek>(
    reader: &mut R,
    from: u64,
    suffix: &[u8],
    limits: &WrapperScanConfig,
) -> io::Result<Option<(u64, Vec<u8>)>> {
    let patterns: Vec<Vec<u8>> = [DOMAIN, DEPRECATED_DOMAIN]
        .iter()
        .map(|d| [d.as_slice(), MARKER_TAG, suffix].concat())
        .collect();
    let overlap = patterns[0].len() - 1;

    reader.seek(SeekFrom::Start(from))?;
    let mut window: Vec<u8> = Vec::with_capacity(limits.chunk_size + overlap);
    let mut window_start = from;
    let mut chunk = vec![0u8; limits.chunk_size];
    for _ in 0..limits.max_chunks {
        let n = read_full(reader, &mut chunk)?;
        if n == 0 {
            break;
        }
        window.extend_from_slice(&chunk[..n]);
        let hit = patterns
            .iter()
            .filter_map(|p| find(&window, p).map(|i| (i, p)))
            .min_by_key(|(i, _)| *i);
        if let Some((i, p)) = hit {
            return Ok(Some((window_start + i as u64, p.clone())));
        }
        if window.len() > overlap {
            let drop = window.len() - overlap;
            window.drain(..drop);
            window_start += drop as u64;
        }
        if n < chunk.len() {
            break;
        }
    }
    Ok(None)
}

fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
