//! Label reader: loads a label file into a tree.
//!
//! Framed files are parsed from the body between the wrapper headers and the
//! wrapper labels are attached to the root. Unframed files are read up to the
//! `END` line so an attached data area is never pulled into memory.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use crate::LabelError;
use crate::context::LabelContext;
use crate::grammar::parser::{ParseCounts, parse_into};
use crate::sfdu::scan_wrappers;
use crate::status::Outcome;
use crate::tree::LabelTree;

/// A parsed label and the text it was parsed from.
#[derive(Debug)]
pub struct ParsedLabel {
    /// The tree.
    pub tree: LabelTree,
    /// Label text handed to the parser; diagnostic spans index into it.
    pub source: String,
    /// Errors and warnings the parser reported.
    pub counts: ParseCounts,
}

/// Parse in-memory label text into a fresh tree.
pub fn parse_label(text: &str, ctx: &mut LabelContext) -> Result<ParsedLabel, LabelError> {
    let mut tree = LabelTree::new();
    let root = tree.root().ok_or(LabelError::OutOfResources { what: "object" })?;
    let counts = parse_into(&mut tree, root, text, &mut ctx.diagnostics)?;
    Ok(ParsedLabel {
        tree,
        source: text.to_string(),
        counts,
    })
}

/// Read and parse the label at `path`.
///
/// Returns `Error` only when the wrapper framing is unusable. Otherwise the
/// outcome carries every diagnostic produced while reading; check
/// [`ParseCounts::errors`] for grammar errors.
pub fn read_label_file(
    path: &Path,
    ctx: &mut LabelContext,
) -> Result<Outcome<ParsedLabel>, LabelError> {
    let mark = ctx.diagnostics.len();
    let mut file = File::open(path).map_err(|e| LabelError::io(path, e))?;

    let labels = match scan_wrappers(&mut file, ctx).map_err(|e| LabelError::io(path, e))? {
        Outcome::Done(labels) | Outcome::Warning(labels, _) => labels,
        Outcome::Ambiguous { .. } | Outcome::Error => return Ok(Outcome::Error),
    };

    let bytes = match &labels {
        Some(w) => {
            file.seek(SeekFrom::Start(w.top.begin_offset))
                .map_err(|e| LabelError::io(path, e))?;
            match u64::try_from(w.top.end_offset) {
                Ok(end) if end >= w.top.begin_offset => {
                    let mut body = Vec::new();
                    (&mut file)
                        .take(end - w.top.begin_offset)
                        .read_to_end(&mut body)
                        .map_err(|e| LabelError::io(path, e))?;
                    body
                }
                _ => read_through_end(&mut file).map_err(|e| LabelError::io(path, e))?,
            }
        }
        None => read_through_end(&mut file).map_err(|e| LabelError::io(path, e))?,
    };
    let text = String::from_utf8_lossy(&bytes);
    debug!(path = %path.display(), bytes = bytes.len(), framed = labels.is_some(), "read label");

    let mut parsed = parse_label(&text, ctx)?;
    parsed.tree.set_wrappers(labels);
    let diagnostics = ctx.diagnostics.since(mark).to_vec();
    Ok(Outcome::with_diagnostics(parsed, diagnostics))
}

/// Read lines up to and including the first bare `END` line.
fn read_through_end<R: Read>(reader: R) -> io::Result<Vec<u8>> {
    let mut reader = BufReader::new(reader);
    let mut out = Vec::new();
    loop {
        let start = out.len();
        if reader.read_until(b'\n', &mut out)? == 0 {
            break;
        }
        let line = &out[start..];
        if line.trim_ascii().eq_ignore_ascii_case(b"END") {
            break;
        }
    }
    Ok(out)
}
