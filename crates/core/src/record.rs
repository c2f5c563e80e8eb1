//! Record writer: serializes a label tree under a record discipline.
//!
//! A write runs in three steps: resolve the discipline (possibly from the
//! label's own `RECORD_TYPE`/`RECORD_BYTES`), emit wrapper framing and
//! statements through a [`RecordSink`], then finalize padding and the bottom
//! wrapper. The writer is strict: any diagnostic appended while it runs makes
//! the result `Error`, even when every byte reached the file.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::ops::{Deref, DerefMut};
use std::path::Path;

use odl_toolchain_diagnostics::{Diagnostic, codes};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::LabelError;
use crate::config::{RecordType, Terminator};
use crate::context::LabelContext;
use crate::grammar::emit::{StatementSink, emit_tree};
use crate::pointer::adjust_pointers;
use crate::status::Outcome;
use crate::tree::LabelTree;

// ── Discipline ──────────────────────────────────────────────────────────

/// Discipline requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordRequest {
    /// Honor the label's own `RECORD_TYPE` and `RECORD_BYTES`.
    #[default]
    Label,
    /// Terminator-delimited stream with the configured terminator.
    Stream,
    /// Fixed-length records of the configured length.
    Fixed,
    /// Variable-length records; not supported on this platform.
    Variable,
}

/// Resolved physical layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum Discipline {
    /// One statement per terminated line.
    Stream {
        /// Line terminator.
        terminator: Terminator,
    },
    /// Statements packed into space-padded records.
    Fixed {
        /// Record length in bytes.
        record_bytes: usize,
        /// Terminator after each statement inside the records.
        terminator: Terminator,
    },
}

impl Discipline {
    fn is_fixed(self) -> bool {
        matches!(self, Discipline::Fixed { .. })
    }
}

/// Caller choices for one write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOptions {
    /// Discipline to use.
    pub request: RecordRequest,
    /// Pad the label to this many records; 0 for no padding.
    pub records_needed: usize,
}

/// What a write produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    /// Layout used.
    pub discipline: Discipline,
    /// Records written for the label, padding included.
    pub records_written: usize,
    /// Records written after the padding target was met; only the bottom
    /// wrapper of an unknown-type stream lands there.
    pub trailing_records: usize,
    /// Bytes written to the file.
    pub bytes_written: u64,
    /// The label's `RECORD_TYPE` was unknown and the default was used.
    pub type_unknown: bool,
}

// ── Settings guard ──────────────────────────────────────────────────────

/// Holds the context for the duration of a write and puts the writer's
/// settings back when dropped, on success and failure alike.
struct SettingsGuard<'c> {
    ctx: &'c mut LabelContext,
    terminator: Terminator,
    record_bytes: usize,
    suppress_end: bool,
}

impl<'c> SettingsGuard<'c> {
    fn new(ctx: &'c mut LabelContext) -> Self {
        let terminator = ctx.config.terminator;
        let record_bytes = ctx.config.record_bytes;
        let suppress_end = ctx.suppress_end;
        Self {
            ctx,
            terminator,
            record_bytes,
            suppress_end,
        }
    }
}

impl Deref for SettingsGuard<'_> {
    type Target = LabelContext;

    fn deref(&self) -> &LabelContext {
        self.ctx
    }
}

impl DerefMut for SettingsGuard<'_> {
    fn deref_mut(&mut self) -> &mut LabelContext {
        self.ctx
    }
}

impl Drop for SettingsGuard<'_> {
    fn drop(&mut self) {
        self.ctx.config.terminator = self.terminator;
        self.ctx.config.record_bytes = self.record_bytes;
        self.ctx.suppress_end = self.suppress_end;
    }
}

// ── Record sink ─────────────────────────────────────────────────────────

/// Statement sink that applies a discipline and counts records.
pub struct RecordSink<'w, W: Write> {
    out: &'w mut W,
    target: &'w Path,
    discipline: Discipline,
    pending: Vec<u8>,
    records: usize,
    bytes: u64,
}

impl<'w, W: Write> RecordSink<'w, W> {
    /// Wrap `out`; `target` names the destination in I/O errors.
    pub fn new(out: &'w mut W, target: &'w Path, discipline: Discipline) -> Self {
        Self {
            out,
            target,
            discipline,
            pending: Vec::new(),
            records: 0,
            bytes: 0,
        }
    }

    /// Records completed so far.
    pub fn records(&self) -> usize {
        self.records
    }

    /// Bytes handed to the writer so far.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<(), LabelError> {
        self.out
            .write_all(bytes)
            .map_err(|e| LabelError::io(self.target, e))?;
        self.bytes += bytes.len() as u64;
        Ok(())
    }

    /// Write out any partial fixed-length record, space-padded.
    pub fn flush_partial(&mut self) -> Result<(), LabelError> {
        if let Discipline::Fixed { record_bytes, .. } = self.discipline
            && !self.pending.is_empty()
        {
            let mut record = std::mem::take(&mut self.pending);
            record.resize(record_bytes, b' ');
            self.write_raw(&record)?;
            self.records += 1;
        }
        Ok(())
    }

    /// Append blank records until `target` records exist.
    pub fn pad_to(&mut self, target: usize) -> Result<(), LabelError> {
        let blank: Vec<u8> = match self.discipline {
            Discipline::Stream { terminator } => terminator.as_bytes().to_vec(),
            Discipline::Fixed { record_bytes, .. } => {
                let mut blank = Vec::new();
                blank.try_reserve(record_bytes)?;
                blank.resize(record_bytes, b' ');
                blank
            }
        };
        while self.records < target {
            self.write_raw(&blank)?;
            self.records += 1;
        }
        Ok(())
    }

    /// Records a right-justified fixed-length `text` occupies.
    fn records_for(&self, text: &str) -> usize {
        match self.discipline {
            Discipline::Fixed { record_bytes, .. } => text.len().div_ceil(record_bytes).max(1),
            Discipline::Stream { .. } => 1,
        }
    }

    /// Write `text` right-justified into whole fixed-length records.
    fn right_justified(&mut self, text: &str) -> Result<(), LabelError> {
        let Discipline::Fixed { record_bytes, .. } = self.discipline else {
            return self.statement(text);
        };
        let count = self.records_for(text);
        let mut block = Vec::new();
        block.try_reserve(count * record_bytes)?;
        block.resize(count * record_bytes - text.len(), b' ');
        block.extend_from_slice(text.as_bytes());
        self.write_raw(&block)?;
        self.records += count;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), LabelError> {
        self.out.flush().map_err(|e| LabelError::io(self.target, e))
    }
}

impl<W: Write> StatementSink for RecordSink<'_, W> {
    fn statement(&mut self, line: &str) -> Result<(), LabelError> {
        match self.discipline {
            Discipline::Stream { terminator } => {
                self.write_raw(line.as_bytes())?;
                self.write_raw(terminator.as_bytes())?;
                self.records += 1;
            }
            Discipline::Fixed {
                record_bytes,
                terminator,
            } => {
                let term = terminator.as_bytes();
                self.pending.try_reserve(line.len() + term.len())?;
                self.pending.extend_from_slice(line.as_bytes());
                self.pending.extend_from_slice(term);
                while self.pending.len() >= record_bytes {
                    let record: Vec<u8> = self.pending.drain(..record_bytes).collect();
                    self.write_raw(&record)?;
                    self.records += 1;
                }
            }
        }
        Ok(())
    }
}

// ── Discipline selection ────────────────────────────────────────────────

struct Resolved {
    discipline: Discipline,
    type_unknown: bool,
}

fn root_keyword_text(tree: &LabelTree, name: &str) -> Option<String> {
    let root = tree.root()?;
    let param = tree.param(tree.param_named(root, name)?)?;
    param.values().first()?.as_text().map(str::to_ascii_uppercase)
}

fn root_keyword_int(tree: &LabelTree, name: &str) -> Option<i64> {
    let root = tree.root()?;
    tree.param(tree.param_named(root, name)?)?.values().first()?.as_integer()
}

fn fixed_length(ctx: &mut LabelContext, record_bytes: Option<i64>) -> Option<usize> {
    match record_bytes.and_then(|n| usize::try_from(n).ok()).filter(|&n| n > 0) {
        Some(n) => Some(n),
        None => {
            ctx.diagnostics.push(Diagnostic::error(
                codes::RECORD_BYTES_INVALID,
                "fixed-length output needs a positive RECORD_BYTES",
                None,
            ));
            None
        }
    }
}

fn unsupported(ctx: &mut LabelContext) {
    ctx.diagnostics.push(Diagnostic::error(
        codes::RECORD_TYPE_UNSUPPORTED,
        "variable-length records are not supported on this platform",
        None,
    ));
}

fn resolve_discipline(
    tree: &LabelTree,
    ctx: &mut LabelContext,
    request: RecordRequest,
) -> Option<Resolved> {
    let terminator = ctx.config.terminator;
    let default_bytes = i64::try_from(ctx.config.record_bytes).ok();
    let configured = |ctx: &mut LabelContext, type_unknown| {
        let discipline = match ctx.config.record_type {
            RecordType::Stream => Discipline::Stream { terminator },
            RecordType::Fixed => Discipline::Fixed {
                record_bytes: fixed_length(ctx, default_bytes)?,
                terminator,
            },
        };
        Some(Resolved {
            discipline,
            type_unknown,
        })
    };
    let known = |discipline| Resolved {
        discipline,
        type_unknown: false,
    };

    match request {
        RecordRequest::Variable => {
            unsupported(ctx);
            None
        }
        RecordRequest::Stream => Some(known(Discipline::Stream { terminator })),
        RecordRequest::Fixed => {
            let record_bytes = fixed_length(ctx, default_bytes)?;
            Some(known(Discipline::Fixed {
                record_bytes,
                terminator,
            }))
        }
        RecordRequest::Label => match root_keyword_text(tree, "RECORD_TYPE").as_deref() {
            Some("FIXED_LENGTH" | "FIXED") => {
                let record_bytes = fixed_length(ctx, root_keyword_int(tree, "RECORD_BYTES"))?;
                Some(known(Discipline::Fixed {
                    record_bytes,
                    terminator,
                }))
            }
            Some("STREAM") => Some(known(Discipline::Stream { terminator })),
            Some("VARIABLE_LENGTH" | "VARIABLE") => {
                unsupported(ctx);
                None
            }
            None | Some("UNDEFINED" | "UNKNOWN" | "NONE") => configured(ctx, true),
            Some(other) => {
                ctx.diagnostics.push(
                    Diagnostic::error(
                        codes::RECORD_TYPE_UNRECOGNIZED,
                        format!("RECORD_TYPE {other} is not a recognized record type"),
                        None,
                    )
                    .with_context(
                        [("record_type".to_string(), other.to_string())]
                            .into_iter()
                            .collect(),
                    ),
                );
                None
            }
        },
    }
}

// ── Writing ─────────────────────────────────────────────────────────────

/// Serialize `tree` to the file at `path`.
///
/// See [`write_label_to`] for the layout rules.
pub fn write_label(
    tree: &LabelTree,
    ctx: &mut LabelContext,
    path: &Path,
    options: &WriteOptions,
) -> Result<Outcome<WriteSummary>, LabelError> {
    let mut out = DeferredFile::new(path);
    let outcome = write_label_to(tree, ctx, &mut out, path, options)?;
    if outcome.status().is_ok() {
        out.open().map_err(|e| LabelError::io(path, e))?;
    }
    Ok(outcome)
}

/// Creates the destination on the first write, so a write refused while
/// choosing the discipline leaves an existing file untouched.
struct DeferredFile<'p> {
    path: &'p Path,
    file: Option<BufWriter<File>>,
}

impl<'p> DeferredFile<'p> {
    fn new(path: &'p Path) -> Self {
        Self { path, file: None }
    }

    fn open(&mut self) -> io::Result<&mut BufWriter<File>> {
        let file = match self.file.take() {
            Some(file) => file,
            None => BufWriter::new(File::create(self.path)?),
        };
        Ok(self.file.insert(file))
    }
}

impl Write for DeferredFile<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.open()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Serialize `tree` into `out`; `target` names the destination in errors.
///
/// With wrapper framing attached, the top wrapper comes first and `END` is
/// placed according to the discipline:
///
/// | Discipline | Bottom | Layout after the statements |
/// |---|---|---|
/// | stream, known type | yes | `END`, bottom wrapper, padding |
/// | stream, known type | no | `END`, padding |
/// | fixed | yes | `END`, padding to needed − k, bottom right-justified in k records |
/// | fixed | no | `END`, padding |
/// | stream, unknown type | yes | padding to needed, bottom wrapper (no `END`) |
/// | stream, unknown type | no | padding (no `END`) |
///
/// Without framing `END` always follows the statements. The unknown-type
/// bottom wrapper sits past the padding target and does not count against
/// `records_needed`.
pub fn write_label_to<W: Write>(
    tree: &LabelTree,
    ctx: &mut LabelContext,
    out: &mut W,
    target: &Path,
    options: &WriteOptions,
) -> Result<Outcome<WriteSummary>, LabelError> {
    let mark = ctx.diagnostics.len();
    let mut ctx = SettingsGuard::new(ctx);
    ctx.records.needed = options.records_needed;
    ctx.records.written = 0;

    let Some(root) = tree.root() else {
        return Ok(Outcome::Error);
    };
    let Some(resolved) = resolve_discipline(tree, &mut ctx, options.request) else {
        return Ok(Outcome::Error);
    };
    let discipline = resolved.discipline;
    if let Discipline::Fixed { record_bytes, .. } = discipline {
        ctx.config.record_bytes = record_bytes;
    }
    if let Discipline::Stream { terminator } | Discipline::Fixed { terminator, .. } = discipline {
        ctx.config.terminator = terminator;
    }
    let stream_unknown = resolved.type_unknown && !discipline.is_fixed();

    let wrappers = tree.wrappers();
    let bottom = wrappers.and_then(|w| w.bottom.as_ref());
    ctx.suppress_end = match wrappers {
        None => false,
        Some(_) => discipline.is_fixed() || stream_unknown || bottom.is_none(),
    };

    let mut sink = RecordSink::new(out, target, discipline);
    if let Some(w) = wrappers {
        sink.statement(&w.top.label_text)?;
    }
    emit_tree(tree, root, &ctx.config.emit, ctx.suppress_end, &mut sink)?;

    let needed = options.records_needed;
    let mut reserved = None;
    if wrappers.is_some() {
        if stream_unknown {
            sink.pad_to(needed)?;
            if let Some(b) = bottom {
                reserved = Some(sink.records());
                sink.statement(&b.label_text)?;
            }
        } else if discipline.is_fixed() {
            sink.statement("END")?;
            sink.flush_partial()?;
            match bottom {
                Some(b) => {
                    sink.pad_to(needed.saturating_sub(sink.records_for(&b.label_text)))?;
                    sink.right_justified(&b.label_text)?;
                }
                None => sink.pad_to(needed)?,
            }
        } else {
            match bottom {
                Some(b) => sink.statement(&b.label_text)?,
                None => sink.statement("END")?,
            }
            sink.pad_to(needed)?;
        }
    } else {
        sink.flush_partial()?;
        sink.pad_to(needed)?;
    }
    sink.finish()?;

    let records = sink.records();
    let bytes = sink.bytes();
    let counted = reserved.unwrap_or(records);
    ctx.records.written = records;
    if needed > 0 && counted > needed {
        ctx.diagnostics.push(
            Diagnostic::error(
                codes::RECORD_COUNT_OVERFLOW,
                format!("label needs {counted} records but only {needed} were reserved"),
                None,
            )
            .with_context(
                [
                    ("needed".to_string(), needed.to_string()),
                    ("written".to_string(), counted.to_string()),
                ]
                .into_iter()
                .collect(),
            ),
        );
    }

    let summary = WriteSummary {
        discipline,
        records_written: records,
        trailing_records: records - counted,
        bytes_written: bytes,
        type_unknown: resolved.type_unknown,
    };
    let produced = ctx.diagnostics.len() - mark;
    info!(
        target = %target.display(),
        records,
        bytes,
        diagnostics = produced,
        "wrote label"
    );
    if produced > 0 {
        return Ok(Outcome::Error);
    }
    Ok(Outcome::Done(summary))
}

/// Write a label followed by an external data file.
///
/// The label is written once to learn its record count, attached pointers
/// are shifted by that count, and the label is written again padded to the
/// same count. A pointer that cannot be shifted stops the write before the
/// second pass, leaving the first-pass label on disk. The data file is appended from byte `skip_bytes` on. Fixed
/// output is then NUL-padded to a whole record.
pub fn attach_data(
    tree: &mut LabelTree,
    ctx: &mut LabelContext,
    label_path: &Path,
    data_path: &Path,
    skip_bytes: u64,
    options: &WriteOptions,
) -> Result<Outcome<WriteSummary>, LabelError> {
    let mark = ctx.diagnostics.len();
    let first_pass = WriteOptions {
        records_needed: 0,
        ..*options
    };
    let Outcome::Done(first) = write_label(tree, ctx, label_path, &first_pass)? else {
        return Ok(Outcome::Error);
    };
    let reserved = first.records_written - first.trailing_records;
    let label_records = reserved.max(options.records_needed);
    debug!(label_records, "first pass complete");

    let shift = i64::try_from(label_records + first.trailing_records).unwrap_or(i64::MAX);
    if let Outcome::Error = adjust_pointers(tree, ctx, 0, shift) {
        return Ok(Outcome::Error);
    }

    let second_pass = WriteOptions {
        records_needed: label_records,
        ..*options
    };
    let second = match write_label(tree, ctx, label_path, &second_pass)? {
        Outcome::Done(summary) => summary,
        _ => return Ok(Outcome::Error),
    };

    let appended = append_data(label_path, data_path, skip_bytes, second.discipline)
        .map_err(|(path, e)| LabelError::io(path, e))?;
    let summary = WriteSummary {
        bytes_written: second.bytes_written + appended,
        ..second
    };
    info!(
        label = %label_path.display(),
        data = %data_path.display(),
        appended,
        "attached data"
    );
    if ctx.diagnostics.len() > mark {
        return Ok(Outcome::Error);
    }
    Ok(Outcome::Done(summary))
}

/// Append `data_path` from `skip` on, then NUL-pad fixed output to a whole
/// record. Returns bytes appended; errors name the file involved.
fn append_data(
    label_path: &Path,
    data_path: &Path,
    skip: u64,
    discipline: Discipline,
) -> Result<u64, (std::path::PathBuf, io::Error)> {
    let on_label = |e| (label_path.to_path_buf(), e);
    let on_data = |e| (data_path.to_path_buf(), e);

    let mut data = File::open(data_path).map_err(on_data)?;
    data.seek(SeekFrom::Start(skip)).map_err(on_data)?;
    let mut label = OpenOptions::new()
        .append(true)
        .open(label_path)
        .map_err(on_label)?;
    let label_len = label.metadata().map_err(on_label)?.len();

    let mut appended = 0u64;
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = match data.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(on_data(e)),
        };
        label.write_all(&buf[..n]).map_err(on_label)?;
        appended += n as u64;
    }

    if let Discipline::Fixed { record_bytes, .. } = discipline {
        let rem = (label_len + appended) % record_bytes as u64;
        if rem != 0 {
            let pad = vec![0u8; (record_bytes as u64 - rem) as usize];
            label.write_all(&pad).map_err(on_label)?;
            appended += pad.len() as u64;
        }
    }
    label.flush().map_err(on_label)?;
    Ok(appended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::parser::parse_into;
    use crate::sfdu::{WrapperFraming, WrapperLabels};
    use crate::status::Status;

    fn label(text: &str) -> LabelTree {
        let mut tree = LabelTree::new();
        let root = tree.root().unwrap();
        let mut sink = odl_toolchain_diagnostics::Diagnostics::new();
        parse_into(&mut tree, root, text, &mut sink).unwrap();
        tree
    }

    fn lf_context() -> LabelContext {
        let mut ctx = LabelContext::default();
        ctx.config.terminator = Terminator::Lf;
        ctx
    }

    fn render(
        tree: &LabelTree,
        ctx: &mut LabelContext,
        options: WriteOptions,
    ) -> (Outcome<WriteSummary>, Vec<u8>) {
        let mut out = Vec::new();
        let outcome = write_label_to(tree, ctx, &mut out, Path::new("mem"), &options).unwrap();
        (outcome, out)
    }

    fn framed(tree: &mut LabelTree, bottom: bool) {
        tree.set_wrappers(Some(WrapperLabels {
            top: WrapperFraming {
                label_text: "CCSD3ZF0000100000001CCSD3KS0PDSX00000001".into(),
                begin_offset: 40,
                end_offset: -1,
            },
            bottom: bottom.then(|| WrapperFraming {
                label_text: "CCSD$$MARKER00000001".into(),
                begin_offset: 0,
                end_offset: 20,
            }),
        }));
    }

    #[test]
    fn stream_with_padding() {
        let tree = label("A = 1\nEND\n");
        let mut ctx = lf_context();
        let options = WriteOptions {
            request: RecordRequest::Stream,
            records_needed: 4,
        };
        let (outcome, bytes) = render(&tree, &mut ctx, options);
        assert_eq!(bytes, b"A = 1\nEND\n\n\n");
        assert_eq!(outcome.value().unwrap().records_written, 4);
        assert_eq!(ctx.records.written, 4);
    }

    #[test]
    fn fixed_from_label_metadata() {
        let tree = label("RECORD_TYPE = FIXED_LENGTH\nRECORD_BYTES = 16\nEND\n");
        let mut ctx = lf_context();
        let (outcome, bytes) = render(&tree, &mut ctx, WriteOptions::default());
        let summary = outcome.value().unwrap();
        assert_eq!(bytes.len() % 16, 0);
        assert_eq!(bytes.len() as u64, summary.bytes_written);
        assert!(bytes.starts_with(b"RECORD_TYPE = FIXED_LENGTH\nRECORD_BYTES = 16\nEND\n"));
        assert!(bytes.ends_with(b" "));
    }

    #[test]
    fn fixed_without_record_bytes_is_an_error() {
        let tree = label("RECORD_TYPE = FIXED_LENGTH\nEND\n");
        let mut ctx = lf_context();
        let (outcome, bytes) = render(&tree, &mut ctx, WriteOptions::default());
        assert_eq!(outcome, Outcome::Error);
        assert!(bytes.is_empty());
        assert!(ctx.diagnostics.iter().any(|d| d.id == codes::RECORD_BYTES_INVALID));
    }

    #[test]
    fn record_type_variants() {
        let mut ctx = lf_context();
        let tree = label("RECORD_TYPE = VARIABLE_LENGTH\nEND\n");
        assert_eq!(render(&tree, &mut ctx, WriteOptions::default()).0, Outcome::Error);
        let tree = label("RECORD_TYPE = SPIRAL\nEND\n");
        assert_eq!(render(&tree, &mut ctx, WriteOptions::default()).0, Outcome::Error);
        let ids: Vec<_> = ctx.diagnostics.iter().map(|d| d.id.to_string()).collect();
        assert_eq!(ids, vec![codes::RECORD_TYPE_UNSUPPORTED, codes::RECORD_TYPE_UNRECOGNIZED]);

        let mut ctx = lf_context();
        let tree = label("RECORD_TYPE = UNDEFINED\nEND\n");
        let (outcome, _) = render(&tree, &mut ctx, WriteOptions::default());
        assert!(outcome.value().unwrap().type_unknown);
    }

    #[test]
    fn settings_restored_after_failure() {
        let tree = label("RECORD_TYPE = FIXED_LENGTH\nRECORD_BYTES = 80\nEND\n");
        let mut ctx = lf_context();
        ctx.suppress_end = false;
        let (outcome, _) = render(&tree, &mut ctx, WriteOptions::default());
        assert!(outcome.status().is_ok());
        assert_eq!(ctx.config.record_bytes, 512);
        assert_eq!(ctx.config.terminator, Terminator::Lf);
        assert!(!ctx.suppress_end);

        let tree = label("RECORD_TYPE = SPIRAL\nEND\n");
        ctx.config.record_bytes = 77;
        render(&tree, &mut ctx, WriteOptions::default());
        assert_eq!(ctx.config.record_bytes, 77);
    }

    #[test]
    fn stream_bottom_wrapper_follows_end() {
        let mut tree = label("RECORD_TYPE = STREAM\nEND\n");
        framed(&mut tree, true);
        let mut ctx = lf_context();
        let (_, bytes) = render(&tree, &mut ctx, WriteOptions::default());
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "CCSD3ZF0000100000001CCSD3KS0PDSX00000001\nRECORD_TYPE = STREAM\nEND\nCCSD$$MARKER00000001\n"
        );
    }

    #[test]
    fn stream_without_bottom_still_ends() {
        let mut tree = label("RECORD_TYPE = STREAM\nEND\n");
        framed(&mut tree, false);
        let mut ctx = lf_context();
        let (_, bytes) = render(&tree, &mut ctx, WriteOptions::default());
        assert!(String::from_utf8(bytes).unwrap().ends_with("STREAM\nEND\n"));
    }

    #[test]
    fn unknown_type_omits_end() {
        let mut tree = label("A = 1\nEND\n");
        framed(&mut tree, true);
        let mut ctx = lf_context();
        let options = WriteOptions {
            request: RecordRequest::Label,
            records_needed: 5,
        };
        let (outcome, bytes) = render(&tree, &mut ctx, options);
        let summary = outcome.value().unwrap();
        assert_eq!(summary.records_written, 6);
        assert_eq!(summary.trailing_records, 1);
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains("END\n"));
        assert!(text.ends_with("A = 1\n\n\n\nCCSD$$MARKER00000001\n"));
    }

    #[test]
    fn fixed_bottom_is_last_record() {
        let mut tree = label("RECORD_TYPE = FIXED_LENGTH\nRECORD_BYTES = 32\nEND\n");
        framed(&mut tree, true);
        let mut ctx = lf_context();
        let options = WriteOptions {
            request: RecordRequest::Label,
            records_needed: 6,
        };
        let (outcome, bytes) = render(&tree, &mut ctx, options);
        assert_eq!(outcome.value().unwrap().records_written, 6);
        assert_eq!(bytes.len(), 6 * 32);
        let last = &bytes[5 * 32..];
        assert_eq!(&last[..12], b"            ");
        assert!(last.ends_with(b"CCSD$$MARKER00000001"));
        let text = String::from_utf8_lossy(&bytes);
        assert_eq!(text.matches("END\n").count(), 1);
    }

    #[test]
    fn overflow_is_reported() {
        let tree = label("A = 1\nB = 2\nC = 3\nEND\n");
        let mut ctx = lf_context();
        let options = WriteOptions {
            request: RecordRequest::Stream,
            records_needed: 2,
        };
        let (outcome, _) = render(&tree, &mut ctx, options);
        assert_eq!(outcome.status(), Status::Error);
        assert!(ctx.diagnostics.iter().any(|d| d.id == codes::RECORD_COUNT_OVERFLOW));
    }
}
