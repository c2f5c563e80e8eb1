mod logging;
mod render;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use odl_toolchain_core::format::format_parameter_value;
use odl_toolchain_core::grammar::dump::object_view;
use odl_toolchain_core::mutate::{add_parameter, change_value};
use odl_toolchain_core::{
    LabelContext, Lookup, ObjectQuery, Outcome, ParamKind, ParamQuery, ParsedLabel, RecordRequest,
    Status, WriteOptions, attach_data, emit_label, find_object, find_parameter, get_pointer,
    load_config_from_str, read_label_file, to_pretty_json, write_label,
};
use odl_toolchain_diagnostics::{self as diag, Diagnostic};
use serde_json::json;
use tracing::info;

use crate::logging::{LogConfig, init_logging};
use crate::render::{Format, print_summary, render_diagnostics_pretty};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "odl",
    version,
    about = "ODL toolchain: read, query, edit, and write PDS-style ODL labels"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Engine configuration (JSON). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG`
    /// takes precedence when set.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    // ── Reading ─────────────────────────────────────────────────────
    /// Parse a label file and print its tree.
    Parse { file: PathBuf },

    /// Find an object, or a parameter inside it.
    Find {
        file: PathBuf,
        #[command(flatten)]
        object: ObjectArgs,
        /// Parameter keyword to look up inside the matched object.
        #[arg(long)]
        param: Option<String>,
        /// 1-based ordinal among parameters named `--param`.
        #[arg(long, default_value_t = 0)]
        param_position: usize,
    },

    /// Decode a root-level data pointer.
    Pointer {
        file: PathBuf,
        /// Pointer name without `^`.
        name: String,
        /// 1-based ordinal among pointers with this name.
        #[arg(long, default_value_t = 0)]
        position: usize,
    },

    // ── Editing and writing ─────────────────────────────────────────
    /// Replace a parameter's value, adding the parameter when absent.
    Set {
        file: PathBuf,
        #[command(flatten)]
        object: ObjectArgs,
        /// Parameter keyword.
        #[arg(long)]
        param: String,
        /// New value in label syntax, e.g. `(1, 2)` or `"text"`.
        #[arg(long)]
        value: String,
        /// Create the parameter as a `^` pointer when it has to be added.
        #[arg(long)]
        pointer: bool,
        /// Write the edited label here instead of printing it.
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
    },

    /// Write a label under a record discipline.
    Write {
        file: PathBuf,
        #[arg(short = 'o', long = "out")]
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = RecordTypeArg::Label)]
        record_type: RecordTypeArg,
        /// Record length for `--record-type fixed`.
        #[arg(long)]
        record_bytes: Option<usize>,
        /// Pad the label to this many records.
        #[arg(long, default_value_t = 0)]
        records_needed: usize,
    },

    /// Write a label followed by a data file, fixing up attached pointers.
    Attach {
        label: PathBuf,
        data: PathBuf,
        #[arg(short = 'o', long = "out")]
        out: PathBuf,
        /// Bytes to skip at the start of the data file.
        #[arg(long, default_value_t = 0)]
        skip: u64,
        #[arg(long, value_enum, default_value_t = RecordTypeArg::Label)]
        record_type: RecordTypeArg,
    },

    // ── Reference ───────────────────────────────────────────────────
    /// Explain a diagnostic ID (e.g. ODL1002).
    Explain { id: String },
}

/// Object search keys shared by `find` and `set`.
#[derive(Args, Debug, Clone)]
struct ObjectArgs {
    /// Object class, e.g. IMAGE.
    #[arg(long)]
    class: Option<String>,
    /// Value of the object's NAME parameter.
    #[arg(long)]
    name: Option<String>,
    /// 1-based ordinal among objects matching the other keys.
    #[arg(long, default_value_t = 0)]
    position: usize,
}

impl ObjectArgs {
    fn query(&self) -> ObjectQuery {
        ObjectQuery {
            class: self.class.clone(),
            name: self.name.clone(),
            position: self.position,
        }
    }
}

/// Record discipline for `write` and `attach`.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum RecordTypeArg {
    /// Honor RECORD_TYPE / RECORD_BYTES in the label.
    Label,
    /// Terminated lines.
    Stream,
    /// Fixed-length, space-padded records.
    Fixed,
}

impl From<RecordTypeArg> for RecordRequest {
    fn from(arg: RecordTypeArg) -> Self {
        match arg {
            RecordTypeArg::Label => RecordRequest::Label,
            RecordTypeArg::Stream => RecordRequest::Stream,
            RecordTypeArg::Fixed => RecordRequest::Fixed,
        }
    }
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_verbosity(cli.verbose));
    let format = Format::resolve_or_detect(cli.output.as_deref());

    if let Err(err) = run(cli, format) {
        if format == Format::Json {
            let out = json!({
                "success": false,
                "error": "command_failed",
                "message": format!("{err:#}"),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            process::exit(1);
        }
        return Err(err);
    }
    Ok(())
}

fn run(cli: Cli, format: Format) -> Result<()> {
    let mut ctx = load_context(cli.config.as_deref())?;

    match cli.cmd {
        Cmd::Parse { file } => cmd_parse(&file, &mut ctx, format),
        Cmd::Find {
            file,
            object,
            param,
            param_position,
        } => cmd_find(&file, &mut ctx, &object, param, param_position, format),
        Cmd::Pointer {
            file,
            name,
            position,
        } => cmd_pointer(&file, &mut ctx, &name, position, format),
        Cmd::Set {
            file,
            object,
            param,
            value,
            pointer,
            out,
        } => {
            let kind = if pointer {
                ParamKind::Pointer
            } else {
                ParamKind::Keyword
            };
            let edit = Edit {
                object: object.query(),
                param,
                value,
                kind,
            };
            cmd_set(&file, &mut ctx, &edit, out.as_deref(), format)
        }
        Cmd::Write {
            file,
            out,
            record_type,
            record_bytes,
            records_needed,
        } => {
            if let Some(n) = record_bytes {
                ctx.config.record_bytes = n;
            }
            let options = WriteOptions {
                request: record_type.into(),
                records_needed,
            };
            cmd_write(&file, &out, &mut ctx, &options, format)
        }
        Cmd::Attach {
            label,
            data,
            out,
            skip,
            record_type,
        } => {
            let options = WriteOptions {
                request: record_type.into(),
                records_needed: 0,
            };
            cmd_attach(&label, &data, &out, skip, &mut ctx, &options, format)
        }
        Cmd::Explain { id } => cmd_explain(&id, format),
    }
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_parse(file: &Path, ctx: &mut LabelContext, format: Format) -> Result<()> {
    let Some(parsed) = load_label(file, ctx)? else {
        return report_unreadable(file, ctx, format);
    };
    let diagnostics = ctx.diagnostics.take();

    match format {
        Format::Json => {
            let root = parsed.tree.root().and_then(|r| object_view(&parsed.tree, r));
            let out = json!({
                "label": root,
                "wrappers": parsed.tree.wrappers(),
                "counts": parsed.counts,
                "diagnostics": diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            println!("{}", to_pretty_json(&parsed.tree));
            render_diagnostics_pretty(&parsed.source, &file.display().to_string(), &diagnostics);
            print_summary(&diagnostics);
        }
    }

    exit_on_failure(Status::Success, &diagnostics);
    Ok(())
}

fn cmd_find(
    file: &Path,
    ctx: &mut LabelContext,
    object: &ObjectArgs,
    param: Option<String>,
    param_position: usize,
    format: Format,
) -> Result<()> {
    let Some(parsed) = load_label(file, ctx)? else {
        return report_unreadable(file, ctx, format);
    };
    let tree = &parsed.tree;
    let root = tree.root().context("label has no root object")?;

    let (status, found) = match param {
        Some(name) => {
            let query = ParamQuery {
                object: object.query(),
                name: Some(name),
                position: param_position,
            };
            let lookup = find_parameter(tree, ctx, root, &query);
            let found = lookup.first().and_then(|pid| tree.param(pid)).map(|p| {
                let owner = tree.object(p.owner()).map(|o| o.class().to_string());
                json!({
                    "name": p.name(),
                    "kind": p.kind(),
                    "value": format_parameter_value(p),
                    "owner_class": owner,
                })
            });
            if format == Format::Pretty
                && let Some(p) = lookup.first().and_then(|pid| tree.param(pid))
            {
                let caret = if p.kind() == ParamKind::Pointer { "^" } else { "" };
                println!("{caret}{} = {}", p.name(), format_parameter_value(p));
            }
            (lookup.status(), found)
        }
        None => {
            let lookup = find_object(tree, ctx, root, &object.query());
            let view = lookup.first().and_then(|id| object_view(tree, id));
            if format == Format::Pretty
                && let Some(v) = &view
            {
                println!("{}", serde_json::to_string_pretty(v)?);
            }
            (lookup.status(), view.map(|v| json!(v)))
        }
    };

    let diagnostics = ctx.diagnostics.take();
    report(
        format,
        file,
        &parsed.source,
        status,
        json!({ "match": found }),
        &diagnostics,
    )
}

fn cmd_pointer(
    file: &Path,
    ctx: &mut LabelContext,
    name: &str,
    position: usize,
    format: Format,
) -> Result<()> {
    let Some(parsed) = load_label(file, ctx)? else {
        return report_unreadable(file, ctx, format);
    };
    let outcome = get_pointer(&parsed.tree, ctx, name, position);
    let status = outcome.status();
    // Several pointers with this name: show the first, exit non-zero.
    let desc = outcome.value_or_first();
    if format == Format::Pretty
        && let Some(desc) = &desc
    {
        println!("^{} = {}", desc.name, desc.encode());
    }
    let diagnostics = ctx.diagnostics.take();
    report(
        format,
        file,
        &parsed.source,
        status,
        json!({ "pointer": desc }),
        &diagnostics,
    )
}

/// One `set` request.
struct Edit {
    object: ObjectQuery,
    param: String,
    value: String,
    kind: ParamKind,
}

fn cmd_set(
    file: &Path,
    ctx: &mut LabelContext,
    edit: &Edit,
    out: Option<&Path>,
    format: Format,
) -> Result<()> {
    let Some(mut parsed) = load_label(file, ctx)? else {
        return report_unreadable(file, ctx, format);
    };
    let tree = &mut parsed.tree;
    let root = tree.root().context("label has no root object")?;
    let query = ParamQuery {
        object: edit.object.clone(),
        name: Some(edit.param.clone()),
        position: 0,
    };

    let mut status = match find_parameter(tree, ctx, root, &query) {
        Lookup::NotFound => {
            info!(param = %edit.param, "adding parameter");
            add_parameter(tree, ctx, &edit.object, &edit.param, edit.kind, &edit.value)?.status()
        }
        _ => change_value(tree, ctx, &query, &edit.value)?.status(),
    };

    let mut payload = json!({});
    if status.is_ok() {
        match out {
            Some(path) => {
                let written = write_label(tree, ctx, path, &WriteOptions::default())
                    .with_context(|| format!("failed to write {}", path.display()))?;
                if !written.status().is_ok() {
                    status = written.status();
                }
                payload = json!({ "out": path, "summary": written.as_value() });
            }
            None => {
                let text = emit_label(tree, &ctx.config.emit);
                if format == Format::Pretty {
                    print!("{text}");
                }
                payload = json!({ "label": text });
            }
        }
    }

    let diagnostics = ctx.diagnostics.take();
    report(format, file, &parsed.source, status, payload, &diagnostics)
}

fn cmd_write(
    file: &Path,
    out: &Path,
    ctx: &mut LabelContext,
    options: &WriteOptions,
    format: Format,
) -> Result<()> {
    let Some(parsed) = load_label(file, ctx)? else {
        return report_unreadable(file, ctx, format);
    };
    let outcome = write_label(&parsed.tree, ctx, out, options)
        .with_context(|| format!("failed to write {}", out.display()))?;
    if format == Format::Pretty
        && let Some(summary) = outcome.as_value()
    {
        eprintln!(
            "wrote {} records ({} bytes) to {}",
            summary.records_written,
            summary.bytes_written,
            out.display()
        );
    }
    let diagnostics = ctx.diagnostics.take();
    report(
        format,
        file,
        &parsed.source,
        outcome.status(),
        json!({ "out": out, "summary": outcome.as_value() }),
        &diagnostics,
    )
}

fn cmd_attach(
    label: &Path,
    data: &Path,
    out: &Path,
    skip: u64,
    ctx: &mut LabelContext,
    options: &WriteOptions,
    format: Format,
) -> Result<()> {
    let Some(mut parsed) = load_label(label, ctx)? else {
        return report_unreadable(label, ctx, format);
    };
    let outcome = attach_data(&mut parsed.tree, ctx, out, data, skip, options)
        .with_context(|| format!("failed to attach {} to {}", data.display(), out.display()))?;
    if format == Format::Pretty
        && let Some(summary) = outcome.as_value()
    {
        eprintln!(
            "wrote {} label records and {} bytes in total to {}",
            summary.records_written,
            summary.bytes_written,
            out.display()
        );
    }
    let diagnostics = ctx.diagnostics.take();
    report(
        format,
        label,
        &parsed.source,
        outcome.status(),
        json!({ "out": out, "summary": outcome.as_value() }),
        &diagnostics,
    )
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let out = json!({
                "id": id,
                "explanation": diag::explain(id),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            if let Some(text) = diag::explain(id) {
                use ariadne::Fmt;
                println!("{}: {}", id.fg(ariadne::Color::Cyan), text);
            } else {
                println!("{}: (no explanation available)", id);
            }
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Build the context, loading `--config` when given.
fn load_context(config: Option<&Path>) -> Result<LabelContext> {
    let Some(path) = config else {
        return Ok(LabelContext::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = load_config_from_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(LabelContext::new(config))
}

/// Read a label file. `None` when its wrapper framing is unusable; the
/// reasons are in the context's diagnostics.
fn load_label(path: &Path, ctx: &mut LabelContext) -> Result<Option<ParsedLabel>> {
    let outcome = read_label_file(path, ctx)
        .with_context(|| format!("failed to read label {}", path.display()))?;
    Ok(match outcome {
        Outcome::Done(parsed) | Outcome::Warning(parsed, _) => Some(parsed),
        Outcome::Ambiguous { .. } | Outcome::Error => None,
    })
}

fn report_unreadable(file: &Path, ctx: &mut LabelContext, format: Format) -> Result<()> {
    let diagnostics = ctx.diagnostics.take();
    report(format, file, "", Status::Error, json!({}), &diagnostics)
}

/// Print the command result and diagnostics, then exit non-zero on failure.
///
/// JSON mode merges `payload`'s fields into one object next to `status` and
/// `diagnostics`; pretty mode prints diagnostics to stderr (the command has
/// already printed its stdout output).
fn report(
    format: Format,
    file: &Path,
    source: &str,
    status: Status,
    payload: serde_json::Value,
    diagnostics: &[Diagnostic],
) -> Result<()> {
    match format {
        Format::Json => {
            let mut out = json!({ "status": status, "diagnostics": diagnostics });
            if let (Some(obj), serde_json::Value::Object(extra)) = (out.as_object_mut(), payload) {
                obj.extend(extra);
            }
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            render_diagnostics_pretty(source, &file.display().to_string(), diagnostics);
            print_summary(diagnostics);
            if status != Status::Success {
                eprintln!("status: {}", json!(status).as_str().unwrap_or("unknown"));
            }
        }
    }
    exit_on_failure(status, diagnostics);
    Ok(())
}

/// Exit with code 1 unless `status` is success or warning and no error
/// diagnostic was produced.
fn exit_on_failure(status: Status, diagnostics: &[Diagnostic]) {
    if !status.is_ok() || diagnostics.iter().any(|d| d.severity.is_error()) {
        process::exit(1);
    }
}
