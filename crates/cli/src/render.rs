//! Pretty diagnostic rendering using ariadne.
//!
//! Converts the toolchain's [`Diagnostic`] type into ariadne [`Report`]s for
//! coloured, source-annotated terminal output. Falls back to structured JSON
//! when the output is piped or when the user explicitly requests it.

use std::io::{self, IsTerminal};

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use odl_toolchain_diagnostics::{Diagnostic, Severity};

// ── Output format ───────────────────────────────────────────────────────

/// Output format for command results and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Coloured, source-annotated output (ariadne).
    Pretty,
    /// Machine-readable JSON.
    Json,
}

impl Format {
    /// Use the explicit choice, else pretty on a TTY and JSON on a pipe.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            _ => {
                if io::stdout().is_terminal() {
                    Format::Pretty
                } else {
                    Format::Json
                }
            }
        }
    }
}

// ── Severity mapping ────────────────────────────────────────────────────

fn report_kind(severity: &Severity) -> ReportKind<'static> {
    match severity {
        Severity::Error | Severity::Fatal => ReportKind::Error,
        Severity::Warn => ReportKind::Warning,
        Severity::Info => ReportKind::Advice,
        _ => ReportKind::Warning,
    }
}

fn severity_color(severity: &Severity) -> Color {
    match severity {
        Severity::Error | Severity::Fatal => Color::Red,
        Severity::Warn => Color::Yellow,
        Severity::Info => Color::Blue,
        _ => Color::White,
    }
}

fn context_note(diag: &Diagnostic) -> Option<String> {
    let ctx = diag.context.as_ref().filter(|c| !c.is_empty())?;
    Some(
        ctx.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

// ── Pretty rendering ────────────────────────────────────────────────────

/// Render diagnostics in pretty (ariadne) format to stderr.
///
/// Diagnostics with a span are rendered with source context; the rest as
/// standalone messages. Continuation entries are indented under the message
/// they extend.
pub(crate) fn render_diagnostics_pretty(source: &str, filename: &str, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }

    let config = Config::default().with_compact(false);
    let mut cache = (filename, Source::from(source));

    for diag in diagnostics {
        if matches!(diag.severity, Severity::Continue) {
            eprintln!("    {}", diag.message);
            continue;
        }
        if let Some(span) = &diag.span {
            // Clamp span to source length to avoid panics on truncated input.
            let start = span.start.min(source.len());
            let end = span.end.min(source.len()).max(start);

            let mut builder = Report::build(report_kind(&diag.severity), (filename, start..end))
                .with_code(diag.id.as_ref())
                .with_message(&diag.message)
                .with_config(config);

            builder = builder.with_label(
                Label::new((filename, start..end))
                    .with_message(context_note(diag).unwrap_or_else(|| diag.message.clone()))
                    .with_color(severity_color(&diag.severity)),
            );
            if let Some(explanation) = diag.explain() {
                builder = builder.with_help(explanation);
            }

            builder.finish().eprint(&mut cache).ok();
        } else {
            let kind_str = match diag.severity {
                Severity::Error | Severity::Fatal => "error",
                Severity::Warn => "warning",
                Severity::Info => "info",
                _ => "diagnostic",
            };
            eprintln!("{kind_str}[{}]: {}", diag.id, diag.message);

            if let Some(note) = context_note(diag) {
                eprintln!("  = note: {note}");
            }
            if let Some(explanation) = diag.explain() {
                eprintln!("  = help: {explanation}");
            }
        }
    }
}

// ── Summary line ────────────────────────────────────────────────────────

/// Print a coloured summary line showing error/warning/info counts.
///
/// Example: `2 errors, 1 warning`
pub(crate) fn print_summary(diagnostics: &[Diagnostic]) {
    use ariadne::Fmt;

    let (mut errors, mut warnings, mut infos) = (0usize, 0usize, 0usize);
    for d in diagnostics {
        match d.severity {
            Severity::Error | Severity::Fatal => errors += 1,
            Severity::Warn => warnings += 1,
            Severity::Info => infos += 1,
            _ => {}
        }
    }

    if errors + warnings + infos == 0 {
        return;
    }

    let mut parts = Vec::new();
    if errors > 0 {
        let s = if errors == 1 { "" } else { "s" };
        parts.push(format!("{}", format!("{errors} error{s}").fg(Color::Red)));
    }
    if warnings > 0 {
        let s = if warnings == 1 { "" } else { "s" };
        parts.push(format!(
            "{}",
            format!("{warnings} warning{s}").fg(Color::Yellow)
        ));
    }
    if infos > 0 {
        parts.push(format!("{}", format!("{infos} info").fg(Color::Blue)));
    }
    eprintln!("{}", parts.join(", "));
}
