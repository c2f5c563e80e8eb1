//! Mutator: structural and value edits addressed by search keys.
//!
//! Every edit locates its target through the locator first. An ambiguous
//! or missing target is reported and nothing changes; an ambiguous result
//! names the first candidate so the caller can narrow the keys. Fetches on
//! an ambiguous target read the first candidate.

use odl_toolchain_diagnostics::{Diagnostic, codes};
use tracing::debug;

use crate::LabelError;
use crate::context::LabelContext;
use crate::format::format_values;
use crate::grammar::parser::parse_into;
use crate::locate::{ObjectQuery, ParamQuery, find_object, find_parameter};
use crate::status::{Lookup, Outcome};
use crate::tree::{AggregateKind, LabelTree, ObjectId, ParamId, ParamKind, Value, ValueShape};

/// Keyword of the synthetic statement used to validate replacement text.
const SCRATCH_KEYWORD: &str = "__VALUE__";

/// A value list validated by the grammar.
#[derive(Debug)]
struct ParsedValues {
    shape: ValueShape,
    columns: usize,
    values: Vec<Value>,
    diagnostics: Vec<Diagnostic>,
}

fn refuse<T: Copy, U>(lookup: Lookup<T>) -> Outcome<U, T> {
    match lookup {
        Lookup::Ambiguous { first, kind } => Outcome::Ambiguous { first, kind },
        Lookup::Found(_) | Lookup::NotFound => Outcome::Error,
    }
}

fn locate_object(tree: &LabelTree, ctx: &LabelContext, query: &ObjectQuery) -> Lookup<ObjectId> {
    match tree.root() {
        Some(root) => find_object(tree, ctx, root, query),
        None => Lookup::NotFound,
    }
}

fn locate_param(tree: &LabelTree, ctx: &LabelContext, query: &ParamQuery) -> Lookup<ParamId> {
    match tree.root() {
        Some(root) => find_parameter(tree, ctx, root, query),
        None => Lookup::NotFound,
    }
}

/// Run `text` through the grammar as the right-hand side of a throwaway
/// statement. `None` means the text was rejected and diagnostics explain why.
fn parse_value_text(ctx: &mut LabelContext, text: &str) -> Result<Option<ParsedValues>, LabelError> {
    let mark = ctx.diagnostics.len();
    let mut scratch = LabelTree::new();
    let Some(root) = scratch.root() else {
        return Ok(None);
    };
    let source = format!("{SCRATCH_KEYWORD} = {text}\nEND\n");
    let counts = parse_into(&mut scratch, root, &source, &mut ctx.diagnostics)?;
    if counts.errors > 0 {
        return Ok(None);
    }

    let only_value = scratch.object(root).and_then(|r| match (r.params(), r.children()) {
        ([pid], []) => Some(*pid),
        _ => None,
    });
    let Some(param) = only_value
        .and_then(|pid| scratch.param_mut(pid))
        .filter(|p| p.name == SCRATCH_KEYWORD)
    else {
        ctx.diagnostics.push(Diagnostic::error(
            codes::VALUE_SHAPE_INVALID,
            format!("'{text}' is not a single value or value list"),
            None,
        ));
        return Ok(None);
    };
    Ok(Some(ParsedValues {
        shape: param.shape,
        columns: param.columns,
        values: std::mem::take(&mut param.values),
        diagnostics: ctx.diagnostics.since(mark).to_vec(),
    }))
}

// ── Additions ───────────────────────────────────────────────────────────

/// Append a new, empty aggregate under the object matched by `parent`.
pub fn add_object(
    tree: &mut LabelTree,
    ctx: &LabelContext,
    parent: &ObjectQuery,
    class: &str,
    kind: AggregateKind,
) -> Result<Outcome<ObjectId>, LabelError> {
    let parent_id = match locate_object(tree, ctx, parent) {
        Lookup::Found(id) => id,
        other => return Ok(refuse(other)),
    };
    let id = tree.append_object(parent_id, class, kind)?;
    debug!(class, ?id, "added object");
    Ok(Outcome::Done(id))
}

/// Append `name = value_text` to the object matched by `owner`.
///
/// An ambiguous owner is reported with the first matching object. The value text is validated by the grammar first; on a parse error
/// nothing is appended.
pub fn add_parameter(
    tree: &mut LabelTree,
    ctx: &mut LabelContext,
    owner: &ObjectQuery,
    name: &str,
    kind: ParamKind,
    value_text: &str,
) -> Result<Outcome<ParamId, ObjectId>, LabelError> {
    let owner_id = match locate_object(tree, ctx, owner) {
        Lookup::Found(id) => id,
        other => return Ok(refuse(other)),
    };
    let Some(parsed) = parse_value_text(ctx, value_text)? else {
        return Ok(Outcome::Error);
    };
    let id = tree.append_parameter(owner_id, name, kind)?;
    tree.set_values(id, parsed.shape, parsed.columns, parsed.values);
    debug!(name, ?id, "added parameter");
    Ok(Outcome::with_diagnostics(id, parsed.diagnostics))
}

// ── Edits ───────────────────────────────────────────────────────────────

/// Replace the value list of the matched parameter with `text`, in place.
///
/// Sibling position and kind are untouched. Grammar warnings turn the
/// result into `Warning`; grammar errors leave the parameter unchanged and
/// return `Error`.
pub fn change_value(
    tree: &mut LabelTree,
    ctx: &mut LabelContext,
    query: &ParamQuery,
    text: &str,
) -> Result<Outcome<ParamId>, LabelError> {
    let pid = match locate_param(tree, ctx, query) {
        Lookup::Found(id) => id,
        other => return Ok(refuse(other)),
    };
    let Some(parsed) = parse_value_text(ctx, text)? else {
        debug!(?pid, "replacement value rejected");
        return Ok(Outcome::Error);
    };
    tree.set_values(pid, parsed.shape, parsed.columns, parsed.values);
    debug!(?pid, "changed value");
    Ok(Outcome::with_diagnostics(pid, parsed.diagnostics))
}

/// Move the matched parameter to 1-based `position` among its owner's
/// parameters. 0 is treated as 1; past the end appends.
pub fn move_parameter(
    tree: &mut LabelTree,
    ctx: &LabelContext,
    query: &ParamQuery,
    position: usize,
) -> Outcome<ParamId> {
    let pid = match locate_param(tree, ctx, query) {
        Lookup::Found(id) => id,
        other => return refuse(other),
    };
    if tree.reposition_parameter(pid, position.saturating_sub(1)) {
        Outcome::Done(pid)
    } else {
        Outcome::Error
    }
}

/// Remove the matched object and its subtree. Yields the former parent, or
/// `None` when the root itself was removed (the tree is then empty).
pub fn remove_object(
    tree: &mut LabelTree,
    ctx: &LabelContext,
    query: &ObjectQuery,
) -> Outcome<Option<ObjectId>, ObjectId> {
    let id = match locate_object(tree, ctx, query) {
        Lookup::Found(id) => id,
        other => return refuse(other),
    };
    match tree.remove_object(id) {
        Some(parent) => {
            debug!(?id, "removed object");
            Outcome::Done(parent)
        }
        None => Outcome::Error,
    }
}

/// Remove the matched parameter. Yields its former owner.
pub fn remove_parameter(
    tree: &mut LabelTree,
    ctx: &LabelContext,
    query: &ParamQuery,
) -> Outcome<ObjectId, ParamId> {
    let pid = match locate_param(tree, ctx, query) {
        Lookup::Found(id) => id,
        other => return refuse(other),
    };
    match tree.remove_parameter(pid) {
        Some(owner) => Outcome::Done(owner),
        None => Outcome::Error,
    }
}

/// Rename the class of the matched object.
pub fn change_object_class(
    tree: &mut LabelTree,
    ctx: &LabelContext,
    query: &ObjectQuery,
    class: &str,
) -> Outcome<ObjectId> {
    let id = match locate_object(tree, ctx, query) {
        Lookup::Found(id) => id,
        other => return refuse(other),
    };
    match tree.object_mut(id) {
        Some(obj) => {
            obj.class = class.to_string();
            Outcome::Done(id)
        }
        None => Outcome::Error,
    }
}

/// Rename the matched parameter.
pub fn change_parameter_name(
    tree: &mut LabelTree,
    ctx: &LabelContext,
    query: &ParamQuery,
    name: &str,
) -> Outcome<ParamId> {
    let pid = match locate_param(tree, ctx, query) {
        Lookup::Found(id) => id,
        other => return refuse(other),
    };
    match tree.param_mut(pid) {
        Some(param) => {
            param.name = name.to_string();
            Outcome::Done(pid)
        }
        None => Outcome::Error,
    }
}

// ── Fetches ─────────────────────────────────────────────────────────────

/// Formatted text of the 1-based `index`-th value of the matched parameter.
pub fn fetch_value(
    tree: &LabelTree,
    ctx: &LabelContext,
    query: &ParamQuery,
    index: usize,
) -> Outcome<String> {
    Outcome::from_lookup(locate_param(tree, ctx, query), |pid| {
        let value = tree.param(pid)?.values().get(index.checked_sub(1)?)?;
        Some(value.to_string())
    })
}

/// Formatted text of every value of the matched parameter.
pub fn fetch_all_values(
    tree: &LabelTree,
    ctx: &LabelContext,
    query: &ParamQuery,
) -> Outcome<Vec<String>> {
    Outcome::from_lookup(locate_param(tree, ctx, query), |pid| {
        Some(tree.param(pid)?.values().iter().map(Value::to_string).collect())
    })
}

/// Values of the matched parameter grouped into rows of `columns` values.
/// A parameter that is not two-dimensional yields a single row.
pub fn fetch_value_rows(
    tree: &LabelTree,
    ctx: &LabelContext,
    query: &ParamQuery,
) -> Outcome<Vec<Vec<String>>> {
    Outcome::from_lookup(locate_param(tree, ctx, query), |pid| {
        let param = tree.param(pid)?;
        let text: Vec<String> = param.values().iter().map(Value::to_string).collect();
        let width = match param.columns() {
            0 => text.len().max(1),
            n => n,
        };
        Some(text.chunks(width).map(<[String]>::to_vec).collect())
    })
}

/// Right-hand side of the matched parameter as label text.
pub fn fetch_value_text(tree: &LabelTree, ctx: &LabelContext, query: &ParamQuery) -> Outcome<String> {
    Outcome::from_lookup(locate_param(tree, ctx, query), |pid| {
        let p = tree.param(pid)?;
        Some(format_values(p.shape(), p.columns(), p.values()))
    })
}
