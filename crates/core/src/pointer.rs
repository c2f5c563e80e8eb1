//! Pointer codec: the four textual pointer forms and offset fix-up.
//!
//! | Form                  | Attached | Byte-located |
//! |-----------------------|----------|--------------|
//! | `N`                   | yes      | no           |
//! | `N <BYTES>`           | yes      | yes          |
//! | `("file", N)`         | no       | no           |
//! | `("file", N <BYTES>)` | no       | yes          |
//!
//! Locations are 1-based records or 1-based bytes.

use odl_toolchain_diagnostics::{Diagnostic, codes};
use serde::Serialize;
use tracing::{debug, warn};

use crate::LabelError;
use crate::context::LabelContext;
use crate::locate::{ObjectQuery, ParamQuery, find_parameter};
use crate::mutate::{add_parameter, change_value};
use crate::status::{Lookup, Outcome};
use crate::tree::{LabelTree, ParamKind, Parameter, Value, ValueData, ValueShape};

/// Decoded pointer statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointerDescriptor {
    /// Pointer keyword without `^`.
    pub name: String,
    /// External file; `None` for data attached to the label's own file.
    pub file_name: Option<String>,
    /// 1-based record or byte offset.
    pub location: i64,
    /// `true` when `location` counts bytes.
    pub has_byte_location: bool,
}

impl PointerDescriptor {
    /// Record-located pointer into the label's own file.
    pub fn attached(name: impl Into<String>, location: i64) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            location,
            has_byte_location: false,
        }
    }

    /// Record-located pointer into another file.
    pub fn detached(name: impl Into<String>, file_name: impl Into<String>, location: i64) -> Self {
        Self {
            name: name.into(),
            file_name: Some(file_name.into()),
            location,
            has_byte_location: false,
        }
    }

    /// Count `location` in bytes instead of records.
    pub fn in_bytes(mut self) -> Self {
        self.has_byte_location = true;
        self
    }

    /// Whether the data lives in the label's own file.
    pub fn is_attached(&self) -> bool {
        self.file_name.is_none()
    }

    /// Right-hand side text in one of the four forms.
    pub fn encode(&self) -> String {
        let units = if self.has_byte_location { " <BYTES>" } else { "" };
        match &self.file_name {
            None => format!("{}{units}", self.location),
            Some(file) => format!("(\"{file}\", {}{units})", self.location),
        }
    }

    /// Decode a pointer parameter's values. `None` when the values fit none
    /// of the four forms.
    pub fn decode(param: &Parameter) -> Option<Self> {
        let values = param.values();
        let (file_name, located) = match values.first().map(|v| &v.data) {
            Some(ValueData::Integer(_)) => (None, values.first()),
            Some(ValueData::String(file) | ValueData::Symbol(file)) => {
                (Some(file.clone()), values.get(1))
            }
            _ => return None,
        };
        if values.len() > 2 || (file_name.is_none() && values.len() > 1) {
            return None;
        }
        let (location, has_byte_location) = match located {
            Some(v) => (v.as_integer()?, v.has_byte_units()),
            None => (1, false),
        };
        Some(Self {
            name: param.name().to_string(),
            file_name,
            location,
            has_byte_location,
        })
    }
}

fn root_pointer_query(name: &str, position: usize) -> ParamQuery {
    ParamQuery::named(name)
        .in_object(ObjectQuery::any())
        .position(position)
}

/// Decode the root-level pointer `name` (1-based `position` among pointers
/// of that name; 0 for "the only one"). When several pointers match, the
/// first one is decoded and returned as the ambiguous candidate.
pub fn get_pointer(
    tree: &LabelTree,
    ctx: &mut LabelContext,
    name: &str,
    position: usize,
) -> Outcome<PointerDescriptor> {
    let Some(root) = tree.root() else {
        return Outcome::Error;
    };
    let lookup = find_parameter(tree, ctx, root, &root_pointer_query(name, position));
    let Some(param) = lookup
        .first()
        .and_then(|pid| tree.param(pid))
        .filter(|p| p.kind() == ParamKind::Pointer)
    else {
        return Outcome::Error;
    };
    let Some(desc) = PointerDescriptor::decode(param) else {
        ctx.diagnostics.push(
            Diagnostic::error(
                codes::POINTER_MALFORMED,
                format!("^{name} is not in any pointer form"),
                None,
            )
            .with_context(
                [("pointer".to_string(), name.to_string())]
                    .into_iter()
                    .collect(),
            ),
        );
        return Outcome::Error;
    };
    match lookup {
        Lookup::Ambiguous { kind, .. } => Outcome::Ambiguous { first: desc, kind },
        _ => Outcome::Done(desc),
    }
}

/// Write `desc` into the root-level pointer of the same name, appending a
/// new pointer statement when none exists.
pub fn replace_pointer(
    tree: &mut LabelTree,
    ctx: &mut LabelContext,
    desc: &PointerDescriptor,
) -> Result<Outcome<()>, LabelError> {
    let text = desc.encode();
    let Some(root) = tree.root() else {
        return Ok(Outcome::Error);
    };
    let query = root_pointer_query(&desc.name, 1);
    let outcome = match find_parameter(tree, ctx, root, &query) {
        Lookup::NotFound => add_parameter(
            tree,
            ctx,
            &ObjectQuery::any(),
            &desc.name,
            ParamKind::Pointer,
            &text,
        )?
        .erase(),
        _ => change_value(tree, ctx, &query, &text)?.erase(),
    };
    debug!(name = %desc.name, %text, status = ?outcome.status(), "replaced pointer");
    Ok(outcome)
}

/// Shift attached pointers after the label grew or shrank from `old` to
/// `new` records.
///
/// `LABEL_RECORDS` (when present) becomes `new` and `FILE_RECORDS` (when
/// present) moves by the same delta. Record-located attached pointers move
/// by the delta; byte-located ones by the delta times `RECORD_BYTES`, or by
/// the bare delta when the label has no usable `RECORD_BYTES`. Detached
/// pointers are left alone. A pointer that cannot be rewritten (including
/// one whose new location would overflow) is reported and skipped; the
/// result is then `Error`. The count of shifted pointers is
/// returned.
pub fn adjust_pointers(
    tree: &mut LabelTree,
    ctx: &mut LabelContext,
    old: i64,
    new: i64,
) -> Outcome<usize> {
    let Some(root) = tree.root() else {
        return Outcome::Error;
    };
    // `None` when the shift itself does not fit; every dependent rewrite
    // then fails individually.
    let delta = new.checked_sub(old);
    let mut failed = false;

    if let Some(pid) = tree.param_named(root, "LABEL_RECORDS") {
        tree.set_values(pid, ValueShape::Scalar, 0, vec![Value::integer(new)]);
    }
    if let Some(pid) = tree.param_named(root, "FILE_RECORDS") {
        let shifted = tree
            .param(pid)
            .and_then(|p| p.values().first()?.as_integer())
            .and_then(|n| n.checked_add(delta?));
        match shifted {
            Some(n) => {
                tree.set_values(pid, ValueShape::Scalar, 0, vec![Value::integer(n)]);
            }
            None => {
                failed = true;
                report_failure(ctx, "FILE_RECORDS");
            }
        }
    }
    let record_bytes = tree
        .param_named(root, "RECORD_BYTES")
        .and_then(|pid| tree.param(pid)?.values().first()?.as_integer())
        .filter(|&n| n > 0)
        .unwrap_or(1);

    let pointers: Vec<_> = tree
        .object(root)
        .map(|r| r.params().to_vec())
        .unwrap_or_default()
        .into_iter()
        .filter(|&pid| tree.param(pid).is_some_and(|p| p.kind() == ParamKind::Pointer))
        .collect();
    let mut shifted = 0;
    for pid in pointers {
        let Some(param) = tree.param_mut(pid) else {
            continue;
        };
        let Some(desc) = PointerDescriptor::decode(param) else {
            failed = true;
            let name = param.name.clone();
            report_failure(ctx, &name);
            continue;
        };
        if !desc.is_attached() {
            continue;
        }
        let location = delta
            .and_then(|d| {
                if desc.has_byte_location {
                    d.checked_mul(record_bytes)
                } else {
                    Some(d)
                }
            })
            .and_then(|step| desc.location.checked_add(step));
        let Some(location) = location else {
            failed = true;
            let name = param.name.clone();
            report_failure(ctx, &name);
            continue;
        };
        // Attached forms carry the location as the only value; keep its units.
        if let Some(value) = param.values.first_mut() {
            value.data = ValueData::Integer(location);
            shifted += 1;
        }
    }

    debug!(old, new, shifted, "adjusted pointers");
    if failed {
        Outcome::Error
    } else {
        Outcome::Done(shifted)
    }
}

fn report_failure(ctx: &mut LabelContext, name: &str) {
    warn!(name, "pointer update failed");
    ctx.diagnostics.push(Diagnostic::error(
        codes::POINTER_UPDATE_FAILED,
        format!("could not rewrite {name} while adjusting pointers"),
        None,
    ));
}
