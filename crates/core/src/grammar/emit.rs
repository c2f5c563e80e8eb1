//! Label emitter: walks a tree depth-first and produces statements.
//!
//! Statements go through a [`StatementSink`] so the same walk feeds both the
//! in-memory renderer ([`emit_label`]) and the record writer, which applies
//! terminators and fixed-length padding per statement.

use serde::{Deserialize, Serialize};

use crate::LabelError;
use crate::format::format_parameter_value;
use crate::tree::{LabelTree, Object, ObjectId, ParamKind};

// ── Configuration ───────────────────────────────────────────────────────

/// Layout options for emitted statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmitConfig {
    /// Spaces per nesting level.
    pub indent_width: usize,
    /// Column at which `=` is aligned; 0 disables alignment.
    pub align_column: usize,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            indent_width: 2,
            align_column: 0,
        }
    }
}

// ── Sink ────────────────────────────────────────────────────────────────

/// Receiver of emitted statements, one call per line without terminator.
pub trait StatementSink {
    /// Accept one statement.
    fn statement(&mut self, line: &str) -> Result<(), LabelError>;
}

/// Collects statements separated by `\n`.
impl StatementSink for String {
    fn statement(&mut self, line: &str) -> Result<(), LabelError> {
        self.try_reserve(line.len() + 1)?;
        self.push_str(line);
        self.push('\n');
        Ok(())
    }
}

// ── Public API ──────────────────────────────────────────────────────────

/// Emit the subtree at `start` into `sink`.
///
/// The document root contributes only its contents; any other object is
/// wrapped in its `OBJECT`/`GROUP` block. `END` follows unless
/// `suppress_end` is set.
pub fn emit_tree(
    tree: &LabelTree,
    start: ObjectId,
    config: &EmitConfig,
    suppress_end: bool,
    sink: &mut dyn StatementSink,
) -> Result<(), LabelError> {
    if let Some(obj) = tree.object(start) {
        let emitter = Emitter { tree, config };
        if obj.parent().is_none() {
            emitter.contents(obj, 0, sink)?;
        } else {
            emitter.block(start, 0, sink)?;
        }
    }
    if !suppress_end {
        sink.statement("END")?;
    }
    Ok(())
}

/// Render a whole label as `\n`-separated text ending with `END`.
///
/// An empty tree (root removed) renders as the empty string.
pub fn emit_label(tree: &LabelTree, config: &EmitConfig) -> String {
    let Some(root) = tree.root() else {
        return String::new();
    };
    let mut out = String::new();
    // Writing to a String only fails when allocation does; keep what we have.
    let _ = emit_tree(tree, root, config, false, &mut out);
    out
}

// ── Walk ────────────────────────────────────────────────────────────────

struct Emitter<'a> {
    tree: &'a LabelTree,
    config: &'a EmitConfig,
}

impl Emitter<'_> {
    fn line(&self, depth: usize, lhs: &str, rhs: &str) -> String {
        let indent = depth * self.config.indent_width;
        let width = self.config.align_column.saturating_sub(indent);
        format!("{:indent$}{lhs:<width$} = {rhs}", "")
    }

    fn block(
        &self,
        id: ObjectId,
        depth: usize,
        sink: &mut dyn StatementSink,
    ) -> Result<(), LabelError> {
        let Some(obj) = self.tree.object(id) else {
            return Ok(());
        };
        sink.statement(&self.line(depth, obj.kind().open_keyword(), obj.class()))?;
        self.contents(obj, depth + 1, sink)?;
        sink.statement(&self.line(depth, obj.kind().close_keyword(), obj.class()))
    }

    fn contents(
        &self,
        obj: &Object,
        depth: usize,
        sink: &mut dyn StatementSink,
    ) -> Result<(), LabelError> {
        for param in obj.params().iter().filter_map(|&p| self.tree.param(p)) {
            let name = match param.kind() {
                ParamKind::Pointer => format!("^{}", param.name()),
                ParamKind::Keyword => param.name().to_string(),
            };
            sink.statement(&self.line(depth, &name, &format_parameter_value(param)))?;
        }
        for &child in obj.children() {
            self.block(child, depth, sink)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{AggregateKind, Value, ValueShape};

    fn sample() -> LabelTree {
        let mut t = LabelTree::new();
        let root = t.root().unwrap();
        let p = t.append_parameter(root, "RECORD_TYPE", ParamKind::Keyword).unwrap();
        t.set_values(p, ValueShape::Scalar, 0, vec![Value::symbol("STREAM")]);
        let p = t.append_parameter(root, "IMAGE", ParamKind::Pointer).unwrap();
        t.set_values(p, ValueShape::Scalar, 0, vec![Value::integer(3)]);
        let img = t.append_object(root, "IMAGE", AggregateKind::Object).unwrap();
        let p = t.append_parameter(img, "LINES", ParamKind::Keyword).unwrap();
        t.set_values(p, ValueShape::Scalar, 0, vec![Value::integer(10)]);
        t.append_object(img, "STATS", AggregateKind::Group).unwrap();
        t
    }

    #[test]
    fn renders_nested_blocks() {
        let text = emit_label(&sample(), &EmitConfig::default());
        assert_eq!(
            text,
            "RECORD_TYPE = STREAM\n\
             ^IMAGE = 3\n\
             OBJECT = IMAGE\n\
             \x20 LINES = 10\n\
             \x20 GROUP = STATS\n\
             \x20 END_GROUP = STATS\n\
             END_OBJECT = IMAGE\n\
             END\n"
        );
    }

    #[test]
    fn aligns_equals() {
        let config = EmitConfig {
            indent_width: 2,
            align_column: 12,
        };
        let text = emit_label(&sample(), &config);
        assert!(text.starts_with("RECORD_TYPE  = STREAM\n^IMAGE       = 3\n"));
        assert!(text.contains("\n  LINES      = 10\n"));
    }

    #[test]
    fn suppressed_end_and_subtree() {
        let tree = sample();
        let root = tree.root().unwrap();
        let img = tree.object(root).unwrap().children()[0];
        let mut out = String::new();
        emit_tree(&tree, img, &EmitConfig::default(), true, &mut out).unwrap();
        assert!(out.starts_with("OBJECT = IMAGE\n"));
        assert!(out.ends_with("END_OBJECT = IMAGE\n"));
    }

    #[test]
    fn empty_tree_renders_nothing() {
        let mut tree = LabelTree::new();
        let root = tree.root().unwrap();
        tree.remove_object(root);
        assert_eq!(emit_label(&tree, &EmitConfig::default()), "");
    }
}
