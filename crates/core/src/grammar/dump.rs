use serde::Serialize;

use crate::format::format_parameter_value;
use crate::tree::{AggregateKind, LabelTree, ObjectId, ParamKind, Value, ValueShape};

/// Nested, serializable view of one object.
#[derive(Debug, Serialize)]
pub struct ObjectView<'a> {
    /// Class name.
    pub class: &'a str,
    /// `object` or `group`.
    pub kind: AggregateKind,
    /// Value of the `NAME` parameter, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    /// Parameters in document order.
    pub params: Vec<ParamView<'a>>,
    /// Child objects in document order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ObjectView<'a>>,
}

/// Serializable view of one parameter.
#[derive(Debug, Serialize)]
pub struct ParamView<'a> {
    /// Keyword name.
    pub name: &'a str,
    /// `keyword` or `pointer`.
    pub kind: ParamKind,
    /// Value list shape.
    pub shape: ValueShape,
    /// Row width for two-dimensional sequences.
    #[serde(skip_serializing_if = "is_zero")]
    pub columns: usize,
    /// Right-hand side as label text.
    pub text: String,
    /// Typed values.
    pub values: &'a [Value],
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

/// Build the nested view of the subtree at `id`.
pub fn object_view(tree: &LabelTree, id: ObjectId) -> Option<ObjectView<'_>> {
    let obj = tree.object(id)?;
    let params = obj
        .params()
        .iter()
        .filter_map(|&p| tree.param(p))
        .map(|p| ParamView {
            name: p.name(),
            kind: p.kind(),
            shape: p.shape(),
            columns: p.columns(),
            text: format_parameter_value(p),
            values: p.values(),
        })
        .collect();
    let children = obj
        .children()
        .iter()
        .filter_map(|&c| object_view(tree, c))
        .collect();
    Some(ObjectView {
        class: obj.class(),
        kind: obj.kind(),
        name: tree.object_name(id),
        params,
        children,
    })
}

/// Serialize a label tree to a pretty-printed JSON string.
pub fn to_pretty_json(tree: &LabelTree) -> String {
    let view = tree.root().and_then(|r| object_view(tree, r));
    serde_json::to_string_pretty(&view).expect("label view serialization cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_json_shape() {
        let mut tree = LabelTree::new();
        let root = tree.root().unwrap();
        let img = tree.append_object(root, "IMAGE", AggregateKind::Object).unwrap();
        let p = tree.append_parameter(img, "NAME", ParamKind::Keyword).unwrap();
        tree.set_values(p, ValueShape::Scalar, 0, vec![Value::string("BROWSE")]);

        let json: serde_json::Value = serde_json::from_str(&to_pretty_json(&tree)).unwrap();
        assert_eq!(json["class"], "ROOT");
        let child = &json["children"][0];
        assert_eq!(child["class"], "IMAGE");
        assert_eq!(child["name"], "BROWSE");
        assert_eq!(child["params"][0]["text"], "\"BROWSE\"");
        assert_eq!(child["params"][0]["values"][0]["type"], "string");
        assert!(child.get("children").is_none());
    }

    #[test]
    fn empty_tree_is_null() {
        let mut tree = LabelTree::new();
        let root = tree.root().unwrap();
        tree.remove_object(root);
        assert_eq!(to_pretty_json(&tree), "null");
    }
}
