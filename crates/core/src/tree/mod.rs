//! Label tree model.
//!
//! The tree is an arena: objects and parameters live in slot vectors and
//! refer to each other by [`ObjectId`] / [`ParamId`]. Ordering (children,
//! parameters) is the order of the id vectors held by each object. Removed
//! nodes leave a tombstone so an old id can never resolve to a new node.

/// Typed values and units.
pub mod value;

pub use value::{UnitFactor, Units, Value, ValueData};

use serde::Serialize;
use tracing::trace;

use crate::LabelError;
use crate::sfdu::WrapperLabels;

/// Class given to the implicit document root.
pub const ROOT_CLASS: &str = "ROOT";

/// Stable handle to an object in a [`LabelTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ObjectId(usize);

/// Stable handle to a parameter in a [`LabelTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ParamId(usize);

/// Whether an aggregate was written as `OBJECT` or `GROUP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateKind {
    /// `OBJECT = X … END_OBJECT = X`.
    #[default]
    Object,
    /// `GROUP = X … END_GROUP = X`.
    Group,
}

impl AggregateKind {
    /// Opening keyword.
    pub fn open_keyword(self) -> &'static str {
        match self {
            AggregateKind::Object => "OBJECT",
            AggregateKind::Group => "GROUP",
        }
    }

    /// Closing keyword.
    pub fn close_keyword(self) -> &'static str {
        match self {
            AggregateKind::Object => "END_OBJECT",
            AggregateKind::Group => "END_GROUP",
        }
    }
}

/// Ordinary keyword or `^` pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// `KEYWORD = VALUE`.
    #[default]
    Keyword,
    /// `^KEYWORD = VALUE`.
    Pointer,
}

/// Syntactic shape of a parameter's value list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    /// A single value.
    #[default]
    Scalar,
    /// `(a, b, c)`.
    Sequence,
    /// `{a, b, c}`.
    Set,
    /// `((a, b), (c, d))`; row width is [`Parameter::columns`].
    Sequence2D,
}

/// An aggregate node (`OBJECT` or `GROUP`, or the document root).
#[derive(Debug, Clone)]
pub struct Object {
    pub(crate) class: String,
    pub(crate) kind: AggregateKind,
    pub(crate) parent: Option<ObjectId>,
    pub(crate) children: Vec<ObjectId>,
    pub(crate) params: Vec<ParamId>,
    pub(crate) wrappers: Option<WrapperLabels>,
}

impl Object {
    /// Class name, e.g. `IMAGE`.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// `OBJECT` or `GROUP`.
    pub fn kind(&self) -> AggregateKind {
        self.kind
    }

    /// Owning object; `None` for the root.
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Child objects in document order.
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    /// Parameters in document order.
    pub fn params(&self) -> &[ParamId] {
        &self.params
    }

    /// Wrapper framing read from the source file, kept on the root.
    pub fn wrappers(&self) -> Option<&WrapperLabels> {
        self.wrappers.as_ref()
    }
}

/// A keyword or pointer statement.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub(crate) name: String,
    pub(crate) kind: ParamKind,
    pub(crate) shape: ValueShape,
    pub(crate) columns: usize,
    pub(crate) values: Vec<Value>,
    pub(crate) owner: ObjectId,
}

impl Parameter {
    /// Keyword name without the `^` marker.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keyword or pointer.
    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    /// Value list shape.
    pub fn shape(&self) -> ValueShape {
        self.shape
    }

    /// Row width of a two-dimensional sequence, 0 otherwise.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Values in source order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Owning object.
    pub fn owner(&self) -> ObjectId {
        self.owner
    }
}

/// A parsed label.
#[derive(Debug, Clone)]
pub struct LabelTree {
    objects: Vec<Option<Object>>,
    params: Vec<Option<Parameter>>,
    root: Option<ObjectId>,
}

impl Default for LabelTree {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelTree {
    /// An empty label holding only the implicit root object.
    pub fn new() -> Self {
        let root = Object {
            class: ROOT_CLASS.to_string(),
            kind: AggregateKind::Object,
            parent: None,
            children: Vec::new(),
            params: Vec::new(),
            wrappers: None,
        };
        Self {
            objects: vec![Some(root)],
            params: Vec::new(),
            root: Some(ObjectId(0)),
        }
    }

    /// The document root, or `None` after the root was removed.
    pub fn root(&self) -> Option<ObjectId> {
        self.root
    }

    /// Resolve an object id.
    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Resolve a parameter id.
    pub fn param(&self, id: ParamId) -> Option<&Parameter> {
        self.params.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn param_mut(&mut self, id: ParamId) -> Option<&mut Parameter> {
        self.params.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Number of live objects, root included.
    pub fn object_count(&self) -> usize {
        self.objects.iter().flatten().count()
    }

    /// Number of live parameters.
    pub fn param_count(&self) -> usize {
        self.params.iter().flatten().count()
    }

    /// Display name of an object: the text of the first value of its `NAME`
    /// parameter.
    pub fn object_name(&self, id: ObjectId) -> Option<&str> {
        let obj = self.object(id)?;
        obj.params
            .iter()
            .filter_map(|&p| self.param(p))
            .find(|p| p.name == "NAME")
            .and_then(|p| p.values.first())
            .and_then(Value::as_text)
    }

    /// Nesting depth; the root is level 0.
    pub fn level(&self, id: ObjectId) -> usize {
        let mut level = 0;
        let mut cur = self.object(id).and_then(Object::parent);
        while let Some(p) = cur {
            level += 1;
            cur = self.object(p).and_then(Object::parent);
        }
        level
    }

    /// Pre-order walk of the subtree rooted at `start`, `start` included.
    pub fn preorder(&self, start: ObjectId) -> Preorder<'_> {
        let stack = if self.object(start).is_some() {
            vec![start]
        } else {
            Vec::new()
        };
        Preorder { tree: self, stack }
    }

    /// First parameter of `owner` named `name`.
    pub fn param_named(&self, owner: ObjectId, name: &str) -> Option<ParamId> {
        self.object(owner)?
            .params
            .iter()
            .copied()
            .find(|&p| self.param(p).is_some_and(|p| p.name == name))
    }

    /// Append a child object to `parent`.
    pub fn append_object(
        &mut self,
        parent: ObjectId,
        class: impl Into<String>,
        kind: AggregateKind,
    ) -> Result<ObjectId, LabelError> {
        self.objects
            .try_reserve(1)
            .map_err(|_| LabelError::OutOfResources { what: "object" })?;
        let id = ObjectId(self.objects.len());
        let parent_obj = self.object_mut(parent).ok_or(LabelError::OutOfResources {
            what: "object (dangling parent)",
        })?;
        parent_obj
            .children
            .try_reserve(1)
            .map_err(|_| LabelError::OutOfResources { what: "object" })?;
        parent_obj.children.push(id);
        self.objects.push(Some(Object {
            class: class.into(),
            kind,
            parent: Some(parent),
            children: Vec::new(),
            params: Vec::new(),
            wrappers: None,
        }));
        trace!(?id, ?parent, "appended object");
        Ok(id)
    }

    /// Append a parameter with no values to `owner`.
    pub fn append_parameter(
        &mut self,
        owner: ObjectId,
        name: impl Into<String>,
        kind: ParamKind,
    ) -> Result<ParamId, LabelError> {
        self.params
            .try_reserve(1)
            .map_err(|_| LabelError::OutOfResources { what: "parameter" })?;
        let id = ParamId(self.params.len());
        let owner_obj = self.object_mut(owner).ok_or(LabelError::OutOfResources {
            what: "parameter (dangling owner)",
        })?;
        owner_obj
            .params
            .try_reserve(1)
            .map_err(|_| LabelError::OutOfResources { what: "parameter" })?;
        owner_obj.params.push(id);
        self.params.push(Some(Parameter {
            name: name.into(),
            kind,
            shape: ValueShape::Scalar,
            columns: 0,
            values: Vec::new(),
            owner,
        }));
        Ok(id)
    }

    /// Replace a parameter's value list wholesale.
    pub(crate) fn set_values(
        &mut self,
        id: ParamId,
        shape: ValueShape,
        columns: usize,
        values: Vec<Value>,
    ) -> bool {
        match self.param_mut(id) {
            Some(p) => {
                p.shape = shape;
                p.columns = columns;
                p.values = values;
                true
            }
            None => false,
        }
    }

    /// Remove an object and its whole subtree. Returns the former parent
    /// (`Some(None)` when the root itself was removed), or `None` if `id` was
    /// already gone.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<Option<ObjectId>> {
        let parent = self.object(id)?.parent;
        if let Some(p) = parent.and_then(|p| self.object_mut(p)) {
            p.children.retain(|&c| c != id);
        }
        let doomed: Vec<ObjectId> = self.preorder(id).collect();
        for oid in doomed {
            if let Some(obj) = self.objects[oid.0].take() {
                for pid in obj.params {
                    self.params[pid.0] = None;
                }
            }
        }
        if parent.is_none() {
            self.root = None;
        }
        Some(parent)
    }

    /// Remove a parameter. Returns its former owner.
    pub fn remove_parameter(&mut self, id: ParamId) -> Option<ObjectId> {
        let owner = self.param(id)?.owner;
        if let Some(o) = self.object_mut(owner) {
            o.params.retain(|&p| p != id);
        }
        self.params[id.0] = None;
        Some(owner)
    }

    /// Move `id` to 0-based `index` among its owner's parameters, clamping to
    /// the end.
    pub(crate) fn reposition_parameter(&mut self, id: ParamId, index: usize) -> bool {
        let Some(owner) = self.param(id).map(|p| p.owner) else {
            return false;
        };
        let Some(obj) = self.object_mut(owner) else {
            return false;
        };
        obj.params.retain(|&p| p != id);
        let at = index.min(obj.params.len());
        obj.params.insert(at, id);
        true
    }

    /// Attach wrapper framing to the root.
    pub fn set_wrappers(&mut self, wrappers: Option<WrapperLabels>) {
        if let Some(root) = self.root.and_then(|r| self.object_mut(r)) {
            root.wrappers = wrappers;
        }
    }

    /// Wrapper framing attached to the root.
    pub fn wrappers(&self) -> Option<&WrapperLabels> {
        self.root
            .and_then(|r| self.object(r))
            .and_then(Object::wrappers)
    }
}

/// Iterator returned by [`LabelTree::preorder`].
pub struct Preorder<'a> {
    tree: &'a LabelTree,
    stack: Vec<ObjectId>,
}

impl Iterator for Preorder<'_> {
    type Item = ObjectId;

    fn next(&mut self) -> Option<ObjectId> {
        let id = self.stack.pop()?;
        if let Some(obj) = self.tree.object(id) {
            self.stack.extend(obj.children.iter().rev());
        }
        Some(id)
    }
}
