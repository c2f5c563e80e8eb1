//! Locator: resolves (class, name, position) keys to objects and parameters.
//!
//! Searches walk the subtree below the start object in document order and
//! never ascend. Each key is optional; an omitted key matches everything.

use tracing::debug;

use crate::context::LabelContext;
use crate::status::{Ambiguity, Lookup};
use crate::tree::{LabelTree, ObjectId, ParamId};

/// Search keys for an object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectQuery {
    /// Class name to match.
    pub class: Option<String>,
    /// Value of the object's `NAME` parameter to match.
    pub name: Option<String>,
    /// 1-based ordinal among the objects that satisfy `class` and `name`;
    /// 0 means "no position".
    ///
    /// This is *not* an absolute document position: with `class = IMAGE`
    /// and `position = 2` the result is the second `IMAGE` object, however
    /// many other objects precede it.
    pub position: usize,
}

impl ObjectQuery {
    /// A query with no keys; it resolves to the start object.
    pub fn any() -> Self {
        Self::default()
    }

    /// Match on class.
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Match on `NAME`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Select the n-th match (1-based).
    pub fn position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    fn is_empty(&self) -> bool {
        self.class.is_none() && self.name.is_none() && self.position == 0
    }
}

/// Search keys for a parameter: the owning object, then the parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamQuery {
    /// Keys for the owning object; empty means the start object itself.
    pub object: ObjectQuery,
    /// Keyword name to match.
    pub name: Option<String>,
    /// 1-based ordinal among the owner's parameters that satisfy `name`;
    /// 0 means "no position".
    pub position: usize,
}

impl ParamQuery {
    /// Match a parameter by name on the start object.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Owner keys.
    pub fn in_object(mut self, object: ObjectQuery) -> Self {
        self.object = object;
        self
    }

    /// Select the n-th matching parameter (1-based).
    pub fn position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }
}

/// Ordinal-among-matches bookkeeping shared by both searches.
struct Matcher<T> {
    position: usize,
    count: usize,
    first: Option<T>,
}

impl<T: Copy> Matcher<T> {
    fn new(position: usize) -> Self {
        Self {
            position,
            count: 0,
            first: None,
        }
    }

    /// Feed a candidate that passed the other keys. Returns a final result
    /// once one is known.
    fn offer(&mut self, candidate: T, kind: Ambiguity) -> Option<Lookup<T>> {
        self.count += 1;
        if self.position != 0 {
            return (self.count == self.position).then_some(Lookup::Found(candidate));
        }
        match self.first {
            None => {
                self.first = Some(candidate);
                None
            }
            Some(first) => Some(Lookup::Ambiguous { first, kind }),
        }
    }

    fn finish(self) -> Lookup<T> {
        match self.first {
            Some(t) => Lookup::Found(t),
            None => Lookup::NotFound,
        }
    }
}

/// Find one object in the subtree rooted at `start` (inclusive).
pub fn find_object(
    tree: &LabelTree,
    ctx: &LabelContext,
    start: ObjectId,
    query: &ObjectQuery,
) -> Lookup<ObjectId> {
    if tree.object(start).is_none() {
        return Lookup::NotFound;
    }
    if query.is_empty() {
        return Lookup::Found(start);
    }
    let mut matcher = Matcher::new(query.position);
    let mut result = None;
    for id in tree.preorder(start) {
        let Some(obj) = tree.object(id) else {
            continue;
        };
        let class_ok = query
            .class
            .as_deref()
            .is_none_or(|c| class_matches(obj.class(), c, ctx.config.generic_class));
        let name_ok = query
            .name
            .as_deref()
            .is_none_or(|n| tree.object_name(id) == Some(n));
        if class_ok && name_ok {
            result = matcher.offer(id, Ambiguity::Objects);
            if result.is_some() {
                break;
            }
        }
    }
    let lookup = result.unwrap_or_else(|| matcher.finish());
    debug!(?query, status = ?lookup.status(), "find_object");
    lookup
}

/// Find one parameter.
///
/// The owner is resolved with [`find_object`] first. When the owner keys are
/// ambiguous the search continues in the first owner and the result is
/// reported as `Ambiguous { kind: Objects }`.
pub fn find_parameter(
    tree: &LabelTree,
    ctx: &LabelContext,
    start: ObjectId,
    query: &ParamQuery,
) -> Lookup<ParamId> {
    let owner_lookup = find_object(tree, ctx, start, &query.object);
    let Some(owner) = owner_lookup.first() else {
        return Lookup::NotFound;
    };
    let Some(obj) = tree.object(owner) else {
        return Lookup::NotFound;
    };

    let mut matcher = Matcher::new(query.position);
    let mut result = None;
    for &pid in obj.params() {
        let Some(param) = tree.param(pid) else {
            continue;
        };
        if query.name.as_deref().is_none_or(|n| param.name() == n) {
            result = matcher.offer(pid, Ambiguity::Parameters);
            if result.is_some() {
                break;
            }
        }
    }
    let mut lookup = result.unwrap_or_else(|| matcher.finish());

    if matches!(owner_lookup, Lookup::Ambiguous { .. }) {
        if let Some(first) = lookup.first() {
            lookup = Lookup::Ambiguous {
                first,
                kind: Ambiguity::Objects,
            };
        }
    }
    debug!(?query, status = ?lookup.status(), "find_parameter");
    lookup
}

/// Class predicate. In generic mode the candidate's trailing digits and
/// underscores are dropped and `wanted` may match any `_`-separated tail.
fn class_matches(candidate: &str, wanted: &str, generic: bool) -> bool {
    if candidate == wanted {
        return true;
    }
    if !generic {
        return false;
    }
    let stripped = candidate.trim_end_matches(|c: char| c.is_ascii_digit() || c == '_');
    if stripped == wanted {
        return true;
    }
    stripped
        .strip_suffix(wanted)
        .is_some_and(|head| head.ends_with('_'))
}
