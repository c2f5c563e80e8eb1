//! Result types for lookups and mutations.
//!
//! Every locator, mutator, and pointer operation reports one of the
//! [`Status`] codes. Ambiguous results carry the *first* match in document
//! order; the caller decides what to do with it.

use odl_toolchain_diagnostics::Diagnostic;
use serde::Serialize;

/// Flat status taxonomy shared by all label operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// The operation completed cleanly.
    Success,
    /// Not found, structurally invalid, or rejected.
    Error,
    /// More than one object matched the search keys.
    MultipleObjects,
    /// More than one parameter matched the search keys.
    MultipleParms,
    /// Completed, but diagnostics were produced along the way.
    Warning,
}

impl Status {
    /// `Success` or `Warning`.
    pub fn is_ok(self) -> bool {
        matches!(self, Status::Success | Status::Warning)
    }
}

/// Which level of the tree produced an ambiguous match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Ambiguity {
    /// Several objects satisfied the object keys.
    Objects,
    /// Several parameters satisfied the parameter keys.
    Parameters,
}

impl Ambiguity {
    fn status(self) -> Status {
        match self {
            Ambiguity::Objects => Status::MultipleObjects,
            Ambiguity::Parameters => Status::MultipleParms,
        }
    }
}

/// Result of a locator search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<T> {
    /// Exactly one node matched.
    Found(T),
    /// Several nodes matched; `first` is the earliest in document order.
    Ambiguous {
        /// First match in document order.
        first: T,
        /// Which level was ambiguous.
        kind: Ambiguity,
    },
    /// Nothing matched.
    NotFound,
}

impl<T: Copy> Lookup<T> {
    /// Status code for this result.
    pub fn status(&self) -> Status {
        match self {
            Lookup::Found(_) => Status::Success,
            Lookup::Ambiguous { kind, .. } => kind.status(),
            Lookup::NotFound => Status::Error,
        }
    }

    /// The unique match, if there was exactly one.
    pub fn found(&self) -> Option<T> {
        match self {
            Lookup::Found(t) => Some(*t),
            _ => None,
        }
    }

    /// The first match, ambiguous or not.
    pub fn first(&self) -> Option<T> {
        match self {
            Lookup::Found(t) | Lookup::Ambiguous { first: t, .. } => Some(*t),
            Lookup::NotFound => None,
        }
    }

    /// Replace the match while keeping the status, used when a second search
    /// continues from an ambiguous first one.
    pub(crate) fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(t) => Lookup::Found(f(t)),
            Lookup::Ambiguous { first, kind } => Lookup::Ambiguous {
                first: f(first),
                kind,
            },
            Lookup::NotFound => Lookup::NotFound,
        }
    }
}

/// Result of a mutation or pointer operation.
///
/// `F` is the type of the candidate reported on ambiguity. It is `T` for
/// reads (the first match's value) and the located node's id for edits
/// whose product differs from their target.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T, F = T> {
    /// Completed cleanly.
    Done(T),
    /// Completed; the listed diagnostics were produced on the way.
    Warning(T, Vec<Diagnostic>),
    /// Several targets matched; nothing was changed.
    Ambiguous {
        /// First candidate in document order.
        first: F,
        /// Which level was ambiguous.
        kind: Ambiguity,
    },
    /// Not found or rejected; nothing was changed unless documented otherwise.
    Error,
}

impl<T, F> Outcome<T, F> {
    /// Status code for this outcome.
    pub fn status(&self) -> Status {
        match self {
            Outcome::Done(_) => Status::Success,
            Outcome::Warning(..) => Status::Warning,
            Outcome::Ambiguous { kind, .. } => kind.status(),
            Outcome::Error => Status::Error,
        }
    }

    /// The produced value for `Done` and `Warning`.
    pub fn value(self) -> Option<T> {
        match self {
            Outcome::Done(t) | Outcome::Warning(t, _) => Some(t),
            Outcome::Ambiguous { .. } | Outcome::Error => None,
        }
    }

    /// Borrowing form of [`value`](Self::value).
    pub fn as_value(&self) -> Option<&T> {
        match self {
            Outcome::Done(t) | Outcome::Warning(t, _) => Some(t),
            Outcome::Ambiguous { .. } | Outcome::Error => None,
        }
    }

    /// The first candidate of an ambiguous match.
    pub fn first(&self) -> Option<&F> {
        match self {
            Outcome::Ambiguous { first, .. } => Some(first),
            _ => None,
        }
    }

    /// `Done(t)` when `diagnostics` is empty, `Warning(t, diagnostics)` otherwise.
    pub(crate) fn with_diagnostics(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        if diagnostics.is_empty() {
            Outcome::Done(value)
        } else {
            Outcome::Warning(value, diagnostics)
        }
    }

    /// Drop the payloads, keeping status and diagnostics.
    pub(crate) fn erase(self) -> Outcome<()> {
        match self {
            Outcome::Done(_) => Outcome::Done(()),
            Outcome::Warning(_, d) => Outcome::Warning((), d),
            Outcome::Ambiguous { kind, .. } => Outcome::Ambiguous { first: (), kind },
            Outcome::Error => Outcome::Error,
        }
    }
}

impl<T> Outcome<T> {
    /// The produced value, or the first candidate when the match was
    /// ambiguous.
    pub fn value_or_first(self) -> Option<T> {
        match self {
            Outcome::Done(t) | Outcome::Warning(t, _) | Outcome::Ambiguous { first: t, .. } => {
                Some(t)
            }
            Outcome::Error => None,
        }
    }

    /// Settle a lookup with the value `f` derives from its first match.
    /// `None` from `f` (or no match) is an `Error`.
    pub(crate) fn from_lookup<I: Copy>(lookup: Lookup<I>, f: impl FnOnce(I) -> Option<T>) -> Self {
        let Some(value) = lookup.first().and_then(f) else {
            return Outcome::Error;
        };
        match lookup {
            Lookup::Ambiguous { kind, .. } => Outcome::Ambiguous { first: value, kind },
            _ => Outcome::Done(value),
        }
    }
}
