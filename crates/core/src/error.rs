//! Typed errors for label operations.
//!
//! Not-found, ambiguity, and warning conditions are ordinary outcomes and
//! travel through [`Lookup`](crate::Lookup) / [`Outcome`](crate::Outcome).
//! `LabelError` is reserved for failures that abandon the operation.

use std::io;
use std::path::PathBuf;

/// Failure that aborts a label operation.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    /// Reading or writing a file failed.
    #[error("I/O failed on {}", path.display())]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Memory for a new tree node or buffer could not be reserved.
    #[error("out of resources while allocating {what}")]
    OutOfResources {
        /// What was being allocated.
        what: &'static str,
    },
}

impl LabelError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LabelError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for the out-of-resources kind.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LabelError::OutOfResources { .. })
    }
}

impl From<std::collections::TryReserveError> for LabelError {
    fn from(_: std::collections::TryReserveError) -> Self {
        LabelError::OutOfResources { what: "buffer" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_mentions_path() {
        let err = LabelError::io("out/label.lbl", io::Error::other("disk full"));
        assert_eq!(err.to_string(), "I/O failed on out/label.lbl");
        assert!(!err.is_fatal());
    }

    #[test]
    fn out_of_resources_is_fatal() {
        let err = LabelError::OutOfResources { what: "object" };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("object"));
    }
}
