//! Error kinds shared by every layer of the tree (§7 of the specification).

use arcstr::ArcStr;
use thiserror::Error;

use crate::value::AttrType;

/// The result type returned by all fallible `cfgtree_core` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure modes of the core tree. RCP mappings live in `cfgtree-rcp`; this
/// enum only needs to distinguish the kinds spec.md §7 enumerates.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("no such attribute or node: {0}")]
    NotFound(ArcStr),

    #[error("attribute {key} is type {expected:?}, not {actual:?}")]
    TypeMismatch {
        key: ArcStr,
        expected: AttrType,
        actual: AttrType,
    },

    #[error("value for {key} is outside its configured range")]
    OutOfRange { key: ArcStr },

    #[error("attribute {0} is read-only")]
    ReadOnly(ArcStr),

    #[error("attribute {0} already exists with different ranges or flags")]
    Conflict(ArcStr),

    #[error("invalid path: {0}")]
    InvalidPath(ArcStr),

    #[error("invalid value: {0}")]
    InvalidValue(ArcStr),

    #[error("protocol error: {0}")]
    ProtocolError(ArcStr),

    #[error("I/O error: {0}")]
    IoError(ArcStr),
}

impl Error {
    pub fn not_found(what: impl Into<ArcStr>) -> Self {
        Error::NotFound(what.into())
    }

    pub fn invalid_path(what: impl Into<ArcStr>) -> Self {
        Error::InvalidPath(what.into())
    }

    pub fn invalid_value(what: impl Into<ArcStr>) -> Self {
        Error::InvalidValue(what.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(ArcStr::from(e.to_string()))
    }
}
