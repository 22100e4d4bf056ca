//! Error values raised while building and validating condition trees.

use thiserror::Error;

use crate::types::{BlockType, FilterMode};

/// Errors raised by filter construction, condition compilation and tree
/// validation.
#[derive(Debug, Error)]
pub enum FilterError {
    /// A filter was built against an unnamed field.
    #[error("empty field name")]
    EmptyName,

    /// A condition referenced a column the schema does not define.
    #[error("unknown column {0:?}")]
    UnknownColumn(String),

    /// A non-constant filter carries no literal.
    #[error("filter {0:?}: missing value")]
    MissingValue(String),

    /// A literal belongs to a different domain than the column.
    #[error("filter {filter:?}: expected {expected} value, got {actual}")]
    TypeMismatch {
        filter: String,
        expected: BlockType,
        actual: BlockType,
    },

    /// The literal kind does not fit the comparison mode, e.g. a scalar
    /// bound to a `Range` filter.
    #[error("filter {filter:?}: mode {mode} cannot bind this literal kind")]
    ValueKind { filter: String, mode: FilterMode },

    /// A regexp filter carries an unparseable pattern.
    #[error("filter {filter:?}: invalid regexp: {source}")]
    InvalidRegexp {
        filter: String,
        #[source]
        source: regex::Error,
    },

    /// A branch node has no children.
    #[error("node {0}: branch has no children")]
    EmptyNode(String),

    /// Wraps a nested error with the tree path it was found at.
    #[error("node {path}: {source}")]
    Node {
        path: String,
        #[source]
        source: Box<FilterError>,
    },
}

impl FilterError {
    /// Attaches a tree path to a nested error.
    #[must_use]
    pub fn at(self, path: impl Into<String>) -> Self {
        Self::Node {
            path: path.into(),
            source: Box::new(self),
        }
    }
}
