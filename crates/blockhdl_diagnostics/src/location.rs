//! Model locations that diagnostics point at.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The place in the source model a diagnostic refers to.
///
/// Models have no byte offsets worth showing; a block is located by the
/// identifier it carries in the model description and, when known, its kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// The block identifier from the model description.
    pub block: String,
    /// The block kind as spelled in the model (e.g. `GAIN_f`), if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Location {
    /// Creates a location for a block whose kind is unknown.
    pub fn block(block: impl Into<String>) -> Self {
        Self {
            block: block.into(),
            kind: None,
        }
    }

    /// Creates a location for a block of a known kind.
    pub fn typed(block: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            block: block.into(),
            kind: Some(kind.into()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "block '{}' ({kind})", self.block),
            None => write!(f, "block '{}'", self.block),
        }
    }
}
