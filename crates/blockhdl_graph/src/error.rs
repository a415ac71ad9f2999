//! Errors raised while loading and simplifying a block graph.

use crate::kind::BlockKind;
use blockhdl_diagnostics::{Diagnostic, DiagnosticCode, Location};

/// A malformed-graph condition. All of these are fatal.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A link or lookup referenced a block id that does not exist.
    #[error("unknown block '{name}'")]
    NotFound {
        /// The missing block id.
        name: String,
    },

    /// Two blocks share the same id.
    #[error("duplicate block id '{name}'")]
    DuplicateBlock {
        /// The repeated block id.
        name: String,
    },

    /// A block id collides with a reserved boundary name.
    #[error("block id '{name}' is reserved for the module boundary")]
    ReservedName {
        /// The offending block id.
        name: String,
    },

    /// A block kind outside the supported vocabulary.
    #[error("block '{name}' has unknown kind '{kind}'")]
    UnknownKind {
        /// The block id.
        name: String,
        /// The kind as spelled in the model.
        kind: String,
    },

    /// A splitter that does not have exactly one source.
    #[error("splitter '{name}' has {count} inputs, expected exactly 1")]
    SplitterFanIn {
        /// The splitter's block id.
        name: String,
        /// How many inputs it actually has.
        count: usize,
    },

    /// The model contains a feedback loop.
    #[error("model contains a cycle through block '{name}' ({kind})")]
    Cycle {
        /// A block on the cycle.
        name: String,
        /// Its kind.
        kind: BlockKind,
    },

    /// The model description could not be read.
    #[error("failed to read model: {0}")]
    Io(#[from] std::io::Error),

    /// The model description is not valid JSON for the expected schema.
    #[error("failed to parse model: {0}")]
    Parse(String),
}

impl GraphError {
    /// The stable diagnostic code for this error.
    pub fn code(&self) -> DiagnosticCode {
        let number = match self {
            GraphError::NotFound { .. } => 101,
            GraphError::DuplicateBlock { .. } => 102,
            GraphError::ReservedName { .. } => 103,
            GraphError::UnknownKind { .. } => 104,
            GraphError::SplitterFanIn { .. } => 105,
            GraphError::Cycle { .. } => 106,
            GraphError::Io(_) => 107,
            GraphError::Parse(_) => 108,
        };
        DiagnosticCode::error(number)
    }

    /// Converts this error into a renderable diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code(), self.to_string());
        match self {
            GraphError::NotFound { name } => diag
                .at(Location::block(name))
                .with_note("a link refers to a block that is not in the model"),
            GraphError::DuplicateBlock { name } | GraphError::ReservedName { name } => {
                diag.at(Location::block(name))
            }
            GraphError::UnknownKind { name, kind } => diag
                .at(Location::typed(name, kind))
                .with_help("supported kinds: INTEGRAL_f, DIFF_f, GAIN_f, SUM_f, SPLIT"),
            GraphError::SplitterFanIn { name, .. } => {
                diag.at(Location::typed(name, BlockKind::Splitter.model_name()))
            }
            GraphError::Cycle { name, kind } => diag
                .at(Location::typed(name, kind.model_name()))
                .with_note("feedback loops cannot be expressed as a chain of cores"),
            GraphError::Io(_) | GraphError::Parse(_) => diag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_splitter_fan_in() {
        let err = GraphError::SplitterFanIn {
            name: "split3".to_string(),
            count: 2,
        };
        assert_eq!(
            err.to_string(),
            "splitter 'split3' has 2 inputs, expected exactly 1"
        );
        assert_eq!(err.code().to_string(), "E105");
    }

    #[test]
    fn diagnostic_carries_location() {
        let err = GraphError::UnknownKind {
            name: "b4".to_string(),
            kind: "CLOCK_c".to_string(),
        };
        let diag = err.to_diagnostic();
        assert_eq!(diag.location, Some(Location::typed("b4", "CLOCK_c")));
        assert_eq!(diag.help.len(), 1);
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: GraphError = io.into();
        assert!(err.to_string().starts_with("failed to read model:"));
        assert!(err.to_diagnostic().location.is_none());
    }
}
