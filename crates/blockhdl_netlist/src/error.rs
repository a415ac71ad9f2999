//! Errors raised while wiring and emitting a netlist.

use blockhdl_diagnostics::{Diagnostic, DiagnosticCode, Location};
use blockhdl_graph::{BlockKind, GraphError};

/// A topology the generator cannot express, or an emission failure.
#[derive(Debug, thiserror::Error)]
pub enum NetlistError {
    /// Zero or several blocks without predecessors.
    #[error("ambiguous or absent model entry point: {} block(s) without inputs", blocks.len())]
    AmbiguousEntry {
        /// Names of all candidate entry blocks.
        blocks: Vec<String>,
    },

    /// Zero or several blocks without successors.
    #[error("ambiguous or absent model exit point: {} block(s) without outputs", blocks.len())]
    AmbiguousExit {
        /// Names of all candidate exit blocks.
        blocks: Vec<String>,
    },

    /// A single-input block fed by more than one signal.
    #[error("block '{name}' ({kind}) has {count} inputs, expected at most 1")]
    UnsupportedFanIn {
        /// Block name.
        name: String,
        /// Block kind.
        kind: BlockKind,
        /// Number of inputs found.
        count: usize,
    },

    /// A wiring invariant did not hold after resolution.
    #[error("internal wiring error: {0}")]
    Internal(String),

    /// No core is associated with a kind present in the model.
    #[error("no core is associated with {kind} blocks")]
    MissingAssociation {
        /// The unmapped kind.
        kind: BlockKind,
    },

    /// A summation that does not end up with exactly two operands.
    #[error("summation '{name}' has {count} operand(s), expected exactly 2")]
    SummationOperands {
        /// Block name.
        name: String,
        /// Operands found.
        count: usize,
    },

    /// A gain block without a coefficient.
    #[error("gain block '{name}' has no coefficient")]
    MissingGain {
        /// Block name.
        name: String,
    },

    /// A block whose input or output was never bound.
    #[error("block '{name}' ({kind}) was left unconnected")]
    Unresolved {
        /// Block name.
        name: String,
        /// Block kind.
        kind: BlockKind,
    },

    /// A kind that has no instance recipe.
    #[error("no instance recipe for block '{name}' ({kind})")]
    NoRecipe {
        /// Block name.
        name: String,
        /// Block kind.
        kind: BlockKind,
    },

    /// A custom module template could not be read.
    #[error("failed to read module template: {0}")]
    Template(#[from] std::io::Error),
}

impl NetlistError {
    /// The stable diagnostic code for this error.
    pub fn code(&self) -> DiagnosticCode {
        let number = match self {
            NetlistError::AmbiguousEntry { .. } => 201,
            NetlistError::AmbiguousExit { .. } => 202,
            NetlistError::UnsupportedFanIn { .. } => 203,
            NetlistError::Internal(_) => 204,
            NetlistError::MissingAssociation { .. } => 301,
            NetlistError::SummationOperands { .. } => 302,
            NetlistError::MissingGain { .. } => 303,
            NetlistError::Unresolved { .. } => 304,
            NetlistError::NoRecipe { .. } => 305,
            NetlistError::Template(_) => 306,
        };
        DiagnosticCode::error(number)
    }

    /// Converts this error into a renderable diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code(), self.to_string());
        match self {
            NetlistError::AmbiguousEntry { blocks } | NetlistError::AmbiguousExit { blocks } => {
                if blocks.is_empty() {
                    diag.with_note("the model has no blocks left after simplification")
                } else {
                    diag.with_note(format!("candidates: {}", blocks.join(", ")))
                }
            }
            NetlistError::UnsupportedFanIn { name, kind, .. }
            | NetlistError::Unresolved { name, kind }
            | NetlistError::NoRecipe { name, kind } => {
                diag.at(Location::typed(name, kind.model_name()))
            }
            NetlistError::SummationOperands { name, .. } => diag
                .at(Location::typed(name, BlockKind::Summation.model_name()))
                .with_help("split wider sums into a chain of two-input summations"),
            NetlistError::MissingGain { name } => {
                diag.at(Location::typed(name, BlockKind::Gain.model_name()))
            }
            NetlistError::MissingAssociation { kind } => diag.with_help(format!(
                "add `{} = \"<core>\"` under [cores.map] in blockhdl.toml",
                kind.model_name()
            )),
            NetlistError::Internal(_) | NetlistError::Template(_) => diag,
        }
    }
}

/// Any failure of the end-to-end generation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The model could not be loaded or simplified.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// The simplified model could not be wired or emitted.
    #[error(transparent)]
    Netlist(#[from] NetlistError),
}

impl GenerateError {
    /// Converts this error into a renderable diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            GenerateError::Graph(e) => e.to_diagnostic(),
            GenerateError::Netlist(e) => e.to_diagnostic(),
        }
    }
}
