//! The closed vocabulary of block kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of a block in the dataflow model.
///
/// Kinds are spelled in model descriptions and configuration files by their
/// Xcos interface function names (`GAIN_f`, ...); lowercase aliases are
/// accepted as well. Serialization always uses the interface function name.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum BlockKind {
    /// Continuous integrator.
    Integrator,
    /// Derivative block.
    Differentiator,
    /// Multiplication by a constant coefficient.
    Gain,
    /// Two-operand adder.
    Summation,
    /// Pure fan-out point; never survives simplification.
    Splitter,
}

impl BlockKind {
    /// Every kind, in declaration order.
    pub const ALL: [BlockKind; 5] = [
        BlockKind::Integrator,
        BlockKind::Differentiator,
        BlockKind::Gain,
        BlockKind::Summation,
        BlockKind::Splitter,
    ];

    /// The name used for this kind in model descriptions.
    pub fn model_name(self) -> &'static str {
        match self {
            BlockKind::Integrator => "INTEGRAL_f",
            BlockKind::Differentiator => "DIFF_f",
            BlockKind::Gain => "GAIN_f",
            BlockKind::Summation => "SUM_f",
            BlockKind::Splitter => "SPLIT",
        }
    }

    fn alias(self) -> &'static str {
        match self {
            BlockKind::Integrator => "integrator",
            BlockKind::Differentiator => "differentiator",
            BlockKind::Gain => "gain",
            BlockKind::Summation => "summation",
            BlockKind::Splitter => "splitter",
        }
    }

    /// Whether this kind is purely structural and never becomes an instance.
    pub fn is_structural(self) -> bool {
        self == BlockKind::Splitter
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.model_name())
    }
}

/// Error returned when a kind name is outside the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown block kind '{0}'")]
pub struct UnknownKind(pub String);

impl From<BlockKind> for &'static str {
    fn from(kind: BlockKind) -> Self {
        kind.model_name()
    }
}

impl TryFrom<String> for BlockKind {
    type Error = UnknownKind;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl FromStr for BlockKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockKind::ALL
            .into_iter()
            .find(|k| k.model_name() == s || k.alias() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_model_names_and_aliases() {
        assert_eq!("GAIN_f".parse::<BlockKind>(), Ok(BlockKind::Gain));
        assert_eq!("summation".parse::<BlockKind>(), Ok(BlockKind::Summation));
        assert_eq!("SPLIT".parse::<BlockKind>(), Ok(BlockKind::Splitter));
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "CLOCK_c".parse::<BlockKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown block kind 'CLOCK_c'");
    }

    #[test]
    fn display_uses_model_name() {
        assert_eq!(BlockKind::Integrator.to_string(), "INTEGRAL_f");
    }

    #[test]
    fn serde_matches_from_str() {
        for kind in BlockKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.model_name()));
            let alias: BlockKind = serde_json::from_str(&format!("\"{}\"", kind.alias())).unwrap();
            assert_eq!(alias, kind);
        }
    }

    #[test]
    fn only_splitter_is_structural() {
        let structural: Vec<_> = BlockKind::ALL
            .into_iter()
            .filter(|k| k.is_structural())
            .collect();
        assert_eq!(structural, vec![BlockKind::Splitter]);
    }
}
