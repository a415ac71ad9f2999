//! Model descriptions: the serialized block list and link list a graph is built from.
//!
//! A description is what a model importer produces after unpacking the
//! diagram and resolving block parameters:
//!
//! ```json
//! {
//!   "name": "regulator",
//!   "blocks": [
//!     { "id": "g1", "kind": "GAIN_f", "gain": 2.0 },
//!     { "id": "s1", "kind": "SUM_f" }
//!   ],
//!   "links": [
//!     { "source": "g1", "target": "s1" },
//!     { "source": "in", "target": "s1" }
//!   ]
//! }
//! ```
//!
//! The reserved endpoints [`MODEL_INPUT`] and [`MODEL_OUTPUT`] stand for the
//! module boundary rather than blocks.

use crate::error::GraphError;
use crate::graph::BlockGraph;
use crate::kind::BlockKind;
use blockhdl_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Location};
use serde::Deserialize;
use std::path::Path;

/// Link endpoint naming the module's external input.
pub const MODEL_INPUT: &str = "in";

/// Link endpoint naming the module's external output.
pub const MODEL_OUTPUT: &str = "out";

/// A parsed model description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelDescription {
    /// Optional diagram title.
    #[serde(default)]
    pub name: Option<String>,
    /// All blocks, in diagram order.
    pub blocks: Vec<BlockRecord>,
    /// Directed links between blocks or boundary endpoints.
    #[serde(default)]
    pub links: Vec<LinkRecord>,
}

/// One block of a model description.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockRecord {
    /// Unique block identifier.
    pub id: String,
    /// Kind name, e.g. `GAIN_f`.
    pub kind: String,
    /// Gain coefficient (gain blocks only).
    #[serde(default)]
    pub gain: Option<f64>,
}

/// One directed link of a model description.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkRecord {
    /// Source block id, or [`MODEL_INPUT`].
    pub source: String,
    /// Target block id, or [`MODEL_OUTPUT`].
    pub target: String,
}

impl ModelDescription {
    /// Parses a description from JSON text.
    pub fn from_json(content: &str) -> Result<Self, GraphError> {
        serde_json::from_str(content).map_err(|e| GraphError::Parse(e.to_string()))
    }

    /// Reads and parses a description file.
    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Builds the raw block graph.
    ///
    /// Fails on unknown kinds, duplicate or reserved ids, and links whose
    /// endpoints are not blocks of this model.
    pub fn build_graph(&self, sink: &DiagnosticSink) -> Result<BlockGraph, GraphError> {
        let mut graph = BlockGraph::new();

        for record in &self.blocks {
            if record.id == MODEL_INPUT || record.id == MODEL_OUTPUT {
                return Err(GraphError::ReservedName {
                    name: record.id.clone(),
                });
            }
            let kind: BlockKind = record.kind.parse().map_err(|_| GraphError::UnknownKind {
                name: record.id.clone(),
                kind: record.kind.clone(),
            })?;
            let gain = match (kind, record.gain) {
                (BlockKind::Gain, gain) => gain,
                (_, Some(_)) => {
                    sink.emit(
                        Diagnostic::warning(
                            DiagnosticCode::warning(101),
                            "gain coefficient ignored on a block that is not a gain",
                        )
                        .at(Location::typed(&record.id, kind.model_name())),
                    );
                    None
                }
                (_, None) => None,
            };
            let id = graph.add_block(record.id.clone(), kind, gain)?;
            let block = graph.block(id);
            let message = match block.gain {
                Some(k) => format!("found block {kind} '{}', k = {k}", block.name),
                None => format!("found block {kind} '{}'", block.name),
            };
            sink.emit(Diagnostic::note(DiagnosticCode::note(101), message));
        }

        for link in &self.links {
            if link.target == MODEL_OUTPUT {
                continue;
            }
            let target = graph.find(&link.target)?;
            if link.source == MODEL_INPUT {
                graph.set_reads_model_input(target, true);
                sink.emit(Diagnostic::note(
                    DiagnosticCode::note(102),
                    format!("connected model input -> '{}'", link.target),
                ));
                continue;
            }
            let source = graph.find(&link.source)?;
            graph.connect(source, target);
            sink.emit(Diagnostic::note(
                DiagnosticCode::note(102),
                format!(
                    "connected {} '{}' -> {} '{}'",
                    graph.block(source).kind,
                    link.source,
                    graph.block(target).kind,
                    link.target
                ),
            ));
        }

        Ok(graph)
    }
}
