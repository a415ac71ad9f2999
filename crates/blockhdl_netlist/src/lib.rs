//! Structural Verilog generation for blockhdl.
//!
//! Takes a simplified [`BlockGraph`], binds every block to uniquely named
//! nets ([`resolve`]), instantiates one hardware core per block ([`emit`]),
//! and wraps the result in a module ([`ModuleTemplate`]). [`generate`] runs
//! the whole pipeline from a model description.

#![warn(missing_docs)]

pub mod emit;
pub mod error;
pub mod resolve;
pub mod template;
pub mod wire;

pub use emit::{emit, preflight, Instance, Netlist};
pub use error::{GenerateError, NetlistError};
pub use resolve::{resolve, InSignal, WiredBlock, WiredNetlist, WiringOptions};
pub use template::{ModuleTemplate, DEFAULT_TEMPLATE};
pub use wire::{Boundary, Net, Wire, WireId, WireTable};

use blockhdl_config::ProjectConfig;
use blockhdl_diagnostics::DiagnosticSink;
use blockhdl_graph::{simplify, BlockGraph, ModelDescription, SimplifyStats};

/// Everything produced by one generation run.
#[derive(Debug, Clone)]
pub struct Generated {
    /// The simplified graph.
    pub graph: BlockGraph,
    /// What simplification changed.
    pub stats: SimplifyStats,
    /// The wired blocks and wires.
    pub wired: WiredNetlist,
    /// The emitted instances.
    pub netlist: Netlist,
    /// The complete Verilog module.
    pub verilog: String,
}

/// Simplifies and wires a model without emitting anything.
pub fn wire_model(
    description: &ModelDescription,
    config: &ProjectConfig,
    sink: &DiagnosticSink,
) -> Result<(BlockGraph, SimplifyStats, WiredNetlist), GenerateError> {
    let mut graph = description.build_graph(sink)?;
    let stats = simplify(&mut graph, sink)?;
    let wired = resolve(&graph, &WiringOptions::from_config(config), sink)?;
    Ok((graph, stats, wired))
}

/// Runs the full pipeline: load, simplify, wire, emit, and wrap.
pub fn generate(
    description: &ModelDescription,
    config: &ProjectConfig,
    template: &ModuleTemplate,
    sink: &DiagnosticSink,
) -> Result<Generated, GenerateError> {
    let (graph, stats, wired) = wire_model(description, config, sink)?;
    let netlist = emit(&wired, config, sink)?;
    let verilog = template.render(config, &netlist);
    Ok(Generated {
        graph,
        stats,
        wired,
        netlist,
        verilog,
    })
}
