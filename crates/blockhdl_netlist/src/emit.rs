//! Netlist emission: one core instance per wired block.
//!
//! Emission is all-or-nothing. [`preflight`] checks every precondition up
//! front so that no text is produced for a model that would fail halfway.

use crate::error::NetlistError;
use crate::resolve::{check_fan_in, WiredBlock, WiredNetlist};
use crate::wire::{Boundary, Net};
use blockhdl_config::{CoreAssociation, CoresConfig, ProjectConfig};
use blockhdl_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use blockhdl_graph::BlockKind;
use std::collections::BTreeMap;
use std::fmt::{self, Write};
use std::path::PathBuf;

/// A single instantiated core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// Core module name.
    pub core: String,
    /// Instance name, `<core>_<n>`.
    pub name: String,
    /// The model block this instance implements; `None` for the modulator.
    pub block: Option<String>,
    /// Parameter overrides, in recipe order.
    pub params: Vec<(String, String)>,
    /// Port bindings, in recipe order.
    pub ports: Vec<(String, String)>,
}

impl Instance {
    fn new(core: &str, name: String, block: Option<String>) -> Self {
        Self {
            core: core.to_string(),
            name,
            block,
            params: Vec::new(),
            ports: Vec::new(),
        }
    }

    fn param(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }

    fn port(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.ports.push((name.to_string(), value.to_string()));
        self
    }

    /// Looks up a port binding by port name.
    pub fn binding(&self, port: &str) -> Option<&str> {
        self.ports
            .iter()
            .find(|(name, _)| name == port)
            .map(|(_, value)| value.as_str())
    }

    /// Renders the instance as Verilog.
    pub fn render(&self) -> String {
        let mut out = format!("    {}", self.core);
        if !self.params.is_empty() {
            out.push_str(" #(\n");
            out.push_str(&render_bindings(&self.params));
            out.push_str("\n    )");
        }
        let _ = write!(
            out,
            " {} (\n{}\n    );\n",
            self.name,
            render_bindings(&self.ports)
        );
        out
    }
}

fn render_bindings(bindings: &[(String, String)]) -> String {
    bindings
        .iter()
        .map(|(name, value)| format!("        .{name}({value})"))
        .collect::<Vec<_>>()
        .join(",\n")
}

/// The emitted module body.
#[derive(Debug, Clone, Default)]
pub struct Netlist {
    /// `wire` declarations, one per line.
    pub declarations: String,
    /// Instances in wiring visit order.
    pub instances: Vec<Instance>,
    /// Every core used, with its source file.
    pub cores: BTreeMap<String, PathBuf>,
}

impl Netlist {
    /// Renders declarations followed by every instance.
    pub fn body(&self) -> String {
        let mut out = String::new();
        if !self.declarations.is_empty() {
            out.push_str(&self.declarations);
            out.push('\n');
        }
        for instance in &self.instances {
            out.push_str(&instance.render());
            out.push('\n');
        }
        out
    }

    /// Comma-separated names of the cores used, sorted.
    pub fn used_cores(&self) -> String {
        self.cores.keys().cloned().collect::<Vec<_>>().join(", ")
    }

    /// Finds the instance generated for a model block.
    pub fn instance_for(&self, block: &str) -> Option<&Instance> {
        self.instances
            .iter()
            .find(|i| i.block.as_deref() == Some(block))
    }
}

/// Checks every emission precondition without producing output.
pub fn preflight(wired: &WiredNetlist, cores: &CoresConfig) -> Result<(), NetlistError> {
    for w in wired.iter() {
        let block = &w.block;
        if block.kind.is_structural() {
            return Err(NetlistError::NoRecipe {
                name: block.name.clone(),
                kind: block.kind,
            });
        }
        if cores.association(block.kind).is_none() {
            return Err(NetlistError::MissingAssociation { kind: block.kind });
        }
    }
    for w in wired.iter() {
        if !w.in_signal.is_set() || w.out_signal.is_none() {
            return Err(NetlistError::Unresolved {
                name: w.block.name.clone(),
                kind: w.block.kind,
            });
        }
    }
    for w in wired.iter() {
        let block = &w.block;
        match block.kind {
            BlockKind::Summation => {
                let count = w.in_signal.nets().len().max(block.fan_in());
                if count != 2 {
                    return Err(NetlistError::SummationOperands {
                        name: block.name.clone(),
                        count,
                    });
                }
            }
            BlockKind::Gain if block.gain.is_none() => {
                return Err(NetlistError::MissingGain {
                    name: block.name.clone(),
                });
            }
            _ => check_fan_in(block)?,
        }
    }
    Ok(())
}

/// Emits one instance per wired block, preceded by the input modulator if any.
pub fn emit(
    wired: &WiredNetlist,
    config: &ProjectConfig,
    sink: &DiagnosticSink,
) -> Result<Netlist, NetlistError> {
    preflight(wired, &config.cores)?;

    let mut emitter = Emitter {
        netlist: Netlist {
            declarations: wired.wires.render_declarations(),
            ..Netlist::default()
        },
        counters: BTreeMap::new(),
    };

    if let Some(wire) = wired.modulator {
        let core = config.cores.modulator_association();
        let instance = emitter
            .instance(&core, None)
            .param("N", config.ports.input.width())
            .param("k", 1)
            .param("ext_feedback", 0)
            .param("bin", 1)
            .port("x", Net::Boundary(Boundary::Input))
            .port("y_feedback", 0)
            .port("y", Net::Wire(wire));
        emitter.push(instance, sink);
    }

    for w in wired.iter() {
        let core = config
            .cores
            .association(w.block.kind)
            .ok_or(NetlistError::MissingAssociation { kind: w.block.kind })?;
        let instance = emitter.instance(&core, Some(w.block.name.clone()));
        let instance = recipe(instance, w)?;
        emitter.push(instance, sink);
    }

    Ok(emitter.netlist)
}

struct Emitter {
    netlist: Netlist,
    counters: BTreeMap<String, usize>,
}

impl Emitter {
    fn instance(&mut self, core: &CoreAssociation, block: Option<String>) -> Instance {
        let counter = self.counters.entry(core.name.clone()).or_insert(0);
        let name = format!("{}_{}", core.name, counter);
        *counter += 1;
        self.netlist
            .cores
            .insert(core.name.clone(), core.path.clone());
        Instance::new(&core.name, name, block)
    }

    fn push(&mut self, instance: Instance, sink: &DiagnosticSink) {
        let instance = instance
            .port("clk", Net::Boundary(Boundary::Clock))
            .port("rst", Net::Boundary(Boundary::Reset));
        sink.emit(Diagnostic::note(
            DiagnosticCode::note(301),
            match &instance.block {
                Some(block) => format!("instantiated {} for block '{block}'", instance.name),
                None => format!("instantiated {} for the module input", instance.name),
            },
        ));
        self.netlist.instances.push(instance);
    }
}

fn input(w: &WiredBlock) -> Result<Net, NetlistError> {
    w.in_signal.single().ok_or_else(|| unresolved(w))
}

fn output(w: &WiredBlock) -> Result<Net, NetlistError> {
    w.out_signal.ok_or_else(|| unresolved(w))
}

fn unresolved(w: &WiredBlock) -> NetlistError {
    NetlistError::Unresolved {
        name: w.block.name.clone(),
        kind: w.block.kind,
    }
}

/// Formats a gain coefficient as a real literal (`2.0`, `-0.5`).
fn coefficient(k: f64) -> String {
    format!("{k:?}")
}

fn recipe(instance: Instance, w: &WiredBlock) -> Result<Instance, NetlistError> {
    let block = &w.block;
    let instance = match block.kind {
        BlockKind::Gain => {
            let k = block.gain.ok_or_else(|| NetlistError::MissingGain {
                name: block.name.clone(),
            })?;
            instance
                .param("N", 16)
                .param("outN", 2)
                .param("intN", 0)
                .param("bin", 0)
                .port("x", input(w)?)
                .port("kp", coefficient(k))
                .port("kn", coefficient(-k))
                .port("y", output(w)?)
        }
        BlockKind::Summation => {
            let [x, y] = w.in_signal.nets() else {
                return Err(NetlistError::SummationOperands {
                    name: block.name.clone(),
                    count: w.in_signal.nets().len(),
                });
            };
            instance
                .param("bin", 0)
                .param("N", 3)
                .port("x", x)
                .port("y", y)
                .port("s", output(w)?)
        }
        BlockKind::Differentiator => instance
            .param("N", 15)
            .param("k", 5)
            .param("bin", 0)
            .port("x", input(w)?)
            .port("y", output(w)?)
            .port("y_pcm", 0),
        BlockKind::Integrator => instance
            .param("N", 31)
            .param("Nmod", "N + 1")
            .param("bin", 1)
            .param("doWin", 0)
            .param("doSrst", 0)
            .param("doRVin", 0)
            .param("doEn", 0)
            .port("w", 0)
            .port("x", input(w)?)
            .port("k", 1)
            .port("rst_value", 0)
            .port("sync_rst", 0)
            .port("enable", 0)
            .port("y", output(w)?)
            .port("pcm_y", 0),
        BlockKind::Splitter => {
            return Err(NetlistError::NoRecipe {
                name: block.name.clone(),
                kind: block.kind,
            })
        }
    };
    Ok(instance)
}
