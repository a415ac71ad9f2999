//! Signals of the generated netlist.
//!
//! A [`Net`] is either a generated wire, owned by a [`WireTable`], or one of
//! the four fixed module boundary ports. The two live in separate enum
//! variants, so a generated name can never shadow a port.

use blockhdl_graph::arena::Arena;
use blockhdl_graph::define_id;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

define_id!(
    /// Opaque ID for a generated wire. Rendered as `wire_<n>`.
    WireId
);

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wire_{}", self.as_raw())
    }
}

/// A generated wire declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wire {
    /// The wire's ID.
    pub id: WireId,
    /// Width in bits.
    pub width: u32,
}

/// A module boundary port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Boundary {
    /// `clk`
    Clock,
    /// `reset`
    Reset,
    /// `in`
    Input,
    /// `out`
    Output,
}

impl Boundary {
    /// The port name in the generated module.
    pub fn name(self) -> &'static str {
        match self {
            Boundary::Clock => "clk",
            Boundary::Reset => "reset",
            Boundary::Input => "in",
            Boundary::Output => "out",
        }
    }
}

/// A signal a core port can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Net {
    /// A generated internal wire.
    Wire(WireId),
    /// A module port.
    Boundary(Boundary),
}

impl Net {
    /// The wire behind this net, if it is a generated one.
    pub fn wire(self) -> Option<WireId> {
        match self {
            Net::Wire(id) => Some(id),
            Net::Boundary(_) => None,
        }
    }
}

impl fmt::Display for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Net::Wire(id) => write!(f, "{id}"),
            Net::Boundary(port) => f.write_str(port.name()),
        }
    }
}

/// Serializes as the name bound in the generated Verilog.
impl Serialize for Net {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<WireId> for Net {
    fn from(id: WireId) -> Self {
        Net::Wire(id)
    }
}

/// Allocates wires with a monotonically increasing counter.
///
/// Wire numbers are never reused. Retiring a wire removes its declaration
/// but leaves the number consumed.
#[derive(Debug, Clone, Default)]
pub struct WireTable {
    wires: Arena<WireId, Wire>,
    retired: BTreeSet<WireId>,
}

impl WireTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh wire of the given width.
    pub fn alloc(&mut self, width: u32) -> WireId {
        let id = self.wires.next_id();
        self.wires.alloc(Wire { id, width })
    }

    /// Drops a wire's declaration.
    pub fn retire(&mut self, id: WireId) {
        self.retired.insert(id);
    }

    /// Whether a wire has been retired.
    pub fn is_retired(&self, id: WireId) -> bool {
        self.retired.contains(&id)
    }

    /// Every wire ever allocated, retired or not.
    pub fn allocated(&self) -> impl Iterator<Item = WireId> + '_ {
        self.wires.ids()
    }

    /// Live wires, in allocation order.
    pub fn declared(&self) -> impl Iterator<Item = &Wire> {
        self.wires
            .iter()
            .filter(|(id, _)| !self.retired.contains(id))
            .map(|(_, wire)| wire)
    }

    /// Number of live wires.
    pub fn declared_count(&self) -> usize {
        self.wires.len() - self.retired.len()
    }

    /// Renders one `wire [W-1:0] wire_<n>;` line per live wire.
    pub fn render_declarations(&self) -> String {
        self.declared()
            .map(|w| format!("    wire [{}:0] {};\n", w.width.saturating_sub(1), w.id))
            .collect()
    }
}
