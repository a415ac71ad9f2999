//! Wiring resolution: binding every block's input and output to a [`Net`].
//!
//! Blocks are visited once each, in model order. A visit first binds the
//! block's input, reusing a predecessor's output wire when one exists, then
//! binds its output, reusing a successor's input wire when one exists. Fresh
//! wires are allocated only when nothing can be reused, and are handed to
//! every neighbour that still lacks a signal on that side.
//!
//! The block without predecessors is the model's entry. Its input is the
//! only wire with no writer; that speculative wire is retired and the entry
//! reads the module input instead. The block without successors drives the
//! module output directly.

use crate::error::NetlistError;
use crate::wire::{Boundary, Net, WireId, WireTable};
use blockhdl_config::{ProjectConfig, SIGMA_DELTA_WIDTH};
use blockhdl_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use blockhdl_graph::{Block, BlockGraph, BlockId, BlockKind};
use std::collections::{BTreeMap, BTreeSet};

/// Settings that shape wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WiringOptions {
    /// Width of every generated wire.
    pub wire_width: u32,
    /// Whether the module input passes through a modulator before the entry block.
    pub modulator: bool,
}

impl Default for WiringOptions {
    fn default() -> Self {
        Self {
            wire_width: SIGMA_DELTA_WIDTH,
            modulator: false,
        }
    }
}

impl WiringOptions {
    /// Derives the options from the project's port settings.
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self {
            wire_width: SIGMA_DELTA_WIDTH,
            modulator: config.ports.input.needs_modulator(),
        }
    }
}

/// The input side of a wired block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InSignal {
    /// Not bound yet.
    Unset,
    /// The single input of an ordinary block.
    Single(Net),
    /// The operand list of a summation, in binding order.
    Operands(Vec<Net>),
}

impl InSignal {
    /// The bound net of a single-input block.
    pub fn single(&self) -> Option<Net> {
        match self {
            InSignal::Single(net) => Some(*net),
            _ => None,
        }
    }

    /// Every net read on the input side.
    pub fn nets(&self) -> &[Net] {
        match self {
            InSignal::Unset => &[],
            InSignal::Single(net) => std::slice::from_ref(net),
            InSignal::Operands(nets) => nets,
        }
    }

    /// Whether at least one input net is bound.
    pub fn is_set(&self) -> bool {
        !self.nets().is_empty()
    }
}

/// A surviving block together with the nets bound to its ports.
#[derive(Debug, Clone)]
pub struct WiredBlock {
    /// The block as left by simplification.
    pub block: Block,
    /// What the block reads.
    pub in_signal: InSignal,
    /// What the block drives.
    pub out_signal: Option<Net>,
}

impl WiredBlock {
    fn new(block: &Block) -> Self {
        let in_signal = if block.kind == BlockKind::Summation {
            InSignal::Operands(Vec::new())
        } else {
            InSignal::Unset
        };
        Self {
            block: block.clone(),
            in_signal,
            out_signal: None,
        }
    }

    fn is_summation(&self) -> bool {
        self.block.kind == BlockKind::Summation
    }
}

/// The fully wired model.
#[derive(Debug, Clone)]
pub struct WiredNetlist {
    /// Wired blocks, keyed and ordered by block ID.
    pub blocks: BTreeMap<BlockId, WiredBlock>,
    /// All generated wires.
    pub wires: WireTable,
    /// The block reading the module input.
    pub entry: BlockId,
    /// The block driving the module output.
    pub exit: BlockId,
    /// What the entry block reads: `in`, or the modulator output.
    pub entry_net: Net,
    /// The modulator output wire, when a modulator is inserted.
    pub modulator: Option<WireId>,
}

impl WiredNetlist {
    /// Wired blocks in visit order.
    pub fn iter(&self) -> impl Iterator<Item = &WiredBlock> {
        self.blocks.values()
    }

    /// Blocks that drive `net`.
    pub fn writers(&self, net: Net) -> Vec<BlockId> {
        self.iter()
            .filter(|w| w.out_signal == Some(net))
            .map(|w| w.block.id)
            .collect()
    }

    /// Blocks that read `net`.
    pub fn readers(&self, net: Net) -> Vec<BlockId> {
        self.iter()
            .filter(|w| w.in_signal.nets().contains(&net))
            .map(|w| w.block.id)
            .collect()
    }
}

/// Rejects ordinary blocks fed by more than one signal.
pub fn check_fan_in(block: &Block) -> Result<(), NetlistError> {
    if block.kind != BlockKind::Summation && block.fan_in() > 1 {
        return Err(NetlistError::UnsupportedFanIn {
            name: block.name.clone(),
            kind: block.kind,
            count: block.fan_in(),
        });
    }
    Ok(())
}

/// Binds every live block of a simplified graph to nets.
pub fn resolve(
    graph: &BlockGraph,
    options: &WiringOptions,
    sink: &DiagnosticSink,
) -> Result<WiredNetlist, NetlistError> {
    for block in graph.live_blocks() {
        check_fan_in(block)?;
    }
    let entry = single_block(graph, graph.entry_blocks(), |blocks| {
        NetlistError::AmbiguousEntry { blocks }
    })?;
    let exit = single_block(graph, graph.exit_blocks(), |blocks| {
        NetlistError::AmbiguousExit { blocks }
    })?;

    let mut resolver = Resolver {
        blocks: graph
            .live_blocks()
            .map(|b| (b.id, WiredBlock::new(b)))
            .collect(),
        wires: WireTable::new(),
        width: options.wire_width,
        sink,
    };

    let modulator = options.modulator.then(|| {
        let wire = resolver.wires.alloc(options.wire_width);
        sink.emit(Diagnostic::note(
            DiagnosticCode::note(205),
            format!("inserted input modulator driving {wire}"),
        ));
        wire
    });
    let entry_net = modulator.map_or(Net::Boundary(Boundary::Input), Net::Wire);

    let order: Vec<BlockId> = resolver.blocks.keys().copied().collect();
    for id in order {
        resolver.wire_input(id)?;
        resolver.wire_output(id)?;
    }
    resolver.bind_entry(entry, entry_net, modulator)?;
    resolver.bind_model_input_reads(entry_net)?;

    Ok(WiredNetlist {
        blocks: resolver.blocks,
        wires: resolver.wires,
        entry,
        exit,
        entry_net,
        modulator,
    })
}

fn single_block(
    graph: &BlockGraph,
    candidates: Vec<BlockId>,
    error: impl FnOnce(Vec<String>) -> NetlistError,
) -> Result<BlockId, NetlistError> {
    match candidates.as_slice() {
        [only] => Ok(*only),
        _ => Err(error(
            candidates
                .iter()
                .map(|&id| graph.block(id).name.clone())
                .collect(),
        )),
    }
}

struct Resolver<'a> {
    blocks: BTreeMap<BlockId, WiredBlock>,
    wires: WireTable,
    width: u32,
    sink: &'a DiagnosticSink,
}

impl Resolver<'_> {
    fn get(&self, id: BlockId) -> Result<&WiredBlock, NetlistError> {
        self.blocks
            .get(&id)
            .ok_or_else(|| NetlistError::Internal(format!("block {id} is not live")))
    }

    fn get_mut(&mut self, id: BlockId) -> Result<&mut WiredBlock, NetlistError> {
        self.blocks
            .get_mut(&id)
            .ok_or_else(|| NetlistError::Internal(format!("block {id} is not live")))
    }

    fn alloc(&mut self, id: BlockId, side: &str) -> Result<WireId, NetlistError> {
        let wire = self.wires.alloc(self.width);
        let block = &self.get(id)?.block;
        self.sink.emit(
            Diagnostic::note(
                DiagnosticCode::note(201),
                format!("allocated {wire} for the {side} of '{}'", block.name),
            )
            .at(block.location()),
        );
        Ok(wire)
    }

    fn note_reuse(&self, id: BlockId, net: Net, side: &str) -> Result<(), NetlistError> {
        let block = &self.get(id)?.block;
        self.sink.emit(
            Diagnostic::note(
                DiagnosticCode::note(202),
                format!("reused {net} for the {side} of '{}'", block.name),
            )
            .at(block.location()),
        );
        Ok(())
    }

    fn push_operand(&mut self, id: BlockId, net: Net) -> Result<(), NetlistError> {
        let wired = self.get_mut(id)?;
        match &mut wired.in_signal {
            InSignal::Operands(nets) => {
                if !nets.contains(&net) {
                    nets.push(net);
                }
                Ok(())
            }
            _ => Err(NetlistError::Internal(format!(
                "'{}' is not a summation",
                wired.block.name
            ))),
        }
    }

    fn set_output(&mut self, id: BlockId, net: Net) -> Result<(), NetlistError> {
        self.get_mut(id)?.out_signal = Some(net);
        Ok(())
    }

    fn wire_input(&mut self, id: BlockId) -> Result<(), NetlistError> {
        let wired = self.get(id)?;
        let preds: Vec<BlockId> = wired.block.inputs.iter().copied().collect();
        let already_bound = wired.in_signal.is_set();

        if wired.is_summation() {
            for pred in &preds {
                match self.get(*pred)?.out_signal {
                    Some(net) => {
                        self.note_reuse(id, net, "input")?;
                        self.push_operand(id, net)?;
                    }
                    None => {
                        let wire = self.alloc(id, "input")?;
                        self.set_output(*pred, wire.into())?;
                        self.push_operand(id, wire.into())?;
                    }
                }
            }
            if preds.is_empty() {
                let wire = self.alloc(id, "input")?;
                self.push_operand(id, wire.into())?;
            }
            return Ok(());
        }

        if already_bound {
            return Ok(());
        }
        let mut reusable = None;
        for pred in &preds {
            if let Some(net) = self.get(*pred)?.out_signal {
                reusable = Some(net);
                break;
            }
        }
        match reusable {
            Some(net) => {
                self.note_reuse(id, net, "input")?;
                self.get_mut(id)?.in_signal = InSignal::Single(net);
            }
            None => {
                let wire = self.alloc(id, "input")?;
                self.get_mut(id)?.in_signal = InSignal::Single(wire.into());
                for pred in &preds {
                    if self.get(*pred)?.out_signal.is_none() {
                        self.set_output(*pred, wire.into())?;
                    }
                }
            }
        }
        Ok(())
    }

    fn wire_output(&mut self, id: BlockId) -> Result<(), NetlistError> {
        let wired = self.get(id)?;
        if wired.out_signal.is_some() {
            return Ok(());
        }
        let succs: Vec<BlockId> = wired.block.outputs.iter().copied().collect();

        if succs.is_empty() {
            let out = Net::Boundary(Boundary::Output);
            self.set_output(id, out)?;
            let block = &self.get(id)?.block;
            self.sink.emit(
                Diagnostic::note(DiagnosticCode::note(204), "exit block drives the module output")
                    .at(block.location()),
            );
            return Ok(());
        }

        for succ in &succs {
            let target = self.get(*succ)?;
            if let Some(net) = target.in_signal.single().filter(|_| !target.is_summation()) {
                self.note_reuse(id, net, "output")?;
                return self.set_output(id, net);
            }
        }

        let wire = self.alloc(id, "output")?;
        self.set_output(id, wire.into())?;
        for succ in &succs {
            let target = self.get_mut(*succ)?;
            if target.is_summation() {
                self.push_operand(*succ, wire.into())?;
            } else if !target.in_signal.is_set() {
                target.in_signal = InSignal::Single(wire.into());
            }
        }
        Ok(())
    }

    /// Retires the entry's speculative wire and binds the entry to `entry_net`.
    fn bind_entry(
        &mut self,
        entry: BlockId,
        entry_net: Net,
        modulator: Option<WireId>,
    ) -> Result<(), NetlistError> {
        let driven: BTreeSet<WireId> = self
            .blocks
            .values()
            .filter_map(|w| w.out_signal.and_then(Net::wire))
            .collect();
        let free: BTreeSet<WireId> = self
            .wires
            .allocated()
            .filter(|w| !driven.contains(w) && Some(*w) != modulator)
            .collect();

        let wired = self.get(entry)?;
        let speculative: BTreeSet<WireId> = wired
            .in_signal
            .nets()
            .iter()
            .filter_map(|n| n.wire())
            .collect();
        if free != speculative || free.len() != 1 {
            return Err(NetlistError::Internal(format!(
                "undriven wires {{{}}} do not match the input of entry block '{}'",
                free.iter()
                    .map(WireId::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                wired.block.name
            )));
        }
        let Some(&retired) = free.first() else {
            return Err(NetlistError::Internal("no undriven wire".to_string()));
        };

        self.wires.retire(retired);
        let wired = self.get_mut(entry)?;
        wired.in_signal = match &wired.in_signal {
            InSignal::Operands(nets) => InSignal::Operands(
                nets.iter()
                    .map(|&n| if n == Net::Wire(retired) { entry_net } else { n })
                    .collect(),
            ),
            _ => InSignal::Single(entry_net),
        };
        let location = wired.block.location();
        self.sink.emit(
            Diagnostic::note(
                DiagnosticCode::note(203),
                format!("entry block reads {entry_net}; retired {retired}"),
            )
            .at(location),
        );
        Ok(())
    }

    /// Adds the entry net as an operand of every summation that reads the
    /// module input directly.
    fn bind_model_input_reads(&mut self, entry_net: Net) -> Result<(), NetlistError> {
        let readers: Vec<BlockId> = self
            .blocks
            .values()
            .filter(|w| w.block.reads_model_input && w.is_summation())
            .map(|w| w.block.id)
            .collect();
        for id in readers {
            self.push_operand(id, entry_net)?;
        }
        Ok(())
    }
}
