//! The mutable block graph shared by the simplification and wiring passes.
//!
//! Blocks live in an [`Arena`] and refer to each other only by [`BlockId`].
//! Every edge is stored twice, once in the source's `outputs` and once in the
//! target's `inputs`; all edge mutation goes through [`BlockGraph`] so the two
//! sides never disagree.

use crate::arena::Arena;
use crate::error::GraphError;
use crate::ids::BlockId;
use crate::kind::BlockKind;
use blockhdl_diagnostics::Location;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use std::collections::{BTreeSet, HashMap};

/// A single block of the dataflow model.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Arena ID (model order).
    pub id: BlockId,
    /// The identifier from the model description.
    pub name: String,
    /// What the block computes.
    pub kind: BlockKind,
    /// Coefficient of a gain block.
    pub gain: Option<f64>,
    /// Blocks feeding this one.
    pub inputs: BTreeSet<BlockId>,
    /// Blocks fed by this one.
    pub outputs: BTreeSet<BlockId>,
    /// Whether the block also reads the module's external input directly.
    ///
    /// This is not a graph edge: it does not count as a predecessor.
    pub reads_model_input: bool,
}

impl Block {
    /// The model location of this block, for diagnostics.
    pub fn location(&self) -> Location {
        Location::typed(&self.name, self.kind.model_name())
    }

    /// Number of data inputs, counting a direct model-input read.
    pub fn fan_in(&self) -> usize {
        self.inputs.len() + usize::from(self.reads_model_input)
    }
}

/// Owning container for all blocks of a model.
#[derive(Debug, Clone, Default)]
pub struct BlockGraph {
    blocks: Arena<BlockId, Block>,
    by_name: HashMap<String, BlockId>,
    removed: BTreeSet<BlockId>,
}

impl BlockGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a block with no edges.
    pub fn add_block(
        &mut self,
        name: impl Into<String>,
        kind: BlockKind,
        gain: Option<f64>,
    ) -> Result<BlockId, GraphError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(GraphError::DuplicateBlock { name });
        }
        let id = self.blocks.alloc(Block {
            id: self.blocks.next_id(),
            name: name.clone(),
            kind,
            gain,
            inputs: BTreeSet::new(),
            outputs: BTreeSet::new(),
            reads_model_input: false,
        });
        self.by_name.insert(name, id);
        Ok(id)
    }

    /// Looks a block up by its model identifier.
    ///
    /// Removed blocks are not found.
    pub fn find(&self, name: &str) -> Result<BlockId, GraphError> {
        self.by_name
            .get(name)
            .copied()
            .filter(|id| !self.removed.contains(id))
            .ok_or_else(|| GraphError::NotFound {
                name: name.to_string(),
            })
    }

    /// Returns the block with the given ID.
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id]
    }

    /// Records the edge `source -> target` on both endpoints.
    ///
    /// Connecting an existing edge again leaves the graph unchanged.
    pub fn connect(&mut self, source: BlockId, target: BlockId) {
        self.blocks[source].outputs.insert(target);
        self.blocks[target].inputs.insert(source);
    }

    /// Removes the edge `source -> target` from both endpoints.
    pub fn disconnect(&mut self, source: BlockId, target: BlockId) {
        self.blocks[source].outputs.remove(&target);
        self.blocks[target].inputs.remove(&source);
    }

    /// Marks a block as reading the module input directly.
    pub fn set_reads_model_input(&mut self, id: BlockId, reads: bool) {
        self.blocks[id].reads_model_input = reads;
    }

    /// Removes a block from the live set, dropping any edges it still has.
    pub fn remove(&mut self, id: BlockId) {
        let block = &self.blocks[id];
        let inputs: Vec<BlockId> = block.inputs.iter().copied().collect();
        let outputs: Vec<BlockId> = block.outputs.iter().copied().collect();
        for source in inputs {
            self.disconnect(source, id);
        }
        for target in outputs {
            self.disconnect(id, target);
        }
        self.removed.insert(id);
    }

    /// Whether a block has been removed by a pass.
    pub fn is_removed(&self, id: BlockId) -> bool {
        self.removed.contains(&id)
    }

    /// Iterates over live blocks in model order.
    pub fn live_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks
            .iter()
            .filter(|(id, _)| !self.removed.contains(id))
            .map(|(_, block)| block)
    }

    /// IDs of live blocks of the given kind, in model order.
    pub fn live_ids_of(&self, kind: BlockKind) -> Vec<BlockId> {
        self.live_blocks()
            .filter(|b| b.kind == kind)
            .map(|b| b.id)
            .collect()
    }

    /// Number of live blocks.
    pub fn len(&self) -> usize {
        self.blocks.len() - self.removed.len()
    }

    /// Whether the graph has no live blocks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.live_blocks().map(|b| b.outputs.len()).sum()
    }

    /// Live blocks without predecessors.
    pub fn entry_blocks(&self) -> Vec<BlockId> {
        self.live_blocks()
            .filter(|b| b.inputs.is_empty())
            .map(|b| b.id)
            .collect()
    }

    /// Live blocks without successors.
    pub fn exit_blocks(&self) -> Vec<BlockId> {
        self.live_blocks()
            .filter(|b| b.outputs.is_empty())
            .map(|b| b.id)
            .collect()
    }

    /// Rejects graphs that contain a directed cycle.
    pub fn check_acyclic(&self) -> Result<(), GraphError> {
        let mut topo: DiGraphMap<BlockId, ()> = DiGraphMap::new();
        for block in self.live_blocks() {
            topo.add_node(block.id);
            for &target in &block.outputs {
                topo.add_edge(block.id, target, ());
            }
        }
        toposort(&topo, None).map(|_| ()).map_err(|cycle| {
            let block = self.block(cycle.node_id());
            GraphError::Cycle {
                name: block.name.clone(),
                kind: block.kind,
            }
        })
    }

    /// Checks that every edge is recorded on both endpoints and that no live
    /// block points at a removed one.
    pub fn is_consistent(&self) -> bool {
        self.live_blocks().all(|block| {
            block.outputs.iter().all(|&t| {
                !self.is_removed(t) && self.blocks[t].inputs.contains(&block.id)
            }) && block.inputs.iter().all(|&s| {
                !self.is_removed(s) && self.blocks[s].outputs.contains(&block.id)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> (BlockGraph, BlockId, BlockId, BlockId) {
        let mut g = BlockGraph::new();
        let gain = g.add_block("g", BlockKind::Gain, Some(2.0)).unwrap();
        let sum = g.add_block("s", BlockKind::Summation, None).unwrap();
        let diff = g.add_block("d", BlockKind::Differentiator, None).unwrap();
        g.connect(gain, sum);
        g.connect(sum, diff);
        (g, gain, sum, diff)
    }

    #[test]
    fn connect_is_symmetric() {
        let (g, gain, sum, _) = chain();
        assert!(g.block(gain).outputs.contains(&sum));
        assert!(g.block(sum).inputs.contains(&gain));
        assert!(g.is_consistent());
    }

    #[test]
    fn connect_twice_is_harmless() {
        let (mut g, gain, sum, _) = chain();
        g.connect(gain, sum);
        assert_eq!(g.block(sum).inputs.len(), 1);
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn disconnect_is_symmetric() {
        let (mut g, gain, sum, _) = chain();
        g.disconnect(gain, sum);
        assert!(g.block(gain).outputs.is_empty());
        assert!(g.block(sum).inputs.is_empty());
    }

    #[test]
    fn find_by_name() {
        let (g, _, sum, _) = chain();
        assert_eq!(g.find("s").unwrap(), sum);
        assert!(matches!(
            g.find("nope"),
            Err(GraphError::NotFound { name }) if name == "nope"
        ));
    }

    #[test]
    fn duplicate_name_rejected() {
        let (mut g, ..) = chain();
        let err = g.add_block("g", BlockKind::Integrator, None).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateBlock { .. }));
    }

    #[test]
    fn remove_drops_edges_and_hides_block() {
        let (mut g, gain, sum, diff) = chain();
        g.remove(sum);
        assert!(g.is_removed(sum));
        assert!(g.find("s").is_err());
        assert!(g.block(gain).outputs.is_empty());
        assert!(g.block(diff).inputs.is_empty());
        assert_eq!(g.len(), 2);
        assert!(g.is_consistent());
    }

    #[test]
    fn entry_and_exit_blocks() {
        let (g, gain, _, diff) = chain();
        assert_eq!(g.entry_blocks(), vec![gain]);
        assert_eq!(g.exit_blocks(), vec![diff]);
    }

    #[test]
    fn fan_in_counts_model_input() {
        let (mut g, _, sum, _) = chain();
        assert_eq!(g.block(sum).fan_in(), 1);
        g.set_reads_model_input(sum, true);
        assert_eq!(g.block(sum).fan_in(), 2);
    }

    #[test]
    fn acyclic_chain_passes() {
        let (g, ..) = chain();
        assert!(g.check_acyclic().is_ok());
    }

    #[test]
    fn cycle_detected() {
        let (mut g, gain, _, diff) = chain();
        g.connect(diff, gain);
        let err = g.check_acyclic().unwrap_err();
        assert!(matches!(err, GraphError::Cycle { .. }));
    }

    #[test]
    fn live_ids_of_kind() {
        let (g, _, sum, _) = chain();
        assert_eq!(g.live_ids_of(BlockKind::Summation), vec![sum]);
        assert!(g.live_ids_of(BlockKind::Splitter).is_empty());
    }
}
