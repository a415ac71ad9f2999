//! Structural simplification of a raw block graph.
//!
//! Two kinds of blocks carry no hardware of their own and are rewritten away
//! before wiring:
//!
//! 1. **Splitters** are replaced by direct edges from their single source to
//!    each of their targets.
//! 2. **Summation chains** are flattened: a summation that only feeds another
//!    summation is spliced out and its operands are connected straight to
//!    the downstream summation.
//!
//! Neither pass changes which non-structural blocks exchange data.

use crate::error::GraphError;
use crate::graph::BlockGraph;
use crate::ids::BlockId;
use crate::kind::BlockKind;
use blockhdl_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use std::collections::VecDeque;

/// What a simplification run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimplifyStats {
    /// Splitters replaced by direct edges.
    pub splitters_removed: usize,
    /// Summations spliced into a downstream summation.
    pub summations_merged: usize,
}

impl SimplifyStats {
    /// Whether the run left the graph untouched.
    pub fn is_noop(&self) -> bool {
        self.splitters_removed == 0 && self.summations_merged == 0
    }
}

/// Runs every simplification pass over `graph`.
pub fn simplify(graph: &mut BlockGraph, sink: &DiagnosticSink) -> Result<SimplifyStats, GraphError> {
    graph.check_acyclic()?;
    let splitters_removed = eliminate_splitters(graph, sink)?;
    let summations_merged = flatten_summations(graph, sink)?;
    Ok(SimplifyStats {
        splitters_removed,
        summations_merged,
    })
}

/// Replaces every splitter by direct edges from its source to its targets.
///
/// A splitter fed by the model input hands that read on to its targets.
/// Splitters are dropped from the live set only once all of them have been
/// rewired, so chained splitters resolve in any order.
pub fn eliminate_splitters(
    graph: &mut BlockGraph,
    sink: &DiagnosticSink,
) -> Result<usize, GraphError> {
    let splitters = graph.live_ids_of(BlockKind::Splitter);

    for &id in &splitters {
        let block = graph.block(id);
        if block.fan_in() != 1 {
            return Err(GraphError::SplitterFanIn {
                name: block.name.clone(),
                count: block.fan_in(),
            });
        }
        let source = block.inputs.first().copied();
        let targets: Vec<BlockId> = block.outputs.iter().copied().collect();
        let location = block.location();

        match source {
            Some(source) => {
                graph.disconnect(source, id);
                for &target in &targets {
                    graph.disconnect(id, target);
                    graph.connect(source, target);
                }
            }
            None => {
                graph.set_reads_model_input(id, false);
                for &target in &targets {
                    graph.disconnect(id, target);
                    graph.set_reads_model_input(target, true);
                }
            }
        }

        sink.emit(
            Diagnostic::note(
                DiagnosticCode::note(110),
                format!("removed splitter, {} target(s) rewired", targets.len()),
            )
            .at(location),
        );
    }

    for &id in &splitters {
        graph.remove(id);
    }
    Ok(splitters.len())
}

/// Splices summations that feed only another summation into that summation.
///
/// Works through an explicit queue of summations. A summation that absorbed
/// an upstream summation is queued again, because the operands it inherited
/// may themselves be summations. A summation whose result is also used
/// elsewhere is a real adder and stays.
///
/// Each splice removes one block, so the queue empties after at most twice
/// the number of blocks; running past that bound means the graph was cyclic.
pub fn flatten_summations(
    graph: &mut BlockGraph,
    sink: &DiagnosticSink,
) -> Result<usize, GraphError> {
    let mut worklist: VecDeque<BlockId> = graph.live_ids_of(BlockKind::Summation).into();
    let bound = 2 * graph.len() + 1;
    let mut steps = 0;
    let mut merged = 0;

    while let Some(sum) = worklist.pop_front() {
        steps += 1;
        if steps > bound {
            let block = graph.block(sum);
            return Err(GraphError::Cycle {
                name: block.name.clone(),
                kind: block.kind,
            });
        }
        if graph.is_removed(sum) {
            continue;
        }

        let spliceable: Vec<BlockId> = graph
            .block(sum)
            .inputs
            .iter()
            .copied()
            .filter(|&pred| {
                let upstream = graph.block(pred);
                pred != sum
                    && upstream.kind == BlockKind::Summation
                    && upstream.outputs.len() == 1
            })
            .collect();

        if spliceable.is_empty() {
            continue;
        }

        for upstream in spliceable {
            splice_summation(graph, upstream, sum, sink);
            merged += 1;
        }
        worklist.push_back(sum);
    }

    Ok(merged)
}

/// Moves every operand of `upstream` onto `sum` and removes `upstream`.
fn splice_summation(
    graph: &mut BlockGraph,
    upstream: BlockId,
    sum: BlockId,
    sink: &DiagnosticSink,
) {
    graph.disconnect(upstream, sum);

    let operands: Vec<BlockId> = graph.block(upstream).inputs.iter().copied().collect();
    for operand in operands {
        graph.disconnect(operand, upstream);
        if operand == sum {
            continue;
        }
        if graph.block(sum).inputs.contains(&operand) {
            let source = graph.block(operand);
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::warning(120),
                    "block feeds the same summation twice after flattening",
                )
                .at(source.location())
                .with_note(format!(
                    "the duplicate operand of '{}' was merged into one",
                    graph.block(sum).name
                )),
            );
        }
        graph.connect(operand, sum);
    }

    if graph.block(upstream).reads_model_input {
        graph.set_reads_model_input(upstream, false);
        graph.set_reads_model_input(sum, true);
    }

    sink.emit(
        Diagnostic::note(
            DiagnosticCode::note(111),
            format!("flattened summation into '{}'", graph.block(sum).name),
        )
        .at(graph.block(upstream).location()),
    );
    graph.remove(upstream);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(g: &mut BlockGraph, name: &str, kind: BlockKind) -> BlockId {
        let gain = (kind == BlockKind::Gain).then_some(1.5);
        g.add_block(name, kind, gain).unwrap()
    }

    fn names(g: &BlockGraph, ids: &std::collections::BTreeSet<BlockId>) -> Vec<String> {
        ids.iter().map(|&id| g.block(id).name.clone()).collect()
    }

    #[test]
    fn noop_on_already_simple_graph() {
        let mut g = BlockGraph::new();
        let a = block(&mut g, "g", BlockKind::Gain);
        let b = block(&mut g, "s", BlockKind::Summation);
        let c = block(&mut g, "i", BlockKind::Integrator);
        let d = block(&mut g, "d", BlockKind::Differentiator);
        g.connect(a, b);
        g.connect(c, b);
        g.connect(b, d);
        let before = g.clone();

        let stats = simplify(&mut g, &DiagnosticSink::new()).unwrap();
        assert!(stats.is_noop());
        assert_eq!(g.len(), before.len());
        for blk in before.live_blocks() {
            assert_eq!(g.block(blk.id), blk);
        }
    }

    #[test]
    fn splitter_replaced_by_direct_edges() {
        let mut g = BlockGraph::new();
        let p = block(&mut g, "p", BlockKind::Integrator);
        let s = block(&mut g, "split", BlockKind::Splitter);
        let t1 = block(&mut g, "t1", BlockKind::Gain);
        let t2 = block(&mut g, "t2", BlockKind::Differentiator);
        g.connect(p, s);
        g.connect(s, t1);
        g.connect(s, t2);

        let sink = DiagnosticSink::new();
        let stats = simplify(&mut g, &sink).unwrap();
        assert_eq!(stats.splitters_removed, 1);

        assert_eq!(names(&g, &g.block(p).outputs), vec!["t1", "t2"]);
        assert_eq!(g.block(t1).inputs.iter().copied().collect::<Vec<_>>(), vec![p]);
        assert_eq!(g.block(t2).inputs.iter().copied().collect::<Vec<_>>(), vec![p]);
        assert!(g.is_removed(s));
        assert!(g
            .live_blocks()
            .all(|b| !b.inputs.contains(&s) && !b.outputs.contains(&s)));
        assert!(g.is_consistent());
        assert_eq!(sink.diagnostics().len(), 1);
    }

    #[test]
    fn chained_splitters_collapse_in_any_order() {
        let mut g = BlockGraph::new();
        // The downstream splitter comes first in model order.
        let s2 = block(&mut g, "split2", BlockKind::Splitter);
        let p = block(&mut g, "p", BlockKind::Gain);
        let s1 = block(&mut g, "split1", BlockKind::Splitter);
        let t1 = block(&mut g, "t1", BlockKind::Integrator);
        let t2 = block(&mut g, "t2", BlockKind::Differentiator);
        let t3 = block(&mut g, "t3", BlockKind::Differentiator);
        g.connect(p, s1);
        g.connect(s1, s2);
        g.connect(s1, t3);
        g.connect(s2, t1);
        g.connect(s2, t2);

        simplify(&mut g, &DiagnosticSink::new()).unwrap();
        assert_eq!(names(&g, &g.block(p).outputs), vec!["t1", "t2", "t3"]);
        assert!(g.is_removed(s1) && g.is_removed(s2));
        assert!(g.is_consistent());
    }

    #[test]
    fn splitter_on_model_input_marks_targets() {
        let mut g = BlockGraph::new();
        let s = block(&mut g, "split", BlockKind::Splitter);
        let gain = block(&mut g, "g", BlockKind::Gain);
        let sum = block(&mut g, "sum", BlockKind::Summation);
        g.set_reads_model_input(s, true);
        g.connect(s, gain);
        g.connect(s, sum);
        g.connect(gain, sum);

        simplify(&mut g, &DiagnosticSink::new()).unwrap();
        assert!(g.block(gain).reads_model_input);
        assert!(g.block(sum).reads_model_input);
        assert_eq!(g.block(sum).fan_in(), 2);
        assert_eq!(g.entry_blocks(), vec![gain]);
    }

    #[test]
    fn splitter_without_source_is_fatal() {
        let mut g = BlockGraph::new();
        let s = block(&mut g, "split", BlockKind::Splitter);
        let t = block(&mut g, "t", BlockKind::Gain);
        g.connect(s, t);
        let err = simplify(&mut g, &DiagnosticSink::new()).unwrap_err();
        assert!(matches!(err, GraphError::SplitterFanIn { count: 0, .. }));
    }

    #[test]
    fn splitter_with_two_sources_is_fatal() {
        let mut g = BlockGraph::new();
        let a = block(&mut g, "a", BlockKind::Gain);
        let b = block(&mut g, "b", BlockKind::Gain);
        let s = block(&mut g, "split", BlockKind::Splitter);
        let t = block(&mut g, "t", BlockKind::Differentiator);
        g.connect(a, s);
        g.connect(b, s);
        g.connect(s, t);
        let err = simplify(&mut g, &DiagnosticSink::new()).unwrap_err();
        assert!(matches!(
            err,
            GraphError::SplitterFanIn { name, count: 2 } if name == "split"
        ));
    }

    #[test]
    fn three_deep_summation_chain_flattens() {
        let mut g = BlockGraph::new();
        let x = block(&mut g, "x", BlockKind::Integrator);
        let s3 = block(&mut g, "s3", BlockKind::Summation);
        let s2 = block(&mut g, "s2", BlockKind::Summation);
        let gain = block(&mut g, "g", BlockKind::Gain);
        let s1 = block(&mut g, "s1", BlockKind::Summation);
        let d = block(&mut g, "d", BlockKind::Differentiator);
        g.connect(x, s3);
        g.connect(s3, s2);
        g.connect(s2, s1);
        g.connect(gain, s1);
        g.connect(s1, d);

        let stats = simplify(&mut g, &DiagnosticSink::new()).unwrap();
        assert_eq!(stats.summations_merged, 2);
        assert!(g.is_removed(s2));
        assert!(g.is_removed(s3));
        assert_eq!(names(&g, &g.block(s1).inputs), vec!["x", "g"]);
        assert_eq!(g.live_ids_of(BlockKind::Summation), vec![s1]);
        assert!(g.is_consistent());
    }

    #[test]
    fn chain_listed_downstream_first_also_flattens() {
        let mut g = BlockGraph::new();
        let s1 = block(&mut g, "s1", BlockKind::Summation);
        let s2 = block(&mut g, "s2", BlockKind::Summation);
        let s3 = block(&mut g, "s3", BlockKind::Summation);
        let a = block(&mut g, "a", BlockKind::Gain);
        let b = block(&mut g, "b", BlockKind::Gain);
        let c = block(&mut g, "c", BlockKind::Gain);
        let d = block(&mut g, "d", BlockKind::Gain);
        g.connect(a, s3);
        g.connect(b, s3);
        g.connect(s3, s2);
        g.connect(c, s2);
        g.connect(s2, s1);
        g.connect(d, s1);

        simplify(&mut g, &DiagnosticSink::new()).unwrap();
        assert_eq!(g.live_ids_of(BlockKind::Summation), vec![s1]);
        assert_eq!(names(&g, &g.block(s1).inputs), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn summation_with_fanout_is_kept() {
        let mut g = BlockGraph::new();
        let a = block(&mut g, "a", BlockKind::Gain);
        let b = block(&mut g, "b", BlockKind::Gain);
        let inner = block(&mut g, "inner", BlockKind::Summation);
        let c = block(&mut g, "c", BlockKind::Gain);
        let outer = block(&mut g, "outer", BlockKind::Summation);
        let tap = block(&mut g, "tap", BlockKind::Differentiator);
        g.connect(a, inner);
        g.connect(b, inner);
        g.connect(inner, outer);
        g.connect(inner, tap);
        g.connect(c, outer);

        let stats = simplify(&mut g, &DiagnosticSink::new()).unwrap();
        assert_eq!(stats.summations_merged, 0);
        assert!(!g.is_removed(inner));
        assert_eq!(names(&g, &g.block(outer).inputs), vec!["inner", "c"]);
    }

    #[test]
    fn model_input_read_moves_to_surviving_summation() {
        let mut g = BlockGraph::new();
        let a = block(&mut g, "a", BlockKind::Gain);
        let inner = block(&mut g, "inner", BlockKind::Summation);
        let outer = block(&mut g, "outer", BlockKind::Summation);
        let b = block(&mut g, "b", BlockKind::Gain);
        g.set_reads_model_input(inner, true);
        g.connect(a, inner);
        g.connect(inner, outer);
        g.connect(b, outer);

        simplify(&mut g, &DiagnosticSink::new()).unwrap();
        assert!(g.is_removed(inner));
        assert!(g.block(outer).reads_model_input);
        assert_eq!(g.block(outer).fan_in(), 3);
    }

    #[test]
    fn duplicate_operand_warns() {
        let mut g = BlockGraph::new();
        let a = block(&mut g, "a", BlockKind::Gain);
        let inner = block(&mut g, "inner", BlockKind::Summation);
        let outer = block(&mut g, "outer", BlockKind::Summation);
        g.connect(a, inner);
        g.connect(a, outer);
        g.connect(inner, outer);

        let sink = DiagnosticSink::new();
        simplify(&mut g, &sink).unwrap();
        assert_eq!(sink.warning_count(), 1);
        assert_eq!(g.block(outer).inputs.len(), 1);
    }

    #[test]
    fn cyclic_graph_rejected_before_rewriting() {
        let mut g = BlockGraph::new();
        let s1 = block(&mut g, "s1", BlockKind::Summation);
        let s2 = block(&mut g, "s2", BlockKind::Summation);
        g.connect(s1, s2);
        g.connect(s2, s1);
        let err = simplify(&mut g, &DiagnosticSink::new()).unwrap_err();
        assert!(matches!(err, GraphError::Cycle { .. }));
        assert!(!g.is_removed(s1) && !g.is_removed(s2));
    }

    #[test]
    fn flatten_alone_is_bounded_on_cycles() {
        let mut g = BlockGraph::new();
        let s1 = block(&mut g, "s1", BlockKind::Summation);
        let s2 = block(&mut g, "s2", BlockKind::Summation);
        g.connect(s1, s2);
        g.connect(s2, s1);
        // Terminates either by collapsing the loop or by hitting the bound.
        let _ = flatten_summations(&mut g, &DiagnosticSink::new());
        assert!(g.len() <= 2);
    }
}
