use analysis::analyses::DominatorTree as Tree;
use analysis::graph::{Graph, NodeId};
use tracing::debug;

use crate::error::AnalysisError;
use crate::ir::{Instruction, Module, ValueId};

/// Why control flows along an edge.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Between consecutive instructions of a block.
    Fallthrough,
    Unconditional,
    True { condition: ValueId },
    False { condition: ValueId },
    Case { condition: ValueId, value: ValueId },
    Default { condition: ValueId },
    Indirect { address: ValueId },
    Normal { invoke: ValueId },
    Unwind { invoke: ValueId },
}

/// Graph nodes are keyed by the index of the instruction's [`ValueId`].
pub fn node(id: ValueId) -> NodeId {
    id.0
}

pub fn value(node: NodeId) -> ValueId {
    ValueId(node)
}

/// The control flow graph of one function at instruction granularity.
#[derive(Clone, Debug)]
pub struct Cfg {
    function: ValueId,
    graph: Graph<ValueId, EdgeKind>,
    entry: ValueId,
    exits: Vec<ValueId>,
    reversed: bool,
}

impl Cfg {
    pub fn new(module: &Module, function: ValueId) -> Result<Self, AnalysisError> {
        let func = module
            .function(function)
            .ok_or(AnalysisError::NotAFunction(function))?;
        let entry = func
            .entry_block()
            .and_then(|block| module.block(block)?.first())
            .ok_or(AnalysisError::Declaration(function))?;

        let mut graph = Graph::new();
        let blocks = func.blocks.iter().filter_map(|&id| module.block(id));
        for block in blocks.clone() {
            for &inst in &block.instructions {
                graph.insert_node(node(inst), inst);
            }
        }
        for block in blocks {
            for pair in block.instructions.windows(2) {
                graph.insert_edge(node(pair[0]), node(pair[1]), EdgeKind::Fallthrough);
            }
            let Some(terminator) = block.terminator() else {
                continue;
            };
            for (target, kind) in terminator_edges(module, terminator) {
                if let Some(first) = module.block(target).and_then(|b| b.first()) {
                    graph.insert_edge(node(terminator), node(first), kind);
                }
            }
        }
        let exits: Vec<_> = graph
            .node_ids()
            .filter(|&id| graph.successors(id).next().is_none())
            .map(value)
            .collect();
        debug!(
            function = ?function,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            exits = exits.len(),
            "Built CFG"
        );
        Ok(Self {
            function,
            graph,
            entry,
            exits,
            reversed: false,
        })
    }

    pub fn function(&self) -> ValueId {
        self.function
    }

    pub fn graph(&self) -> &Graph<ValueId, EdgeKind> {
        &self.graph
    }

    /// The first instruction of the entry block, in either direction.
    pub fn entry(&self) -> ValueId {
        self.entry
    }

    /// Instructions without successors in the forward graph: returns,
    /// `unreachable`, `unwind`, and blocks missing a terminator.
    pub fn exits(&self) -> &[ValueId] {
        &self.exits
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// The nodes traversals start from in the current direction.
    pub fn roots(&self) -> Vec<ValueId> {
        if self.reversed {
            self.exits.clone()
        } else {
            vec![self.entry]
        }
    }

    /// The same nodes with every edge flipped. The node labels and the
    /// untouched parts of the adjacency are shared with `self`.
    pub fn reverse(&self) -> Self {
        Self {
            graph: self.graph.reverse(),
            exits: self.exits.clone(),
            reversed: !self.reversed,
            ..*self
        }
    }

    pub fn successors(&self, id: ValueId) -> impl Iterator<Item = (ValueId, &EdgeKind)> + '_ {
        self.graph.successors(node(id)).map(|(to, kind)| (value(to), kind))
    }

    pub fn predecessors(&self, id: ValueId) -> impl Iterator<Item = (ValueId, &EdgeKind)> + '_ {
        self.graph.predecessors(node(id)).map(|(from, kind)| (value(from), kind))
    }
}

/// The labelled block level edges leaving a terminator.
fn terminator_edges(module: &Module, terminator: ValueId) -> Vec<(ValueId, EdgeKind)> {
    let Some(inst) = module.instruction(terminator) else {
        return Vec::new();
    };
    match inst {
        Instruction::Br(target) => vec![(*target, EdgeKind::Unconditional)],
        Instruction::CondBr {
            condition,
            then_block,
            else_block,
        } => vec![
            (*then_block, EdgeKind::True { condition: *condition }),
            (*else_block, EdgeKind::False { condition: *condition }),
        ],
        Instruction::Switch {
            value,
            default,
            cases,
        } => std::iter::once((*default, EdgeKind::Default { condition: *value }))
            .chain(cases.iter().map(|&(case, dest)| {
                (
                    dest,
                    EdgeKind::Case {
                        condition: *value,
                        value: case,
                    },
                )
            }))
            .collect(),
        Instruction::IndirectBr { address, targets } => targets
            .iter()
            .map(|&target| (target, EdgeKind::Indirect { address: *address }))
            .collect(),
        Instruction::Invoke { normal, unwind, .. } => vec![
            (*normal, EdgeKind::Normal { invoke: terminator }),
            (*unwind, EdgeKind::Unwind { invoke: terminator }),
        ],
        _ => Vec::new(),
    }
}

/// Successor blocks of a block, in terminator operand order.
pub fn block_successors(module: &Module, block: ValueId) -> Vec<ValueId> {
    module
        .block(block)
        .and_then(|b| b.terminator())
        .and_then(|t| module.instruction(t))
        .map(Instruction::successor_blocks)
        .unwrap_or_default()
}

/// Blocks of the owning function that branch to `block`.
pub fn block_predecessors(module: &Module, block: ValueId) -> Vec<ValueId> {
    let Some(function) = module.function_of(block).and_then(|f| module.function(f)) else {
        return Vec::new();
    };
    function
        .blocks
        .iter()
        .copied()
        .filter(|&pred| block_successors(module, pred).contains(&block))
        .collect()
}

/// Dominance over the instructions of a [`Cfg`], rooted at the entry.
#[derive(Clone, Debug)]
pub struct DominatorTree {
    tree: Tree,
}

impl DominatorTree {
    pub fn new(cfg: &Cfg) -> Self {
        let (graph, roots) = if cfg.is_reversed() {
            (cfg.graph().reverse(), vec![node(cfg.entry())])
        } else {
            (cfg.graph().clone(), vec![node(cfg.entry())])
        };
        Self {
            tree: Tree::new(&graph, &roots),
        }
    }

    pub fn dominates(&self, x: ValueId, y: ValueId) -> bool {
        self.tree.dominates(node(x), node(y))
    }

    pub fn immediate_dominator(&self, id: ValueId) -> Option<ValueId> {
        self.tree.immediate_dominator(node(id)).map(value)
    }
}

/// Postdominance over the instructions of a [`Cfg`]. Built on the reversed
/// graph with every exit as a root, so functions with several exits yield a
/// forest. Instructions that cannot reach an exit are not in the tree.
#[derive(Clone, Debug)]
pub struct PostdominatorTree {
    tree: Tree,
}

impl PostdominatorTree {
    pub fn new(cfg: &Cfg) -> Self {
        let reversed = if cfg.is_reversed() {
            cfg.clone()
        } else {
            cfg.reverse()
        };
        let roots: Vec<_> = cfg.exits().iter().copied().map(node).collect();
        Self {
            tree: Tree::new(reversed.graph(), &roots),
        }
    }

    pub fn contains(&self, id: ValueId) -> bool {
        self.tree.contains(node(id))
    }

    /// Whether `x` is on every path from `y` to an exit. Reflexive.
    pub fn postdominates(&self, x: ValueId, y: ValueId) -> bool {
        self.tree.dominates(node(x), node(y))
    }

    pub fn immediate_postdominator(&self, id: ValueId) -> Option<ValueId> {
        self.tree.immediate_dominator(node(id)).map(value)
    }

    /// From `id` up to the root of its tree, both included.
    pub fn ancestors(&self, id: ValueId) -> Vec<ValueId> {
        self.tree.ancestors(node(id)).into_iter().map(value).collect()
    }

    /// `None` when `m` and `n` end up in different trees, e.g. when they
    /// only reach different exits.
    pub fn nearest_common_postdominator(&self, m: ValueId, n: ValueId) -> Option<ValueId> {
        self.tree.nearest_common_dominator(node(m), node(n)).map(value)
    }

    pub(crate) fn tree(&self) -> &Tree {
        &self.tree
    }
}
