use analysis::analyses::control_dependence;
use analysis::graph::Graph;

use crate::cfg::{Cfg, PostdominatorTree, node, value};
use crate::ir::ValueId;

/// Control dependences between the instructions of one function. An edge
/// `n -> m` means `n` is directly control dependent on `m`.
#[derive(Clone, Debug)]
pub struct ControlDependenceGraph {
    function: ValueId,
    graph: Graph<ValueId, ()>,
}

impl ControlDependenceGraph {
    pub fn new(cfg: &Cfg) -> Self {
        Self::with_postdominators(cfg, &PostdominatorTree::new(cfg))
    }

    pub fn with_postdominators(cfg: &Cfg, postdominators: &PostdominatorTree) -> Self {
        let forward = if cfg.is_reversed() {
            cfg.reverse()
        } else {
            cfg.clone()
        };
        Self {
            function: cfg.function(),
            graph: control_dependence(forward.graph(), postdominators.tree()),
        }
    }

    pub fn function(&self) -> ValueId {
        self.function
    }

    pub fn graph(&self) -> &Graph<ValueId, ()> {
        &self.graph
    }

    /// The branches `id` directly depends on.
    pub fn direct_control_dependencies(&self, id: ValueId) -> Vec<ValueId> {
        self.graph.successor_ids(node(id)).map(value).collect()
    }

    /// Everything `id` transitively depends on, `id` itself excluded.
    ///
    /// Panics if `id` is not part of the graph.
    pub fn control_dependencies(&self, id: ValueId) -> Vec<ValueId> {
        let reached = self.graph.dfs([node(id)]);
        match reached.split_first() {
            Some((&first, rest)) if first == node(id) => rest.iter().copied().map(value).collect(),
            _ => panic!(
                "Instruction {id:?} is not reachable from itself in the control dependence graph."
            ),
        }
    }

    /// Whether `m` is among the control dependencies of `n`.
    pub fn control_dependent_on(&self, m: ValueId, n: ValueId) -> bool {
        self.control_dependencies(n).contains(&m)
    }
}
