use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use super::domains::{BitSet, BitSetTop, MeetSemiLattice};
use super::graph::{Graph, NodeId};
use super::solvers::{Dataflow, DataflowError, DataflowResult, Direction, FnTransfer};

/// Immediate dominators of the nodes reachable from a set of roots. With
/// more than one root this is a forest: nodes that are not dominated by any
/// single root have no immediate dominator, exactly like the roots.
///
/// Built with the iterative algorithm from:
/// ```txt
///   K. D. Cooper, T. J. Harvey, K. Kennedy. A Simple, Fast Dominance
///   Algorithm. Software Practice & Experience, 2001.
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DominatorTree {
    idom: HashMap<NodeId, Option<NodeId>>,
}

impl DominatorTree {
    pub fn new<N: Clone, E: Clone>(graph: &Graph<N, E>, roots: &[NodeId]) -> Self {
        let postorder = graph.postorder(roots.iter().copied());
        let number: HashMap<NodeId, usize> = postorder
            .iter()
            .enumerate()
            .map(|(num, &id)| (id, num))
            .collect();

        // The roots hang from a virtual node numbered after every real one.
        let virtual_root = postorder.len();
        let mut idom: Vec<Option<usize>> = vec![None; postorder.len() + 1];
        idom[virtual_root] = Some(virtual_root);
        for root in roots {
            if let Some(&num) = number.get(root) {
                idom[num] = Some(virtual_root);
            }
        }

        let mut changed = true;
        while changed {
            changed = false;
            for &node in postorder.iter().rev() {
                if roots.contains(&node) {
                    continue;
                }
                let num = number[&node];
                let mut new_idom = None;
                for pred in graph.predecessor_ids(node) {
                    let Some(&pred_num) = number.get(&pred) else {
                        continue;
                    };
                    if idom[pred_num].is_none() {
                        continue;
                    }
                    new_idom = Some(match new_idom {
                        None => pred_num,
                        Some(current) => intersect(&idom, current, pred_num),
                    });
                }
                if new_idom.is_some() && idom[num] != new_idom {
                    idom[num] = new_idom;
                    changed = true;
                }
            }
        }

        let idom = postorder
            .iter()
            .enumerate()
            .filter_map(|(num, &id)| {
                let parent = idom[num]?;
                let parent = (parent != virtual_root).then(|| postorder[parent]);
                Some((id, parent))
            })
            .collect();
        Self { idom }
    }

    /// Whether the node is reachable from the roots.
    pub fn contains(&self, id: NodeId) -> bool {
        self.idom.contains_key(&id)
    }

    /// `None` for roots and for nodes outside of the tree.
    pub fn immediate_dominator(&self, id: NodeId) -> Option<NodeId> {
        self.idom.get(&id).copied().flatten()
    }

    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.idom
            .iter()
            .filter(|(_, parent)| parent.is_none())
            .map(|(&id, _)| id)
    }

    /// The path from `id` to the root of its tree, `id` being the first
    /// element. Empty for nodes outside of the tree.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut result = vec![id];
        let mut current = id;
        while let Some(parent) = self.immediate_dominator(current) {
            result.push(parent);
            current = parent;
        }
        result
    }

    /// Whether `x` is on every path from the roots to `y`. Every node of the
    /// tree dominates itself.
    pub fn dominates(&self, x: NodeId, y: NodeId) -> bool {
        self.ancestors(y).contains(&x)
    }

    /// The closest node dominating both `m` and `n`. `None` when the two are
    /// in different trees of the forest or outside of the tree.
    pub fn nearest_common_dominator(&self, m: NodeId, n: NodeId) -> Option<NodeId> {
        let of_m: BTreeSet<_> = self.ancestors(m).into_iter().collect();
        self.ancestors(n).into_iter().find(|a| of_m.contains(a))
    }
}

fn intersect(idom: &[Option<usize>], mut finger1: usize, mut finger2: usize) -> usize {
    while finger1 != finger2 {
        while finger1 < finger2 {
            finger1 = idom[finger1].unwrap_or(finger2);
        }
        while finger2 < finger1 {
            finger2 = idom[finger2].unwrap_or(finger1);
        }
    }
    finger1
}

/// Dominators with respect to the nodes without predecessors.
pub fn dominator_tree<N: Clone, E: Clone>(graph: &Graph<N, E>) -> DominatorTree {
    let roots = Direction::Forward.boundary(graph);
    DominatorTree::new(graph, &roots)
}

/// Postdominators with respect to the nodes without successors. `x`
/// postdominates `y` when `x` is on every path from `y` to an exit. No
/// synthetic exit is added, so with several exits the result may be a
/// forest.
pub fn postdominator_tree<N: Clone, E: Clone>(graph: &Graph<N, E>) -> DominatorTree {
    let exits = Direction::Backward.boundary(graph);
    DominatorTree::new(&graph.reverse(), &exits)
}

/// Calculates the dominator set of every node as a dataflow problem. Slower
/// than [`DominatorTree`], but a useful reference implementation.
pub fn dominator_sets<N: Clone, E: Clone>(
    graph: &Graph<N, E>,
    entry: NodeId,
    solver: &Dataflow,
) -> Result<DataflowResult<BitSet>, DataflowError> {
    let size = graph.node_ids().max().map_or(0, |max| max + 1);
    let ctx = BitSetTop(size);
    let mut transfer = FnTransfer::new(
        |ctx: &BitSetTop, incoming: &BitSet, id: NodeId, _: &N, edges: &[(NodeId, &E)]| {
            let mut result = if id == entry || edges.is_empty() {
                BitSet::from(ctx, &[])
            } else {
                incoming.clone()
            };
            result.insert(id);
            result
        },
    );
    solver.solve(Direction::Forward, graph, &ctx, BitSet::top(&ctx), &mut transfer)
}

/// Builds the control dependence graph, an edge `n -> m` meaning `n` is
/// directly control dependent on `m`, following:
/// ```txt
///   R. Cytron, J. Ferrante, B. K. Rosen, M. N. Wegman, F. K. Zadeck.
///   Efficiently Computing Static Single Assignment Form and the Control
///   Dependence Graph. ACM TOPLAS, Volume 13, Issue 4, Oct. 1991.
/// ```
/// No artificial start node is introduced. Nodes that execute on every path
/// have no dependencies at all.
pub fn control_dependence<N: Clone, E: Clone>(
    graph: &Graph<N, E>,
    postdominators: &DominatorTree,
) -> Graph<N, ()> {
    let mut dependencies: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();
    let mut candidates = BTreeSet::new();
    for (m, n, _) in graph.edges() {
        if !postdominators.dominates(n, m) {
            candidates.insert((m, n));
        }
    }

    for &(m, n) in &candidates {
        let stop = postdominators.nearest_common_dominator(m, n);
        for dependent in postdominators.ancestors(n) {
            if Some(dependent) == stop {
                break;
            }
            dependencies.entry(dependent).or_default().insert(m);
        }
    }

    let mut result = Graph::new();
    for (id, label) in graph.nodes() {
        result.insert_node(id, label.clone());
    }
    for (dependent, controllers) in &dependencies {
        for &controller in controllers {
            result.insert_edge(*dependent, controller, ());
        }
    }
    debug!(
        nodes = result.node_count(),
        edges = result.edge_count(),
        "control dependence graph built"
    );
    result
}
