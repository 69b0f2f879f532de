use core::cmp::Reverse;
use core::marker::PhantomData;
use std::collections::HashMap;

use priority_queue::PriorityQueue;
use thiserror::Error;
use tracing::{debug, trace};

use super::domains::{MeetSemiLattice, meet_all};
use super::graph::{Graph, NodeId};

/// The direction facts flow in. A forward analysis computes the state after
/// each node from the states of its graph predecessors, a backward analysis
/// uses the graph successors instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Edges facts flow in through, reported as `(other node, label)`.
    pub fn incoming<N: Clone, E: Clone>(
        self,
        graph: &Graph<N, E>,
        id: NodeId,
    ) -> Vec<(NodeId, &E)> {
        match self {
            Direction::Forward => graph.predecessors(id).collect(),
            Direction::Backward => graph.successors(id).collect(),
        }
    }

    /// Nodes whose input depends on the output of `id`.
    pub fn dependents<N: Clone, E: Clone>(self, graph: &Graph<N, E>, id: NodeId) -> Vec<NodeId> {
        match self {
            Direction::Forward => graph.successor_ids(id).collect(),
            Direction::Backward => graph.predecessor_ids(id).collect(),
        }
    }

    /// Nodes without incoming edges in this direction. These receive the
    /// initial state as their input.
    pub fn boundary<N: Clone, E: Clone>(self, graph: &Graph<N, E>) -> Vec<NodeId> {
        graph
            .node_ids()
            .filter(|&id| self.incoming(graph, id).is_empty())
            .collect()
    }
}

/// Transfer functions compute the state after a node from the state flowing
/// into it. Constant information an analysis needs, e.g., the module the
/// nodes belong to, is stored in the implementing type. For the most common
/// cases creating a [`FnTransfer`] from a closure should be sufficient.
///
/// The transfer function must be monotone for the solver to terminate.
pub trait TransferFunction<N, E, D>
where
    N: Clone,
    E: Clone,
    D: MeetSemiLattice,
{
    /// # Arguments
    ///
    /// * `incoming` - The meet of the states flowing in, or the initial state
    ///   at the boundary.
    /// * `edges` - The edges the state flows in through.
    fn transfer(
        &mut self,
        ctx: &D::LatticeContext,
        incoming: &D,
        node: NodeId,
        label: &N,
        edges: &[(NodeId, &E)],
    ) -> D;
}

/// Small utility so users do not need to create a new struct for every
/// transfer function.
pub struct FnTransfer<F, N, E, D>
where
    N: Clone,
    E: Clone,
    D: MeetSemiLattice,
    F: FnMut(&D::LatticeContext, &D, NodeId, &N, &[(NodeId, &E)]) -> D,
{
    func: F,
    phantom: PhantomData<(N, E, D)>,
}

impl<F, N, E, D> FnTransfer<F, N, E, D>
where
    N: Clone,
    E: Clone,
    D: MeetSemiLattice,
    F: FnMut(&D::LatticeContext, &D, NodeId, &N, &[(NodeId, &E)]) -> D,
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            phantom: PhantomData,
        }
    }
}

impl<F, N, E, D> TransferFunction<N, E, D> for FnTransfer<F, N, E, D>
where
    N: Clone,
    E: Clone,
    D: MeetSemiLattice,
    F: FnMut(&D::LatticeContext, &D, NodeId, &N, &[(NodeId, &E)]) -> D,
{
    fn transfer(
        &mut self,
        ctx: &D::LatticeContext,
        incoming: &D,
        node: NodeId,
        label: &N,
        edges: &[(NodeId, &E)],
    ) -> D {
        (self.func)(ctx, incoming, node, label, edges)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataflowError {
    #[error("dataflow analysis did not converge after processing {processed} nodes")]
    DidNotConverge { processed: usize },
}

/// A worklist that always hands out the node that comes first in reverse
/// post-order, starting the traversal from the boundary of the analysis.
/// Visiting nodes in this order makes most of the states final the first
/// time they are computed in acyclic regions.
pub struct RPOWorklist {
    queue: PriorityQueue<NodeId, Reverse<usize>>,
    order: HashMap<NodeId, usize>,
}

impl RPOWorklist {
    pub fn new<N: Clone, E: Clone>(graph: &Graph<N, E>, direction: Direction) -> Self {
        let oriented = match direction {
            Direction::Forward => graph.clone(),
            Direction::Backward => graph.reverse(),
        };
        // Nodes unreachable from the boundary (e.g., an infinite loop) are
        // ordered after the rest.
        let roots = Direction::Forward
            .boundary(&oriented)
            .into_iter()
            .chain(oriented.node_ids());
        let mut postorder = oriented.postorder(roots);
        postorder.reverse();
        let order = postorder
            .into_iter()
            .enumerate()
            .map(|(rank, id)| (id, rank))
            .collect();
        Self {
            queue: PriorityQueue::new(),
            order,
        }
    }

    pub fn get_rpo_order(&self, id: NodeId) -> usize {
        self.order[&id]
    }

    pub fn push(&mut self, id: NodeId) {
        let rank = self.order.get(&id).copied().unwrap_or(usize::MAX);
        self.queue.push(id, Reverse(rank));
    }

    pub fn pop(&mut self) -> Option<NodeId> {
        self.queue.pop().map(|(id, _)| id)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// The fixpoint computed by [`Dataflow::solve`]: the state after every
/// node of the graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataflowResult<D> {
    direction: Direction,
    initial: D,
    outputs: HashMap<NodeId, D>,
}

impl<D: MeetSemiLattice> DataflowResult<D> {
    /// The state after `id`.
    ///
    /// # Panics
    ///
    /// Every node of the analyzed graph has a state, asking for any other
    /// node is a bug in the caller.
    pub fn output(&self, id: NodeId) -> &D {
        match self.outputs.get(&id) {
            Some(state) => state,
            None => panic!("No dataflow fact recorded for node {id}."),
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&D> {
        self.outputs.get(&id)
    }

    /// The state flowing into `id`, computed the same way the solver did.
    pub fn input<N: Clone, E: Clone>(
        &self,
        graph: &Graph<N, E>,
        ctx: &D::LatticeContext,
        id: NodeId,
    ) -> D {
        let incoming = self.direction.incoming(graph, id);
        if incoming.is_empty() {
            return self.initial.clone();
        }
        meet_all(incoming.iter().map(|&(other, _)| self.output(other)), ctx)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &D)> + '_ {
        self.outputs.iter().map(|(&id, state)| (id, state))
    }

    pub fn into_map(self) -> HashMap<NodeId, D> {
        self.outputs
    }
}

/// A worklist based fixpoint solver for monotone dataflow problems over
/// node-level graphs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Dataflow {
    /// Set the approximate iteration limit per node. If the limit is reached
    /// (the analysis did not converge in the permitted number of steps),
    /// the solver returns an error. Zero means no limit.
    pub node_limit: usize,
}

impl Default for Dataflow {
    fn default() -> Self {
        Self { node_limit: 20 }
    }
}

impl Dataflow {
    /// Runs the analysis until no state changes.
    ///
    /// # Arguments
    ///
    /// * `initial` - The state every node starts from and the input of the
    ///   nodes without incoming edges. Usually the top of the lattice.
    /// * `transfer` - Computes the state after a node from its input.
    pub fn solve<N, E, D, F>(
        &self,
        direction: Direction,
        graph: &Graph<N, E>,
        ctx: &D::LatticeContext,
        initial: D,
        transfer: &mut F,
    ) -> Result<DataflowResult<D>, DataflowError>
    where
        N: Clone,
        E: Clone,
        D: MeetSemiLattice,
        F: TransferFunction<N, E, D>,
    {
        let mut outputs: HashMap<NodeId, D> = graph
            .node_ids()
            .map(|id| (id, initial.clone()))
            .collect();

        let mut worklist = RPOWorklist::new(graph, direction);
        for id in graph.node_ids() {
            worklist.push(id);
        }

        let limit = self.node_limit.saturating_mul(graph.node_count());
        let mut processed = 0_usize;
        while let Some(current) = worklist.pop() {
            if self.node_limit > 0 && processed >= limit {
                return Err(DataflowError::DidNotConverge { processed });
            }
            processed += 1;

            let edges = direction.incoming(graph, current);
            let input = if edges.is_empty() {
                initial.clone()
            } else {
                meet_all(edges.iter().map(|&(other, _)| &outputs[&other]), ctx)
            };
            let Some(label) = graph.label(current) else {
                continue;
            };
            let output = transfer.transfer(ctx, &input, current, label, &edges);
            trace!(node = current, "dataflow transfer");

            if outputs[&current] == output {
                continue;
            }
            outputs.insert(current, output);
            for dependent in direction.dependents(graph, current) {
                worklist.push(dependent);
            }
        }

        debug!(
            nodes = graph.node_count(),
            processed,
            ?direction,
            "dataflow analysis converged"
        );
        Ok(DataflowResult {
            direction,
            initial,
            outputs,
        })
    }
}
