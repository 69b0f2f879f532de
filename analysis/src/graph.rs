use core::fmt::Debug;
use std::fmt::Write;

use fixedbitset::FixedBitSet;
use im::{OrdMap, Vector};

/// Nodes are identified by small non-negative integers. Clients usually key
/// the nodes by an index they already have, e.g., the unique id of an
/// instruction.
pub type NodeId = usize;

#[derive(Clone, Debug, PartialEq, Eq)]
struct NodeEntry<N: Clone, E: Clone> {
    label: N,
    preds: OrdMap<NodeId, Vector<E>>,
    succs: OrdMap<NodeId, Vector<E>>,
}

impl<N: Clone, E: Clone> NodeEntry<N, E> {
    fn new(label: N) -> Self {
        Self {
            label,
            preds: OrdMap::new(),
            succs: OrdMap::new(),
        }
    }
}

/// Everything a graph knew about a node before it was taken out of the
/// graph. Self loops are reported both as a predecessor and as a successor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Context<N, E> {
    pub node: NodeId,
    pub label: N,
    pub predecessors: Vec<(NodeId, E)>,
    pub successors: Vec<(NodeId, E)>,
}

/// A persistent directed multigraph. Cloning a graph is cheap, the clones
/// share their structure until one of them is modified, so keeping older
/// versions of a graph around while building a new one costs little.
///
/// Every edge is stored at both of its endpoints. If `b` has a successor
/// edge to `a` labeled `l`, `a` has a predecessor edge from `b` labeled `l`.
/// Parallel edges between the same pair of nodes are kept with their exact
/// multiplicity, in insertion order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Graph<N: Clone, E: Clone> {
    nodes: OrdMap<NodeId, NodeEntry<N, E>>,
}

impl<N: Clone, E: Clone> Default for Graph<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Clone, E: Clone> Graph<N, E> {
    /// The graph with no nodes and no edges.
    pub fn new() -> Self {
        Self {
            nodes: OrdMap::new(),
        }
    }

    /// Adds a node to the graph. When the node is already present, only its
    /// label is replaced, the incident edges are kept.
    pub fn insert_node(&mut self, id: NodeId, label: N) -> &mut Self {
        match self.nodes.get_mut(&id) {
            Some(entry) => entry.label = label,
            None => {
                self.nodes.insert(id, NodeEntry::new(label));
            }
        }
        self
    }

    /// Adds a new label to the edge from `from` to `to`.
    ///
    /// # Panics
    ///
    /// Both endpoints must already be part of the graph.
    pub fn insert_edge(&mut self, from: NodeId, to: NodeId, label: E) -> &mut Self {
        assert!(
            self.nodes.contains_key(&from) && self.nodes.contains_key(&to),
            "Edge {from} -> {to} has an endpoint missing from the graph."
        );
        if let Some(source) = self.nodes.get_mut(&from) {
            source
                .succs
                .entry(to)
                .or_insert_with(Vector::new)
                .push_back(label.clone());
        }
        if let Some(target) = self.nodes.get_mut(&to) {
            target
                .preds
                .entry(from)
                .or_insert_with(Vector::new)
                .push_back(label);
        }
        self
    }

    /// Removes every edge from `from` to `to` and returns their labels.
    pub fn remove_edges(&mut self, from: NodeId, to: NodeId) -> Vec<E> {
        let removed = self
            .nodes
            .get_mut(&from)
            .and_then(|source| source.succs.remove(&to))
            .map(|labels| labels.into_iter().collect())
            .unwrap_or_default();
        if let Some(target) = self.nodes.get_mut(&to) {
            target.preds.remove(&from);
        }
        removed
    }

    /// Takes a node out of the graph together with all of its incident
    /// edges. Returns the full adjacency of the node, or `None` if the node
    /// was not in the graph.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Context<N, E>> {
        let entry = self.nodes.remove(&id)?;
        for &succ in entry.succs.keys() {
            if let Some(target) = self.nodes.get_mut(&succ) {
                target.preds.remove(&id);
            }
        }
        for &pred in entry.preds.keys() {
            if let Some(source) = self.nodes.get_mut(&pred) {
                source.succs.remove(&id);
            }
        }
        Some(Context {
            node: id,
            label: entry.label,
            predecessors: flatten(&entry.preds),
            successors: flatten(&entry.succs),
        })
    }

    /// The persistent version of [`Graph::remove_node`]: `self` is left
    /// intact and the remaining graph is returned next to the context.
    pub fn decompose(&self, id: NodeId) -> Option<(Context<N, E>, Self)> {
        let mut rest = self.clone();
        let context = rest.remove_node(id)?;
        Some((context, rest))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn label(&self, id: NodeId) -> Option<&N> {
        self.nodes.get(&id).map(|entry| &entry.label)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes
            .values()
            .flat_map(|entry| entry.succs.values())
            .map(Vector::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Outgoing edges of a node, one item per edge label. Nodes that are not
    /// in the graph have no successors.
    pub fn successors(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &E)> + '_ {
        self.nodes
            .get(&id)
            .into_iter()
            .flat_map(|entry| labeled(&entry.succs))
    }

    /// Incoming edges of a node, one item per edge label.
    pub fn predecessors(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &E)> + '_ {
        self.nodes
            .get(&id)
            .into_iter()
            .flat_map(|entry| labeled(&entry.preds))
    }

    /// Distinct successor nodes, ignoring edge multiplicity.
    pub fn successor_ids(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .get(&id)
            .into_iter()
            .flat_map(|entry| entry.succs.keys().copied())
    }

    /// Distinct predecessor nodes, ignoring edge multiplicity.
    pub fn predecessor_ids(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .get(&id)
            .into_iter()
            .flat_map(|entry| entry.preds.keys().copied())
    }

    /// Labels of all the parallel edges from `from` to `to`.
    pub fn edge_labels(&self, from: NodeId, to: NodeId) -> impl Iterator<Item = &E> + '_ {
        self.nodes
            .get(&from)
            .and_then(|entry| entry.succs.get(&to))
            .into_iter()
            .flat_map(|labels| labels.iter())
    }

    /// Nodes in increasing order of their ids.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &N)> + '_ {
        self.nodes.iter().map(|(&id, entry)| (id, &entry.label))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// All edges as `(from, to, label)`, parallel edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, &E)> + '_ {
        self.nodes
            .iter()
            .flat_map(|(&from, entry)| labeled(&entry.succs).map(move |(to, l)| (from, to, l)))
    }

    pub fn map_nodes<M, F>(&self, mut f: F) -> Graph<M, E>
    where
        M: Clone,
        F: FnMut(NodeId, &N) -> M,
    {
        Graph {
            nodes: self
                .nodes
                .iter()
                .map(|(&id, entry)| {
                    let mapped = NodeEntry {
                        label: f(id, &entry.label),
                        preds: entry.preds.clone(),
                        succs: entry.succs.clone(),
                    };
                    (id, mapped)
                })
                .collect(),
        }
    }

    pub fn map_edges<F2, F>(&self, mut f: F) -> Graph<N, F2>
    where
        F2: Clone,
        F: FnMut(NodeId, NodeId, &E) -> F2,
    {
        let mut result = Graph::new();
        for (id, label) in self.nodes() {
            result.insert_node(id, label.clone());
        }
        for (from, to, label) in self.edges() {
            result.insert_edge(from, to, f(from, to, label));
        }
        result
    }

    /// The same nodes with every edge pointing in the opposite direction.
    pub fn reverse(&self) -> Self {
        Self {
            nodes: self
                .nodes
                .iter()
                .map(|(&id, entry)| {
                    let flipped = NodeEntry {
                        label: entry.label.clone(),
                        preds: entry.succs.clone(),
                        succs: entry.preds.clone(),
                    };
                    (id, flipped)
                })
                .collect(),
        }
    }

    /// Nodes reachable from `starts` in depth-first preorder. Start nodes
    /// that are not in the graph are skipped.
    pub fn dfs(&self, starts: impl IntoIterator<Item = NodeId>) -> Vec<NodeId> {
        let mut visited = self.visited_set();
        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = starts.into_iter().collect();
        stack.reverse();
        while let Some(current) = stack.pop() {
            if !self.contains(current) || visited.put(current) {
                continue;
            }
            order.push(current);
            let succs: Vec<_> = self.successor_ids(current).collect();
            stack.extend(succs.into_iter().rev().filter(|s| !visited.contains(*s)));
        }
        order
    }

    /// Every node reachable from `id`, including `id` itself when it is in
    /// the graph.
    pub fn reachable(&self, id: NodeId) -> Vec<NodeId> {
        self.dfs([id])
    }

    /// Depth-first postorder of the nodes reachable from `roots`.
    pub fn postorder(&self, roots: impl IntoIterator<Item = NodeId>) -> Vec<NodeId> {
        let mut visited = self.visited_set();
        let mut order = Vec::with_capacity(self.node_count());
        for root in roots {
            if !self.contains(root) || visited.put(root) {
                continue;
            }
            // Every frame holds the node and its not yet explored successors.
            let mut stack = vec![(root, self.pending_successors(root))];
            loop {
                let Some((node, pending)) = stack.last_mut() else {
                    break;
                };
                let node = *node;
                match pending.pop() {
                    Some(next) => {
                        if !visited.put(next) {
                            stack.push((next, self.pending_successors(next)));
                        }
                    }
                    None => {
                        order.push(node);
                        stack.pop();
                    }
                }
            }
        }
        order
    }

    // Reversed so popping from the back visits successors in increasing order.
    fn pending_successors(&self, id: NodeId) -> Vec<NodeId> {
        let mut succs: Vec<_> = self.successor_ids(id).collect();
        succs.reverse();
        succs
    }

    fn visited_set(&self) -> FixedBitSet {
        let size = self.nodes.keys().max().map_or(0, |&max| max + 1);
        FixedBitSet::with_capacity(size)
    }
}

impl<N: Clone, E: Clone + PartialEq> Graph<N, E> {
    /// Union of two graphs. Labels of `self` win for nodes present in both.
    /// An edge label already present between the same ordered pair is not
    /// duplicated, so merging a graph with itself yields the same graph.
    pub fn merge(&self, other: &Self) -> Self {
        let mut result = self.clone();
        for (id, label) in other.nodes() {
            if !result.contains(id) {
                result.insert_node(id, label.clone());
            }
        }
        for (from, to, label) in other.edges() {
            if !result.edge_labels(from, to).any(|l| l == label) {
                result.insert_edge(from, to, label.clone());
            }
        }
        result
    }
}

fn labeled<E: Clone>(
    adjacency: &OrdMap<NodeId, Vector<E>>,
) -> impl Iterator<Item = (NodeId, &E)> + '_ {
    adjacency
        .iter()
        .flat_map(|(&other, labels)| labels.iter().map(move |l| (other, l)))
}

fn flatten<E: Clone>(adjacency: &OrdMap<NodeId, Vector<E>>) -> Vec<(NodeId, E)> {
    labeled(adjacency).map(|(id, l)| (id, l.clone())).collect()
}

/// Renders the graph in graphviz format.
pub fn print<N, E, NodePrinter, EdgePrinter>(
    name: Option<&str>,
    graph: &Graph<N, E>,
    node_printer: NodePrinter,
    edge_printer: EdgePrinter,
) -> String
where
    N: Clone,
    E: Clone,
    NodePrinter: Fn(NodeId, &N) -> String,
    EdgePrinter: Fn(&E) -> Option<String>,
{
    let mut output = format!("digraph {} {{\n", name.unwrap_or("G"));
    for (id, label) in graph.nodes() {
        writeln!(
            output,
            "  Node_{id}[label=\"{}\"]",
            escape(&node_printer(id, label))
        )
        .unwrap();
    }
    output.push('\n');
    for (from, to, label) in graph.edges() {
        match edge_printer(label) {
            Some(text) => {
                writeln!(output, "  Node_{from} -> Node_{to}[label=\"{}\"]", escape(&text))
                    .unwrap();
            }
            None => writeln!(output, "  Node_{from} -> Node_{to}").unwrap(),
        }
    }
    output.push_str("}\n");
    output
}

/// Escapes the characters graphviz would misinterpret inside a quoted label.
pub fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
pub(crate) fn debug_edges<N: Clone, E: Clone + Debug>(graph: &Graph<N, E>) -> Vec<String> {
    graph
        .edges()
        .map(|(from, to, label)| format!("{from}->{to}:{label:?}"))
        .collect()
}
