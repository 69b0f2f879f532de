use proptest::prelude::*;

use super::graph::*;

/// Builds a graph with nodes `0..size` labeled by their ids.
pub(crate) fn graph_from_edges<E: Clone>(
    size: usize,
    edges: &[(NodeId, NodeId, E)],
) -> Graph<usize, E> {
    let mut graph = Graph::new();
    for id in 0..size {
        graph.insert_node(id, id);
    }
    for (from, to, label) in edges {
        graph.insert_edge(*from, *to, label.clone());
    }
    graph
}

pub(crate) fn unlabeled(size: usize, edges: &[(NodeId, NodeId)]) -> Graph<usize, ()> {
    let edges: Vec<_> = edges.iter().map(|&(from, to)| (from, to, ())).collect();
    graph_from_edges(size, &edges)
}

fn diamond() -> Graph<usize, ()> {
    //     0
    //    / \
    //   1   2
    //    \ /
    //     3
    unlabeled(4, &[(0, 1), (0, 2), (1, 3), (2, 3)])
}

#[test]
fn empty_graph() {
    let graph = Graph::<(), ()>::new();
    assert!(graph.is_empty());
    assert_eq!(graph.node_count(), 0);
    assert_eq!(graph.edge_count(), 0);
    assert_eq!(graph.successors(0).count(), 0);
    assert!(graph.label(0).is_none());
}

#[test]
fn queries() {
    let graph = graph_from_edges(3, &[(0, 1, 'a'), (0, 2, 'b'), (1, 2, 'c')]);
    assert_eq!(graph.label(1), Some(&1));
    assert_eq!(graph.node_ids().collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_eq!(graph.successors(0).collect::<Vec<_>>(), vec![(1, &'a'), (2, &'b')]);
    assert_eq!(graph.predecessors(2).collect::<Vec<_>>(), vec![(0, &'b'), (1, &'c')]);
    assert_eq!(graph.edge_count(), 3);
    assert_eq!(debug_edges(&graph), vec!["0->1:'a'", "0->2:'b'", "1->2:'c'"]);
}

#[test]
fn parallel_edges_are_kept() {
    let graph = graph_from_edges(2, &[(0, 1, "true"), (0, 1, "false"), (0, 1, "true")]);
    assert_eq!(graph.edge_count(), 3);
    assert_eq!(
        graph.edge_labels(0, 1).copied().collect::<Vec<_>>(),
        vec!["true", "false", "true"]
    );
    assert_eq!(graph.predecessors(1).count(), 3);
    assert_eq!(graph.successor_ids(0).collect::<Vec<_>>(), vec![1]);
}

#[test]
fn insert_node_keeps_edges() {
    let mut graph = unlabeled(2, &[(0, 1)]);
    graph.insert_node(1, 42);
    assert_eq!(graph.label(1), Some(&42));
    assert_eq!(graph.predecessor_ids(1).collect::<Vec<_>>(), vec![0]);
}

#[test]
#[should_panic]
fn edge_needs_both_endpoints() {
    let mut graph = unlabeled(1, &[]);
    graph.insert_edge(0, 1, ());
}

#[test]
fn remove_node_returns_adjacency() {
    let mut graph = graph_from_edges(3, &[(0, 1, 'a'), (1, 2, 'b'), (1, 1, 'c')]);
    let context = graph.remove_node(1).unwrap();
    assert_eq!(context.node, 1);
    assert_eq!(context.label, 1);
    assert_eq!(context.predecessors, vec![(0, 'a'), (1, 'c')]);
    assert_eq!(context.successors, vec![(1, 'c'), (2, 'b')]);

    assert!(!graph.contains(1));
    assert_eq!(graph.edge_count(), 0);
    assert_eq!(graph.successors(0).count(), 0);
    assert_eq!(graph.predecessors(2).count(), 0);
    assert!(graph.remove_node(1).is_none());
}

#[test]
fn decompose_is_persistent() {
    let graph = diamond();
    let (context, rest) = graph.decompose(0).unwrap();
    assert_eq!(context.successors, vec![(1, ()), (2, ())]);
    assert_eq!(rest.node_count(), 3);
    assert_eq!(rest.edge_count(), 2);
    // The original version is untouched.
    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.edge_count(), 4);
    assert!(graph.decompose(7).is_none());
}

#[test]
fn remove_edges() {
    let mut graph = graph_from_edges(2, &[(0, 1, 1), (0, 1, 2), (1, 0, 3)]);
    assert_eq!(graph.remove_edges(0, 1), vec![1, 2]);
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.predecessors(1).count(), 0);
    assert!(graph.remove_edges(0, 1).is_empty());
}

#[test]
fn reverse_flips_edges() {
    let graph = graph_from_edges(3, &[(0, 1, 'a'), (1, 2, 'b')]);
    let reversed = graph.reverse();
    assert_eq!(debug_edges(&reversed), vec!["1->0:'a'", "2->1:'b'"]);
    assert_eq!(reversed.reverse(), graph);
}

#[test]
fn merge_is_idempotent() {
    let left = graph_from_edges(3, &[(0, 1, 'a'), (1, 2, 'b')]);
    let mut right = graph_from_edges(2, &[(0, 1, 'a'), (0, 1, 'z')]);
    right.insert_node(5, 5);

    assert_eq!(left.merge(&left), left);
    let merged = left.merge(&right);
    assert_eq!(merged.node_count(), 4);
    assert_eq!(
        debug_edges(&merged),
        vec!["0->1:'a'", "0->1:'z'", "1->2:'b'"]
    );
    assert_eq!(merged.merge(&right), merged);
    assert_eq!(right.merge(&left).edge_count(), merged.edge_count());
}

#[test]
fn traversals() {
    let graph = diamond();
    assert_eq!(graph.dfs([0]), vec![0, 1, 3, 2]);
    assert_eq!(graph.reachable(1), vec![1, 3]);
    assert_eq!(graph.reachable(9), Vec::<usize>::new());
    assert_eq!(graph.postorder([0]), vec![3, 1, 2, 0]);
}

#[test]
fn traversals_with_cycle() {
    let graph = unlabeled(3, &[(0, 1), (1, 2), (2, 0)]);
    assert_eq!(graph.dfs([1]), vec![1, 2, 0]);
    assert_eq!(graph.postorder([0]), vec![2, 1, 0]);
}

#[test]
fn map_labels() {
    let graph = graph_from_edges(2, &[(0, 1, 2)]);
    let nodes = graph.map_nodes(|id, label| format!("n{id}:{label}"));
    assert_eq!(nodes.label(1).map(String::as_str), Some("n1:1"));
    assert_eq!(nodes.edge_count(), 1);

    let edges = graph.map_edges(|from, to, label| from + to + label);
    assert_eq!(edges.edge_labels(0, 1).copied().collect::<Vec<_>>(), vec![3]);
    assert_eq!(edges.predecessors(1).collect::<Vec<_>>(), vec![(0, &3)]);
}

#[test]
fn print_graph() {
    let graph = graph_from_edges(2, &[(0, 1, "x"), (1, 1, "")]);
    let printed = print(
        Some("\"test\""),
        &graph,
        |_, label| format!("n\"{label}\""),
        |label| (!label.is_empty()).then(|| label.to_string()),
    );
    let expected = r#"digraph "test" {
  Node_0[label="n\"0\""]
  Node_1[label="n\"1\""]

  Node_0 -> Node_1[label="x"]
  Node_1 -> Node_1
}
"#;
    assert_eq!(printed, expected);
}

fn arbitrary_graph() -> impl Strategy<Value = Graph<usize, u8>> {
    (1usize..12).prop_flat_map(|size| {
        prop::collection::vec((0..size, 0..size, 0u8..4), 0..40)
            .prop_map(move |edges| graph_from_edges(size, &edges))
    })
}

proptest! {
    #[test]
    fn adjacency_is_symmetric(graph in arbitrary_graph()) {
        for (from, to, label) in graph.edges() {
            let forward = graph.edge_labels(from, to).filter(|l| *l == label).count();
            let backward = graph
                .predecessors(to)
                .filter(|&(pred, l)| pred == from && l == label)
                .count();
            prop_assert_eq!(forward, backward);
        }
        let preds: usize = graph.node_ids().map(|id| graph.predecessors(id).count()).sum();
        prop_assert_eq!(preds, graph.edge_count());
    }

    #[test]
    fn removal_is_complete(graph in arbitrary_graph(), victim in 0usize..12) {
        let mut graph = graph;
        let before = graph.edge_count();
        let context = graph.remove_node(victim);
        prop_assert!(!graph.node_ids().any(|id| id == victim));
        prop_assert!(!graph.edges().any(|(from, to, _)| from == victim || to == victim));
        if let Some(context) = context {
            let self_loops = context.successors.iter().filter(|(to, _)| *to == victim).count();
            let removed = context.predecessors.len() + context.successors.len() - self_loops;
            prop_assert_eq!(graph.edge_count() + removed, before);
        }
    }

    #[test]
    fn identity_maps_round_trip(graph in arbitrary_graph()) {
        prop_assert_eq!(&graph.map_nodes(|_, label| *label), &graph);
        prop_assert_eq!(&graph.map_edges(|_, _, label| *label), &graph);
    }

    #[test]
    fn merge_with_self_is_identity(graph in arbitrary_graph()) {
        prop_assert_eq!(&graph.merge(&graph), &graph);
    }
}
