//! This crate contains the IR independent building blocks of the analyses in
//! this workspace:
//! * a persistent [multigraph](graph::Graph) keyed by small integers, the
//!   storage behind control flow graphs, control dependence graphs and
//!   points-to graphs,
//! * [meet semi-lattices](https://en.wikipedia.org/wiki/Semilattice) to
//!   describe dataflow facts,
//! * a worklist based [dataflow solver](https://en.wikipedia.org/wiki/Data-flow_analysis)
//!   running forward or backward over a graph,
//! * [dominator trees](https://en.wikipedia.org/wiki/Dominator_(graph_theory))
//!   and postdominator trees, and the control dependence graph derived from
//!   the latter.
//!
//! Some resources to learn more:
//! * [Static Program Analysis, Anders Møller and Michael I. Schwartzbach](https://cs.au.dk/~amoeller/spa/)
//! * [A Simple, Fast Dominance Algorithm](https://www.cs.tufts.edu/comp/150FP/archive/keith-cooper/dom14.pdf)
//! * [Efficiently Computing Static Single Assignment Form and the Control Dependence Graph](https://dl.acm.org/doi/10.1145/115372.115320)

/// Dominance, postdominance and control dependence. These are independent
/// of the actual operations, only based on the shape of the graph.
pub mod analyses;

/// A curated collection of semi-lattices.
pub mod domains;

/// Persistent directed multigraph with symmetric adjacency.
pub mod graph;

/// Implementations of fixed-point iteration algorithms using worklists.
pub mod solvers;

#[cfg(test)]
mod graph_tests;
