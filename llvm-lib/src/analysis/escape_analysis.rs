use analysis::domains::{MeetSemiLattice, meet_all};
use analysis::graph::{Graph, NodeId};
use analysis::solvers::{Dataflow, Direction, TransferFunction};
use im::{OrdMap, OrdSet};
use rustc_hash::FxHashSet;

use crate::cfg::{Cfg, EdgeKind, node, value};
use crate::error::AnalysisError;
use crate::ir::{Constant, Instruction, Module, Type, ValueContent, ValueId};

use super::Analysis;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EscapeNode {
    Parameter,
    Global,
    /// Memory allocated in the function, on the stack or by a call.
    Object,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EscapeEdge {
    /// A pointer stored into memory allocated by the function.
    Internal,
    /// A pointer stored into memory reachable from outside.
    External,
}

/// Points-to style graph over abstract memory. An edge `a -> b` means a
/// pointer to `b` was stored into `a`. Nodes are keyed by the index of the
/// value they abstract.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EscapeGraph {
    pub graph: Graph<EscapeNode, EscapeEdge>,
    /// The calls that may have allocated a node.
    pub call_sites: OrdMap<NodeId, OrdSet<ValueId>>,
    /// Nodes flowing out through a return.
    pub returned: OrdSet<NodeId>,
}

impl EscapeGraph {
    fn add_node(&mut self, id: ValueId, kind: EscapeNode) {
        if !self.graph.contains(node(id)) {
            self.graph.insert_node(node(id), kind);
        }
    }

    fn add_edge(&mut self, from: ValueId, to: ValueId, kind: EscapeEdge) {
        if !self.graph.edge_labels(node(from), node(to)).any(|&l| l == kind) {
            self.graph.insert_edge(node(from), node(to), kind);
        }
    }

    fn add_call_site(&mut self, object: ValueId, call: ValueId) {
        let mut sites = self.call_sites.get(&node(object)).cloned().unwrap_or_default();
        sites.insert(call);
        self.call_sites.insert(node(object), sites);
    }

    /// Whether the memory abstracted by `id` can be reached from a
    /// parameter, a global, or a returned pointer.
    pub fn escapes(&self, id: ValueId) -> bool {
        self.escaping().contains(&node(id))
    }

    /// The objects allocated in the function that escape.
    pub fn escaping_objects(&self) -> Vec<ValueId> {
        let escaping = self.escaping();
        let mut objects: Vec<_> = self
            .graph
            .nodes()
            .filter(|&(id, kind)| *kind == EscapeNode::Object && escaping.contains(&id))
            .map(|(id, _)| value(id))
            .collect();
        objects.sort();
        objects
    }

    fn escaping(&self) -> Vec<NodeId> {
        let starts = self
            .graph
            .nodes()
            .filter(|(_, kind)| **kind != EscapeNode::Object)
            .map(|(id, _)| id)
            .chain(self.returned.iter().copied());
        self.graph.dfs(starts)
    }
}

/// Top is the empty graph, meet is union.
impl MeetSemiLattice for EscapeGraph {
    type LatticeContext = ();

    fn top(_: &()) -> Self {
        Self::default()
    }

    fn meet(&self, other: &Self, _: &()) -> Self {
        Self {
            graph: self.graph.merge(&other.graph),
            call_sites: self
                .call_sites
                .clone()
                .union_with(other.call_sites.clone(), |a, b| a.union(b)),
            returned: self.returned.clone().union(other.returned.clone()),
        }
    }
}

pub struct EscapeTransfer<'m> {
    module: &'m Module,
}

impl<'m> EscapeTransfer<'m> {
    pub fn new(module: &'m Module) -> Self {
        Self { module }
    }

    fn is_pointer(&self, id: ValueId) -> bool {
        matches!(self.module.type_of(id), Type::Pointer { .. })
    }

    /// The abstract memory a pointer value refers to, looking through casts
    /// and address arithmetic. Chains that cycle back on themselves, only
    /// possible in unreachable code, refer to nothing.
    fn pointee(&self, id: ValueId) -> Option<(ValueId, EscapeNode)> {
        if !self.is_pointer(id) {
            return None;
        }
        let mut visited = FxHashSet::default();
        let mut current = id;
        loop {
            if !visited.insert(current) {
                return None;
            }
            let next = match &self.module.value(current).content {
                ValueContent::Argument(_) => return Some((current, EscapeNode::Parameter)),
                ValueContent::GlobalVariable(_) | ValueContent::Alias(_) => {
                    return Some((current, EscapeNode::Global));
                }
                ValueContent::Instruction(inst) => match inst {
                    Instruction::Alloca { .. }
                    | Instruction::Call(_)
                    | Instruction::Invoke { .. } => {
                        return Some((current, EscapeNode::Object));
                    }
                    _ => base_pointer(inst)?,
                },
                ValueContent::Constant(Constant::Expr(inst)) => base_pointer(inst)?,
                _ => return None,
            };
            current = next;
        }
    }
}

fn base_pointer(inst: &Instruction) -> Option<ValueId> {
    match inst {
        Instruction::Cast { value, .. } => Some(*value),
        Instruction::GetElementPtr { base, .. } => Some(*base),
        _ => None,
    }
}

impl TransferFunction<ValueId, EdgeKind, EscapeGraph> for EscapeTransfer<'_> {
    fn transfer(
        &mut self,
        _: &(),
        incoming: &EscapeGraph,
        _: NodeId,
        label: &ValueId,
        _: &[(NodeId, &EdgeKind)],
    ) -> EscapeGraph {
        let id = *label;
        let mut state = incoming.clone();
        match self.module.instruction(id) {
            Some(Instruction::Alloca { .. }) => state.add_node(id, EscapeNode::Object),
            Some(Instruction::Call(_) | Instruction::Invoke { .. }) if self.is_pointer(id) => {
                state.add_node(id, EscapeNode::Object);
                state.add_call_site(id, id);
            }
            Some(Instruction::Store { value, address, .. }) => {
                if let (Some((target, target_kind)), Some((source, source_kind))) =
                    (self.pointee(*address), self.pointee(*value))
                {
                    state.add_node(target, target_kind);
                    state.add_node(source, source_kind);
                    let kind = if target_kind == EscapeNode::Object {
                        EscapeEdge::Internal
                    } else {
                        EscapeEdge::External
                    };
                    state.add_edge(target, source, kind);
                }
            }
            Some(Instruction::Ret(Some(returned))) => {
                if let Some((object, kind)) = self.pointee(*returned) {
                    state.add_node(object, kind);
                    state.returned.insert(node(object));
                }
            }
            _ => {}
        }
        state
    }
}

/// Finds the memory allocated by a function that outlives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EscapeAnalysis;

impl Analysis for EscapeAnalysis {
    type Summary = EscapeGraph;

    /// The escape graph at the exits of the function.
    fn analyze(&self, module: &Module, function: ValueId) -> Result<EscapeGraph, AnalysisError> {
        let cfg = Cfg::new(module, function)?;
        let result = Dataflow::default().solve(
            Direction::Forward,
            cfg.graph(),
            &(),
            EscapeGraph::top(&()),
            &mut EscapeTransfer::new(module),
        )?;
        Ok(meet_all(
            cfg.exits().iter().map(|&exit| result.output(node(exit))),
            &(),
        ))
    }
}
