use std::fmt::Write;

use analysis::graph::{escape, print};
use itertools::Itertools;

use crate::cdg::ControlDependenceGraph;
use crate::cfg::{Cfg, EdgeKind, node};
use crate::ir::{Module, ValueId, operand_name, print_value};

fn graph_name(module: &Module, function: ValueId) -> String {
    format!("\"{}\"", escape(&operand_name(module, function)))
}

fn edge_label(module: &Module, kind: &EdgeKind) -> Option<String> {
    match kind {
        EdgeKind::Fallthrough | EdgeKind::Unconditional => None,
        EdgeKind::True { .. } => Some("true".to_string()),
        EdgeKind::False { .. } => Some("false".to_string()),
        EdgeKind::Case { value, .. } => Some(format!("case {}", operand_name(module, *value))),
        EdgeKind::Default { .. } => Some("default".to_string()),
        EdgeKind::Indirect { .. } => Some("indirect".to_string()),
        EdgeKind::Normal { .. } => Some("normal".to_string()),
        EdgeKind::Unwind { .. } => Some("unwind".to_string()),
    }
}

/// The instruction level control flow graph in graphviz format.
pub fn cfg_to_dot(module: &Module, cfg: &Cfg) -> String {
    print(
        Some(&graph_name(module, cfg.function())),
        cfg.graph(),
        |_, &inst| print_value(module, inst),
        |kind| edge_label(module, kind),
    )
}

/// The control dependence graph in graphviz format, with the instructions of
/// each basic block grouped into a cluster.
pub fn cdg_to_dot(module: &Module, cdg: &ControlDependenceGraph) -> String {
    let graph = cdg.graph();
    let mut output = format!("digraph {} {{\n", graph_name(module, cdg.function()));
    let by_block = graph
        .nodes()
        .map(|(_, &inst)| inst)
        .into_group_map_by(|&inst| module.block_of(inst));
    let blocks = module
        .function(cdg.function())
        .map(|f| f.blocks.clone())
        .unwrap_or_default();
    for block in blocks {
        let Some(instructions) = by_block.get(&Some(block)) else {
            continue;
        };
        writeln!(output, "  subgraph cluster_{} {{", block.index()).unwrap();
        writeln!(output, "    label=\"{}\"", escape(&operand_name(module, block))).unwrap();
        for &inst in instructions {
            writeln!(
                output,
                "    Node_{}[label=\"{}\"]",
                node(inst),
                escape(&print_value(module, inst))
            )
            .unwrap();
        }
        output.push_str("  }\n");
    }
    output.push('\n');
    for (from, to, _) in graph.edges() {
        writeln!(output, "  Node_{from} -> Node_{to}").unwrap();
    }
    output.push_str("}\n");
    output
}
