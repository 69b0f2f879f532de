use pretty_assertions::assert_eq;

use crate::cfg::*;
use crate::error::AnalysisError;
use crate::ir::{Constant, Module, ValueContent, ValueId};
use crate::raw::ValueTag;
use crate::test_utils::*;

fn labels(cfg: &Cfg, from: ValueId, to: ValueId) -> Vec<EdgeKind> {
    cfg.graph()
        .edge_labels(node(from), node(to))
        .cloned()
        .collect()
}

fn sorted(mut ids: Vec<ValueId>) -> Vec<ValueId> {
    ids.sort();
    ids
}

#[test]
fn instructions_are_nodes() {
    let module = short_circuit();
    let cfg = Cfg::new(&module, named(&module, "f")).unwrap();
    assert_eq!(cfg.graph().node_count(), 9);
    assert_eq!(cfg.graph().edge_count(), 11);
    for (id, &label) in cfg.graph().nodes() {
        assert_eq!(value(id), label);
        assert!(module.instruction(label).is_some());
    }
    assert_eq!(cfg.entry(), named(&module, "na"));
    assert_eq!(cfg.exits(), &[named(&module, "ret")]);
    assert_eq!(cfg.roots(), vec![named(&module, "na")]);
}

#[test]
fn edge_kinds() {
    let module = short_circuit();
    let cfg = Cfg::new(&module, named(&module, "f")).unwrap();
    let id = |name| named(&module, name);

    assert_eq!(labels(&cfg, id("na"), id("br_a")), vec![EdgeKind::Fallthrough]);
    assert_eq!(
        labels(&cfg, id("br_a"), id("bb")),
        vec![EdgeKind::True { condition: id("na") }]
    );
    assert_eq!(
        labels(&cfg, id("br_a"), id("nb")),
        vec![EdgeKind::False { condition: id("na") }]
    );
    assert_eq!(
        labels(&cfg, id("br_join"), id("ret")),
        vec![EdgeKind::Unconditional]
    );
    assert!(labels(&cfg, id("na"), id("nb")).is_empty());

    let succs: Vec<_> = cfg.successors(id("br_inner")).map(|(to, _)| to).collect();
    assert_eq!(succs, sorted(vec![id("st"), id("ret")]));
    let preds: Vec<_> = cfg.predecessors(id("st")).map(|(from, _)| from).collect();
    assert_eq!(preds, sorted(vec![id("br_b"), id("br_inner")]));
}

#[test]
fn reversed_graph() {
    let module = short_circuit();
    let cfg = Cfg::new(&module, named(&module, "f")).unwrap();
    let reversed = cfg.reverse();
    assert!(reversed.is_reversed());
    assert_eq!(reversed.roots(), vec![named(&module, "ret")]);
    assert_eq!(reversed.entry(), cfg.entry());
    assert_eq!(reversed.graph().edge_count(), cfg.graph().edge_count());
    let succs: Vec<_> = reversed
        .successors(named(&module, "ret"))
        .map(|(to, _)| to)
        .collect();
    assert_eq!(
        succs,
        sorted(vec![named(&module, "br_inner"), named(&module, "br_join")])
    );
    assert!(!reversed.reverse().is_reversed());
    assert_eq!(reversed.reverse().graph(), cfg.graph());
}

#[test]
fn block_level_edges() {
    let module = short_circuit();
    let id = |name| named(&module, name);
    assert_eq!(
        block_successors(&module, id("entry")),
        vec![id("then"), id("check_b")]
    );
    assert_eq!(block_successors(&module, id("join")), Vec::<ValueId>::new());
    assert_eq!(
        block_predecessors(&module, id("store")),
        vec![id("check_b"), id("then")]
    );
    assert_eq!(
        block_predecessors(&module, id("join")),
        vec![id("then"), id("store")]
    );
    assert_eq!(block_predecessors(&module, id("entry")), Vec::<ValueId>::new());
}

#[test]
fn dominators() {
    let module = short_circuit();
    let cfg = Cfg::new(&module, named(&module, "f")).unwrap();
    let id = |name| named(&module, name);
    let tree = DominatorTree::new(&cfg);
    assert_eq!(tree.immediate_dominator(id("na")), None);
    assert_eq!(tree.immediate_dominator(id("bb")), Some(id("br_a")));
    assert_eq!(tree.immediate_dominator(id("st")), Some(id("br_a")));
    assert!(tree.dominates(id("na"), id("ret")));
    assert!(tree.dominates(id("st"), id("st")));
    assert!(!tree.dominates(id("bb"), id("st")));

    // The direction of the graph does not matter.
    let reversed = DominatorTree::new(&cfg.reverse());
    assert_eq!(reversed.immediate_dominator(id("st")), Some(id("br_a")));
}

#[test]
fn postdominators() {
    let module = short_circuit();
    let cfg = Cfg::new(&module, named(&module, "f")).unwrap();
    let id = |name| named(&module, name);
    let tree = PostdominatorTree::new(&cfg);

    for (inst, _) in cfg.graph().nodes() {
        let inst = value(inst);
        assert!(tree.contains(inst));
        assert!(tree.postdominates(id("ret"), inst));
        assert!(tree.postdominates(inst, inst));
    }
    assert_eq!(tree.immediate_postdominator(id("ret")), None);
    assert_eq!(tree.immediate_postdominator(id("st")), Some(id("br_join")));
    assert_eq!(tree.immediate_postdominator(id("br_b")), Some(id("ret")));
    assert_eq!(tree.immediate_postdominator(id("nb")), Some(id("br_b")));
    assert!(!tree.postdominates(id("st"), id("br_b")));
    assert_eq!(
        tree.ancestors(id("bb")),
        vec![id("bb"), id("br_inner"), id("ret")]
    );
    assert_eq!(
        tree.nearest_common_postdominator(id("st"), id("bb")),
        Some(id("ret"))
    );
    assert_eq!(
        tree.nearest_common_postdominator(id("st"), id("br_join")),
        Some(id("br_join"))
    );
}

fn switch_and_invoke() -> Module {
    //   entry: switch %p, other [1 -> one, 2 -> two]
    //   one:   ret
    //   two:   invoke @callee() to one unwind other
    //   other: unreachable
    let mut builder = RawModuleBuilder::new();
    let (callee, _) = builder.function("callee", &[]);
    let (f, args) = builder.function("f", &["p"]);
    let entry = builder.block(f, "entry");
    let one = builder.block(f, "one");
    let two = builder.block(f, "two");
    let other = builder.block(f, "other");
    let c1 = builder.int(1);
    let c2 = builder.int(2);
    builder.inst(
        entry,
        ValueTag::Switch,
        Some("switch"),
        VOID,
        &[args[0], other, c1, one, c2, two],
    );
    builder.inst(one, ValueTag::Ret, Some("ret"), VOID, &[]);
    builder.inst(two, ValueTag::Invoke, Some("invoke"), VOID, &[callee, one, other]);
    builder.inst(other, ValueTag::Unreachable, Some("unreachable"), VOID, &[]);
    builder.translate()
}

#[test]
fn switch_and_invoke_edges() {
    let module = switch_and_invoke();
    let cfg = Cfg::new(&module, named(&module, "f")).unwrap();
    let id = |name| named(&module, name);
    let p = id("p");
    let constant = |raw: i64| {
        module
            .values()
            .iter()
            .find(|v| v.content == ValueContent::Constant(Constant::Int(raw)))
            .map(|v| v.id)
            .unwrap()
    };

    assert_eq!(
        labels(&cfg, id("switch"), id("ret")),
        vec![EdgeKind::Case {
            condition: p,
            value: constant(1)
        }]
    );
    assert_eq!(
        labels(&cfg, id("switch"), id("invoke")),
        vec![EdgeKind::Case {
            condition: p,
            value: constant(2)
        }]
    );
    assert_eq!(
        labels(&cfg, id("switch"), id("unreachable")),
        vec![EdgeKind::Default { condition: p }]
    );
    assert_eq!(
        labels(&cfg, id("invoke"), id("ret")),
        vec![EdgeKind::Normal {
            invoke: id("invoke")
        }]
    );
    assert_eq!(
        labels(&cfg, id("invoke"), id("unreachable")),
        vec![EdgeKind::Unwind {
            invoke: id("invoke")
        }]
    );
    assert_eq!(cfg.exits(), &[id("ret"), id("unreachable")]);

    // Two exits make a forest.
    let tree = PostdominatorTree::new(&cfg);
    assert!(tree.contains(id("switch")));
    assert_eq!(tree.immediate_postdominator(id("switch")), None);
    assert_eq!(
        tree.nearest_common_postdominator(id("ret"), id("unreachable")),
        None
    );
}

#[test]
fn parallel_edges_are_kept() {
    //   entry: br %c, next, next
    let mut builder = RawModuleBuilder::new();
    let (f, _) = builder.function("f", &[]);
    let entry = builder.block(f, "entry");
    let next = builder.block(f, "next");
    let zero = builder.int(0);
    let c = builder.icmp(entry, "c", zero, zero);
    builder.inst(entry, ValueTag::Br, Some("br"), VOID, &[c, next, next]);
    builder.inst(next, ValueTag::Ret, Some("ret"), VOID, &[]);
    let module = builder.translate();
    let cfg = Cfg::new(&module, named(&module, "f")).unwrap();
    let c = named(&module, "c");

    assert_eq!(
        labels(&cfg, named(&module, "br"), named(&module, "ret")),
        vec![
            EdgeKind::True { condition: c },
            EdgeKind::False { condition: c }
        ]
    );
}

#[test]
fn not_a_body() {
    let mut builder = RawModuleBuilder::new();
    builder.function("declared", &[]);
    let (f, _) = builder.function("f", &[]);
    let entry = builder.block(f, "entry");
    builder.inst(entry, ValueTag::Ret, None, VOID, &[]);
    let module = builder.translate();

    let declared = named(&module, "declared");
    assert_eq!(
        Cfg::new(&module, declared).unwrap_err(),
        AnalysisError::Declaration(declared)
    );
    let block = named(&module, "entry");
    assert_eq!(
        Cfg::new(&module, block).unwrap_err(),
        AnalysisError::NotAFunction(block)
    );
}
