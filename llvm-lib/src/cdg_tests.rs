use std::collections::BTreeSet;

use pretty_assertions::assert_eq;

use crate::cdg::ControlDependenceGraph;
use crate::cfg::{Cfg, PostdominatorTree};
use crate::ir::{Module, ValueId};
use crate::raw::ValueTag;
use crate::test_utils::*;

fn cdg_of(module: &Module, function: &str) -> ControlDependenceGraph {
    let cfg = Cfg::new(module, named(module, function)).unwrap();
    ControlDependenceGraph::new(&cfg)
}

fn set(module: &Module, names: &[&str]) -> BTreeSet<ValueId> {
    names.iter().map(|name| named(module, name)).collect()
}

#[test]
fn straight_line_has_no_dependencies() {
    let module = straight_line(4);
    let cdg = cdg_of(&module, "straight");
    assert_eq!(cdg.function(), named(&module, "straight"));
    assert_eq!(cdg.graph().node_count(), 8);
    assert_eq!(cdg.graph().edge_count(), 0);
    for (id, &inst) in cdg.graph().nodes() {
        assert_eq!(id, inst.index());
        assert!(cdg.control_dependencies(inst).is_empty());
    }
}

#[test]
fn direct_dependencies() {
    let module = short_circuit();
    let cdg = cdg_of(&module, "f");
    let direct = |name| -> BTreeSet<_> {
        cdg.direct_control_dependencies(named(&module, name))
            .into_iter()
            .collect()
    };

    // The store runs when b is false on the first check, or true on the
    // second one.
    assert_eq!(direct("st"), set(&module, &["br_b", "br_inner"]));
    assert_eq!(direct("br_join"), set(&module, &["br_b", "br_inner"]));
    assert_eq!(direct("bb"), set(&module, &["br_a", "br_b"]));
    assert_eq!(direct("br_inner"), set(&module, &["br_a", "br_b"]));
    assert_eq!(direct("nb"), set(&module, &["br_a"]));
    assert_eq!(direct("br_b"), set(&module, &["br_a"]));
    for unconditional in ["na", "br_a", "ret"] {
        assert!(direct(unconditional).is_empty());
    }
}

#[test]
fn transitive_dependencies() {
    let module = short_circuit();
    let cdg = cdg_of(&module, "f");
    let id = |name| named(&module, name);

    let of_store: BTreeSet<_> = cdg.control_dependencies(id("st")).into_iter().collect();
    assert_eq!(of_store, set(&module, &["br_b", "br_inner", "br_a"]));
    assert!(!of_store.contains(&id("st")));
    assert!(cdg.control_dependencies(id("ret")).is_empty());

    assert!(cdg.control_dependent_on(id("br_a"), id("st")));
    assert!(cdg.control_dependent_on(id("br_inner"), id("st")));
    assert!(!cdg.control_dependent_on(id("st"), id("br_a")));
    assert!(!cdg.control_dependent_on(id("st"), id("st")));
}

#[test]
fn precomputed_postdominators() {
    let module = short_circuit();
    let cfg = Cfg::new(&module, named(&module, "f")).unwrap();
    let postdominators = PostdominatorTree::new(&cfg);
    let shared = ControlDependenceGraph::with_postdominators(&cfg, &postdominators);
    assert_eq!(shared.graph(), ControlDependenceGraph::new(&cfg).graph());

    // A reversed graph is turned back before the dependences are computed.
    let reversed = ControlDependenceGraph::with_postdominators(&cfg.reverse(), &postdominators);
    assert_eq!(reversed.graph(), shared.graph());
}

#[test]
fn loop_condition_depends_on_the_back_edge() {
    //   entry: br loop
    //   loop:  %c = icmp eq 0, 0
    //          br %c, loop, exit
    //   exit:  ret
    let mut builder = RawModuleBuilder::new();
    let (f, _) = builder.function("f", &[]);
    let entry = builder.block(f, "entry");
    let body = builder.block(f, "loop");
    let exit = builder.block(f, "exit");
    let zero = builder.int(0);
    builder.inst(entry, ValueTag::Br, Some("br_entry"), VOID, &[body]);
    let c = builder.icmp(body, "c", zero, zero);
    builder.inst(body, ValueTag::Br, Some("br_loop"), VOID, &[c, body, exit]);
    builder.inst(exit, ValueTag::Ret, Some("ret"), VOID, &[]);
    let module = builder.translate();
    let cdg = cdg_of(&module, "f");
    let id = |name| named(&module, name);

    assert_eq!(cdg.direct_control_dependencies(id("c")), vec![id("br_loop")]);
    assert!(cdg.direct_control_dependencies(id("br_loop")).is_empty());
    assert!(cdg.direct_control_dependencies(id("br_entry")).is_empty());
    assert_eq!(cdg.control_dependencies(id("c")), vec![id("br_loop")]);
}

#[test]
#[should_panic(expected = "is not reachable from itself")]
fn dependencies_of_a_foreign_value() {
    let module = short_circuit();
    let cdg = cdg_of(&module, "f");
    cdg.control_dependencies(named(&module, "entry"));
}
