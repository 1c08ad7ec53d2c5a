mod common;

use common::*;
use pretty_assertions::assert_eq;
use ssaflow_dataflow::{with_config, TraversalConfig, Value, Values};

#[test]
fn test_leaves_are_their_own_top_defs() {
    let phi = phi_merge();
    let depth = depth_chain();
    let pass = pass_through();

    for leaf in [phi.value("one"), depth.value("e"), pass.value("i")] {
        let values = leaf.get_top_defs(&[]);
        assert_eq!(values.ids(), vec![leaf.id()], "{} should be a leaf", leaf);
    }
}

#[test]
fn test_top_defs_are_never_empty() {
    for fixture in [
        deep_call(),
        side_effect(),
        recursion_chain(),
        masked_member(),
        missing_argument(),
        short_return(),
        malformed_returns(),
        member_method(),
    ] {
        for value in fixture.all_values() {
            assert!(
                !value.get_top_defs(&[]).is_empty(),
                "empty top-defs for {}",
                value
            );
        }
    }
}

#[test]
fn test_phi_merges_member_writes() {
    let fx = phi_merge();
    let d = fx.value("d");

    let values = d.get_top_defs(&[]);
    assert_eq!(values.strings(), vec!["1", "3"]);
    assert!(values
        .iter()
        .any(|leaf| leaf.effect_on().iter().any(Value::is_phi)));
}

#[test]
fn test_parameter_resolves_to_argument() {
    let fx = pass_through();
    let values = fx.value("c").get_top_defs(&[]);
    assert_eq!(values.ids(), vec![fx.id("a")]);
}

#[test]
fn test_unpacked_returns_do_not_mix() {
    let fx = multi_return();
    assert_eq!(fx.value("a").get_top_defs(&[]).ids(), vec![fx.id("one")]);
    assert_eq!(fx.value("b").get_top_defs(&[]).ids(), vec![fx.id("two")]);
}

#[test]
fn test_whole_call_collects_every_return_slot() {
    let fx = multi_return();
    let values = fx.value("r").get_top_defs(&[]);
    assert_eq!(values.strings(), vec!["1", "2"]);
}

#[test]
fn test_side_effect_merges_closure_write() {
    let fx = side_effect();
    let values = fx.value("c").get_top_defs(&[]);
    assert_eq!(values.strings(), vec!["1", "2"]);

    let written = values.iter().find(|v| v.id() == fx.id("two")).unwrap();
    assert!(written.is_side_effect());
    assert_eq!(written.side_effect_source().unwrap().id(), fx.id("after"));
}

#[test]
fn test_mutual_recursion_terminates() {
    let fx = recursion_chain();
    let values = fx.value("r").get_top_defs(&[]);
    assert!(!values.is_empty());
    assert!(values.iter().all(Value::is_call));
}

#[test]
fn test_depth_bound_is_monotonic() {
    let fx = depth_chain();
    let g = fx.value("g");

    let unbounded = g.get_top_defs(&[]);
    assert_eq!(unbounded.strings(), vec!["1", "a", "e", "f"]);

    let bounded = g.get_top_defs(&[ssaflow_dataflow::with_max_depth(2)]);
    assert_eq!(bounded.strings(), vec!["a + 1", "e", "f"]);
    assert!(bounded.len() <= unbounded.len());
}

#[test]
fn test_repeated_calls_agree() {
    let fx = deep_call();
    let e = fx.value("e");

    let first = e.get_top_defs(&[]);
    let edges_after_first = e.depend_on().len();
    let second = e.get_top_defs(&[]);

    assert_eq!(first.strings(), second.strings());
    assert_eq!(first.hash(), second.hash());
    assert!(e.depend_on().len() >= edges_after_first);
}

#[test]
fn test_call_into_callee_body() {
    let fx = deep_call();
    let values = fx.value("e").get_top_defs(&[]);
    // c = b(a) returns i + 1 with i bound to a
    assert_eq!(values.strings(), vec!["1", "1", "1"]);
    assert_eq!(values.len(), 3);
}

#[test]
fn test_unresolved_call_collects_method_and_arguments() {
    let fx = deep_call();
    let values = fx.value("printed").get_top_defs(&[]);
    assert_eq!(values.strings(), vec!["i", "println"]);
}

#[test]
fn test_unresolved_member_method_is_kept_whole() {
    let fx = member_method();
    let r = fx.value("r");
    let values = r.get_top_defs(&[]);

    let mut ids = values.ids();
    ids.sort();
    assert_eq!(ids, vec![fx.id("m"), fx.id("one")]);
    assert!(!values.contains_id(fx.id("obj")));
    assert!(r.depend_on().iter().any(|dep| dep.id() == fx.id("m")));
}

#[test]
fn test_missing_argument_leaves_parameter() {
    let fx = missing_argument();
    let values = fx.value("r").get_top_defs(&[]);
    assert_eq!(values.ids(), vec![fx.id("y")]);
}

#[test]
fn test_callee_without_returns_is_its_own_origin() {
    let fx = short_return();
    let m = fx.value("m");
    let values = m.get_top_defs(&[]);
    assert_eq!(values.ids(), vec![fx.id("n")]);
    assert!(m.depend_on().iter().any(|dep| dep.id() == fx.id("n")));
}

#[test]
fn test_missing_return_position_stops_at_callee() {
    let fx = short_return();
    let values = fx.value("b").get_top_defs(&[]);
    assert_eq!(values.ids(), vec![fx.id("c")]);
}

#[test]
fn test_non_return_entries_are_skipped() {
    let fx = malformed_returns();
    assert_eq!(fx.value("rf").get_top_defs(&[]).ids(), vec![fx.id("one")]);
    assert_eq!(fx.value("rg").get_top_defs(&[]).ids(), vec![fx.id("g")]);
}

#[test]
fn test_long_chain_within_ceiling() {
    // two visits per link keeps the walk just under the default ceiling
    let fx = long_chain(4_900);
    let values = fx
        .value("last")
        .get_top_defs(&[with_config(TraversalConfig::default())]);
    assert_eq!(values.strings(), vec!["1", "a"]);
}

#[test]
fn test_long_chain_past_ceiling_returns_frontier() {
    let fx = long_chain(4_900);
    let config = TraversalConfig {
        recursion_limit: 3_000,
        ..TraversalConfig::default()
    };
    let values = fx.value("last").get_top_defs(&[with_config(config)]);
    assert_eq!(values.len(), 2);
    assert!(values.contains_id(fx.id("one")));
    assert!(!values.contains_id(fx.id("a")));
}

#[test]
fn test_variadic_tail_collects_trailing_arguments() {
    let fx = variadic();
    let values = fx.value("r").get_top_defs(&[]);
    assert_eq!(values.strings(), vec!["2", "3"]);
}

#[test]
fn test_free_value_prefers_call_binding() {
    let fx = free_values();
    assert_eq!(fx.value("r1").get_top_defs(&[]).ids(), vec![fx.id("seven")]);
    assert_eq!(fx.value("r2").get_top_defs(&[]).ids(), vec![fx.id("one")]);
}

#[test]
fn test_masks_contribute_alternate_writes() {
    let fx = masked_member();
    let values = fx.value("d").get_top_defs(&[]);
    assert!(values.contains_id(fx.id("one")));
    assert!(values.contains_id(fx.id("two")));
    assert!(values.contains_id(fx.id("o")));
}

#[test]
fn test_edges_record_provenance() {
    let fx = pass_through();
    let c = fx.value("c");
    let values = c.get_top_defs(&[]);

    let leaf = values.get(0).unwrap();
    assert!(c.depend_on().iter().any(|dep| dep.ptr_eq(leaf)));
    assert!(leaf.effect_on().iter().any(|eff| eff.ptr_eq(&c)));
    assert!(leaf.parent().is_some());
    assert!(leaf.depth() > 0);
}

#[test]
fn test_batched_top_defs_are_deduplicated() {
    let fx = multi_return();
    let batch = Values::from(vec![fx.value("a"), fx.value("r"), fx.value("b")]);
    let values = batch.get_top_defs(&[]);
    assert_eq!(values.strings(), vec!["1", "2"]);
}
