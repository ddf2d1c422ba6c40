//! Engine invariants: revision monotonicity, idempotence, precedence and
//! scope-exit behavior, plus full graph wiring for a small walked unit.

use playgraph_ir::features::graph::{Edge, Node, NodeKind};
use playgraph_ir::features::scoping::ScopeLevel;
use playgraph_ir::features::template::JinjaScanner;
use playgraph_ir::{DependencyChange, NodeId, VarContext};
use pretty_assertions::assert_eq;

fn context() -> VarContext<JinjaScanner> {
    VarContext::new(JinjaScanner::new())
}

/// Precedence of the variable binding a data node was computed from:
/// follow the Def edge back to the expression, then its Use predecessor.
fn used_precedence(ctx: &VarContext<JinjaScanner>, value: NodeId) -> u8 {
    let (expr, _) = ctx.graph().predecessors(value)[0];
    let used = ctx
        .graph()
        .predecessors_by(expr, |e| matches!(e, Edge::Use));
    match ctx.graph().node(used[0]) {
        Some(Node::Variable { precedence, .. }) => *precedence,
        other => panic!("expected a variable, got {:?}", other),
    }
}

#[test]
fn definition_revisions_strictly_increase() {
    let mut ctx = context();
    for value in ["one", "two", "three"] {
        ctx.define_initialised_variable("x", ScopeLevel::SetFactsRegistered, value, None)
            .unwrap();
    }
    let (_, def) = ctx.stack().find_definition("x").unwrap();
    assert_eq!(def.version, 2);
}

#[test]
fn value_revisions_strictly_increase() {
    let mut ctx = context();
    ctx.define_injected_variable(
        "base",
        ScopeLevel::CommandLineValues,
        &serde_yaml::Value::from(1),
        None,
    )
    .unwrap();
    ctx.define_initialised_variable("derived", ScopeLevel::SetFactsRegistered, "{{ base }}", None)
        .unwrap();
    ctx.evaluate_template("{{ derived }}").unwrap();

    // Rebinding base stales derived's cached value
    ctx.define_injected_variable(
        "base",
        ScopeLevel::CommandLineValues,
        &serde_yaml::Value::from(2),
        None,
    )
    .unwrap();
    ctx.evaluate_template("{{ derived }}").unwrap();

    let revisions: Vec<u32> = ctx
        .graph()
        .nodes()
        .filter_map(|entry| match &entry.node {
            Node::Variable {
                name,
                value_version,
                ..
            } if name == "derived" => Some(*value_version),
            _ => None,
        })
        .collect();
    assert_eq!(revisions, vec![0, 1]);
    assert!(ctx
        .recomputations()
        .iter()
        .any(|event| event.name == "derived"
            && matches!(event.change, DependencyChange::Rebound { .. })));
}

#[test]
fn pure_evaluation_is_idempotent() {
    let mut ctx = context();
    ctx.define_injected_variable(
        "port",
        ScopeLevel::RoleDefaults,
        &serde_yaml::Value::from(8080),
        None,
    )
    .unwrap();

    let first = ctx.evaluate_template("{{ port }}").unwrap();
    let count = ctx.graph().node_count();
    let second = ctx.evaluate_template("{{ port }}").unwrap();

    assert_eq!(first, second);
    assert_eq!(ctx.graph().node_count(), count, "no duplicate nodes");
}

#[test]
fn higher_precedence_wins_regardless_of_entry_order() {
    let mut ctx = context();
    let play = ctx.enter_scope(ScopeLevel::PlayVars).unwrap();
    let task = ctx.enter_scope(ScopeLevel::TaskVars).unwrap();

    // Broader scope's definition arrives after the narrower one
    ctx.define_initialised_variable("x", ScopeLevel::TaskVars, "narrow", None)
        .unwrap();
    ctx.define_initialised_variable("x", ScopeLevel::PlayVars, "broad", None)
        .unwrap();

    let inside = ctx.evaluate_template("{{ x }}").unwrap();
    assert_eq!(
        used_precedence(&ctx, inside),
        ScopeLevel::TaskVars.precedence()
    );

    ctx.exit_scope(task).unwrap();
    let outside = ctx.evaluate_template("{{ x }}").unwrap();
    assert_ne!(inside, outside);
    assert_eq!(
        used_precedence(&ctx, outside),
        ScopeLevel::PlayVars.precedence()
    );
    ctx.exit_scope(play).unwrap();
}

#[test]
fn scope_exit_invalidates_dependent_values() {
    let mut ctx = context();
    let play = ctx.enter_scope(ScopeLevel::PlayVars).unwrap();
    ctx.define_initialised_variable("a", ScopeLevel::PlayVars, "{{ tmp }}", None)
        .unwrap();

    let task = ctx.enter_scope(ScopeLevel::TaskVars).unwrap();
    ctx.define_initialised_variable("tmp", ScopeLevel::TaskVars, "scoped", None)
        .unwrap();
    let inside = ctx.evaluate_template("{{ a }}").unwrap();
    ctx.exit_scope(task).unwrap();

    // tmp is gone: a's value must be recomputed, now binding tmp at the
    // undefined placeholder level
    let outside = ctx.evaluate_template("{{ a }}").unwrap();
    assert_ne!(inside, outside);
    let (_, def) = ctx.stack().find_definition("tmp").unwrap();
    assert_eq!(def.level, ScopeLevel::Undefined);
    ctx.exit_scope(play).unwrap();
}

#[test]
fn walked_unit_wires_every_edge_kind() {
    let mut ctx = context();
    let play = ctx.enter_scope(ScopeLevel::PlayVars).unwrap();
    let items: serde_yaml::Value = serde_yaml::from_str("[one, two]").unwrap();
    ctx.define_injected_variable("item_list", ScopeLevel::PlayVars, &items, None)
        .unwrap();

    let setup = ctx.graph_mut().add_node(Node::Task {
        action: "file".into(),
        name: Some("prepare".into()),
    });
    let debug = ctx.graph_mut().add_node(Node::Task {
        action: "debug".into(),
        name: None,
    });
    ctx.graph_mut()
        .add_edge(
            setup,
            debug,
            Edge::Order {
                transitive: false,
                back: false,
            },
        )
        .unwrap();

    // Loop over item_list, binding the loop variable per iteration
    let source = ctx.evaluate_template("{{ item_list }}").unwrap();
    let loop_node = ctx.graph_mut().add_node(Node::Loop);
    ctx.graph_mut().add_edge(source, loop_node, Edge::Use).unwrap();
    ctx.graph_mut()
        .add_edge(
            loop_node,
            debug,
            Edge::Order {
                transitive: false,
                back: false,
            },
        )
        .unwrap();

    let loop_scope = ctx.enter_scope(ScopeLevel::LoopVars).unwrap();
    ctx.define_loop_item("item", source).unwrap();
    let msg = ctx.evaluate_template("{{ item }}").unwrap();
    ctx.graph_mut()
        .add_edge(msg, debug, Edge::Keyword { keyword: "msg".into() })
        .unwrap();
    ctx.exit_scope(loop_scope).unwrap();

    // A conditionally guarded fact
    let condition = ctx.evaluate_condition("item_count > 1").unwrap();
    let conditional = ctx.graph_mut().add_node(Node::Conditional);
    ctx.graph_mut().add_edge(condition, conditional, Edge::Use).unwrap();
    let guarded = ctx.define_fact("guarded", condition, None).unwrap();
    ctx.graph_mut()
        .add_edge(conditional, guarded, Edge::DefinedIf)
        .unwrap();

    ctx.exit_scope(play).unwrap();
    let stats = ctx.graph().stats();
    assert_eq!(stats.control_edges, 2);

    let artifacts = ctx.finish();
    let mut kinds: Vec<&str> = artifacts
        .graph
        .edges
        .iter()
        .map(|e| match e.edge {
            Edge::Order { .. } => "order",
            Edge::Use => "use",
            Edge::Keyword { .. } => "keyword",
            Edge::Def => "def",
            Edge::DefinedIf => "defined_if",
            Edge::DefLoopItem => "def_loop_item",
        })
        .collect();
    kinds.sort();
    kinds.dedup();
    assert_eq!(
        kinds,
        vec!["def", "def_loop_item", "defined_if", "keyword", "order", "use"]
    );
    assert!(artifacts
        .graph
        .nodes
        .iter()
        .any(|entry| entry.node.kind() == NodeKind::CompositeLiteral));
}
