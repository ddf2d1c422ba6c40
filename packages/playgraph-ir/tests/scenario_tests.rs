//! End-to-end scenarios over the public API: nested shadowing, impure
//! expressions, self-referential facts and sibling includes.

use playgraph_ir::features::graph::{Node, NodeKind};
use playgraph_ir::features::scoping::ScopeLevel;
use playgraph_ir::features::template::JinjaScanner;
use playgraph_ir::{load_variable_file, DependencyChange, ExtractionError, VarContext};
use pretty_assertions::assert_eq;

fn context() -> VarContext<JinjaScanner> {
    VarContext::new(JinjaScanner::new())
}

fn variable_revisions(ctx: &VarContext<JinjaScanner>, name: &str) -> Vec<(u32, u32)> {
    let mut revisions: Vec<(u32, u32)> = ctx
        .graph()
        .nodes()
        .filter_map(|entry| match &entry.node {
            Node::Variable {
                name: n,
                version,
                value_version,
                ..
            } if n == name => Some((*version, *value_version)),
            _ => None,
        })
        .collect();
    revisions.sort();
    revisions
}

#[test]
fn scenario_nested_shadowing_and_restore() {
    // a: "{{ b }}" at play scope; b redefined inside a task scope; a read
    // before, inside and after the nested scope.
    let mut ctx = context();
    let play = ctx.enter_scope(ScopeLevel::PlayVars).unwrap();
    ctx.define_initialised_variable("b", ScopeLevel::PlayVars, "outer", None)
        .unwrap();
    ctx.define_initialised_variable("a", ScopeLevel::PlayVars, "{{ b }}", None)
        .unwrap();

    let before = ctx.evaluate_template("{{ a }}").unwrap();

    let task = ctx.enter_scope(ScopeLevel::TaskVars).unwrap();
    ctx.define_initialised_variable("b", ScopeLevel::TaskVars, "inner", None)
        .unwrap();
    let inside = ctx.evaluate_template("{{ a }}").unwrap();
    ctx.exit_scope(task).unwrap();

    let after = ctx.evaluate_template("{{ a }}").unwrap();

    // Inside the nested scope a sees the shadowing b and gains a fresh
    // value revision; after the exit the hoisted outer value is reused.
    assert_ne!(inside, before);
    assert_eq!(after, before);
    assert_eq!(variable_revisions(&ctx, "a"), vec![(0, 0), (0, 1)]);

    // The recomputation is classified as a rebinding of b
    assert!(ctx.recomputations().iter().any(|event| {
        event.name == "a" && matches!(event.change, DependencyChange::Rebound { .. })
    }));

    ctx.exit_scope(play).unwrap();
}

#[test]
fn scenario_impure_expression_fresh_occurrences() {
    let mut ctx = context();
    let first = ctx.evaluate_template("{{ now() }}").unwrap();
    let second = ctx.evaluate_template("{{ now() }}").unwrap();

    assert_ne!(first, second);
    assert_eq!(ctx.graph().nodes_of_kind(NodeKind::Expression).len(), 1);
    let values = ctx.graph().nodes_of_kind(NodeKind::IntermediateValue);
    assert_eq!(values.len(), 2);

    // Both occurrences are defined by the one shared expression node
    let expr = ctx.graph().nodes_of_kind(NodeKind::Expression)[0];
    for value in values {
        let preds: Vec<_> = ctx
            .graph()
            .predecessors(value)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(preds, vec![expr]);
    }
}

#[test]
fn scenario_self_referential_fact_arguments() {
    // set_fact: { x: "{{ x }}" } with no prior x: the argument is evaluated
    // before the fact is registered, binding against the undefined
    // placeholder instead of recursing.
    let mut ctx = context();
    let argument = ctx.evaluate_template("{{ x }}").unwrap();
    ctx.define_fact("x", argument, None).unwrap();

    let (_, def) = ctx.stack().find_definition("x").unwrap();
    assert_eq!(def.version, 1);
    assert_eq!(def.level, ScopeLevel::SetFactsRegistered);

    // The placeholder definition lost to the fact but is on record
    assert_eq!(variable_revisions(&ctx, "x"), vec![(0, 0), (1, 0)]);
    let visible = ctx.visibility().get("x", 1).unwrap();
    assert!(visible.contains(&("x".to_string(), 0)));
}

#[test]
fn scenario_recursive_variable_file_entry() {
    let mut ctx = context();
    load_variable_file(&mut ctx, ScopeLevel::IncludeVars, "a: \"{{ a }}\"\n", None).unwrap();

    let err = ctx.evaluate_template("{{ a }}").unwrap_err();
    assert!(matches!(
        err,
        ExtractionError::RecursiveDefinition { ref name } if name == "a"
    ));
    assert!(!err.is_fatal());
}

#[test]
fn scenario_sibling_includes_same_name() {
    // Two sibling include_vars loads defining the same name at the same
    // level: distinct revisions, and the second snapshot sees the first.
    let mut ctx = context();
    load_variable_file(&mut ctx, ScopeLevel::IncludeVars, "shared_key: first\n", None).unwrap();
    load_variable_file(&mut ctx, ScopeLevel::IncludeVars, "shared_key: second\n", None).unwrap();

    let (_, def) = ctx.stack().find_definition("shared_key").unwrap();
    assert_eq!(def.version, 1);
    assert_eq!(def.initializer.as_deref(), Some("second"));

    let first_snapshot = ctx.visibility().get("shared_key", 0).unwrap();
    assert!(!first_snapshot.iter().any(|(n, _)| n == "shared_key"));
    let second_snapshot = ctx.visibility().get("shared_key", 1).unwrap();
    assert!(second_snapshot.contains(&("shared_key".to_string(), 0)));
}
