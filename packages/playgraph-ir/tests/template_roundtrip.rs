//! Printer/parser round-trip property for the template AST.
//!
//! The printer always parenthesizes binary operations, so any expression
//! built from the well-formed subset below reparses to the identical tree.
//! Floats are excluded (their printed form can collapse to an integer);
//! strategy tiers mirror the grammar's precedence levels so lower-binding
//! constructs never end up bare inside higher-binding positions.

use playgraph_ir::features::template::domain::{BinOp, Template, TemplateExpr, TemplatePart};
use playgraph_ir::features::template::{JinjaScanner, TemplateParser};
use playgraph_ir::shared::models::ScalarValue;
use proptest::prelude::*;

const KEYWORDS: &[&str] = &["and", "or", "not", "is", "true", "false", "none", "null"];

fn ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}".prop_filter("reserved word", |s| !KEYWORDS.contains(&s.as_str()))
}

fn atom() -> BoxedStrategy<TemplateExpr> {
    prop_oneof![
        ident().prop_map(TemplateExpr::Name),
        (0i64..10_000).prop_map(|n| TemplateExpr::Literal(ScalarValue::Int(n))),
        any::<bool>().prop_map(|b| TemplateExpr::Literal(ScalarValue::Bool(b))),
        "[a-z0-9 ]{0,8}".prop_map(|s| TemplateExpr::Literal(ScalarValue::Str(s))),
        Just(TemplateExpr::Literal(ScalarValue::Null)),
    ]
    .boxed()
}

fn access() -> BoxedStrategy<TemplateExpr> {
    ident()
        .prop_map(TemplateExpr::Name)
        .boxed()
        .prop_recursive(3, 8, 1, |inner| {
            prop_oneof![
                (inner.clone(), ident()).prop_map(|(base, attr)| TemplateExpr::GetAttr {
                    base: Box::new(base),
                    attr,
                }),
                (inner, atom()).prop_map(|(base, index)| TemplateExpr::GetItem {
                    base: Box::new(base),
                    index: Box::new(index),
                }),
            ]
            .boxed()
        })
        .boxed()
}

fn simple() -> BoxedStrategy<TemplateExpr> {
    let op = prop_oneof![
        Just(BinOp::Eq),
        Just(BinOp::Ne),
        Just(BinOp::Lt),
        Just(BinOp::Le),
        Just(BinOp::Gt),
        Just(BinOp::Ge),
        Just(BinOp::Add),
        Just(BinOp::Sub),
        Just(BinOp::Concat),
        Just(BinOp::And),
        Just(BinOp::Or),
    ];
    let leaf = prop_oneof![
        atom(),
        access(),
        (ident(), prop::collection::vec(atom(), 0..3))
            .prop_map(|(name, args)| TemplateExpr::Call { name, args }),
    ]
    .boxed();
    leaf.prop_recursive(2, 8, 2, move |inner| {
        (op.clone(), inner.clone(), inner)
            .prop_map(|(op, left, right)| TemplateExpr::BinOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            })
            .boxed()
    })
    .boxed()
}

fn filtered() -> BoxedStrategy<TemplateExpr> {
    simple()
        .prop_recursive(2, 6, 1, |inner| {
            (inner, ident(), prop::collection::vec(atom(), 0..2))
                .prop_map(|(input, name, args)| TemplateExpr::Filter {
                    input: Box::new(input),
                    name,
                    args,
                })
                .boxed()
        })
        .boxed()
}

fn expr() -> BoxedStrategy<TemplateExpr> {
    let tested = prop_oneof![
        filtered(),
        (filtered(), ident(), any::<bool>()).prop_map(|(input, name, negated)| {
            TemplateExpr::Test {
                input: Box::new(input),
                name,
                negated,
            }
        }),
    ]
    .boxed();
    prop_oneof![
        tested.clone(),
        tested.prop_map(|inner| TemplateExpr::Not(Box::new(inner))),
    ]
    .boxed()
}

fn template() -> BoxedStrategy<Template> {
    (
        prop::collection::vec(("[a-z ]{1,6}", expr()), 1..3),
        "[a-z ]{1,6}",
    )
        .prop_map(|(pairs, tail)| {
            let mut parts = Vec::new();
            for (text, e) in pairs {
                parts.push(TemplatePart::Text(text));
                parts.push(TemplatePart::Expr(e));
            }
            parts.push(TemplatePart::Text(tail));
            Template { parts }
        })
        .boxed()
}

proptest! {
    #[test]
    fn expression_round_trips(original in expr()) {
        let printed = format!("{{{{ {} }}}}", original);
        let parsed = JinjaScanner::new().parse(&printed).unwrap();
        prop_assert_eq!(parsed.template.parts.len(), 1);
        match &parsed.template.parts[0] {
            TemplatePart::Expr(reparsed) => prop_assert_eq!(reparsed, &original),
            TemplatePart::Text(text) => prop_assert!(false, "parsed as text: {}", text),
        }
    }

    #[test]
    fn condition_round_trips(original in expr()) {
        let printed = original.to_string();
        let parsed = JinjaScanner::new().parse_condition(&printed).unwrap();
        let expressions: Vec<_> = parsed.template.expressions().collect();
        prop_assert_eq!(expressions.len(), 1);
        prop_assert_eq!(expressions[0], &original);
    }

    #[test]
    fn mixed_template_round_trips(original in template()) {
        let printed = original.to_string();
        let parsed = JinjaScanner::new().parse(&printed).unwrap();
        prop_assert_eq!(parsed.template, original);
    }
}
