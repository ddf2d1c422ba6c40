//! Template expression AST
//!
//! Closed sum type over the expression subset the extractor understands.
//! The printer always parenthesizes binary operations, so
//! `parse(print(ast)) == ast` holds without a precedence-aware printer
//! (verified as a property test in `tests/template_roundtrip.rs`).

use crate::shared::models::ScalarValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Concat,
    And,
    Or,
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Concat => "~",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}

/// Expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemplateExpr {
    Literal(ScalarValue),
    /// Variable reference
    Name(String),
    /// `base.attr`
    GetAttr {
        base: Box<TemplateExpr>,
        attr: String,
    },
    /// `base[index]`
    GetItem {
        base: Box<TemplateExpr>,
        index: Box<TemplateExpr>,
    },
    /// Builtin/lookup call: `lookup('env', 'HOME')`
    Call {
        name: String,
        args: Vec<TemplateExpr>,
    },
    /// `input | name(args)`
    Filter {
        input: Box<TemplateExpr>,
        name: String,
        args: Vec<TemplateExpr>,
    },
    /// `input is [not] name`
    Test {
        input: Box<TemplateExpr>,
        name: String,
        negated: bool,
    },
    BinOp {
        op: BinOp,
        left: Box<TemplateExpr>,
        right: Box<TemplateExpr>,
    },
    Not(Box<TemplateExpr>),
}

/// One segment of a template string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemplatePart {
    Text(String),
    Expr(TemplateExpr),
}

/// A parsed template: interleaved literal text and `{{ }}` expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub parts: Vec<TemplatePart>,
}

impl Template {
    /// Whether the template contains no expression segments
    pub fn is_literal(&self) -> bool {
        self.parts
            .iter()
            .all(|p| matches!(p, TemplatePart::Text(_)))
    }

    pub fn expressions(&self) -> impl Iterator<Item = &TemplateExpr> {
        self.parts.iter().filter_map(|p| match p {
            TemplatePart::Expr(e) => Some(e),
            TemplatePart::Text(_) => None,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Visitor
// ═══════════════════════════════════════════════════════════════════════════

/// Read-only expression visitor; `walk` drives a full pre-order traversal.
pub trait ExprVisitor {
    fn visit_name(&mut self, _name: &str) {}
    fn visit_call(&mut self, _name: &str) {}
    fn visit_filter(&mut self, _name: &str) {}
    fn visit_test(&mut self, _name: &str) {}
    fn visit_literal(&mut self, _value: &ScalarValue) {}
}

pub fn walk<V: ExprVisitor>(expr: &TemplateExpr, visitor: &mut V) {
    match expr {
        TemplateExpr::Literal(value) => visitor.visit_literal(value),
        TemplateExpr::Name(name) => visitor.visit_name(name),
        TemplateExpr::GetAttr { base, .. } => walk(base, visitor),
        TemplateExpr::GetItem { base, index } => {
            walk(base, visitor);
            walk(index, visitor);
        }
        TemplateExpr::Call { name, args } => {
            visitor.visit_call(name);
            for arg in args {
                walk(arg, visitor);
            }
        }
        TemplateExpr::Filter { input, name, args } => {
            visitor.visit_filter(name);
            walk(input, visitor);
            for arg in args {
                walk(arg, visitor);
            }
        }
        TemplateExpr::Test { input, name, .. } => {
            visitor.visit_test(name);
            walk(input, visitor);
        }
        TemplateExpr::BinOp { left, right, .. } => {
            walk(left, visitor);
            walk(right, visitor);
        }
        TemplateExpr::Not(inner) => walk(inner, visitor),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Printer
// ═══════════════════════════════════════════════════════════════════════════

impl fmt::Display for TemplateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateExpr::Literal(ScalarValue::Str(s)) => write!(f, "'{}'", s.replace('\'', "\\'")),
            TemplateExpr::Literal(ScalarValue::Null) => write!(f, "none"),
            TemplateExpr::Literal(ScalarValue::Bool(b)) => {
                write!(f, "{}", if *b { "true" } else { "false" })
            }
            TemplateExpr::Literal(value) => write!(f, "{}", value),
            TemplateExpr::Name(name) => write!(f, "{}", name),
            TemplateExpr::GetAttr { base, attr } => write!(f, "{}.{}", base, attr),
            TemplateExpr::GetItem { base, index } => write!(f, "{}[{}]", base, index),
            TemplateExpr::Call { name, args } => {
                write!(f, "{}(", name)?;
                print_args(f, args)?;
                write!(f, ")")
            }
            TemplateExpr::Filter { input, name, args } => {
                write!(f, "{} | {}", input, name)?;
                if !args.is_empty() {
                    write!(f, "(")?;
                    print_args(f, args)?;
                    write!(f, ")")?;
                }
                Ok(())
            }
            TemplateExpr::Test {
                input,
                name,
                negated,
            } => {
                if *negated {
                    write!(f, "{} is not {}", input, name)
                } else {
                    write!(f, "{} is {}", input, name)
                }
            }
            TemplateExpr::BinOp { op, left, right } => {
                write!(f, "({} {} {})", left, op.as_str(), right)
            }
            TemplateExpr::Not(inner) => write!(f, "not {}", inner),
        }
    }
}

fn print_args(f: &mut fmt::Formatter<'_>, args: &[TemplateExpr]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", arg)?;
    }
    Ok(())
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            match part {
                TemplatePart::Text(text) => write!(f, "{}", text)?,
                TemplatePart::Expr(expr) => write!(f, "{{{{ {} }}}}", expr)?,
            }
        }
        Ok(())
    }
}
