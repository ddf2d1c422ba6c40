//! Bundled reference implementation of the template parser port
//!
//! A small Jinja-style scanner: `{{ }}` interpolation plus an expression
//! grammar covering names, attribute/subscript access, literals, calls,
//! filters, tests, boolean/comparison/arithmetic operators. Statement
//! blocks (`{% %}`) and comments (`{# #}`) are rejected as unsupported;
//! callers downgrade that to a literal fallback with a diagnostic.

use crate::features::template::domain::ast::{BinOp, Template, TemplateExpr, TemplatePart};
use crate::features::template::ports::parser::{ParsedTemplate, TemplateParser};
use crate::shared::models::{ExtractionError, Result, ScalarValue};
use once_cell::sync::Lazy;
use regex::Regex;

static BLOCK_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[%#]").unwrap());

/// Reference template parser
#[derive(Debug, Default, Clone, Copy)]
pub struct JinjaScanner;

impl JinjaScanner {
    pub fn new() -> Self {
        JinjaScanner
    }

    fn scan_template(&self, text: &str) -> Result<Template> {
        if BLOCK_MARKER.is_match(text) {
            return Err(ExtractionError::UnsupportedConstruct {
                construct: "statement or comment block".into(),
            });
        }

        let mut parts = Vec::new();
        let mut rest = text;
        while let Some(open) = rest.find("{{") {
            if !rest[..open].is_empty() {
                parts.push(TemplatePart::Text(rest[..open].to_string()));
            }
            let after = &rest[open + 2..];
            let close = after
                .find("}}")
                .ok_or_else(|| parse_error("unclosed '{{' delimiter"))?;
            let inner = &after[..close];
            parts.push(TemplatePart::Expr(parse_expression(inner)?));
            rest = &after[close + 2..];
        }
        if !rest.is_empty() || parts.is_empty() {
            parts.push(TemplatePart::Text(rest.to_string()));
        }
        Ok(Template { parts })
    }
}

impl TemplateParser for JinjaScanner {
    fn parse(&self, text: &str) -> Result<ParsedTemplate> {
        let template = self.scan_template(text)?;
        Ok(ParsedTemplate::from_template(template))
    }

    fn parse_condition(&self, text: &str) -> Result<ParsedTemplate> {
        if text.contains("{{") {
            // Conditions are already templated; nested braces are a common
            // authoring mistake but still parse as a template.
            return self.parse(text);
        }
        let expr = parse_expression(text)?;
        Ok(ParsedTemplate::from_template(Template {
            parts: vec![TemplatePart::Expr(expr)],
        }))
    }
}

fn parse_error(message: impl Into<String>) -> ExtractionError {
    ExtractionError::TemplateParse {
        message: message.into(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Lexer
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Dot,
    Comma,
    Pipe,
    Tilde,
    Plus,
    Minus,
    LParen,
    RParen,
    LBracket,
    RBracket,
    EqEq,
    NotEq,
    Le,
    Ge,
    Lt,
    Gt,
}

fn lex(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '|' => {
                tokens.push(Token::Pipe);
                i += 1;
            }
            '~' => {
                tokens.push(Token::Tilde);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::EqEq);
                    i += 2;
                } else {
                    return Err(parse_error("single '=' is not a valid operator"));
                }
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::NotEq);
                    i += 2;
                } else {
                    return Err(parse_error("unexpected '!'"));
                }
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Le);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Ge);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            '\'' | '"' => {
                let quote = c;
                let mut value = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        Some('\\') if chars.get(i + 1) == Some(&quote) => {
                            value.push(quote);
                            i += 2;
                        }
                        Some(&ch) if ch == quote => {
                            i += 1;
                            break;
                        }
                        Some(&ch) => {
                            value.push(ch);
                            i += 1;
                        }
                        None => return Err(parse_error("unterminated string literal")),
                    }
                }
                tokens.push(Token::Str(value));
            }
            '0'..='9' => {
                let start = i;
                let mut is_float = false;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    if chars[i] == '.' {
                        // attribute access on a number is not a thing here
                        if is_float {
                            break;
                        }
                        is_float = true;
                    }
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                if is_float {
                    let value = text
                        .parse::<f64>()
                        .map_err(|_| parse_error(format!("bad number '{}'", text)))?;
                    tokens.push(Token::Float(value));
                } else {
                    let value = text
                        .parse::<i64>()
                        .map_err(|_| parse_error(format!("bad number '{}'", text)))?;
                    tokens.push(Token::Int(value));
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(parse_error(format!("unexpected character '{}'", other))),
        }
    }
    Ok(tokens)
}

// ═══════════════════════════════════════════════════════════════════════════
// Parser (recursive descent)
// ═══════════════════════════════════════════════════════════════════════════

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

pub fn parse_expression(input: &str) -> Result<TemplateExpr> {
    let tokens = lex(input)?;
    if tokens.is_empty() {
        return Err(parse_error("empty expression"));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.or_level()?;
    if parser.pos != parser.tokens.len() {
        return Err(parse_error("trailing tokens after expression"));
    }
    Ok(expr)
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(name)) if name == kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<()> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(parse_error(format!("expected {}", what)))
        }
    }

    fn or_level(&mut self) -> Result<TemplateExpr> {
        let mut left = self.and_level()?;
        while self.eat_keyword("or") {
            let right = self.and_level()?;
            left = binop(BinOp::Or, left, right);
        }
        Ok(left)
    }

    fn and_level(&mut self) -> Result<TemplateExpr> {
        let mut left = self.not_level()?;
        while self.eat_keyword("and") {
            let right = self.not_level()?;
            left = binop(BinOp::And, left, right);
        }
        Ok(left)
    }

    fn not_level(&mut self) -> Result<TemplateExpr> {
        if self.eat_keyword("not") {
            let inner = self.not_level()?;
            return Ok(TemplateExpr::Not(Box::new(inner)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<TemplateExpr> {
        let mut left = self.pipeline()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => Some(BinOp::Eq),
                Some(Token::NotEq) => Some(BinOp::Ne),
                Some(Token::Lt) => Some(BinOp::Lt),
                Some(Token::Le) => Some(BinOp::Le),
                Some(Token::Gt) => Some(BinOp::Gt),
                Some(Token::Ge) => Some(BinOp::Ge),
                _ => None,
            };
            if let Some(op) = op {
                self.pos += 1;
                let right = self.pipeline()?;
                left = binop(op, left, right);
                continue;
            }
            if self.eat_keyword("is") {
                let negated = self.eat_keyword("not");
                let name = self.ident("test name")?;
                left = TemplateExpr::Test {
                    input: Box::new(left),
                    name,
                    negated,
                };
                continue;
            }
            return Ok(left);
        }
    }

    fn pipeline(&mut self) -> Result<TemplateExpr> {
        let mut left = self.additive()?;
        while self.eat(&Token::Pipe) {
            let name = self.ident("filter name")?;
            let args = if self.eat(&Token::LParen) {
                self.call_args()?
            } else {
                Vec::new()
            };
            left = TemplateExpr::Filter {
                input: Box::new(left),
                name,
                args,
            };
        }
        Ok(left)
    }

    fn additive(&mut self) -> Result<TemplateExpr> {
        let mut left = self.postfix()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => Some(BinOp::Add),
                Some(Token::Minus) => Some(BinOp::Sub),
                Some(Token::Tilde) => Some(BinOp::Concat),
                _ => None,
            };
            let Some(op) = op else { return Ok(left) };
            self.pos += 1;
            let right = self.postfix()?;
            left = binop(op, left, right);
        }
    }

    fn postfix(&mut self) -> Result<TemplateExpr> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(&Token::Dot) {
                let attr = self.ident("attribute name")?;
                expr = TemplateExpr::GetAttr {
                    base: Box::new(expr),
                    attr,
                };
            } else if self.eat(&Token::LBracket) {
                let index = self.or_level()?;
                self.expect(Token::RBracket, "']'")?;
                expr = TemplateExpr::GetItem {
                    base: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<TemplateExpr> {
        match self.bump() {
            Some(Token::Int(value)) => Ok(TemplateExpr::Literal(ScalarValue::Int(value))),
            Some(Token::Float(value)) => Ok(TemplateExpr::Literal(ScalarValue::Float(value))),
            Some(Token::Str(value)) => Ok(TemplateExpr::Literal(ScalarValue::Str(value))),
            Some(Token::LParen) => {
                let expr = self.or_level()?;
                self.expect(Token::RParen, "')'")?;
                Ok(expr)
            }
            Some(Token::Ident(name)) => match name.as_str() {
                "true" | "True" => Ok(TemplateExpr::Literal(ScalarValue::Bool(true))),
                "false" | "False" => Ok(TemplateExpr::Literal(ScalarValue::Bool(false))),
                "none" | "None" | "null" => Ok(TemplateExpr::Literal(ScalarValue::Null)),
                _ => {
                    if self.eat(&Token::LParen) {
                        let args = self.call_args()?;
                        Ok(TemplateExpr::Call { name, args })
                    } else {
                        Ok(TemplateExpr::Name(name))
                    }
                }
            },
            other => Err(parse_error(format!("unexpected token {:?}", other))),
        }
    }

    fn call_args(&mut self) -> Result<Vec<TemplateExpr>> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.or_level()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(Token::RParen, "')'")?;
            return Ok(args);
        }
    }

    fn ident(&mut self, what: &str) -> Result<String> {
        match self.bump() {
            Some(Token::Ident(name)) => Ok(name),
            _ => Err(parse_error(format!("expected {}", what))),
        }
    }
}

fn binop(op: BinOp, left: TemplateExpr, right: TemplateExpr) -> TemplateExpr {
    TemplateExpr::BinOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> ParsedTemplate {
        JinjaScanner::new().parse(text).unwrap()
    }

    #[test]
    fn test_plain_text_is_literal() {
        let parsed = parse("just a value");
        assert!(parsed.is_literal);
        assert!(parsed.referenced.is_empty());
    }

    #[test]
    fn test_simple_reference() {
        let parsed = parse("{{ app_port }}");
        assert!(!parsed.is_literal);
        assert_eq!(parsed.referenced, vec!["app_port"]);
    }

    #[test]
    fn test_mixed_text_and_expressions() {
        let parsed = parse("http://{{ host }}:{{ port }}/api");
        assert_eq!(parsed.referenced, vec!["host", "port"]);
        assert_eq!(parsed.template.parts.len(), 5);
    }

    #[test]
    fn test_filter_and_lookup_collection() {
        let parsed = parse("{{ lookup('env', 'HOME') | default('/root') }}");
        assert_eq!(parsed.lookups, vec!["lookup"]);
        assert_eq!(parsed.filters, vec!["default"]);
        assert_eq!(parsed.impure_components(), vec!["lookup"]);
    }

    #[test]
    fn test_condition_parsing() {
        let parsed = JinjaScanner::new()
            .parse_condition("ansible_os_family == 'Debian' and app_enabled")
            .unwrap();
        assert_eq!(parsed.referenced, vec!["ansible_os_family", "app_enabled"]);
    }

    #[test]
    fn test_is_defined_test() {
        let parsed = JinjaScanner::new()
            .parse_condition("app_port is defined")
            .unwrap();
        assert_eq!(parsed.tests, vec!["defined"]);
        assert_eq!(parsed.referenced, vec!["app_port"]);
    }

    #[test]
    fn test_attribute_and_subscript() {
        let parsed = parse("{{ servers[0].host }}");
        assert_eq!(parsed.referenced, vec!["servers"]);
    }

    #[test]
    fn test_statement_block_rejected() {
        let err = JinjaScanner::new().parse("{% for x in xs %}").unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedConstruct { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_unclosed_delimiter_rejected() {
        let err = JinjaScanner::new().parse("{{ oops").unwrap_err();
        assert!(matches!(err, ExtractionError::TemplateParse { .. }));
    }

    #[test]
    fn test_printed_expression_reparses() {
        let original = parse("{{ (count + 1) | string }}");
        let printed = original.template.to_string();
        let reparsed = JinjaScanner::new().parse(&printed).unwrap();
        assert_eq!(original.template, reparsed.template);
    }

    #[test]
    fn test_string_escape_round_trip() {
        let expr = parse_expression("'it\\'s'").unwrap();
        assert_eq!(expr, TemplateExpr::Literal(ScalarValue::Str("it's".into())));
        let reparsed = parse_expression(&expr.to_string()).unwrap();
        assert_eq!(expr, reparsed);
    }
}
