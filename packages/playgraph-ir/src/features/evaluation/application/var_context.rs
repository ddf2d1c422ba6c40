//! Variable definition, resolution and template re-evaluation
//!
//! `VarContext` is the façade control-flow drivers talk to. It owns the
//! graph, the environment stack, the revision counters and the visibility
//! recorder for one extraction unit; nothing here is process-global.
//!
//! The re-evaluation policy on an expression-cache hit:
//! 1. any recorded dependency revision no longer resolvable, recompute fully;
//! 2. else if the expression is impure, reuse the `Expression` node but
//!    synthesize a fresh `IntermediateValue` and `Def` edge;
//! 3. else reuse the cached record verbatim, no new nodes.

use crate::features::evaluation::domain::records::{
    classify_change, Dependency, DependencyChange, TemplateRecord, VariableDefinitionRecord,
    VariableValueRecord,
};
use crate::features::graph::domain::{Edge, Node};
use crate::features::graph::infrastructure::{Graph, GraphDto};
use crate::features::scoping::domain::ScopeLevel;
use crate::features::scoping::infrastructure::{EnvKey, EnvironmentStack, ScopeToken};
use crate::features::template::ports::TemplateParser;
use crate::features::visibility::{VisibilityDto, VisibilityRecorder};
use crate::shared::models::{
    CompositeValue, DefVersion, Diagnostic, DiagnosticKind, ExtractionError, NodeId, Result,
    ScalarValue, SourceLocation, ValueVersion,
};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// One recorded recomputation and its classified cause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecomputationEvent {
    pub name: String,
    pub version: DefVersion,
    pub change: DependencyChange,
}

/// Everything one extraction unit produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionArtifacts {
    pub graph: GraphDto,
    pub visibility: VisibilityDto,
    pub diagnostics: Vec<Diagnostic>,
    pub recomputations: Vec<RecomputationEvent>,
}

/// Scoping and evaluation engine for one extraction unit
pub struct VarContext<P: TemplateParser> {
    graph: Graph,
    stack: EnvironmentStack,
    parser: P,
    /// Next definition revision per name
    definition_versions: FxHashMap<String, DefVersion>,
    /// Next value revision per (name, definition revision)
    value_versions: FxHashMap<(String, DefVersion), ValueVersion>,
    next_intermediate: u64,
    visibility: VisibilityRecorder,
    diagnostics: Vec<Diagnostic>,
    recomputations: Vec<RecomputationEvent>,
    /// Names currently being resolved; the recursion guard
    in_flight: Vec<String>,
}

impl<P: TemplateParser> VarContext<P> {
    pub fn new(parser: P) -> Self {
        VarContext {
            graph: Graph::new(),
            stack: EnvironmentStack::new(),
            parser,
            definition_versions: FxHashMap::default(),
            value_versions: FxHashMap::default(),
            next_intermediate: 0,
            visibility: VisibilityRecorder::new(),
            diagnostics: Vec::new(),
            recomputations: Vec::new(),
            in_flight: Vec::new(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Scope lifecycle (delegated)
    // ═══════════════════════════════════════════════════════════════════

    pub fn enter_scope(&mut self, level: ScopeLevel) -> Result<ScopeToken> {
        self.stack.enter_scope(level)
    }

    pub fn enter_cached_scope(&mut self, level: ScopeLevel) -> Result<ScopeToken> {
        self.stack.enter_cached_scope(level)
    }

    pub fn exit_scope(&mut self, token: ScopeToken) -> Result<()> {
        self.stack.exit_scope(token)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Defining variables
    // ═══════════════════════════════════════════════════════════════════

    /// Define a variable with a lazily-evaluated initializer template.
    /// The initializer is not touched until the variable is first read.
    pub fn define_initialised_variable(
        &mut self,
        name: &str,
        level: ScopeLevel,
        initializer: &str,
        location: Option<SourceLocation>,
    ) -> Result<NodeId> {
        let (_, record) = self.define(name, level, Some(initializer.to_string()), false, location)?;
        Ok(record.node)
    }

    /// Register a fact or task result: the value node was produced by the
    /// caller (evaluated arguments, or the task node itself for `register`)
    /// before this definition exists, so self-references in the arguments
    /// resolve against the previous binding.
    pub fn define_fact(
        &mut self,
        name: &str,
        value_node: NodeId,
        location: Option<SourceLocation>,
    ) -> Result<NodeId> {
        let (key, record) = self.define(name, ScopeLevel::SetFactsRegistered, None, true, location)?;
        self.graph.add_edge(value_node, record.node, Edge::Def)?;
        self.stack.set_constant_value_at(
            key,
            name,
            VariableValueRecord::constant(record.version, record.node),
        );
        Ok(record.node)
    }

    /// Define a variable with a concrete value injected from outside the
    /// playbook sources (inventory, command line, loaded files).
    pub fn define_injected_variable(
        &mut self,
        name: &str,
        level: ScopeLevel,
        value: &serde_yaml::Value,
        location: Option<SourceLocation>,
    ) -> Result<NodeId> {
        let literal = self.literal_node(value)?;
        let (key, record) = self.define(name, level, None, true, location)?;
        self.graph.add_edge(literal, record.node, Edge::Def)?;
        self.stack.set_constant_value_at(
            key,
            name,
            VariableValueRecord::constant(record.version, record.node),
        );
        Ok(record.node)
    }

    /// Bind a loop variable to the loop's item source. Requires an active
    /// loop-variable scope.
    pub fn define_loop_item(&mut self, name: &str, source: NodeId) -> Result<NodeId> {
        let (key, record) = self.define(name, ScopeLevel::LoopVars, None, true, None)?;
        self.graph.add_edge(source, record.node, Edge::DefLoopItem)?;
        self.stack.set_constant_value_at(
            key,
            name,
            VariableValueRecord::constant(record.version, record.node),
        );
        Ok(record.node)
    }

    fn define(
        &mut self,
        name: &str,
        level: ScopeLevel,
        initializer: Option<String>,
        eager: bool,
        location: Option<SourceLocation>,
    ) -> Result<(EnvKey, VariableDefinitionRecord)> {
        let key = self.stack.env_key_for_level(level)?;
        // Snapshot before inserting: a definition never sees itself, and a
        // sibling redefinition at the same level sees its predecessor.
        let snapshot = self.stack.visible_bindings();
        let version = self.next_definition_version(name);
        let node = self.graph.add_node_at(
            Node::Variable {
                name: name.to_string(),
                version,
                value_version: 0,
                precedence: level.precedence(),
            },
            location,
        );
        let record = VariableDefinitionRecord {
            name: name.to_string(),
            version,
            initializer,
            eager,
            level,
            node,
        };
        self.visibility.record(name, version, snapshot);
        self.stack.set_definition_at(key, record.clone());
        debug!(name, version, level = level.as_str(), "defined variable");
        Ok((key, record))
    }

    fn next_definition_version(&mut self, name: &str) -> DefVersion {
        let counter = self.definition_versions.entry(name.to_string()).or_insert(0);
        let version = *counter;
        *counter += 1;
        version
    }

    fn next_value_version(&mut self, name: &str, version: DefVersion) -> ValueVersion {
        let counter = self
            .value_versions
            .entry((name.to_string(), version))
            .or_insert(0);
        let value_version = *counter;
        *counter += 1;
        value_version
    }

    // ═══════════════════════════════════════════════════════════════════
    // Template evaluation
    // ═══════════════════════════════════════════════════════════════════

    /// Evaluate a `{{ }}` template and return the data node carrying its
    /// result.
    pub fn evaluate_template(&mut self, text: &str) -> Result<NodeId> {
        self.evaluate_record(text, false).map(|r| r.data_node)
    }

    /// Evaluate a bare condition expression (`when:` style, no braces)
    pub fn evaluate_condition(&mut self, text: &str) -> Result<NodeId> {
        self.evaluate_record(text, true).map(|r| r.data_node)
    }

    fn evaluate_record(&mut self, text: &str, condition: bool) -> Result<TemplateRecord> {
        let parse_result = if condition {
            self.parser.parse_condition(text)
        } else {
            self.parser.parse(text)
        };
        let parsed = match parse_result {
            Ok(parsed) => parsed,
            Err(ExtractionError::TemplateParse { message }) => {
                return self.literal_fallback(text, DiagnosticKind::MalformedTemplate, message)
            }
            Err(ExtractionError::UnsupportedConstruct { construct }) => {
                return self.literal_fallback(
                    text,
                    DiagnosticKind::UnsupportedConstruct,
                    format!("unsupported construct: {}", construct),
                )
            }
            Err(other) => return Err(other),
        };

        if parsed.is_literal {
            if let Some(cached) = self.stack.find_expression(text) {
                return Ok(cached);
            }
            let node = self
                .graph
                .add_node(Node::ScalarLiteral(ScalarValue::Str(text.to_string())));
            let record = TemplateRecord {
                data_node: node,
                expr_node: None,
                dependencies: vec![],
                is_literal: true,
                may_be_impure: false,
            };
            self.stack.set_expression(text, record.clone())?;
            return Ok(record);
        }

        // Resolve every referenced name first; this may recursively
        // evaluate initializers and is what the recursion guard protects.
        let mut dependencies = Vec::with_capacity(parsed.referenced.len());
        let mut dep_nodes = Vec::with_capacity(parsed.referenced.len());
        for name in &parsed.referenced {
            let (dep, node) = self.resolve_variable(name)?;
            dependencies.push(dep);
            dep_nodes.push(node);
        }
        let impure_components = parsed.impure_components();
        let impure = !impure_components.is_empty();

        if let Some(cached) = self.stack.find_expression(text) {
            if cached.dependencies == dependencies {
                if !impure {
                    trace!(text, "expression cache hit");
                    return Ok(cached);
                }
                if let Some(expr_node) = cached.expr_node {
                    // Same inputs, fresh occurrence of a non-deterministic
                    // expression
                    let value = self.fresh_intermediate();
                    self.graph.add_edge(expr_node, value, Edge::Def)?;
                    let record = TemplateRecord {
                        data_node: value,
                        expr_node: Some(expr_node),
                        dependencies,
                        is_literal: false,
                        may_be_impure: true,
                    };
                    self.stack.set_expression(text, record.clone())?;
                    return Ok(record);
                }
            }
        }

        let expr_node = self.graph.add_node(Node::Expression {
            expr: text.to_string(),
            impure_components,
        });
        for node in dep_nodes {
            self.graph.add_edge(node, expr_node, Edge::Use)?;
        }
        let value = self.fresh_intermediate();
        self.graph.add_edge(expr_node, value, Edge::Def)?;
        let record = TemplateRecord {
            data_node: value,
            expr_node: Some(expr_node),
            dependencies,
            is_literal: false,
            may_be_impure: impure,
        };
        self.stack.set_expression(text, record.clone())?;
        Ok(record)
    }

    /// Resolve a name to its current value, lazily evaluating the
    /// initializer when no value exists yet or the existing one went stale.
    /// Values computed from impure expressions are never reused: every
    /// reference is a fresh occurrence with a bumped value revision.
    fn resolve_variable(&mut self, name: &str) -> Result<(Dependency, NodeId)> {
        if self.in_flight.iter().any(|n| n == name) {
            return Err(ExtractionError::RecursiveDefinition {
                name: name.to_string(),
            });
        }

        let (key, def) = match self.stack.find_definition(name) {
            Some(found) => found,
            None => {
                let record = self.define_undefined(name)?;
                let key = self.stack.env_key_for_level(ScopeLevel::Undefined)?;
                (key, record)
            }
        };

        if let Some((_, value)) = self.stack.find_value(name, def.version) {
            let reusable = match value.template() {
                Some(t) => {
                    !t.may_be_impure
                        && t.dependencies
                            .iter()
                            .all(|dep| self.stack.resolvable_exact(dep))
                }
                None => true,
            };
            if reusable {
                return Ok((
                    Dependency::new(name, def.version, value.value_version()),
                    value.node(),
                ));
            }
        }

        let Some(initializer) = def.initializer.clone() else {
            // Eager definition whose constant record was never stored by
            // the caller: fall back to the binding's own node.
            let record = VariableValueRecord::constant(def.version, def.node);
            self.stack.set_constant_value_at(key, name, record);
            return Ok((Dependency::new(name, def.version, 0), def.node));
        };

        self.in_flight.push(name.to_string());
        let evaluated = self.evaluate_record(&initializer, false);
        self.in_flight.pop();
        self.store_value(name, &def, evaluated?)
    }

    fn store_value(
        &mut self,
        name: &str,
        def: &VariableDefinitionRecord,
        template: TemplateRecord,
    ) -> Result<(Dependency, NodeId)> {
        let previous = self.stack.find_value(name, def.version).map(|(_, v)| v);
        let value_version = self.next_value_version(name, def.version);
        let var_node = if value_version == 0 {
            def.node
        } else {
            // Nodes are immutable: a recomputed value is a fresh Variable
            // node with the same definition revision
            self.graph.add_node(Node::Variable {
                name: name.to_string(),
                version: def.version,
                value_version,
                precedence: def.level.precedence(),
            })
        };
        self.graph.add_edge(template.data_node, var_node, Edge::Def)?;

        if let Some(previous) = previous {
            if let Some(old_template) = previous.template() {
                if let Some(change) = classify_change(old_template, &template) {
                    debug!(name, version = def.version, ?change, "value recomputed");
                    self.recomputations.push(RecomputationEvent {
                        name: name.to_string(),
                        version: def.version,
                        change,
                    });
                }
            }
        }

        let dep = Dependency::new(name, def.version, value_version);
        let value = VariableValueRecord::changeable(def.version, template, value_version, var_node);
        self.stack.set_dynamic_variable_value(name, value)?;
        Ok((dep, var_node))
    }

    /// References to names with no definition anywhere bind at the
    /// lowest-precedence placeholder level, losing to any later real
    /// definition.
    fn define_undefined(&mut self, name: &str) -> Result<VariableDefinitionRecord> {
        warn!(name, "reference to undefined variable");
        let (key, record) = self.define(name, ScopeLevel::Undefined, None, true, None)?;
        self.stack.set_constant_value_at(
            key,
            name,
            VariableValueRecord::constant(record.version, record.node),
        );
        Ok(record)
    }

    fn literal_fallback(
        &mut self,
        text: &str,
        kind: DiagnosticKind,
        message: String,
    ) -> Result<TemplateRecord> {
        warn!(text, message = %message, "template not evaluated, literal fallback");
        self.diagnostics.push(Diagnostic::new(kind, message));
        if let Some(cached) = self.stack.find_expression(text) {
            return Ok(cached);
        }
        let node = self.graph.add_node(Node::Expression {
            expr: text.to_string(),
            impure_components: vec![],
        });
        let record = TemplateRecord {
            data_node: node,
            expr_node: Some(node),
            dependencies: vec![],
            is_literal: true,
            may_be_impure: false,
        };
        self.stack.set_expression(text, record.clone())?;
        Ok(record)
    }

    fn fresh_intermediate(&mut self) -> NodeId {
        let identifier = self.next_intermediate;
        self.next_intermediate += 1;
        self.graph.add_node(Node::IntermediateValue { identifier })
    }

    fn literal_node(&mut self, value: &serde_yaml::Value) -> Result<NodeId> {
        if let Some(scalar) = ScalarValue::from_yaml(value) {
            return Ok(self.graph.add_node(Node::ScalarLiteral(scalar)));
        }
        let json = serde_json::to_value(value)
            .map_err(|e| ExtractionError::Internal(format!("yaml to json: {}", e)))?;
        let composite = match json {
            serde_json::Value::Array(items) => CompositeValue::Seq(items),
            serde_json::Value::Object(entries) => CompositeValue::Map(entries),
            other => {
                return Err(ExtractionError::Internal(format!(
                    "unexpected composite shape: {}",
                    other
                )))
            }
        };
        Ok(self.graph.add_node(Node::CompositeLiteral(composite)))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Diagnostics and access
    // ═══════════════════════════════════════════════════════════════════

    /// Record a keyword or construct the extractor does not model
    pub fn note_unsupported(&mut self, construct: &str, location: Option<SourceLocation>) {
        let mut diagnostic = Diagnostic::new(
            DiagnosticKind::UnsupportedConstruct,
            format!("unsupported construct: {}", construct),
        );
        if let Some(location) = location {
            diagnostic = diagnostic.at(location);
        }
        self.diagnostics.push(diagnostic);
    }

    /// Record an include target that could not be loaded
    pub fn note_missing_include(&mut self, path: &str, location: Option<SourceLocation>) {
        let mut diagnostic = Diagnostic::new(
            DiagnosticKind::MissingInclude,
            format!("missing include: {}", path),
        );
        if let Some(location) = location {
            diagnostic = diagnostic.at(location);
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Direct graph access for control-flow drivers (task, loop and
    /// conditional nodes, order edges)
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn stack(&self) -> &EnvironmentStack {
        &self.stack
    }

    pub fn visibility(&self) -> &VisibilityRecorder {
        &self.visibility
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn recomputations(&self) -> &[RecomputationEvent] {
        &self.recomputations
    }

    pub fn finish(self) -> ExtractionArtifacts {
        ExtractionArtifacts {
            graph: self.graph.to_dto(),
            visibility: self.visibility.to_dto(),
            diagnostics: self.diagnostics,
            recomputations: self.recomputations,
        }
    }
}
