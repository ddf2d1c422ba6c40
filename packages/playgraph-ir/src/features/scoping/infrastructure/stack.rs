//! Environment stack: precedence resolution and value hoisting
//!
//! Holds the fixed global environments plus a strict-LIFO stack of local
//! environments. All lookups are first-match-wins over the active
//! precedence chain (descending precedence, recency breaking ties), which
//! is the defining property of "most specific binding wins".

use crate::features::evaluation::domain::records::{
    Dependency, TemplateRecord, VariableDefinitionRecord, VariableValueRecord,
};
use crate::features::scoping::domain::environment::Environment;
use crate::features::scoping::domain::level::ScopeLevel;
use crate::shared::models::{DefVersion, ExtractionError, Result};
use rustc_hash::FxHashSet;
use tracing::debug;

/// Proof of scope entry; must be handed back to [`EnvironmentStack::exit_scope`].
///
/// Deliberately not `Copy`: a token is spent on exit.
#[derive(Debug, PartialEq, Eq)]
pub struct ScopeToken(u64);

/// Handle to one active environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvKey {
    Global(usize),
    Frame(usize),
}

#[derive(Debug)]
struct Frame {
    token: u64,
    level: ScopeLevel,
    env: Environment,
    /// Entered via `enter_cached_scope`. Cross-entry value reuse is
    /// deliberately disabled (the approximation is known to be inaccurate),
    /// so cached frames currently behave like plain frames.
    cached: bool,
}

/// Ordered collection of environments for one extraction
#[derive(Debug)]
pub struct EnvironmentStack {
    globals: Vec<(ScopeLevel, Environment)>,
    frames: Vec<Frame>,
    next_token: u64,
}

impl Default for EnvironmentStack {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentStack {
    pub fn new() -> Self {
        EnvironmentStack {
            globals: ScopeLevel::globals()
                .map(|level| (level, Environment::new()))
                .collect(),
            frames: Vec::new(),
            next_token: 0,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Scope lifecycle
    // ═══════════════════════════════════════════════════════════════════

    pub fn enter_scope(&mut self, level: ScopeLevel) -> Result<ScopeToken> {
        self.push_frame(level, false)
    }

    /// Enter a scope that could in principle reuse values from a previous
    /// entry at the same site. Reuse is disabled; see [`Frame::cached`].
    pub fn enter_cached_scope(&mut self, level: ScopeLevel) -> Result<ScopeToken> {
        self.push_frame(level, true)
    }

    fn push_frame(&mut self, level: ScopeLevel, cached: bool) -> Result<ScopeToken> {
        if level.is_global() {
            return Err(ExtractionError::ScopeDiscipline(format!(
                "cannot push global level {}",
                level.as_str()
            )));
        }
        let token = self.next_token;
        self.next_token += 1;
        self.frames.push(Frame {
            token,
            level,
            env: Environment::new(),
            cached,
        });
        debug!(level = level.as_str(), cached, depth = self.frames.len(), "enter scope");
        Ok(ScopeToken(token))
    }

    /// Pop one local environment. Anything stored only in it becomes
    /// unresolvable immediately; nothing else needs to change.
    ///
    /// Popping anything but the top is a scope-discipline violation: the
    /// caller's push/pop order must mirror the nesting it walks.
    pub fn exit_scope(&mut self, token: ScopeToken) -> Result<()> {
        match self.frames.last() {
            Some(frame) if frame.token == token.0 => {
                if let Some(frame) = self.frames.pop() {
                    debug!(
                        level = frame.level.as_str(),
                        cached = frame.cached,
                        depth = self.frames.len(),
                        "exit scope"
                    );
                }
                Ok(())
            }
            Some(_) => Err(ExtractionError::ScopeDiscipline(
                "exit_scope token does not match the top frame".into(),
            )),
            None => Err(ExtractionError::ScopeDiscipline(
                "exit_scope on an empty stack".into(),
            )),
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Precedence chain
    // ═══════════════════════════════════════════════════════════════════

    /// Active environments, most specific first: descending precedence,
    /// stack recency breaking ties between equal-precedence frames.
    pub fn chain(&self) -> Vec<EnvKey> {
        let mut entries: Vec<(u8, u64, EnvKey)> = Vec::with_capacity(self.globals.len() + self.frames.len());
        for (i, (level, _)) in self.globals.iter().enumerate() {
            entries.push((level.precedence(), 0, EnvKey::Global(i)));
        }
        for (i, frame) in self.frames.iter().enumerate() {
            entries.push((frame.level.precedence(), frame.token + 1, EnvKey::Frame(i)));
        }
        entries.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
        entries.into_iter().map(|(_, _, key)| key).collect()
    }

    pub fn env(&self, key: EnvKey) -> &Environment {
        match key {
            EnvKey::Global(i) => &self.globals[i].1,
            EnvKey::Frame(i) => &self.frames[i].env,
        }
    }

    fn env_mut(&mut self, key: EnvKey) -> &mut Environment {
        match key {
            EnvKey::Global(i) => &mut self.globals[i].1,
            EnvKey::Frame(i) => &mut self.frames[i].env,
        }
    }

    pub fn level_of(&self, key: EnvKey) -> ScopeLevel {
        match key {
            EnvKey::Global(i) => self.globals[i].0,
            EnvKey::Frame(i) => self.frames[i].level,
        }
    }

    /// The environment a new definition at `level` belongs in: the global
    /// environment for global levels, the topmost frame of that level
    /// otherwise.
    pub fn env_key_for_level(&self, level: ScopeLevel) -> Result<EnvKey> {
        if level.is_global() {
            let i = self
                .globals
                .iter()
                .position(|(l, _)| *l == level)
                .ok_or_else(|| ExtractionError::Internal(format!("missing global env {}", level.as_str())))?;
            return Ok(EnvKey::Global(i));
        }
        self.frames
            .iter()
            .rposition(|frame| frame.level == level)
            .map(EnvKey::Frame)
            .ok_or_else(|| {
                ExtractionError::ScopeDiscipline(format!(
                    "no active {} scope to define into",
                    level.as_str()
                ))
            })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Resolution (first-match-wins)
    // ═══════════════════════════════════════════════════════════════════

    /// Most specific active definition of `name`
    pub fn find_definition(&self, name: &str) -> Option<(EnvKey, VariableDefinitionRecord)> {
        for key in self.chain() {
            if let Some(record) = self.env(key).definition(name) {
                return Some((key, record.clone()));
            }
        }
        None
    }

    /// Current value of the definition (name, version), skipping stale
    /// value records left behind by other revisions of the same name.
    pub fn find_value(&self, name: &str, version: DefVersion) -> Option<(EnvKey, VariableValueRecord)> {
        for key in self.chain() {
            if let Some(record) = self.env(key).value(name) {
                if record.definition_version == version {
                    return Some((key, record.clone()));
                }
            }
        }
        None
    }

    /// Cached evaluation of `text`, if any environment on the chain has one
    pub fn find_expression(&self, text: &str) -> Option<TemplateRecord> {
        for key in self.chain() {
            if let Some(record) = self.env(key).expression(text) {
                return Some(record.clone());
            }
        }
        None
    }

    /// Is (name, version, value_version) still resolvable exactly as
    /// recorded? False once the definition is shadowed, its owning scope
    /// exited, or its value recomputed.
    pub fn resolvable_exact(&self, dep: &Dependency) -> bool {
        let Some((_, def)) = self.find_definition(&dep.name) else {
            return false;
        };
        if def.version != dep.version {
            return false;
        }
        match self.find_value(&dep.name, dep.version) {
            Some((_, value)) => value.value_version() == dep.value_version,
            None => false,
        }
    }

    /// All (name, definition revision) pairs resolvable right now
    pub fn visible_bindings(&self) -> Vec<(String, DefVersion)> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut out = Vec::new();
        for key in self.chain() {
            for def in self.env(key).definitions() {
                if seen.insert(def.name.as_str()) {
                    out.push((def.name.clone(), def.version));
                }
            }
        }
        out
    }

    // ═══════════════════════════════════════════════════════════════════
    // Insertion and hoisting
    // ═══════════════════════════════════════════════════════════════════

    pub fn set_definition_at(&mut self, key: EnvKey, record: VariableDefinitionRecord) {
        self.env_mut(key).set_definition(record);
    }

    /// Store a constant value next to its definition (no hoisting needed:
    /// constants have no dependencies).
    pub fn set_constant_value_at(&mut self, key: EnvKey, name: &str, record: VariableValueRecord) {
        self.env_mut(key).set_value(name, record);
    }

    /// Hoist a newly computed value: store it in the broadest active
    /// environment where every variable it transitively depends on is
    /// still resolvable with the exact revisions used, bounded by the
    /// environment owning the variable's definition.
    ///
    /// Too narrow wastes recomputation when a wider scope re-references
    /// the value unchanged; too broad risks stale reuse after a dependency
    /// is shadowed.
    pub fn set_dynamic_variable_value(
        &mut self,
        name: &str,
        record: VariableValueRecord,
    ) -> Result<()> {
        let chain = self.chain();
        let floor = chain
            .iter()
            .position(|&key| {
                self.env(key)
                    .definition(name)
                    .map_or(false, |d| d.version == record.definition_version)
            })
            .ok_or_else(|| {
                ExtractionError::Internal(format!(
                    "no active definition for '{}' v{}",
                    name, record.definition_version
                ))
            })?;

        let mut target = floor;
        if let Some(template) = record.template() {
            if let Some(bound) = self.constraint_index(&chain, &template.dependencies) {
                target = target.min(bound);
            }
        }
        debug!(
            name,
            level = self.level_of(chain[target]).as_str(),
            "hoisted variable value"
        );
        self.env_mut(chain[target]).set_value(name, record);
        Ok(())
    }

    /// Place a cached expression evaluation with the same algorithm,
    /// specialized: no definition floor, dependency-free expressions go to
    /// the broadest environment.
    pub fn set_expression(&mut self, text: &str, record: TemplateRecord) -> Result<()> {
        let chain = self.chain();
        let target = self
            .constraint_index(&chain, &record.dependencies)
            .unwrap_or(chain.len() - 1);
        self.env_mut(chain[target]).set_expression(text, record);
        Ok(())
    }

    /// Narrowest chain position bounding the lifetime of any transitive
    /// dependency; `None` when there are no dependencies. Position 0 is
    /// the most specific environment.
    fn constraint_index(&self, chain: &[EnvKey], deps: &[Dependency]) -> Option<usize> {
        let mut bound: Option<usize> = None;
        let mut worklist: Vec<Dependency> = deps.to_vec();
        let mut visited: FxHashSet<(String, DefVersion, u32)> = FxHashSet::default();

        while let Some(dep) = worklist.pop() {
            if !visited.insert((dep.name.clone(), dep.version, dep.value_version)) {
                continue;
            }
            let def_pos = chain.iter().position(|&key| {
                self.env(key)
                    .definition(&dep.name)
                    .map_or(false, |d| d.version == dep.version)
            });
            let val_pos = chain.iter().position(|&key| {
                self.env(key)
                    .value(&dep.name)
                    .map_or(false, |v| v.definition_version == dep.version)
            });
            for pos in [def_pos, val_pos].into_iter().flatten() {
                bound = Some(bound.map_or(pos, |b| b.min(pos)));
            }
            if let Some((_, value)) = self.find_value(&dep.name, dep.version) {
                if let Some(template) = value.template() {
                    worklist.extend(template.dependencies.iter().cloned());
                }
            }
        }
        bound
    }
}
