//! Variable-file loading
//!
//! Variable sources (role defaults, vars files, include_vars payloads)
//! arrive as YAML name -> raw value mappings. String values may be
//! templates and are defined lazily; everything else is an injected
//! constant.

use crate::features::evaluation::VarContext;
use crate::features::scoping::domain::ScopeLevel;
use crate::features::template::ports::TemplateParser;
use crate::shared::models::{NodeId, Result, SourceLocation};
use tracing::debug;

/// Define every entry of a YAML mapping at the given precedence level.
///
/// A file that fails to parse or is not a mapping is an upstream problem:
/// recorded as a diagnostic, nothing defined, extraction continues.
pub fn load_variable_file<P: TemplateParser>(
    ctx: &mut VarContext<P>,
    level: ScopeLevel,
    yaml: &str,
    location: Option<SourceLocation>,
) -> Result<Vec<NodeId>> {
    let parsed: serde_yaml::Value = match serde_yaml::from_str(yaml) {
        Ok(value) => value,
        Err(err) => {
            ctx.note_unsupported(&format!("unparseable variable file: {}", err), location);
            return Ok(Vec::new());
        }
    };
    let serde_yaml::Value::Mapping(mapping) = parsed else {
        ctx.note_unsupported("variable file is not a mapping", location);
        return Ok(Vec::new());
    };

    let mut defined = Vec::with_capacity(mapping.len());
    for (key, value) in &mapping {
        let Some(name) = key.as_str() else {
            ctx.note_unsupported("non-string variable name", location.clone());
            continue;
        };
        let node = match value {
            serde_yaml::Value::String(text) => {
                ctx.define_initialised_variable(name, level, text, location.clone())?
            }
            other => ctx.define_injected_variable(name, level, other, location.clone())?,
        };
        defined.push(node);
    }
    debug!(level = level.as_str(), count = defined.len(), "loaded variable file");
    Ok(defined)
}
