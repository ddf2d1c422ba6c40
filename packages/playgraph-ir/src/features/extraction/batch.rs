//! Batch driver
//!
//! Each extraction unit builds and owns its entire engine (graph, stack,
//! counters), so units share no data and run in parallel without locking.
//! One unit's failure, fatal or not, never affects its siblings.

use crate::features::evaluation::{ExtractionArtifacts, VarContext};
use crate::features::template::JinjaScanner;
use crate::shared::models::{ExtractionError, Result};
use rayon::prelude::*;
use tracing::{debug, warn};

type UnitFn = dyn Fn(&mut VarContext<JinjaScanner>) -> Result<()> + Send + Sync;

/// One independently extractable unit (a role, a playbook)
pub struct ExtractionUnit {
    pub name: String,
    run: Box<UnitFn>,
}

impl ExtractionUnit {
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(&mut VarContext<JinjaScanner>) -> Result<()> + Send + Sync + 'static,
    {
        ExtractionUnit {
            name: name.into(),
            run: Box::new(run),
        }
    }
}

/// Outcome of one unit: its artifacts, or the error that stopped it
pub struct ExtractionReport {
    pub unit: String,
    pub outcome: std::result::Result<ExtractionArtifacts, ExtractionError>,
}

impl ExtractionReport {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Run one unit with a fresh engine
pub fn run_unit(unit: &ExtractionUnit) -> ExtractionReport {
    debug!(unit = %unit.name, "extraction start");
    let mut ctx = VarContext::new(JinjaScanner::new());
    let outcome = match (unit.run)(&mut ctx) {
        Ok(()) => Ok(ctx.finish()),
        Err(err) => {
            warn!(unit = %unit.name, error = %err, fatal = err.is_fatal(), "extraction failed");
            Err(err)
        }
    };
    ExtractionReport {
        unit: unit.name.clone(),
        outcome,
    }
}

/// Run all units in parallel; reports come back in input order
pub fn run_batch(units: &[ExtractionUnit]) -> Vec<ExtractionReport> {
    units.par_iter().map(run_unit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::scoping::domain::ScopeLevel;

    #[test]
    fn test_batch_isolation() {
        let units = vec![
            ExtractionUnit::new("healthy", |ctx| {
                ctx.define_injected_variable(
                    "port",
                    ScopeLevel::RoleDefaults,
                    &serde_yaml::Value::from(8080),
                    None,
                )?;
                ctx.evaluate_template("{{ port }}")?;
                Ok(())
            }),
            ExtractionUnit::new("recursive", |ctx| {
                ctx.define_initialised_variable("a", ScopeLevel::SetFactsRegistered, "{{ a }}", None)?;
                ctx.evaluate_template("{{ a }}")?;
                Ok(())
            }),
            ExtractionUnit::new("also_healthy", |ctx| {
                ctx.evaluate_template("plain")?;
                Ok(())
            }),
        ];

        let reports = run_batch(&units);
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].unit, "healthy");
        assert!(reports[0].is_ok());
        assert!(matches!(
            reports[1].outcome,
            Err(ExtractionError::RecursiveDefinition { .. })
        ));
        assert!(reports[2].is_ok());
    }

    #[test]
    fn test_units_do_not_share_state() {
        let units = vec![
            ExtractionUnit::new("first", |ctx| {
                ctx.define_injected_variable(
                    "x",
                    ScopeLevel::ExtraVars,
                    &serde_yaml::Value::from(1),
                    None,
                )?;
                Ok(())
            }),
            ExtractionUnit::new("second", |ctx| {
                ctx.define_injected_variable(
                    "x",
                    ScopeLevel::ExtraVars,
                    &serde_yaml::Value::from(2),
                    None,
                )?;
                Ok(())
            }),
        ];

        for report in run_batch(&units) {
            let artifacts = report.outcome.unwrap();
            // Each unit has its own revision counter: x is v0 in both
            assert_eq!(artifacts.visibility.entries.len(), 1);
            assert_eq!(artifacts.visibility.entries[0].version, 0);
        }
    }
}
