//! Visibility side channel
//!
//! For every variable definition, a snapshot of the (name, definition
//! revision) pairs resolvable at the moment the definition was created.
//! Consumed downstream to detect shadowing between units analyzed
//! independently.

use crate::shared::models::{DefVersion, ExtractionError, Result};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// One recorded snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityEntry {
    pub name: String,
    pub version: DefVersion,
    /// Bindings resolvable when (name, version) was defined
    pub visible: Vec<(String, DefVersion)>,
}

/// Records one snapshot per definition, keyed by (name, version)
#[derive(Debug, Default)]
pub struct VisibilityRecorder {
    records: AHashMap<(String, DefVersion), Vec<(String, DefVersion)>>,
}

impl VisibilityRecorder {
    pub fn new() -> Self {
        VisibilityRecorder::default()
    }

    /// Store the snapshot for a freshly created definition. The caller
    /// captures the snapshot before inserting the definition, so a
    /// definition never sees itself.
    pub fn record(&mut self, name: &str, version: DefVersion, visible: Vec<(String, DefVersion)>) {
        self.records.insert((name.to_string(), version), visible);
    }

    /// Snapshot for (name, version). Asking for an unrecorded definition is
    /// a core bug, not a property of the sources.
    pub fn get(&self, name: &str, version: DefVersion) -> Result<&[(String, DefVersion)]> {
        self.records
            .get(&(name.to_string(), version))
            .map(Vec::as_slice)
            .ok_or_else(|| ExtractionError::VisibilityMissing {
                name: name.to_string(),
                version,
            })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Flat, order-independent serialization: entries sorted by
    /// (name, version), each snapshot sorted the same way.
    pub fn to_dto(&self) -> VisibilityDto {
        let mut entries: Vec<VisibilityEntry> = self
            .records
            .iter()
            .map(|((name, version), visible)| {
                let mut visible = visible.clone();
                visible.sort();
                VisibilityEntry {
                    name: name.clone(),
                    version: *version,
                    visible,
                }
            })
            .collect();
        entries.sort_by(|a, b| (&a.name, a.version).cmp(&(&b.name, b.version)));
        VisibilityDto { entries }
    }
}

/// Serializable visibility record for one extraction unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityDto {
    pub entries: Vec<VisibilityEntry>,
}
