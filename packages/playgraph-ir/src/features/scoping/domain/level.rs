//! Variable precedence levels
//!
//! Fixed, totally ordered enumeration mirroring the host automation
//! system's precedence table, lowest to highest. Levels are partitioned
//! into *global* (one environment for the whole extraction) and
//! *stackable* (pushed/popped as the control-flow walk enters and exits
//! blocks, tasks, includes and plays). Nested inclusion may shadow and
//! restore stackable levels but not global ones; the partition below is
//! what makes precedence resolution come out right.

use serde::{Deserialize, Serialize};

/// Precedence level of a variable source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScopeLevel {
    /// Placeholder level for references to names never defined anywhere;
    /// loses to every real definition
    Undefined,
    CommandLineValues,
    RoleDefaults,
    InventoryFileGroupVars,
    GroupVarsAll,
    GroupVars,
    InventoryFileHostVars,
    HostVars,
    HostFacts,
    PlayVars,
    PlayVarsPrompt,
    PlayVarsFiles,
    RoleVars,
    BlockVars,
    TaskVars,
    IncludeVars,
    SetFactsRegistered,
    RoleParams,
    IncludeParams,
    /// `loop_var` bindings. Carries the same numeric precedence as include
    /// parameters; kept as its own table entry rather than a hardcoded
    /// special case (the upstream semantics here are a known heuristic).
    LoopVars,
    ExtraVars,
}

struct LevelInfo {
    precedence: u8,
    global: bool,
    name: &'static str,
}

impl ScopeLevel {
    /// All levels, lowest precedence first
    pub const ALL: [ScopeLevel; 21] = [
        ScopeLevel::Undefined,
        ScopeLevel::CommandLineValues,
        ScopeLevel::RoleDefaults,
        ScopeLevel::InventoryFileGroupVars,
        ScopeLevel::GroupVarsAll,
        ScopeLevel::GroupVars,
        ScopeLevel::InventoryFileHostVars,
        ScopeLevel::HostVars,
        ScopeLevel::HostFacts,
        ScopeLevel::PlayVars,
        ScopeLevel::PlayVarsPrompt,
        ScopeLevel::PlayVarsFiles,
        ScopeLevel::RoleVars,
        ScopeLevel::BlockVars,
        ScopeLevel::TaskVars,
        ScopeLevel::IncludeVars,
        ScopeLevel::SetFactsRegistered,
        ScopeLevel::RoleParams,
        ScopeLevel::IncludeParams,
        ScopeLevel::LoopVars,
        ScopeLevel::ExtraVars,
    ];

    fn info(&self) -> LevelInfo {
        match self {
            ScopeLevel::Undefined => LevelInfo {
                precedence: 0,
                global: true,
                name: "undefined",
            },
            ScopeLevel::CommandLineValues => LevelInfo {
                precedence: 1,
                global: true,
                name: "command_line_values",
            },
            ScopeLevel::RoleDefaults => LevelInfo {
                precedence: 2,
                global: true,
                name: "role_defaults",
            },
            ScopeLevel::InventoryFileGroupVars => LevelInfo {
                precedence: 3,
                global: true,
                name: "inventory_file_group_vars",
            },
            ScopeLevel::GroupVarsAll => LevelInfo {
                precedence: 4,
                global: true,
                name: "group_vars_all",
            },
            ScopeLevel::GroupVars => LevelInfo {
                precedence: 5,
                global: true,
                name: "group_vars",
            },
            ScopeLevel::InventoryFileHostVars => LevelInfo {
                precedence: 6,
                global: true,
                name: "inventory_file_host_vars",
            },
            ScopeLevel::HostVars => LevelInfo {
                precedence: 7,
                global: true,
                name: "host_vars",
            },
            ScopeLevel::HostFacts => LevelInfo {
                precedence: 8,
                global: true,
                name: "host_facts",
            },
            ScopeLevel::PlayVars => LevelInfo {
                precedence: 9,
                global: false,
                name: "play_vars",
            },
            ScopeLevel::PlayVarsPrompt => LevelInfo {
                precedence: 10,
                global: false,
                name: "play_vars_prompt",
            },
            ScopeLevel::PlayVarsFiles => LevelInfo {
                precedence: 11,
                global: false,
                name: "play_vars_files",
            },
            ScopeLevel::RoleVars => LevelInfo {
                precedence: 12,
                global: false,
                name: "role_vars",
            },
            ScopeLevel::BlockVars => LevelInfo {
                precedence: 13,
                global: false,
                name: "block_vars",
            },
            ScopeLevel::TaskVars => LevelInfo {
                precedence: 14,
                global: false,
                name: "task_vars",
            },
            ScopeLevel::IncludeVars => LevelInfo {
                precedence: 15,
                global: true,
                name: "include_vars",
            },
            ScopeLevel::SetFactsRegistered => LevelInfo {
                precedence: 16,
                global: true,
                name: "set_facts_registered",
            },
            ScopeLevel::RoleParams => LevelInfo {
                precedence: 17,
                global: false,
                name: "role_params",
            },
            ScopeLevel::IncludeParams => LevelInfo {
                precedence: 18,
                global: false,
                name: "include_params",
            },
            ScopeLevel::LoopVars => LevelInfo {
                precedence: 18,
                global: false,
                name: "loop_vars",
            },
            ScopeLevel::ExtraVars => LevelInfo {
                precedence: 19,
                global: true,
                name: "extra_vars",
            },
        }
    }

    /// Numeric precedence; higher wins
    pub fn precedence(&self) -> u8 {
        self.info().precedence
    }

    /// Global levels exist once for the whole extraction
    pub fn is_global(&self) -> bool {
        self.info().global
    }

    /// Stackable levels are pushed/popped by the control-flow walk
    pub fn is_stackable(&self) -> bool {
        !self.is_global()
    }

    pub fn as_str(&self) -> &'static str {
        self.info().name
    }

    pub fn globals() -> impl Iterator<Item = ScopeLevel> {
        Self::ALL.iter().copied().filter(ScopeLevel::is_global)
    }
}
