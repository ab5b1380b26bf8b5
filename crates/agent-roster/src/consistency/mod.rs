//! Cross-checks between the agent directory and tab configuration.
//!
//! `validate` reports dangling references (errors) and softer problems
//! (warnings); `repair` deterministically rewrites a tab configuration so
//! that re-validating it yields no errors.

pub mod repair;
pub mod validate;

pub use repair::repair;
pub use validate::validate;

use serde::Serialize;

use crate::model::TabConfigs;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Repaired configuration plus one line per change applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepairOutcome {
    pub repaired: TabConfigs,
    pub changes: Vec<String>,
}

impl RepairOutcome {
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }
}
