//! Agent directory reconciliation.
//!
//! Merges deployment records, style config and team topology into one
//! enriched directory, resolves free-form identifiers and `@[...]` mentions
//! against it, and keeps tab configuration consistent with it.

pub mod config;
pub mod consistency;
pub mod enrich;
pub mod error;
pub mod mention;
pub mod model;
pub mod resolve;
pub mod roster;
pub mod sources;
pub mod suggest;

pub use error::{SourceError, SourceResult};
pub use roster::{RefreshOutcome, Roster, RosterSources};
