//! Agent domain types: raw source records, enriched agents, tab config and
//! naming rules.

pub mod agent;
pub mod naming;
pub mod tabs;
pub mod types;

pub use agent::*;
pub use naming::*;
pub use tabs::*;
pub use types::*;
