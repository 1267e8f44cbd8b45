//! Record stores for routing rules, scenarios and saved sandbox runs.
//!
//! [`RecordStore`] is the seam where a real persistence backend plugs in.
//! [`RuleStore`] and [`ScenarioStore`] validate before every write.

pub mod memory;
pub mod record;
pub mod rules;
pub mod scenarios;

pub use memory::MemoryStore;
pub use record::{Entity, RecordStore};
pub use rules::{normalize_rule, validate_rule, RuleStore};
pub use scenarios::ScenarioStore;

#[cfg(test)]
mod tests;
