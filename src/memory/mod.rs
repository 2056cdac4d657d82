// src/memory/mod.rs — Persistence contract and adapters

pub mod in_memory;
pub mod schema;
pub mod store;

use std::collections::HashMap;

use crate::core::types::{Action, Event, PatternKey, Workflow};
use crate::infra::errors::FlowError;

pub use in_memory::MemoryStorage;
pub use store::SqliteStorage;

/// Durable tables the kernel reads and writes, scoped to one namespace.
///
/// Adapters own capacity enforcement for the event log: `append_event`
/// evicts the oldest entries once the configured cap is exceeded.
pub trait Storage: Send + Sync {
    fn append_event(&self, event: &Event) -> Result<(), FlowError>;
    /// The capped log, oldest first.
    fn read_event_log(&self) -> Result<Vec<Event>, FlowError>;

    fn get_patterns(&self) -> Result<HashMap<PatternKey, u64>, FlowError>;
    fn set_patterns(&self, patterns: &HashMap<PatternKey, u64>) -> Result<(), FlowError>;

    fn get_actions(&self) -> Result<HashMap<String, Action>, FlowError>;
    fn set_action(&self, action: &Action) -> Result<(), FlowError>;

    /// All workflows in creation order.
    fn get_workflows(&self) -> Result<Vec<Workflow>, FlowError>;
    /// Insert a new workflow or update an existing one in place (keeping
    /// its position in creation order).
    fn set_workflow(&self, workflow: &Workflow) -> Result<(), FlowError>;
}

/// Reads never fail into the kernel: a broken store looks empty.
pub fn read_or_default<T: Default>(result: Result<T, FlowError>, what: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Reading {} failed, treating as empty: {}", what, e);
            T::default()
        }
    }
}
