// src/memory/in_memory.rs — Process-local storage adapter

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use crate::core::types::{Action, Event, PatternKey, Workflow};
use crate::infra::errors::FlowError;
use crate::memory::Storage;

#[derive(Default)]
struct Tables {
    events: VecDeque<Event>,
    patterns: HashMap<PatternKey, u64>,
    actions: HashMap<String, Action>,
    workflows: Vec<Workflow>,
}

/// Non-durable [`Storage`] for tests and throwaway sessions.
pub struct MemoryStorage {
    tables: Mutex<Tables>,
    event_capacity: usize,
}

impl MemoryStorage {
    pub fn new(event_capacity: usize) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            event_capacity,
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, FlowError> {
        self.tables
            .lock()
            .map_err(|_| FlowError::Storage("memory storage lock poisoned".into()))
    }
}

impl Storage for MemoryStorage {
    fn append_event(&self, event: &Event) -> Result<(), FlowError> {
        let mut tables = self.tables()?;
        tables.events.push_back(event.clone());
        while tables.events.len() > self.event_capacity {
            tables.events.pop_front();
        }
        Ok(())
    }

    fn read_event_log(&self) -> Result<Vec<Event>, FlowError> {
        Ok(self.tables()?.events.iter().cloned().collect())
    }

    fn get_patterns(&self) -> Result<HashMap<PatternKey, u64>, FlowError> {
        Ok(self.tables()?.patterns.clone())
    }

    fn set_patterns(&self, patterns: &HashMap<PatternKey, u64>) -> Result<(), FlowError> {
        let mut tables = self.tables()?;
        for (key, count) in patterns {
            tables.patterns.insert(key.clone(), *count);
        }
        Ok(())
    }

    fn get_actions(&self) -> Result<HashMap<String, Action>, FlowError> {
        Ok(self.tables()?.actions.clone())
    }

    fn set_action(&self, action: &Action) -> Result<(), FlowError> {
        self.tables()?
            .actions
            .insert(action.id.clone(), action.clone());
        Ok(())
    }

    fn get_workflows(&self) -> Result<Vec<Workflow>, FlowError> {
        Ok(self.tables()?.workflows.clone())
    }

    fn set_workflow(&self, workflow: &Workflow) -> Result<(), FlowError> {
        let mut tables = self.tables()?;
        match tables.workflows.iter_mut().find(|w| w.id == workflow.id) {
            Some(existing) => *existing = workflow.clone(),
            None => tables.workflows.push(workflow.clone()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_is_capped_fifo() {
        let storage = MemoryStorage::new(3);
        for i in 0..5 {
            storage
                .append_event(&Event::new(format!("e{i}"), "GET:/a", i))
                .unwrap();
        }
        let ids: Vec<String> = storage
            .read_event_log()
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["e2", "e3", "e4"]);
    }

    #[test]
    fn test_set_workflow_updates_in_place() {
        let storage = MemoryStorage::new(10);
        let mut a = Workflow::new("a", "Workflow 1", "", vec![], 0);
        let b = Workflow::new("b", "Workflow 2", "", vec![], 0);
        storage.set_workflow(&a).unwrap();
        storage.set_workflow(&b).unwrap();

        a.mark_executed(10);
        storage.set_workflow(&a).unwrap();

        let workflows = storage.get_workflows().unwrap();
        assert_eq!(workflows.len(), 2);
        assert_eq!(workflows[0].id, "a");
        assert_eq!(workflows[0].frequency, 2);
    }
}
