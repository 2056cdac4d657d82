// src/workflow/recorder.rs — Explicit start/stop capture of workflows

use crate::core::types::{Action, Workflow};
use crate::infra::errors::FlowError;
use crate::memory::{read_or_default, Storage};

/// Minimum number of actions a recording needs to become a workflow.
pub const MIN_WORKFLOW_ACTIONS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
}

#[derive(Debug)]
pub struct WorkflowRecorder {
    state: RecorderState,
    actions: Vec<Action>,
}

impl Default for WorkflowRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowRecorder {
    pub fn new() -> Self {
        Self {
            state: RecorderState::Idle,
            actions: Vec::new(),
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    /// Number of actions captured so far in the current recording.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Begin a fresh recording. Returns false if one is already running.
    pub fn start(&mut self) -> bool {
        if self.is_recording() {
            return false;
        }
        self.actions.clear();
        self.state = RecorderState::Recording;
        tracing::info!("Workflow recording started");
        true
    }

    /// Append an action. Ignored (returns false) unless recording.
    pub fn add_action(&mut self, action: Action) -> bool {
        if !self.is_recording() {
            return false;
        }
        tracing::debug!("Recorded action {} ({})", action.id, action.description);
        self.actions.push(action);
        true
    }

    /// Finish the recording. With enough actions the workflow is named,
    /// persisted and returned; otherwise the capture is dropped.
    pub fn stop(&mut self, storage: &dyn Storage, now: i64) -> Result<Option<Workflow>, FlowError> {
        if !self.is_recording() {
            return Ok(None);
        }
        self.state = RecorderState::Idle;
        let actions = std::mem::take(&mut self.actions);

        if actions.len() < MIN_WORKFLOW_ACTIONS {
            tracing::info!(
                "Recording discarded: {} action(s), need at least {}",
                actions.len(),
                MIN_WORKFLOW_ACTIONS
            );
            return Ok(None);
        }

        let existing = read_or_default(storage.get_workflows(), "workflows").len();
        let description = match (actions.first(), actions.last()) {
            (Some(first), Some(last)) => format!("{} → {}", first.description, last.description),
            _ => String::new(),
        };
        let workflow = Workflow::new(
            uuid::Uuid::new_v4().to_string(),
            format!("Workflow {}", existing + 1),
            description,
            actions,
            now,
        );
        storage.set_workflow(&workflow)?;

        tracing::info!(
            "Saved {} ({} actions): {}",
            workflow.name,
            workflow.actions().len(),
            workflow.description
        );
        Ok(Some(workflow))
    }
}
