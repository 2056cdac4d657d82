// src/workflow/executor.rs — Sequential, paced workflow replay
//
// One FIFO queue of action ids and at most one drain task. Each step is
// isolated: a missing action, a failing runner or a panicking runner is
// logged and the queue moves on.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;

use crate::core::types::{Action, Workflow};
use crate::infra::clock::Clock;
use crate::infra::errors::FlowError;
use crate::memory::{read_or_default, Storage};
use crate::workflow::runner::ActionRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    Idle,
    Draining,
}

#[derive(Clone)]
pub struct WorkflowExecutor {
    inner: Arc<Inner>,
}

struct Inner {
    storage: Arc<dyn Storage>,
    runner: Arc<dyn ActionRunner>,
    clock: Arc<dyn Clock>,
    step_delay: Duration,
    queue: Mutex<VecDeque<String>>,
    state: watch::Sender<ExecutorState>,
}

impl WorkflowExecutor {
    pub fn new(
        storage: Arc<dyn Storage>,
        runner: Arc<dyn ActionRunner>,
        clock: Arc<dyn Clock>,
        step_delay: Duration,
    ) -> Self {
        let (state, _) = watch::channel(ExecutorState::Idle);
        Self {
            inner: Arc::new(Inner {
                storage,
                runner,
                clock,
                step_delay,
                queue: Mutex::new(VecDeque::new()),
                state,
            }),
        }
    }

    /// Queue every action of the workflow and start draining if idle.
    ///
    /// The workflow's frequency and last-executed time are bumped before any
    /// step runs. Must be called from within a Tokio runtime. Returns false
    /// when the workflow does not exist.
    pub fn execute_workflow(&self, workflow_id: &str) -> bool {
        let workflows = read_or_default(self.inner.storage.get_workflows(), "workflows");
        let Some(mut workflow) = workflows.into_iter().find(|w| w.id == workflow_id) else {
            tracing::warn!("Workflow {} not found", workflow_id);
            return false;
        };

        workflow.mark_executed(self.inner.clock.now_ms());
        if let Err(e) = self.inner.storage.set_workflow(&workflow) {
            tracing::warn!("Failed to update stats for {}: {}", workflow.id, e);
        }
        tracing::info!(
            "Executing {} ({} steps, run #{})",
            workflow.name,
            workflow.actions().len(),
            workflow.frequency
        );

        let mut queue = self.inner.queue();
        queue.extend(workflow.actions().iter().map(|a| a.id.clone()));

        let start = self.inner.state.send_if_modified(|state| {
            if *state == ExecutorState::Idle {
                *state = ExecutorState::Draining;
                true
            } else {
                false
            }
        });
        if start {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(drain(self.inner.clone()));
                }
                Err(e) => {
                    tracing::error!("No async runtime to replay on: {}", e);
                    queue.clear();
                    self.inner.state.send_replace(ExecutorState::Idle);
                }
            }
        }
        true
    }

    /// Drop every queued step. The step in flight, if any, finishes.
    /// Returns how many steps were dropped.
    pub fn cancel(&self) -> usize {
        let mut queue = self.inner.queue();
        let dropped = queue.len();
        queue.clear();
        if dropped > 0 {
            tracing::info!("Cancelled {} pending step(s)", dropped);
        }
        dropped
    }

    pub fn state(&self) -> ExecutorState {
        *self.inner.state.borrow()
    }

    /// Steps queued but not yet started.
    pub fn pending(&self) -> usize {
        self.inner.queue().len()
    }

    /// Resolves once the queue has drained.
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.state.subscribe();
        let _ = rx.wait_for(|state| *state == ExecutorState::Idle).await;
    }
}

impl Inner {
    fn queue(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn find_action(&self, action_id: &str) -> Option<Action> {
        let workflows: Vec<Workflow> = read_or_default(self.storage.get_workflows(), "workflows");
        workflows
            .iter()
            .flat_map(|w| w.actions())
            .find(|a| a.id == action_id)
            .cloned()
    }

    async fn run_step(&self, action_id: &str) {
        let Some(action) = self.find_action(action_id) else {
            tracing::warn!("Action {} not found in any workflow, skipping", action_id);
            return;
        };
        let outcome = AssertUnwindSafe(self.runner.run(&action))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(())) => tracing::debug!("Step {} ({}) done", action.id, action.description),
            Ok(Err(e)) => log_step_failure(&action, &e),
            Err(payload) => tracing::error!(
                "Step {} ({}) panicked: {}",
                action.id,
                action.description,
                panic_message(payload.as_ref())
            ),
        }
    }
}

fn log_step_failure(action: &Action, e: &FlowError) {
    if e.is_malformed_input() {
        tracing::warn!("Step {} ({}) skipped: {}", action.id, action.description, e);
    } else {
        tracing::error!("Step {} ({}) failed: {}", action.id, action.description, e);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

async fn drain(inner: Arc<Inner>) {
    loop {
        let next = {
            let mut queue = inner.queue();
            match queue.pop_front() {
                Some(id) => id,
                None => {
                    // Flip to idle under the lock so a concurrent enqueue
                    // either sees Draining with its ids still queued, or Idle
                    inner.state.send_replace(ExecutorState::Idle);
                    return;
                }
            }
        };
        inner.run_step(&next).await;
        tokio::time::sleep(inner.step_delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Event;
    use crate::infra::clock::ManualClock;
    use crate::memory::MemoryStorage;
    use crate::workflow::runner::FnRunner;

    fn workflow(id: &str, action_ids: &[&str]) -> Workflow {
        let actions = action_ids
            .iter()
            .map(|a| Action::from_event(&Event::new(*a, format!("GET:/{a}"), 0)).unwrap())
            .collect();
        Workflow::new(id, id, "", actions, 0)
    }

    fn setup(
        fail_on: &'static str,
        delay_ms: u64,
    ) -> (WorkflowExecutor, Arc<MemoryStorage>, Arc<Mutex<Vec<String>>>) {
        setup_with(fail_on, "", delay_ms)
    }

    fn setup_with(
        fail_on: &'static str,
        panic_on: &'static str,
        delay_ms: u64,
    ) -> (WorkflowExecutor, Arc<MemoryStorage>, Arc<Mutex<Vec<String>>>) {
        let storage = Arc::new(MemoryStorage::new(100));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = calls.clone();
        let runner = FnRunner::new(move |action: &Action| {
            seen.lock().unwrap().push(action.id.clone());
            if action.id == panic_on {
                panic!("runner blew up on {}", action.id);
            }
            if action.id == fail_on {
                return Err(FlowError::Runner {
                    action_id: action.id.clone(),
                    message: "boom".into(),
                });
            }
            Ok(())
        });
        let executor = WorkflowExecutor::new(
            storage.clone(),
            Arc::new(runner),
            Arc::new(ManualClock::new(1_000)),
            Duration::from_millis(delay_ms),
        );
        (executor, storage, calls)
    }

    #[tokio::test]
    async fn test_failed_step_does_not_halt_queue() {
        let (executor, storage, calls) = setup("b", 0);
        storage.set_workflow(&workflow("w", &["a", "b", "c"])).unwrap();

        assert!(executor.execute_workflow("w"));
        executor.wait_idle().await;

        assert_eq!(*calls.lock().unwrap(), vec!["a", "b", "c"]);
        let stored = &storage.get_workflows().unwrap()[0];
        assert_eq!(stored.frequency, 2);
        assert_eq!(stored.last_executed, Some(1_000));
    }

    #[tokio::test]
    async fn test_panicking_step_does_not_stall_queue() {
        let (executor, storage, calls) = setup_with("", "p2", 0);
        storage.set_workflow(&workflow("w", &["p1", "p2", "p3"])).unwrap();

        executor.execute_workflow("w");
        tokio::time::timeout(Duration::from_secs(2), executor.wait_idle())
            .await
            .expect("executor should return to idle");
        assert_eq!(*calls.lock().unwrap(), vec!["p1", "p2", "p3"]);
        assert_eq!(executor.state(), ExecutorState::Idle);

        // A later run still drains
        executor.execute_workflow("w");
        tokio::time::timeout(Duration::from_secs(2), executor.wait_idle())
            .await
            .expect("executor should drain again");
        assert_eq!(calls.lock().unwrap().len(), 6);
        assert_eq!(executor.pending(), 0);
    }

    #[test]
    fn test_panic_message_extracts_payload() {
        let boxed: Box<dyn Any + Send> = Box::new("static msg");
        assert_eq!(panic_message(boxed.as_ref()), "static msg");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned msg"));
        assert_eq!(panic_message(boxed.as_ref()), "owned msg");
        let boxed: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }

    #[tokio::test]
    async fn test_malformed_url_step_is_skipped() {
        let storage = Arc::new(MemoryStorage::new(100));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = calls.clone();
        let runner = FnRunner::new(move |action: &Action| {
            seen.lock().unwrap().push(action.id.clone());
            if action.id == "a" {
                let err = FlowError::InvalidUrl {
                    url: "/a".into(),
                    reason: "missing scheme".into(),
                };
                assert!(err.is_malformed_input());
                return Err(err);
            }
            Ok(())
        });
        let executor = WorkflowExecutor::new(
            storage.clone(),
            Arc::new(runner),
            Arc::new(ManualClock::new(1_000)),
            Duration::ZERO,
        );
        storage.set_workflow(&workflow("w", &["a", "b"])).unwrap();

        executor.execute_workflow("w");
        executor.wait_idle().await;
        assert_eq!(*calls.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_unknown_workflow() {
        let (executor, _, calls) = setup("", 0);
        assert!(!executor.execute_workflow("missing"));
        assert_eq!(executor.state(), ExecutorState::Idle);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_call_extends_same_queue() {
        let (executor, storage, calls) = setup("", 0);
        storage.set_workflow(&workflow("w1", &["a", "b"])).unwrap();
        storage.set_workflow(&workflow("w2", &["c"])).unwrap();

        executor.execute_workflow("w1");
        executor.execute_workflow("w2");
        assert_eq!(executor.state(), ExecutorState::Draining);
        assert_eq!(executor.pending(), 3);
        executor.wait_idle().await;

        assert_eq!(*calls.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_cancel_drops_pending_steps() {
        let (executor, storage, calls) = setup("", 50);
        storage.set_workflow(&workflow("w", &["a", "b", "c"])).unwrap();

        executor.execute_workflow("w");
        // The drain task has not been polled yet on this single-threaded runtime
        assert_eq!(executor.cancel(), 3);
        executor.wait_idle().await;

        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(executor.state(), ExecutorState::Idle);
        // Stats were bumped even though nothing ran
        assert_eq!(storage.get_workflows().unwrap()[0].frequency, 2);
    }

    #[tokio::test]
    async fn test_missing_action_is_skipped() {
        let (executor, storage, calls) = setup("", 0);
        storage.set_workflow(&workflow("w", &["a", "b"])).unwrap();
        executor.inner.queue().push_back("ghost".into());

        executor.execute_workflow("w");
        executor.wait_idle().await;

        assert_eq!(*calls.lock().unwrap(), vec!["a", "b"]);
    }
}
