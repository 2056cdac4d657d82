// src/core/kernel.rs — Prediction and automation kernel
//
// Owns the live window, the action cache, the transition counters and the
// rebuild timer. Everything persistent goes through the injected Storage.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::core::source::EventSource;
use crate::core::types::{Action, AutomationSuggestion, Event, Prediction, Workflow};
use crate::infra::clock::{Clock, SystemClock};
use crate::infra::config::Config;
use crate::infra::errors::FlowError;
use crate::memory::{read_or_default, Storage};
use crate::patterns::{
    Continuation, EventLog, PatternMiner, Predictor, RebuildSchedule, RebuildStats,
    SequenceWindow, SimilarityMatcher,
};
use crate::workflow::{
    ActionRunner, ExecutorState, RecorderState, RepetitionWatcher, WorkflowExecutor,
    WorkflowRecorder,
};

/// Handle returned by the `on_*` subscription methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type PredictionCallback = Box<dyn Fn(&Prediction) + Send + Sync>;
type SuggestionCallback = Box<dyn Fn(&AutomationSuggestion) + Send + Sync>;

/// Point-in-time summary for status displays.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelStatus {
    pub window_len: usize,
    pub recorder: RecorderState,
    pub recorded_actions: usize,
    pub logged_events: usize,
    pub patterns: usize,
    pub workflows: usize,
    pub executor: ExecutorState,
    pub pending_steps: usize,
    pub rebuild_due_at: Option<i64>,
}

pub struct Kernel {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    window: SequenceWindow,
    event_log: EventLog,
    miner: PatternMiner,
    predictor: Predictor,
    matcher: SimilarityMatcher,
    actions: HashMap<String, Action>,
    recorder: WorkflowRecorder,
    watcher: RepetitionWatcher,
    executor: WorkflowExecutor,
    schedule: RebuildSchedule,
    prediction_subscribers: Vec<(SubscriptionId, PredictionCallback)>,
    suggestion_subscribers: Vec<(SubscriptionId, SuggestionCallback)>,
    next_subscription: u64,
}

impl Kernel {
    pub fn new(config: &Config, storage: Arc<dyn Storage>, runner: Arc<dyn ActionRunner>) -> Self {
        Self::with_clock(config, storage, runner, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: &Config,
        storage: Arc<dyn Storage>,
        runner: Arc<dyn ActionRunner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let kernel = &config.kernel;
        let rebuild_interval_ms =
            i64::try_from(kernel.rebuild_interval_secs.saturating_mul(1_000)).unwrap_or(i64::MAX);

        Self {
            window: SequenceWindow::new(kernel.max_sequence_length),
            event_log: EventLog::new(storage.clone()),
            miner: PatternMiner::new(storage.clone(), kernel.max_pattern_length),
            predictor: Predictor::new(kernel.max_pattern_length, kernel.min_confidence),
            matcher: SimilarityMatcher::new(config.fuzzy.similarity_threshold),
            actions: HashMap::new(),
            recorder: WorkflowRecorder::new(),
            watcher: RepetitionWatcher::new(
                config.automation.repetition_threshold,
                config.automation.suggestion_cooldown_ms,
            ),
            executor: WorkflowExecutor::new(
                storage.clone(),
                runner,
                clock.clone(),
                Duration::from_millis(config.executor.step_delay_ms),
            ),
            schedule: RebuildSchedule::new(rebuild_interval_ms),
            prediction_subscribers: Vec::new(),
            suggestion_subscribers: Vec::new(),
            next_subscription: 0,
            storage,
            clock,
        }
    }

    // ── Subscriptions ────────────────────────────────────────────

    pub fn on_prediction<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&Prediction) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.prediction_subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns false if the id was not subscribed.
    pub fn off_prediction(&mut self, id: SubscriptionId) -> bool {
        let before = self.prediction_subscribers.len();
        self.prediction_subscribers.retain(|(sub, _)| *sub != id);
        self.prediction_subscribers.len() != before
    }

    pub fn on_suggestion<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&AutomationSuggestion) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.suggestion_subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn off_suggestion(&mut self, id: SubscriptionId) -> bool {
        let before = self.suggestion_subscribers.len();
        self.suggestion_subscribers.retain(|(sub, _)| *sub != id);
        self.suggestion_subscribers.len() != before
    }

    fn next_id(&mut self) -> SubscriptionId {
        self.next_subscription += 1;
        SubscriptionId(self.next_subscription)
    }

    // ── Event intake ─────────────────────────────────────────────

    /// Feed one observed event: log it, slide the window, count the
    /// transition from the previous event, rebuild if the timer expired,
    /// re-arm it, and predict what comes next.
    pub fn add_event(&mut self, event: Event) -> Option<Prediction> {
        let now = self.clock.now_ms();
        tracing::debug!("Event {} ({})", event.id, event.signature);

        let previous = self.window.last().cloned();
        self.event_log.append(&event);
        self.window.add(event.clone());

        if let Some(previous) = previous {
            if let Some(suggestion) = self.watcher.observe(&previous, &event, now) {
                for (_, callback) in &self.suggestion_subscribers {
                    callback(&suggestion);
                }
            }
        }

        self.poll_rebuild();
        self.schedule.schedule(now);

        let prediction = self.predict()?;
        for (_, callback) in &self.prediction_subscribers {
            callback(&prediction);
        }
        Some(prediction)
    }

    /// Best guess at the next action given the current window.
    pub fn predict(&mut self) -> Option<Prediction> {
        let now = self.clock.now_ms();
        let window = self.window.snapshot();
        if window.len() < 2 {
            return None;
        }

        let patterns = read_or_default(self.storage.get_patterns(), "patterns");
        if let Some(found) = self.predictor.from_pattern_table(&window, &patterns, now) {
            return self.resolve(found, None);
        }

        let last = window.last()?;
        let log = self.event_log.read();
        let (found, follower) = self.matcher.continuation(last, &log)?;
        self.resolve(found, Some(follower))
    }

    fn resolve(&mut self, found: Continuation, hint: Option<Event>) -> Option<Prediction> {
        let action = self.action_by_id(&found.id, hint)?;
        tracing::debug!(
            "Predicted {} ({:.2}): {}",
            action.description,
            found.confidence,
            found.context
        );
        Some(Prediction {
            confidence: found.confidence,
            action,
            context: found.context,
            source: found.source,
        })
    }

    /// Cached action for an id, deriving it from the logged event on first use.
    fn action_by_id(&mut self, id: &str, hint: Option<Event>) -> Option<Action> {
        if let Some(action) = self.actions.get(id) {
            return Some(action.clone());
        }
        if let Some(action) = read_or_default(self.storage.get_actions(), "actions").remove(id) {
            self.actions.insert(id.to_string(), action.clone());
            return Some(action);
        }

        let event = hint
            .filter(|e| e.id == id)
            .or_else(|| self.window.snapshot().into_iter().rev().find(|e| e.id == id))
            .or_else(|| self.event_log.find(id));
        let Some(event) = event else {
            tracing::warn!("No event found for predicted id {}", id);
            return None;
        };
        self.derive_action(&event)
    }

    /// Derive, cache and persist the action an event stands for.
    pub fn action_for_event(&mut self, event: &Event) -> Option<Action> {
        match self.actions.get(&event.id) {
            Some(action) => Some(action.clone()),
            None => self.derive_action(event),
        }
    }

    fn derive_action(&mut self, event: &Event) -> Option<Action> {
        let action = match Action::from_event(event) {
            Ok(action) => action,
            Err(e) => {
                tracing::warn!("Cannot derive action for {}: {}", event.id, e);
                return None;
            }
        };
        if let Err(e) = self.storage.set_action(&action) {
            tracing::warn!("Failed to persist action {}: {}", action.id, e);
        }
        self.actions.insert(action.id.clone(), action.clone());
        Some(action)
    }

    // ── Recording ────────────────────────────────────────────────

    pub fn start_recording(&mut self) -> bool {
        self.recorder.start()
    }

    /// Append an action to the recording in progress.
    pub fn record_action(&mut self, action: Action) -> bool {
        if !self.recorder.is_recording() {
            return false;
        }
        self.actions.insert(action.id.clone(), action.clone());
        self.recorder.add_action(action)
    }

    pub fn stop_recording(&mut self) -> Option<Workflow> {
        let now = self.clock.now_ms();
        match self.recorder.stop(self.storage.as_ref(), now) {
            Ok(workflow) => workflow,
            Err(e) => {
                tracing::warn!("Failed to save recorded workflow: {}", e);
                None
            }
        }
    }

    /// Turn a suggested transition into a two-step workflow.
    pub fn accept_suggestion(&mut self, suggestion: &AutomationSuggestion) -> Option<Workflow> {
        if self.recorder.is_recording() {
            tracing::warn!("Cannot accept a suggestion while a recording is in progress");
            return None;
        }
        self.start_recording();
        for event in [&suggestion.current, &suggestion.next] {
            if let Some(action) = self.action_for_event(event) {
                self.record_action(action);
            }
        }
        self.stop_recording()
    }

    // ── Replay ───────────────────────────────────────────────────

    pub fn execute_workflow(&self, workflow_id: &str) -> bool {
        self.executor.execute_workflow(workflow_id)
    }

    pub fn cancel_execution(&self) -> usize {
        self.executor.cancel()
    }

    pub async fn wait_idle(&self) {
        self.executor.wait_idle().await
    }

    pub fn list_workflows(&self) -> Vec<Workflow> {
        read_or_default(self.storage.get_workflows(), "workflows")
    }

    // ── Pattern mining ───────────────────────────────────────────

    /// Run one mining pass now, disarming any pending timer.
    pub fn rebuild_patterns(&mut self) -> Result<RebuildStats, FlowError> {
        self.schedule.take();
        let log = self.event_log.read();
        self.miner.rebuild(&log)
    }

    /// Rebuild if the debounced timer has expired. Returns whether it ran.
    pub fn poll_rebuild(&mut self) -> bool {
        if !self.schedule.take_due(self.clock.now_ms()) {
            return false;
        }
        self.rebuild_logged();
        true
    }

    fn rebuild_logged(&mut self) {
        if let Err(e) = self.rebuild_patterns() {
            tracing::warn!("Pattern rebuild failed: {}", e);
        }
    }

    // ── Driver ───────────────────────────────────────────────────

    /// Consume `source` until it ends, rebuilding on the debounced timer.
    /// A pending rebuild is flushed when the source is exhausted.
    pub async fn run<S: EventSource>(&mut self, mut source: S) -> Result<(), FlowError> {
        tracing::info!("Kernel running");
        loop {
            let wait = self
                .schedule
                .due_at()
                .map(|due| Duration::from_millis(due.saturating_sub(self.clock.now_ms()).max(0) as u64));

            tokio::select! {
                next = source.next_event() => match next? {
                    Some(event) => {
                        self.add_event(event);
                    }
                    None => break,
                },
                _ = tokio::time::sleep(wait.unwrap_or_default()), if wait.is_some() => {
                    self.rebuild_logged();
                }
            }
        }

        if self.schedule.due_at().is_some() {
            self.rebuild_logged();
        }
        tracing::info!("Event source exhausted");
        Ok(())
    }

    pub fn status(&self) -> KernelStatus {
        KernelStatus {
            window_len: self.window.len(),
            recorder: self.recorder.state(),
            recorded_actions: self.recorder.len(),
            logged_events: self.event_log.read().len(),
            patterns: read_or_default(self.storage.get_patterns(), "patterns").len(),
            workflows: self.list_workflows().len(),
            executor: self.executor.state(),
            pending_steps: self.executor.pending(),
            rebuild_due_at: self.schedule.due_at(),
        }
    }
}
