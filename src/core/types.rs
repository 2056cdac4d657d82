// src/core/types.rs — Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::infra::errors::FlowError;

/// Signature prefix marking a UI interaction (`UI:<event>:<selector>`).
pub const UI_METHOD: &str = "UI";

/// A single observed user-triggered event.
///
/// `signature` is the grouping key (`METHOD:URL` for network calls,
/// `UI:<event>:<selector>` for UI actions); `id` is unique per occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub signature: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Event {
    pub fn new(id: impl Into<String>, signature: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: id.into(),
            signature: signature.into(),
            timestamp,
        }
    }

    /// The part of the signature before the first `:`, if any.
    pub fn method(&self) -> Option<&str> {
        self.signature.split_once(':').map(|(method, _)| method)
    }

    /// The part after the first `:`, or the whole signature when there is
    /// no delimiter.
    pub fn target(&self) -> &str {
        self.signature
            .split_once(':')
            .map(|(_, rest)| rest)
            .unwrap_or(&self.signature)
    }
}

/// What replaying an action does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    /// Issue an HTTP request.
    Api { method: String, url: String },
    /// Dispatch a DOM-style event to a target.
    Ui { event: String, selector: String },
    /// Run another workflow.
    Workflow { workflow_id: String },
}

impl ActionKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Api { .. } => "api",
            Self::Ui { .. } => "ui",
            Self::Workflow { .. } => "workflow",
        }
    }
}

/// A replayable action, derived 1:1 from an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub description: String,
    #[serde(flatten)]
    pub kind: ActionKind,
}

impl Action {
    /// Derive the action an event stands for. The action shares the event id.
    pub fn from_event(event: &Event) -> Result<Self, FlowError> {
        let (method, rest) = event
            .signature
            .split_once(':')
            .ok_or_else(|| FlowError::malformed(&event.signature, "missing ':' delimiter"))?;
        let method = method.trim();
        let rest = rest.trim();
        if method.is_empty() || rest.is_empty() {
            return Err(FlowError::malformed(
                &event.signature,
                "empty method or target",
            ));
        }

        if method.eq_ignore_ascii_case(UI_METHOD) {
            let (ui_event, selector) = rest.split_once(':').ok_or_else(|| {
                FlowError::malformed(&event.signature, "UI signature needs '<event>:<selector>'")
            })?;
            if ui_event.is_empty() || selector.is_empty() {
                return Err(FlowError::malformed(
                    &event.signature,
                    "empty UI event or selector",
                ));
            }
            return Ok(Self {
                id: event.id.clone(),
                description: format!("{ui_event} {selector}"),
                kind: ActionKind::Ui {
                    event: ui_event.to_string(),
                    selector: selector.to_string(),
                },
            });
        }

        let method = method.to_ascii_uppercase();
        Ok(Self {
            id: event.id.clone(),
            description: format!("{method} {rest}"),
            kind: ActionKind::Api {
                method,
                url: rest.to_string(),
            },
        })
    }
}

/// A named, replayable list of actions. The action list is fixed at
/// creation; only `frequency` and `last_executed` change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub description: String,
    actions: Vec<Action>,
    pub frequency: u32,
    pub last_executed: Option<i64>,
}

impl Workflow {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        actions: Vec<Action>,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            actions,
            frequency: 1,
            last_executed: Some(created_at),
        }
    }

    /// Rebuild a workflow from persisted columns.
    pub fn restore(
        id: String,
        name: String,
        description: String,
        actions: Vec<Action>,
        frequency: u32,
        last_executed: Option<i64>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            actions,
            frequency,
            last_executed,
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn mark_executed(&mut self, now: i64) {
        self.frequency = self.frequency.saturating_add(1);
        self.last_executed = Some(now);
    }
}

/// Where a prediction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    /// Exact n-gram prefix match.
    Pattern,
    /// Edit-distance fallback over the event log.
    Similarity,
}

/// A transient guess at the next action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub confidence: f64,
    pub action: Action,
    pub context: String,
    pub source: PredictionSource,
}

/// An ordered id-sequence used as a pattern-table key.
///
/// Kept as a list rather than a joined string so ids containing separators
/// can never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternKey(Vec<String>);

impl PatternKey {
    pub fn new(tokens: Vec<String>) -> Self {
        Self(tokens)
    }

    pub fn from_events(events: &[Event]) -> Self {
        Self(events.iter().map(|e| e.id.clone()).collect())
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The token right after `prefix`, when `prefix` is a strict prefix.
    pub fn continuation_after(&self, prefix: &[String]) -> Option<&str> {
        if self.0.len() > prefix.len() && self.0.starts_with(prefix) {
            Some(self.0[prefix.len()].as_str())
        } else {
            None
        }
    }
}

impl fmt::Display for PatternKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" → "))
    }
}

/// Emitted when an adjacent pair of events has repeated often enough to be
/// worth automating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationSuggestion {
    pub current: Event,
    pub next: Event,
    pub count: u32,
}
