// src/workflow/mod.rs — Workflow capture, detection, and replay

pub mod executor;
pub mod recorder;
pub mod runner;
pub mod watcher;

pub use executor::{ExecutorState, WorkflowExecutor};
pub use recorder::{RecorderState, WorkflowRecorder};
pub use runner::{ActionRunner, FnRunner, HttpRunner};
pub use watcher::{RepetitionWatcher, TransitionCounter, TransitionKey};
