// src/patterns/mod.rs — Sequence tracking, pattern mining, prediction

pub mod event_log;
pub mod fuzzy;
pub mod miner;
pub mod predictor;
pub mod window;

pub use event_log::EventLog;
pub use fuzzy::SimilarityMatcher;
pub use miner::{PatternMiner, RebuildSchedule, RebuildStats};
pub use predictor::{Continuation, Predictor};
pub use window::SequenceWindow;
