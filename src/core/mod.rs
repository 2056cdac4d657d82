// src/core/mod.rs — Event model, sources, and the kernel

pub mod kernel;
pub mod source;
pub mod types;

pub use kernel::{Kernel, KernelStatus, SubscriptionId};
pub use source::{ChannelSource, EventSource, JsonlSource};
