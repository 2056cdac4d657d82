// src/lib.rs — Library root for flowcast

pub mod cli;
pub mod core;
pub mod infra;
pub mod memory;
pub mod patterns;
pub mod util;
pub mod workflow;
