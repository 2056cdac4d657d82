// src/cli/status.rs — System status display

use std::sync::Arc;

use crate::core::Kernel;
use crate::infra::config::Config;
use crate::infra::paths;
use crate::memory::SqliteStorage;
use crate::workflow::HttpRunner;

/// Handle `flowcast status`.
pub fn show_status(storage: Arc<SqliteStorage>, config: &Config) -> anyhow::Result<()> {
    let config_path = paths::config_file_path();

    println!("flowcast v{}", env!("CARGO_PKG_VERSION"));
    println!();
    if config_path.exists() {
        println!("  Config:     {} (loaded)", config_path.display());
    } else {
        println!("  Config:     (using defaults)");
    }
    println!("  Namespace:  {}", storage.namespace());

    let retained = storage.count_events()?;
    let runner = Arc::new(HttpRunner::new(&config.executor)?);
    let kernel = Kernel::new(config, storage, runner);
    let status = kernel.status();

    println!(
        "  Events:     {} / {} retained",
        retained, config.kernel.event_log_capacity
    );
    println!("  Patterns:   {}", status.patterns);
    println!("  Workflows:  {}", status.workflows);
    println!();
    println!(
        "  Window {} · patterns up to {} · min confidence {:.2} · rebuild every {}s",
        config.kernel.max_sequence_length,
        config.kernel.max_pattern_length,
        config.kernel.min_confidence,
        config.kernel.rebuild_interval_secs
    );
    Ok(())
}
