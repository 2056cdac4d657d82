// src/cli/workflows.rs — List and replay saved workflows

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use crate::core::Kernel;
use crate::infra::config::Config;
use crate::memory::{read_or_default, Storage};
use crate::util::ellipsize;
use crate::workflow::HttpRunner;

/// Handle `flowcast workflows`.
pub fn list_workflows(storage: &dyn Storage) -> anyhow::Result<()> {
    let workflows = read_or_default(storage.get_workflows(), "workflows");
    if workflows.is_empty() {
        println!("No workflows saved yet.");
        println!();
        println!("Replay an event stream with --accept to save repeated transitions.");
        return Ok(());
    }

    for wf in &workflows {
        let last = wf
            .last_executed
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "--".into());
        println!(
            "  {:<36} {:<14} {:>3} steps  {:>4}x  {}  {}",
            wf.id,
            wf.name,
            wf.actions().len(),
            wf.frequency,
            last,
            ellipsize(&wf.description, 60),
        );
    }
    Ok(())
}

/// Handle `flowcast run <id>`.
pub async fn run_workflow(
    storage: Arc<dyn Storage>,
    config: &Config,
    workflow_id: &str,
) -> anyhow::Result<()> {
    let runner = Arc::new(HttpRunner::new(&config.executor)?);
    let kernel = Kernel::new(config, storage, runner);

    if !kernel.execute_workflow(workflow_id) {
        anyhow::bail!("Workflow '{workflow_id}' not found");
    }
    kernel.wait_idle().await;

    if let Some(wf) = kernel.list_workflows().into_iter().find(|w| w.id == workflow_id) {
        println!("Ran {} ({} steps, {} runs total)", wf.name, wf.actions().len(), wf.frequency);
    }
    Ok(())
}
