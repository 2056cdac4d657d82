// src/cli/replay.rs — Feed a recorded event stream through the kernel

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::core::source::JsonlSource;
use crate::core::types::{AutomationSuggestion, PredictionSource};
use crate::core::Kernel;
use crate::infra::config::Config;
use crate::memory::Storage;
use crate::util::ellipsize;
use crate::workflow::HttpRunner;

/// Handle `flowcast replay <file>`.
pub async fn run_replay(
    storage: Arc<dyn Storage>,
    config: &Config,
    file: &Path,
    accept: bool,
) -> anyhow::Result<()> {
    let runner = Arc::new(HttpRunner::new(&config.executor)?);
    let mut kernel = Kernel::new(config, storage, runner);

    kernel.on_prediction(|p| {
        let via = match p.source {
            PredictionSource::Pattern => "pattern",
            PredictionSource::Similarity => "similar",
        };
        println!(
            "  next  {:<48} {:>4.0}%  [{}]",
            ellipsize(&p.action.description, 48),
            p.confidence * 100.0,
            via
        );
    });

    let suggestions: Arc<Mutex<Vec<AutomationSuggestion>>> = Arc::default();
    let sink = suggestions.clone();
    kernel.on_suggestion(move |s| {
        println!(
            "  auto  {} → {} seen {}x",
            s.current.signature, s.next.signature, s.count
        );
        if let Ok(mut pending) = sink.lock() {
            pending.push(s.clone());
        }
    });

    let source = JsonlSource::open(file).await?;
    kernel.run(source).await?;

    let pending = suggestions
        .lock()
        .map(|mut s| std::mem::take(&mut *s))
        .unwrap_or_default();

    if accept {
        for suggestion in &pending {
            if let Some(workflow) = kernel.accept_suggestion(suggestion) {
                println!("Saved {} ({}): {}", workflow.name, workflow.id, workflow.description);
            }
        }
    }

    let status = kernel.status();
    println!();
    println!(
        "{} events logged, {} patterns, {} suggestion(s), {} workflow(s)",
        status.logged_events,
        status.patterns,
        pending.len(),
        status.workflows
    );
    if !accept && !pending.is_empty() {
        println!("Re-run with --accept to save suggestions as workflows.");
    }
    Ok(())
}
