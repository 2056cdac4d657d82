// src/infra/logger.rs — Structured logging with tracing

use tracing_subscriber::{fmt, EnvFilter};

/// Directive for the crate's own spans at `level`; dependencies stay at warn
/// so reqwest and hyper do not flood replay output.
fn default_directive(level: &str) -> String {
    if level.eq_ignore_ascii_case("warn") {
        "warn".to_string()
    } else {
        format!("warn,flowcast={level}")
    }
}

/// Install the global subscriber on stderr, leaving stdout to command
/// output. `RUST_LOG` wins over `level` when set.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
