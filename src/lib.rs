mod commands;
pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::config::{ConfigOverrides, Profile, UpdaterConfig};
pub use crate::core::error::{FetchStage, UpdaterError, UpdaterResult};
pub use crate::core::manifest::{parse_manifest, ManifestEntry, UpdateServer};
pub use crate::core::mode::{derive_channel, detect_role, Mode, Role};
pub use crate::core::pipeline::{run_update, Progress, Stage, UpdateContext, UpdateOutcome};
pub use crate::core::sync::{Reconciler, SyncEvent, SyncReport};

/// Parse the command line, run one update and return the process exit code.
pub fn run() -> i32 {
    let cli = commands::parse_cli();

    // Logs go to stderr; stdout carries the progress lines.
    let fallback = if cli.verbose {
        "info,updater_lib=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Updater starting...");

    commands::execute(cli)
}
