// ─── Update Pipeline ───
// resolve mode → validate channel → fetch manifest → reconcile.
// Strictly forward; the first error ends the run.

use std::fmt;

use tracing::info;

use crate::core::config::UpdaterConfig;
use crate::core::error::{UpdaterError, UpdaterResult};
use crate::core::http::build_http_client;
use crate::core::manifest::{parse_manifest, validate_channel, UpdateServer};
use crate::core::mode::{resolve_mode, Mode};
use crate::core::sync::{Reconciler, SyncEvent, SyncReport};

/// Pipeline stages, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolvingMode,
    ValidatingChannel,
    FetchingManifest,
    Reconciling,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ResolvingMode => "resolving mode",
            Stage::ValidatingChannel => "validating channel",
            Stage::FetchingManifest => "fetching manifest",
            Stage::Reconciling => "reconciling",
        };
        f.write_str(name)
    }
}

/// Everything the binary may want to show while a run progresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress<'a> {
    Stage(Stage),
    ModeResolved(&'a Mode),
    ManifestParsed { entries: usize },
    Sync(SyncEvent<'a>),
}

/// Per-run state, built once and threaded through every stage.
pub struct UpdateContext {
    pub config: UpdaterConfig,
    pub server: UpdateServer,
}

impl UpdateContext {
    pub fn new(config: UpdaterConfig) -> UpdaterResult<Self> {
        let client = build_http_client(config.timeout())
            .map_err(|e| UpdaterError::Config(format!("cannot build HTTP client: {e}")))?;
        let server = UpdateServer::new(client, &config.base_url);
        Ok(Self { config, server })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub mode: Mode,
    pub report: SyncReport,
}

/// Run the whole update for the executable named `exe_file_name`.
pub async fn run_update<F>(
    ctx: &UpdateContext,
    exe_file_name: &str,
    mut on_progress: F,
) -> UpdaterResult<UpdateOutcome>
where
    F: FnMut(Progress<'_>),
{
    on_progress(Progress::Stage(Stage::ResolvingMode));
    let mode = resolve_mode(&ctx.config, exe_file_name)?;
    on_progress(Progress::ModeResolved(&mode));

    on_progress(Progress::Stage(Stage::ValidatingChannel));
    let channels = ctx.server.fetch_channel_index().await?;
    validate_channel(&mode.channel, &channels)?;

    on_progress(Progress::Stage(Stage::FetchingManifest));
    let lines = ctx.server.fetch_manifest(&mode.channel, mode.role).await?;
    let manifest = parse_manifest(&lines);
    on_progress(Progress::ManifestParsed {
        entries: manifest.len(),
    });

    on_progress(Progress::Stage(Stage::Reconciling));
    let report = {
        let reconciler = Reconciler::new(&ctx.server, &mode.channel, &ctx.config.install_dir);
        reconciler
            .reconcile(&manifest, |event| on_progress(Progress::Sync(event.clone())))
            .await?
    };

    info!(
        "{} {} is up to date",
        ctx.config.profile.product(),
        mode.role
    );
    Ok(UpdateOutcome { mode, report })
}
