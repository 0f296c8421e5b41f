use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::debug;

use crate::core::config::{ConfigOverrides, Profile, UpdaterConfig};
use crate::core::error::{UpdaterError, UpdaterResult};
use crate::core::pipeline::{run_update, Progress, Stage, UpdateContext, UpdateOutcome};
use crate::core::sync::SyncEvent;

/// Keeps a DMP / KMP client or server installation in sync with the update server
#[derive(Debug, Parser)]
#[command(name = "updater", version, about, long_about = None)]
pub struct Cli {
    /// Do not wait for a keypress before exiting
    #[arg(short, long)]
    pub batch: bool,

    /// Channel to sync against (default: derived from the executable name)
    #[arg(short, long)]
    pub channel: Option<String>,

    /// Mod distribution to update (dmp or kmp)
    #[arg(short, long)]
    pub profile: Option<Profile>,

    /// Update server base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Installation directory (default: the directory holding the executable)
    #[arg(short = 'd', long)]
    pub install_dir: Option<PathBuf>,

    /// Path to an updater.json with overrides
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Enable verbose logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run one update from the command line and return the exit code.
pub fn execute(cli: Cli) -> i32 {
    let batch = cli.batch;
    if batch {
        println!("Running in batch mode");
    }

    let code = match update(cli) {
        Ok((profile, outcome)) => {
            println!(
                "Your {} {} is up to date! ({} verified, {} downloaded)",
                profile.product(),
                outcome.mode.role,
                outcome.report.verified,
                outcome.report.downloaded
            );
            0
        }
        Err(err) => {
            report_error(&err);
            err.exit_code()
        }
    };

    finish(code, batch, wait_for_enter)
}

/// Interactive runs pause before the window closes; batch runs exit at once.
fn finish(code: i32, batch: bool, pause: impl FnOnce()) -> i32 {
    if !batch {
        pause();
    }
    code
}

fn update(cli: Cli) -> UpdaterResult<(Profile, UpdateOutcome)> {
    let exe = std::env::current_exe()
        .map_err(|e| UpdaterError::Config(format!("cannot locate the running executable: {e}")))?;
    let exe_name = exe
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let exe_dir = exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let overrides = ConfigOverrides {
        profile: cli.profile,
        channel: cli.channel,
        base_url: cli.base_url,
        install_dir: cli.install_dir,
        config_path: cli.config,
        timeout_secs: cli.timeout_secs,
    };
    let config = UpdaterConfig::load(overrides, exe_dir)?;
    let profile = config.profile;
    let ctx = UpdateContext::new(config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| UpdaterError::Config(format!("cannot start async runtime: {e}")))?;

    let mut console = Console::default();
    let outcome = runtime.block_on(run_update(&ctx, &exe_name, |progress| {
        console.show(progress)
    }));
    console.finish_line(outcome.is_ok());
    outcome.map(|outcome| (profile, outcome))
}

/// Prints progress the way the updater always has: `Doing X... done!`.
#[derive(Default)]
struct Console {
    open_line: bool,
}

impl Console {
    fn show(&mut self, progress: Progress<'_>) {
        match progress {
            Progress::Stage(Stage::ResolvingMode) => {}
            Progress::ModeResolved(mode) => {
                println!("Using the {} channel", mode.channel);
                println!("Updating {}", mode.role);
            }
            Progress::Stage(Stage::ValidatingChannel) => {
                self.start("Downloading channel index...");
            }
            Progress::Stage(Stage::FetchingManifest) => {
                self.end(" ok!");
                self.start("Downloading manifest...");
            }
            Progress::ManifestParsed { entries } => {
                self.end(&format!(" ok! ({entries} files)"));
            }
            Progress::Stage(Stage::Reconciling) => println!("Checking files..."),
            Progress::Sync(SyncEvent::UpToDate { .. }) => {}
            Progress::Sync(SyncEvent::Downloading { path }) => {
                self.start(&format!("Downloading {path} "));
            }
            Progress::Sync(SyncEvent::Downloaded { bytes, .. }) => {
                self.end(&format!(" done! ({bytes} bytes)"));
            }
        }
    }

    fn start(&mut self, text: &str) {
        print!("{text}");
        let _ = io::stdout().flush();
        self.open_line = true;
    }

    fn end(&mut self, text: &str) {
        if self.open_line {
            println!("{text}");
            self.open_line = false;
        }
    }

    fn finish_line(&mut self, ok: bool) {
        self.end(if ok { " ok!" } else { " failed!" });
    }
}

fn report_error(err: &UpdaterError) {
    debug!("Update failed: {:?}", err);
    match err {
        UpdaterError::UnknownChannel {
            channel,
            valid_channels,
        } => {
            eprintln!("Channel {channel:?} does not exist, current channels are:");
            for valid in valid_channels {
                eprintln!("{valid}");
            }
        }
        UpdaterError::InvalidChannelName { tool, .. } => {
            eprintln!("{err}");
            eprintln!("Rename the file to {tool}-(channel).exe or pass --channel");
        }
        other => eprintln!("{other}"),
    }
}

fn wait_for_enter() {
    println!("\nPress Enter to exit");
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}
