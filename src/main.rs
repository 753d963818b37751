use clap::Parser;
use log::{error, info, warn};
use sentra::config::Store;
use sentra::core::{Collaborators, Coordinator, LaunchArgs, ModuleRegistry};
use sentra::modules;
use sentra::shell::{HeadlessShell, LogNotifier, LogStatusIndicator, NoHelper, NullKeySource};
use sentra::updater::Updater;
use std::sync::Arc;

const RELEASE_REPO: &str = "sentra-monitor/sentra";

/// sentra - coordination core for a tray system-monitoring utility
#[derive(Parser, Debug, Clone)]
#[command(name = "sentra")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Wipe persisted settings before starting
    #[arg(long = "reset")]
    reset: bool,

    /// Start with sampling paused
    #[arg(short = 'p', long = "paused")]
    paused: bool,

    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,
}

fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logger with verbosity based on -d/--debug flag
    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    warn!("Starting sentra v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli) {
        error!("Fatal: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let store = Arc::new(Store::open()?);
    if cli.paused {
        store.set_bool(sentra::core::PAUSE_KEY, true);
    }

    let registry = Arc::new(ModuleRegistry::new(modules::catalog()));
    let updater = Arc::new(Updater::new(RELEASE_REPO));

    let coordinator = Coordinator::new(
        store,
        registry,
        updater,
        Collaborators {
            shell: Arc::new(HeadlessShell),
            status: Arc::new(LogStatusIndicator),
            notifier: Arc::new(LogNotifier),
            helper: Arc::new(NoHelper),
            keys: Arc::new(NullKeySource),
        },
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        coordinator.startup(&LaunchArgs { reset: cli.reset });

        info!("Running until interrupted");
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for termination signal: {e}");
        }

        coordinator.shutdown();
    });

    Ok(())
}
