use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use memory_monitor::config::Config;
use memory_monitor::control::running_as_root;
use memory_monitor::logging::{self, LogOptions};
use memory_monitor::monitor::{check_procfs, PROCFS_PATH};
use memory_monitor::types::bytes_to_gb;
use memory_monitor::{
    hog, shutdown, MemoryMonitor, PolicyEvaluator, ProcessSource, SysinfoSampler, Terminator,
    UnixProcessControl,
};

#[derive(Parser)]
#[command(name = "memory-monitor")]
#[command(about = "Terminate processes that exceed memory thresholds")]
struct Cli {
    /// Path to config.toml
    #[arg(long, short, global = true, env = "MEMORY_MONITOR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitor (default)
    Run {
        /// Log violations without sending signals, overriding settings.dry_run
        #[arg(long)]
        dry_run: bool,
        /// Run a single scan and exit
        #[arg(long)]
        once: bool,
    },
    /// Validate the configuration and print the resolved values
    Check,
    /// Allocate memory and hold it, for testing the monitor
    Hog {
        /// Amount to allocate in MB
        #[arg(long, short, default_value_t = 100)]
        megabytes: usize,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run {
        dry_run: false,
        once: false,
    }) {
        Commands::Run { dry_run, once } => run(cli.config.as_deref(), dry_run, once).await,
        Commands::Check => check(cli.config.as_deref()),
        Commands::Hog { megabytes } => hog::run(megabytes).await,
    }
}

async fn run(config_path: Option<&Path>, dry_run: bool, once: bool) -> Result<()> {
    let (mut config, path) = Config::load(config_path)?;
    if dry_run {
        config.settings.dry_run = true;
    }

    logging::init_tracing(
        "memory_monitor",
        LogOptions {
            log_file: config.log_file(),
            enable_syslog: config.settings.enable_syslog,
        },
    )?;
    tracing::info!("Loaded configuration from {}", path.display());

    if !running_as_root() {
        tracing::warn!("Not running as root. May not be able to kill all processes.");
    }

    check_procfs(Path::new(PROCFS_PATH))?;

    let evaluator = PolicyEvaluator::new(config.thresholds(), config.whitelist());
    let terminator = Terminator::new(
        UnixProcessControl,
        config.grace_period(),
        config.settings.dry_run,
    );
    let mut monitor = MemoryMonitor::new(
        SysinfoSampler::new(),
        evaluator,
        terminator,
        config.check_interval(),
    );

    let memory = monitor.preflight().context("startup checks failed")?;
    monitor.log_startup(&memory);

    if once {
        monitor
            .tick()
            .await
            .context("scan failed, see log for details")?;
        return Ok(());
    }

    let (handle, shutdown) = shutdown::channel();
    shutdown::listen_for_signals(handle).context("failed to install signal handlers")?;

    monitor.run(shutdown).await;
    Ok(())
}

fn check(config_path: Option<&Path>) -> Result<()> {
    let (config, path) = Config::load(config_path)?;

    println!("Configuration: {}", path.display());
    println!();
    print!("{}", toml::to_string_pretty(&config)?);
    println!();

    let memory = SysinfoSampler::new()
        .memory()
        .context("cannot read system memory")?;
    let thresholds = config.thresholds();
    println!("Total RAM: {:.2} GB", bytes_to_gb(memory.total_bytes));
    println!(
        "Effective limit per process: {:.2} GB ({}% of total) or {} GB",
        bytes_to_gb(memory.total_bytes) * thresholds.ram_percent / 100.0,
        thresholds.ram_percent,
        thresholds.ram_gb
    );
    if !running_as_root() {
        println!("Warning: not running as root. May not be able to kill all processes.");
    }

    Ok(())
}
