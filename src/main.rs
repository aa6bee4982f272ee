//! taskbeat - periodic job scheduler.

use std::path::Path;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use taskbeat_config::{Config, ConfigLoader, ConfigValidator, LogConfig};

mod cli;
mod cmd_apply;
mod cmd_beat;
mod cmd_schedule;
mod jobs;
mod services;

use cli::{Cli, Commands};

/// Fold command line flags into the loaded configuration.
fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(level) = &cli.loglevel {
        config.log.level = level.to_lowercase();
    }
    if let Some(file) = &cli.logfile {
        config.log.file = Some(file.display().to_string());
    }

    match &cli.command {
        Commands::Beat {
            detach,
            pidfile,
            schedule,
            interval_ms,
        } => {
            if *detach {
                config.daemon.detach = true;
            }
            if let Some(pidfile) = pidfile {
                config.daemon.pid_file = pidfile.display().to_string();
            }
            if let Some(schedule) = schedule {
                config.beat.schedule_filename = schedule.display().to_string();
            }
            if interval_ms.is_some() {
                config.beat.interval_ms = *interval_ms;
            }
        }
        Commands::Apply { eager, .. } => {
            if *eager {
                config.dispatch.always_eager = true;
            }
        }
        Commands::Schedule { schedule } => {
            if let Some(schedule) = schedule {
                config.beat.schedule_filename = schedule.display().to_string();
            }
        }
    }
}

/// Initialize tracing with console output and an optional log file.
fn init_tracing(log: &LogConfig) -> anyhow::Result<()> {
    let file_layer = match log.file_path() {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path {}", path.display()))?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);

            // Keeps the writer thread alive for the program duration
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(())
}

async fn run(command: Commands, config: Config) -> anyhow::Result<()> {
    match command {
        Commands::Beat { .. } => cmd_beat::run_beat(&config).await,
        Commands::Apply {
            job,
            args,
            countdown,
            eager,
        } => cmd_apply::run_apply(&config, &job, &args, countdown, eager).await,
        Commands::Schedule { .. } => cmd_schedule::run_schedule(&config).await,
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load_or_default(cli.config.as_deref())?;
    apply_cli_overrides(&mut config, &cli);

    let validation = ConfigValidator::validate(&config)?;
    if !validation.is_valid() {
        let errors: Vec<String> = validation
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect();
        bail!("Invalid configuration:\n  {}", errors.join("\n  "));
    }

    // Forking is only safe before the runtime and the log writer start threads.
    let detach = matches!(cli.command, Commands::Beat { .. }) && config.daemon.detach;
    if detach {
        let work_dir = std::env::current_dir()?;
        taskbeat_daemon::detach(Some(&work_dir))?;
    }

    init_tracing(&config.log)?;
    for warning in &validation.warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }
    if detach {
        info!("Running detached");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    runtime.block_on(run(cli.command, config))
}
