//! subvisor - master automation controller
//!
//! `start` runs every configured subsystem until SIGINT/SIGTERM, `status`
//! prints the controller's view, `restart <system-id>` restarts one subsystem.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use subvisor::{Controller, ControllerConfig, LogWriter, Subscribe};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// subvisor - master automation controller
#[derive(Parser, Debug)]
#[command(name = "subvisor")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (built-in deployment when omitted)
    #[arg(short, long, env = "SUBVISOR_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start all enabled subsystems and run until interrupted
    Start,

    /// Print running flag, aggregate health and per-subsystem status
    Status,

    /// Restart one subsystem (stop, wait, start)
    Restart {
        /// Subsystem id, e.g. github-deployment
        system_id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let cfg = match &cli.config {
        Some(path) => ControllerConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ControllerConfig::default(),
    };

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let controller = Controller::builder(cfg)
        .with_subscribers(subs)
        .build()
        .context("failed to build controller")?;

    let code = match cli.command {
        Commands::Start => start(&controller).await,
        Commands::Status => status(&controller),
        Commands::Restart { system_id } => restart(&controller, &system_id).await,
    };
    controller.shutdown_observers().await;
    code
}

async fn start(controller: &Arc<Controller>) -> Result<ExitCode> {
    let ctrl = Arc::clone(controller);
    let joined = tokio::spawn(async move { ctrl.run().await }).await;

    match joined {
        Ok(Ok(())) => {
            info!("controller stopped");
            Ok(ExitCode::SUCCESS)
        }
        Ok(Err(e)) => {
            error!(error = %e, label = e.as_label(), "controller exited with error");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            error!(error = %e, "controller task crashed");
            controller.emergency_shutdown().await;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn status(controller: &Controller) -> Result<ExitCode> {
    controller
        .initialize_systems()
        .context("failed to initialize subsystems")?;
    let snapshot = controller.status();

    println!("running: {}", snapshot.running);
    println!(
        "health:  {:.1}% ({}/{} healthy, critical systems ok: {})",
        snapshot.health.percent(),
        snapshot.health.healthy,
        snapshot.health.total,
        snapshot.health.critical_systems_ok
    );
    for system in &snapshot.systems {
        println!(
            "  {:<20} {:<13} uptime {:>6}s  critical: {}",
            system.id,
            system.status.as_str(),
            system.uptime_secs.unwrap_or(0),
            system.critical
        );
    }
    Ok(ExitCode::SUCCESS)
}

async fn restart(controller: &Controller, id: &str) -> Result<ExitCode> {
    controller
        .initialize_systems()
        .context("failed to initialize subsystems")?;

    let code = match controller.restart_system(id).await {
        Ok(()) => {
            println!("restarted {id}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, label = e.as_label(), "restart failed");
            ExitCode::FAILURE
        }
    };
    controller.stop().await;
    Ok(code)
}
