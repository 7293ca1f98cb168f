use anyhow::{Context, Result};
use clap::Parser;
use focus_timer::cli::{Cli, Commands};
use focus_timer::config::{self, AppConfig};
use focus_timer::display::Display;
use focus_timer::notify::{DesktopNotifier, Notifier, SilentNotifier};
use focus_timer::{APP_NAME, Session, TimerEngine, logging, ws};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{BufReader, stdin};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = cli.log_dir.clone().unwrap_or_else(config::default_log_dir);
    let _guard = logging::setup_logging(&log_dir, APP_NAME, cli.debug, cli.verbose)?;

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load(&config_path)?;
    let notifier = make_notifier(&config, cli.no_notify);
    let durations = config.durations();

    match cli.command.unwrap_or(Commands::Local) {
        Commands::Local => {
            let display = Display::local(TimerEngine::new(durations), notifier);
            display.run(BufReader::new(stdin())).await
        }
        Commands::Host { addr } => {
            let addr = addr.unwrap_or(config.relay_addr);
            run_host(&addr, TimerEngine::new(durations), notifier).await
        }
        Commands::Display { addr } => {
            let addr = addr.unwrap_or(config.relay_addr);
            let display = Display::attach(&addr, durations, notifier).await;
            display.run(BufReader::new(stdin())).await
        }
    }
}

fn make_notifier(config: &AppConfig, disabled: bool) -> Arc<dyn Notifier> {
    if config.notifications && !disabled {
        Arc::new(DesktopNotifier)
    } else {
        Arc::new(SilentNotifier)
    }
}

/// Relay host: owns the countdown and serves displays until Ctrl+C.
async fn run_host(addr: &str, engine: TimerEngine, notifier: Arc<dyn Notifier>) -> Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("Invalid relay address: {}", addr))?;

    println!("🍅 Focus Timer - Relay Host");
    println!("======================================================");
    for (mode, seconds) in engine.durations().iter() {
        println!("  {} {:<11} {}min", mode.emoji(), mode.label(), seconds / 60);
    }
    println!("Serving displays on ws://{}", addr);
    println!("Press Ctrl+C to stop\n");

    let session = Session::spawn(engine, notifier);

    tokio::select! {
        result = ws::start_websocket_server(addr, session) => {
            result.context("Relay server failed")?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            tracing::info!("Relay host shutting down");
        }
    }
    Ok(())
}
