//! statsq - stats widget fetcher
//!
//! CLI entry point: loads widgets from config and draws them through one
//! bounded scheduler.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{info, warn};

use statsq::cli::{Cli, Command, OutputFormat, get_log_path};
use statsq::config::Config;
use statsq::render::{Board, ContainerState, LOGIN_MESSAGE, Widget, WidgetKind};
use statsq::scheduler::{Admission, Scheduler};
use statsq::transport::HttpTransport;

fn setup_logging(verbose: bool) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Write to log file, not stdout/stderr
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!(path = %log_path.display(), "Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!(
        "statsq loaded config: capacity={}, widgets={}",
        config.scheduler.capacity,
        config.widgets.len()
    );

    match cli.command {
        Some(Command::Run {
            capacity,
            base_url,
            wait_secs,
            format,
        }) => cmd_run(config, capacity, base_url, wait_secs, format).await,
        Some(Command::Views) => cmd_views(),
        Some(Command::Config) => cmd_config(&config),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

/// Draw every configured widget and print the board
async fn cmd_run(
    mut config: Config,
    capacity: Option<usize>,
    base_url: Option<String>,
    wait_secs: u64,
    format: OutputFormat,
) -> Result<()> {
    if let Some(capacity) = capacity {
        config.scheduler.capacity = capacity;
    }
    if let Some(base_url) = base_url {
        config.transport.base_url = base_url;
    }
    config.validate().context("Invalid configuration")?;

    if config.widgets.is_empty() {
        println!("No widgets configured");
        return Ok(());
    }

    let transport = HttpTransport::from_config(&config.transport).context("Failed to build HTTP client")?;
    let scheduler = Scheduler::new(config.scheduler.clone(), Arc::new(transport));
    let board = Board::new();

    for widget_config in &config.widgets {
        let widget = Widget::on_board(widget_config.clone(), &board);
        match widget.draw(&scheduler).await {
            Ok(Admission::Started(id)) => info!(%id, kind = %widget_config.kind, "Widget started"),
            Ok(Admission::Queued { depth }) => info!(depth, kind = %widget_config.kind, "Widget queued"),
            Err(e) => {
                warn!(error = %e, kind = %widget_config.kind, "Widget rejected");
                eprintln!("{} {} widget rejected: {}", "!".yellow(), widget_config.kind, e);
            }
        }
    }

    let drained = tokio::time::timeout(Duration::from_secs(wait_secs), scheduler.wait_idle()).await;
    if drained.is_err() {
        warn!(wait_secs, "Timed out waiting for widgets");
        eprintln!("{} gave up waiting after {}s", "!".yellow(), wait_secs);
    }

    let snapshot = board.snapshot().await;
    let state = scheduler.queue_state().await;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "containers": snapshot,
                "scheduler": state,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            for (container_id, content) in &snapshot {
                println!("{} {}", container_id.bold(), describe(content));
            }
            println!();
            println!(
                "completed: {}  failed: {}  peak running: {}/{}  peak pending: {}",
                state.stats.total_completed,
                state.stats.total_failed,
                state.stats.peak_running,
                state.capacity,
                state.stats.peak_pending
            );
        }
    }

    Ok(())
}

/// One-line description of a container
fn describe(state: &ContainerState) -> String {
    match state {
        ContainerState::Loading => "loading...".dimmed().to_string(),
        ContainerState::Html(html) => format!("{} ({} bytes of html)", "ok".green(), html.len()),
        ContainerState::Message(msg) => format!("{} {}", "msg".cyan(), msg),
        ContainerState::Chart(summary) => format!(
            "{} {:?} chart, {} rows, total {}",
            "ok".green(),
            summary.chart,
            summary.rows.len(),
            summary.total()
        ),
        ContainerState::LoginRequired => format!("{} {}", "login".yellow(), LOGIN_MESSAGE),
        ContainerState::Error(e) => format!("{} {}", "error".red(), e),
    }
}

/// List widget kinds
fn cmd_views() -> Result<()> {
    for kind in WidgetKind::builtin() {
        println!("{:<18} {}", kind.to_string(), kind.view_name());
    }
    Ok(())
}

/// Print the effective configuration
fn cmd_config(config: &Config) -> Result<()> {
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}
