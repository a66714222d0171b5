//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// statsq - fetch stats widgets through a bounded scheduler
#[derive(Parser)]
#[command(
    name = "statsq",
    about = "Fetch and render stats widgets with bounded concurrency",
    version = env!("CARGO_PKG_VERSION"),
    after_help = "Logs are written to: ~/.local/share/statsq/logs/statsq.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Draw every configured widget and print the results
    Run {
        /// Override the number of concurrent fetches
        #[arg(long)]
        capacity: Option<usize>,

        /// Override the stats server base url
        #[arg(long)]
        base_url: Option<String>,

        /// Give up waiting after this many seconds
        #[arg(long, default_value = "120")]
        wait_secs: u64,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List widget kinds and the view each one requests
    Views,

    /// Print the effective configuration
    Config,
}

/// Output format for run results
#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("statsq")
        .join("logs")
        .join("statsq.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert!(matches!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json)));
        assert!(matches!("PLAIN".parse::<OutputFormat>(), Ok(OutputFormat::Text)));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_parse_run_overrides() {
        let cli = Cli::try_parse_from(["statsq", "-v", "run", "--capacity", "2", "--format", "json"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Some(Command::Run { capacity, format, .. }) => {
                assert_eq!(capacity, Some(2));
                assert!(matches!(format, OutputFormat::Json));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_log_path_file_name() {
        assert!(get_log_path().ends_with("statsq/logs/statsq.log"));
    }
}
