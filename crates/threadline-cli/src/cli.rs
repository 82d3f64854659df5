use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "threadline")]
#[command(about = "Open chat threads and fetch their attachments from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the client config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open a report and print the screen once it settles
    Open {
        /// Report ID
        report_id: String,
        /// Seconds to wait for the report to load
        #[arg(long, default_value = "15")]
        timeout_secs: u64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Post a comment to a report
    Comment {
        /// Report ID
        report_id: String,
        /// Comment text
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,
        /// Seconds to wait for the server to confirm
        #[arg(long, default_value = "15")]
        timeout_secs: u64,
    },
    /// Download a chat attachment
    Download {
        /// Attachment URL
        url: String,
        /// File name to save as (defaults to the last URL segment)
        #[arg(long)]
        name: Option<String>,
        /// Directory to save into (defaults to the configured download directory)
        #[arg(long, value_name = "PATH")]
        dir: Option<PathBuf>,
    },
    /// Inspect client configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration with secrets redacted
    Show,
    /// Print the config file path
    Path,
}
