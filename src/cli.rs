use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Focus timer with an optional relay host")]
pub struct Cli {
    /// Config file (defaults to ~/.config/focus_timer/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log directory (defaults to ~/.local/share/focus_timer)
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Debug level logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Also log to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable completion notifications
    #[arg(long, global = true)]
    pub no_notify: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Run the timer in this process with a terminal display
    Local,
    /// Run the relay host that owns the countdown
    Host {
        #[arg(short, long)]
        addr: Option<String>,
    },
    /// Attach a terminal display to a relay host
    Display {
        #[arg(short, long)]
        addr: Option<String>,
    },
}
