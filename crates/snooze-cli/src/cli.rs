//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "snooze", about = "defer tabs now, restore them later")]
pub struct Cli {
    /// Directory holding the persisted collection (default: $XDG_DATA_HOME/snooze)
    #[arg(long, global = true, env = "SNOOZE_STORE_DIR")]
    pub store_dir: Option<PathBuf>,

    /// Zone for wall-clock rules: "local", "utc" or an offset like "+09:00"
    #[arg(long, global = true, env = "SNOOZE_ZONE", default_value = "local")]
    pub zone: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve the request/response protocol as JSON lines on stdin/stdout
    Serve(ServeOpts),
    /// Show when a deferral option would wake
    Resolve(ResolveOpts),
    /// List deferred items (JSON)
    List,
    /// Print every deferred item as a JSON array
    Export,
}

#[derive(clap::Args)]
pub struct ServeOpts {
    /// JSON array of open tabs to seed the simulated tab host with
    #[arg(long)]
    pub tabs: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct ResolveOpts {
    /// Deferral option, e.g. "this-evening" or "next-week"
    pub option: String,

    /// Evaluate at this RFC 3339 instant instead of now
    #[arg(long)]
    pub now: Option<String>,
}

/// Default store directory following the XDG base directory layout.
pub fn default_store_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(dir).join("snooze");
    }
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".local/share/snooze"),
        Err(_) => PathBuf::from("snooze-data"),
    }
}
