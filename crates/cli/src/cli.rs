use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

/// Create or update scheduled meetings from local definitions.
#[derive(Debug, Parser)]
#[command(name = "meetsync", version)]
pub struct Cli {
    /// Configuration file
    #[arg(long, env = "MEETSYNC_CONFIG", default_value = "config.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile every meeting of a plan file
    Run {
        /// Plan file (TOML)
        plan: PathBuf,
    },

    /// Reconcile a single meeting
    Reconcile {
        /// Stable local identifier of the meeting
        #[arg(long)]
        id: String,

        /// Email of the account that will own the meeting
        #[arg(long)]
        host_email: String,

        #[arg(long)]
        topic: String,

        /// Start time, RFC 3339 (e.g. 2020-04-26T14:00:00Z)
        #[arg(long)]
        start: DateTime<Utc>,

        /// Duration in minutes
        #[arg(long)]
        duration: u32,

        /// Meeting password (default: passwords.shared)
        #[arg(long)]
        password: Option<String>,

        /// Let attendees in without a waiting room
        #[arg(long)]
        no_waiting_room: bool,
    },

    /// Inspect the remote user directory
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },

    /// Print the cached snapshot of a meeting
    Show {
        /// Meeting identifier
        id: String,
    },

    /// Print the password derived for a meeting title
    Password {
        title: String,
    },

    /// Print the effective configuration with secrets redacted
    Config,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List users (from the snapshot when present)
    List,
    /// Re-fetch users from the API and overwrite the snapshot
    Refresh,
}
