use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "goodnight")]
#[command(about = "Log bedtimes to a log shared by two")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// CLI profile name for auth/sync configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Use a throwaway in-memory log instead of the database
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log a bedtime now (default)
    #[command(alias = "add")]
    Sleep,
    /// List the log grouped by date
    #[command(alias = "ls")]
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a record
    #[command(alias = "rm")]
    Delete {
        /// Record ID or unique ID prefix
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Follow the log live until Ctrl-C
    Watch {
        /// Seconds between replica refreshes
        #[arg(long, default_value = "10", value_name = "SECS")]
        interval: u64,
    },
    /// Show or change who this device logs as
    Identity {
        #[command(subcommand)]
        command: IdentityCommands,
    },
    /// Inspect or end the anonymous session
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Configure CLI profiles
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
pub enum IdentityCommands {
    /// Print the chosen label
    Show,
    /// Choose the label records from this device carry
    Choose {
        /// `spouse-A` or `spouse-B` (`a`/`b` also work)
        label: String,
    },
    /// Forget the chosen label
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Show which anonymous user this profile logs as
    Show,
    /// Sign out and forget the stored session
    SignOut,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Supabase project URL
        #[arg(long, value_name = "URL")]
        supabase_url: Option<String>,
        /// Supabase anon/public key
        #[arg(long, value_name = "KEY")]
        supabase_anon_key: Option<String>,
        /// Turso database URL (e.g. libsql://goodnight.turso.io)
        #[arg(long, value_name = "URL")]
        turso_url: Option<String>,
        /// Turso auth token
        #[arg(long, value_name = "TOKEN")]
        turso_token: Option<String>,
        /// Table holding the shared log
        #[arg(long, value_name = "NAME")]
        collection: Option<String>,
        /// Locale for date/time strings (zh-TW or en-US)
        #[arg(long, value_name = "LOCALE")]
        locale: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Print the effective configuration
    Show,
}
