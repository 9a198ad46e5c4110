use clap::{Parser, Subcommand, ValueEnum};
use jotter_core::Visibility;

#[derive(Parser)]
#[command(name = "jotter")]
#[command(about = "Take notes from the terminal, online or off")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend base URL (overrides config and JOTTER_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Directory holding the local queue, cache and session
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with email and password
    Login {
        email: String,
        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account and sign in
    Register {
        email: String,
        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out and wipe local notes and pending changes
    Logout,
    /// List notes
    List {
        /// Search text
        #[arg(short, long)]
        query: Option<String>,
        /// Only show notes with this visibility
        #[arg(long, value_enum)]
        visibility: Option<VisibilityArg>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a note with its markdown content
    Show {
        /// Note ID or unique ID prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a note
    #[command(alias = "new")]
    Add {
        title: String,
        /// Markdown content (read from piped stdin when omitted)
        #[arg(short, long)]
        content: Option<String>,
        /// Comma-separated tags
        #[arg(short, long, value_name = "TAGS")]
        tags: Option<String>,
        #[arg(long, value_enum, default_value_t = VisibilityArg::Private)]
        visibility: VisibilityArg,
    },
    /// Edit a note
    Edit {
        /// Note ID or unique ID prefix
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        content: Option<String>,
        /// Comma-separated tags (replaces existing tags)
        #[arg(short, long, value_name = "TAGS")]
        tags: Option<String>,
        #[arg(long, value_enum)]
        visibility: Option<VisibilityArg>,
    },
    /// Delete a note
    Delete {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Replay pending changes against the backend
    Sync,
    /// Show session, connectivity and queue status
    Status {
        #[arg(long)]
        json: bool,
    },
    /// List pending changes
    Queue {
        #[arg(long)]
        json: bool,
    },
    /// Inspect or update client configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Persist the backend base URL
    SetApiUrl { url: String },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum VisibilityArg {
    Private,
    Shared,
    Public,
}

impl From<VisibilityArg> for Visibility {
    fn from(value: VisibilityArg) -> Self {
        match value {
            VisibilityArg::Private => Self::Private,
            VisibilityArg::Shared => Self::Shared,
            VisibilityArg::Public => Self::Public,
        }
    }
}
