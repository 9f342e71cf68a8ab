use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use thankful_core::NoteKind;

#[derive(Parser)]
#[command(name = "thankful")]
#[command(about = "Gratitude, sermon, and prayer journaling from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// CLI profile name for backend configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Treat the device as disconnected (notes are captured to the vault)
    #[arg(long, global = true)]
    pub offline: bool,

    /// Quick capture: thankful "grateful for morning coffee"
    #[arg(trailing_var_arg = true)]
    pub note: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new journal entry
    #[command(alias = "new")]
    Add {
        /// Entry kind
        #[arg(long, value_enum, default_value_t = KindArg::Gratitude)]
        kind: KindArg,
        /// Entry title (defaults to the first content line)
        #[arg(long)]
        title: Option<String>,
        /// Share the entry with the community
        #[arg(long)]
        public: bool,
        /// Entry content
        content: Vec<String>,
    },
    /// List journal entries
    List {
        /// Filter by entry kind
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        /// Only favorites
        #[arg(long)]
        favorites: bool,
        /// Filter by tag name
        #[arg(long)]
        tag: Option<String>,
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an entry's content in $EDITOR
    Edit {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Delete an entry
    Delete {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Toggle an entry's favorite flag
    Favorite {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Inspect or push the pending-sync ledger
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
    /// Account management
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Show the signed-in user's profile
    Profile,
    /// Show journaling streaks
    Streaks {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Per-user settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// List your prayer requests
    Prayers {
        /// Number of requests to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Browse community note templates
    Templates {
        /// Filter by entry kind
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
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
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Show how many offline mutations are waiting to upload
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replay the pending-sync ledger against the remote store
    Push {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Register a new account
    Signup {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
        /// Display name stored on the profile
        #[arg(long, value_name = "NAME")]
        display_name: Option<String>,
    },
    /// Sign in with email/password and store the session in the keychain
    Login {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Show auth status for the profile
    Status {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
    /// Sign out and clear the stored session
    Logout {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
    /// Send a password-reset email
    ResetPassword {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
    },
    /// Sign in with Google OAuth
    Google {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Redirect URL the browser should land on
        #[arg(long, value_name = "URL")]
        redirect_to: Option<String>,
        /// Paste the callback URL (or its fragment) to finish the flow
        #[arg(long, value_name = "URL")]
        callback: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show the per-user settings row
    Show,
    /// Change the preferred locale
    SetLocale {
        /// Locale code, e.g. en or es
        locale: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Backend project URL
        #[arg(long, value_name = "URL")]
        supabase_url: Option<String>,
        /// Backend anon/public key
        #[arg(long, value_name = "KEY")]
        supabase_anon_key: Option<String>,
        /// Preferred locale code
        #[arg(long, value_name = "CODE")]
        locale: Option<String>,
        /// Directory for the offline vault
        #[arg(long, value_name = "PATH")]
        data_dir: Option<PathBuf>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum KindArg {
    Gratitude,
    Sermon,
    Prayer,
}

impl From<KindArg> for NoteKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Gratitude => Self::Gratitude,
            KindArg::Sermon => Self::Sermon,
            KindArg::Prayer => Self::Prayer,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
