use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Clone, PartialEq, Eq, Debug, Subcommand)]
pub enum Command {
    /// Browse the feed (default)
    Feed,
    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "GRAMTUI_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "GRAMTUI_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show a profile, your own by default
    Profile {
        id: Option<String>,
    },
    /// List suggested users to follow
    Suggested,
    /// Follow a user, or unfollow if already following
    Follow {
        id: String,
    },
    /// Update bio, gender or profile picture
    EditProfile {
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        /// Image file to upload as the new profile picture
        #[arg(long)]
        picture: Option<PathBuf>,
    },
}

#[derive(Parser, Debug, Default)]
#[command(about = concat!(env!("CARGO_CRATE_NAME"), " - terminal client for a photo-sharing feed"))]
pub struct Flags {
    /// Backend API root, overrides the config file
    #[arg(long, env = "GRAMTUI_API_URL", global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Flags {
    /// Parse from `std::env::args_os()`, [exit][clap::Error::exit] on error.
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// The subcommand to run; the feed when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Feed)
    }
}
