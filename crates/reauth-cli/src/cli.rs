//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser};

use reauth_core::ReplayPolicy;

use crate::commands::Command;

/// Log in to an OAuth2 API and send requests that survive token expiry.
#[derive(Parser, Debug)]
#[command(name = "reauth")]
#[command(author, version = env!("REAUTH_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection settings shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Base URL that request paths are resolved against
    #[arg(long, env = "REAUTH_API_URL", global = true)]
    pub api_url: Option<String>,

    /// OAuth2 token endpoint
    #[arg(long, env = "REAUTH_TOKEN_URL", global = true)]
    pub token_url: Option<String>,

    /// OAuth2 client id
    #[arg(long, env = "REAUTH_CLIENT_ID", global = true)]
    pub client_id: Option<String>,

    /// OAuth2 client secret
    #[arg(long, env = "REAUTH_CLIENT_SECRET", global = true, hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Credential file (defaults to the user data directory)
    #[arg(long, env = "REAUTH_CREDENTIALS_FILE", global = true)]
    pub credentials_file: Option<PathBuf>,

    /// Which requests may be replayed after a token refresh
    #[arg(long, default_value_t = ReplayPolicy::All, global = true)]
    pub replay_policy: ReplayPolicy,
}
