//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;

use reauth_core::LoginCredentials;

use crate::cli::GlobalArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account username
    #[arg(long)]
    pub username: String,

    /// Account password
    #[arg(long, env = "REAUTH_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(args: LoginArgs, global: &GlobalArgs) -> Result<()> {
    let endpoint = session::token_endpoint(global)?;
    let credentials = LoginCredentials::new(&args.username, &args.password);

    output::note("Logging in...");

    let credential = endpoint
        .login(&credentials)
        .await
        .context("Failed to login")?;

    let store = session::open_store(global)?;
    let client = session::auth_client(global, store.clone())?;
    client
        .begin_session(&credential)
        .context("Failed to save credential")?;

    output::success("Logged in successfully");
    println!();
    output::field("User", &args.username);
    output::field("Credentials", &store.path().display().to_string());

    Ok(())
}
