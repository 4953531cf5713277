//! Subcommand implementations.

mod login;
mod logout;
mod refresh;
mod request;
mod whoami;

use anyhow::Result;
use clap::Subcommand;

use crate::cli::GlobalArgs;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in with a username and password
    Login(login::LoginArgs),

    /// End the session and delete the stored credential
    Logout(logout::LogoutArgs),

    /// Display the stored session
    Whoami(whoami::WhoamiArgs),

    /// Exchange the refresh token for a new credential
    Refresh(refresh::RefreshArgs),

    /// Send an authenticated request, refreshing the token if it expired
    Request(request::RequestArgs),
}

pub async fn handle(cmd: Command, global: &GlobalArgs) -> Result<()> {
    match cmd {
        Command::Login(args) => login::run(args, global).await,
        Command::Logout(args) => logout::run(args, global).await,
        Command::Whoami(args) => whoami::run(args, global).await,
        Command::Refresh(args) => refresh::run(args, global).await,
        Command::Request(args) => request::run(args, global).await,
    }
}
