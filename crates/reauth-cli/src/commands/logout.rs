//! Logout command implementation.

use anyhow::{Context, Result};
use clap::Args;

use reauth_core::traits::CredentialStore;

use crate::cli::GlobalArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(_args: LogoutArgs, global: &GlobalArgs) -> Result<()> {
    let store = session::open_store(global)?;

    if store.get().context("Failed to load credential")?.is_none() {
        output::note("No active session.");
        return Ok(());
    }

    session::terminator(store).terminate();
    output::success("Logged out");

    Ok(())
}
