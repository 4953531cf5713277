//! Whoami command implementation.

use anyhow::{Context, Result};
use clap::Args;

use reauth_core::traits::CredentialStore;

use crate::cli::GlobalArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct WhoamiArgs {}

pub async fn run(_args: WhoamiArgs, global: &GlobalArgs) -> Result<()> {
    let store = session::open_store(global)?;
    let credential = store
        .get()
        .context("Failed to load credential")?
        .context("No active session. Run 'reauth login' first.")?;

    output::field("Credentials", &store.path().display().to_string());
    output::field(
        "Access token",
        &output::redact(credential.access_token().as_str()),
    );
    output::field(
        "Refresh token",
        &output::redact(credential.refresh_token().as_str()),
    );
    if let Some(api_url) = &global.api_url {
        output::field("API", api_url);
    }

    Ok(())
}
