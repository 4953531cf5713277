//! Refresh command implementation.

use anyhow::{Context, Result};
use clap::Args;

use reauth_core::{AuthError, Error};
use reauth_core::traits::{CredentialStore, RefreshInvoker};

use crate::cli::GlobalArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct RefreshArgs {}

pub async fn run(_args: RefreshArgs, global: &GlobalArgs) -> Result<()> {
    let store = session::open_store(global)?;
    let current = store
        .get()
        .context("Failed to load credential")?
        .context("No active session. Run 'reauth login' first.")?;
    let endpoint = session::token_endpoint(global)?;

    output::note("Refreshing session...");

    let credential = match endpoint.refresh(current.refresh_token()).await {
        Ok(credential) => credential,
        Err(Error::Auth(AuthError::RefreshTokenInvalid)) => {
            // The stored credential can never be refreshed again
            session::terminator(store).terminate();
            anyhow::bail!("Refresh token was rejected");
        }
        Err(e) => return Err(e).context("Failed to refresh session"),
    };

    store
        .set(&credential)
        .context("Failed to save refreshed credential")?;

    output::success("Session refreshed successfully");
    output::field(
        "Access token",
        &output::redact(credential.access_token().as_str()),
    );

    Ok(())
}
