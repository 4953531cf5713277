//! Session wiring: credential storage and the authenticated client.

mod storage;

use std::sync::Arc;

use anyhow::{Context, Result};

use reauth_core::traits::CredentialStore;
use reauth_core::{ApiUrl, AuthClient, CoordinatorConfig, SessionTerminator};
use reauth_file::FileCredentialStore;
use reauth_http::{ReqwestTransport, TokenEndpoint, TokenEndpointConfig};

use crate::cli::GlobalArgs;
use crate::output;

pub use storage::open_store;

/// Printed whenever the session is torn down.
fn announce_session_ended() {
    output::error("Session ended. Run 'reauth login' to sign in again.");
}

/// Build the token endpoint client from the global options.
pub fn token_endpoint(global: &GlobalArgs) -> Result<TokenEndpoint> {
    let token_url = global
        .token_url
        .as_deref()
        .context("No token endpoint configured. Pass --token-url or set REAUTH_TOKEN_URL.")?;
    let token_url = ApiUrl::new(token_url).context("Invalid token URL")?;
    let client_id = global
        .client_id
        .as_deref()
        .context("No client id configured. Pass --client-id or set REAUTH_CLIENT_ID.")?;
    let client_secret = global.client_secret.as_deref().context(
        "No client secret configured. Pass --client-secret or set REAUTH_CLIENT_SECRET.",
    )?;

    let config = TokenEndpointConfig::new(token_url, client_id, client_secret);
    TokenEndpoint::new(config).context("Failed to create token endpoint client")
}

/// Resolve the API base URL from the global options.
pub fn api_url(global: &GlobalArgs) -> Result<ApiUrl> {
    let url = global
        .api_url
        .as_deref()
        .context("No API URL configured. Pass --api-url or set REAUTH_API_URL.")?;
    ApiUrl::new(url).context("Invalid API URL")
}

/// Build an [`AuthClient`] over the persisted credential.
pub fn auth_client(global: &GlobalArgs, store: Arc<FileCredentialStore>) -> Result<AuthClient> {
    let invoker = Arc::new(token_endpoint(global)?);
    let transport = Arc::new(ReqwestTransport::new().context("Failed to create HTTP client")?);
    let config = CoordinatorConfig {
        replay_policy: global.replay_policy,
        ..Default::default()
    };

    Ok(AuthClient::with_config(
        transport,
        invoker,
        store,
        Arc::new(announce_session_ended),
        config,
    ))
}

/// A terminator for commands that end the session without sending requests.
pub fn terminator(store: Arc<dyn CredentialStore>) -> SessionTerminator {
    SessionTerminator::new(store, Arc::new(announce_session_ended))
}
