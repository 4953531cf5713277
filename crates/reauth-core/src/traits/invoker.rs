//! Refresh invoker trait.

use async_trait::async_trait;

use crate::{Credential, RefreshToken, Result};

/// Exchanges a refresh token for a new credential pair.
///
/// Wire details (endpoint, client authentication, grant type, timeouts)
/// belong to the implementation.
#[async_trait]
pub trait RefreshInvoker: Send + Sync {
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<Credential>;
}
