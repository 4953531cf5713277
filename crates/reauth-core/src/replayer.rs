//! Re-issuing requests with a refreshed credential.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::config::ReplayPolicy;
use crate::error::AuthError;
use crate::pending::PendingRequest;
use crate::terminator::SessionTerminator;
use crate::traits::Transport;
use crate::{Credential, Result};
use crate::types::{Request, Response};

/// Replays parked requests and forwards each outcome to its caller.
pub struct RequestReplayer {
    transport: Arc<dyn Transport>,
    terminator: Arc<SessionTerminator>,
    policy: ReplayPolicy,
}

impl RequestReplayer {
    pub fn new(
        transport: Arc<dyn Transport>,
        terminator: Arc<SessionTerminator>,
        policy: ReplayPolicy,
    ) -> Self {
        Self {
            transport,
            terminator,
            policy,
        }
    }

    /// Replay one request with `credential` and deliver the outcome.
    ///
    /// A replay rejected with 401 proves the fresh credential is unusable:
    /// the session is terminated and the caller gets
    /// [`AuthError::SessionExpired`] rather than a second refresh.
    #[instrument(skip_all, fields(method = %pending.request().method(), url = %pending.request().url()))]
    pub async fn replay(&self, pending: PendingRequest, credential: &Credential) {
        if pending.is_abandoned() {
            debug!("Caller abandoned request, skipping replay");
            return;
        }

        let method = pending.request().method();
        if self.policy == ReplayPolicy::IdempotentOnly && !method.is_idempotent() {
            debug!("Not replaying non-idempotent request");
            pending.reject(AuthError::ReplayRefused {
                method: method.to_string(),
            });
            return;
        }

        let replayed = pending.request().with_bearer(credential.access_token());
        let outcome = self.send(replayed).await;
        pending.complete(outcome);
    }

    async fn send(&self, request: Request) -> Result<Response> {
        match self.transport.send(request).await {
            Err(e) if e.is_auth_failure() => {
                warn!(error = %e, "Replayed request rejected with refreshed credential");
                self.terminator.terminate();
                Err(AuthError::SessionExpired.into())
            }
            outcome => outcome,
        }
    }
}

impl std::fmt::Debug for RequestReplayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestReplayer")
            .field("policy", &self.policy)
            .finish()
    }
}
