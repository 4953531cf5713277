//! Single-flight token refresh.
//!
//! Requests rejected with 401 are parked in a FIFO queue. The first parked
//! request of an episode starts exactly one refresh call on a background
//! task; requests arriving while it runs join the same episode. When the
//! refresh completes, the queue is swapped out under the same lock that
//! guards the in-flight flag, so no request can slip in between the drain
//! and the flag reset.
//!
//! The lock is only ever held for O(1) bookkeeping. The refresh call and
//! the replays run with the lock released.

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::join_all;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::config::CoordinatorConfig;
use crate::error::{AuthError, TransportError};
use crate::pending::{PendingRequest, ResultSink};
use crate::replayer::RequestReplayer;
use crate::terminator::SessionTerminator;
use crate::traits::{CredentialStore, RefreshInvoker, Transport};
use crate::types::Request;
use crate::{Credential, Result};

/// Deduplicates concurrent refresh triggers and fans out the result.
///
/// Cheap to clone; clones share the same queue and in-flight flag.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn CredentialStore>,
    invoker: Arc<dyn RefreshInvoker>,
    terminator: Arc<SessionTerminator>,
    replayer: RequestReplayer,
    runtime: Option<Handle>,
    state: Mutex<RefreshState>,
}

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    queue: VecDeque<PendingRequest>,
    episodes: u64,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        invoker: Arc<dyn RefreshInvoker>,
        transport: Arc<dyn Transport>,
        terminator: Arc<SessionTerminator>,
        config: CoordinatorConfig,
    ) -> Self {
        let replayer = RequestReplayer::new(transport, terminator.clone(), config.replay_policy);
        let runtime = config.runtime.or_else(|| Handle::try_current().ok());
        Self {
            inner: Arc::new(Inner {
                store,
                invoker,
                terminator,
                replayer,
                runtime,
                state: Mutex::new(RefreshState::default()),
            }),
        }
    }

    /// Park a request that failed with 401 until a refresh resolves it.
    ///
    /// Returns immediately. The outcome (replay result or terminal
    /// [`AuthError::SessionExpired`]) is delivered through `sink`.
    ///
    /// May be called from async tasks or plain threads. The refresh task is
    /// spawned on the runtime the coordinator was built on (or the one in
    /// [`CoordinatorConfig::runtime`]); without either, the caller's runtime
    /// is used. If no runtime is reachable at all the request is rejected.
    pub fn handle_auth_failure(&self, request: Request, sink: ResultSink) {
        let Some(runtime) = self
            .inner
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
        else {
            error!("No Tokio runtime available to run the token refresh");
            PendingRequest::new(request, sink).reject(TransportError::Http {
                message: "no Tokio runtime available to run the token refresh".to_string(),
            });
            return;
        };

        let generation = self.inner.terminator.generation();
        let start = {
            let mut state = self.inner.state.lock();
            state.queue.push_back(PendingRequest::new(request, sink));
            if state.in_flight {
                debug!(queued = state.queue.len(), "Joining in-flight refresh");
                false
            } else {
                state.in_flight = true;
                state.episodes += 1;
                true
            }
        };

        if start {
            let inner = Arc::clone(&self.inner);
            runtime.spawn(async move { inner.run_episode(generation).await });
        }
    }

    /// Returns true while a refresh call is outstanding.
    pub fn is_refreshing(&self) -> bool {
        self.inner.state.lock().in_flight
    }

    /// Number of requests waiting for the current refresh.
    pub fn queued(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// Number of refresh episodes started so far.
    pub fn episodes(&self) -> u64 {
        self.inner.state.lock().episodes
    }
}

impl Inner {
    async fn run_episode(self: Arc<Self>, generation: u64) {
        match self.obtain_credential().await {
            Ok(credential) => {
                match self.terminator.renew(generation, &credential) {
                    Ok(true) => {}
                    Ok(false) => {
                        let drained = self.drain();
                        info!(
                            count = drained.len(),
                            "Session ended during refresh, rejecting queued requests"
                        );
                        for pending in drained {
                            pending.reject(AuthError::SessionExpired);
                        }
                        return;
                    }
                    Err(e) => error!(error = %e, "Failed to persist refreshed credential"),
                }

                let drained = self.drain();
                info!(count = drained.len(), "Token refreshed, replaying queued requests");

                // join_all polls in queue order, so replays reach the
                // transport FIFO even though they complete independently.
                join_all(
                    drained
                        .into_iter()
                        .map(|pending| self.replayer.replay(pending, &credential)),
                )
                .await;
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, ending session");
                let drained = self.drain();
                self.terminator.terminate();
                for pending in drained {
                    pending.reject(AuthError::SessionExpired);
                }
            }
        }
    }

    async fn obtain_credential(&self) -> Result<Credential> {
        let current = self.store.get()?.ok_or(AuthError::RefreshTokenInvalid)?;

        info!("Refreshing access token");
        AssertUnwindSafe(self.invoker.refresh(current.refresh_token()))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                Err(TransportError::Http {
                    message: "refresh invoker panicked".to_string(),
                }
                .into())
            })
    }

    /// Clear the in-flight flag and take the queue in one critical section.
    fn drain(&self) -> VecDeque<PendingRequest> {
        let mut state = self.state.lock();
        state.in_flight = false;
        std::mem::take(&mut state.queue)
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("RefreshCoordinator")
            .field("in_flight", &state.in_flight)
            .field("queued", &state.queue.len())
            .field("episodes", &state.episodes)
            .finish()
    }
}
