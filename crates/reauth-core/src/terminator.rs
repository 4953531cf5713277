//! Session teardown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::traits::{CredentialStore, SessionListener};
use crate::{Credential, Result};

/// Clears credentials and announces the end of a session.
///
/// Termination happens at most once per episode: the first call clears the
/// store and notifies the listener, later calls are no-ops until a new
/// credential is installed and [`SessionTerminator::arm`] starts the next
/// episode.
///
/// Every termination and every new login advances the session generation.
/// A refresh that was started under an older generation must not install
/// its credential; [`SessionTerminator::renew`] enforces that atomically
/// with respect to [`SessionTerminator::terminate`].
pub struct SessionTerminator {
    store: Arc<dyn CredentialStore>,
    listener: Arc<dyn SessionListener>,
    ended: AtomicBool,
    generation: Mutex<u64>,
}

impl SessionTerminator {
    pub fn new(store: Arc<dyn CredentialStore>, listener: Arc<dyn SessionListener>) -> Self {
        Self {
            store,
            listener,
            ended: AtomicBool::new(false),
            generation: Mutex::new(0),
        }
    }

    /// Start a new session episode.
    pub fn arm(&self) {
        self.ended.store(false, Ordering::Release);
    }

    /// Current session generation.
    pub fn generation(&self) -> u64 {
        *self.generation.lock()
    }

    /// Install a credential from a fresh login and start a new session.
    pub fn begin(&self, credential: &Credential) -> Result<()> {
        let mut generation = self.generation.lock();
        self.store.set(credential)?;
        *generation += 1;
        self.arm();
        Ok(())
    }

    /// Install a refreshed credential if the session is still `generation`.
    ///
    /// Returns `Ok(false)` without touching the store when the session was
    /// terminated or replaced since the refresh started. A store failure is
    /// returned after the episode has been re-armed, so the caller may keep
    /// using the credential in memory.
    pub fn renew(&self, generation: u64, credential: &Credential) -> Result<bool> {
        let current = self.generation.lock();
        if *current != generation {
            debug!(
                started = generation,
                current = *current,
                "Discarding credential refreshed for an ended session"
            );
            return Ok(false);
        }
        let stored = self.store.set(credential);
        self.arm();
        stored.map(|()| true)
    }

    /// End the current session.
    ///
    /// Returns `true` if this call performed the termination.
    pub fn terminate(&self) -> bool {
        {
            let mut generation = self.generation.lock();
            if self.ended.swap(true, Ordering::AcqRel) {
                debug!("Session already terminated");
                return false;
            }

            info!("Terminating session");
            *generation += 1;
            if let Err(e) = self.store.clear() {
                warn!(error = %e, "Failed to clear credential store");
            }
        }
        self.listener.on_session_ended();
        true
    }

    /// Returns true if the current episode has ended.
    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for SessionTerminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTerminator")
            .field("ended", &self.is_ended())
            .field("generation", &self.generation())
            .finish()
    }
}
