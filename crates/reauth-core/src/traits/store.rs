//! Credential store trait.

use crate::{Credential, Result};

/// Storage for the current credential pair.
///
/// Implementations must be synchronous and low-latency: the coordinator
/// calls them on its completion path and never awaits them.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored credential, if any.
    fn get(&self) -> Result<Option<Credential>>;

    /// Replace the stored credential.
    fn set(&self, credential: &Credential) -> Result<()>;

    /// Remove the stored credential. Clearing an empty store is not an error.
    fn clear(&self) -> Result<()>;
}
