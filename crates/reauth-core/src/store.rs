//! In-memory credential store.

use parking_lot::Mutex;

use crate::traits::CredentialStore;
use crate::{Credential, Result};

/// A credential store that lives only as long as the process.
///
/// Useful for tests and for hosts that persist credentials elsewhere.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `credential`.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: Mutex::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<Option<Credential>> {
        Ok(self.credential.lock().clone())
    }

    fn set(&self, credential: &Credential) -> Result<()> {
        *self.credential.lock() = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.credential.lock().take();
        Ok(())
    }
}
