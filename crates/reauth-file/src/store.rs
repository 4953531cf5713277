//! Credential persistence on the local filesystem.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use reauth_core::Result;
use reauth_core::error::{Error, StoreError};
use reauth_core::traits::CredentialStore;
use reauth_core::{AccessToken, Credential, RefreshToken};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

fn map_io(err: std::io::Error) -> Error {
    Error::Store(StoreError::Io {
        message: err.to_string(),
    })
}

/// On-disk representation of a credential.
#[derive(Serialize, Deserialize)]
struct StoredCredential {
    access_token: String,
    refresh_token: String,
}

/// Stores the credential pair as a single JSON file.
///
/// Both tokens live in one file that is replaced atomically (write to a
/// temporary file, then rename), so readers never observe one token
/// without the other. Access from concurrent processes is serialized with
/// an advisory lock on a sibling `.lock` file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store backed by the file at `path`.
    ///
    /// The file and its parent directories are created on first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the credential file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }

    /// Run `f` while holding the store lock.
    fn with_lock<T>(&self, exclusive: bool, f: impl FnOnce() -> Result<T>) -> Result<T> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(map_io)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(map_io)?;

        if exclusive {
            lock_file.lock_exclusive().map_err(map_io)?;
        } else {
            lock_file.lock_shared().map_err(map_io)?;
        }

        let result = f();
        FileExt::unlock(&lock_file).map_err(map_io)?;
        result
    }

    fn read(&self) -> Result<Option<Credential>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).map_err(map_io)?;
        let stored: StoredCredential = serde_json::from_str(&content).map_err(|e| {
            Error::Store(StoreError::Corrupt {
                message: e.to_string(),
            })
        })?;

        Ok(Some(Credential::new(
            AccessToken::new(stored.access_token),
            RefreshToken::new(stored.refresh_token),
        )))
    }

    fn write(&self, credential: &Credential) -> Result<()> {
        let stored = StoredCredential {
            access_token: credential.access_token().as_str().to_string(),
            refresh_token: credential.refresh_token().as_str().to_string(),
        };
        let json = serde_json::to_string_pretty(&stored).map_err(|e| {
            Error::Store(StoreError::Corrupt {
                message: e.to_string(),
            })
        })?;

        let temp_path = self.temp_path();
        let mut options = OpenOptions::new();
        options.create(true).write(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file: File = options.open(&temp_path).map_err(map_io)?;
        file.write_all(json.as_bytes()).map_err(map_io)?;
        file.sync_all().map_err(map_io)?;
        drop(file);

        // mode() only applies on create; a leftover temp file keeps its old mode
        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&temp_path).map_err(map_io)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&temp_path, perms).map_err(map_io)?;
        }

        fs::rename(&temp_path, &self.path).map_err(map_io)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Result<Option<Credential>> {
        self.with_lock(false, || self.read())
    }

    #[instrument(skip(self, credential), fields(path = %self.path.display()))]
    fn set(&self, credential: &Credential) -> Result<()> {
        self.with_lock(true, || self.write(credential))?;
        debug!("Stored credential");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn clear(&self) -> Result<()> {
        self.with_lock(true, || {
            if self.path.exists() {
                fs::remove_file(&self.path).map_err(map_io)?;
                debug!("Removed credential file");
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn credential(access: &str, refresh: &str) -> Credential {
        Credential::new(AccessToken::new(access), RefreshToken::new(refresh))
    }

    #[test]
    fn empty_store_has_no_credential() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn credential_survives_reopening() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("credentials.json");

        FileCredentialStore::new(&path)
            .set(&credential("access-1", "refresh-1"))
            .unwrap();

        let reopened = FileCredentialStore::new(&path);
        assert_eq!(
            reopened.get().unwrap(),
            Some(credential("access-1", "refresh-1"))
        );
    }

    #[test]
    fn set_replaces_both_tokens() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));

        store.set(&credential("access-1", "refresh-1")).unwrap();
        store.set(&credential("access-2", "refresh-2")).unwrap();

        assert_eq!(
            store.get().unwrap(),
            Some(credential("access-2", "refresh-2"))
        );
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn file_is_keyed_by_token_names() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        store.set(&credential("a", "r")).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["access_token"], "a");
        assert_eq!(raw["refresh_token"], "r");
    }

    #[test]
    fn clear_removes_file_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));

        store.set(&credential("a", "r")).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();

        assert!(!store.path().exists());
        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, r#"{"access_token": "only-one"}"#).unwrap();

        let err = FileCredentialStore::new(&path).get().unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::Corrupt { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn credential_file_is_private() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        store.set(&credential("a", "r")).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
