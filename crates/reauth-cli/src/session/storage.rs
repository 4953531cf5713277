//! Location of the persisted credential.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use reauth_file::FileCredentialStore;

use crate::cli::GlobalArgs;

/// Get the credential file path.
fn credentials_path(global: &GlobalArgs) -> Result<PathBuf> {
    if let Some(path) = &global.credentials_file {
        return Ok(path.clone());
    }

    let dirs =
        ProjectDirs::from("", "", "reauth").context("Could not determine data directory")?;
    Ok(dirs.data_dir().join("credentials.json"))
}

/// Open the file-backed credential store.
pub fn open_store(global: &GlobalArgs) -> Result<Arc<FileCredentialStore>> {
    let path = credentials_path(global)?;
    tracing::debug!(path = %path.display(), "Using credential file");
    Ok(Arc::new(FileCredentialStore::new(path)))
}
