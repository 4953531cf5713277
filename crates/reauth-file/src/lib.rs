//! reauth-file - file-backed credential store.

mod store;

pub use store::FileCredentialStore;
