//! reauth-core - token-refresh coordination for HTTP clients.
//!
//! When an access token expires, every in-flight request fails with 401 at
//! roughly the same time. This crate makes sure exactly one refresh call
//! is made for all of them, replays each blocked request with the new
//! token, and tears the session down exactly once when the refresh fails.
//!
//! Collaborators are injected through the traits in [`traits`]: a
//! [`Transport`](traits::Transport), a
//! [`RefreshInvoker`](traits::RefreshInvoker), a
//! [`CredentialStore`](traits::CredentialStore) and a
//! [`SessionListener`](traits::SessionListener).

pub mod client;
pub mod config;
pub mod coordinator;
pub mod credentials;
pub mod error;
pub mod pending;
pub mod replayer;
pub mod store;
pub mod terminator;
pub mod tokens;
pub mod traits;
pub mod types;

#[cfg(test)]
mod testutil;

pub use client::AuthClient;
pub use config::{CoordinatorConfig, ReplayPolicy};
pub use coordinator::RefreshCoordinator;
pub use credentials::LoginCredentials;
pub use error::{AuthError, Error};
pub use pending::{PendingRequest, ResultSink};
pub use replayer::RequestReplayer;
pub use store::MemoryCredentialStore;
pub use terminator::SessionTerminator;
pub use tokens::{AccessToken, Credential, RefreshToken};
pub use types::{ApiUrl, Method, Request, Response};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
