//! Boundaries between the coordinator and its collaborators.

mod invoker;
mod listener;
mod store;
mod transport;

pub use invoker::RefreshInvoker;
pub use listener::SessionListener;
pub use store::CredentialStore;
pub use transport::Transport;
