//! reauth-http - reqwest-backed transport and OAuth2 token endpoint.

mod endpoint;
mod error;
mod transport;

pub use endpoint::{TokenEndpoint, TokenEndpointConfig};
pub use transport::ReqwestTransport;

/// User agent sent with every request.
pub(crate) const USER_AGENT: &str = concat!("reauth/", env!("CARGO_PKG_VERSION"));
