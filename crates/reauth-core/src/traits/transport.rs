//! HTTP transport trait.

use async_trait::async_trait;

use crate::Result;
use crate::types::{Request, Response};

/// Issues requests to the network.
///
/// A non-success HTTP status is reported as [`crate::Error::Protocol`]
/// carrying the status code, so that callers can tell authorization
/// failures from everything else.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response>;
}
