//! Requests parked while a refresh is in flight.

use tokio::sync::oneshot;
use tracing::debug;

use crate::Result;
use crate::error::Error;
use crate::types::{Request, Response};

/// The one-shot channel an original caller waits on.
pub type ResultSink = oneshot::Sender<Result<Response>>;

/// A request that failed authorization, together with its caller's sink.
#[derive(Debug)]
pub struct PendingRequest {
    request: Request,
    sink: ResultSink,
}

impl PendingRequest {
    pub fn new(request: Request, sink: ResultSink) -> Self {
        Self { request, sink }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Returns true if the caller stopped waiting for the result.
    pub fn is_abandoned(&self) -> bool {
        self.sink.is_closed()
    }

    /// Deliver the outcome to the caller, consuming the entry.
    pub fn complete(self, outcome: Result<Response>) {
        if self.sink.send(outcome).is_err() {
            debug!(
                method = %self.request.method(),
                url = %self.request.url(),
                "Caller dropped before result was delivered"
            );
        }
    }

    /// Deliver an error to the caller.
    pub fn reject(self, error: impl Into<Error>) {
        self.complete(Err(error.into()));
    }
}
