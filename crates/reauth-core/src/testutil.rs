//! Mock collaborators for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use url::Url;

use crate::error::{Error, ProtocolError, TransportError};
use crate::traits::{RefreshInvoker, SessionListener, Transport};
use crate::types::{Method, Request, Response};
use crate::{AccessToken, Credential, RefreshToken, Result};

/// A credential whose access token is `access` and refresh token is
/// `refresh-<access>`.
pub fn credential(access: &str) -> Credential {
    Credential::new(
        AccessToken::new(access),
        RefreshToken::new(format!("refresh-{}", access)),
    )
}

pub fn request(method: Method, path: &str) -> Request {
    let url = Url::parse("https://api.example.com")
        .and_then(|base| base.join(path))
        .expect("valid test url");
    Request::new(method, url)
}

type Responder = Box<dyn Fn(&Request) -> Result<Response> + Send + Sync>;

/// Records every request it receives and answers through a responder.
pub struct MockTransport {
    sent: Mutex<Vec<Request>>,
    responder: Responder,
}

impl MockTransport {
    pub fn new(responder: impl Fn(&Request) -> Result<Response> + Send + Sync + 'static) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    /// Accepts requests bearing `token`, answers 401 to everything else.
    pub fn accepting(token: &str) -> Self {
        let expected = format!("Bearer {}", token);
        Self::new(move |request| {
            if request.header("authorization") == Some(expected.as_str()) {
                Ok(Response::new(200, Vec::new(), request.url().path().to_string()))
            } else {
                Err(ProtocolError::status(401).into())
            }
        })
    }

    pub fn sent(&self) -> Vec<Request> {
        self.sent.lock().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .map(|r| r.url().path().to_string())
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let outcome = (self.responder)(&request);
        self.sent.lock().push(request);
        outcome
    }
}

/// A refresh invoker that blocks until released and counts its calls.
pub struct GatedInvoker {
    calls: AtomicUsize,
    gate: Semaphore,
    outcome: Mutex<Option<Credential>>,
}

impl GatedInvoker {
    /// Succeeds with a credential for `access` once released.
    pub fn succeeding(access: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            gate: Semaphore::new(0),
            outcome: Mutex::new(Some(credential(access))),
        }
    }

    /// Fails with a transport error once released.
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            gate: Semaphore::new(0),
            outcome: Mutex::new(None),
        }
    }

    /// Let every pending and future refresh call complete.
    pub fn release(&self) {
        self.gate.add_permits(1024);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RefreshInvoker for GatedInvoker {
    async fn refresh(&self, _refresh_token: &RefreshToken) -> Result<Credential> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _permit = self.gate.acquire().await.map_err(|e| TransportError::Http {
            message: e.to_string(),
        })?;
        self.outcome.lock().clone().ok_or_else(|| {
            Error::Transport(TransportError::Connection {
                message: "connection refused".into(),
            })
        })
    }
}

#[derive(Default)]
pub struct CountingListener {
    count: AtomicUsize,
}

impl CountingListener {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl SessionListener for CountingListener {
    fn on_session_ended(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}
