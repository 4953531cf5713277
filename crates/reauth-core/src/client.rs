//! Authenticated request pipeline.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

use crate::config::CoordinatorConfig;
use crate::coordinator::RefreshCoordinator;
use crate::error::AuthError;
use crate::terminator::SessionTerminator;
use crate::traits::{CredentialStore, RefreshInvoker, SessionListener, Transport};
use crate::types::{Request, Response};
use crate::{Credential, Result};

/// Sends requests with the stored access token and transparently recovers
/// from expired tokens.
///
/// A request rejected with 401 is handed to the [`RefreshCoordinator`] and
/// the call resolves once the shared refresh has either replayed it or
/// ended the session. Every other failure is returned unchanged.
///
/// Cheap to clone; clones share the coordinator and the store.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use reauth_core::{AuthClient, MemoryCredentialStore, Request};
/// # use reauth_core::traits::{RefreshInvoker, Transport};
///
/// # async fn example(
/// #     transport: Arc<dyn Transport>,
/// #     invoker: Arc<dyn RefreshInvoker>,
/// #     url: url::Url,
/// # ) -> Result<(), reauth_core::Error> {
/// let store = Arc::new(MemoryCredentialStore::new());
/// let client = AuthClient::new(transport, invoker, store, Arc::new(|| {
///     eprintln!("session ended, please log in again");
/// }));
///
/// let response = client.send(Request::get(url)).await?;
/// println!("{}", response.text());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    terminator: Arc<SessionTerminator>,
    coordinator: RefreshCoordinator,
}

impl AuthClient {
    /// Create a client with the default [`CoordinatorConfig`].
    pub fn new(
        transport: Arc<dyn Transport>,
        invoker: Arc<dyn RefreshInvoker>,
        store: Arc<dyn CredentialStore>,
        listener: Arc<dyn SessionListener>,
    ) -> Self {
        Self::with_config(transport, invoker, store, listener, CoordinatorConfig::default())
    }

    pub fn with_config(
        transport: Arc<dyn Transport>,
        invoker: Arc<dyn RefreshInvoker>,
        store: Arc<dyn CredentialStore>,
        listener: Arc<dyn SessionListener>,
        config: CoordinatorConfig,
    ) -> Self {
        let terminator = Arc::new(SessionTerminator::new(store.clone(), listener));
        let coordinator = RefreshCoordinator::new(
            store.clone(),
            invoker,
            transport.clone(),
            terminator.clone(),
            config,
        );

        Self {
            inner: Arc::new(ClientInner {
                transport,
                store,
                terminator,
                coordinator,
            }),
        }
    }

    /// Install a freshly issued credential (e.g. after login) and start a
    /// new session episode.
    ///
    /// A refresh still running for the previous session will not overwrite
    /// this credential.
    pub fn begin_session(&self, credential: &Credential) -> Result<()> {
        self.inner.terminator.begin(credential)?;
        info!("Session started");
        Ok(())
    }

    /// End the session: clear the stored credential and notify the listener.
    ///
    /// Returns `false` if the session had already ended.
    pub fn logout(&self) -> bool {
        self.inner.terminator.terminate()
    }

    /// Returns the stored credential, if any.
    pub fn credential(&self) -> Result<Option<Credential>> {
        self.inner.store.get()
    }

    pub fn is_authenticated(&self) -> Result<bool> {
        Ok(self.inner.store.get()?.is_some())
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.inner.coordinator
    }

    /// Send a request with the current access token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotAuthenticated`] if no credential is stored
    /// - [`AuthError::SessionExpired`] if the token could not be refreshed,
    ///   or the refreshed token was rejected too
    /// - any other transport or protocol error, unchanged
    #[instrument(skip(self, request), fields(method = %request.method(), url = %request.url()))]
    pub async fn send(&self, request: Request) -> Result<Response> {
        let credential = self
            .inner
            .store
            .get()?
            .ok_or(AuthError::NotAuthenticated)?;

        let authed = request.with_bearer(credential.access_token());
        match self.inner.transport.send(authed).await {
            Err(e) if e.is_auth_failure() => {
                debug!("Access token rejected, waiting for refresh");
                let (sink, outcome) = oneshot::channel();
                self.inner.coordinator.handle_auth_failure(request, sink);
                await_outcome(outcome).await
            }
            outcome => outcome,
        }
    }
}

/// Wait for the coordinator's verdict on a parked request.
///
/// A sink dropped without an answer means the refresh episode died; the
/// request can no longer be completed, so it ends like a failed refresh.
async fn await_outcome(outcome: oneshot::Receiver<Result<Response>>) -> Result<Response> {
    outcome.await.unwrap_or_else(|_| {
        warn!("Refresh episode dropped a queued request");
        Err(AuthError::SessionExpired.into())
    })
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("coordinator", &self.inner.coordinator)
            .field("credential", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ProtocolError};
    use crate::store::MemoryCredentialStore;
    use crate::testutil::{CountingListener, GatedInvoker, MockTransport, credential, request};
    use crate::types::Method;

    fn client(
        transport: MockTransport,
        invoker: GatedInvoker,
    ) -> (
        AuthClient,
        Arc<MockTransport>,
        Arc<GatedInvoker>,
        Arc<MemoryCredentialStore>,
        Arc<CountingListener>,
    ) {
        let transport = Arc::new(transport);
        let invoker = Arc::new(invoker);
        let store = Arc::new(MemoryCredentialStore::with_credential(credential("old")));
        let listener = Arc::new(CountingListener::default());
        let client = AuthClient::new(
            transport.clone(),
            invoker.clone(),
            store.clone(),
            listener.clone(),
        );
        (client, transport, invoker, store, listener)
    }

    #[tokio::test]
    async fn valid_token_passes_straight_through() {
        let (client, transport, invoker, _, _) =
            client(MockTransport::accepting("old"), GatedInvoker::succeeding("new"));

        let response = client.send(request(Method::Get, "/faces")).await.unwrap();

        assert_eq!(response.text(), "/faces");
        assert_eq!(invoker.calls(), 0);
        assert_eq!(
            transport.sent()[0].header("authorization"),
            Some("Bearer old")
        );
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_request_replayed() {
        let (client, transport, invoker, store, _) =
            client(MockTransport::accepting("new"), GatedInvoker::succeeding("new"));
        invoker.release();

        let response = client.send(request(Method::Get, "/faces")).await.unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(invoker.calls(), 1);
        assert_eq!(transport.paths(), vec!["/faces", "/faces"]);
        assert_eq!(store.get().unwrap(), Some(credential("new")));

        // The next request uses the refreshed token directly.
        client.send(request(Method::Get, "/models")).await.unwrap();
        assert_eq!(invoker.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_sends_share_one_refresh() {
        let (client, _, invoker, _, _) =
            client(MockTransport::accepting("new"), GatedInvoker::succeeding("new"));

        let sends: Vec<_> = ["/a", "/b", "/c"]
            .into_iter()
            .map(|path| {
                let client = client.clone();
                tokio::spawn(async move { client.send(request(Method::Get, path)).await })
            })
            .collect();

        while client.coordinator().queued() < 3 {
            tokio::task::yield_now().await;
        }
        invoker.release();

        for send in sends {
            assert!(send.await.unwrap().is_ok());
        }
        assert_eq!(invoker.calls(), 1);
    }

    #[tokio::test]
    async fn non_auth_failure_does_not_refresh() {
        let transport = MockTransport::new(|_| Err(ProtocolError::status(500).into()));
        let (client, _, invoker, _, listener) = client(transport, GatedInvoker::succeeding("new"));

        let err = client.send(request(Method::Get, "/faces")).await.unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert_eq!(invoker.calls(), 0);
        assert_eq!(listener.count(), 0);
    }

    #[tokio::test]
    async fn unauthenticated_client_does_not_touch_network() {
        let (client, transport, _, store, _) =
            client(MockTransport::accepting("old"), GatedInvoker::succeeding("new"));
        store.clear().unwrap();

        let err = client.send(request(Method::Get, "/faces")).await.unwrap_err();

        assert!(matches!(err, Error::Auth(AuthError::NotAuthenticated)));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn failed_refresh_ends_session() {
        let (client, _, invoker, _, listener) =
            client(MockTransport::accepting("new"), GatedInvoker::failing());
        invoker.release();

        let err = client.send(request(Method::Get, "/faces")).await.unwrap_err();

        assert!(err.is_session_expired());
        assert_eq!(listener.count(), 1);
        assert!(!client.is_authenticated().unwrap());
    }

    #[tokio::test]
    async fn logout_and_new_session() {
        let (client, _, _, _, listener) =
            client(MockTransport::accepting("old"), GatedInvoker::succeeding("new"));

        assert!(client.logout());
        assert!(!client.logout());
        assert_eq!(listener.count(), 1);
        assert!(client.credential().unwrap().is_none());

        client.begin_session(&credential("old")).unwrap();
        assert!(client.is_authenticated().unwrap());
        assert!(client.send(request(Method::Get, "/faces")).await.is_ok());

        assert!(client.logout());
        assert_eq!(listener.count(), 2);
    }

    #[tokio::test]
    async fn logout_during_refresh_discards_refreshed_credential() {
        let (client, transport, invoker, store, listener) =
            client(MockTransport::accepting("new"), GatedInvoker::succeeding("new"));

        let send = {
            let client = client.clone();
            tokio::spawn(async move { client.send(request(Method::Get, "/a")).await })
        };
        while invoker.calls() < 1 {
            tokio::task::yield_now().await;
        }

        assert!(client.logout());
        invoker.release();

        let err = send.await.unwrap().unwrap_err();
        assert!(err.is_session_expired());
        assert!(store.get().unwrap().is_none());
        assert_eq!(listener.count(), 1);
        assert_eq!(transport.paths(), vec!["/a"]);
        assert!(!client.coordinator().is_refreshing());
    }

    #[tokio::test]
    async fn login_during_refresh_keeps_the_new_session() {
        let (client, _, invoker, store, listener) =
            client(MockTransport::accepting("new"), GatedInvoker::succeeding("new"));

        let send = {
            let client = client.clone();
            tokio::spawn(async move { client.send(request(Method::Get, "/a")).await })
        };
        while invoker.calls() < 1 {
            tokio::task::yield_now().await;
        }

        client.begin_session(&credential("login")).unwrap();
        invoker.release();

        assert!(send.await.unwrap().unwrap_err().is_session_expired());
        assert_eq!(store.get().unwrap(), Some(credential("login")));
        assert_eq!(listener.count(), 0);
    }

    #[tokio::test]
    async fn dropped_sink_is_terminal() {
        let (sink, outcome) = oneshot::channel();
        drop(sink);

        let err = await_outcome(outcome).await.unwrap_err();
        assert!(err.is_session_expired());
    }
}
