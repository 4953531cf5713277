//! Session notification trait.

/// Receives the "session ended" notification, e.g. to navigate to a login
/// view or print a hint to re-authenticate.
pub trait SessionListener: Send + Sync {
    fn on_session_ended(&self);
}

impl<F> SessionListener for F
where
    F: Fn() + Send + Sync,
{
    fn on_session_ended(&self) {
        self()
    }
}
