//! Usage: Session-expiry collaborator invoked when a 401 cannot be recovered by refresh.

use crate::infra::credential_store::CredentialStore;
use std::sync::Arc;

/// Called synchronously, with no arguments, when the session is unrecoverable.
/// The client does not wait on or inspect anything the handler does.
pub trait SessionExpiredHandler: Send + Sync {
    fn on_session_expired(&self);
}

impl<F> SessionExpiredHandler for F
where
    F: Fn() + Send + Sync,
{
    fn on_session_expired(&self) {
        self()
    }
}

/// Default handler: only records the expiry.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlySessionHandler;

impl SessionExpiredHandler for LogOnlySessionHandler {
    fn on_session_expired(&self) {
        tracing::warn!("session expired; no logout handler installed");
    }
}

type Navigator = dyn Fn(&str) + Send + Sync;

/// Clears stored credentials and sends the user agent to the login surface.
pub struct LogoutRedirect {
    store: Arc<dyn CredentialStore>,
    login_path: String,
    navigate: Box<Navigator>,
}

impl LogoutRedirect {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        login_path: impl Into<String>,
        navigate: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        Self {
            store,
            login_path: login_path.into(),
            navigate: Box::new(navigate),
        }
    }
}

impl SessionExpiredHandler for LogoutRedirect {
    fn on_session_expired(&self) {
        if let Err(err) = self.store.clear_session() {
            tracing::warn!("failed to clear session credentials on logout: {}", err);
        }
        tracing::info!(login_path = %self.login_path, "session expired; redirecting to login");
        (self.navigate)(self.login_path.as_str());
    }
}
