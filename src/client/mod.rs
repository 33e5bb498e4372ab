//! Usage: Authenticated API client (bearer injection, in-flight dedup, refresh-and-retry on 401).
//!
//! Every call runs the same pipeline:
//! `intercept_request` -> transport (raced against cancellation) -> `intercept_response`,
//! looping at most once more when a 401 is recovered by a token refresh.

pub(crate) mod context;
pub(crate) mod exclusion;
pub(crate) mod identity;
pub(crate) mod inflight;
pub(crate) mod refresh;
pub(crate) mod request;
mod request_interceptor;
mod response_interceptor;
pub(crate) mod session;
pub(crate) mod transport;


use crate::infra::config::ClientConfig;
use crate::infra::credential_store::CredentialStore;
use crate::shared::error::{ClientError, ClientResult};
use context::RequestContext;
use exclusion::ExclusionPolicy;
use inflight::{DispatchTicket, InFlightRegistry};
use refresh::RefreshCoordinator;
use request::{ApiRequest, ApiResponse};
use response_interceptor::ResponseDecision;
use serde::Serialize;
use session::{LogOnlySessionHandler, SessionExpiredHandler};
use std::sync::Arc;
use transport::{ReqwestTransport, Transport};

pub(crate) struct ClientInner {
    config: ClientConfig,
    exclusion: ExclusionPolicy,
    store: Arc<dyn CredentialStore>,
    transport: Arc<dyn Transport>,
    session_handler: Arc<dyn SessionExpiredHandler>,
    registry: InFlightRegistry,
    refresh: RefreshCoordinator,
}

impl ClientInner {
    async fn dispatch(
        &self,
        request: &ApiRequest,
        ticket: &DispatchTicket,
    ) -> ClientResult<ApiResponse> {
        let response = tokio::select! {
            biased;
            _ = ticket.cancel.cancelled() => {
                tracing::debug!(identity = %ticket.identity, "request cancelled");
                return Err(ClientError::Cancelled {
                    identity: ticket.identity.to_string(),
                });
            }
            result = self.transport.send(request) => result?,
        };

        if !response.status.is_success() {
            return Err(ClientError::Status {
                status: response.status,
                method: request.method.to_string(),
                path: request.path.clone(),
                body: response.body,
            });
        }
        Ok(response)
    }
}

/// Configured client. Cloning is cheap and clones share the in-flight registry.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl ApiClient {
    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Send a request through the full pipeline.
    ///
    /// A superseded call resolves to [`ClientError::Cancelled`]; a 401 is
    /// retried at most once after a successful token refresh.
    pub async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let inner = self.inner.as_ref();
        let mut request = request;
        let mut ctx = RequestContext::new();

        loop {
            let ticket = inner.intercept_request(&mut request, &mut ctx)?;
            let outcome = inner.dispatch(&request, &ticket).await;
            match inner
                .intercept_response(outcome, &ticket, &mut ctx)
                .await
            {
                ResponseDecision::Settle(result) => return result,
                ResponseDecision::Replay => continue,
            }
        }
    }

    pub async fn get(&self, path: &str) -> ClientResult<ApiResponse> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn delete(&self, path: &str) -> ClientResult<ApiResponse> {
        self.send(ApiRequest::delete(path)).await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> ClientResult<ApiResponse> {
        self.send(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> ClientResult<ApiResponse> {
        self.send(ApiRequest::put(path).json(body)?).await
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> &InFlightRegistry {
        &self.inner.registry
    }
}

pub struct ApiClientBuilder {
    config: ClientConfig,
    store: Option<Arc<dyn CredentialStore>>,
    transport: Option<Arc<dyn Transport>>,
    session_handler: Option<Arc<dyn SessionExpiredHandler>>,
}

impl ApiClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            store: None,
            transport: None,
            session_handler: None,
        }
    }

    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the default reqwest transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn on_session_expired(mut self, handler: Arc<dyn SessionExpiredHandler>) -> Self {
        self.session_handler = Some(handler);
        self
    }

    pub fn build(self) -> ClientResult<ApiClient> {
        let mut config = self.config;
        config.sanitize();
        config.validate()?;

        let store = self.store.ok_or_else(|| {
            ClientError::Config("a credential store is required to build the client".into())
        })?;
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&config)?),
        };
        let session_handler: Arc<dyn SessionExpiredHandler> = match self.session_handler {
            Some(handler) => handler,
            None => Arc::new(LogOnlySessionHandler),
        };

        tracing::debug!(
            base_url = %config.base_url,
            single_flight_refresh = config.single_flight_refresh,
            "api client initialized"
        );

        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                exclusion: ExclusionPolicy::new(config.excluded_paths.iter().cloned()),
                refresh: RefreshCoordinator::new(config.single_flight_refresh),
                registry: InFlightRegistry::default(),
                config,
                store,
                transport,
                session_handler,
            }),
        })
    }
}
