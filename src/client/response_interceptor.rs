//! Usage: Post-response hook (registry cleanup + single refresh-and-replay on 401).

use super::context::RequestContext;
use super::inflight::DispatchTicket;
use super::request::ApiResponse;
use super::ClientInner;
use crate::shared::error::{ClientError, ClientResult};
use crate::shared::security::mask_token;

pub(super) enum ResponseDecision {
    Settle(ClientResult<ApiResponse>),
    /// Credentials were refreshed; dispatch the same request again. The replay
    /// goes back through `intercept_request`, which re-reads the store.
    Replay,
}

impl ClientInner {
    pub(super) async fn intercept_response(
        &self,
        outcome: ClientResult<ApiResponse>,
        ticket: &DispatchTicket,
        ctx: &mut RequestContext,
    ) -> ResponseDecision {
        match outcome {
            Ok(response) => {
                self.registry.complete(ticket);
                ctx.settle(true);
                ResponseDecision::Settle(Ok(response))
            }
            Err(err) => self.intercept_failure(err, ticket, ctx).await,
        }
    }

    async fn intercept_failure(
        &self,
        err: ClientError,
        ticket: &DispatchTicket,
        ctx: &mut RequestContext,
    ) -> ResponseDecision {
        if err.is_unauthorized() && ctx.mark_retry() {
            tracing::debug!(
                identity = %ticket.identity,
                state = ctx.state().as_str(),
                "401 received; attempting token refresh"
            );

            match self.refresh_credentials(ctx).await {
                Ok(access_token) => {
                    tracing::info!(
                        identity = %ticket.identity,
                        access_token = %mask_token(&access_token),
                        "access token refreshed; replaying request"
                    );
                    self.registry.complete(ticket);
                    return ResponseDecision::Replay;
                }
                Err(refresh_err) => {
                    tracing::warn!(
                        identity = %ticket.identity,
                        "token refresh failed; session expired: {}",
                        refresh_err
                    );
                    self.session_handler.on_session_expired();
                }
            }
        }

        ctx.settle(false);
        self.registry.complete(ticket);
        ResponseDecision::Settle(Err(err))
    }

    async fn refresh_credentials(&self, ctx: &RequestContext) -> ClientResult<String> {
        let refresh_token = self
            .store
            .refresh_token()?
            .ok_or_else(|| ClientError::Refresh("no refresh token stored".into()))?;

        self.refresh
            .obtain_access_token(
                self.transport.as_ref(),
                self.store.as_ref(),
                self.config.refresh_path.as_str(),
                refresh_token.as_str(),
                ctx.sent_with_token.as_deref(),
            )
            .await
    }
}
