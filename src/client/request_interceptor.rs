//! Usage: Pre-dispatch hook (bearer injection + in-flight dedup).

use super::context::RequestContext;
use super::identity::RequestIdentity;
use super::inflight::DispatchTicket;
use super::request::ApiRequest;
use super::ClientInner;
use crate::shared::error::ClientResult;
use crate::shared::security::mask_token;

impl ClientInner {
    /// Runs before every dispatch, replays included. A credential store read
    /// failure aborts the call before anything is registered or sent.
    pub(super) fn intercept_request(
        &self,
        request: &mut ApiRequest,
        ctx: &mut RequestContext,
    ) -> ClientResult<DispatchTicket> {
        self.inject_credential(request, ctx)?;

        let identity = RequestIdentity::new(&request.method, Some(request.path.as_str()));
        Ok(self.registry.register(identity))
    }

    fn inject_credential(
        &self,
        request: &mut ApiRequest,
        ctx: &mut RequestContext,
    ) -> ClientResult<()> {
        ctx.sent_with_token = None;

        let Some(token) = self.store.access_token()? else {
            request.clear_bearer();
            return Ok(());
        };
        if self.exclusion.is_excluded(Some(request.path.as_str())) {
            request.clear_bearer();
            return Ok(());
        }

        if request.set_bearer(&token) {
            ctx.sent_with_token = Some(token);
        } else {
            request.clear_bearer();
            tracing::debug!(
                path = %request.path,
                access_token = %mask_token(&token),
                "stored access token is not a valid header value; injection skipped"
            );
        }
        Ok(())
    }
}
