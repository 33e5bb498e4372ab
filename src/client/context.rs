//! Usage: Per-call request context (refresh-retry state machine).

/// Lifecycle of one original `send` call with respect to token refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RefreshState {
    Initial,
    /// A refresh has been attempted; the retry marker is set.
    RetryPending,
    Resolved,
    Failed,
}

impl RefreshState {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::RetryPending => "retry_pending",
            Self::Resolved => "resolved",
            Self::Failed => "failed",
        }
    }
}

/// Created once per original dispatch and threaded through its replay.
#[derive(Debug, Clone)]
pub(crate) struct RequestContext {
    state: RefreshState,
    /// Access token attached to the most recent dispatch, if any.
    pub(crate) sent_with_token: Option<String>,
}

impl RequestContext {
    pub(crate) fn new() -> Self {
        Self {
            state: RefreshState::Initial,
            sent_with_token: None,
        }
    }

    pub(crate) fn state(&self) -> RefreshState {
        self.state
    }

    pub(crate) fn retry_marked(&self) -> bool {
        self.state != RefreshState::Initial
    }

    /// Set the retry marker. Returns `false` if it was already set.
    pub(crate) fn mark_retry(&mut self) -> bool {
        if self.retry_marked() {
            return false;
        }
        self.state = RefreshState::RetryPending;
        true
    }

    /// Record the final outcome of a call whose marker is set.
    pub(crate) fn settle(&mut self, succeeded: bool) {
        if self.state == RefreshState::RetryPending {
            self.state = if succeeded {
                RefreshState::Resolved
            } else {
                RefreshState::Failed
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_can_only_be_set_once() {
        let mut ctx = RequestContext::new();
        assert!(!ctx.retry_marked());
        assert!(ctx.mark_retry());
        assert_eq!(ctx.state(), RefreshState::RetryPending);
        assert!(!ctx.mark_retry());
    }

    #[test]
    fn settle_only_moves_out_of_retry_pending() {
        let mut ctx = RequestContext::new();
        ctx.settle(true);
        assert_eq!(ctx.state(), RefreshState::Initial);

        ctx.mark_retry();
        ctx.settle(false);
        assert_eq!(ctx.state(), RefreshState::Failed);
        ctx.settle(true);
        assert_eq!(ctx.state(), RefreshState::Failed);
        assert!(ctx.retry_marked());
    }
}
