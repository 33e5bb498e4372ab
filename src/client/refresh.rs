//! Usage: Refresh-token exchange against the refresh endpoint (optionally single-flight).

use super::request::{ApiRequest, ApiResponse};
use super::transport::Transport;
use crate::infra::credential_store::CredentialStore;
use crate::shared::error::{ClientError, ClientResult};
use crate::shared::security::{mask_token, sanitize_body_snippet};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
struct RefreshTokenBody<'a> {
    refresh_token: &'a str,
}

/// `POST {refresh_path}` with `{ "refresh_token": ... }`, bypassing the
/// interceptors. Returns the new access token.
pub(crate) async fn request_access_token(
    transport: &dyn Transport,
    refresh_path: &str,
    refresh_token: &str,
) -> ClientResult<String> {
    let request = ApiRequest::post(refresh_path).json(&RefreshTokenBody {
        refresh_token: refresh_token.trim(),
    })?;

    let response = transport
        .send(&request)
        .await
        .map_err(|e| ClientError::Refresh(format!("refresh request failed: {e}")))?;

    parse_refresh_response(&response)
}

fn parse_refresh_response(response: &ApiResponse) -> ClientResult<String> {
    if !response.status.is_success() {
        return Err(ClientError::Refresh(format!(
            "refresh endpoint returned status={} body={}",
            response.status.as_u16(),
            sanitize_body_snippet(&response.body)
        )));
    }

    let value: Value = serde_json::from_slice(&response.body)
        .map_err(|e| ClientError::Refresh(format!("refresh response json invalid: {e}")))?;

    let access_token = value
        .get("access_token")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ClientError::Refresh("refresh response missing access_token".into()))?;

    Ok(access_token.to_string())
}

/// Serializes refresh attempts when single-flight refresh is enabled.
#[derive(Debug, Default)]
pub(crate) struct RefreshCoordinator {
    gate: Option<tokio::sync::Mutex<()>>,
}

impl RefreshCoordinator {
    pub(crate) fn new(single_flight: bool) -> Self {
        Self {
            gate: single_flight.then(|| tokio::sync::Mutex::new(())),
        }
    }

    /// Obtain a fresh access token for a request that was sent with `sent_with`
    /// and persist it, overwriting the stored access token.
    ///
    /// In single-flight mode, a token stored by a concurrent refresh while this
    /// caller waited is reused instead of calling the endpoint again.
    pub(crate) async fn obtain_access_token(
        &self,
        transport: &dyn Transport,
        store: &dyn CredentialStore,
        refresh_path: &str,
        refresh_token: &str,
        sent_with: Option<&str>,
    ) -> ClientResult<String> {
        let Some(gate) = self.gate.as_ref() else {
            let access_token =
                request_access_token(transport, refresh_path, refresh_token).await?;
            store.set_access_token(&access_token)?;
            return Ok(access_token);
        };

        let _guard = gate.lock().await;
        if let Some(current) = store.access_token()? {
            if sent_with != Some(current.as_str()) {
                tracing::debug!(
                    access_token = %mask_token(&current),
                    "reusing access token stored by a concurrent refresh"
                );
                return Ok(current);
            }
        }
        let access_token = request_access_token(transport, refresh_path, refresh_token).await?;
        store.set_access_token(&access_token)?;
        Ok(access_token)
    }
}
