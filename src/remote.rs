//! Response handling shared by the Doctoc and Unipile clients.

use std::time::Duration;

use serde_json::Value;

use crate::error::{ApiError, ApiResult, Result};

/// Build the underlying HTTP client, applying a timeout only when configured
pub(crate) fn http_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Map a send result into JSON or a typed error.
///
/// 2xx bodies are returned verbatim (an empty body as `null`); anything else
/// becomes `RemoteCall` with whatever body text could be read.
pub(crate) async fn json_response(
    service: &'static str,
    endpoint: &str,
    sent: std::result::Result<reqwest::Response, reqwest::Error>,
) -> ApiResult<Value> {
    let transport = |source: reqwest::Error| ApiError::Transport {
        service,
        endpoint: endpoint.to_string(),
        source,
    };

    let response = sent.map_err(transport)?;
    let status = response.status();

    if status.is_success() {
        let text = response.text().await.map_err(transport)?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(&text).map_err(|source| ApiError::InvalidBody {
            service,
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            source,
        });
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!(service, endpoint, status = status.as_u16(), "remote call rejected");

    Err(ApiError::RemoteCall {
        service,
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        body,
    })
}
