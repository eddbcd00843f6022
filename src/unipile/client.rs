//! Unipile API client
//!
//! Thin wrapper over the Unipile REST API (`<dsn>/api/v1/...`) authenticated
//! with the `X-API-KEY` header.

use reqwest::header::ACCEPT;
use reqwest::multipart::Form;
use serde_json::Value;

use crate::config::UnipileCredentials;
use crate::error::{ApiResult, Result};
use crate::remote;

const SERVICE: &str = "Unipile";
const API_KEY_HEADER: &str = "X-API-KEY";
const API_PREFIX: &str = "/api/v1";

/// Unipile API client
pub struct UnipileClient {
    /// HTTP client
    http_client: reqwest::Client,

    credentials: UnipileCredentials,
}

impl UnipileClient {
    /// Create a new Unipile client
    pub fn new(credentials: UnipileCredentials, timeout: Option<std::time::Duration>) -> Result<Self> {
        Ok(Self {
            http_client: remote::http_client(timeout)?,
            credentials,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.credentials.dsn.trim_end_matches('/'),
            API_PREFIX,
            path
        )
    }

    /// GET `path` (relative to `/api/v1`) with the given query parameters
    pub async fn fetch(&self, path: &str, query: &[(&str, String)]) -> ApiResult<Value> {
        tracing::info!("[unipile] GET {}", path);

        let sent = self
            .http_client
            .get(self.api_url(path))
            .query(query)
            .header(API_KEY_HEADER, &self.credentials.api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await;

        remote::json_response(SERVICE, path, sent).await
    }

    /// Send a text message to a chat as a multipart form
    pub async fn send_message(&self, chat_id: &str, text: &str) -> ApiResult<Value> {
        let path = format!("/chats/{}/messages", chat_id);
        tracing::info!("[unipile] POST {}", path);

        let form = Form::new().text("text", text.to_string());

        let sent = self
            .http_client
            .post(self.api_url(&path))
            .header(API_KEY_HEADER, &self.credentials.api_key)
            .multipart(form)
            .send()
            .await;

        remote::json_response(SERVICE, &path, sent).await
    }
}
