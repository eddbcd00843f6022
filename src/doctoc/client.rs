//! Doctoc API client
//!
//! Every Doctoc operation is a POST of a JSON body to
//! `<api_url>/<endpoint>` carrying the organization id.

use serde_json::{Map, Value};

use crate::config::DoctocCredentials;
use crate::error::{ApiResult, Result};
use crate::remote;

/// Key under which the organization id is merged into every body
pub const ORG_ID_KEY: &str = "orgID";

const SERVICE: &str = "Doctoc";

/// Doctoc API client
pub struct DoctocClient {
    /// HTTP client
    http_client: reqwest::Client,

    credentials: DoctocCredentials,
}

impl DoctocClient {
    /// Create a new Doctoc client
    pub fn new(credentials: DoctocCredentials, timeout: Option<std::time::Duration>) -> Result<Self> {
        Ok(Self {
            http_client: remote::http_client(timeout)?,
            credentials,
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.credentials.api_url.trim_end_matches('/'), endpoint)
    }

    /// Merge the configured organization id into a caller body
    pub fn with_org_id(&self, body: Map<String, Value>) -> Map<String, Value> {
        let mut merged = body;
        merged.insert(
            ORG_ID_KEY.to_string(),
            Value::String(self.credentials.org_id.clone()),
        );
        merged
    }

    /// POST `body` to `endpoint` and return the parsed JSON response
    pub async fn send(&self, endpoint: &str, body: Map<String, Value>) -> ApiResult<Value> {
        tracing::info!("[doctoc] POST {}", endpoint);

        let sent = self
            .http_client
            .post(self.endpoint_url(endpoint))
            .bearer_auth(&self.credentials.api_token)
            .json(&self.with_org_id(body))
            .send()
            .await;

        remote::json_response(SERVICE, endpoint, sent).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> DoctocClient {
        DoctocClient::new(
            DoctocCredentials {
                api_url: server.uri(),
                api_token: "test-token".to_string(),
                org_id: "org-42".to_string(),
            },
            None,
        )
        .unwrap()
    }

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    async fn sent_bodies(server: &MockServer) -> Vec<Value> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_send_posts_authenticated_json_with_org_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/getDayQuotesAPI"))
            .and(header("Authorization", "Bearer test-token"))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"quotes": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client
            .send("getDayQuotesAPI", body(json!({"dayKey": "07-02-2026"})))
            .await
            .unwrap();

        assert_eq!(result, json!({"quotes": []}));
        let sent = sent_bodies(&server).await;
        assert_eq!(sent[0], json!({"orgID": "org-42", "dayKey": "07-02-2026"}));
    }

    #[tokio::test]
    async fn test_configured_org_id_always_present() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        client
            .send("getOrgInfoAPI", body(json!({"orgID": "other", "sections": ["basic"]})))
            .await
            .unwrap();

        let sent = sent_bodies(&server).await;
        assert_eq!(sent[0]["orgID"], "org-42");
        assert_eq!(sent[0]["sections"], json!(["basic"]));
    }

    #[tokio::test]
    async fn test_non_success_status_is_remote_call_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/getPricesAPI"))
            .respond_with(ResponseTemplate::new(404).set_body_string("function not found"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.send("getPricesAPI", Map::new()).await.unwrap_err();

        match err {
            ApiError::RemoteCall {
                endpoint,
                status,
                status_text,
                body,
                ..
            } => {
                assert_eq!(endpoint, "getPricesAPI");
                assert_eq!(status, 404);
                assert_eq!(status_text, "Not Found");
                assert_eq!(body, "function not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_identical_reads_are_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/getDayQuotesAPI"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        for _ in 0..2 {
            client
                .send("getDayQuotesAPI", body(json!({"dayKey": "01-03-2026"})))
                .await
                .unwrap();
        }

        let sent = sent_bodies(&server).await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], sent[1]);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let client = DoctocClient::new(
            DoctocCredentials {
                api_url: "http://127.0.0.1:1".to_string(),
                ..Default::default()
            },
            None,
        )
        .unwrap();

        let err = client.send("getOrgInfoAPI", Map::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }));
        assert_eq!(err.status(), None);
    }
}
