//! Price catalog with appointment-type fallback
//!
//! `getPricesAPI` is not deployed for every organization. When it fails for
//! any reason, prices are derived from the organization's appointment types
//! (`manageUserInfoAPI`, section `tipos`) and reshaped to the same contract.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::doctoc::client::DoctocClient;
use crate::doctoc::payloads::{appointment_types_body, endpoints, prices_body, DEFAULT_CATEGORY};
use crate::error::{ApiError, ApiResult};

/// `source` reported by derived listings
pub const FALLBACK_SOURCE: &str = "appointment_types";

/// A price entry derived from an appointment type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    pub price: Value,
    pub category: String,
    pub duration_minutes: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl PriceRecord {
    /// Reshape one appointment-type record
    pub fn from_appointment_type(record: &Value) -> Self {
        let present = |key: &str| record.get(key).filter(|v| !v.is_null()).cloned();

        Self {
            name: present("name"),
            price: present("price").unwrap_or_else(|| json!(0)),
            category: record
                .get("category")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_CATEGORY)
                .to_string(),
            duration_minutes: present("durationMinutes").unwrap_or_else(|| json!(0)),
            id: present("id"),
        }
    }
}

/// Locate the list of appointment-type records in a `tipos` response.
///
/// Accepts a bare array, or an object nesting it under `tipos`, `types` or
/// `data` (searched recursively).
fn appointment_type_records(response: &Value) -> &[Value] {
    match response {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => ["tipos", "types", "data"]
            .iter()
            .filter_map(|key| map.get(*key))
            .map(appointment_type_records)
            .find(|items| !items.is_empty())
            .unwrap_or(&[]),
        _ => &[],
    }
}

/// Derive price records from an appointment-type listing
pub fn derive_prices(appointment_types: &Value) -> Vec<PriceRecord> {
    appointment_type_records(appointment_types)
        .iter()
        .map(PriceRecord::from_appointment_type)
        .collect()
}

/// Distinct categories of a derived price list
pub fn derive_categories(prices: &[PriceRecord]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for record in prices {
        if !categories.contains(&record.category) {
            categories.push(record.category.clone());
        }
    }
    categories
}

/// Prices and categories, served by `getPricesAPI` or derived from appointment types
pub struct PriceCatalog<'a> {
    client: &'a DoctocClient,
}

impl<'a> PriceCatalog<'a> {
    pub fn new(client: &'a DoctocClient) -> Self {
        Self { client }
    }

    /// Price listing, optionally filtered by category id.
    ///
    /// The category filter only applies to the dedicated endpoint; derived
    /// listings always contain every appointment type.
    pub async fn prices(&self, categoria_id: Option<&str>) -> ApiResult<Value> {
        match self.direct("prices", categoria_id).await {
            Ok(result) => Ok(result),
            Err(primary) => {
                let prices = self.derived_prices(primary).await?;
                Ok(json!({ "source": FALLBACK_SOURCE, "prices": prices }))
            }
        }
    }

    /// Price categories
    pub async fn categories(&self) -> ApiResult<Value> {
        match self.direct("categories", None).await {
            Ok(result) => Ok(result),
            Err(primary) => {
                let prices = self.derived_prices(primary).await?;
                Ok(json!({
                    "source": FALLBACK_SOURCE,
                    "categories": derive_categories(&prices),
                }))
            }
        }
    }

    /// Prices and categories in one structure
    pub async fn both(&self) -> ApiResult<Value> {
        match self.direct("both", None).await {
            Ok(result) => Ok(result),
            Err(primary) => {
                let prices = self.derived_prices(primary).await?;
                let categories = derive_categories(&prices);
                Ok(json!({
                    "source": FALLBACK_SOURCE,
                    "prices": prices,
                    "categories": categories,
                }))
            }
        }
    }

    async fn direct(&self, action: &str, categoria_id: Option<&str>) -> ApiResult<Value> {
        self.client
            .send(endpoints::PRICES, prices_body(action, categoria_id))
            .await
    }

    async fn derived_prices(&self, primary: ApiError) -> ApiResult<Vec<PriceRecord>> {
        tracing::warn!("{}; deriving prices from appointment types", primary);

        let types = self
            .client
            .send(endpoints::MANAGE_USER_INFO, appointment_types_body())
            .await
            .map_err(|fallback| ApiError::FallbackExhausted {
                primary: primary.to_string(),
                fallback: Box::new(fallback),
            })?;

        Ok(derive_prices(&types))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DoctocCredentials;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn consulta() -> Value {
        json!([{
            "name": "Consulta",
            "price": 50,
            "category": "Consulta",
            "durationMinutes": 30,
            "id": "t1"
        }])
    }

    fn client_for(server: &MockServer) -> DoctocClient {
        DoctocClient::new(
            DoctocCredentials {
                api_url: server.uri(),
                api_token: "t".to_string(),
                org_id: "org".to_string(),
            },
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_derive_prices_passes_fields_through() {
        let prices = derive_prices(&consulta());
        assert_eq!(serde_json::to_value(&prices).unwrap(), consulta());
        assert_eq!(derive_categories(&prices), vec!["Consulta".to_string()]);
    }

    #[test]
    fn test_derive_prices_defaults() {
        let prices = derive_prices(&json!({"tipos": [{"name": "Teleconsulta", "id": "t2"}]}));
        assert_eq!(
            serde_json::to_value(&prices).unwrap(),
            json!([{
                "name": "Teleconsulta",
                "price": 0,
                "category": "cita",
                "durationMinutes": 0,
                "id": "t2"
            }])
        );
    }

    #[test]
    fn test_nested_records_are_found() {
        let response = json!({"success": true, "data": {"tipos": consulta()}});
        assert_eq!(derive_prices(&response).len(), 1);
        assert!(derive_prices(&json!({"message": "empty"})).is_empty());
    }

    #[test]
    fn test_categories_are_unique() {
        let prices = derive_prices(&json!([
            {"name": "A", "category": "Consulta"},
            {"name": "B", "category": "Procedimiento"},
            {"name": "C", "category": "Consulta"},
            {"name": "D"}
        ]));
        let mut categories = derive_categories(&prices);
        categories.sort();
        assert_eq!(categories, vec!["Consulta", "Procedimiento", "cita"]);
    }

    #[tokio::test]
    async fn test_direct_prices_are_returned_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/getPricesAPI"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"prices": ["x"]})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/manageUserInfoAPI"))
            .respond_with(ResponseTemplate::new(200).set_body_json(consulta()))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = PriceCatalog::new(&client).prices(None).await.unwrap();
        assert_eq!(result, json!({"prices": ["x"]}));
    }

    #[tokio::test]
    async fn test_fallback_on_missing_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/getPricesAPI"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/manageUserInfoAPI"))
            .respond_with(ResponseTemplate::new(200).set_body_json(consulta()))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let catalog = PriceCatalog::new(&client);

        assert_eq!(
            catalog.prices(Some("c1")).await.unwrap(),
            json!({"source": "appointment_types", "prices": consulta()})
        );
        assert_eq!(
            catalog.categories().await.unwrap(),
            json!({"source": "appointment_types", "categories": ["Consulta"]})
        );
        assert_eq!(
            catalog.both().await.unwrap(),
            json!({
                "source": "appointment_types",
                "prices": consulta(),
                "categories": ["Consulta"]
            })
        );

        let requests = server.received_requests().await.unwrap();
        let fallback: Value = serde_json::from_slice(&requests[1].body).unwrap();
        assert_eq!(
            fallback,
            json!({"orgID": "org", "action": "get", "sections": ["tipos"]})
        );
    }

    #[tokio::test]
    async fn test_fallback_failure_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/getPricesAPI"))
            .respond_with(ResponseTemplate::new(501))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/manageUserInfoAPI"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = PriceCatalog::new(&client).both().await.unwrap_err();

        match &err {
            ApiError::FallbackExhausted { primary, fallback } => {
                assert!(primary.contains("501"));
                assert_eq!(fallback.status(), Some(503));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
