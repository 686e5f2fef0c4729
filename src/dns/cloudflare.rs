use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::provider::{Credentials, DnsProvider, EditStatus};
use crate::error::{Error, Result};

pub const CLOUDFLARE_API_ENDPOINT: &str = "https://www.cloudflare.com/api_json.html";
/// `1` asks Cloudflare for an automatic TTL.
pub const DEFAULT_TTL: u32 = 1;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for Cloudflare's form-based `api_json.html` interface.
pub struct CloudflareProvider {
    client: Client,
    credentials: Credentials,
    endpoint: String,
    ttl: u32,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    result: String,
    msg: Option<String>,
    response: Option<T>,
}

impl<T> ApiResponse<T> {
    fn is_success(&self) -> bool {
        self.result == "success"
    }

    fn error_message(&self) -> String {
        self.msg
            .clone()
            .unwrap_or_else(|| format!("request failed with result '{}'", self.result))
    }
}

#[derive(Debug, Deserialize)]
struct LoadAllResponse {
    recs: RecordPage,
}

#[derive(Debug, Deserialize)]
struct RecordPage {
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    count: usize,
    #[serde(default)]
    objs: Vec<ApiRecord>,
}

#[derive(Debug, Deserialize)]
struct ApiRecord {
    rec_id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
}

impl CloudflareProvider {
    pub fn new(credentials: Credentials, endpoint: &str, ttl: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
            endpoint: endpoint.to_string(),
            ttl,
        })
    }

    fn base_params(&self, action: &str, zone: &str) -> Vec<(&'static str, String)> {
        vec![
            ("a", action.to_string()),
            ("z", zone.to_string()),
            ("email", self.credentials.user.clone()),
            ("tkn", self.credentials.token.clone()),
        ]
    }

    async fn post<T: DeserializeOwned>(
        &self,
        params: &[(&str, String)],
    ) -> Result<ApiResponse<T>> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(params)
            .send()
            .await
            .map_err(|e| Error::transport(format!("Failed to send request to Cloudflare: {}", e)))?;

        parse_response(response).await
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<ApiResponse<T>> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::transport(format!(
            "Cloudflare API error ({}): {}",
            status, body
        )));
    }

    response
        .json()
        .await
        .map_err(|e| Error::transport(format!("Failed to parse Cloudflare response: {}", e)))
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn list_records(&self, zone: &str) -> Result<HashMap<String, String>> {
        let mut records = HashMap::new();
        let mut offset = 0usize;

        loop {
            let mut params = self.base_params("rec_load_all", zone);
            if offset > 0 {
                params.push(("o", offset.to_string()));
            }

            let reply: ApiResponse<LoadAllResponse> = self.post(&params).await?;
            if !reply.is_success() {
                return Err(Error::api(format!("{}: {}", zone, reply.error_message())));
            }

            let page = reply
                .response
                .ok_or_else(|| Error::api(format!("{}: response carried no records", zone)))?
                .recs;

            debug!(
                "Loaded {} records for {} at offset {}",
                page.objs.len(),
                zone,
                offset
            );

            records.extend(
                page.objs
                    .into_iter()
                    .filter(|r| r.record_type == "A")
                    .map(|r| (r.name, r.rec_id)),
            );

            if !page.has_more || page.count == 0 {
                break;
            }
            offset += page.count;
        }

        Ok(records)
    }

    async fn edit_record(
        &self,
        zone: &str,
        name: &str,
        record_id: &str,
        ip: &str,
    ) -> Result<EditStatus> {
        let mut params = self.base_params("rec_edit", zone);
        params.extend([
            ("type", "A".to_string()),
            ("ttl", self.ttl.to_string()),
            ("name", name.to_string()),
            ("id", record_id.to_string()),
            ("content", ip.to_string()),
        ]);

        let reply: ApiResponse<serde_json::Value> = self.post(&params).await?;
        if reply.is_success() {
            Ok(EditStatus::Applied)
        } else {
            Ok(EditStatus::Rejected {
                message: reply.error_message(),
            })
        }
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> CloudflareProvider {
        CloudflareProvider::new(
            Credentials {
                user: "me@example.com".to_string(),
                token: "tkn123".to_string(),
            },
            &format!("{}/api_json.html", server.uri()),
            DEFAULT_TTL,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_error_response() {
        let reply: ApiResponse<serde_json::Value> =
            serde_json::from_str(r#"{"result":"error","msg":"Invalid record id"}"#).unwrap();
        assert!(!reply.is_success());
        assert_eq!(reply.error_message(), "Invalid record id");
    }

    #[tokio::test]
    async fn test_list_records_keeps_only_a_records() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api_json.html"))
            .and(body_string_contains("a=rec_load_all"))
            .and(body_string_contains("z=example.com"))
            .and(body_string_contains("email=me%40example.com"))
            .and(body_string_contains("tkn=tkn123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": "success",
                "msg": null,
                "response": {"recs": {"has_more": false, "count": 2, "objs": [
                    {"rec_id": "id1", "name": "foo.example.com", "type": "A"},
                    {"rec_id": "id2", "name": "alias.example.com", "type": "CNAME"}
                ]}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let records = provider(&server).list_records("example.com").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records.get("foo.example.com").map(String::as_str), Some("id1"));
    }

    #[tokio::test]
    async fn test_list_records_follows_pages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("o=1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": "success",
                "response": {"recs": {"has_more": false, "count": 1, "objs": [
                    {"rec_id": "id2", "name": "www.example.com", "type": "A"}
                ]}}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": "success",
                "response": {"recs": {"has_more": true, "count": 1, "objs": [
                    {"rec_id": "id1", "name": "example.com", "type": "A"}
                ]}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let records = provider(&server).list_records("example.com").await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records["example.com"], "id1");
        assert_eq!(records["www.example.com"], "id2");
    }

    #[tokio::test]
    async fn test_list_records_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"result": "error", "msg": "No such zone"})),
            )
            .mount(&server)
            .await;

        let err = provider(&server)
            .list_records("example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProviderApi(ref m) if m.contains("No such zone")));
    }

    #[tokio::test]
    async fn test_list_records_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = provider(&server)
            .list_records("example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProviderTransport(_)));
    }

    #[tokio::test]
    async fn test_edit_record_sends_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("a=rec_edit"))
            .and(body_string_contains("type=A"))
            .and(body_string_contains("ttl=1"))
            .and(body_string_contains("name=www.example.com"))
            .and(body_string_contains("id=rec42"))
            .and(body_string_contains("content=9.9.9.9"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"result": "success", "response": {}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let status = provider(&server)
            .edit_record("example.com", "www.example.com", "rec42", "9.9.9.9")
            .await
            .unwrap();
        assert_eq!(status, EditStatus::Applied);
    }

    #[tokio::test]
    async fn test_edit_record_api_error_is_soft() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"result": "error", "msg": "Invalid record id"})),
            )
            .mount(&server)
            .await;

        let status = provider(&server)
            .edit_record("example.com", "example.com", "bad", "9.9.9.9")
            .await
            .unwrap();
        assert_eq!(
            status,
            EditStatus::Rejected {
                message: "Invalid record id".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_edit_record_http_failure_is_hard() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = provider(&server)
            .edit_record("example.com", "example.com", "id1", "9.9.9.9")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProviderTransport(ref m) if m.contains("500")));
    }
}
