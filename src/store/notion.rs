use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::RecordStore;
use crate::config::NotionConfig;
use crate::error::{truncate_body, StoreError};
use crate::model::record::{RecordPage, RecordProperties, RecordSummary};

pub const NOTION_API_URL: &str = "https://api.notion.com/v1";
pub const NOTION_VERSION: &str = "2022-06-28";

pub const TITLE_PROPERTY: &str = "tickets";
pub const STATUS_PROPERTY: &str = "Status";
pub const CLIENT_PROPERTY: &str = "Client";
pub const PRIORITY_PROPERTY: &str = "Priority";
pub const BT_NUMBER_PROPERTY: &str = "BT number";
pub const VISIBILITY_PROPERTY: &str = "show to customer";
pub const QUERY_PAGE_SIZE: u32 = 100;

pub struct NotionStore {
    api_url: String,
    token: String,
    client: reqwest::Client,
}

impl fmt::Debug for NotionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionStore")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl NotionStore {
    pub fn new(config: &NotionConfig) -> Self {
        Self {
            api_url: NOTION_API_URL.to_string(),
            token: config.token.clone(),
            client: reqwest::Client::new(),
        }
    }

    #[cfg(test)]
    fn at(api_url: &str, client: reqwest::Client) -> Self {
        Self {
            api_url: api_url.to_string(),
            token: "secret_abc".into(),
            client,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.api_url))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .header("Content-Type", "application/json")
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<String, StoreError> {
        let resp = builder
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        Ok(body)
    }
}

fn text_block(content: &str) -> Value {
    json!([{ "text": { "content": content } }])
}

/// Encode properties the way the database schema expects them. Absent
/// optional values leave their key out entirely.
pub fn encode_properties(props: &RecordProperties) -> Value {
    let mut map = Map::new();
    map.insert(TITLE_PROPERTY.into(), json!({ "title": text_block(&props.title) }));
    map.insert(STATUS_PROPERTY.into(), json!({ "select": { "name": props.status } }));
    map.insert(CLIENT_PROPERTY.into(), json!({ "rich_text": text_block(&props.client) }));
    if let Some(priority) = &props.priority {
        map.insert(PRIORITY_PROPERTY.into(), json!({ "select": { "name": priority } }));
    }
    if let Some(bt) = &props.bt_number {
        map.insert(BT_NUMBER_PROPERTY.into(), json!({ "rich_text": text_block(bt) }));
    }
    map.insert(
        VISIBILITY_PROPERTY.into(),
        json!({ "checkbox": props.show_to_customer }),
    );
    Value::Object(map)
}

pub fn title_query(needle: &str, cursor: Option<&str>) -> Value {
    let mut query = json!({
        "filter": {
            "property": TITLE_PROPERTY,
            "title": { "contains": needle }
        },
        "page_size": QUERY_PAGE_SIZE,
    });
    if let Some(cursor) = cursor {
        query["start_cursor"] = json!(cursor);
    }
    query
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Page>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

#[derive(Deserialize)]
struct Page {
    id: String,
    #[serde(default)]
    properties: Map<String, Value>,
}

#[derive(Deserialize)]
struct CreatedPage {
    id: String,
}

fn page_title(properties: &Map<String, Value>) -> String {
    properties
        .get(TITLE_PROPERTY)
        .and_then(|p| p.get("title"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| {
                    part.get("plain_text")
                        .or_else(|| part.get("text").and_then(|t| t.get("content")))
                        .and_then(Value::as_str)
                })
                .collect::<String>()
        })
        .unwrap_or_default()
}

pub fn parse_query_response(body: &str) -> Result<RecordPage, StoreError> {
    let resp: QueryResponse =
        serde_json::from_str(body).map_err(|e| StoreError::Decode(e.to_string()))?;
    let records = resp
        .results
        .into_iter()
        .map(|page| RecordSummary {
            title: page_title(&page.properties),
            id: page.id,
        })
        .collect();
    Ok(RecordPage {
        records,
        next_cursor: resp.next_cursor.filter(|_| resp.has_more),
    })
}

#[async_trait]
impl RecordStore for NotionStore {
    fn name(&self) -> &str {
        "Notion"
    }

    async fn query_by_title(
        &self,
        container: &str,
        needle: &str,
        cursor: Option<&str>,
    ) -> Result<RecordPage, StoreError> {
        let builder = self
            .request(reqwest::Method::POST, &format!("/databases/{container}/query"))
            .json(&title_query(needle, cursor));
        let body = self.send(builder).await?;
        parse_query_response(&body)
    }

    async fn create_record(
        &self,
        container: &str,
        properties: &RecordProperties,
    ) -> Result<String, StoreError> {
        let payload = json!({
            "parent": { "database_id": container },
            "properties": encode_properties(properties),
        });
        let builder = self.request(reqwest::Method::POST, "/pages").json(&payload);
        let body = self.send(builder).await?;
        let page: CreatedPage =
            serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(page.id)
    }

    async fn update_record(
        &self,
        record_id: &str,
        properties: &RecordProperties,
    ) -> Result<(), StoreError> {
        let payload = json!({ "properties": encode_properties(properties) });
        let builder = self
            .request(reqwest::Method::PATCH, &format!("/pages/{record_id}"))
            .json(&payload);
        self.send(builder).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{local_client, serve_once};

    fn props() -> RecordProperties {
        RecordProperties {
            title: "GMI-42: Fix login".into(),
            status: "In Progress".into(),
            client: "US BANGLA".into(),
            priority: Some("High".into()),
            bt_number: Some("7".into()),
            show_to_customer: true,
        }
    }

    #[test]
    fn encodes_full_property_set() {
        let encoded = encode_properties(&props());
        assert_eq!(
            encoded,
            json!({
                "tickets": { "title": [{ "text": { "content": "GMI-42: Fix login" } }] },
                "Status": { "select": { "name": "In Progress" } },
                "Client": { "rich_text": [{ "text": { "content": "US BANGLA" } }] },
                "Priority": { "select": { "name": "High" } },
                "BT number": { "rich_text": [{ "text": { "content": "7" } }] },
                "show to customer": { "checkbox": true }
            })
        );
    }

    #[test]
    fn omits_absent_priority_and_bt_number() {
        let encoded = encode_properties(&RecordProperties {
            priority: None,
            bt_number: None,
            ..props()
        });
        let obj = encoded.as_object().unwrap();
        assert!(!obj.contains_key(PRIORITY_PROPERTY));
        assert!(!obj.contains_key(BT_NUMBER_PROPERTY));
        assert_eq!(obj.len(), 4);
    }

    #[test]
    fn title_query_uses_contains_and_cursor() {
        let first = title_query("GMI-42", None);
        assert_eq!(first["filter"]["title"]["contains"], json!("GMI-42"));
        assert_eq!(first["page_size"], json!(QUERY_PAGE_SIZE));
        assert!(first.get("start_cursor").is_none());

        let next = title_query("GMI-42", Some("cursor-2"));
        assert_eq!(next["start_cursor"], json!("cursor-2"));
    }

    #[test]
    fn parses_query_results_with_titles() {
        let body = r#"{
            "object": "list",
            "results": [
                {
                    "id": "abc123",
                    "properties": {
                        "tickets": {
                            "title": [
                                { "plain_text": "GMI-42: ", "text": { "content": "GMI-42: " } },
                                { "plain_text": "Fix login" }
                            ]
                        }
                    }
                },
                { "id": "def456" }
            ],
            "has_more": false
        }"#;
        let page = parse_query_response(body).unwrap();
        assert_eq!(page.next_cursor, None);
        let records = page.records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "abc123");
        assert_eq!(records[0].title, "GMI-42: Fix login");
        assert_eq!(records[1].title, "");
    }

    #[test]
    fn debug_redacts_token() {
        let store = NotionStore::new(&NotionConfig {
            token: "secret_abc".into(),
            database_id: "db".into(),
        });
        assert!(!format!("{store:?}").contains("secret_abc"));
    }

    #[test]
    fn next_cursor_only_when_more_results() {
        let page = parse_query_response(
            r#"{"results": [], "has_more": true, "next_cursor": "c-2"}"#,
        )
        .unwrap();
        assert_eq!(page.next_cursor.as_deref(), Some("c-2"));

        let page = parse_query_response(
            r#"{"results": [], "has_more": false, "next_cursor": "stale"}"#,
        )
        .unwrap();
        assert_eq!(page.next_cursor, None);
    }

    #[tokio::test]
    async fn error_status_becomes_status_error() {
        let (api_url, server) = serve_once(503, r#"{"code":"service_unavailable"}"#).await;
        let store = NotionStore::at(&api_url, local_client());

        let err = store
            .query_by_title("db-123", "GMI-42", None)
            .await
            .unwrap_err();

        match err {
            StoreError::Status { status, body } => {
                assert_eq!(status, 503);
                assert!(body.contains("service_unavailable"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /databases/db-123/query "));
    }

    #[tokio::test]
    async fn update_sends_patch_with_headers() {
        let (api_url, server) = serve_once(200, r#"{"id":"abc123"}"#).await;
        let store = NotionStore::at(&api_url, local_client());

        store.update_record("abc123", &props()).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("PATCH /pages/abc123 "));
        let lower = request.to_ascii_lowercase();
        assert!(lower.contains("authorization: bearer secret_abc"));
        assert!(lower.contains(&format!("notion-version: {NOTION_VERSION}")));
        assert!(request.contains("\"GMI-42: Fix login\""));
    }

    #[tokio::test]
    async fn create_returns_new_page_id() {
        let (api_url, server) = serve_once(200, r#"{"object":"page","id":"new-page"}"#).await;
        let store = NotionStore::at(&api_url, local_client());

        let id = store.create_record("db-123", &props()).await.unwrap();

        assert_eq!(id, "new-page");
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /pages "));
        assert!(request.contains("\"database_id\":\"db-123\""));
    }
}
