use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::IssueSource;
use crate::config::{JiraConfig, QueryConfig};
use crate::error::{truncate_body, SourceError};
use crate::model::ticket::{custom_field_text, parse_timestamp, Ticket};

pub struct JiraSource {
    base_url: String,
    auth_header: String,
    query: QueryConfig,
    client: reqwest::Client,
}

impl JiraSource {
    pub fn new(config: &JiraConfig, query: QueryConfig) -> Self {
        let creds = format!("{}:{}", config.email, config.api_token);
        let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
        Self {
            base_url: config.base_url.clone(),
            auth_header: format!("Basic {encoded}"),
            query,
            client: reqwest::Client::new(),
        }
    }

    #[cfg(test)]
    fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn search_url(&self) -> String {
        let fields = format!(
            "summary,status,description,created,updated,assignee,priority,{}",
            self.query.bt_field_key()
        );
        format!(
            "{}/rest/api/3/search?jql={}&maxResults={}&fields={}",
            self.base_url,
            urlencoding::encode(&build_jql(&self.query)),
            self.query.max_results,
            urlencoding::encode(&fields)
        )
    }
}

/// Render the fixed ticket filter as JQL.
pub fn build_jql(query: &QueryConfig) -> String {
    let mut clauses = vec![
        format!("project = \"{}\"", query.project),
        format!("\"{}\" = \"{}\"", query.client_field, query.client),
    ];
    if !query.excluded_statuses.is_empty() {
        clauses.push(format!(
            "status NOT IN ({})",
            query.excluded_statuses.join(", ")
        ));
    }
    clauses.push(format!(
        "\"{}\" = {}",
        query.visibility_field, query.visibility_value
    ));
    format!(
        "{}\nORDER BY \"cf[{}]\" ASC, created DESC",
        clauses.join("\nAND "),
        query.bt_field_id
    )
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<JiraIssue>,
}

#[derive(Deserialize)]
struct JiraIssue {
    key: String,
    #[serde(default)]
    fields: IssueFields,
}

#[derive(Deserialize, Default)]
struct IssueFields {
    summary: Option<String>,
    status: Option<NamedField>,
    priority: Option<NamedField>,
    created: Option<String>,
    updated: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct NamedField {
    #[serde(default)]
    name: Option<String>,
}

fn into_ticket(issue: JiraIssue, bt_field_key: &str) -> Ticket {
    let fields = issue.fields;
    let mut ticket = Ticket::new(issue.key);
    ticket.summary = fields.summary;
    ticket.status = fields.status.and_then(|s| s.name);
    ticket.priority = fields.priority.and_then(|p| p.name);
    ticket.bt_number = fields.extra.get(bt_field_key).and_then(custom_field_text);
    ticket.created = fields.created.as_deref().and_then(parse_timestamp);
    ticket.updated = fields.updated.as_deref().and_then(parse_timestamp);
    ticket
}

/// Decode a search response body into tickets, preserving source order.
pub fn parse_search_response(body: &str, bt_field_key: &str) -> Result<Vec<Ticket>, SourceError> {
    let search: SearchResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Decode(e.to_string()))?;
    Ok(search
        .issues
        .into_iter()
        .map(|issue| into_ticket(issue, bt_field_key))
        .collect())
}

#[async_trait]
impl IssueSource for JiraSource {
    fn name(&self) -> &str {
        "Jira"
    }

    async fn fetch_tickets(&self) -> Result<Vec<Ticket>, SourceError> {
        let resp = self
            .client
            .get(self.search_url())
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        parse_search_response(&body, &self.query.bt_field_key())
    }
}
