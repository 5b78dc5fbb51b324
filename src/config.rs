use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "NOTION_SYNC_CONFIG";

/// Fully resolved settings for one sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub jira: JiraConfig,
    pub notion: NotionConfig,
    pub query: QueryConfig,
    pub client_label: String,
    pub concurrency: usize,
}

#[derive(Clone)]
pub struct JiraConfig {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
}

impl std::fmt::Debug for JiraConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraConfig")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct NotionConfig {
    pub token: String,
    pub database_id: String,
}

impl std::fmt::Debug for NotionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionConfig")
            .field("token", &"<redacted>")
            .field("database_id", &self.database_id)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueryConfig {
    pub project: String,
    /// Jira field holding the client name.
    pub client_field: String,
    pub client: String,
    pub excluded_statuses: Vec<String>,
    /// Checkbox-style field marking tickets visible to the customer.
    pub visibility_field: String,
    pub visibility_value: String,
    /// Numeric id of the "BT number" custom field, e.g. 10644.
    pub bt_field_id: u64,
    pub max_results: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            project: "GMI".into(),
            client_field: "client".into(),
            client: "US BANGLA".into(),
            excluded_statuses: vec!["Completed".into(), "REJECTED".into(), "ROLLBACKED".into()],
            visibility_field: "show to customer".into(),
            visibility_value: "Yes".into(),
            bt_field_id: 10644,
            max_results: 100,
        }
    }
}

impl QueryConfig {
    pub fn bt_field_key(&self) -> String {
        format!("customfield_{}", self.bt_field_id)
    }
}

/// Shape of the optional TOML file. Every key may be omitted.
#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub jira: Option<FileJiraConfig>,
    pub notion: Option<FileNotionConfig>,
    #[serde(default)]
    pub query: QueryConfig,
    pub sync: Option<FileSyncConfig>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FileJiraConfig {
    pub url: Option<String>,
    pub email: Option<String>,
    pub api_token: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FileNotionConfig {
    pub token: Option<String>,
    pub database_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FileSyncConfig {
    pub client_label: Option<String>,
    pub concurrency: Option<usize>,
}

fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".notion-sync")
        .join("config.toml")
}

/// Load configuration from the TOML file (if any) and the process environment.
pub fn load_config() -> Result<SyncConfig> {
    let path = std::env::var_os(ENV_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);
    let file = read_file_config(&path)?;
    resolve_config(file, |name| std::env::var(name).ok())
}

pub fn read_file_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: FileConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

/// Merge file settings with environment lookups; the environment wins.
pub fn resolve_config(
    file: FileConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<SyncConfig> {
    let lookup = |name: &str, fallback: Option<String>| {
        env(name)
            .filter(|v| !v.trim().is_empty())
            .or(fallback.filter(|v| !v.trim().is_empty()))
    };

    let jira = file.jira.unwrap_or_default();
    let notion = file.notion.unwrap_or_default();
    let sync = file.sync.unwrap_or_default();

    let base_url = lookup("JIRA_URL", jira.url);
    let email = lookup("JIRA_EMAIL", jira.email);
    let api_token = lookup("JIRA_API_TOKEN", jira.api_token);
    let token = lookup("NOTION_TOKEN", notion.token);
    let database_id = lookup("NOTION_DATABASE_ID", notion.database_id);

    let missing: Vec<&str> = [
        ("JIRA_URL", base_url.is_none()),
        ("JIRA_EMAIL", email.is_none()),
        ("JIRA_API_TOKEN", api_token.is_none()),
        ("NOTION_TOKEN", token.is_none()),
        ("NOTION_DATABASE_ID", database_id.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();

    if !missing.is_empty() {
        bail!("Missing required configuration: {}", missing.join(", "));
    }

    let concurrency = sync.concurrency.unwrap_or(1);
    if concurrency == 0 {
        bail!("sync.concurrency must be at least 1");
    }

    let query = file.query;
    let client_label = sync.client_label.unwrap_or_else(|| query.client.clone());

    Ok(SyncConfig {
        jira: JiraConfig {
            base_url: base_url.unwrap_or_default().trim_end_matches('/').to_string(),
            email: email.unwrap_or_default(),
            api_token: api_token.unwrap_or_default(),
        },
        notion: NotionConfig {
            token: token.unwrap_or_default(),
            database_id: database_id.unwrap_or_default(),
        },
        query,
        client_label,
        concurrency,
    })
}
