use thiserror::Error;

const MAX_BODY_LEN: usize = 200;

/// Failure fetching tickets from the issue source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("issue source returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("issue source request failed: {0}")]
    Transport(String),
    #[error("failed to decode issue source response: {0}")]
    Decode(String),
}

/// Failure talking to the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("record store request failed: {0}")]
    Transport(String),
    #[error("failed to decode record store response: {0}")]
    Decode(String),
}

/// Failure syncing a single ticket.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("lookup failed: {0}")]
    Resolve(#[source] StoreError),
    #[error("create failed: {0}")]
    Create(#[source] StoreError),
    #[error("update of record {record_id} failed: {source}")]
    Update {
        record_id: String,
        #[source]
        source: StoreError,
    },
}

pub fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_BODY_LEN {
        body.to_owned()
    } else {
        format!("{}...", body.chars().take(MAX_BODY_LEN).collect::<String>())
    }
}
