pub mod jira;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::model::ticket::Ticket;

/// Where tickets come from. An `Ok` with an empty list means nothing matched;
/// any failure to reach or read the source is an `Err`.
#[async_trait]
pub trait IssueSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_tickets(&self) -> Result<Vec<Ticket>, SourceError>;
}
