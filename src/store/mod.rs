pub mod notion;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::record::{RecordPage, RecordProperties};

/// Destination store holding one record per synced ticket.
#[async_trait]
pub trait RecordStore: Send + Sync {
    fn name(&self) -> &str;

    /// One page of records in `container` whose title contains `needle`,
    /// starting at `cursor` when given.
    async fn query_by_title(
        &self,
        container: &str,
        needle: &str,
        cursor: Option<&str>,
    ) -> Result<RecordPage, StoreError>;

    /// Create a record under `container`, returning its id.
    async fn create_record(
        &self,
        container: &str,
        properties: &RecordProperties,
    ) -> Result<String, StoreError>;

    /// Replace the listed properties of an existing record.
    async fn update_record(
        &self,
        record_id: &str,
        properties: &RecordProperties,
    ) -> Result<(), StoreError>;
}
