pub mod report;

use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use crate::config::SyncConfig;
use crate::error::{StoreError, SyncError};
use crate::model::record::RecordProperties;
use crate::model::ticket::Ticket;
use crate::source::IssueSource;
use crate::store::RecordStore;
use report::{FailedTicket, SyncReport};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Resolve every ticket but skip all writes.
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertAction {
    Created(String),
    Updated(String),
    WouldCreate,
    WouldUpdate(String),
}

/// Find the record already holding `key`, if any.
///
/// The store is queried by substring, then results are narrowed to titles
/// anchored on the key so that `GMI-1` does not match `GMI-10`. Pages are
/// followed until an anchored title turns up, since the substring query can
/// return many records of longer keys first. An error status from the store
/// is treated as "not found"; the caller will then create, which can
/// duplicate a record the store failed to report.
pub async fn resolve(
    store: &dyn RecordStore,
    config: &SyncConfig,
    key: &str,
) -> Result<Option<String>, StoreError> {
    let mut cursor: Option<String> = None;
    loop {
        let page = match store
            .query_by_title(&config.notion.database_id, key, cursor.as_deref())
            .await
        {
            Ok(page) => page,
            Err(StoreError::Status { status, body }) => {
                warn!(ticket = %key, status, %body, "record lookup failed, treating as not found");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if let Some(record) = page.records.into_iter().find(|r| r.is_for_ticket(key)) {
            return Ok(Some(record.id));
        }
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => return Ok(None),
        }
    }
}

/// Create or patch the record for one ticket.
pub async fn upsert(
    store: &dyn RecordStore,
    config: &SyncConfig,
    ticket: &Ticket,
    options: RunOptions,
) -> Result<UpsertAction, SyncError> {
    let properties = RecordProperties::from_ticket(ticket, &config.client_label);
    let existing = resolve(store, config, &ticket.key)
        .await
        .map_err(SyncError::Resolve)?;

    match (existing, options.dry_run) {
        (Some(record_id), true) => Ok(UpsertAction::WouldUpdate(record_id)),
        (None, true) => Ok(UpsertAction::WouldCreate),
        (Some(record_id), false) => {
            store
                .update_record(&record_id, &properties)
                .await
                .map_err(|source| SyncError::Update {
                    record_id: record_id.clone(),
                    source,
                })?;
            Ok(UpsertAction::Updated(record_id))
        }
        (None, false) => {
            let record_id = store
                .create_record(&config.notion.database_id, &properties)
                .await
                .map_err(SyncError::Create)?;
            Ok(UpsertAction::Created(record_id))
        }
    }
}

/// Fetch once, then upsert every ticket in source order. Failures are
/// isolated per ticket and collected in the report.
pub async fn run(
    source: &dyn IssueSource,
    store: &dyn RecordStore,
    config: &SyncConfig,
    options: RunOptions,
) -> SyncReport {
    let mut report = SyncReport::begin(options.dry_run);

    info!(source = source.name(), "fetching tickets");
    let tickets = match source.fetch_tickets().await {
        Ok(tickets) => tickets,
        Err(e) => {
            error!(source = source.name(), error = %e, "fetch failed, nothing synced");
            report.fetch_error = Some(e.to_string());
            return report.finish();
        }
    };

    report.fetched = tickets.len();
    if tickets.is_empty() {
        info!("no matching tickets");
        return report.finish();
    }
    info!(count = tickets.len(), store = store.name(), "syncing tickets");

    let results: Vec<(String, Result<UpsertAction, SyncError>)> = stream::iter(tickets)
        .map(|ticket| async move {
            let result = upsert(store, config, &ticket, options).await;
            (ticket.key, result)
        })
        .buffered(config.concurrency.max(1))
        .collect()
        .await;

    for (key, result) in results {
        match result {
            Ok(UpsertAction::Created(record_id)) => {
                info!(ticket = %key, record = %record_id, "created record");
                report.created.push(key);
            }
            Ok(UpsertAction::Updated(record_id)) => {
                info!(ticket = %key, record = %record_id, "updated record");
                report.updated.push(key);
            }
            Ok(UpsertAction::WouldCreate) => {
                info!(ticket = %key, "dry run: would create record");
                report.created.push(key);
            }
            Ok(UpsertAction::WouldUpdate(record_id)) => {
                info!(ticket = %key, record = %record_id, "dry run: would update record");
                report.updated.push(key);
            }
            Err(e) => {
                error!(ticket = %key, error = %e, "sync failed");
                report.failed.push(FailedTicket {
                    key,
                    error: e.to_string(),
                });
            }
        }
    }

    let report = report.finish();
    info!(
        created = report.created.len(),
        updated = report.updated.len(),
        failed = report.failed.len(),
        "sync finished"
    );
    if !report.failed.is_empty() {
        warn!(tickets = ?report.failed_keys(), "some tickets were not synced");
    }
    report
}
