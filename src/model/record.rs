use crate::model::ticket::Ticket;

/// Tracked fields written to a destination record on every sync.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordProperties {
    pub title: String,
    pub status: String,
    pub client: String,
    pub priority: Option<String>,
    pub bt_number: Option<String>,
    pub show_to_customer: bool,
}

impl RecordProperties {
    pub fn from_ticket(ticket: &Ticket, client_label: &str) -> Self {
        let summary = ticket.summary.as_deref().unwrap_or("No title");
        Self {
            title: format!("{}: {summary}", ticket.key),
            status: ticket.status.clone().unwrap_or_else(|| "Unknown".into()),
            client: client_label.to_string(),
            priority: ticket.priority.clone(),
            bt_number: ticket.bt_number.clone().filter(|b| !b.trim().is_empty()),
            show_to_customer: true,
        }
    }
}

/// A destination record as returned by a title query.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSummary {
    pub id: String,
    pub title: String,
}

/// One page of title-query results. `next_cursor` is set while the store
/// holds more matches.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordPage {
    pub records: Vec<RecordSummary>,
    pub next_cursor: Option<String>,
}

impl RecordSummary {
    /// True when the title belongs to `key` rather than merely containing it,
    /// so `GMI-1` never claims the record of `GMI-10`.
    pub fn is_for_ticket(&self, key: &str) -> bool {
        let title = self.title.trim();
        match title.strip_prefix(key) {
            Some(rest) => rest.is_empty() || rest.starts_with(':'),
            None => false,
        }
    }
}
