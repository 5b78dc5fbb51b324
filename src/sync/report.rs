use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Success,
    PartialFailure,
    FetchFailed,
}

impl SyncOutcome {
    pub fn exit_code(self) -> u8 {
        match self {
            SyncOutcome::Success => 0,
            SyncOutcome::PartialFailure => 1,
            SyncOutcome::FetchFailed => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedTicket {
    pub key: String,
    pub error: String,
}

/// Machine-readable summary of one run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub started_at: String,
    pub finished_at: String,
    pub dry_run: bool,
    pub outcome: SyncOutcome,
    pub fetched: usize,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub failed: Vec<FailedTicket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
}

impl SyncReport {
    pub fn begin(dry_run: bool) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            started_at: now.clone(),
            finished_at: now,
            dry_run,
            outcome: SyncOutcome::Success,
            fetched: 0,
            created: Vec::new(),
            updated: Vec::new(),
            failed: Vec::new(),
            fetch_error: None,
        }
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = chrono::Utc::now().to_rfc3339();
        if self.fetch_error.is_some() {
            self.outcome = SyncOutcome::FetchFailed;
        } else if !self.failed.is_empty() {
            self.outcome = SyncOutcome::PartialFailure;
        } else {
            self.outcome = SyncOutcome::Success;
        }
        self
    }

    pub fn failed_keys(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.key.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_follows_failures() {
        let report = SyncReport::begin(false).finish();
        assert_eq!(report.outcome, SyncOutcome::Success);
        assert_eq!(report.outcome.exit_code(), 0);

        let mut report = SyncReport::begin(false);
        report.failed.push(FailedTicket {
            key: "GMI-1".into(),
            error: "boom".into(),
        });
        let report = report.finish();
        assert_eq!(report.outcome, SyncOutcome::PartialFailure);
        assert_eq!(report.failed_keys(), vec!["GMI-1"]);

        let mut report = SyncReport::begin(false);
        report.fetch_error = Some("HTTP 401".into());
        assert_eq!(report.finish().outcome.exit_code(), 2);
    }

    #[test]
    fn serializes_outcome_as_snake_case() {
        let mut report = SyncReport::begin(true);
        report.failed.push(FailedTicket {
            key: "GMI-2".into(),
            error: "x".into(),
        });
        let json = serde_json::to_value(report.finish()).unwrap();
        assert_eq!(json["outcome"], "partial_failure");
        assert_eq!(json["dry_run"], true);
        assert!(json.get("fetch_error").is_none());
    }
}
