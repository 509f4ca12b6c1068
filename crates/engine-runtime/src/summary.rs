use serde::Serialize;

/// How the run's destination transaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Committed,
    RolledBack,
}

/// What one finished run did, for the operator.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub rows_planned: u64,
    pub rows_copied: u64,
    pub outcome: RunOutcome,
    /// One message per worker whose copy loop failed, in partition order.
    pub worker_errors: Vec<String>,
    pub elapsed_ms: u64,
}

impl RunSummary {
    pub fn committed(&self) -> bool {
        self.outcome == RunOutcome::Committed
    }
}
