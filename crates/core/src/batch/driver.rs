//! Sequential batch driver.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::reconciler::{ReconcileAction, Reconciler};

use super::pacer::Pacer;
use super::plan::ResolvedMeeting;

/// Outcome of one plan entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryStatus {
    Created { meeting_id: u64, join_url: String },
    Updated { meeting_id: u64, join_url: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry {
    pub identifier: String,
    #[serde(flatten)]
    pub status: EntryStatus,
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
    /// The run stopped at the first failure.
    pub aborted: bool,
}

impl BatchReport {
    fn count(&self, pred: impl Fn(&EntryStatus) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.status)).count()
    }

    pub fn created(&self) -> usize {
        self.count(|s| matches!(s, EntryStatus::Created { .. }))
    }

    pub fn updated(&self) -> usize {
        self.count(|s| matches!(s, EntryStatus::Updated { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, EntryStatus::Failed { .. }))
    }

    pub fn is_success(&self) -> bool {
        !self.aborted && self.failed() == 0
    }
}

/// Reconciles plan entries one after another, pacing calls.
pub struct BatchDriver {
    reconciler: Arc<Reconciler>,
    pacer: Box<dyn Pacer>,
    continue_on_error: bool,
}

impl BatchDriver {
    pub fn new(reconciler: Arc<Reconciler>, pacer: Box<dyn Pacer>) -> Self {
        Self {
            reconciler,
            pacer,
            continue_on_error: true,
        }
    }

    /// Whether to keep going after a failed entry (default: true).
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    pub async fn run(&self, meetings: &[ResolvedMeeting]) -> BatchReport {
        let mut report = BatchReport::default();

        for (index, meeting) in meetings.iter().enumerate() {
            self.pacer.ready().await;

            let result = self
                .reconciler
                .reconcile_outcome(&meeting.identifier, &meeting.owner_email, &meeting.config)
                .await;

            let status = match result {
                Ok(outcome) => {
                    info!(
                        "[{}/{}] {} {} (meeting {})",
                        index + 1,
                        meetings.len(),
                        outcome.action,
                        meeting.identifier,
                        outcome.meeting.id
                    );
                    match outcome.action {
                        ReconcileAction::Created => EntryStatus::Created {
                            meeting_id: outcome.meeting.id,
                            join_url: outcome.meeting.join_url,
                        },
                        ReconcileAction::Updated => EntryStatus::Updated {
                            meeting_id: outcome.meeting.id,
                            join_url: outcome.meeting.join_url,
                        },
                    }
                }
                Err(e) => {
                    warn!(
                        "[{}/{}] {} failed: {}",
                        index + 1,
                        meetings.len(),
                        meeting.identifier,
                        e
                    );
                    EntryStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };

            let failed = matches!(status, EntryStatus::Failed { .. });
            report.entries.push(BatchEntry {
                identifier: meeting.identifier.to_string(),
                status,
            });

            if failed && !self.continue_on_error {
                warn!("Stopping batch after failure of {}", meeting.identifier);
                report.aborted = true;
                break;
            }
        }

        info!(
            "Batch finished: {} created, {} updated, {} failed",
            report.created(),
            report.updated(),
            report.failed()
        );
        report
    }
}
