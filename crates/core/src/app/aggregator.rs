use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::display;
use super::exit_code::{ExitCode, ExitCodeTracker};
use crate::domain::events::{Event, EventKind, NonFatalError};
use crate::domain::status::{OperationStatus, Severity};

/// Minimum number of item operations before problems are summarized.
pub const SUMMARY_THRESHOLD: usize = 10;

/// A problem kept for the end-of-operation summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonFatalMessage {
    pub severity: Severity,
    pub message: String,
}

impl NonFatalMessage {
    pub fn line(&self) -> String {
        match self.severity {
            Severity::Error => format!("error: {}", self.message),
            Severity::Warning => format!("warning: {}", self.message),
        }
    }
}

/// Counters accumulated over one command invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryCounts {
    pub errors: usize,
    pub warnings: usize,
    pub conflicts: usize,
    /// Items skipped with a warning status (writable target and so on)
    pub operation_warnings: usize,
    /// Item events seen, compared against [`SUMMARY_THRESHOLD`]
    pub operations: usize,
}

impl SummaryCounts {
    pub fn problems(&self) -> usize {
        self.errors + self.warnings + self.conflicts + self.operation_warnings
    }
}

#[derive(Debug, Default)]
struct Tally {
    counts: SummaryCounts,
    messages: Vec<NonFatalMessage>,
    exit_code: ExitCodeTracker,
}

/// Collects non-fatal errors and warnings while an operation runs.
///
/// Events may arrive from a background operation thread; all bookkeeping
/// happens under one lock. Printing the summary happens afterwards.
#[derive(Debug, Default)]
pub struct NonFatalAggregator {
    tally: Mutex<Tally>,
}

impl NonFatalAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an event to the counters
    pub fn apply(&self, event: &Event) {
        let category = event.category();
        let mut tally = self.tally();

        if category.is_item_operation() {
            tally.counts.operations += 1;
        }

        match &event.kind {
            EventKind::Get(get) => {
                let path = get
                    .local_item()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| get.server_item.clone());
                record_status(&mut tally, &path, get.status);
            }
            EventKind::Merging(merging) => {
                let path = merging
                    .target_local_item
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| merging.server_item.clone());
                record_status(&mut tally, &path, merging.status);
            }
            EventKind::Conflict {
                server_item,
                message,
                ..
            } => {
                tally.counts.conflicts += 1;
                tally.messages.push(NonFatalMessage {
                    severity: Severity::Error,
                    message: format!("{}: {}", server_item, message),
                });
                tally.exit_code.escalate();
            }
            EventKind::NonFatalError(error) => record_non_fatal(&mut tally, error),
            _ => {}
        }
    }

    pub fn record_non_fatal(&self, error: &NonFatalError) {
        record_non_fatal(&mut self.tally(), error);
    }

    pub fn record_warning(&self, message: impl Into<String>) {
        record_non_fatal(&mut self.tally(), &NonFatalError::warning(message));
    }

    /// Record an error raised while the operation kept going.
    pub fn record_failure(&self, error: &anyhow::Error) {
        record_non_fatal(&mut self.tally(), &NonFatalError::error(format!("{:#}", error)));
    }

    pub fn set_exit_code(&self, code: ExitCode) {
        self.tally().exit_code.set(code);
    }

    pub fn exit_code(&self) -> ExitCode {
        self.tally().exit_code.value()
    }

    pub fn counts(&self) -> SummaryCounts {
        self.tally().counts
    }

    pub fn messages(&self) -> Vec<NonFatalMessage> {
        self.tally().messages.clone()
    }

    /// Clear everything for the next command invocation.
    pub fn reset(&self) {
        *self.tally() = Tally::default();
    }

    /// Summaries only pay off on large batches; below the threshold each
    /// message has already been shown inline.
    pub fn should_summarize(&self, summaries_enabled: bool) -> bool {
        let counts = self.counts();
        summaries_enabled && counts.problems() > 0 && counts.operations >= SUMMARY_THRESHOLD
    }

    /// Lines of the end-of-operation summary, or nothing when no summary
    /// is due.
    pub fn summary_lines(&self, summaries_enabled: bool) -> Vec<String> {
        if !self.should_summarize(summaries_enabled) {
            return Vec::new();
        }

        let tally = self.tally();
        let counts = tally.counts;
        let mut lines = vec![format!(
            "---- Summary: {} conflicts, {} warnings, {} errors ----",
            counts.conflicts,
            counts.warnings + counts.operation_warnings,
            counts.errors
        )];
        lines.extend(tally.messages.iter().map(NonFatalMessage::line));
        lines
    }

    /// Every recorded message, one line each, for printing inline.
    pub fn message_lines(&self) -> Vec<String> {
        self.tally().messages.iter().map(NonFatalMessage::line).collect()
    }

    fn tally(&self) -> MutexGuard<'_, Tally> {
        self.tally.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn record_status(tally: &mut Tally, path: &str, status: OperationStatus) {
    if status.is_conflict() {
        tally.counts.conflicts += 1;
    } else if status.is_warning() {
        tally.counts.operation_warnings += 1;
    } else {
        return;
    }

    tally.messages.push(NonFatalMessage {
        severity: if status.is_conflict() {
            Severity::Error
        } else {
            Severity::Warning
        },
        message: display::status_message(path, status),
    });
    tally.exit_code.escalate();
}

fn record_non_fatal(tally: &mut Tally, error: &NonFatalError) {
    match error.severity {
        Severity::Error => tally.counts.errors += 1,
        Severity::Warning => tally.counts.warnings += 1,
    }

    if error.escalates() {
        tally.exit_code.escalate();
    } else if let Some(cause) = &error.cause {
        debug!("Not escalating non-fatal error with benign cause: {}", cause);
    }

    if error.severity == Severity::Error {
        warn!("Non-fatal error: {}", error.message);
    }
    tally.messages.push(NonFatalMessage {
        severity: error.severity,
        message: error.message.clone(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::change::{ChangeType, ItemType};
    use crate::domain::events::GetEvent;
    use crate::domain::item::{PendingChange, WorkspaceKey};
    use crate::domain::source::EventSource;
    use crate::domain::status::NonFatalCause;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::thread;

    fn key() -> WorkspaceKey {
        WorkspaceKey {
            name: "ws".to_string(),
            owner: "alice".to_string(),
        }
    }

    fn get(status: OperationStatus) -> Event {
        Event::new(
            EventSource::capture(),
            EventKind::Get(GetEvent {
                operation_id: 1,
                workspace: key(),
                status,
                server_item: "$/proj/a.txt".to_string(),
                source_local_item: None,
                target_local_item: Some(PathBuf::from("/ws/proj/a.txt")),
                version: 4,
                change_type: ChangeType::EDIT,
                item_type: ItemType::File,
            }),
        )
    }

    fn warning(message: &str) -> Event {
        Event::new(
            EventSource::capture(),
            EventKind::NonFatalError(NonFatalError::warning(message)),
        )
    }

    fn undone() -> Event {
        Event::new(
            EventSource::capture(),
            EventKind::UndonePendingChange {
                workspace: key(),
                change: PendingChange::new("$/proj/a.txt", ChangeType::EDIT),
            },
        )
    }

    #[test]
    fn test_below_threshold_does_not_summarize() {
        let aggregator = NonFatalAggregator::new();
        for i in 0..9 {
            aggregator.apply(&warning(&format!("warning {}", i)));
            aggregator.apply(&undone());
        }

        let counts = aggregator.counts();
        assert_eq!(counts.warnings, 9);
        assert_eq!(counts.errors, 0);
        assert_eq!(counts.operations, 9);
        assert!(!aggregator.should_summarize(true));
        assert!(aggregator.summary_lines(true).is_empty());
    }

    #[test]
    fn test_threshold_reached_with_one_warning_summarizes() {
        let aggregator = NonFatalAggregator::new();
        for _ in 0..10 {
            aggregator.apply(&get(OperationStatus::Getting));
        }
        aggregator.apply(&warning("disk nearly full"));

        assert!(aggregator.should_summarize(true));
        assert!(!aggregator.should_summarize(false));
        let lines = aggregator.summary_lines(true);
        assert_eq!(lines[0], "---- Summary: 0 conflicts, 1 warnings, 0 errors ----");
        assert_eq!(lines[1], "warning: disk nearly full");
    }

    #[test]
    fn test_message_lines_keep_recording_order() {
        let aggregator = NonFatalAggregator::new();
        aggregator.record_warning("slow disk");
        aggregator.record_non_fatal(&NonFatalError::error("write failed"));
        assert_eq!(
            aggregator.message_lines(),
            vec!["warning: slow disk", "error: write failed"]
        );
    }

    #[test]
    fn test_no_problems_no_summary() {
        let aggregator = NonFatalAggregator::new();
        for _ in 0..20 {
            aggregator.apply(&get(OperationStatus::Replacing));
        }
        assert!(!aggregator.should_summarize(true));
        assert_eq!(aggregator.exit_code(), ExitCode::Success);
    }

    #[test]
    fn test_errors_escalate_exit_code() {
        let aggregator = NonFatalAggregator::new();
        aggregator.record_non_fatal(&NonFatalError::error("write failed"));
        assert_eq!(aggregator.exit_code(), ExitCode::PartialSuccess);
        assert_eq!(aggregator.counts().errors, 1);
    }

    #[test]
    fn test_benign_proxy_error_is_counted_but_not_escalated() {
        let aggregator = NonFatalAggregator::new();
        aggregator.record_non_fatal(
            &NonFatalError::error("proxy unavailable, using server").with_cause(
                NonFatalCause::ProxyUnavailable {
                    proxy_url: "http://proxy:8081".to_string(),
                },
            ),
        );
        assert_eq!(aggregator.counts().errors, 1);
        assert_eq!(aggregator.exit_code(), ExitCode::Success);
    }

    #[test]
    fn test_status_classification() {
        let aggregator = NonFatalAggregator::new();
        aggregator.apply(&get(OperationStatus::Conflict));
        aggregator.apply(&get(OperationStatus::TargetWritable));
        aggregator.apply(&get(OperationStatus::Getting));

        let counts = aggregator.counts();
        assert_eq!(counts.conflicts, 1);
        assert_eq!(counts.operation_warnings, 1);
        assert_eq!(counts.operations, 3);
        assert_eq!(aggregator.messages().len(), 2);
        assert_eq!(aggregator.exit_code(), ExitCode::PartialSuccess);
    }

    #[test]
    fn test_failure_counts_as_error() {
        let aggregator = NonFatalAggregator::new();
        aggregator.record_failure(&anyhow::anyhow!("connection reset"));
        assert_eq!(aggregator.counts().errors, 1);
        assert_eq!(aggregator.messages()[0].message, "connection reset");
    }

    #[test]
    fn test_reset_clears_everything() {
        let aggregator = NonFatalAggregator::new();
        aggregator.apply(&get(OperationStatus::Conflict));
        aggregator.reset();
        assert_eq!(aggregator.counts(), SummaryCounts::default());
        assert!(aggregator.messages().is_empty());
        assert_eq!(aggregator.exit_code(), ExitCode::Success);
    }

    #[test]
    fn test_concurrent_recording() {
        let aggregator = Arc::new(NonFatalAggregator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let aggregator = aggregator.clone();
                thread::spawn(move || {
                    for _ in 0..250 {
                        aggregator.record_warning("slow disk");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(aggregator.counts().warnings, 1000);
        assert_eq!(aggregator.messages().len(), 1000);
    }
}
