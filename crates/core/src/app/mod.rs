pub mod aggregator;
pub mod arguments;
pub mod connections;
pub mod display;
pub mod exit_code;
pub mod matcher;
pub mod resolver;
pub mod sink;

pub use aggregator::{NonFatalAggregator, NonFatalMessage, SummaryCounts, SUMMARY_THRESHOLD};
pub use arguments::{item_paths, parse_qualified_items, ArgumentRules};
pub use connections::ConnectionPool;
pub use display::{format_event, format_pending_change, status_message, DisplayState, Line};
pub use exit_code::{ExitCode, ExitCodeTracker};
pub use matcher::{MatchOutcome, PendingChangeMatcher};
pub use resolver::WorkspaceResolver;
pub use sink::EventSink;
