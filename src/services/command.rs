use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tfvc_core::app::{
    format_event, format_pending_change, item_paths, parse_qualified_items, ArgumentRules,
    ConnectionPool, DisplayState, EventSink, ExitCode, Line, NonFatalAggregator,
    PendingChangeMatcher, WorkspaceResolver,
};
use tfvc_core::app::sink::CATEGORIES;
use tfvc_core::domain::events::{Event, EventCategory, EventKind, NonFatalError};
use tfvc_core::domain::item::{PendingChange, WorkspaceInfo};
use tfvc_core::domain::source::EventSource;
use tfvc_core::domain::status::OperationKind;
use tfvc_core::engine::{EventEngine, Listener, ListenerId};
use tfvc_core::ports::{LocalItems, PendingChangeSource, WorkspaceCache};
use tracing::{debug, info};

use super::forward::ChannelForwarder;

/// Opens the pending-change source for a collection URI
pub type Connector = Box<dyn Fn(&str) -> Result<Box<dyn PendingChangeSource>> + Send + Sync>;

/// Categories the main thread prints while an undo runs. Problems are not
/// among them: the aggregator prints those once the operation is over.
const UNDO_DISPLAY_CATEGORIES: [EventCategory; 3] = [
    EventCategory::UndonePendingChange,
    EventCategory::OperationStarted,
    EventCategory::OperationCompleted,
];

/// Settings that apply to every command of one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOptions {
    /// `name[;owner]` of the workspace to use instead of inferring it
    pub workspace: Option<String>,
    /// Only consider workspaces on this collection
    pub collection: Option<String>,
    pub show_summary: bool,
}

/// Where command output goes
pub struct Console<'a> {
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
}

impl Console<'_> {
    fn print(&mut self, line: &Line) -> Result<()> {
        match line {
            Line::Out(text) => writeln!(self.out, "{}", text)?,
            Line::Err(text) => writeln!(self.err, "{}", text)?,
        }
        Ok(())
    }
}

/// Everything one command invocation needs, wired together.
///
/// Owns the event engine, the reconciliation aggregator and its listener,
/// and the pool of open server connections.
pub struct CommandContext {
    engine: Arc<EventEngine>,
    cache: Arc<dyn WorkspaceCache>,
    resolver: WorkspaceResolver,
    matcher: PendingChangeMatcher,
    connections: ConnectionPool<Box<dyn PendingChangeSource>>,
    connector: Connector,
    aggregator: Arc<NonFatalAggregator>,
    options: CommandOptions,
}

impl CommandContext {
    pub fn new(
        cache: Arc<dyn WorkspaceCache>,
        local_items: Arc<dyn LocalItems>,
        connector: Connector,
        cwd: impl Into<PathBuf>,
        options: CommandOptions,
    ) -> Self {
        let cwd = cwd.into();
        let resolver = WorkspaceResolver::new(cache.clone(), cwd.clone())
            .with_workspace_option(options.workspace.clone())
            .with_server_filter(options.collection.clone());
        Self {
            engine: Arc::new(EventEngine::new()),
            cache,
            resolver,
            matcher: PendingChangeMatcher::new(local_items, cwd),
            connections: ConnectionPool::new(),
            connector,
            aggregator: Arc::new(NonFatalAggregator::new()),
            options,
        }
    }

    pub fn engine(&self) -> &Arc<EventEngine> {
        &self.engine
    }

    pub fn aggregator(&self) -> &Arc<NonFatalAggregator> {
        &self.aggregator
    }

    /// List the cached workspaces, optionally limited to one collection.
    pub fn run_workspaces(&self, console: &mut Console<'_>) -> Result<ExitCode> {
        let workspaces = self
            .cache
            .query_workspaces(self.options.collection.as_deref(), None, None)?;

        if workspaces.is_empty() {
            writeln!(console.out, "No workspaces found.")?;
            return Ok(ExitCode::Success);
        }

        for ws in &workspaces {
            writeln!(console.out, "{}", ws)?;
            for folder in &ws.working_folders {
                let local = if folder.cloaked {
                    "(cloaked)".to_string()
                } else {
                    folder.local_item.display().to_string()
                };
                writeln!(console.out, "  {}: {}", folder.server_item, local)?;
            }
        }
        Ok(ExitCode::Success)
    }

    /// Show the pending changes named by `args` (all of them when none are given).
    pub fn run_status(
        &self,
        args: &[String],
        recursive: bool,
        console: &mut Console<'_>,
    ) -> Result<ExitCode> {
        self.aggregator.reset();
        let (_, changes) = self.select_changes(args, recursive, false)?;

        if changes.is_empty() {
            writeln!(console.out, "There are no pending changes.")?;
        } else {
            let mut state = DisplayState::new();
            for change in &changes {
                for line in format_pending_change(change, &mut state) {
                    console.print(&line)?;
                }
            }
            writeln!(console.out)?;
            writeln!(console.out, "{} change(s)", changes.len())?;
        }

        self.finish(console)
    }

    /// Undo the pending changes named by `args`.
    ///
    /// The undo runs on a worker thread that fires events through the
    /// engine; this thread formats them as they arrive.
    pub fn run_undo(
        &self,
        args: &[String],
        recursive: bool,
        console: &mut Console<'_>,
    ) -> Result<ExitCode> {
        self.aggregator.reset();
        let (workspace, changes) = self.select_changes(args, recursive, true)?;
        if changes.is_empty() {
            writeln!(console.out, "There are no pending changes.")?;
            return self.finish(console);
        }

        let source = self.connect(&workspace)?;
        let sink: Arc<dyn Listener> = Arc::new(EventSink::new(self.aggregator.clone()));
        let _sink = Unregister {
            engine: &self.engine,
            id: self.engine.register_all(&CATEGORIES, sink),
        };

        let (tx, rx) = crossbeam_channel::unbounded();
        let forwarder: Arc<dyn Listener> = Arc::new(ChannelForwarder::new(tx));
        let forwarder_id = self.engine.register_all(&UNDO_DISPLAY_CATEGORIES, forwarder);
        let forwarder_guard = Unregister {
            engine: &self.engine,
            id: forwarder_id,
        };

        let event_source = EventSource::capture();
        info!("Undoing {} change(s) in {} ({})", changes.len(), workspace, event_source);

        let engine = self.engine.clone();
        let worker = thread::Builder::new()
            .name("undo".to_string())
            .spawn(move || {
                let _forwarder = Unregister {
                    engine: &engine,
                    id: forwarder_id,
                };
                undo_worker(&engine, &event_source, &**source, &workspace, &changes);
            })
            .context("Failed to start undo worker")?;
        // The worker removes the forwarder from here on
        forwarder_guard.release();

        let printed = drain(&rx, console);
        let joined = worker.join();
        printed?;
        if joined.is_err() {
            self.aggregator.set_exit_code(ExitCode::Failure);
            anyhow::bail!("Undo worker panicked");
        }

        self.finish(console)
    }

    /// Drop open connections at the end of the invocation.
    pub fn close(&self) -> usize {
        self.connections.close_all()
    }

    /// Parse `args`, resolve the workspace and pick the matching changes.
    fn select_changes(
        &self,
        args: &[String],
        recursive: bool,
        require_items: bool,
    ) -> Result<(WorkspaceInfo, Vec<PendingChange>)> {
        let rules = ArgumentRules {
            require_items,
            ..ArgumentRules::default()
        };
        let items = parse_qualified_items(args, rules)?;
        let paths = item_paths(&items);

        let workspace = self.resolver.determine_cached_workspace(&paths, false)?;
        debug!("Using workspace {}", workspace);

        let source = self.connect(&workspace)?;
        let pending = source.pending_changes(&workspace)?;
        if paths.is_empty() {
            return Ok((workspace, pending));
        }

        let outcome = self
            .matcher
            .match_pending_changes(&workspace, &pending, recursive, &paths)?;
        for wildcard in &outcome.unmatched_wildcards {
            self.aggregator
                .record_warning(format!("No pending changes were found for {}", wildcard));
            self.aggregator.set_exit_code(ExitCode::PartialSuccess);
        }
        Ok((workspace, outcome.changes))
    }

    fn connect(&self, workspace: &WorkspaceInfo) -> Result<Arc<Box<dyn PendingChangeSource>>> {
        self.connections
            .get_or_connect(&workspace.server_uri, |uri| (self.connector)(uri))
            .with_context(|| format!("Failed to connect to {}", workspace.server_uri))
    }

    /// Report the problems recorded during the operation: the summary on
    /// large batches, otherwise each message on its own.
    fn finish(&self, console: &mut Console<'_>) -> Result<ExitCode> {
        if self.aggregator.should_summarize(self.options.show_summary) {
            writeln!(console.err)?;
            for line in self.aggregator.summary_lines(self.options.show_summary) {
                writeln!(console.err, "{}", line)?;
            }
        } else {
            for line in self.aggregator.message_lines() {
                writeln!(console.err, "{}", line)?;
            }
        }
        Ok(self.aggregator.exit_code())
    }
}

fn undo_worker(
    engine: &EventEngine,
    event_source: &EventSource,
    source: &dyn PendingChangeSource,
    workspace: &WorkspaceInfo,
    changes: &[PendingChange],
) {
    let operation = OperationKind::Undo;
    engine.fire(event_source, EventKind::OperationStarted { operation });

    match source.undo_pending_changes(workspace, changes) {
        Ok(undone) => {
            for change in undone {
                engine.fire(
                    event_source,
                    EventKind::UndonePendingChange {
                        workspace: workspace.key(),
                        change,
                    },
                );
            }
            engine.fire(
                event_source,
                EventKind::PendingChangesChanged {
                    workspace: workspace.key(),
                },
            );
        }
        Err(e) => {
            let error = NonFatalError::error(format!("{:#}", e)).with_workspace(workspace.key());
            engine.fire(event_source, EventKind::NonFatalError(error));
        }
    }

    engine.fire(event_source, EventKind::OperationCompleted { operation });
}

/// Unregisters a listener when dropped, even if the worker panics. Dropping
/// the forwarder closes its channel and ends [`drain`].
struct Unregister<'a> {
    engine: &'a EventEngine,
    id: Option<ListenerId>,
}

impl Unregister<'_> {
    /// Hand responsibility for the listener to someone else.
    fn release(mut self) {
        self.id = None;
    }
}

impl Drop for Unregister<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id {
            self.engine.unregister_all(id);
        }
    }
}

/// Print forwarded events until the worker closes the channel.
fn drain(rx: &Receiver<Event>, console: &mut Console<'_>) -> Result<()> {
    let mut state = DisplayState::new();
    for event in rx.iter() {
        for line in format_event(&event, &mut state) {
            console.print(&line)?;
        }
    }
    Ok(())
}
