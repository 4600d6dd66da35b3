use std::sync::Arc;

use super::aggregator::NonFatalAggregator;
use crate::domain::events::{Event, EventCategory};
use crate::engine::Listener;

/// Categories a command's aggregator listens to
pub const CATEGORIES: [EventCategory; 8] = [
    EventCategory::Get,
    EventCategory::Merging,
    EventCategory::NewPendingChange,
    EventCategory::UndonePendingChange,
    EventCategory::Destroy,
    EventCategory::ConflictResolved,
    EventCategory::Conflict,
    EventCategory::NonFatalError,
];

/// Feeds engine events into a [`NonFatalAggregator`]
pub struct EventSink {
    aggregator: Arc<NonFatalAggregator>,
}

impl EventSink {
    pub fn new(aggregator: Arc<NonFatalAggregator>) -> Self {
        Self { aggregator }
    }
}

impl Listener for EventSink {
    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        self.aggregator.apply(event);
        Ok(())
    }
}
