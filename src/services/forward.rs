use anyhow::anyhow;
use crossbeam_channel::Sender;
use tfvc_core::domain::events::Event;
use tfvc_core::engine::Listener;

/// Listener that hands every event to another thread over a channel.
///
/// Operations run on a worker thread; the main thread owns the terminal and
/// drains the receiving end. Once the receiver is gone, delivery fails and
/// the engine records a listener fault.
pub struct ChannelForwarder {
    tx: Sender<Event>,
}

impl ChannelForwarder {
    pub fn new(tx: Sender<Event>) -> Self {
        Self { tx }
    }
}

impl Listener for ChannelForwarder {
    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        self.tx
            .send(event.clone())
            .map_err(|_| anyhow!("event receiver disconnected"))
    }
}
