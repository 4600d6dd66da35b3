pub mod command;
pub mod forward;

pub use command::{CommandContext, CommandOptions, Connector, Console};
pub use forward::ChannelForwarder;
