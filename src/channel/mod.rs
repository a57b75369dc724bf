pub mod discord;

use crate::error::Result;
use crate::message::Message;

/// Abstraction over the message backend the poll loop talks to. The
/// Discord client implements it on top of the raw HTTP codec; tests can
/// substitute an in-memory channel.
pub trait MessageChannel {
    /// Messages newer than `after` in `channel_id`, newest first as the API
    /// delivers them. Soft HTTP outcomes are retried inside the call.
    fn fetch_after(&mut self, channel_id: u64, after: u64) -> Result<Vec<Message>>;

    /// Post a message visible to humans.
    fn post_message(&mut self, channel_id: u64, content: &str) -> Result<()>;
}
