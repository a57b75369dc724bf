// src/poll.rs
//! The poll loop: fetch messages newer than the cursor, advance the cursor,
//! drop self/bot messages, and echo the rest oldest-first.

use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info};

use crate::channel::discord::Discovery;
use crate::channel::MessageChannel;
use crate::config::AgentConfig;
use crate::error::Result;
use crate::message::Message;

/// Last seen message id. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor(u64);

impl Cursor {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// Move to `id` if it is newer. Returns whether the cursor moved.
    pub fn advance(&mut self, id: u64) -> bool {
        if id > self.0 {
            self.0 = id;
            true
        } else {
            false
        }
    }
}

type EchoSink = Box<dyn FnMut(&str)>;

pub struct Poller {
    bot_id: u64,
    channel_id: u64,
    cursor: Cursor,
    bot_name_marker: String,
    verbose: bool,
    echo_sink: EchoSink,
}

impl Poller {
    pub fn new(discovery: &Discovery, config: &AgentConfig) -> Self {
        Self {
            bot_id: discovery.bot_id,
            channel_id: discovery.channel.id,
            cursor: Cursor::new(discovery.channel.last_message_id),
            bot_name_marker: config.bot_name_marker.clone(),
            verbose: config.verbose,
            echo_sink: Box::new(|line| println!("{line}")),
        }
    }

    /// Replace where verbose echoes are printed (stdout by default).
    pub fn with_echo_sink(mut self, sink: impl FnMut(&str) + 'static) -> Self {
        self.echo_sink = Box::new(sink);
        self
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Fetch one batch and return the messages worth answering, oldest first.
    /// The cursor advances to the newest id in the batch even when that
    /// message is filtered out.
    pub fn poll_once<C: MessageChannel>(&mut self, channel: &mut C) -> Result<Vec<Message>> {
        let mut batch = channel.fetch_after(self.channel_id, self.cursor.get())?;
        if batch.is_empty() {
            return Ok(batch);
        }

        if let Some(newest) = batch.iter().map(|m| m.id).max() {
            self.cursor.advance(newest);
        }
        debug!(
            fetched = batch.len(),
            cursor = self.cursor.get(),
            "fetched new messages"
        );

        batch.reverse();
        batch.retain(|m| !self.should_skip(m));
        Ok(batch)
    }

    fn should_skip(&self, message: &Message) -> bool {
        message.is_authored_by(self.bot_id) || message.author_looks_like_bot(&self.bot_name_marker)
    }

    /// Echo each message in order, printing each reply after it is posted
    /// when verbose. Returns how many were posted.
    pub fn dispatch<C: MessageChannel>(
        &mut self,
        channel: &mut C,
        messages: &[Message],
    ) -> Result<usize> {
        for message in messages {
            let reply = message.echo_text();
            channel.post_message(self.channel_id, &reply)?;
            debug!(message_id = message.id, "echoed message");
            if self.verbose {
                (self.echo_sink)(&reply);
            }
        }
        Ok(messages.len())
    }

    /// One full poll cycle without the cadence sleep.
    pub fn cycle<C: MessageChannel>(&mut self, channel: &mut C) -> Result<usize> {
        let messages = self.poll_once(channel)?;
        self.dispatch(channel, &messages)
    }

    /// Poll forever; only returns on failure.
    pub fn run<C: MessageChannel>(
        &mut self,
        channel: &mut C,
        interval: Duration,
    ) -> Result<Infallible> {
        info!(
            channel = self.channel_id,
            cursor = self.cursor.get(),
            interval_ms = interval.as_millis() as u64,
            "polling started"
        );
        loop {
            std::thread::sleep(interval);
            self.cycle(channel)?;
        }
    }
}
