use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::channel::MessageChannel;
use crate::config::{AgentConfig, Credential};
use crate::error::{Error, Result};
use crate::http::{Request, Response, ResponseReader};
use crate::message::{self, Message};
use crate::status::{classify, Outcome};
use crate::transport::Transport;

/// Channel located during discovery, with the cursor to start polling from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelTarget {
    pub id: u64,
    pub last_message_id: u64,
}

/// Everything resolved once at session start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub bot_id: u64,
    pub guilds: Vec<u64>,
    pub channel: ChannelTarget,
}

type Pause = Box<dyn FnMut(Duration)>;

/// Discord REST client speaking HTTP/1.1 over a single persistent transport.
pub struct DiscordClient<T: Transport> {
    transport: T,
    reader: ResponseReader,
    host: String,
    api_prefix: String,
    authorization: String,
    backoff: Duration,
    pause: Pause,
}

impl<T: Transport> DiscordClient<T> {
    pub fn new(transport: T, config: &AgentConfig, credential: &Credential) -> Self {
        Self {
            transport,
            reader: ResponseReader::new(),
            host: config.host.clone(),
            api_prefix: config.route(""),
            authorization: credential.authorization(&config.auth_scheme),
            backoff: config.backoff(),
            pause: Box::new(std::thread::sleep),
        }
    }

    /// Replace the function used to wait out 204/429 backoff.
    pub fn with_pause(mut self, pause: impl FnMut(Duration) + 'static) -> Self {
        self.pause = Box::new(pause);
        self
    }

    /// Access the underlying transport (for testing).
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn route(&self, path: &str) -> String {
        format!("{}{path}", self.api_prefix)
    }

    /// Send `request` until the response classifies as something other than a
    /// retry. Fatal statuses become [`Error::Status`].
    pub fn exchange(&mut self, request: &Request) -> Result<Response> {
        let bytes = request.encode(&self.host, &self.authorization);
        loop {
            self.transport.write_all(&bytes)?;
            let response = self.reader.read_response(&mut self.transport)?;
            match classify(response.status, self.backoff) {
                Outcome::Proceed => return Ok(response),
                Outcome::RetryAfter(delay) => {
                    debug!(
                        method = request.method(),
                        path = request.path(),
                        status = response.status,
                        delay_ms = delay.as_millis() as u64,
                        "backing off before retry"
                    );
                    (self.pause)(delay);
                }
                Outcome::Fatal(kind) => {
                    warn!(
                        method = request.method(),
                        path = request.path(),
                        status = response.status,
                        "request failed: {kind}"
                    );
                    return Err(Error::Status(kind));
                }
            }
        }
    }

    /// GET `path` (relative to the API prefix) and parse the body as JSON.
    pub fn get_json(&mut self, path: &str, context: &str) -> Result<Value> {
        let response = self.exchange(&Request::get(self.route(path)))?;
        serde_json::from_slice(&response.body)
            .map_err(|e| Error::field("body", context, format!("invalid JSON: {e}")))
    }

    pub fn get_bot_id(&mut self) -> Result<u64> {
        let json = self.get_json("/users/@me", "identity")?;
        parse_identity_response(&json)
    }

    pub fn get_guilds(&mut self) -> Result<Vec<u64>> {
        let json = self.get_json("/users/@me/guilds", "guild list")?;
        parse_guilds_response(&json)
    }

    /// Walk `guilds` in order and return the first channel named `name`.
    /// Remaining guilds are not queried once a match is found.
    pub fn find_channel(&mut self, guilds: &[u64], name: &str) -> Result<ChannelTarget> {
        for guild in guilds {
            let json = self.get_json(&format!("/guilds/{guild}/channels"), "channel list")?;
            if let Some(target) = parse_channels_response(json, name)? {
                debug!(guild, channel = target.id, "found target channel");
                return Ok(target);
            }
        }
        Err(Error::ChannelNotFound(name.to_string()))
    }

    /// Resolve bot identity, guild membership and the target channel.
    pub fn discover(&mut self, channel_name: &str) -> Result<Discovery> {
        let bot_id = self.get_bot_id()?;
        let guilds = self.get_guilds()?;
        let channel = self.find_channel(&guilds, channel_name)?;
        info!(
            bot_id,
            guilds = guilds.len(),
            channel = channel.id,
            cursor = channel.last_message_id,
            "discovery complete"
        );
        Ok(Discovery {
            bot_id,
            guilds,
            channel,
        })
    }
}

impl<T: Transport> MessageChannel for DiscordClient<T> {
    fn fetch_after(&mut self, channel_id: u64, after: u64) -> Result<Vec<Message>> {
        let json = self.get_json(
            &format!("/channels/{channel_id}/messages?after={after}"),
            "message list",
        )?;
        message::parse_messages_response(&json)
    }

    fn post_message(&mut self, channel_id: u64, content: &str) -> Result<()> {
        let request = Request::post(self.route(&format!("/channels/{channel_id}/messages")), content);
        self.exchange(&request)?;
        Ok(())
    }
}

// --- Response Parsers ---

pub fn parse_identity_response(json: &Value) -> Result<u64> {
    message::snowflake(json, "id", "identity")
}

/// Guild ids in the order listed. An empty membership is an error.
pub fn parse_guilds_response(json: &Value) -> Result<Vec<u64>> {
    let guilds = json
        .as_array()
        .ok_or_else(|| Error::field("guilds", "guild list", "expected a JSON array"))?;
    if guilds.is_empty() {
        return Err(Error::NoGuilds);
    }
    guilds
        .iter()
        .map(|guild| message::snowflake(guild, "id", "guild list"))
        .collect()
}

/// Find the first channel named exactly `name`. Returns `Ok(None)` when the
/// guild has no such channel.
pub fn parse_channels_response(mut json: Value, name: &str) -> Result<Option<ChannelTarget>> {
    const CONTEXT: &str = "channel list";
    let channels = json
        .as_array_mut()
        .ok_or_else(|| Error::field("channels", CONTEXT, "expected a JSON array"))?;

    for channel in channels.iter_mut() {
        strip_permission_overwrites(channel);
        if channel.get("name").and_then(Value::as_str) != Some(name) {
            continue;
        }
        return Ok(Some(ChannelTarget {
            id: message::snowflake(channel, "id", CONTEXT)?,
            last_message_id: message::snowflake(channel, "last_message_id", CONTEXT)?,
        }));
    }
    Ok(None)
}

/// Permission overwrites carry their own `id` fields and are never needed.
fn strip_permission_overwrites(channel: &mut Value) {
    if let Some(obj) = channel.as_object_mut() {
        obj.remove("permission_overwrites");
    }
}
