// src/session.rs
//! One agent session (connect, discover, poll) and the restart policy that
//! wraps it.
//!
//! Restart policy:
//! - soft failures (transport I/O, framing, field extraction) restart the
//!   session; at most `max_soft_restarts` in a row, and the streak resets
//!   whenever a session reaches the poll loop;
//! - every other failure is fatal and counts against `max_fatal_failures`
//!   for the whole process lifetime; reaching it ends the process.

use std::convert::Infallible;
use tracing::{error, info, warn};

use crate::channel::discord::DiscordClient;
use crate::config::{AgentConfig, Credential};
use crate::error::{Error, Result};
use crate::poll::Poller;
use crate::transport::{TlsTransport, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    pub max_soft_restarts: u32,
    pub max_fatal_failures: u32,
}

impl RestartPolicy {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            max_soft_restarts: config.max_soft_restarts,
            max_fatal_failures: config.max_fatal_failures,
        }
    }
}

/// How a session ended. Sessions never end without an error.
#[derive(Debug)]
pub struct SessionEnd {
    pub error: Error,
    /// Discovery succeeded and the poll loop was entered.
    pub reached_polling: bool,
}

/// Run one session over a transport produced by `connect`.
pub fn run_session_with<T, F>(connect: F, config: &AgentConfig, credential: &Credential) -> SessionEnd
where
    T: Transport,
    F: FnOnce() -> Result<T>,
{
    let mut reached_polling = false;
    let error = match session(connect, config, credential, &mut reached_polling) {
        Err(e) => e,
        Ok(never) => match never {},
    };
    SessionEnd {
        error,
        reached_polling,
    }
}

fn session<T, F>(
    connect: F,
    config: &AgentConfig,
    credential: &Credential,
    reached_polling: &mut bool,
) -> Result<Infallible>
where
    T: Transport,
    F: FnOnce() -> Result<T>,
{
    let transport = connect()?;
    let mut client = DiscordClient::new(transport, config, credential);
    let discovery = client.discover(&config.channel)?;

    *reached_polling = true;
    let mut poller = Poller::new(&discovery, config);
    poller.run(&mut client, config.poll_interval())
}

/// Run one session against the configured host over TLS.
pub fn run_session(config: &AgentConfig, credential: &Credential) -> SessionEnd {
    run_session_with(
        || TlsTransport::connect(&config.host, config.port),
        config,
        credential,
    )
}

/// Keep starting sessions until the policy says stop. Returns the error that
/// ended the process.
pub fn supervise<F>(policy: RestartPolicy, mut next_session: F) -> Error
where
    F: FnMut() -> SessionEnd,
{
    let mut soft_streak = 0u32;
    let mut fatal_count = 0u32;

    loop {
        let end = next_session();
        if end.reached_polling {
            soft_streak = 0;
        }

        let err = end.error;
        if err.is_soft() {
            soft_streak += 1;
            if soft_streak > policy.max_soft_restarts {
                error!(
                    error = %err,
                    code = err.exit_code(),
                    streak = soft_streak,
                    "too many consecutive failures, giving up"
                );
                return err;
            }
            warn!(
                error = %err,
                code = err.exit_code(),
                streak = soft_streak,
                "session failed, restarting (potential data loss)"
            );
        } else {
            fatal_count += 1;
            if fatal_count >= policy.max_fatal_failures {
                error!(
                    error = %err,
                    code = err.exit_code(),
                    failures = fatal_count,
                    "fatal error"
                );
                return err;
            }
            error!(
                error = %err,
                code = err.exit_code(),
                failures = fatal_count,
                "session failed, restarting (potential data loss)"
            );
        }
    }
}

/// Run the bot until it gives up.
pub fn run(config: &AgentConfig, credential: &Credential) -> Error {
    info!(host = %config.host, channel = %config.channel, "starting isabot");
    supervise(RestartPolicy::from_config(config), || {
        run_session(config, credential)
    })
}
