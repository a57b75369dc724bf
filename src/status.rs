// src/status.rs
use std::time::Duration;

use crate::error::StatusKind;

/// What the caller should do with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Body is valid, carry on.
    Proceed,
    /// Repeat the same request after the given delay.
    RetryAfter(Duration),
    /// Abort with the given reason.
    Fatal(StatusKind),
}

impl Outcome {
    pub fn is_retry(&self) -> bool {
        matches!(self, Outcome::RetryAfter(_))
    }
}

/// Map a status code to an [`Outcome`]. 204 and 429 both back off for
/// `backoff`; a server-provided `Retry-After` is not consulted.
pub fn classify(status: u16, backoff: Duration) -> Outcome {
    match status {
        200 => Outcome::Proceed,
        204 | 429 => Outcome::RetryAfter(backoff),
        400 => Outcome::Fatal(StatusKind::BadRequest),
        401 => Outcome::Fatal(StatusKind::Unauthorized),
        403 => Outcome::Fatal(StatusKind::Forbidden),
        404 => Outcome::Fatal(StatusKind::NotFound),
        405 => Outcome::Fatal(StatusKind::MethodNotAllowed),
        502 => Outcome::Fatal(StatusKind::GatewayUnavailable),
        other => Outcome::Fatal(StatusKind::Unexpected(other)),
    }
}
