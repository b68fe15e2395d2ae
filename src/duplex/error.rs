use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// The direction of a duplex stream that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outbound,
    Inbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outbound => f.write_str("outbound"),
            Direction::Inbound => f.write_str("inbound"),
        }
    }
}

/// Errors that end a duplex exchange.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The duplex stream could not be opened. Neither driver was started.
    #[error("failed to open duplex stream: {0}")]
    StreamOpen(#[source] tonic::Status),

    /// The transport rejected a send.
    #[error("send failed after {sent} request(s): {source}")]
    Send {
        sent: usize,
        #[source]
        source: tonic::Status,
    },

    /// The transport failed with something other than a clean end-of-stream.
    #[error("receive failed after {received} response(s): {source}")]
    Receive {
        received: u64,
        #[source]
        source: tonic::Status,
    },

    /// The caller's cancellation signal fired.
    #[error("exchange cancelled")]
    Cancelled,

    /// The configured exchange timeout elapsed.
    #[error("exchange timed out after {0:?}")]
    TimedOut(Duration),

    /// The inbound drainer terminated without firing its completion signal.
    #[error("inbound drainer ended without signalling completion")]
    DrainerLost,
}

impl ExchangeError {
    /// The direction that produced this error, if it came from one of the drivers.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            ExchangeError::Send { .. } => Some(Direction::Outbound),
            ExchangeError::Receive { .. } | ExchangeError::DrainerLost => Some(Direction::Inbound),
            ExchangeError::StreamOpen(_) | ExchangeError::Cancelled | ExchangeError::TimedOut(_) => {
                None
            }
        }
    }
}
