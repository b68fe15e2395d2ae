//! Error types for stream session tracking.

use super::StreamSessionId;

/// Indicates that a stream session could not be found for removal.
#[derive(Debug, thiserror::Error)]
#[error("no open stream session {session_id}")]
pub struct SessionNotFound {
    pub session_id: StreamSessionId,
}
