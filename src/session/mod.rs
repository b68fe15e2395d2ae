pub mod error;

use dashmap::DashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use uuid::Uuid;

use self::error::SessionNotFound;

#[derive(Clone, Hash, PartialEq, Eq)]
pub struct StreamSessionId(Arc<Uuid>);

impl StreamSessionId {
    pub fn generate() -> Self {
        Self(Arc::new(Uuid::new_v4()))
    }
}

impl fmt::Debug for StreamSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamSessionId({})", self.0)
    }
}

impl fmt::Display for StreamSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The streaming shape of an open call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    ServerStreaming,
    ClientStreaming,
    Bidirectional,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallKind::ServerStreaming => f.write_str("server-streaming"),
            CallKind::ClientStreaming => f.write_str("client-streaming"),
            CallKind::Bidirectional => f.write_str("bidirectional"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StreamSession {
    pub session_id: StreamSessionId,
    pub kind: CallKind,
    pub peer: Option<SocketAddr>,
    pub opened_at: Instant,
}

/// Open streaming calls on the server, keyed by a per-call session id.
#[derive(Debug)]
pub struct StreamSessionMap {
    sessions: DashMap<StreamSessionId, StreamSession, ahash::RandomState>,
}

impl StreamSessionMap {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::default(),
        }
    }

    /// Register a new streaming call. The session is removed when the returned guard drops.
    pub fn open(self: &Arc<Self>, kind: CallKind, peer: Option<SocketAddr>) -> SessionGuard {
        let session_id = StreamSessionId::generate();
        self.sessions.insert(
            session_id.clone(),
            StreamSession {
                session_id: session_id.clone(),
                kind,
                peer,
                opened_at: Instant::now(),
            },
        );

        SessionGuard {
            session_id,
            sessions: Arc::clone(self),
        }
    }

    pub fn remove(&self, session_id: &StreamSessionId) -> Result<StreamSession, SessionNotFound> {
        self.sessions
            .remove(session_id)
            .map(|(_, session)| session)
            .ok_or_else(|| SessionNotFound {
                session_id: session_id.clone(),
            })
    }

    pub fn get(&self, session_id: &StreamSessionId) -> Option<StreamSession> {
        self.sessions.get(session_id).map(|entry| entry.clone())
    }

    pub fn active_session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn active_count_of(&self, kind: CallKind) -> usize {
        self.sessions
            .iter()
            .filter(|entry| entry.kind == kind)
            .count()
    }
}

impl Default for StreamSessionMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps a stream session registered for as long as it is alive.
#[derive(Debug)]
pub struct SessionGuard {
    session_id: StreamSessionId,
    sessions: Arc<StreamSessionMap>,
}

impl SessionGuard {
    pub fn session_id(&self) -> &StreamSessionId {
        &self.session_id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Ok(session) = self.sessions.remove(&self.session_id) {
            debug!(
                session_id = %session.session_id,
                kind = %session.kind,
                open_for_ms = session.opened_at.elapsed().as_millis() as u64,
                remaining = self.sessions.active_session_count(),
                "Stream session closed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_session() {
        let map = Arc::new(StreamSessionMap::new());

        let guard = map.open(CallKind::Bidirectional, None);

        assert_eq!(map.active_session_count(), 1);
        assert_eq!(map.active_count_of(CallKind::Bidirectional), 1);
        assert_eq!(map.active_count_of(CallKind::ClientStreaming), 0);
        let session = map.get(guard.session_id()).unwrap();
        assert_eq!(session.kind, CallKind::Bidirectional);
    }

    #[test]
    fn test_guard_drop_removes_session() {
        let map = Arc::new(StreamSessionMap::new());

        let first = map.open(CallKind::ServerStreaming, None);
        let second = map.open(CallKind::ServerStreaming, None);
        assert_ne!(first.session_id(), second.session_id());
        assert_eq!(map.active_session_count(), 2);

        drop(first);
        assert_eq!(map.active_session_count(), 1);

        drop(second);
        assert_eq!(map.active_session_count(), 0);
    }

    #[test]
    fn test_remove_nonexistent_session() {
        let map = StreamSessionMap::new();

        let result = map.remove(&StreamSessionId::generate());
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), SessionNotFound { .. }));
    }

    #[test]
    fn test_explicit_remove_before_guard_drop() {
        let map = Arc::new(StreamSessionMap::new());
        let guard = map.open(CallKind::ClientStreaming, None);

        let removed = map.remove(guard.session_id()).unwrap();
        assert_eq!(&removed.session_id, guard.session_id());

        // Dropping the guard afterwards is a no-op.
        drop(guard);
        assert_eq!(map.active_session_count(), 0);
    }
}
