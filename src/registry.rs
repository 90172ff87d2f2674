//! Registry of open socket sessions
//!
//! Each session is represented by the sending half of its outbound channel; a
//! per-session writer task drains the channel into the socket. Registration and
//! removal may race freely across sessions.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use uuid::Uuid;

/// Identity of one duplex session
pub type SessionId = Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Session {0} is not registered")]
    UnknownSession(SessionId),

    /// The writer side of the session is gone (remote closed)
    #[error("Session {0} channel is closed")]
    ChannelClosed(SessionId),
}

struct SessionHandle {
    sender: UnboundedSender<String>,
    connected_at: DateTime<Utc>,
}

/// Concurrency-safe set of open sessions, cheap to clone
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    sessions: Arc<DashMap<SessionId, SessionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session whose handshake has completed and return its id
    pub fn register(&self, sender: UnboundedSender<String>) -> SessionId {
        let id = Uuid::new_v4();
        self.sessions.insert(
            id,
            SessionHandle {
                sender,
                connected_at: Utc::now(),
            },
        );
        debug!(session = %id, open = self.sessions.len(), "Session registered");
        id
    }

    /// Remove a session; removing an absent session is an error
    pub fn unregister(&self, id: SessionId) -> Result<(), RegistryError> {
        let (_, handle) = self
            .sessions
            .remove(&id)
            .ok_or(RegistryError::UnknownSession(id))?;

        let connected_for = Utc::now() - handle.connected_at;
        debug!(
            session = %id,
            connected_secs = connected_for.num_seconds(),
            open = self.sessions.len(),
            "Session unregistered"
        );
        Ok(())
    }

    /// Queue one text frame for exactly this session
    pub fn send(&self, id: SessionId, text: impl Into<String>) -> Result<(), RegistryError> {
        let handle = self
            .sessions
            .get(&id)
            .ok_or(RegistryError::UnknownSession(id))?;

        handle
            .sender
            .send(text.into())
            .map_err(|_| RegistryError::ChannelClosed(id))
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
