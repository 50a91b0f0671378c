//! Wire envelope exchanged between a client and the session broker.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::{decode_game_event, encode_game_event, GameEvent};

/// What an envelope asks the broker to do, or what it answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEventKind {
    /// Open a session keyed by the sender. Payload empty.
    NewSession,
    /// Request: payload empty. Response: bincode `Vec<Uuid>` of open sessions.
    ListSessions,
    /// Request: the 16 raw bytes of the target session id.
    /// Response: bincode [`JoinStatus`].
    JoinSession,
    /// Payload is one serialized [`GameEvent`], forwarded to the peer verbatim.
    Relay,
}

/// One message on a session stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    /// Sender identity; [`Uuid::nil`] on broker responses.
    pub from: Uuid,
    pub payload: Vec<u8>,
}

/// Broker answer to a `JoinSession` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinStatus {
    Joined,
    Rejected(String),
}

impl SessionEvent {
    pub fn new_session(from: Uuid) -> Self {
        Self {
            kind: SessionEventKind::NewSession,
            from,
            payload: Vec::new(),
        }
    }

    pub fn list_sessions(from: Uuid) -> Self {
        Self {
            kind: SessionEventKind::ListSessions,
            from,
            payload: Vec::new(),
        }
    }

    pub fn join_session(from: Uuid, session: Uuid) -> Self {
        Self {
            kind: SessionEventKind::JoinSession,
            from,
            payload: session.as_bytes().to_vec(),
        }
    }

    pub fn relay(from: Uuid, event: &GameEvent) -> anyhow::Result<Self> {
        Ok(Self {
            kind: SessionEventKind::Relay,
            from,
            payload: encode_game_event(event)?,
        })
    }

    /// Broker response listing joinable sessions.
    pub fn session_list(sessions: &[Uuid]) -> anyhow::Result<Self> {
        let payload = bincode::serialize(sessions)
            .map_err(|e| anyhow::anyhow!("Serialization error: {}", e))?;
        Ok(Self {
            kind: SessionEventKind::ListSessions,
            from: Uuid::nil(),
            payload,
        })
    }

    /// Broker response to a join request.
    pub fn join_status(status: &JoinStatus) -> anyhow::Result<Self> {
        let payload = bincode::serialize(status)
            .map_err(|e| anyhow::anyhow!("Serialization error: {}", e))?;
        Ok(Self {
            kind: SessionEventKind::JoinSession,
            from: Uuid::nil(),
            payload,
        })
    }

    pub fn decode_session_list(&self) -> anyhow::Result<Vec<Uuid>> {
        self.expect_kind(SessionEventKind::ListSessions)?;
        bincode::deserialize(&self.payload)
            .map_err(|e| anyhow::anyhow!("Deserialization error: {}", e))
    }

    pub fn decode_join_status(&self) -> anyhow::Result<JoinStatus> {
        self.expect_kind(SessionEventKind::JoinSession)?;
        bincode::deserialize(&self.payload)
            .map_err(|e| anyhow::anyhow!("Deserialization error: {}", e))
    }

    /// Target session of a `JoinSession` request.
    pub fn decode_join_target(&self) -> anyhow::Result<Uuid> {
        self.expect_kind(SessionEventKind::JoinSession)?;
        Uuid::from_slice(&self.payload)
            .map_err(|e| anyhow::anyhow!("Invalid session id in JoinSession payload: {}", e))
    }

    pub fn decode_game_event(&self) -> anyhow::Result<GameEvent> {
        self.expect_kind(SessionEventKind::Relay)?;
        decode_game_event(&self.payload)
    }

    fn expect_kind(&self, kind: SessionEventKind) -> anyhow::Result<()> {
        if self.kind != kind {
            return Err(anyhow::anyhow!(
                "Unexpected session event: expected {:?}, got {:?}",
                kind,
                self.kind
            ));
        }
        Ok(())
    }
}
