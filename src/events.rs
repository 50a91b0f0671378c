//! Game-level events exchanged between the two players of a session and fed
//! into the client state machine.

use serde::{Deserialize, Serialize};

use crate::engine::Coord;

/// Kind tag shared by every [`GameEvent`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameEventKind {
    NewGameStarted,
    NewGameStartFailed,
    JoinedGame,
    JoinGameFailed,
    PlayerReady,
    PlayerNotReady,
    Shoot,
    Miss,
    Hit,
    Destroyed,
    GameEnded,
    /// The session is over: raised locally when the stream fails, relayed by
    /// the broker when the opponent leaves.
    Disconnected,
}

/// A game event. Signals carry only their kind, coordinate events carry a
/// cell, and errors stay on the client that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Signal(GameEventKind),
    Coordinate(GameEventKind, Coord),
    #[serde(skip)]
    Error(GameEventKind, String),
}

impl GameEvent {
    pub fn signal(kind: GameEventKind) -> Self {
        GameEvent::Signal(kind)
    }

    pub fn shoot(coord: Coord) -> Self {
        GameEvent::Coordinate(GameEventKind::Shoot, coord)
    }

    pub fn error(kind: GameEventKind, cause: impl ToString) -> Self {
        GameEvent::Error(kind, cause.to_string())
    }

    pub fn kind(&self) -> GameEventKind {
        match self {
            GameEvent::Signal(kind) | GameEvent::Coordinate(kind, _) | GameEvent::Error(kind, _) => {
                *kind
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, GameEvent::Error(..))
    }
}

/// Serialize an event for a `Relay` payload.
pub fn encode_game_event(event: &GameEvent) -> anyhow::Result<Vec<u8>> {
    if event.is_error() {
        return Err(anyhow::anyhow!(
            "Error events are client-local and cannot be relayed: {:?}",
            event
        ));
    }
    bincode::serialize(event).map_err(|e| anyhow::anyhow!("Serialization error: {}", e))
}

/// Decode a `Relay` payload back into an event.
pub fn decode_game_event(payload: &[u8]) -> anyhow::Result<GameEvent> {
    bincode::deserialize(payload).map_err(|e| anyhow::anyhow!("Deserialization error: {}", e))
}
