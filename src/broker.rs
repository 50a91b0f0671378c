//! Session broker: pairs two connected players into a session and relays
//! game events between them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info, warn};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::events::{GameEvent, GameEventKind};
use crate::protocol::{JoinStatus, SessionEvent, SessionEventKind};
use crate::transport::{EventReceiver, EventSender, Transport};

/// A connected player as seen by the broker: its identity and the queue
/// drained by the task that writes to its stream.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    pub id: Uuid,
    outbound: mpsc::UnboundedSender<SessionEvent>,
}

impl PlayerHandle {
    fn deliver(&self, event: SessionEvent) -> bool {
        self.outbound.send(event).is_ok()
    }
}

/// A paired-up (or still waiting) game. Keyed by its creator's id.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub player_a: PlayerHandle,
    pub player_b: Option<PlayerHandle>,
    created: u64,
}

impl Session {
    /// The player of this session that is not `from`.
    fn peer_of(&self, from: Uuid) -> Option<&PlayerHandle> {
        if from == self.player_a.id {
            self.player_b.as_ref()
        } else if self.player_b.as_ref().is_some_and(|b| b.id == from) {
            Some(&self.player_a)
        } else {
            None
        }
    }
}

/// Sessions by id plus the alias of each player id to its session.
#[derive(Debug, Default)]
struct SessionTable {
    sessions: HashMap<Uuid, Session>,
    by_player: HashMap<Uuid, Uuid>,
    next_seq: u64,
}

impl SessionTable {
    fn create(&mut self, player: PlayerHandle) -> Result<(), String> {
        if self.by_player.contains_key(&player.id) {
            return Err(format!("player {} already belongs to a session", player.id));
        }
        let id = player.id;
        let created = self.next_seq;
        self.next_seq += 1;
        self.by_player.insert(id, id);
        self.sessions.insert(
            id,
            Session {
                id,
                player_a: player,
                player_b: None,
                created,
            },
        );
        Ok(())
    }

    fn open_sessions(&self) -> Vec<Uuid> {
        let mut open: Vec<&Session> = self
            .sessions
            .values()
            .filter(|s| s.player_b.is_none())
            .collect();
        open.sort_by_key(|s| s.created);
        open.into_iter().map(|s| s.id).collect()
    }

    /// Attach `player` as the second player of `session_id` and return the
    /// handle of the waiting creator.
    fn join(&mut self, session_id: Uuid, player: PlayerHandle) -> Result<PlayerHandle, String> {
        if self.by_player.contains_key(&player.id) {
            return Err(format!("player {} already belongs to a session", player.id));
        }
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| format!("unknown session {}", session_id))?;
        if session.player_b.is_some() {
            return Err(format!("session {} is full", session_id));
        }
        let player_id = player.id;
        session.player_b = Some(player);
        let creator = session.player_a.clone();
        self.by_player.insert(player_id, session_id);
        Ok(creator)
    }

    fn peer_of(&self, from: Uuid) -> Option<PlayerHandle> {
        let session_id = self.by_player.get(&from)?;
        self.sessions.get(session_id)?.peer_of(from).cloned()
    }

    /// Forget the session `player` belongs to, with both aliases.
    fn remove_player(&mut self, player: Uuid) -> Option<Session> {
        let session_id = self.by_player.remove(&player)?;
        let session = self.sessions.remove(&session_id)?;
        self.by_player.remove(&session.player_a.id);
        if let Some(b) = &session.player_b {
            self.by_player.remove(&b.id);
        }
        Some(session)
    }
}

/// In-memory session registry shared by every connection task.
#[derive(Clone, Default)]
pub struct SessionBroker {
    table: Arc<Mutex<SessionTable>>,
}

impl SessionBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, SessionTable> {
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Ids of sessions still waiting for a second player, oldest first.
    pub fn open_sessions(&self) -> Vec<Uuid> {
        self.table().open_sessions()
    }

    /// Snapshot of the session a player belongs to.
    pub fn session_of(&self, player: Uuid) -> Option<Session> {
        let table = self.table();
        let session_id = table.by_player.get(&player)?;
        table.sessions.get(session_id).cloned()
    }

    /// Serve one connected player until its stream fails or a protocol
    /// violation ends it. Errors only ever end this connection.
    pub async fn serve_connection<T: Transport>(&self, transport: T) -> anyhow::Result<()> {
        let (mut receiver, sender) = transport.into_split();
        let (outbound, queue) = mpsc::unbounded_channel();
        let mut writer = WriterTask(tokio::spawn(drain_outbound(queue, sender)));

        let mut conn = Connection {
            broker: self,
            outbound,
            player: None,
        };
        let result = conn.run(&mut receiver).await;

        if let Some(player) = conn.player {
            let removed = self.table().remove_player(player);
            if let Some(session) = removed {
                info!("Player {} left, closing session {}", player, session.id);
                if let Some(peer) = session.peer_of(player) {
                    notify_left(peer);
                }
            }
        }
        // dropping the last queue sender lets the writer flush and finish
        drop(conn);
        if let Err(e) = (&mut writer.0).await {
            if !e.is_cancelled() {
                warn!("Outbound writer failed: {}", e);
            }
        }
        result
    }
}

/// Aborts the writer when the connection task is cancelled mid-flight.
struct WriterTask(tokio::task::JoinHandle<()>);

impl Drop for WriterTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Tell the remaining player of a closed session that its opponent is gone.
fn notify_left(peer: &PlayerHandle) {
    let left = GameEvent::signal(GameEventKind::Disconnected);
    match SessionEvent::relay(Uuid::nil(), &left) {
        Ok(event) => {
            if !peer.deliver(event) {
                debug!("Peer {} already gone", peer.id);
            }
        }
        Err(e) => warn!("Could not notify {}: {}", peer.id, e),
    }
}

/// Forward everything queued for a player out over its stream.
async fn drain_outbound<S: EventSender>(
    mut queue: mpsc::UnboundedReceiver<SessionEvent>,
    mut sender: S,
) {
    while let Some(event) = queue.recv().await {
        if let Err(e) = sender.send(event).await {
            warn!("Dropping outbound stream: {}", e);
            return;
        }
    }
}

struct Connection<'a> {
    broker: &'a SessionBroker,
    outbound: mpsc::UnboundedSender<SessionEvent>,
    /// Identity this stream registered with through NewSession/JoinSession.
    player: Option<Uuid>,
}

impl Connection<'_> {
    async fn run<R: EventReceiver>(&mut self, receiver: &mut R) -> anyhow::Result<()> {
        loop {
            let event = receiver.recv().await?;
            debug!(
                "Event: {:?}, from {}, {} payload bytes",
                event.kind,
                event.from,
                event.payload.len()
            );
            match event.kind {
                SessionEventKind::NewSession => self.on_new_session(event.from),
                SessionEventKind::ListSessions => self.on_list_sessions()?,
                SessionEventKind::JoinSession => self.on_join_session(&event)?,
                SessionEventKind::Relay => self.on_relay(event)?,
            }
        }
    }

    fn handle(&self, id: Uuid) -> PlayerHandle {
        PlayerHandle {
            id,
            outbound: self.outbound.clone(),
        }
    }

    fn reply(&self, event: SessionEvent) -> anyhow::Result<()> {
        self.outbound
            .send(event)
            .map_err(|_| anyhow::anyhow!("Outbound stream closed"))
    }

    fn on_new_session(&mut self, from: Uuid) {
        if self.player.is_some() {
            warn!("Ignoring NewSession from {}: stream already registered", from);
            return;
        }
        match self.broker.table().create(self.handle(from)) {
            Ok(()) => {
                info!("Session {} created", from);
                self.player = Some(from);
            }
            Err(reason) => warn!("Ignoring NewSession: {}", reason),
        }
    }

    fn on_list_sessions(&self) -> anyhow::Result<()> {
        let open = self.broker.open_sessions();
        self.reply(SessionEvent::session_list(&open)?)
    }

    fn on_join_session(&mut self, event: &SessionEvent) -> anyhow::Result<()> {
        match self.try_join(event) {
            Ok(creator) => {
                self.reply(SessionEvent::join_status(&JoinStatus::Joined)?)?;
                let joined =
                    SessionEvent::relay(Uuid::nil(), &GameEvent::signal(GameEventKind::JoinedGame))?;
                if !creator.deliver(joined) {
                    warn!("Creator {} is gone, JoinedGame not delivered", creator.id);
                }
                Ok(())
            }
            Err(reason) => {
                warn!("Rejecting JoinSession from {}: {}", event.from, reason);
                self.reply(SessionEvent::join_status(&JoinStatus::Rejected(reason))?)
            }
        }
    }

    fn try_join(&mut self, event: &SessionEvent) -> Result<PlayerHandle, String> {
        if self.player.is_some() {
            return Err("stream already belongs to a session".to_string());
        }
        let target = event.decode_join_target().map_err(|e| e.to_string())?;
        if target == event.from {
            return Err("cannot join your own session".to_string());
        }
        let creator = self.broker.table().join(target, self.handle(event.from))?;
        info!("Player {} joined session {}", event.from, target);
        self.player = Some(event.from);
        Ok(creator)
    }

    fn on_relay(&self, event: SessionEvent) -> anyhow::Result<()> {
        if self.player != Some(event.from) {
            return Err(anyhow::anyhow!(
                "Relay from {} on a stream registered as {:?} (closing connection)",
                event.from,
                self.player
            ));
        }
        let peer = self.broker.table().peer_of(event.from);
        match peer {
            Some(peer) => {
                if !peer.deliver(event) {
                    warn!("Peer {} is gone, relay dropped", peer.id);
                }
            }
            None => warn!("No peer for {}, relay dropped", event.from),
        }
        Ok(())
    }
}
