//! Client side of a session stream.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::broker::SessionBroker;
use crate::events::{GameEvent, GameEventKind};
use crate::protocol::{JoinStatus, SessionEvent, SessionEventKind};
use crate::transport::in_memory::InMemoryTransport;
use crate::transport::tcp::TcpTransport;
use crate::transport::{EventReceiver, EventSender, Transport};

/// One player's connection to the broker.
pub struct SessionClient {
    player_id: Uuid,
    receiver: Box<dyn EventReceiver>,
    sender: Box<dyn EventSender>,
}

impl SessionClient {
    /// Wrap a connected stream under a freshly generated player id.
    pub fn new<T: Transport>(transport: T) -> Self {
        let (receiver, sender) = transport.into_split();
        Self {
            player_id: Uuid::new_v4(),
            receiver: Box::new(receiver),
            sender: Box::new(sender),
        }
    }

    pub async fn connect(addr: &str) -> anyhow::Result<Self> {
        Ok(Self::new(TcpTransport::connect(addr).await?))
    }

    pub fn player_id(&self) -> Uuid {
        self.player_id
    }

    /// Open a session keyed by this player.
    pub async fn create_session(&mut self) -> anyhow::Result<()> {
        self.sender
            .send(SessionEvent::new_session(self.player_id))
            .await
    }

    /// Ids of sessions waiting for a second player.
    pub async fn list_sessions(&mut self) -> anyhow::Result<Vec<Uuid>> {
        self.sender
            .send(SessionEvent::list_sessions(self.player_id))
            .await?;
        let reply = self.receiver.recv().await?;
        if reply.kind != SessionEventKind::ListSessions {
            return Err(anyhow::anyhow!("Unexpected response event: {:?}", reply.kind));
        }
        reply.decode_session_list()
    }

    /// Join the session `id`; fails with the broker's reason on rejection.
    pub async fn join_session(&mut self, id: Uuid) -> anyhow::Result<()> {
        self.sender
            .send(SessionEvent::join_session(self.player_id, id))
            .await?;
        let reply = self.receiver.recv().await?;
        if reply.kind != SessionEventKind::JoinSession {
            return Err(anyhow::anyhow!("Unexpected response event: {:?}", reply.kind));
        }
        match reply.decode_join_status()? {
            JoinStatus::Joined => Ok(()),
            JoinStatus::Rejected(reason) => {
                Err(anyhow::anyhow!("Join session {} rejected: {}", id, reason))
            }
        }
    }

    /// Relay one game event to the peer.
    pub async fn send_game_event(&mut self, event: &GameEvent) -> anyhow::Result<()> {
        send_relay(&mut self.sender, self.player_id, event).await
    }

    /// Receive relayed events and push them into `sink` until the stream
    /// fails, a non-relay envelope arrives, or nobody listens anymore.
    pub async fn pump_incoming(
        &mut self,
        sink: &mpsc::UnboundedSender<GameEvent>,
    ) -> anyhow::Result<()> {
        pump(&mut self.receiver, sink).await
    }

    /// Drive an established session: relay everything queued on `outgoing`
    /// to the peer and push incoming events into `sink`, until either
    /// direction fails or both ends lose interest. A failure is reported into
    /// `sink` as [`GameEvent::Error`].
    pub async fn run(
        self,
        mut outgoing: mpsc::UnboundedReceiver<GameEvent>,
        sink: mpsc::UnboundedSender<GameEvent>,
    ) {
        let SessionClient {
            player_id,
            mut receiver,
            mut sender,
        } = self;

        let send_loop = async {
            while let Some(event) = outgoing.recv().await {
                if let Err(e) = send_relay(&mut sender, player_id, &event).await {
                    return Err((event.kind(), e));
                }
            }
            Ok(())
        };

        tokio::select! {
            sent = send_loop => {
                if let Err((kind, e)) = sent {
                    warn!("Sending {:?} failed: {}", kind, e);
                    let _ = sink.send(GameEvent::error(kind, e));
                }
            }
            pumped = pump(&mut receiver, &sink) => {
                if let Err(e) = pumped {
                    warn!("Session stream ended: {}", e);
                    let _ = sink.send(GameEvent::error(GameEventKind::Disconnected, e));
                }
            }
        }
    }
}

async fn send_relay(
    sender: &mut Box<dyn EventSender>,
    player_id: Uuid,
    event: &GameEvent,
) -> anyhow::Result<()> {
    let envelope = SessionEvent::relay(player_id, event)?;
    sender.send(envelope).await
}

async fn pump(
    receiver: &mut Box<dyn EventReceiver>,
    sink: &mpsc::UnboundedSender<GameEvent>,
) -> anyhow::Result<()> {
    loop {
        let envelope = receiver.recv().await?;
        if envelope.kind != SessionEventKind::Relay {
            return Err(anyhow::anyhow!(
                "Protocol violation: expected Relay, got {:?}",
                envelope.kind
            ));
        }
        let event = envelope.decode_game_event()?;
        debug!("Received {:?}", event);
        if sink.send(event).is_err() {
            return Ok(());
        }
    }
}

/// How a client enters a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionIntent {
    /// Create a session and wait for an opponent.
    Host,
    /// Join the oldest open session.
    Join,
}

impl SessionIntent {
    /// Event kind reported when entering the session fails.
    pub fn failure_kind(self) -> GameEventKind {
        match self {
            SessionIntent::Host => GameEventKind::NewGameStartFailed,
            SessionIntent::Join => GameEventKind::JoinGameFailed,
        }
    }
}

/// A session driven by a background task. Events queued with
/// [`SessionLink::send`] go to the peer in order; everything coming back,
/// including failures, lands in the sink given to [`SessionLink::open`].
pub struct SessionLink {
    outgoing: Option<mpsc::UnboundedSender<GameEvent>>,
    task: Option<JoinHandle<()>>,
}

impl SessionLink {
    /// Connect, host or join a session, then keep the stream running.
    ///
    /// Progress is reported into `sink`: `NewGameStarted` once a hosted
    /// session exists, `JoinedGame` once a join succeeded, or an error event
    /// of [`SessionIntent::failure_kind`]. Must be called within a Tokio
    /// runtime.
    pub fn open(
        connector: Arc<dyn Connector>,
        intent: SessionIntent,
        sink: mpsc::UnboundedSender<GameEvent>,
    ) -> Self {
        let (outgoing, queue) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            match enter_session(connector.as_ref(), intent).await {
                Ok((client, started)) => {
                    let _ = sink.send(started);
                    client.run(queue, sink).await;
                }
                Err(e) => {
                    warn!("Could not enter session ({:?}): {}", intent, e);
                    let _ = sink.send(GameEvent::error(intent.failure_kind(), e));
                }
            }
        });
        Self {
            outgoing: Some(outgoing),
            task: Some(task),
        }
    }

    /// Queue an event for the peer without waiting.
    pub fn send(&self, event: GameEvent) -> anyhow::Result<()> {
        self.outgoing
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Session link finished"))?
            .send(event)
            .map_err(|_| anyhow::anyhow!("Session link closed"))
    }

    /// Stop accepting events, wait until everything already queued went out,
    /// then end the session.
    pub async fn finish(&mut self) {
        self.outgoing = None;
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Session task failed: {}", e);
                }
            }
        }
    }

    /// Stop the background task and drop the stream.
    pub fn close(&mut self) {
        self.outgoing = None;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for SessionLink {
    fn drop(&mut self) {
        self.close();
    }
}

async fn enter_session(
    connector: &dyn Connector,
    intent: SessionIntent,
) -> anyhow::Result<(SessionClient, GameEvent)> {
    let mut client = connector.connect().await?;
    match intent {
        SessionIntent::Host => {
            client.create_session().await?;
            info!("Hosting session {}", client.player_id());
            Ok((client, GameEvent::signal(GameEventKind::NewGameStarted)))
        }
        SessionIntent::Join => {
            let sessions = client.list_sessions().await?;
            let target = *sessions
                .first()
                .ok_or_else(|| anyhow::anyhow!("No open sessions to join"))?;
            client.join_session(target).await?;
            info!("Joined session {}", target);
            Ok((client, GameEvent::signal(GameEventKind::JoinedGame)))
        }
    }
}

/// Opens fresh session streams to a broker.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> anyhow::Result<SessionClient>;
}

/// Connects to a broker over TCP.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
}

impl TcpConnector {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

#[async_trait::async_trait]
impl Connector for TcpConnector {
    async fn connect(&self) -> anyhow::Result<SessionClient> {
        info!("Connecting to {}", self.addr);
        SessionClient::connect(&self.addr).await
    }
}

/// Connects to a broker running in the same process through an in-memory
/// stream.
#[derive(Clone, Default)]
pub struct InProcessConnector {
    broker: SessionBroker,
}

impl InProcessConnector {
    pub fn new(broker: SessionBroker) -> Self {
        Self { broker }
    }

    pub fn broker(&self) -> &SessionBroker {
        &self.broker
    }
}

#[async_trait::async_trait]
impl Connector for InProcessConnector {
    async fn connect(&self) -> anyhow::Result<SessionClient> {
        let (server_side, client_side) = InMemoryTransport::pair();
        let broker = self.broker.clone();
        tokio::spawn(async move {
            if let Err(e) = broker.serve_connection(server_side).await {
                debug!("In-process connection closed: {}", e);
            }
        });
        Ok(SessionClient::new(client_side))
    }
}
