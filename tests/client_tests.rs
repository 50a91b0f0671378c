use std::sync::Arc;

use battleship::client::{
    Connector, InProcessConnector, SessionClient, SessionIntent, SessionLink, TcpConnector,
};
use battleship::events::{GameEvent, GameEventKind};
use battleship::protocol::{JoinStatus, SessionEvent, SessionEventKind};
use battleship::transport::in_memory::InMemoryTransport;
use battleship::transport::{EventReceiver, EventSender, Transport};
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use uuid::Uuid;

const WAIT: Duration = Duration::from_secs(2);

async fn next(rx: &mut mpsc::UnboundedReceiver<GameEvent>) -> GameEvent {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event stream ended")
}

async fn wait_for_open_session(connector: &InProcessConnector) {
    timeout(WAIT, async {
        while connector.broker().open_sessions().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("no session was opened");
}

#[tokio::test]
async fn list_sessions_rejects_a_reply_of_another_kind() -> anyhow::Result<()> {
    let (server_side, client_side) = InMemoryTransport::pair();
    let (mut rx, mut tx) = server_side.into_split();
    let fake_broker = tokio::spawn(async move {
        let request = rx.recv().await?;
        assert_eq!(request.kind, SessionEventKind::ListSessions);
        tx.send(SessionEvent::join_status(&JoinStatus::Joined)?).await?;
        anyhow::Ok(())
    });

    let mut client = SessionClient::new(client_side);
    let err = client.list_sessions().await.unwrap_err().to_string();
    assert!(err.contains("Unexpected response event"), "{}", err);
    fake_broker.await??;
    Ok(())
}

#[tokio::test]
async fn join_rejection_carries_the_reason() -> anyhow::Result<()> {
    let (server_side, client_side) = InMemoryTransport::pair();
    let (mut rx, mut tx) = server_side.into_split();
    let fake_broker = tokio::spawn(async move {
        let request = rx.recv().await?;
        let target = request.decode_join_target()?;
        tx.send(SessionEvent::join_status(&JoinStatus::Rejected(
            "no such table".to_string(),
        ))?)
        .await?;
        anyhow::Ok(target)
    });

    let mut client = SessionClient::new(client_side);
    let target = Uuid::new_v4();
    let err = client.join_session(target).await.unwrap_err().to_string();
    assert!(err.contains("no such table"), "{}", err);
    assert_eq!(fake_broker.await??, target);
    Ok(())
}

#[tokio::test]
async fn pump_stops_on_a_non_relay_envelope() -> anyhow::Result<()> {
    let (server_side, client_side) = InMemoryTransport::pair();
    let (_rx, mut tx) = server_side.into_split();
    tx.send(SessionEvent::relay(
        Uuid::nil(),
        &GameEvent::signal(GameEventKind::JoinedGame),
    )?)
    .await?;
    tx.send(SessionEvent::session_list(&[])?).await?;

    let mut client = SessionClient::new(client_side);
    let (sink, mut incoming) = mpsc::unbounded_channel();
    let err = client.pump_incoming(&sink).await.unwrap_err().to_string();
    assert!(err.contains("Protocol violation"), "{}", err);
    assert_eq!(
        incoming.try_recv()?,
        GameEvent::signal(GameEventKind::JoinedGame)
    );
    Ok(())
}

#[tokio::test]
async fn relayed_events_carry_the_player_id() -> anyhow::Result<()> {
    let (server_side, client_side) = InMemoryTransport::pair();
    let (mut rx, _tx) = server_side.into_split();
    let mut client = SessionClient::new(client_side);
    let event = GameEvent::signal(GameEventKind::PlayerReady);
    client.send_game_event(&event).await?;

    let envelope = rx.recv().await?;
    assert_eq!(envelope.kind, SessionEventKind::Relay);
    assert_eq!(envelope.from, client.player_id());
    assert_eq!(envelope.decode_game_event()?, event);
    Ok(())
}

#[tokio::test]
async fn lost_stream_surfaces_as_disconnected() -> anyhow::Result<()> {
    let (server_side, client_side) = InMemoryTransport::pair();
    let client = SessionClient::new(client_side);
    let (_outgoing, queue) = mpsc::unbounded_channel();
    let (sink, mut incoming) = mpsc::unbounded_channel();
    let task = tokio::spawn(client.run(queue, sink));

    drop(server_side);
    match next(&mut incoming).await {
        GameEvent::Error(kind, _) => assert_eq!(kind, GameEventKind::Disconnected),
        other => panic!("expected an error event, got {:?}", other),
    }
    task.await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn link_reports_session_progress() -> anyhow::Result<()> {
    let in_process = InProcessConnector::default();
    let connector: Arc<dyn Connector> = Arc::new(in_process.clone());

    let (host_sink, mut host_events) = mpsc::unbounded_channel();
    let host = SessionLink::open(connector.clone(), SessionIntent::Host, host_sink);
    assert_eq!(
        next(&mut host_events).await,
        GameEvent::signal(GameEventKind::NewGameStarted)
    );
    wait_for_open_session(&in_process).await;

    let (guest_sink, mut guest_events) = mpsc::unbounded_channel();
    let guest = SessionLink::open(connector, SessionIntent::Join, guest_sink);
    assert_eq!(
        next(&mut guest_events).await,
        GameEvent::signal(GameEventKind::JoinedGame)
    );
    assert_eq!(
        next(&mut host_events).await,
        GameEvent::signal(GameEventKind::JoinedGame)
    );

    guest.send(GameEvent::signal(GameEventKind::PlayerReady))?;
    assert_eq!(
        next(&mut host_events).await,
        GameEvent::signal(GameEventKind::PlayerReady)
    );
    drop(host);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn joining_without_open_sessions_fails() {
    let connector: Arc<dyn Connector> = Arc::new(InProcessConnector::default());
    let (sink, mut events) = mpsc::unbounded_channel();
    let _link = SessionLink::open(connector, SessionIntent::Join, sink);
    match next(&mut events).await {
        GameEvent::Error(kind, reason) => {
            assert_eq!(kind, GameEventKind::JoinGameFailed);
            assert!(reason.contains("No open sessions"), "{}", reason);
        }
        other => panic!("expected an error event, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_broker_fails_the_new_game() -> anyhow::Result<()> {
    // bind then release a port so that nothing listens on it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let connector: Arc<dyn Connector> = Arc::new(TcpConnector::new(addr.to_string()));
    let (sink, mut events) = mpsc::unbounded_channel();
    let _link = SessionLink::open(connector, SessionIntent::Host, sink);
    assert!(matches!(
        next(&mut events).await,
        GameEvent::Error(GameEventKind::NewGameStartFailed, _)
    ));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn finishing_a_link_flushes_queued_events() -> anyhow::Result<()> {
    let connector = InProcessConnector::default();
    let shared: Arc<dyn Connector> = Arc::new(connector.clone());

    let (host_sink, mut host_events) = mpsc::unbounded_channel();
    let _host = SessionLink::open(shared.clone(), SessionIntent::Host, host_sink);
    next(&mut host_events).await;
    wait_for_open_session(&connector).await;

    let (guest_sink, mut guest_events) = mpsc::unbounded_channel();
    let mut guest = SessionLink::open(shared, SessionIntent::Join, guest_sink);
    next(&mut guest_events).await;
    next(&mut host_events).await;

    guest.send(GameEvent::signal(GameEventKind::PlayerReady))?;
    guest.send(GameEvent::signal(GameEventKind::GameEnded))?;
    timeout(WAIT, guest.finish()).await?;
    assert!(guest.send(GameEvent::signal(GameEventKind::PlayerReady)).is_err());

    assert_eq!(
        next(&mut host_events).await,
        GameEvent::signal(GameEventKind::PlayerReady)
    );
    assert_eq!(
        next(&mut host_events).await,
        GameEvent::signal(GameEventKind::GameEnded)
    );
    Ok(())
}
