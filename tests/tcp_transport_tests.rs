use battleship::events::{GameEvent, GameEventKind};
use battleship::protocol::{SessionEvent, SessionEventKind};
use battleship::transport::tcp::TcpTransport;
use battleship::transport::{EventReceiver, EventSender, Transport};
use battleship::Coord;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::time::Duration;
use uuid::Uuid;

#[tokio::test(flavor = "multi_thread")]
async fn session_events_cross_a_tcp_stream_in_order() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let player = Uuid::new_v4();

    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await?;
        let (mut rx, mut tx) = TcpTransport::new(socket).into_split();
        let first = rx.recv().await?;
        let second = rx.recv().await?;
        tx.send(SessionEvent::session_list(&[first.from])?).await?;
        anyhow::Ok((first, second))
    });

    let (mut rx, mut tx) = TcpTransport::connect(addr).await?.into_split();
    tx.send(SessionEvent::new_session(player)).await?;
    let shot = GameEvent::shoot(Coord::new(2, 9).unwrap());
    tx.send(SessionEvent::relay(player, &shot)?).await?;

    let reply = rx.recv().await?;
    assert_eq!(reply.from, Uuid::nil());
    assert_eq!(reply.decode_session_list()?, vec![player]);

    let (first, second) = server.await??;
    assert_eq!(first.kind, SessionEventKind::NewSession);
    assert!(first.payload.is_empty());
    assert_eq!(second.decode_game_event()?, shot);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn oversized_length_prefix_is_rejected() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket.write_all(&[0xFF, 0xFF, 0xFF, 0xFF]).await.unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    });

    let (mut rx, _tx) = TcpTransport::connect(addr).await?.into_split();
    let err = rx.recv().await.unwrap_err().to_string();
    assert!(err.contains("Message too large"), "{}", err);

    server.await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_length_frame_is_rejected() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket.write_all(&[0, 0, 0, 0]).await.unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    });

    let (mut rx, _tx) = TcpTransport::connect(addr).await?.into_split();
    let err = rx.recv().await.unwrap_err().to_string();
    assert!(err.contains("Invalid message length: 0"), "{}", err);

    server.await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn garbage_payload_fails_to_decode() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket.write_all(&[0, 0, 0, 3, 0xFF, 0xFF, 0xFF]).await.unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    });

    let (mut rx, _tx) = TcpTransport::connect(addr).await?.into_split();
    let err = rx.recv().await.unwrap_err().to_string();
    assert!(err.contains("Deserialization error"), "{}", err);

    server.await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn truncated_frame_reports_closed_peer() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket.write_all(&[0, 0, 0, 50, 1, 2]).await.unwrap();
        socket.flush().await.unwrap();
    });

    let (mut rx, _tx) = TcpTransport::connect(addr).await?.into_split();
    server.await?;
    let err = rx.recv().await.unwrap_err().to_string();
    assert!(err.contains("Connection closed by peer"), "{}", err);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn configured_receive_timeout_fires() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        drop(socket);
    });

    let stream = tokio::net::TcpStream::connect(addr).await?;
    let transport = TcpTransport::with_config(
        stream,
        Duration::from_secs(1),
        Some(Duration::from_millis(50)),
        1024,
    );
    let (mut rx, _tx) = transport.into_split();
    let err = rx.recv().await.unwrap_err().to_string();
    assert!(err.contains("Receive timeout"), "{}", err);

    server.await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn sender_refuses_frames_over_the_limit() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let server = tokio::spawn(async move {
        let _ = listener.accept().await;
    });

    let stream = tokio::net::TcpStream::connect(addr).await?;
    let (_rx, mut tx) =
        TcpTransport::with_config(stream, Duration::from_secs(1), None, 16).into_split();
    let event = SessionEvent {
        kind: SessionEventKind::Relay,
        from: Uuid::new_v4(),
        payload: vec![7; 64],
    };
    let err = tx.send(event).await.unwrap_err().to_string();
    assert!(err.contains("Message too large"), "{}", err);

    server.await?;
    Ok(())
}

#[test]
fn error_events_never_reach_the_wire() {
    let event = GameEvent::error(GameEventKind::Shoot, "boom");
    assert!(SessionEvent::relay(Uuid::new_v4(), &event).is_err());
}
