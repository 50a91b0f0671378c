use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use crate::protocol::SessionEvent;
use crate::transport::{EventReceiver, EventSender, Transport};

/// Default timeout for sending one frame (30 seconds).
const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum message size (10 MB) to prevent excessive memory allocation.
pub const MAX_MESSAGE_SIZE: u32 = 10_000_000;

/// Length-prefixed bincode framing over a TCP stream.
///
/// Each frame is a 4-byte big-endian length followed by one serialized
/// [`SessionEvent`]. Receives wait indefinitely unless a receive timeout is
/// configured, since a session stream legitimately idles while a player waits
/// for an opponent.
pub struct TcpTransport {
    stream: TcpStream,
    send_timeout: Duration,
    recv_timeout: Option<Duration>,
    max_message_size: u32,
}

pub struct TcpReceiver {
    half: OwnedReadHalf,
    recv_timeout: Option<Duration>,
    max_message_size: u32,
}

pub struct TcpSender {
    half: OwnedWriteHalf,
    send_timeout: Duration,
    max_message_size: u32,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            recv_timeout: None,
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }

    pub fn with_config(
        stream: TcpStream,
        send_timeout: Duration,
        recv_timeout: Option<Duration>,
        max_message_size: u32,
    ) -> Self {
        Self {
            stream,
            send_timeout,
            recv_timeout,
            max_message_size,
        }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }
}

impl Transport for TcpTransport {
    type Receiver = TcpReceiver;
    type Sender = TcpSender;

    fn into_split(self) -> (Self::Receiver, Self::Sender) {
        let (read, write) = self.stream.into_split();
        (
            TcpReceiver {
                half: read,
                recv_timeout: self.recv_timeout,
                max_message_size: self.max_message_size,
            },
            TcpSender {
                half: write,
                send_timeout: self.send_timeout,
                max_message_size: self.max_message_size,
            },
        )
    }
}

fn map_write_error(e: std::io::Error) -> anyhow::Error {
    if e.kind() == std::io::ErrorKind::BrokenPipe || e.kind() == std::io::ErrorKind::ConnectionReset
    {
        anyhow::anyhow!("Connection closed by peer")
    } else {
        anyhow::anyhow!("Write error: {}", e)
    }
}

fn map_read_error(e: std::io::Error) -> anyhow::Error {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        anyhow::anyhow!("Connection closed by peer")
    } else if e.kind() == std::io::ErrorKind::ConnectionReset {
        anyhow::anyhow!("Connection reset by peer")
    } else {
        anyhow::anyhow!("Read error: {}", e)
    }
}

/// Write one length-prefixed frame.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    event: &SessionEvent,
    max_message_size: u32,
) -> anyhow::Result<()> {
    let data =
        bincode::serialize(event).map_err(|e| anyhow::anyhow!("Serialization error: {}", e))?;

    if data.len() as u64 > max_message_size as u64 {
        return Err(anyhow::anyhow!(
            "Message too large: {} bytes (max: {})",
            data.len(),
            max_message_size
        ));
    }

    let len = (data.len() as u32).to_be_bytes();
    writer.write_all(&len).await.map_err(map_write_error)?;
    writer.write_all(&data).await.map_err(map_write_error)?;
    writer.flush().await.map_err(map_write_error)?;
    Ok(())
}

/// Read one length-prefixed frame.
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_message_size: u32,
) -> anyhow::Result<SessionEvent> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await.map_err(map_read_error)?;

    let len = u32::from_be_bytes(len_buf);

    // Bounded read length check to prevent excessive memory allocation
    if len > max_message_size {
        return Err(anyhow::anyhow!(
            "Message too large: {} bytes (max: {})",
            len,
            max_message_size
        ));
    }

    if len == 0 {
        return Err(anyhow::anyhow!("Invalid message length: 0"));
    }

    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await.map_err(map_read_error)?;

    bincode::deserialize(&buf).map_err(|e| anyhow::anyhow!("Deserialization error: {}", e))
}

#[async_trait::async_trait]
impl EventSender for TcpSender {
    async fn send(&mut self, event: SessionEvent) -> anyhow::Result<()> {
        let max = self.max_message_size;
        timeout(self.send_timeout, write_frame(&mut self.half, &event, max))
            .await
            .map_err(|_| anyhow::anyhow!("Send timeout after {:?}", self.send_timeout))?
    }
}

#[async_trait::async_trait]
impl EventReceiver for TcpReceiver {
    async fn recv(&mut self) -> anyhow::Result<SessionEvent> {
        let max = self.max_message_size;
        match self.recv_timeout {
            Some(limit) => timeout(limit, read_frame(&mut self.half, max))
                .await
                .map_err(|_| anyhow::anyhow!("Receive timeout after {:?}", limit))?,
            None => read_frame(&mut self.half, max).await,
        }
    }
}
