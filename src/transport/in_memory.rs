use tokio::sync::mpsc;

use crate::protocol::SessionEvent;
use crate::transport::{EventReceiver, EventSender, Transport};

/// One end of an in-process duplex stream.
pub struct InMemoryTransport {
    receiver: InMemoryReceiver,
    sender: InMemorySender,
}

pub struct InMemoryReceiver {
    rx: mpsc::UnboundedReceiver<SessionEvent>,
}

pub struct InMemorySender {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl InMemoryTransport {
    pub fn pair() -> (Self, Self) {
        let (tx1, rx1) = mpsc::unbounded_channel();
        let (tx2, rx2) = mpsc::unbounded_channel();
        (
            Self {
                receiver: InMemoryReceiver { rx: rx1 },
                sender: InMemorySender { tx: tx2 },
            },
            Self {
                receiver: InMemoryReceiver { rx: rx2 },
                sender: InMemorySender { tx: tx1 },
            },
        )
    }
}

impl Transport for InMemoryTransport {
    type Receiver = InMemoryReceiver;
    type Sender = InMemorySender;

    fn into_split(self) -> (Self::Receiver, Self::Sender) {
        (self.receiver, self.sender)
    }
}

#[async_trait::async_trait]
impl EventSender for InMemorySender {
    async fn send(&mut self, event: SessionEvent) -> anyhow::Result<()> {
        self.tx
            .send(event)
            .map_err(|_| anyhow::anyhow!("Connection closed by peer"))
    }
}

#[async_trait::async_trait]
impl EventReceiver for InMemoryReceiver {
    async fn recv(&mut self) -> anyhow::Result<SessionEvent> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("Channel closed"))
    }
}
