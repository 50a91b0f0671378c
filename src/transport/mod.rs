//! Duplex event streams between a client and the broker.
//!
//! A stream is split into its two directions so that one task can block on
//! receive while another keeps sending.

use crate::protocol::SessionEvent;

#[async_trait::async_trait]
pub trait EventSender: Send {
    async fn send(&mut self, event: SessionEvent) -> anyhow::Result<()>;
}

#[async_trait::async_trait]
pub trait EventReceiver: Send {
    async fn recv(&mut self) -> anyhow::Result<SessionEvent>;
}

/// A bidirectional, ordered, message-framed stream.
pub trait Transport: Send + 'static {
    type Receiver: EventReceiver + 'static;
    type Sender: EventSender + 'static;

    fn into_split(self) -> (Self::Receiver, Self::Sender);
}

#[async_trait::async_trait]
impl EventSender for Box<dyn EventSender> {
    async fn send(&mut self, event: SessionEvent) -> anyhow::Result<()> {
        (**self).send(event).await
    }
}

#[async_trait::async_trait]
impl EventReceiver for Box<dyn EventReceiver> {
    async fn recv(&mut self) -> anyhow::Result<SessionEvent> {
        (**self).recv().await
    }
}

pub mod in_memory;
pub mod tcp;
