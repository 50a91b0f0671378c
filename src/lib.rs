#![cfg_attr(not(feature = "std"), no_std)]

pub mod engine;

#[cfg(feature = "std")]
pub mod bot;
#[cfg(feature = "std")]
pub mod broker;
#[cfg(feature = "std")]
pub mod client;
#[cfg(feature = "std")]
pub mod events;
#[cfg(feature = "std")]
pub mod flow;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
pub mod protocol;
#[cfg(feature = "std")]
pub mod server;
#[cfg(feature = "std")]
pub mod transport;

pub use engine::*;

#[cfg(feature = "std")]
pub use bot::BotPlayer;
#[cfg(feature = "std")]
pub use broker::SessionBroker;
#[cfg(feature = "std")]
pub use client::{
    Connector, InProcessConnector, SessionClient, SessionIntent, SessionLink, TcpConnector,
};
#[cfg(feature = "std")]
pub use events::{GameEvent, GameEventKind};
#[cfg(feature = "std")]
pub use flow::{GameFlow, Phase, UiEvent, WidgetId};
#[cfg(feature = "std")]
pub use logging::{init_logging, level_from_env};
#[cfg(feature = "std")]
pub use protocol::{JoinStatus, SessionEvent, SessionEventKind};
#[cfg(feature = "std")]
pub use server::{Server, DEFAULT_PORT, DEFAULT_STOP_TIMEOUT};
#[cfg(feature = "std")]
pub use transport::{in_memory::InMemoryTransport, tcp::TcpTransport};
