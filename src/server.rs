//! TCP front end of the session broker with cooperative shutdown.

use std::future::Future;
use std::net::SocketAddr;

use log::{error, info, warn};
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout, Duration};

use crate::broker::SessionBroker;
use crate::transport::tcp::TcpTransport;

/// Default port the broker listens on.
pub const DEFAULT_PORT: u16 = 42284;

/// How long shutdown waits for live connections before abandoning them.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(4);

/// Pause after a failed accept, e.g. when out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub struct Server {
    listener: TcpListener,
    broker: SessionBroker,
}

impl Server {
    pub async fn bind<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            broker: SessionBroker::new(),
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn broker(&self) -> &SessionBroker {
        &self.broker
    }

    /// Accept connections until `shutdown` resolves, then give live
    /// connections `stop_timeout` to finish before aborting them.
    pub async fn run<F>(self, shutdown: F, stop_timeout: Duration) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => {
                    let (stream, addr) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            back_off_after_accept_error(&e).await;
                            continue;
                        }
                    };
                    if let Err(e) = stream.set_nodelay(true) {
                        warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
                    }
                    info!("Player connected from {}", addr);
                    let broker = self.broker.clone();
                    connections.spawn(async move {
                        match broker.serve_connection(TcpTransport::new(stream)).await {
                            Ok(()) => info!("Connection {} finished", addr),
                            Err(e) => info!("Connection {} closed: {}", addr, e),
                        }
                    });
                }
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        error!("Connection task failed: {}", e);
                    }
                }
            }
        }

        info!("Stopping, {} connection(s) still open", connections.len());
        let drain = async { while connections.join_next().await.is_some() {} };
        if timeout(stop_timeout, drain).await.is_err() {
            warn!("Stopping timed out after {:?}, abandoning connections", stop_timeout);
            connections.abort_all();
        }
        Ok(())
    }
}

async fn back_off_after_accept_error(e: &std::io::Error) {
    warn!("Accept error: {}, retrying in {:?}", e, ACCEPT_BACKOFF);
    sleep(ACCEPT_BACKOFF).await;
}
