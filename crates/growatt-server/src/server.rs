//! Accept loop, session indexing, and operator signal handling.

use std::sync::Arc;

use growatt_core::ProxyConfig;
use tokio::{net::TcpListener, sync::Mutex as AsyncMutex};

use crate::{dispatch::Dispatch, error::ServerError, registry::SessionRegistry, session::Session};

/// Owns the listening socket, the session registry, and the signal
/// handlers that drive graceful shutdown and status reporting.
pub struct Server {
    config: Arc<ProxyConfig>,
    dispatch: Arc<Dispatch>,
    registry: Arc<AsyncMutex<SessionRegistry>>,
}

impl Server {
    /// Builds a server over `config`, with `dispatch` shared by every
    /// session it spawns.
    #[must_use]
    pub fn new(config: Arc<ProxyConfig>, dispatch: Arc<Dispatch>) -> Self {
        Self { config, dispatch, registry: Arc::new(AsyncMutex::new(SessionRegistry::new())) }
    }

    /// A handle to the registry, shared with the control channel.
    #[must_use]
    pub fn registry(&self) -> Arc<AsyncMutex<SessionRegistry>> {
        Arc::clone(&self.registry)
    }

    /// Binds the listen address and runs the accept loop until `SIGINT`.
    ///
    /// `SIGUSR1` prints a live-session report without interrupting the
    /// loop. On `SIGINT` the listener is dropped; sessions already
    /// accepted are left to drain to completion on their own EOFs.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] if the listen address cannot be
    /// bound.
    pub async fn serve(&self) -> Result<(), ServerError> {
        let address = format!("{}:{}", self.config.listen_address, self.config.listen_port);
        let listener = TcpListener::bind(&address).await?;
        tracing::info!(%address, "growatt-proxy listening");

        let mut sigusr1 = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::user_defined1())
            .map_err(ServerError::Transport)?;
        let mut sigint =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
                .map_err(ServerError::Transport)?;

        let (done_tx, mut done_rx) = tokio::sync::mpsc::unbounded_channel();
        let (serial_tx, mut serial_rx) = tokio::sync::mpsc::unbounded_channel();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer_addr)) => {
                            self.accept(stream, peer_addr, done_tx.clone(), serial_tx.clone()).await;
                        }
                        Err(err) => tracing::warn!(%err, "accept failed"),
                    }
                }
                Some(peer) = done_rx.recv() => {
                    self.registry.lock().await.remove(peer);
                    tracing::debug!(%peer, "session removed");
                }
                Some((peer, serial)) = serial_rx.recv() => {
                    self.registry.lock().await.index_learned_serial(peer, serial);
                }
                _ = sigusr1.recv() => {
                    self.report_status().await;
                }
                _ = sigint.recv() => {
                    tracing::info!("SIGINT received, closing accept loop");
                    break;
                }
            }
        }

        Ok(())
    }

    async fn accept(
        &self,
        stream: tokio::net::TcpStream,
        peer_addr: std::net::SocketAddr,
        done_tx: tokio::sync::mpsc::UnboundedSender<std::net::SocketAddr>,
        serial_tx: tokio::sync::mpsc::UnboundedSender<(std::net::SocketAddr, String)>,
    ) {
        tracing::debug!(%peer_addr, "accepted connection");
        match Session::start(
            stream,
            peer_addr,
            Arc::clone(&self.config),
            Arc::clone(&self.dispatch),
            done_tx,
            serial_tx,
        )
        .await
        {
            Ok(session) => self.registry.lock().await.insert(session),
            Err(err) => tracing::warn!(%peer_addr, %err, "session discarded"),
        }
    }

    async fn report_status(&self) {
        let registry = self.registry.lock().await;
        let sessions = registry.list_sessions();
        tracing::info!(count = sessions.len(), "status report");
        for (peer, datalogger_serial, inverter_serial) in sessions {
            tracing::info!(%peer, ?datalogger_serial, ?inverter_serial, "live session");
        }
    }
}
