//! Per-connection proxy pipe: owns both socket halves, forwards bytes
//! transparently in both directions, observes datalogger-to-cloud frames,
//! and serves as the injection/response rendezvous for the control
//! channel.

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicU16, AtomicU64, Ordering},
    },
};

use bytes::Bytes;
use growatt_core::{CoreError, Extractor, ProxyConfig, Record, registers};
use growatt_proto::{PacketType, RawFrame};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::{Mutex as AsyncMutex, mpsc, oneshot},
};

use crate::{dispatch::Dispatch, error::ServerError};

/// Read buffer size for both reader tasks, carried over from the source's
/// `ProxyClient.__max_datalen = 2**16`.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Cleanup lifecycle, per §4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Accepted,
    Running,
    Draining,
    Terminal,
}

/// Mutable observed state learned from datalogger traffic, guarded
/// independently from the write-half mutexes so readers never block writers.
#[derive(Default)]
struct Observed {
    datalogger_serial: Option<String>,
    inverter_serial: Option<String>,
    dtc: Option<u16>,
}

/// A single datalogger↔cloud proxy connection.
///
/// Exclusively owns both socket halves (split into read/write pairs) and
/// the two reader tasks spawned by [`Session::start`]. The [`crate::registry::SessionRegistry`]
/// holds only a lookup `Arc`; it never closes sockets itself.
pub struct Session {
    peer_addr: SocketAddr,
    upstream_addr: String,
    inbound_bytes: AtomicU64,
    outbound_bytes: AtomicU64,
    protocol_version: AtomicU16,
    observed: std::sync::Mutex<Observed>,
    state: std::sync::Mutex<SessionState>,
    datalogger_write: AsyncMutex<OwnedWriteHalf>,
    upstream_write: AsyncMutex<OwnedWriteHalf>,
    /// Single-slot rendezvous for an in-flight injected command's response.
    pending_response: std::sync::Mutex<Option<oneshot::Sender<Bytes>>>,
    done_tx: mpsc::UnboundedSender<SocketAddr>,
    serial_tx: mpsc::UnboundedSender<(SocketAddr, String)>,
}

impl Session {
    /// Opens the upstream connection and spawns both reader tasks.
    ///
    /// On failure to reach upstream, returns [`ServerError::UpstreamUnreachable`]
    /// without ever entering `Running` — the caller discards the session and
    /// never registers it.
    pub async fn start(
        peer_stream: TcpStream,
        peer_addr: SocketAddr,
        config: Arc<ProxyConfig>,
        dispatch: Arc<Dispatch>,
        done_tx: mpsc::UnboundedSender<SocketAddr>,
        serial_tx: mpsc::UnboundedSender<(SocketAddr, String)>,
    ) -> Result<Arc<Self>, ServerError> {
        let upstream_addr = format!("{}:{}", config.upstream_address, config.upstream_port);
        let upstream_stream =
            TcpStream::connect(&upstream_addr).await.map_err(|source| {
                ServerError::UpstreamUnreachable { address: upstream_addr.clone(), source }
            })?;

        let (dl_read, dl_write) = peer_stream.into_split();
        let (up_read, up_write) = upstream_stream.into_split();

        let session = Arc::new(Self {
            peer_addr,
            upstream_addr,
            inbound_bytes: AtomicU64::new(0),
            outbound_bytes: AtomicU64::new(0),
            protocol_version: AtomicU16::new(0),
            observed: std::sync::Mutex::new(Observed::default()),
            state: std::sync::Mutex::new(SessionState::Running),
            datalogger_write: AsyncMutex::new(dl_write),
            upstream_write: AsyncMutex::new(up_write),
            pending_response: std::sync::Mutex::new(None),
            done_tx,
            serial_tx,
        });

        tokio::spawn(Arc::clone(&session).run_datalogger_reader(dl_read, config, dispatch));
        tokio::spawn(Arc::clone(&session).run_upstream_reader(up_read));

        Ok(session)
    }

    /// Peer (datalogger-side) socket address.
    #[must_use]
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Upstream address this session forwards to.
    #[must_use]
    pub fn upstream_addr(&self) -> &str {
        &self.upstream_addr
    }

    /// Datalogger serial, once learned from the first valid frame.
    #[must_use]
    pub fn datalogger_serial(&self) -> Option<String> {
        self.observed.lock().unwrap_or_else(|e| e.into_inner()).datalogger_serial.clone()
    }

    /// Inverter serial, once learned.
    #[must_use]
    pub fn inverter_serial(&self) -> Option<String> {
        self.observed.lock().unwrap_or_else(|e| e.into_inner()).inverter_serial.clone()
    }

    /// Device type code, once learned from an `InverterReport`.
    #[must_use]
    pub fn dtc(&self) -> Option<u16> {
        self.observed.lock().unwrap_or_else(|e| e.into_inner()).dtc
    }

    /// Total bytes read from the datalogger side.
    #[must_use]
    pub fn inbound_bytes(&self) -> u64 {
        self.inbound_bytes.load(Ordering::Relaxed)
    }

    /// Total bytes read from the upstream side.
    #[must_use]
    pub fn outbound_bytes(&self) -> u64 {
        self.outbound_bytes.load(Ordering::Relaxed)
    }

    /// Protocol version observed on the datalogger side, or 0 before the
    /// first valid frame.
    #[must_use]
    pub fn protocol_version(&self) -> u16 {
        self.protocol_version.load(Ordering::Relaxed)
    }

    /// Injects `frame_bytes` on the datalogger-side socket and awaits the
    /// correlated response.
    ///
    /// Correlation is by packet type (see §9's Open Question resolution):
    /// the first inbound datalogger-side frame whose type is `RegisterRead`
    /// or `RegisterSet` is captured here instead of being forwarded or
    /// observed as ordinary telemetry.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::PeerClosed`] if the session ends (or the write
    /// fails) before a response arrives, and
    /// [`ServerError::ControlProtocolError`] if another injection is already
    /// in flight (the response slot holds one waiter at a time).
    pub async fn inject(&self, frame_bytes: Vec<u8>) -> Result<Bytes, ServerError> {
        let (tx, rx) = oneshot::channel();
        {
            let mut slot = self.pending_response.lock().unwrap_or_else(|e| e.into_inner());
            if slot.is_some() {
                return Err(ServerError::ControlProtocolError(
                    "an injected command is already awaiting a response".to_string(),
                ));
            }
            *slot = Some(tx);
        }

        {
            let mut write = self.datalogger_write.lock().await;
            if let Err(err) = write.write_all(&frame_bytes).await {
                self.pending_response.lock().unwrap_or_else(|e| e.into_inner()).take();
                return Err(ServerError::PeerClosed {
                    peer: self.peer_addr.to_string(),
                    reason: err.to_string(),
                });
            }
        }

        rx.await.map_err(|_| ServerError::PeerClosed {
            peer: self.peer_addr.to_string(),
            reason: "session ended before an injected command was answered".to_string(),
        })
    }

    fn has_pending_response(&self) -> bool {
        self.pending_response.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    /// Completes the pending response with `bytes`, if one was awaited.
    /// Returns `true` if the frame was consumed as a response (and must not
    /// be forwarded or observed further).
    fn complete_response(&self, bytes: Bytes) -> bool {
        let sender = self.pending_response.lock().unwrap_or_else(|e| e.into_inner()).take();
        match sender {
            Some(tx) => {
                let _ = tx.send(bytes);
                true
            },
            None => false,
        }
    }

    /// Transitions into `Draining` exactly once; idempotent on repeat
    /// calls. Half-closes both write halves and notifies the server.
    async fn begin_draining(self: &Arc<Self>, reason: &str) {
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if *state != SessionState::Running {
                return;
            }
            *state = SessionState::Draining;
        }
        tracing::info!(peer = %self.peer_addr, %reason, "session draining");

        let _ = self.datalogger_write.lock().await.shutdown().await;
        let _ = self.upstream_write.lock().await.shutdown().await;

        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = SessionState::Terminal;
        let _ = self.done_tx.send(self.peer_addr);
    }

    async fn write_to_upstream(&self, bytes: &[u8]) -> std::io::Result<()> {
        self.upstream_write.lock().await.write_all(bytes).await
    }

    async fn write_to_datalogger(&self, bytes: &[u8]) -> std::io::Result<()> {
        self.datalogger_write.lock().await.write_all(bytes).await
    }

    async fn run_datalogger_reader(
        self: Arc<Self>,
        mut read: OwnedReadHalf,
        config: Arc<ProxyConfig>,
        dispatch: Arc<Dispatch>,
    ) {
        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        loop {
            let n = match read.read(&mut buf).await {
                Ok(0) => {
                    self.begin_draining("datalogger EOF").await;
                    break;
                },
                Ok(n) => n,
                Err(err) => {
                    tracing::debug!(peer = %self.peer_addr, %err, "datalogger read error");
                    self.begin_draining("datalogger read error").await;
                    break;
                },
            };
            self.inbound_bytes.fetch_add(n as u64, Ordering::Relaxed);
            let chunk = Bytes::copy_from_slice(&buf[..n]);

            if self.has_pending_response()
                && let Ok(frame) = RawFrame::parse(chunk.clone())
                && matches!(frame.packet_type(), PacketType::RegisterRead | PacketType::RegisterSet)
                && self.complete_response(frame.decrypted_body().clone())
            {
                continue;
            }

            if let Err(err) = self.write_to_upstream(&chunk).await {
                tracing::debug!(peer = %self.peer_addr, %err, "upstream write failed");
                self.begin_draining("upstream write failed").await;
                break;
            }

            self.observe_datalogger_frame(&chunk, &config, &dispatch);
        }
    }

    async fn run_upstream_reader(self: Arc<Self>, mut read: OwnedReadHalf) {
        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        loop {
            let n = match read.read(&mut buf).await {
                Ok(0) => {
                    self.begin_draining("upstream EOF").await;
                    break;
                },
                Ok(n) => n,
                Err(err) => {
                    tracing::debug!(peer = %self.peer_addr, %err, "upstream read error");
                    self.begin_draining("upstream read error").await;
                    break;
                },
            };
            self.outbound_bytes.fetch_add(n as u64, Ordering::Relaxed);
            if let Err(err) = self.write_to_datalogger(&buf[..n]).await {
                tracing::debug!(peer = %self.peer_addr, %err, "datalogger write failed");
                self.begin_draining("datalogger write failed").await;
                break;
            }
        }
    }

    /// Parses, validates, and (if warranted) extracts and dispatches a
    /// datalogger-to-cloud frame. Never fatal to the session: every error
    /// path here is logged and skipped, per §7's "the proxy is lenient by
    /// design".
    fn observe_datalogger_frame(&self, bytes: &Bytes, config: &ProxyConfig, dispatch: &Dispatch) {
        let frame = match RawFrame::parse(bytes.clone()) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::debug!(peer = %self.peer_addr, %err, "frame truncated");
                return;
            },
        };

        if !frame.valid_crc() {
            tracing::debug!(peer = %self.peer_addr, "frame failed CRC, skipping extraction");
            return;
        }

        self.protocol_version.store(frame.header().protocol_version, Ordering::Relaxed);

        let packet_type = frame.packet_type();
        let newly_learned_serial = {
            let mut observed = self.observed.lock().unwrap_or_else(|e| e.into_inner());
            let mut newly_learned_serial = None;
            if observed.datalogger_serial.is_none()
                && let Some(serial) = frame.datalogger_serial()
            {
                newly_learned_serial = Some(serial.clone());
                observed.datalogger_serial = Some(serial);
            }
            if observed.inverter_serial.is_none()
                && let Some(serial) = frame.inverter_serial()
            {
                observed.inverter_serial = Some(serial);
            }
            newly_learned_serial
        };
        if let Some(serial) = newly_learned_serial {
            tracing::info!(
                peer = %self.peer_addr,
                datalogger_serial = %serial,
                inverter_serial = ?self.inverter_serial(),
                "session identified"
            );
            let _ = self.serial_tx.send((self.peer_addr, serial));
        }

        let decrypted_body = frame.decrypted_body();
        if !packet_type.carries_registers() || decrypted_body.len() <= 100 {
            return;
        }

        // Extractor matches signatures and window headers at absolute
        // offsets across header + body + CRC, so rebuild that full layout
        // with the body unmasked rather than handing it the body alone.
        let mut decrypted_frame = frame.header().to_bytes().to_vec();
        decrypted_frame.extend_from_slice(decrypted_body);
        decrypted_frame.extend_from_slice(&bytes[bytes.len() - 2..]);

        let extractor = Extractor::new(&decrypted_frame, packet_type);

        if packet_type == PacketType::InverterReport {
            self.backfill_dtc(&extractor);
        }

        if packet_type == PacketType::LiveData {
            self.emit_record(&extractor, decrypted_body, packet_type, config, dispatch);
        }
    }

    fn backfill_dtc(&self, extractor: &Extractor<'_>) {
        let mut observed = self.observed.lock().unwrap_or_else(|e| e.into_inner());
        if observed.dtc.is_some() {
            return;
        }
        match extractor.int_at(43) {
            Ok(value) => observed.dtc = Some(value as u16),
            Err(CoreError::InvalidRegister(_)) => {},
            Err(err) => tracing::debug!(peer = %self.peer_addr, %err, "DTC backfill failed"),
        }
    }

    fn emit_record(
        &self,
        extractor: &Extractor<'_>,
        decrypted: &Bytes,
        packet_type: PacketType,
        config: &ProxyConfig,
        dispatch: &Dispatch,
    ) {
        let time = extractor
            .timestamp()
            .map(|(y, mo, d, h, mi, s)| {
                format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}")
            })
            .unwrap_or_else(|| {
                let secs = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or_default();
                format!("epoch:{secs}")
            });

        let (device, logger_serial, dtc) = {
            let observed = self.observed.lock().unwrap_or_else(|e| e.into_inner());
            (
                observed.inverter_serial.clone().unwrap_or_default(),
                observed.datalogger_serial.clone().unwrap_or_default(),
                observed.dtc,
            )
        };

        let mut record = Record::new(device.clone(), time, false, logger_serial, device);

        let map = registers::map_for(packet_type, extractor.section_width());
        let allowed = dtc.and_then(|dtc| config.allowed_registers(dtc));

        for spec in map {
            if let Some(allowed) = allowed
                && !allowed.contains(&spec.id)
            {
                continue;
            }
            match spec.reg_type {
                growatt_core::registers::RegType::Text => {
                    let end = spec.id + spec.length.saturating_sub(1);
                    if let Ok(text) = extractor.ascii_at(spec.id, end) {
                        record.insert(spec.description, growatt_core::registers::FormattedValue::Text(text));
                    }
                },
                _ if spec.length >= 2 => {
                    if let Ok(value) = extractor.long_at(spec.id) {
                        record.insert(spec.description, spec.format_int(value));
                    }
                },
                _ => {
                    if let Ok(value) = extractor.int_at(spec.id) {
                        record.insert(spec.description, spec.format_int(value));
                    }
                },
            }
        }

        dispatch.dispatch(decrypted.clone(), record);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatch;

    async fn connected_pair() -> (TcpStream, TcpStream) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connect = TcpStream::connect(addr);
        let accept = listener.accept();
        let (client, (server, _)) = tokio::join!(connect, accept);
        (client.unwrap(), server.unwrap())
    }

    #[tokio::test]
    async fn start_fails_when_upstream_unreachable() {
        // Bind and immediately drop a listener: its port now refuses
        // connections, giving a deterministic "upstream unreachable".
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead_port = listener.local_addr().unwrap().port();
        drop(listener);

        let (peer_client, peer_server) = connected_pair().await;
        drop(peer_client);

        let config = Arc::new(ProxyConfig {
            upstream_address: "127.0.0.1".to_string(),
            upstream_port: dead_port,
            ..ProxyConfig::default()
        });
        let dispatch = Arc::new(Dispatch::new(Vec::new(), Vec::new(), None));
        let (done_tx, _done_rx) = mpsc::unbounded_channel();
        let (serial_tx, _serial_rx) = mpsc::unbounded_channel();

        let result = Session::start(
            peer_server,
            "127.0.0.1:1".parse().unwrap(),
            config,
            dispatch,
            done_tx,
            serial_tx,
        )
        .await;
        assert!(matches!(result, Err(ServerError::UpstreamUnreachable { .. })));
    }

    #[tokio::test]
    async fn start_succeeds_and_forwards_bytes() {
        let (peer_client, peer_server) = connected_pair().await;
        let upstream_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let upstream_addr = upstream_listener.local_addr().unwrap();

        let config = Arc::new(ProxyConfig {
            upstream_address: upstream_addr.ip().to_string(),
            upstream_port: upstream_addr.port(),
            ..ProxyConfig::default()
        });
        let dispatch = Arc::new(Dispatch::new(Vec::new(), Vec::new(), None));
        let (done_tx, _done_rx) = mpsc::unbounded_channel();
        let (serial_tx, _serial_rx) = mpsc::unbounded_channel();

        let (session, (mut upstream_server, _)) = tokio::join!(
            Session::start(
                peer_server,
                "127.0.0.1:2".parse().unwrap(),
                config,
                dispatch,
                done_tx,
                serial_tx
            ),
            async { upstream_listener.accept().await.unwrap() }
        );
        let session = session.unwrap();
        assert_eq!(session.peer_addr(), "127.0.0.1:2".parse().unwrap());

        let mut client = peer_client;
        client.write_all(b"hello").await.unwrap();

        let mut buf = [0u8; 5];
        upstream_server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello");
    }
}
