//! Local-only command socket: `list`, `read <sn> <reg>`, `set <sn> <r> <v>`.
//!
//! Bound to `127.0.0.1:15279`. Each client is handled on its own task with
//! a 30-second idle read timeout; malformed input gets an empty reply
//! rather than closing the connection.

use std::{sync::Arc, time::Duration};

use growatt_proto::{Operation, build_register_packet};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::Mutex as AsyncMutex,
    time::timeout,
};

use crate::{registry::SessionRegistry, server::Server};

/// Fixed local address the control channel listens on.
pub const CONTROL_ADDRESS: &str = "127.0.0.1:15279";

const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Binds [`CONTROL_ADDRESS`] and serves control-channel clients until the
/// process exits.
///
/// # Errors
///
/// Returns an I/O error if the address cannot be bound.
pub async fn serve(server: Arc<Server>) -> std::io::Result<()> {
    let listener = TcpListener::bind(CONTROL_ADDRESS).await?;
    tracing::info!(address = CONTROL_ADDRESS, "control channel listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        let registry = server.registry();
        tokio::spawn(async move {
            if let Err(err) = handle_client(stream, registry).await {
                tracing::debug!(%peer, %err, "control client error");
            }
        });
    }
}

async fn handle_client(
    stream: TcpStream,
    registry: Arc<AsyncMutex<SessionRegistry>>,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    loop {
        let line = match timeout(IDLE_TIMEOUT, lines.next_line()).await {
            Ok(Ok(Some(line))) => line,
            Ok(Ok(None)) => break,
            Ok(Err(err)) => return Err(err),
            Err(_) => {
                tracing::debug!("control client idle timeout, closing");
                break;
            },
        };

        let reply = handle_command(&line, &registry).await;
        write_half.write_all(reply.as_bytes()).await?;
        write_half.write_all(b"\n").await?;
    }

    Ok(())
}

async fn handle_command(line: &str, registry: &Arc<AsyncMutex<SessionRegistry>>) -> String {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return String::new();
    };

    match verb.to_ascii_lowercase().as_str() {
        "list" => {
            let registry = registry.lock().await;
            registry
                .list_sessions()
                .into_iter()
                .map(|(peer, dl, inv)| {
                    format!("{peer} | {} | {}", dl.unwrap_or_default(), inv.unwrap_or_default())
                })
                .collect::<Vec<_>>()
                .join("\n")
        },
        "read" => {
            let (Some(serial), Some(reg)) = (words.next(), words.next().and_then(|r| r.parse::<u16>().ok()))
            else {
                return String::new();
            };
            run_operation(registry, serial, Operation::Read { address: reg, reg_len: 1 }).await
        },
        "set" => {
            let (Some(serial), Some(reg), Some(value)) = (
                words.next(),
                words.next().and_then(|r| r.parse::<u16>().ok()),
                words.next().and_then(|v| v.parse::<u16>().ok()),
            ) else {
                return String::new();
            };
            run_operation(registry, serial, Operation::Set { address: reg, value }).await
        },
        _ => String::new(),
    }
}

async fn run_operation(
    registry: &Arc<AsyncMutex<SessionRegistry>>,
    serial: &str,
    operation: Operation,
) -> String {
    let session = {
        let registry = registry.lock().await;
        registry.get_by_serial(serial)
    };
    let Some(session) = session else {
        return String::new();
    };

    let packet = build_register_packet(serial, session.protocol_version(), operation);
    let is_set = matches!(operation, Operation::Set { .. });

    match session.inject(packet).await {
        // `inject` resolves with the decrypted payload (CRC already
        // stripped); R is the first u16 of its trailing six bytes, V the
        // last u16 of its trailing four, per the control channel's
        // response format.
        Ok(response) if response.len() >= 6 => {
            let end = response.len();
            let reg = u16::from_be_bytes([response[end - 6], response[end - 5]]);
            let value = u16::from_be_bytes([response[end - 2], response[end - 1]]);
            if is_set { format!("SET Reg: {reg} Value: {value}") } else { format!("Reg: {reg} Value: {value}") }
        },
        Ok(_) | Err(_) => String::new(),
    }
}
