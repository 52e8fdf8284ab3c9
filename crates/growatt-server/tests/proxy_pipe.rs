//! Integration tests driving a full datalogger↔upstream proxy pipe through
//! real loopback sockets, without the control channel or accept loop.

use std::sync::Arc;

use growatt_core::ProxyConfig;
use growatt_proto::{PacketType, build_register_packet, mask::xor_masked};
use growatt_server::{dispatch::Dispatch, session::Session};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

async fn loopback_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (client, (server, _)) = tokio::join!(TcpStream::connect(addr), listener.accept());
    (client.unwrap(), server.unwrap())
}

fn live_data_frame(serial: &str) -> Vec<u8> {
    // datalogger_serial (10) + 8 filler + signature window header (5) +
    // 125 registers worth of zeroed data (2 bytes each), masked for
    // protocol version 6.
    let mut body = Vec::new();
    body.extend_from_slice(serial.as_bytes());
    body.extend_from_slice(&[0u8; 8]);
    body.extend_from_slice(&[0x02, 0x0b, 0xb8, 0x0c, 0x34]); // MIN signature, regs 3000..=3124
    body.extend_from_slice(&[0u8; 2 * 125]);
    let masked = xor_masked(&body);

    let mut packet = Vec::new();
    packet.extend_from_slice(&1u16.to_be_bytes());
    packet.extend_from_slice(&6u16.to_be_bytes());
    packet.extend_from_slice(&((masked.len() + 2) as u16).to_be_bytes());
    packet.extend_from_slice(&PacketType::LiveData.to_wire().to_be_bytes());
    packet.extend_from_slice(&masked);
    let crc = growatt_proto::crc::modbus16(&packet);
    packet.extend_from_slice(&crc.to_be_bytes());
    packet
}

#[tokio::test]
async fn bytes_forward_transparently_in_both_directions() {
    let (dl_client, dl_server) = loopback_pair().await;
    let upstream_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let upstream_addr = upstream_listener.local_addr().unwrap();

    let config = Arc::new(ProxyConfig {
        upstream_address: upstream_addr.ip().to_string(),
        upstream_port: upstream_addr.port(),
        ..ProxyConfig::default()
    });
    let dispatch = Arc::new(Dispatch::new(Vec::new(), Vec::new(), None));
    let (done_tx, _done_rx) = tokio::sync::mpsc::unbounded_channel();
    let (serial_tx, mut serial_rx) = tokio::sync::mpsc::unbounded_channel();

    let (session, (mut upstream_server, _)) = tokio::join!(
        Session::start(
            dl_server,
            "127.0.0.1:9".parse().unwrap(),
            config,
            dispatch,
            done_tx,
            serial_tx
        ),
        async { upstream_listener.accept().await.unwrap() }
    );
    let _session = session.unwrap();
    let mut dl_client = dl_client;

    let frame = live_data_frame("DL0000000A");
    dl_client.write_all(&frame).await.unwrap();

    let mut received = vec![0u8; frame.len()];
    upstream_server.read_exact(&mut received).await.unwrap();
    assert_eq!(received, frame, "proxy must forward bytes unchanged");

    let (peer, serial) = serial_rx.recv().await.unwrap();
    assert_eq!(peer, "127.0.0.1:9".parse().unwrap());
    assert_eq!(serial, "DL0000000A");

    // Upstream-to-datalogger direction also forwards transparently.
    upstream_server.write_all(b"ack-from-cloud").await.unwrap();
    let mut ack = vec![0u8; "ack-from-cloud".len()];
    dl_client.read_exact(&mut ack).await.unwrap();
    assert_eq!(&ack, b"ack-from-cloud");
}

#[tokio::test]
async fn inject_captures_register_response_instead_of_forwarding() {
    let (dl_client, dl_server) = loopback_pair().await;
    let upstream_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let upstream_addr = upstream_listener.local_addr().unwrap();

    let config = Arc::new(ProxyConfig {
        upstream_address: upstream_addr.ip().to_string(),
        upstream_port: upstream_addr.port(),
        ..ProxyConfig::default()
    });
    let dispatch = Arc::new(Dispatch::new(Vec::new(), Vec::new(), None));
    let (done_tx, _done_rx) = tokio::sync::mpsc::unbounded_channel();
    let (serial_tx, _serial_rx) = tokio::sync::mpsc::unbounded_channel();

    let (session, (mut upstream_server, _)) = tokio::join!(
        Session::start(
            dl_server,
            "127.0.0.1:10".parse().unwrap(),
            config,
            dispatch,
            done_tx,
            serial_tx
        ),
        async { upstream_listener.accept().await.unwrap() }
    );
    let session = session.unwrap();
    let mut dl_client = dl_client;

    let request = build_register_packet(
        "DL0000000A",
        6,
        growatt_proto::Operation::Read { address: 3000, reg_len: 1 },
    );

    let inject_task = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.inject(request).await })
    };

    // Give the inject call time to register its pending response, then
    // answer as the datalogger would.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let response = build_register_packet(
        "DL0000000A",
        6,
        growatt_proto::Operation::Read { address: 3000, reg_len: 1 },
    );
    dl_client.write_all(&response).await.unwrap();

    let result = inject_task.await.unwrap();
    assert!(result.is_ok(), "injected read should receive a response frame");

    // Nothing should have reached upstream: the response was consumed by
    // the rendezvous, not forwarded.
    let mut probe = [0u8; 1];
    let read_result =
        tokio::time::timeout(std::time::Duration::from_millis(50), upstream_server.read(&mut probe)).await;
    assert!(read_result.is_err(), "response frame must not be forwarded to upstream");
}
