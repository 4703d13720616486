//! Session integration tests over real loopback UDP sockets.
//!
//! Each test binds two sockets on 127.0.0.1, runs the listening half in a
//! background task and moves bytes through the full stack.

use std::net::SocketAddr;
use std::time::Duration;

use icmp_stream::config::{FrameConfig, IdlePolicy};
use icmp_stream::session::{Session, SessionError};
use icmp_stream::socket::Socket;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn ephemeral() -> (Socket, SocketAddr) {
    let socket = Socket::bind("127.0.0.1:0".parse().unwrap())
        .await
        .expect("bind loopback socket");
    let addr = socket.local_addr;
    (socket, addr)
}

fn config() -> FrameConfig {
    FrameConfig {
        window_size: 256,
        buffer_capacity: 64 * 1024,
        ..FrameConfig::default()
    }
}

async fn read_all(session: &mut Session, len: usize) -> Vec<u8> {
    let mut got = Vec::with_capacity(len);
    while got.len() < len {
        match session.recv().await {
            Some(chunk) => got.extend(chunk),
            None => break,
        }
    }
    got
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bytes_flow_both_ways_and_sessions_finish() {
    let (server_socket, server_addr) = ephemeral().await;
    let (client_socket, _) = ephemeral().await;

    let request: Vec<u8> = (0..200_000u32).map(|i| (i % 253) as u8).collect();
    let response = b"thanks".to_vec();

    let expected = request.clone();
    let reply = response.clone();
    let server = tokio::spawn(async move {
        let mut s = Session::accept(server_socket, config()).await?;
        let got = read_all(&mut s, expected.len()).await;
        assert_eq!(got, expected);
        s.send(reply).await?;
        s.finish().await
    });

    let mut client = Session::connect(client_socket, server_addr, config()).unwrap();
    for chunk in request.chunks(10_000) {
        client.send(chunk.to_vec()).await.unwrap();
    }
    let got = tokio::time::timeout(
        Duration::from_secs(20),
        read_all(&mut client, response.len()),
    )
    .await
    .expect("response timed out");
    assert_eq!(got, response);

    tokio::time::timeout(Duration::from_secs(20), client.finish())
        .await
        .expect("client finish timed out")
        .expect("client session failed");
    tokio::time::timeout(Duration::from_secs(20), server)
        .await
        .expect("server finish timed out")
        .expect("server task panicked")
        .expect("server session failed");
}

#[tokio::test]
async fn send_after_close_is_refused() {
    let (client_socket, _) = ephemeral().await;
    let (_peer_socket, peer_addr) = ephemeral().await;

    let mut client = Session::connect(client_socket, peer_addr, config()).unwrap();
    client.close();
    assert!(matches!(
        client.send(b"late".to_vec()).await,
        Err(SessionError::Closed)
    ));
}

#[tokio::test]
async fn silent_peer_trips_the_idle_policy() {
    let (client_socket, _) = ephemeral().await;
    // Bound but never read: the peer exists and stays silent.
    let (_peer_socket, peer_addr) = ephemeral().await;

    let cfg = FrameConfig {
        idle_policy: IdlePolicy::After(Duration::from_millis(200)),
        ..config()
    };
    let client = Session::connect(client_socket, peer_addr, cfg).unwrap();
    let res = tokio::time::timeout(Duration::from_secs(5), client.finish())
        .await
        .expect("idle detection timed out");
    assert!(matches!(res, Err(SessionError::Idle(_))));
}

#[tokio::test]
async fn vanished_peer_bounds_finish_by_the_close_grace() {
    let (client_socket, _) = ephemeral().await;
    let (peer_socket, peer_addr) = ephemeral().await;
    drop(peer_socket);

    let cfg = FrameConfig {
        close_grace: Duration::from_millis(300),
        ..config()
    };
    let mut client = Session::connect(client_socket, peer_addr, cfg).unwrap();
    client.send(b"into the void".to_vec()).await.unwrap();
    let res = tokio::time::timeout(Duration::from_secs(5), client.finish())
        .await
        .expect("finish did not honour the close grace");
    assert!(matches!(res, Err(SessionError::CloseTimeout(d)) if d == Duration::from_millis(300)));
}

#[tokio::test]
async fn invalid_config_is_rejected_up_front() {
    let (client_socket, _) = ephemeral().await;
    let cfg = FrameConfig {
        window_size: 0,
        ..FrameConfig::default()
    };
    let res = Session::connect(client_socket, "127.0.0.1:9".parse().unwrap(), cfg);
    assert!(matches!(res, Err(SessionError::Config(_))));
}
