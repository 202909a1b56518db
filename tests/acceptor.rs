use std::fs::File;
use std::time::Duration;

use anyhow::Result;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout};

use lanchat::command;
use lanchat::protocol::parse_console;
use lanchat::server;
use lanchat::state::ServerState;

/// One read, empty string on EOF.
async fn recv(stream: &mut TcpStream) -> Result<String> {
    let mut buf = [0u8; 1024];
    let n = timeout(Duration::from_secs(2), stream.read(&mut buf)).await??;
    Ok(String::from_utf8_lossy(&buf[..n]).into_owned())
}

// Starves the whole process of file descriptors, so it lives in its own
// binary away from the other integration tests.
#[tokio::test]
async fn accept_errors_do_not_stop_the_acceptor() -> Result<()> {
    let state = ServerState::default();
    command::apply(&state, parse_console("start").unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    // Parked in the backlog: nothing is accepting yet.
    let mut parked = TcpStream::connect(addr).await?;

    // Use up every descriptor so accepting the parked connection fails.
    let mut hoard = Vec::new();
    while let Ok(f) = File::open("/dev/null") {
        hoard.push(f);
        if hoard.len() >= 1_100_000 {
            break;
        }
    }

    let acceptor = tokio::spawn(server::run(listener, state.clone()));

    // Let the loop hit the failing accept a few times.
    sleep(Duration::from_millis(200)).await;
    assert!(!acceptor.is_finished(), "acceptor task exited");

    drop(hoard);

    // With descriptors back, the parked connection and a fresh one both
    // reach the handshake.
    let prompt = recv(&mut parked).await?;
    assert!(prompt.contains("PIN"), "unexpected prompt: {prompt:?}");

    let mut fresh = TcpStream::connect(addr).await?;
    let prompt = recv(&mut fresh).await?;
    assert!(prompt.contains("PIN"), "unexpected prompt: {prompt:?}");

    assert!(!acceptor.is_finished(), "acceptor task exited");

    Ok(())
}
