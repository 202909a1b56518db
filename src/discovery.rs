use std::net::IpAddr;
use std::time::Duration;

use anyhow::Result;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::protocol::{DISCOVER_REQUEST, DISCOVER_RESPONSE, READ_BUF};

/// Answers discovery probes on the given socket, forever. Payloads other
/// than the request string are ignored.
pub async fn respond(socket: UdpSocket) -> Result<()> {
    let mut buf = [0u8; READ_BUF];

    loop {
        let (n, peer) = socket.recv_from(&mut buf).await?;

        if &buf[..n] != DISCOVER_REQUEST {
            continue;
        }

        debug!("discovery probe from {}", peer);

        if let Err(err) = socket.send_to(DISCOVER_RESPONSE, peer).await {
            warn!("discovery reply to {} failed: {}", peer, err);
        }
    }
}

/// Broadcasts one probe and waits for a server to answer. None when
/// nothing answered in time.
pub async fn find_server(probe_addr: &str, wait: Duration) -> Result<Option<IpAddr>> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.set_broadcast(true)?;

    socket.send_to(DISCOVER_REQUEST, probe_addr).await?;

    let mut buf = [0u8; READ_BUF];

    match timeout(wait, socket.recv_from(&mut buf)).await {
        Ok(received) => {
            let (n, peer) = received?;

            if &buf[..n] == DISCOVER_RESPONSE {
                Ok(Some(peer.ip()))
            } else {
                Ok(None)
            }
        }
        Err(_) => Ok(None),
    }
}
