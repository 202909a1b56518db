use anyhow::Result;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tracing::info;

use crate::admission::Admission;
use crate::protocol::READ_BUF;
use crate::room::{ConnId, Member};
use crate::state::ServerState;

pub async fn handle(state: ServerState, socket: TcpStream, peer: SocketAddr) -> Result<()> {
    let (mut reader, mut writer) = socket.into_split();

    if state.admission() != Admission::Active {
        writer
            .write_all(b"[server] The server is in standby. No new clients.")
            .await?;
        return Ok(());
    }

    writer
        .write_all(b"Enter the PIN of the room you want to join: ")
        .await?;

    let Some(pin) = read_message(&mut reader).await? else {
        return Ok(());
    };
    let pin = pin.trim().to_string();

    writer.write_all(b"Enter your name: ").await?;

    let Some(name) = read_message(&mut reader).await? else {
        return Ok(());
    };
    let name = name.trim().to_string();

    let id = state.next_conn_id();
    let (tx, rx) = mpsc::unbounded_channel();

    state.join(&pin, Member::new(id, name.clone(), tx));
    state.broadcast(&pin, &format!("[server] {} joined room {}", name, pin), None);

    info!("[{}] {} joined room {}", peer, name, pin);

    let result = relay(&state, &mut reader, &mut writer, rx, &pin, &name, id).await;

    // Terminal cleanup, reached exactly once on every exit path.
    state.leave(&pin, id);
    state.broadcast(&pin, &format!("[server] {} left room {}", name, pin), None);

    info!("[{}] disconnected", peer);

    result
}

async fn relay(
    state: &ServerState,
    reader: &mut OwnedReadHalf,
    writer: &mut OwnedWriteHalf,
    mut rx: mpsc::UnboundedReceiver<String>,
    pin: &str,
    name: &str,
    id: ConnId,
) -> Result<()> {
    let mut buf = [0u8; READ_BUF];

    loop {
        tokio::select! {
            read = reader.read(&mut buf) => {
                let n = read?;
                if n == 0 {
                    break;
                }

                let Ok(text) = std::str::from_utf8(&buf[..n]) else {
                    break;
                };

                // Every read draws the notice while stopped, blank or not.
                if state.admission() == Admission::Stopped {
                    writer
                        .write_all(b"[server] The server is stopped. Messages are disabled.")
                        .await?;
                    continue;
                }

                let text = text.trim();
                if text.is_empty() {
                    continue;
                }

                state.broadcast(pin, &format!("{}: {}", name, text), Some(id));
            }

            queued = rx.recv() => {
                match queued {
                    Some(msg) => writer.write_all(msg.as_bytes()).await?,
                    // Queue closed: the member was removed out from under us.
                    None => break,
                }
            }
        }
    }

    Ok(())
}

/// One transport read as one logical message. None means the peer closed
/// the connection or sent bytes that are not UTF-8.
async fn read_message(reader: &mut OwnedReadHalf) -> Result<Option<String>> {
    let mut buf = [0u8; READ_BUF];

    let n = reader.read(&mut buf).await?;
    if n == 0 {
        return Ok(None);
    }

    match std::str::from_utf8(&buf[..n]) {
        Ok(text) => Ok(Some(text.to_string())),
        Err(_) => Ok(None),
    }
}
