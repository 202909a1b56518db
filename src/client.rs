use std::net::SocketAddr;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::time::sleep;
use tracing::debug;

use crate::config::ClientConfig;
use crate::discovery;
use crate::protocol::{READ_BUF, STOP_TOKEN};

enum SessionEnd {
    /// The user asked to stop; do not reconnect.
    Stop,
    /// The server went away; discover and connect again.
    Lost,
}

/// Discover, connect, chat, reconnect. The first attempt gives up on
/// failure; once a session has been established the loop retries forever
/// until the user types the stop token.
pub async fn run(cfg: ClientConfig) -> Result<()> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut first_attempt = true;

    loop {
        let found = discovery::find_server(&cfg.probe_addr, cfg.discovery_wait).await?;

        let Some(server) = found else {
            println!("[client] No server found on the LAN.");
            if first_attempt {
                return Ok(());
            }
            sleep(cfg.retry_delay).await;
            continue;
        };

        println!("[client] Found server at {}", server);

        let addr = SocketAddr::new(server, cfg.chat_port);

        let stream = match TcpStream::connect(addr).await {
            Ok(stream) => stream,
            Err(err) => {
                println!("[client] Could not connect to {}: {}", addr, err);
                if first_attempt {
                    return Ok(());
                }
                sleep(cfg.retry_delay).await;
                continue;
            }
        };

        println!("[client] Connected to {}", addr);
        first_attempt = false;

        match session(stream, &mut input).await? {
            SessionEnd::Stop => {
                println!("[client] Stopping.");
                return Ok(());
            }
            SessionEnd::Lost => {
                println!("[client] Connection lost. Looking for the server again...");
                sleep(cfg.retry_delay).await;
            }
        }
    }
}

/// One connected session: print whatever the server sends, forward every
/// input line verbatim. Stdin EOF behaves like the stop token.
async fn session<R>(stream: TcpStream, input: &mut Lines<R>) -> Result<SessionEnd>
where
    R: AsyncBufRead + Unpin,
{
    let (mut reader, mut writer) = stream.into_split();
    let mut buf = [0u8; READ_BUF];

    loop {
        tokio::select! {
            read = reader.read(&mut buf) => {
                match read {
                    Ok(0) => return Ok(SessionEnd::Lost),
                    Ok(n) => println!("{}", String::from_utf8_lossy(&buf[..n])),
                    Err(err) => {
                        debug!("session read failed: {}", err);
                        return Ok(SessionEnd::Lost);
                    }
                }
            }

            line = input.next_line() => {
                let Some(line) = line? else {
                    return Ok(SessionEnd::Stop);
                };

                if line.trim() == STOP_TOKEN {
                    return Ok(SessionEnd::Stop);
                }

                if let Err(err) = writer.write_all(line.as_bytes()).await {
                    debug!("session write failed: {}", err);
                    return Ok(SessionEnd::Lost);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (client, server)
    }

    #[tokio::test]
    async fn stop_token_ends_the_session_without_reconnect_intent() {
        let (client, _server) = pair().await;

        let mut input = BufReader::new(&b"/stop\n"[..]).lines();
        let end = session(client, &mut input).await.unwrap();

        assert!(matches!(end, SessionEnd::Stop));
    }

    #[tokio::test]
    async fn server_close_reports_a_lost_session() {
        let (client, server) = pair().await;
        drop(server);

        // Keep stdin pending so only the socket can end the session.
        let (pending, _keep_open) = tokio::io::duplex(16);
        let mut input = BufReader::new(pending).lines();

        let end = session(client, &mut input).await.unwrap();

        assert!(matches!(end, SessionEnd::Lost));
    }

    #[tokio::test]
    async fn input_lines_are_forwarded_verbatim() {
        let (client, mut server) = pair().await;

        let mut input = BufReader::new(&b"hello there\n"[..]).lines();
        let _ = session(client, &mut input).await.unwrap();

        let mut buf = [0u8; 64];
        let n = server.read(&mut buf).await.unwrap();

        assert_eq!(&buf[..n], b"hello there");
    }
}
