use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::state::ServerState;

// How long accept may block before the running flag is rechecked.
const ACCEPT_POLL: Duration = Duration::from_secs(1);

/// Accepts connections until shutdown, one handler task per client.
/// A failed accept is logged and the loop keeps going; already-accepted
/// connections are not touched when the loop exits.
pub async fn run(listener: TcpListener, state: ServerState) {
    while state.is_running() {
        let (socket, peer) = match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok(accepted)) => accepted,
            Ok(Err(err)) => {
                warn!("accept error: {err}");
                continue;
            }
            Err(_) => continue,
        };

        let state = state.clone();

        tokio::spawn(async move {
            if let Err(err) = crate::conn::handle(state, socket, peer).await {
                warn!("[{}] connection error: {err:?}", peer);
            }
        });
    }

    info!("acceptor stopped");
}
