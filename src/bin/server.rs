use anyhow::Result;
use tokio::net::{TcpListener, UdpSocket};
use tracing::{info, warn};

use lanchat::command;
use lanchat::config::ServerConfig;
use lanchat::discovery;
use lanchat::server;
use lanchat::state::ServerState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = ServerConfig::from_args(std::env::args().skip(1));

    let state = ServerState::default();

    let discovery_socket = UdpSocket::bind(("0.0.0.0", cfg.discovery_port)).await?;
    info!("discovery responder on port {}", cfg.discovery_port);
    tokio::spawn(async move {
        if let Err(err) = discovery::respond(discovery_socket).await {
            warn!("discovery responder stopped: {err:?}");
        }
    });

    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("listening on {}", cfg.listen_addr);

    let acceptor = tokio::spawn(server::run(listener, state.clone()));

    println!("Server ready. Type start to activate, help for commands.");

    command::run(state).await?;

    acceptor.await?;

    println!("Server stopped.");

    Ok(())
}
