use anyhow::Result;

use lanchat::client;
use lanchat::config::ClientConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    client::run(ClientConfig::from_args(std::env::args().skip(1))).await
}
