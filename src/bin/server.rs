use anyhow::Result;
use greet_stream::grpc::{ServerConfig, start_server};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let config = ServerConfig::from_env()?;

    info!(
        address = %config.addr,
        stream_delay_ms = config.stream_delay.as_millis() as u64,
        "Starting greet server"
    );

    start_server(config).await?;

    info!("Server stopped");
    Ok(())
}
