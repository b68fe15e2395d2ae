use anyhow::Result;
use greet_stream::duplex::{CancellationSignal, DuplexCoordinator, LogObserver};
use greet_stream::grpc::{CallMode, ClientConfig, GreetClient};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let config = ClientConfig::from_env()?;

    info!(
        endpoint = %config.endpoint,
        mode = %config.mode,
        names = ?config.names,
        "Greet client starting"
    );

    let mut client = GreetClient::connect(config.clone()).await?;

    match config.mode {
        CallMode::Unary => {
            let message = client.say_hello().await?;
            info!(message = %message, "Unary call finished");
        }

        CallMode::ServerStreaming => {
            let received = client
                .say_hello_server_streaming(
                    config.names.clone(),
                    LogObserver::labelled("server-stream"),
                )
                .await?;
            info!(received, "Server streaming call finished");
        }

        CallMode::ClientStreaming => {
            let messages = client
                .say_hello_client_streaming(
                    config.names.clone(),
                    config.exchange.inter_message_delay,
                )
                .await?;
            info!(messages = ?messages, "Client streaming call finished");
        }

        CallMode::Bidirectional => {
            let cancel = CancellationSignal::new();
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, cancelling exchange");
                    ctrl_c.cancel();
                }
            });

            let coordinator =
                DuplexCoordinator::new(config.exchange.clone()).with_cancellation(cancel);

            match client
                .say_hello_bidirectional_streaming(
                    config.names.clone(),
                    &coordinator,
                    LogObserver::labelled("bidi"),
                )
                .await
            {
                Ok(summary) => {
                    info!(
                        sent = summary.sent,
                        received = summary.received,
                        "Bidirectional streaming finished"
                    );
                }
                Err(e) => {
                    let direction = e
                        .direction()
                        .map_or_else(|| "none".to_string(), |d| d.to_string());
                    error!(error = %e, direction = %direction, "Bidirectional streaming failed");
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}
