use std::time::Duration;

use tonic::Status;
use tonic::transport::Channel;
use tracing::{debug, info};

use crate::duplex::{
    DuplexCoordinator, ExchangeError, ExchangeSummary, ResponseObserver, StreamOpener,
};
use crate::greet_proto::greet_service_client::GreetServiceClient;
use crate::greet_proto::{HelloRequest, HelloResponse, NamesList, NoParam};
use crate::grpc::client::config::ClientConfig;
use crate::grpc::error::ClientError;
use crate::grpc::transport::{GrpcDuplexStream, request_channel};

/// Client for the four Greet calls.
///
/// # Example
///
/// ```ignore
/// let config = ClientConfig::from_env()?;
/// let mut client = GreetClient::connect(config).await?;
///
/// let greeting = client.say_hello().await?;
///
/// let coordinator = DuplexCoordinator::new(client.config().exchange.clone());
/// let summary = client
///     .say_hello_bidirectional_streaming(names, &coordinator, LogObserver::new())
///     .await?;
/// ```
pub struct GreetClient {
    inner: GreetServiceClient<Channel>,
    config: ClientConfig,
}

impl GreetClient {
    /// Connect to the server at `config.endpoint`.
    ///
    /// # Errors
    ///
    /// * [`ClientError::InvalidEndpoint`] if the endpoint is not a valid URI
    /// * [`ClientError::Connect`] if the connection could not be established
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let endpoint = Channel::from_shared(config.endpoint.to_string())
            .map_err(|e| ClientError::InvalidEndpoint(e.to_string()))?
            .connect_timeout(config.connect_timeout);

        info!(endpoint = %config.endpoint, "Connecting to greet server");
        let channel = endpoint.connect().await?;

        Ok(Self::with_channel(channel, config))
    }

    /// Wrap an already established channel.
    pub fn with_channel(channel: Channel, config: ClientConfig) -> Self {
        Self {
            inner: GreetServiceClient::new(channel),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Unary call: returns the server's greeting.
    pub async fn say_hello(&mut self) -> Result<String, ClientError> {
        let response = self.inner.say_hello(NoParam {}).await?;
        Ok(response.into_inner().message)
    }

    /// Send all `names` in one request and report each streamed greeting to `observer`.
    ///
    /// Returns the number of greetings received before the server ended the stream.
    pub async fn say_hello_server_streaming<R>(
        &mut self,
        names: Vec<String>,
        mut observer: R,
    ) -> Result<u64, ClientError>
    where
        R: ResponseObserver<HelloResponse>,
    {
        info!(names = names.len(), "Server streaming started");

        let mut stream = self
            .inner
            .say_hello_server_streaming(NamesList { names })
            .await?
            .into_inner();

        let mut received = 0;
        while let Some(response) = stream.message().await? {
            observer.on_response(received, &response);
            received += 1;
        }

        info!(received, "Server streaming finished");
        Ok(received)
    }

    /// Stream one request per name, `delay` apart, then return the server's collected greetings.
    pub async fn say_hello_client_streaming(
        &mut self,
        names: Vec<String>,
        delay: Duration,
    ) -> Result<Vec<String>, ClientError> {
        info!(names = names.len(), "Client streaming started");

        let requests = async_stream::stream! {
            for (index, name) in names.into_iter().enumerate() {
                if index > 0 && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                debug!(name = %name, "Sending request");
                yield HelloRequest { name };
            }
        };

        let response = self.inner.say_hello_client_streaming(requests).await?;
        let messages = response.into_inner().messages;

        info!(received = messages.len(), "Client streaming finished");
        Ok(messages)
    }

    /// Run a bidirectional exchange: one request per name, greetings reported as they arrive.
    ///
    /// # Errors
    ///
    /// Any [`ExchangeError`] from opening or running the exchange.
    pub async fn say_hello_bidirectional_streaming<R>(
        &mut self,
        names: Vec<String>,
        coordinator: &DuplexCoordinator,
        observer: R,
    ) -> Result<ExchangeSummary, ExchangeError>
    where
        R: ResponseObserver<HelloResponse> + Send + 'static,
    {
        info!(names = names.len(), "Bidirectional streaming started");

        let mut opener = self.bidirectional_opener(coordinator.config().request_buffer);
        let requests = names.into_iter().map(|name| HelloRequest { name });

        coordinator.open_and_run(&mut opener, requests, observer).await
    }

    /// An opener for new `SayHelloBidirectionalStreaming` calls on this client's channel.
    pub fn bidirectional_opener(&self, request_buffer: usize) -> BidiStreamOpener {
        BidiStreamOpener {
            client: self.inner.clone(),
            request_buffer,
        }
    }
}

/// Opens `SayHelloBidirectionalStreaming` calls.
#[derive(Debug, Clone)]
pub struct BidiStreamOpener {
    client: GreetServiceClient<Channel>,
    request_buffer: usize,
}

#[tonic::async_trait]
impl StreamOpener for BidiStreamOpener {
    type Stream = GrpcDuplexStream<HelloRequest, HelloResponse>;

    async fn open(&mut self) -> Result<Self::Stream, Status> {
        let (sink, requests) = request_channel(self.request_buffer);
        let response = self
            .client
            .say_hello_bidirectional_streaming(requests)
            .await?;

        debug!("Bidirectional stream open");
        Ok(GrpcDuplexStream::new(sink, response.into_inner()))
    }
}
