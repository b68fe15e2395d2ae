use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, info, warn};

use crate::greet_proto::greet_service_server::{GreetService, GreetServiceServer};
use crate::greet_proto::{HelloRequest, HelloResponse, MessagesList, NamesList, NoParam};
use crate::grpc::server::config::ServerConfig;
use crate::session::{CallKind, StreamSessionMap};

type GreetingStream = Pin<Box<dyn futures::Stream<Item = Result<HelloResponse, Status>> + Send>>;

/// Bind `config.addr` and serve until ctrl-c.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.addr).await?;
    info!(address = %listener.local_addr()?, "server started");

    serve(listener, config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        info!("Shutdown requested");
    })
    .await?;

    Ok(())
}

/// Serve the Greet service on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    config: ServerConfig,
    shutdown: F,
) -> Result<(), tonic::transport::Error>
where
    F: Future<Output = ()> + Send,
{
    let sessions = Arc::new(StreamSessionMap::new());
    let service = GreetServiceImpl::new(config, sessions);

    tonic::transport::Server::builder()
        .add_service(GreetServiceServer::new(service))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await
}

fn greeting(name: &str) -> String {
    format!("Hello {name}")
}

pub struct GreetServiceImpl {
    config: ServerConfig,
    sessions: Arc<StreamSessionMap>,
}

impl GreetServiceImpl {
    pub fn new(config: ServerConfig, sessions: Arc<StreamSessionMap>) -> Self {
        Self { config, sessions }
    }

    pub fn sessions(&self) -> &Arc<StreamSessionMap> {
        &self.sessions
    }
}

#[tonic::async_trait]
impl GreetService for GreetServiceImpl {
    async fn say_hello(
        &self,
        _request: Request<NoParam>,
    ) -> Result<Response<HelloResponse>, Status> {
        Ok(Response::new(HelloResponse {
            message: "Hello".to_string(),
        }))
    }

    type SayHelloServerStreamingStream = GreetingStream;

    async fn say_hello_server_streaming(
        &self,
        request: Request<NamesList>,
    ) -> Result<Response<Self::SayHelloServerStreamingStream>, Status> {
        let peer = request.remote_addr();
        let names = request.into_inner().names;
        let guard = self.sessions.open(CallKind::ServerStreaming, peer);
        let delay = self.config.stream_delay;

        info!(
            session_id = %guard.session_id(),
            names = names.len(),
            active = self.sessions.active_session_count(),
            "Server streaming started"
        );

        let outbound = async_stream::stream! {
            let _guard = guard;
            for (index, name) in names.into_iter().enumerate() {
                if index > 0 && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                yield Ok(HelloResponse { message: greeting(&name) });
            }
        };

        Ok(Response::new(Box::pin(outbound)))
    }

    async fn say_hello_client_streaming(
        &self,
        request: Request<Streaming<HelloRequest>>,
    ) -> Result<Response<MessagesList>, Status> {
        let peer = request.remote_addr();
        let guard = self.sessions.open(CallKind::ClientStreaming, peer);
        let mut inbound = request.into_inner();

        info!(session_id = %guard.session_id(), "Client streaming started");

        let mut messages = Vec::new();
        while let Some(request) = inbound.message().await? {
            info!(session_id = %guard.session_id(), name = %request.name, "Got request");
            messages.push(greeting(&request.name));
        }

        info!(
            session_id = %guard.session_id(),
            greetings = messages.len(),
            "Client streaming finished"
        );
        Ok(Response::new(MessagesList { messages }))
    }

    type SayHelloBidirectionalStreamingStream = GreetingStream;

    async fn say_hello_bidirectional_streaming(
        &self,
        request: Request<Streaming<HelloRequest>>,
    ) -> Result<Response<Self::SayHelloBidirectionalStreamingStream>, Status> {
        let peer = request.remote_addr();
        let guard = self.sessions.open(CallKind::Bidirectional, peer);
        let session_id = guard.session_id().clone();
        let mut inbound = request.into_inner();

        info!(
            session_id = %session_id,
            peer = ?peer,
            active = self.sessions.active_count_of(CallKind::Bidirectional),
            "Bidirectional streaming started"
        );

        let outbound = async_stream::stream! {
            let _guard = guard;
            loop {
                match inbound.message().await {
                    Ok(Some(request)) => {
                        debug!(session_id = %session_id, name = %request.name, "Got request");
                        yield Ok(HelloResponse { message: greeting(&request.name) });
                    }
                    Ok(None) => {
                        debug!(session_id = %session_id, "Client half-closed");
                        break;
                    }
                    Err(status) => {
                        warn!(session_id = %session_id, error = %status, "Request stream error");
                        yield Err(status);
                        break;
                    }
                }
            }
        };

        Ok(Response::new(Box::pin(outbound)))
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    fn service() -> GreetServiceImpl {
        let config = ServerConfig::builder()
            .stream_delay(std::time::Duration::ZERO)
            .build();
        GreetServiceImpl::new(config, Arc::new(StreamSessionMap::new()))
    }

    #[tokio::test]
    async fn test_say_hello() {
        let response = service()
            .say_hello(Request::new(NoParam {}))
            .await
            .unwrap();
        assert_eq!(response.into_inner().message, "Hello");
    }

    #[tokio::test]
    async fn test_server_streaming_greets_each_name() {
        let service = service();
        let names = NamesList {
            names: vec!["Alice".to_string(), "Bob".to_string()],
        };

        let stream = service
            .say_hello_server_streaming(Request::new(names))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(service.sessions().active_session_count(), 1);

        let greetings: Vec<String> = stream
            .map(|item| item.unwrap().message)
            .collect()
            .await;

        assert_eq!(greetings, vec!["Hello Alice", "Hello Bob"]);
        assert_eq!(service.sessions().active_session_count(), 0);
    }
}
