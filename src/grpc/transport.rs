//! tonic implementation of the duplex stream halves.
//!
//! Requests travel through a bounded channel whose receiving end is handed to tonic as the
//! request stream. Dropping the sender ends that stream, which is how a half-close reaches the
//! server.

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Status, Streaming};

use crate::duplex::{DuplexStream, InboundHalf, OutboundHalf};

/// Create a request sink and the stream tonic should consume.
///
/// `buffer` bounds how many requests may be queued ahead of the wire; it is at least one.
pub fn request_channel<Req>(buffer: usize) -> (GrpcRequestSink<Req>, ReceiverStream<Req>) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (GrpcRequestSink { tx: Some(tx) }, ReceiverStream::new(rx))
}

#[derive(Debug)]
pub struct GrpcRequestSink<Req> {
    tx: Option<mpsc::Sender<Req>>,
}

impl<Req> GrpcRequestSink<Req> {
    pub fn is_closed(&self) -> bool {
        self.tx.as_ref().is_none_or(|tx| tx.is_closed())
    }
}

#[tonic::async_trait]
impl<Req: Send + 'static> OutboundHalf for GrpcRequestSink<Req> {
    type Request = Req;

    async fn send(&mut self, request: Req) -> Result<(), Status> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| Status::failed_precondition("request stream already half-closed"))?;

        tx.send(request)
            .await
            .map_err(|_| Status::unavailable("request stream closed by the transport"))
    }

    fn close_send(&mut self) {
        self.tx.take();
    }
}

pub struct GrpcResponseStream<Resp> {
    inner: Streaming<Resp>,
}

impl<Resp> GrpcResponseStream<Resp> {
    pub fn new(inner: Streaming<Resp>) -> Self {
        Self { inner }
    }
}

#[tonic::async_trait]
impl<Resp: Send + 'static> InboundHalf for GrpcResponseStream<Resp> {
    type Response = Resp;

    async fn receive(&mut self) -> Result<Option<Resp>, Status> {
        self.inner.message().await
    }
}

/// An open bidirectional gRPC call.
pub struct GrpcDuplexStream<Req, Resp> {
    sink: GrpcRequestSink<Req>,
    responses: GrpcResponseStream<Resp>,
}

impl<Req, Resp> GrpcDuplexStream<Req, Resp> {
    pub fn new(sink: GrpcRequestSink<Req>, responses: Streaming<Resp>) -> Self {
        Self {
            sink,
            responses: GrpcResponseStream::new(responses),
        }
    }
}

impl<Req, Resp> DuplexStream for GrpcDuplexStream<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    type Sender = GrpcRequestSink<Req>;
    type Receiver = GrpcResponseStream<Resp>;

    fn split(self) -> (Self::Sender, Self::Receiver) {
        (self.sink, self.responses)
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[tokio::test]
    async fn test_sink_feeds_request_stream_in_order() {
        let (mut sink, mut requests) = request_channel::<String>(4);

        sink.send("Alice".to_string()).await.unwrap();
        sink.send("Bob".to_string()).await.unwrap();
        sink.close_send();

        assert_eq!(requests.next().await.as_deref(), Some("Alice"));
        assert_eq!(requests.next().await.as_deref(), Some("Bob"));
        assert_eq!(requests.next().await, None);
    }

    #[tokio::test]
    async fn test_send_after_half_close_is_rejected() {
        let (mut sink, _requests) = request_channel::<String>(1);

        sink.close_send();
        sink.close_send();

        let status = sink.send("late".to_string()).await.unwrap_err();
        assert_eq!(status.code(), tonic::Code::FailedPrecondition);
        assert!(sink.is_closed());
    }

    #[tokio::test]
    async fn test_send_after_call_ended_is_unavailable() {
        let (mut sink, requests) = request_channel::<String>(1);

        drop(requests);

        let status = sink.send("orphan".to_string()).await.unwrap_err();
        assert_eq!(status.code(), tonic::Code::Unavailable);
    }
}
