//! The transport boundary consumed by the coordinator.
//!
//! A duplex stream is split into an [`OutboundHalf`] and an [`InboundHalf`] so each driver owns
//! exactly one side. This rules out concurrent sends or concurrent receives on the same stream.

use tonic::Status;

/// The sending side of a duplex stream.
#[tonic::async_trait]
pub trait OutboundHalf: Send {
    type Request: Send;

    /// Send one request, waiting until the transport accepts it.
    async fn send(&mut self, request: Self::Request) -> Result<(), Status>;

    /// Signal that no more requests will be sent. Calling it again has no effect.
    fn close_send(&mut self);
}

/// The receiving side of a duplex stream.
#[tonic::async_trait]
pub trait InboundHalf: Send {
    type Response: Send + 'static;

    /// Receive the next response.
    ///
    /// Returns `Ok(None)` once the peer has half-closed its side (end-of-stream).
    async fn receive(&mut self) -> Result<Option<Self::Response>, Status>;
}

/// An open duplex stream that can be split into its two halves.
pub trait DuplexStream {
    type Sender: OutboundHalf;
    type Receiver: InboundHalf + 'static;

    fn split(self) -> (Self::Sender, Self::Receiver);
}

impl<S, R> DuplexStream for (S, R)
where
    S: OutboundHalf,
    R: InboundHalf + 'static,
{
    type Sender = S;
    type Receiver = R;

    fn split(self) -> (S, R) {
        self
    }
}

/// Opens a new duplex stream on an established connection.
#[tonic::async_trait]
pub trait StreamOpener: Send {
    type Stream: DuplexStream + Send;

    async fn open(&mut self) -> Result<Self::Stream, Status>;
}
