//! Client side of the Greet service.
//!
//! [`GreetClient`] wraps the generated tonic client and exposes the four call shapes. The
//! bidirectional call is driven by a [`DuplexCoordinator`](crate::duplex::DuplexCoordinator)
//! over a stream opened with [`BidiStreamOpener`].

mod config;
mod greet_client;

pub use config::{CallMode, ClientConfig, DEFAULT_ENDPOINT, DEFAULT_NAMES};
pub use greet_client::{BidiStreamOpener, GreetClient};
