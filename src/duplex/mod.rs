//! # duplex
//!
//! Coordination of a bidirectional streaming call: one task sends a finite sequence of requests
//! while another drains the responses, over a single duplex stream.
//!
//! ```ignore
//! use greet_stream::duplex::{DuplexCoordinator, ExchangeConfig, LogObserver};
//!
//! let config = ExchangeConfig::builder()
//!     .inter_message_delay(Duration::from_secs(2))
//!     .build();
//!
//! let summary = DuplexCoordinator::new(config)
//!     .open_and_run(&mut opener, requests, LogObserver::new())
//!     .await?;
//! ```
//!
//! The transport is consumed through the traits in [`stream`], so any duplex transport (tonic,
//! or an in-memory mock) can be driven by the same coordinator.

mod cancel;
mod completion;
mod config;
mod coordinator;
mod error;
mod observer;
pub mod stream;

#[cfg(test)]
pub(crate) mod mock;

pub use cancel::{CancelOnDrop, CancellationSignal};
pub use completion::{
    CompletionSignal, CompletionWaiter, DrainOutcome, DrainReport, completion_channel,
};
pub use config::ExchangeConfig;
pub use coordinator::{DuplexCoordinator, ExchangeSummary};
pub use error::{Direction, ExchangeError};
pub use observer::{LogObserver, ResponseObserver};
pub use stream::{DuplexStream, InboundHalf, OutboundHalf, StreamOpener};
