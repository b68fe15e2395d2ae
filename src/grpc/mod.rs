pub mod client;
pub mod env;
mod error;
pub mod server;
pub mod transport;

pub use client::{BidiStreamOpener, CallMode, ClientConfig, GreetClient};
pub use error::{ClientError, ConfigError};
pub use server::{GreetServiceImpl, ServerConfig, serve, start_server};
