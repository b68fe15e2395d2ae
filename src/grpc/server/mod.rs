//! Server side of the Greet service.

mod config;
mod greet_service;

pub use config::{DEFAULT_ADDR, ServerConfig};
pub use greet_service::{GreetServiceImpl, serve, start_server};
