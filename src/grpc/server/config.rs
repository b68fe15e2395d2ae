use std::net::SocketAddr;
use std::time::Duration;

use bon::Builder;

use crate::grpc::env::{self, Lookup};
use crate::grpc::error::ConfigError;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// Configuration for the greet server.
#[derive(Debug, Clone, Builder)]
pub struct ServerConfig {
    /// Address the server listens on.
    #[builder(default = SocketAddr::from(([0, 0, 0, 0], 8080)))]
    pub addr: SocketAddr,

    /// Pause between greetings of a server-streaming call.
    #[builder(default = Duration::from_secs(2))]
    pub stream_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ServerConfig {
    /// Read the configuration from `GREET_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&env::process_env)
    }

    /// * `GREET_ADDR`: listen address (default `0.0.0.0:8080`)
    /// * `GREET_STREAM_DELAY_MS`: pause between streamed greetings (default 2000)
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let raw_addr = lookup("GREET_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = raw_addr
            .trim()
            .parse::<SocketAddr>()
            .map_err(|source| ConfigError::InvalidAddr {
                var: "GREET_ADDR",
                value: raw_addr.clone(),
                source,
            })?;

        Ok(Self::builder()
            .addr(addr)
            .maybe_stream_delay(env::millis(lookup, "GREET_STREAM_DELAY_MS")?)
            .build())
    }
}
