use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use bon::Builder;
use url::Url;

use crate::duplex::ExchangeConfig;
use crate::grpc::env::{self, Lookup};
use crate::grpc::error::ConfigError;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080";
pub const DEFAULT_NAMES: [&str; 3] = ["Yatharth", "Alice", "Bob"];

/// Which of the four Greet calls the client makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    Unary,
    ServerStreaming,
    ClientStreaming,
    Bidirectional,
}

impl FromStr for CallMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unary" => Ok(CallMode::Unary),
            "server-stream" | "server-streaming" => Ok(CallMode::ServerStreaming),
            "client-stream" | "client-streaming" => Ok(CallMode::ClientStreaming),
            "bidi" | "bidirectional" => Ok(CallMode::Bidirectional),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for CallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallMode::Unary => f.write_str("unary"),
            CallMode::ServerStreaming => f.write_str("server-stream"),
            CallMode::ClientStreaming => f.write_str("client-stream"),
            CallMode::Bidirectional => f.write_str("bidi"),
        }
    }
}

/// Configuration for the greet client.
#[derive(Debug, Clone, Builder)]
pub struct ClientConfig {
    /// Server endpoint, e.g. `http://localhost:8080`.
    pub endpoint: Url,

    #[builder(default = CallMode::Bidirectional)]
    pub mode: CallMode,

    /// Names sent by the streaming calls, in order.
    #[builder(default = DEFAULT_NAMES.iter().map(|name| name.to_string()).collect())]
    pub names: Vec<String>,

    /// Pacing and limits for streamed requests.
    #[builder(default)]
    pub exchange: ExchangeConfig,

    #[builder(default = Duration::from_secs(5))]
    pub connect_timeout: Duration,
}

impl ClientConfig {
    /// Read the configuration from `GREET_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&env::process_env)
    }

    /// Read the configuration through `lookup`, falling back to defaults for missing variables.
    ///
    /// * `GREET_ENDPOINT`: server URL (default `http://localhost:8080`)
    /// * `GREET_MODE`: `unary`, `server-stream`, `client-stream` or `bidi` (default `bidi`)
    /// * `GREET_NAMES`: comma separated names (default `Yatharth,Alice,Bob`)
    /// * `GREET_DELAY_MS`: pause between streamed requests (default 2000)
    /// * `GREET_TIMEOUT_MS`: optional limit on a bidirectional exchange
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        let raw_endpoint = lookup("GREET_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let endpoint = parse_endpoint(&raw_endpoint)?;

        let mode = lookup("GREET_MODE")
            .map(|mode| mode.parse::<CallMode>())
            .transpose()?
            .unwrap_or(CallMode::Bidirectional);

        let names = match lookup("GREET_NAMES") {
            Some(names) => names
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_NAMES.iter().map(|name| name.to_string()).collect(),
        };

        let exchange = ExchangeConfig::builder()
            .inter_message_delay(
                env::millis(lookup, "GREET_DELAY_MS")?.unwrap_or(Duration::from_secs(2)),
            )
            .maybe_timeout(env::millis(lookup, "GREET_TIMEOUT_MS")?)
            .build();

        Ok(Self::builder()
            .endpoint(endpoint)
            .mode(mode)
            .names(names)
            .exchange(exchange)
            .build())
    }
}

fn parse_endpoint(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        var: "GREET_ENDPOINT",
        value: value.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::UnsupportedScheme {
            var: "GREET_ENDPOINT",
            scheme: scheme.to_string(),
        }),
    }
}
