use thiserror::Error;

/// Errors returned by [`GreetClient`](super::GreetClient) calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured endpoint is not a valid gRPC URI.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Failed to establish the channel to the server.
    #[error("failed to connect")]
    Connect(#[from] tonic::transport::Error),

    /// The call failed with a gRPC status.
    #[error("gRPC error: {0}")]
    Rpc(#[from] tonic::Status),
}

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {value}")]
    InvalidUrl {
        var: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{var} must use the http or https scheme, got '{scheme}'")]
    UnsupportedScheme { var: &'static str, scheme: String },

    #[error("{var} is not a valid socket address: {value}")]
    InvalidAddr {
        var: &'static str,
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("{var} is not a valid number of milliseconds: {value}")]
    InvalidMillis {
        var: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("unknown call mode '{0}', expected one of: unary, server-stream, client-stream, bidi")]
    UnknownMode(String),
}
