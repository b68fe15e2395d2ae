use std::time::Duration;

use bon::Builder;

/// Configuration for a duplex exchange.
#[derive(Debug, Clone, Builder)]
pub struct ExchangeConfig {
    /// Pause between consecutive sends. Not applied after the last request.
    #[builder(default = Duration::from_secs(2))]
    pub inter_message_delay: Duration,

    /// Upper bound on the whole exchange. `None` waits for the peer indefinitely.
    pub timeout: Option<Duration>,

    /// Number of requests the transport may buffer ahead of the wire.
    #[builder(default = 1)]
    pub request_buffer: usize,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExchangeConfig::default();
        assert_eq!(config.inter_message_delay, Duration::from_secs(2));
        assert_eq!(config.timeout, None);
        assert_eq!(config.request_buffer, 1);
    }

    #[test]
    fn test_overrides() {
        let config = ExchangeConfig::builder()
            .inter_message_delay(Duration::ZERO)
            .timeout(Duration::from_secs(5))
            .build();
        assert!(config.inter_message_delay.is_zero());
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }
}
