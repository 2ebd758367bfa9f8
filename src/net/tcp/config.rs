/// Configuration for [`StreamClient`](super::StreamClient).
///
/// Use `StreamClientConfig::builder()` for ergonomic construction.
///
/// ## Socket Options
///
/// TCP_NODELAY and non-blocking mode are always enabled on client sockets and
/// are not configurable.
///
/// ## Resource Limits
///
/// - read_buffer_size: upper bound on the bytes delivered per read callback
/// - keepalive_retries: how many times a keep-alive write is retried on
///   interrupted / would-block before giving up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamClientConfig {
    /// Size of the buffer used for the single read done per readiness event
    pub read_buffer_size: usize,
    /// Maximum keep-alive write attempts under transient errors
    pub keepalive_retries: usize,
}

pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;
pub const DEFAULT_KEEPALIVE_RETRIES: usize = 1024;

impl StreamClientConfig {
    /// Create a new builder for StreamClientConfig
    pub fn builder() -> StreamClientConfigBuilder {
        StreamClientConfigBuilder::new()
    }
}

impl Default for StreamClientConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            keepalive_retries: DEFAULT_KEEPALIVE_RETRIES,
        }
    }
}

/// Builder for StreamClientConfig.
///
/// Unset fields fall back to StreamClientConfig::default().
#[derive(Debug, Default)]
pub struct StreamClientConfigBuilder {
    read_buffer_size: Option<usize>,
    keepalive_retries: Option<usize>,
}

impl StreamClientConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            read_buffer_size: None,
            keepalive_retries: None,
        }
    }

    /// Set the read buffer size. Zero is clamped to one byte.
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = Some(size.max(1));
        self
    }

    /// Set the keep-alive retry cap. Zero is clamped to a single attempt.
    pub fn keepalive_retries(mut self, retries: usize) -> Self {
        self.keepalive_retries = Some(retries.max(1));
        self
    }

    /// Build the StreamClientConfig
    pub fn build(self) -> StreamClientConfig {
        let default = StreamClientConfig::default();
        StreamClientConfig {
            read_buffer_size: self.read_buffer_size.unwrap_or(default.read_buffer_size),
            keepalive_retries: self.keepalive_retries.unwrap_or(default.keepalive_retries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StreamClientConfig::builder().build();
        assert_eq!(config, StreamClientConfig::default());
        assert_eq!(config.read_buffer_size, 1024);
    }

    #[test]
    fn test_overrides() {
        let config = StreamClientConfig::builder()
            .read_buffer_size(16)
            .keepalive_retries(3)
            .build();
        assert_eq!(config.read_buffer_size, 16);
        assert_eq!(config.keepalive_retries, 3);
    }

    #[test]
    fn test_zero_values_clamped() {
        let config = StreamClientConfig::builder()
            .read_buffer_size(0)
            .keepalive_retries(0)
            .build();
        assert_eq!(config.read_buffer_size, 1);
        assert_eq!(config.keepalive_retries, 1);
    }
}
