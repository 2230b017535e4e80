//! Registry configuration

use crate::encode::jpeg::DEFAULT_JPEG_QUALITY;

/// Default capacity of a source's output channel (producer to distributor)
pub const DEFAULT_OUTPUT_CAPACITY: usize = 100;

/// Default capacity of each subscriber queue
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 100;

/// Registry configuration options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Frames buffered between a producer and its distributor
    pub output_capacity: usize,

    /// Frames buffered per subscriber before it starts missing frames
    pub subscriber_capacity: usize,

    /// JPEG quality used by the default encoder
    pub jpeg_quality: u8,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            output_capacity: DEFAULT_OUTPUT_CAPACITY,
            subscriber_capacity: DEFAULT_SUBSCRIBER_CAPACITY,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl RegistryConfig {
    /// Set the output channel capacity (minimum 1)
    pub fn output_capacity(mut self, capacity: usize) -> Self {
        self.output_capacity = capacity.max(1);
        self
    }

    /// Set the subscriber queue capacity (minimum 1)
    pub fn subscriber_capacity(mut self, capacity: usize) -> Self {
        self.subscriber_capacity = capacity.max(1);
        self
    }

    /// Set JPEG quality (clamped to 1-100)
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();

        assert_eq!(config.output_capacity, 100);
        assert_eq!(config.subscriber_capacity, 100);
        assert_eq!(config.jpeg_quality, DEFAULT_JPEG_QUALITY);
    }

    #[test]
    fn test_builder_chaining() {
        let config = RegistryConfig::default()
            .output_capacity(8)
            .subscriber_capacity(4)
            .jpeg_quality(95);

        assert_eq!(config.output_capacity, 8);
        assert_eq!(config.subscriber_capacity, 4);
        assert_eq!(config.jpeg_quality, 95);
    }

    #[test]
    fn test_zero_capacity_raised() {
        // tokio channels panic on zero capacity
        let config = RegistryConfig::default()
            .output_capacity(0)
            .subscriber_capacity(0);

        assert_eq!(config.output_capacity, 1);
        assert_eq!(config.subscriber_capacity, 1);
    }

    #[test]
    fn test_quality_clamped() {
        assert_eq!(RegistryConfig::default().jpeg_quality(0).jpeg_quality, 1);
        assert_eq!(RegistryConfig::default().jpeg_quality(255).jpeg_quality, 100);
    }
}
