//! Connector configuration.

use crate::core::constants::DEFAULT_TRICKLE;
use crate::framing::FramingConfig;

/// Connector configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectorConfig {
    /// Ask capabilities to trickle negotiation data.
    pub trickle: bool,

    /// Limits applied to channels produced by the connector.
    pub framing: FramingConfig,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            trickle: DEFAULT_TRICKLE,
            framing: FramingConfig::default(),
        }
    }
}

impl ConnectorConfig {
    /// Defaults with framing limits read from the environment.
    pub fn from_env() -> Self {
        Self {
            framing: FramingConfig::from_env(),
            ..Self::default()
        }
    }
}

/// Builder for [`ConnectorConfig`].
#[derive(Debug)]
pub struct ConnectorBuilder {
    config: ConnectorConfig,
}

impl ConnectorBuilder {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            config: ConnectorConfig::default(),
        }
    }

    /// Enable or disable trickle signaling.
    pub fn trickle(mut self, enabled: bool) -> Self {
        self.config.trickle = enabled;
        self
    }

    /// Set the framing limits.
    pub fn framing(mut self, framing: FramingConfig) -> Self {
        self.config.framing = framing;
        self
    }

    /// Set the largest message a channel will reassemble.
    pub fn max_message_bytes(mut self, max: usize) -> Self {
        self.config.framing.max_message_bytes = max;
        self
    }

    /// Build the connector configuration.
    pub fn build(self) -> ConnectorConfig {
        self.config
    }
}

impl Default for ConnectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
