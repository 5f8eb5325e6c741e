//! Framing configuration.

use tracing::warn;

use crate::core::constants::{DEFAULT_MAX_MESSAGE_BYTES, MAX_MESSAGE_BYTES_ENV, MIN_MAX_MESSAGE_BYTES};

/// Limits applied by the receive side of a framed channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramingConfig {
    /// Largest reassembled payload accepted before the buffer is dropped.
    pub max_message_bytes: usize,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

impl FramingConfig {
    /// Read overrides from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(MAX_MESSAGE_BYTES_ENV).ok().as_deref())
    }

    fn from_env_value(raw: Option<&str>) -> Self {
        let max_message_bytes = match raw {
            None => DEFAULT_MAX_MESSAGE_BYTES,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(value) if value >= MIN_MAX_MESSAGE_BYTES => value,
                Ok(value) => {
                    warn!(
                        var = MAX_MESSAGE_BYTES_ENV,
                        value,
                        min = MIN_MAX_MESSAGE_BYTES,
                        "value below minimum, using default"
                    );
                    DEFAULT_MAX_MESSAGE_BYTES
                }
                Err(err) => {
                    warn!(var = MAX_MESSAGE_BYTES_ENV, %err, "invalid value, using default");
                    DEFAULT_MAX_MESSAGE_BYTES
                }
            },
        };
        Self { max_message_bytes }
    }

    /// Set the reassembly ceiling.
    pub fn with_max_message_bytes(mut self, max: usize) -> Self {
        self.max_message_bytes = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_value_parsing() {
        assert_eq!(
            FramingConfig::from_env_value(None).max_message_bytes,
            DEFAULT_MAX_MESSAGE_BYTES
        );
        assert_eq!(
            FramingConfig::from_env_value(Some(" 65536 ")).max_message_bytes,
            65536
        );
        assert_eq!(
            FramingConfig::from_env_value(Some("12")).max_message_bytes,
            DEFAULT_MAX_MESSAGE_BYTES
        );
        assert_eq!(
            FramingConfig::from_env_value(Some("lots")).max_message_bytes,
            DEFAULT_MAX_MESSAGE_BYTES
        );
    }
}
