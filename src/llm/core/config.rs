//! Generation configuration parameters

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::types::Model;

/// Temperature used for every relay call
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Parameters for controlling text generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model identifier sent upstream
    pub model: Model,
    /// Randomness (0.0-2.0, higher = more random)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum number of tokens to generate (provider default when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Deadline for the whole upstream call, body included
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

impl GenerationConfig {
    /// Create a new configuration for the given model
    pub fn new(model: Model) -> Self {
        Self {
            model,
            temperature: None,
            max_tokens: None,
            timeout: None,
        }
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Bound the upstream call; `None` waits on provider/transport defaults
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(Model::default()).with_temperature(DEFAULT_TEMPERATURE)
    }
}
