//! Server configuration read from the environment

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use warp::http::header::HeaderName;

use crate::llm::{GenerationConfig, Model, DEFAULT_TEMPERATURE};
use crate::llm::openai::DEFAULT_BASE_URL;

pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Request headers every preflight accepts; `CORS_ALLOWED_HEADERS` adds to these
pub const DEFAULT_ALLOWED_HEADERS: &[&str] = &[
    "content-type",
    "authorization",
    "accept",
    "x-requested-with",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    InvalidVar { name: &'static str, reason: String },
}

#[derive(Clone)]
pub struct ServerConfig {
    /// `OPENAI_API_KEY`
    pub api_key: String,
    /// `OPENAI_BASE_URL`
    pub base_url: String,
    /// `OPENAI_MODEL`
    pub model: Model,
    /// `UPSTREAM_TIMEOUT_SECS`; unset means no deadline
    pub upstream_timeout: Option<Duration>,
    /// `CORS_ALLOWED_ORIGIN`
    pub allowed_origin: String,
    /// [`DEFAULT_ALLOWED_HEADERS`] plus `CORS_ALLOWED_HEADERS`, lowercased
    pub allowed_headers: Vec<String>,
    /// `BIND_ADDR`
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    /// Read the configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key = get("OPENAI_API_KEY").ok_or(ConfigError::MissingVar("OPENAI_API_KEY"))?;

        let base_url = get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidVar {
                name: "OPENAI_BASE_URL",
                reason: format!("expected an http(s) URL, got {:?}", base_url),
            });
        }

        let model = get("OPENAI_MODEL")
            .map(Model::from)
            .unwrap_or_default();

        let upstream_timeout = match get("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|e| ConfigError::InvalidVar {
                    name: "UPSTREAM_TIMEOUT_SECS",
                    reason: format!("{}", e),
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidVar {
                        name: "UPSTREAM_TIMEOUT_SECS",
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let allowed_origin =
            get("CORS_ALLOWED_ORIGIN").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string());
        if !is_valid_origin(&allowed_origin) {
            return Err(ConfigError::InvalidVar {
                name: "CORS_ALLOWED_ORIGIN",
                reason: format!("expected scheme://host[:port], got {:?}", allowed_origin),
            });
        }

        let mut allowed_headers: Vec<String> =
            DEFAULT_ALLOWED_HEADERS.iter().map(|h| h.to_string()).collect();
        if let Some(raw) = get("CORS_ALLOWED_HEADERS") {
            for name in raw.split(',').map(str::trim).filter(|name| !name.is_empty()) {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| ConfigError::InvalidVar {
                        name: "CORS_ALLOWED_HEADERS",
                        reason: format!("{:?}: {}", name, e),
                    })?
                    .as_str()
                    .to_string();
                if !allowed_headers.contains(&name) {
                    allowed_headers.push(name);
                }
            }
        }

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidVar {
                name: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        Ok(Self {
            api_key,
            base_url,
            model,
            upstream_timeout,
            allowed_origin,
            allowed_headers,
            bind_addr,
        })
    }

    /// Generation parameters shared by every relay call
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig::new(self.model.clone())
            .with_temperature(DEFAULT_TEMPERATURE)
            .with_timeout(self.upstream_timeout)
    }
}

/// `scheme://host[:port]` with no path, query or trailing slash
fn is_valid_origin(origin: &str) -> bool {
    match origin.split_once("://") {
        Some((scheme, authority)) => {
            !scheme.is_empty()
                && !authority.is_empty()
                && !authority.contains(['/', '?', '#', ' '])
        }
        None => false,
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("allowed_origin", &self.allowed_origin)
            .field("allowed_headers", &self.allowed_headers)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}
