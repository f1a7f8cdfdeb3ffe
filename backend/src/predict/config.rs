use std::env;

use thiserror::Error;
use url::Url;

/// Inbound bodies are buffered before forwarding; clients cap uploads at
/// 5MB, this bound just keeps a misbehaving client from exhausting memory.
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid EXTERNAL_PREDICT_URL: {0}")]
    InvalidUpstreamUrl(#[from] url::ParseError),
}

/// Resolved once at startup and injected into the service, so both modes
/// are testable without touching the process environment.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Upstream classifier endpoint. `None` means mock mode.
    pub upstream_url: Option<Url>,
    pub max_body_bytes: usize,
}

impl ProxyConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let upstream_url = match env::var("EXTERNAL_PREDICT_URL") {
            Ok(raw) if !raw.trim().is_empty() => Some(Url::parse(raw.trim())?),
            _ => None,
        };

        Ok(Self {
            upstream_url,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        })
    }

    pub fn mock_mode() -> Self {
        Self {
            upstream_url: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn proxied_to(upstream_url: Url) -> Self {
        Self {
            upstream_url: Some(upstream_url),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}
