use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{TshError, TshResult};

/// Top-level configuration (loaded from toonshield.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TshConfig {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for the auth router (default: 127.0.0.1:8080)
    pub listen: String,
    /// Prometheus metrics + health endpoint (default: 127.0.0.1:9100)
    pub metrics_addr: Option<String>,
    /// Log level (default: info)
    pub log_level: String,
    /// Log format: "json" or "text"
    pub log_format: String,
}

/// Cookie session and token cipher settings.
///
/// The shared secret itself never lives in the config file; `secret_env`
/// names the environment variable it is read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Set the `Secure` attribute on auth cookies (disable only for local HTTP)
    pub secure_cookies: bool,
    /// Prefix newly written envelopes with the `v1.` scheme tag
    pub write_version_tag: bool,
    /// Environment variable holding the token encryption secret
    pub secret_env: String,
    /// Argon2id memory cost in KiB (default: 16384 = 16 MiB)
    pub argon2_mem_cost_kib: u32,
    /// Argon2id time cost (default: 2)
    pub argon2_time_cost: u32,
    /// Argon2id parallelism (default: 1)
    pub argon2_parallelism: u32,
}

/// External identity provider endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Base URL of the identity provider REST API
    pub base_url: String,
    /// Environment variable holding the provider API key
    pub api_key_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".into(),
            metrics_addr: Some("127.0.0.1:9100".into()),
            log_level: "info".into(),
            log_format: "json".into(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secure_cookies: true,
            write_version_tag: true,
            secret_env: "TSH_TOKEN_SECRET".into(),
            argon2_mem_cost_kib: 16384,
            argon2_time_cost: 2,
            argon2_parallelism: 1,
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9999".into(),
            api_key_env: "TSH_IDENTITY_API_KEY".into(),
            timeout_secs: 10,
        }
    }
}

impl TshConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> TshResult<Self> {
        if !path.exists() {
            tracing::warn!(
                "config file not found: {}  (using defaults)",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| TshError::Config(format!("parsing config {}: {e}", path.display())))
    }
}
