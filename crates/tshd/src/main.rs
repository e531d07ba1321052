//! tshd: toonshield session daemon
//!
//! Usage:
//!   tshd [--config /etc/toonshield/config.toml] [--log info] [--log-format json|text]
//!
//! The token secret is read from the environment variable named by
//! `session.secret_env` (default `TSH_TOKEN_SECRET`). Startup fails if it is
//! missing or shorter than 32 characters.

mod daemon;
mod metrics;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tsh_core::config::ServerConfig;
use tsh_core::TshConfig;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "tshd", version, about = "toonshield session daemon")]
struct Cli {
    /// Path to toonshield.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "TSH_CONFIG",
        default_value = "/etc/toonshield/config.toml"
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides server.log_level
    #[arg(long, env = "TSH_LOG")]
    log: Option<String>,

    /// Log format (json, text); overrides server.log_format
    #[arg(long, env = "TSH_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, PartialEq, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    let (level, format) = log_settings(&cli, &config.server);
    init_logging(&level, &format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "tshd starting"
    );

    daemon::run(config).await
}

/// Load the config before the global subscriber exists; warnings raised while
/// loading go to stderr through a temporary subscriber.
fn load_config(path: &Path) -> tsh_core::TshResult<TshConfig> {
    let bootstrap = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .finish();
    tracing::subscriber::with_default(bootstrap, || TshConfig::load(path))
}

/// CLI/env flags win over `[server]` config.
fn log_settings(cli: &Cli, server: &ServerConfig) -> (String, LogFormat) {
    let level = cli.log.clone().unwrap_or_else(|| server.log_level.clone());
    let format = cli.log_format.clone().unwrap_or_else(|| {
        LogFormat::from_str(&server.log_format, true).unwrap_or(LogFormat::Json)
    });
    (level, format)
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:8080");
    }

    #[test]
    fn test_invalid_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toonshield.toml");
        std::fs::write(&path, "[server\nlisten = ").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_log_settings_from_config() {
        let cli = Cli::parse_from(["tshd", "-c", "/nonexistent.toml"]);
        let server = ServerConfig {
            log_level: "debug".into(),
            log_format: "TEXT".into(),
            ..ServerConfig::default()
        };
        assert_eq!(log_settings(&cli, &server), ("debug".into(), LogFormat::Text));
    }

    #[test]
    fn test_log_flags_override_config() {
        let cli = Cli::parse_from(["tshd", "--log", "warn", "--log-format", "json"]);
        let server = ServerConfig {
            log_format: "text".into(),
            ..ServerConfig::default()
        };
        assert_eq!(log_settings(&cli, &server), ("warn".into(), LogFormat::Json));
    }
}
