//! tsh: toonshield operator CLI
//!
//! Commands:
//!   encrypt <token>         - seal a token the way the daemon writes cookies
//!   decrypt <value>         - open a cookie value (fails on anything but a valid envelope)
//!   inspect <value>         - classify a cookie value without decrypting it
//!   check                   - validate config + secret, derive the key, self-test
//!   gen-secret [--bytes N]  - print a random hex secret
//!
//! The secret is read from the environment variable named by
//! `session.secret_env` in the config (default `TSH_TOKEN_SECRET`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::RngCore;
use std::path::PathBuf;
use std::time::Instant;

use tsh_core::{TokenSecret, TshConfig, MIN_SECRET_LEN};
use tsh_crypto::{tag_version, KdfParams, StoredValue, TokenCipher, HEADER_HEX_LEN};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "tsh",
    version,
    about = "toonshield token tools",
    long_about = "tsh: inspect, encrypt and decrypt session cookie values, and check daemon configuration"
)]
struct Cli {
    /// Path to toonshield.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "TSH_CONFIG",
        default_value = "/etc/toonshield/config.toml"
    )]
    config: PathBuf,

    /// Log level for diagnostics on stderr
    #[arg(long, env = "TSH_LOG", default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a token into a cookie value
    Encrypt {
        token: String,
        /// Emit a bare envelope even if the config enables the version tag
        #[arg(long)]
        bare: bool,
    },

    /// Decrypt a cookie value back to its token
    Decrypt { value: String },

    /// Show how a cookie value would be read
    Inspect { value: String },

    /// Validate the config and secret, then run an encrypt/decrypt self-test
    Check,

    /// Generate a random secret suitable for the token secret variable
    GenSecret {
        /// Random bytes to draw (printed as 2 hex chars each)
        #[arg(long, default_value_t = 32)]
        bytes: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log);

    match cli.command {
        Commands::Encrypt { token, bare } => {
            let config = TshConfig::load(&cli.config)?;
            let cipher = load_cipher(&config)?;
            println!("{}", cmd_encrypt(&cipher, &token, config.session.write_version_tag && !bare)?);
            Ok(())
        }
        Commands::Decrypt { value } => {
            let config = TshConfig::load(&cli.config)?;
            let cipher = load_cipher(&config)?;
            println!("{}", cmd_decrypt(&cipher, &value)?);
            Ok(())
        }
        Commands::Inspect { value } => {
            print!("{}", cmd_inspect(&value));
            Ok(())
        }
        Commands::Check => cmd_check(&cli.config),
        Commands::GenSecret { bytes } => {
            println!("{}", gen_secret(bytes)?);
            Ok(())
        }
    }
}

fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_cipher(config: &TshConfig) -> Result<TokenCipher> {
    let secret = TokenSecret::from_env(&config.session.secret_env)
        .with_context(|| format!("loading token secret from ${}", config.session.secret_env))?;
    TokenCipher::with_params(&secret, &KdfParams::from(&config.session))
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn cmd_encrypt(cipher: &TokenCipher, token: &str, versioned: bool) -> Result<String> {
    let envelope = cipher.encrypt(token).context("encrypting token")?;
    Ok(if versioned {
        tag_version(&envelope)
    } else {
        envelope
    })
}

fn cmd_decrypt(cipher: &TokenCipher, value: &str) -> Result<String> {
    match StoredValue::classify(value).envelope() {
        Some(envelope) => cipher.decrypt(envelope).context("decrypting value"),
        None => anyhow::bail!("value is not an encrypted envelope (legacy raw token?)"),
    }
}

fn cmd_inspect(value: &str) -> String {
    let stored = StoredValue::classify(value);
    let kind = match stored {
        StoredValue::Versioned(_) => "versioned envelope (v1)",
        StoredValue::Unversioned(_) => "unversioned envelope",
        StoredValue::Raw(_) => "raw token (legacy, read as-is)",
    };

    let mut out = format!("kind:        {kind}\nlength:      {}\n", value.len());
    if let Some(envelope) = stored.envelope() {
        let ct_hex = envelope.len().saturating_sub(HEADER_HEX_LEN);
        out.push_str(&format!("iv:          {}\n", envelope.get(..24).unwrap_or(envelope)));
        out.push_str(&format!("ciphertext:  {} bytes\n", ct_hex / 2));
        if envelope.len() <= HEADER_HEX_LEN
            || ct_hex % 2 != 0
            || !envelope.bytes().all(|b| b.is_ascii_hexdigit())
        {
            out.push_str("warning:     envelope is malformed and will not decrypt\n");
        }
    }
    out
}

fn cmd_check(config_path: &std::path::Path) -> Result<()> {
    let config = TshConfig::load(config_path)?;
    println!("config:      {}", config_path.display());
    println!("listen:      {}", config.server.listen);
    println!("identity:    {}", config.identity.base_url);

    let started = Instant::now();
    let cipher = load_cipher(&config)?;
    println!(
        "secret:      ${} ok ({} ms key derivation)",
        config.session.secret_env,
        started.elapsed().as_millis()
    );

    let sample = "tsh-self-test-token";
    let sealed = cmd_encrypt(&cipher, sample, config.session.write_version_tag)?;
    let opened = cmd_decrypt(&cipher, &sealed)?;
    anyhow::ensure!(opened == sample, "self-test round trip mismatch");
    println!("self-test:   ok");
    Ok(())
}

/// Upper bound on `gen-secret --bytes`.
const MAX_SECRET_BYTES: usize = 1024;

fn gen_secret(bytes: usize) -> Result<String> {
    let min_bytes = MIN_SECRET_LEN.div_ceil(2);
    anyhow::ensure!(
        (min_bytes..=MAX_SECRET_BYTES).contains(&bytes),
        "--bytes must be between {min_bytes} and {MAX_SECRET_BYTES} \
         (a secret needs at least {MIN_SECRET_LEN} characters)"
    );
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    Ok(hex::encode(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsh_crypto::{TokenKey, VERSION_PREFIX};

    fn test_cipher() -> TokenCipher {
        TokenCipher::from_key(TokenKey::from_bytes([7u8; 32]))
    }

    #[test]
    fn test_encrypt_then_decrypt_versioned() {
        let cipher = test_cipher();
        let value = cmd_encrypt(&cipher, "acc-1", true).unwrap();
        assert!(value.starts_with(VERSION_PREFIX));
        assert_eq!(cmd_decrypt(&cipher, &value).unwrap(), "acc-1");
    }

    #[test]
    fn test_decrypt_bare_envelope() {
        let cipher = test_cipher();
        let value = cmd_encrypt(&cipher, "acc-1", false).unwrap();
        assert!(!value.starts_with(VERSION_PREFIX));
        assert_eq!(cmd_decrypt(&cipher, &value).unwrap(), "acc-1");
    }

    #[test]
    fn test_decrypt_raw_is_error() {
        assert!(cmd_decrypt(&test_cipher(), "plain-token").is_err());
    }

    #[test]
    fn test_inspect_kinds() {
        let cipher = test_cipher();
        let versioned = cmd_encrypt(&cipher, "token123", true).unwrap();
        let bare = cmd_encrypt(&cipher, "token123", false).unwrap();

        let out = cmd_inspect(&versioned);
        assert!(out.contains("versioned envelope"));
        assert!(out.contains("ciphertext:  8 bytes"));
        assert!(cmd_inspect(&bare).contains("unversioned envelope"));
        assert!(cmd_inspect("eyJhbGciOi.raw").contains("raw token"));
        assert!(cmd_inspect("v1.zz").contains("malformed"));
    }

    #[test]
    fn test_gen_secret_length_and_validity() {
        let s = gen_secret(32).unwrap();
        assert_eq!(s.len(), 64);
        assert!(TokenSecret::new(s.into()).is_ok());
        assert_ne!(gen_secret(32).unwrap(), gen_secret(32).unwrap());
    }

    #[test]
    fn test_gen_secret_too_short() {
        assert!(gen_secret(8).is_err());
        assert_eq!(gen_secret(16).unwrap().len(), MIN_SECRET_LEN);
    }

    #[test]
    fn test_gen_secret_upper_bound() {
        assert_eq!(gen_secret(MAX_SECRET_BYTES).unwrap().len(), 2 * MAX_SECRET_BYTES);
        assert!(gen_secret(MAX_SECRET_BYTES + 1).is_err());
        assert!(gen_secret(usize::MAX).is_err());
    }

    #[test]
    fn test_check_without_secret_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toonshield.toml");
        std::fs::write(
            &path,
            "[session]\nsecret_env = \"TSH_TEST_SECRET_THAT_IS_NOT_SET\"\n",
        )
        .unwrap();

        let err = cmd_check(&path).unwrap_err();
        assert!(format!("{err:#}").contains("TSH_TEST_SECRET_THAT_IS_NOT_SET"));
    }
}
