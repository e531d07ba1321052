use thiserror::Error;

pub type TshResult<T> = Result<T, TshError>;

#[derive(Debug, Error)]
pub enum TshError {
    #[error("config error: {0}")]
    Config(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("identity provider error: {0}")]
    Identity(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
