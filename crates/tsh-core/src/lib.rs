pub mod config;
pub mod error;
pub mod secret;
pub mod types;

pub use config::TshConfig;
pub use error::{TshError, TshResult};
pub use secret::{TokenSecret, MIN_SECRET_LEN};
pub use types::{IdentityUser, SessionInfo, TokenPair};
