//! tsh-session: the cookie boundary between identity-provider tokens and the browser
//!
//! Three cookies make up a session:
//!   - `access_token`  — encrypted access token, HttpOnly, 15 minutes
//!   - `refresh_token` — encrypted refresh token, HttpOnly, 7 days
//!   - `user_session`  — plain JSON display info, script-readable, 7 days
//!
//! Lifecycle:
//! ```text
//! NoSession --login/register--> Authenticated --access expires--> AccessExpiredRefreshValid
//!     ^                              ^                                   |
//!     |                              +--------- refresh ok --------------+
//!     +---- logout / refresh failure / undecryptable cookie -------------+
//! ```

mod cookies;
mod error;
mod extractor;
pub mod identity;
pub mod metrics;
mod routes;
pub mod session;
mod state;
pub mod store;

pub use error::AuthError;
pub use extractor::AuthUser;
pub use identity::{HttpIdentityProvider, IdentityError, IdentityGrant, IdentityProvider};
pub use metrics::SessionMetrics;
pub use routes::auth_routes;
pub use session::{CookieSession, SessionError, SessionSettings, SessionState};
pub use state::AuthConfig;
pub use store::CookieStore;
