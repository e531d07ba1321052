//! Scoped storage primitive behind the session boundary.

use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::cookies::removal_cookie;

/// Per-request key-value storage with per-entry attributes (HTTP cookies).
pub trait CookieStore {
    /// Current value of `name`, if present.
    fn get(&self, name: &str) -> Option<String>;

    /// Write an entry, replacing any existing one with the same name.
    fn set(&mut self, cookie: Cookie<'static>);

    /// Delete an entry. Deleting an absent entry is a no-op.
    fn remove(&mut self, name: &str);
}

impl CookieStore for CookieJar {
    fn get(&self, name: &str) -> Option<String> {
        CookieJar::get(self, name).map(|c| c.value().to_string())
    }

    fn set(&mut self, cookie: Cookie<'static>) {
        *self = CookieJar::add(std::mem::take(self), cookie);
    }

    fn remove(&mut self, name: &str) {
        *self = CookieJar::remove(std::mem::take(self), removal_cookie(name));
    }
}
