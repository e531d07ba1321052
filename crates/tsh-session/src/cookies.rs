use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;
use tsh_core::types::{
    ACCESS_COOKIE, ACCESS_TTL_SECS, REFRESH_COOKIE, REFRESH_TTL_SECS, SESSION_COOKIE,
    SESSION_TTL_SECS,
};

/// Create the encrypted access token cookie.
pub(crate) fn access_cookie(value: String, secure: bool) -> Cookie<'static> {
    server_only(ACCESS_COOKIE, value, ACCESS_TTL_SECS, secure)
}

/// Create the encrypted refresh token cookie.
pub(crate) fn refresh_cookie(value: String, secure: bool) -> Cookie<'static> {
    server_only(REFRESH_COOKIE, value, REFRESH_TTL_SECS, secure)
}

/// Create the session info cookie. Readable by client script.
pub(crate) fn session_info_cookie(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .http_only(false)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(SESSION_TTL_SECS))
        .build()
}

fn server_only(name: &'static str, value: String, ttl_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(ttl_secs))
        .build()
}

/// Create a removal cookie matching the path the entry was set on.
pub(crate) fn removal_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), ""))
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

/// Removal cookies for every session entry.
pub(crate) fn all_removal_cookies() -> [Cookie<'static>; 3] {
    [
        removal_cookie(ACCESS_COOKIE),
        removal_cookie(REFRESH_COOKIE),
        removal_cookie(SESSION_COOKIE),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_cookie_flags() {
        let c = access_cookie("v1.abc".into(), true);
        assert_eq!(c.name(), ACCESS_COOKIE);
        assert_eq!(c.http_only(), Some(true));
        assert_eq!(c.secure(), Some(true));
        assert_eq!(c.same_site(), Some(SameSite::Lax));
        assert_eq!(c.path(), Some("/"));
        assert_eq!(c.max_age(), Some(Duration::minutes(15)));
    }

    #[test]
    fn test_refresh_cookie_ttl() {
        let c = refresh_cookie("v1.abc".into(), false);
        assert_eq!(c.http_only(), Some(true));
        assert_eq!(c.secure(), Some(false));
        assert_eq!(c.max_age(), Some(Duration::days(7)));
    }

    #[test]
    fn test_session_info_cookie_is_script_readable() {
        let c = session_info_cookie("{}".into(), true);
        assert_eq!(c.http_only(), Some(false));
        assert_eq!(c.max_age(), Some(Duration::days(7)));
    }

    #[test]
    fn test_removal_cookie() {
        let c = removal_cookie(REFRESH_COOKIE);
        assert_eq!(c.value(), "");
        assert_eq!(c.path(), Some("/"));
        assert_eq!(c.max_age(), Some(Duration::ZERO));
    }
}
