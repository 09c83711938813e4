//! Cookie service: set and clear the HTTP-only auth cookies.
//!
//! Both cookies are `SameSite=Strict` on path `/`. `Secure` follows
//! [`ApiConfig::cookie_secure`](crate::config::ApiConfig::cookie_secure).

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use shift_core::auth::jwt::ACCESS_TOKEN_TTL_SECS;
use shift_core::auth::refresh::REFRESH_TOKEN_TTL_DAYS;
use time::{Duration, OffsetDateTime};

/// Cookie name for the access token.
pub const ACCESS_COOKIE: &str = "accessToken";
/// Cookie name for the refresh token.
pub const REFRESH_COOKIE: &str = "refreshToken";

fn base_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .build()
}

/// Access token cookie, 15 minutes.
pub fn access_cookie(token: &str, secure: bool) -> Cookie<'static> {
    let mut cookie = base_cookie(ACCESS_COOKIE, token.to_string(), secure);
    cookie.set_max_age(Duration::seconds(ACCESS_TOKEN_TTL_SECS));
    cookie
}

/// Refresh token cookie, 30 days.
pub fn refresh_cookie(token: &str, secure: bool) -> Cookie<'static> {
    let mut cookie = base_cookie(REFRESH_COOKIE, token.to_string(), secure);
    cookie.set_max_age(Duration::days(REFRESH_TOKEN_TTL_DAYS));
    cookie
}

/// An emptied cookie that expires at the epoch.
fn cleared_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    let mut cookie = base_cookie(name, String::new(), secure);
    cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
    cookie
}

/// Always sets the access cookie; the refresh cookie only when given.
pub fn attach_auth_cookies(
    jar: CookieJar,
    access_token: &str,
    refresh_token: Option<&str>,
    secure: bool,
) -> CookieJar {
    let jar = jar.add(access_cookie(access_token, secure));
    match refresh_token {
        Some(token) => jar.add(refresh_cookie(token, secure)),
        None => jar,
    }
}

pub fn clear_auth_cookies(jar: CookieJar, secure: bool) -> CookieJar {
    jar.add(cleared_cookie(ACCESS_COOKIE, secure))
        .add(cleared_cookie(REFRESH_COOKIE, secure))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_cookie_attributes() {
        let c = access_cookie("tok", true);
        assert_eq!(c.name(), "accessToken");
        assert_eq!(c.value(), "tok");
        assert_eq!(c.http_only(), Some(true));
        assert_eq!(c.secure(), Some(true));
        assert_eq!(c.same_site(), Some(SameSite::Strict));
        assert_eq!(c.path(), Some("/"));
        assert_eq!(c.max_age(), Some(Duration::minutes(15)));
    }

    #[test]
    fn refresh_cookie_lasts_thirty_days() {
        let c = refresh_cookie("r", false);
        assert_eq!(c.name(), "refreshToken");
        assert_eq!(c.secure(), Some(false));
        assert_eq!(c.max_age(), Some(Duration::days(30)));
    }

    #[test]
    fn renewal_leaves_refresh_cookie_alone() {
        let jar = attach_auth_cookies(CookieJar::new(), "a", None, false);
        assert!(jar.get(ACCESS_COOKIE).is_some());
        assert!(jar.get(REFRESH_COOKIE).is_none());

        let jar = attach_auth_cookies(CookieJar::new(), "a", Some("r"), false);
        assert_eq!(jar.get(REFRESH_COOKIE).map(Cookie::value), Some("r"));
    }

    #[test]
    fn cleared_cookies_are_empty_and_expired() {
        let jar = clear_auth_cookies(CookieJar::new(), true);
        for name in [ACCESS_COOKIE, REFRESH_COOKIE] {
            let c = jar.get(name).unwrap();
            assert_eq!(c.value(), "");
            assert_eq!(c.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
        }
    }
}
