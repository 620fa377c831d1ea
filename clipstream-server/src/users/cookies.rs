//! Cookie transport for the token pair.
//!
//! Tokens ride in `httpOnly` session cookies and, redundantly, in the JSON
//! body, so both browser and non-browser clients can hold them. The
//! `Secure` flag is dropped only in dev mode where clients speak plain HTTP.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use clipstream_core::auth::TokenPair;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

fn auth_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Attach both tokens as session cookies.
pub fn set_session_cookies(jar: CookieJar, tokens: &TokenPair, secure: bool) -> CookieJar {
    jar.add(auth_cookie(
        ACCESS_COOKIE,
        tokens.access_token.clone(),
        secure,
    ))
    .add(auth_cookie(
        REFRESH_COOKIE,
        tokens.refresh_token.clone(),
        secure,
    ))
}

/// Expire both token cookies.
pub fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((ACCESS_COOKIE, "")).path("/").build())
        .remove(Cookie::build((REFRESH_COOKIE, "")).path("/").build())
}

/// The refresh token as presented by the client: cookie first, body second.
pub fn presented_refresh_token(jar: &CookieJar, body_token: Option<&str>) -> Option<String> {
    jar.get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| body_token.map(str::to_string))
}

/// The access token from the `Authorization: Bearer` header or, failing
/// that, the access cookie.
pub fn presented_access_token(auth_header: Option<&str>, jar: &CookieJar) -> Option<String> {
    auth_header
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::to_string)
        .or_else(|| jar.get(ACCESS_COOKIE).map(|cookie| cookie.value().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> TokenPair {
        TokenPair {
            access_token: "acc".to_string(),
            refresh_token: "ref".to_string(),
        }
    }

    #[test]
    fn session_cookies_are_http_only_and_scoped_to_root() {
        let jar = set_session_cookies(CookieJar::new(), &pair(), true);

        let access = jar.get(ACCESS_COOKIE).unwrap();
        assert_eq!(access.value(), "acc");
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.secure(), Some(true));
        assert_eq!(access.path(), Some("/"));
        // Session lifetime: no Max-Age / Expires.
        assert!(access.max_age().is_none());

        assert_eq!(jar.get(REFRESH_COOKIE).unwrap().value(), "ref");
    }

    #[test]
    fn dev_mode_drops_the_secure_flag() {
        let jar = set_session_cookies(CookieJar::new(), &pair(), false);
        assert_eq!(jar.get(ACCESS_COOKIE).unwrap().secure(), Some(false));
    }

    #[test]
    fn refresh_token_prefers_the_cookie_over_the_body() {
        let jar = set_session_cookies(CookieJar::new(), &pair(), true);

        assert_eq!(
            presented_refresh_token(&jar, Some("from-body")).as_deref(),
            Some("ref")
        );
        assert_eq!(
            presented_refresh_token(&CookieJar::new(), Some("from-body")).as_deref(),
            Some("from-body")
        );
        assert_eq!(presented_refresh_token(&CookieJar::new(), None), None);
    }

    #[test]
    fn access_token_prefers_the_bearer_header() {
        let jar = set_session_cookies(CookieJar::new(), &pair(), true);

        assert_eq!(
            presented_access_token(Some("Bearer from-header"), &jar).as_deref(),
            Some("from-header")
        );
        assert_eq!(presented_access_token(None, &jar).as_deref(), Some("acc"));
        assert_eq!(
            presented_access_token(Some("Basic nope"), &CookieJar::new()),
            None
        );
    }
}
