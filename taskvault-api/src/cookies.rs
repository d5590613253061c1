/// Session cookies
///
/// Both tokens travel as `HttpOnly; Secure; Path=/` cookies and are always
/// set or cleared together.

use axum_extra::extract::cookie::{Cookie, CookieJar};
use taskvault_shared::auth::jwt::TokenPair;
use taskvault_shared::auth::middleware::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .path("/")
        .build()
}

/// Adds both token cookies
pub fn set_session(jar: CookieJar, tokens: &TokenPair) -> CookieJar {
    jar.add(session_cookie(ACCESS_TOKEN_COOKIE, tokens.access_token.clone()))
        .add(session_cookie(REFRESH_TOKEN_COOKIE, tokens.refresh_token.clone()))
}

/// Expires both token cookies
///
/// Removal cookies are written even when the request carried no cookies,
/// which `CookieJar::remove` would skip.
pub fn clear_session(jar: CookieJar) -> CookieJar {
    [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE]
        .into_iter()
        .fold(jar, |jar, name| {
            let mut cookie = session_cookie(name, String::new());
            cookie.make_removal();
            jar.add(cookie)
        })
}
