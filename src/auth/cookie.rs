use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

pub const SESSION_COOKIE: &str = "access_token";

pub fn session_cookie(token: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

/// Expired, empty cookie; emitted whether or not the client had a session.
pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_attributes() {
        let c = session_cookie("tok".into(), Duration::minutes(180), false);
        let header = c.to_string();
        assert!(header.starts_with("access_token=tok"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Max-Age=10800"));
        assert!(!header.contains("Secure"));
    }

    #[test]
    fn removal_cookie_expires_immediately() {
        let header = removal_cookie(true).to_string();
        assert!(header.starts_with("access_token=;"));
        assert!(header.contains("Max-Age=0"));
        assert!(header.contains("Secure"));
    }
}
