use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use sea_orm::DatabaseConnection;
use tower_cookies::{cookie::SameSite, Cookie, Cookies, Key};

use crate::auth::Actor;
use crate::services::farmers;

pub const SESSION_COOKIE: &str = "agri_session";
pub const LOGIN_URL: &str = "/accounts/login/";

pub fn start_session(cookies: &Cookies, key: &Key, farmer_id: i32) {
    let mut cookie = Cookie::new(SESSION_COOKIE, farmer_id.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookies.signed(key).add(cookie);
}

pub fn end_session(cookies: &Cookies, key: &Key) {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookies.signed(key).remove(cookie);
}

/// Attaches the signed-in farmer, if any. Stale or tampered cookies are
/// dropped and the request continues anonymously.
pub async fn session_auth(
    Extension(db): Extension<DatabaseConnection>,
    Extension(key): Extension<Key>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Response {
    let farmer_id = cookies
        .signed(&key)
        .get(SESSION_COOKIE)
        .and_then(|cookie| cookie.value().parse::<i32>().ok());

    if let Some(id) = farmer_id {
        match farmers::find_active(&db, id).await {
            Ok(Some(farmer)) => {
                tracing::Span::current().record("farmer_id", farmer.id);
                request.extensions_mut().insert(Actor::from(&farmer));
            }
            Ok(None) => end_session(&cookies, &key),
            Err(e) => tracing::error!("Failed to load session farmer: {}", e),
        }
    }

    next.run(request).await
}

/// Sends anonymous visitors to the login page, remembering where they were.
pub async fn login_required(request: Request, next: Next) -> Response {
    if request.extensions().get::<Actor>().is_some() {
        return next.run(request).await;
    }
    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    Redirect::to(&format!("{}?next={}", LOGIN_URL, encode_component(target))).into_response()
}

/// Percent-encodes everything outside the RFC 3986 unreserved set and `/`.
pub fn encode_component(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                encoded.push(byte as char)
            }
            other => encoded.push_str(&format!("%{:02X}", other)),
        }
    }
    encoded
}

/// Only same-site absolute paths are followed after login.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_query_characters() {
        assert_eq!(encode_component("/fields/"), "/fields/");
        assert_eq!(
            encode_component("/activities/?status=completed&search=a b"),
            "/activities/%3Fstatus%3Dcompleted%26search%3Da%20b"
        );
    }

    #[test]
    fn next_must_be_local_path() {
        assert_eq!(safe_next(Some("/crops/")), "/crops/");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
