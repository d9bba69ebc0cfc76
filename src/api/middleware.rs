use axum::{
    extract::{Extension, Request},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use sea_orm::DatabaseConnection;

use crate::auth::Actor;
use crate::error::AppError;
use crate::services::farmers;

/// Splits `Token <key>` / `Bearer <key>`.
///
/// `None` means the header uses some other scheme and is ignored;
/// `Some(Err)` means it claims a token but is malformed.
fn token_from_header(value: &str) -> Option<Result<&str, AppError>> {
    let mut parts = value.split_whitespace();
    let scheme = parts.next()?;
    if !scheme.eq_ignore_ascii_case("token") && !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let parsed = match (parts.next(), parts.next()) {
        (Some(key), None) => Ok(key),
        (None, _) => Err(AppError::InvalidCredentials(
            "Invalid token header. No credentials provided.",
        )),
        (Some(_), Some(_)) => Err(AppError::InvalidCredentials(
            "Invalid token header. Token string should not contain spaces.",
        )),
    };
    Some(parsed)
}

/// Resolves the `Authorization` header to an [`Actor`] when one is sent.
/// Requests without credentials pass through anonymously.
pub async fn token_auth(
    Extension(db): Extension<DatabaseConnection>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    if let Some(header) = header {
        match token_from_header(&header) {
            None => {}
            Some(Err(e)) => return e.into_response(),
            Some(Ok(key)) => match farmers::resolve_token(&db, key).await {
                Ok(Some(farmer)) => {
                    tracing::Span::current().record("farmer_id", farmer.id);
                    request.extensions_mut().insert(Actor::from(&farmer));
                }
                Ok(None) => {
                    tracing::Span::current().record("error", "invalid_token");
                    return AppError::InvalidCredentials("Invalid token.").into_response();
                }
                Err(e) => return e.into_response(),
            },
        }
    }

    next.run(request).await
}

pub async fn require_actor(request: Request, next: Next) -> Response {
    if request.extensions().get::<Actor>().is_none() {
        return AppError::Unauthenticated.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_and_bearer_schemes_accepted() {
        assert!(matches!(token_from_header("Token abc123"), Some(Ok("abc123"))));
        assert!(matches!(token_from_header("Bearer abc123"), Some(Ok("abc123"))));
        assert!(matches!(token_from_header("token abc123"), Some(Ok("abc123"))));
    }

    #[test]
    fn other_schemes_are_ignored() {
        assert!(token_from_header("Basic dXNlcjpwYXNz").is_none());
        assert!(token_from_header("").is_none());
    }

    #[test]
    fn malformed_token_headers_rejected() {
        assert!(matches!(token_from_header("Token"), Some(Err(_))));
        assert!(matches!(token_from_header("Token a b"), Some(Err(_))));
    }
}
