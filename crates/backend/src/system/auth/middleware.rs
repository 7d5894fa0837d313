use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use contracts::system::auth::TokenClaims;
use contracts::system::users::UserRole;

/// Pull the bearer token out of the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

async fn authenticate(headers: &HeaderMap) -> Result<TokenClaims, StatusCode> {
    let token = bearer_token(headers).ok_or(StatusCode::UNAUTHORIZED)?;
    super::jwt::validate_token(token)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)
}

/// Validates the token and, when a role is given, that the caller holds it.
/// A wrong role is reported like a missing token.
async fn guard(mut req: Request<Body>, next: Next, role: Option<UserRole>) -> Result<Response, StatusCode> {
    let claims = authenticate(req.headers()).await?;

    if let Some(required) = role {
        if claims.role != required {
            tracing::debug!(
                "User {} with role {} rejected, {} required",
                claims.username,
                claims.role,
                required
            );
            return Err(StatusCode::UNAUTHORIZED);
        }
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Middleware that requires valid JWT authentication
pub async fn require_auth(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    guard(req, next, None).await
}

/// Middleware that requires the ADMIN role
pub async fn require_admin(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    guard(req, next, Some(UserRole::Admin)).await
}

/// Middleware that requires the VENDEDOR role
pub async fn require_salesperson(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    guard(req, next, Some(UserRole::Vendedor)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with(header: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = header {
            headers.insert("Authorization", value.parse().unwrap());
        }
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&request_with(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&request_with(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&request_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&request_with(None)), None);
    }
}
