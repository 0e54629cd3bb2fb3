use crate::{
    error::{ApiError, Result},
    models::session::OperatorSession,
};
use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

/// Operator session middleware
///
/// Extracts the bearer token issued by the identity provider and stores it in
/// request extensions. The token is forwarded to the tenant API, which is
/// where it gets verified.
///
/// Returns 401 Unauthorized if the header is missing or malformed.
pub async fn operator_session_middleware(mut request: Request, next: Next) -> Result<Response> {
    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ApiError::Unauthorized(
                "Invalid Authorization format, expected 'Bearer <token>'".to_string(),
            )
        })?;

    let session = OperatorSession::new(token);
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

/// Axum extractor for the operator session
///
/// Only works on routes protected by operator_session_middleware.
impl<S> FromRequestParts<S> for OperatorSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<OperatorSession>()
            .cloned()
            .ok_or_else(|| {
                ApiError::Unauthorized(
                    "Operator session not found - route must be protected by operator_session_middleware"
                        .to_string(),
                )
            })
    }
}
