use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use uuid::Uuid;

use otpgate_auth_types::token::validate_access_token;

use crate::error::AuthServiceError;
use crate::state::AppState;

/// Caller identity taken from a valid `Authorization: Bearer <token>` header.
///
/// Rejects with `InvalidToken` (401) when the header is missing or the token
/// does not validate against the auth secret.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: String,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AuthServiceError;

    // Validation is synchronous, so resolve it before building the future;
    // the returned block then borrows nothing from `parts`.
    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let result = parts
            .headers
            .typed_get::<Authorization<Bearer>>()
            .ok_or(AuthServiceError::InvalidToken)
            .and_then(|auth| {
                validate_access_token(auth.token(), &state.auth_secret)
                    .map_err(|_| AuthServiceError::InvalidToken)
            })
            .map(|info| Self {
                user_id: info.user_id,
                role: info.user_role,
            });

        async move { result }
    }
}
