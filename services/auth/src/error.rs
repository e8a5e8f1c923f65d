use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Auth service error variants.
///
/// `Store` is the catch-all for persistence I/O; repository code reaches it
/// through `anyhow::Context` and `?`.
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("user not found")]
    IdentityNotFound,
    #[error("login code not found, init login first")]
    NoActiveCode,
    #[error("invalid otp")]
    InvalidOtp,
    #[error("otp has expired")]
    OtpExpired,
    #[error("otp delivery failed")]
    DeliveryFailed(#[source] anyhow::Error),
    #[error("transaction failed")]
    Transaction(#[source] anyhow::Error),
    #[error("token generation failed")]
    Token(#[source] anyhow::Error),
    #[error("user already exists")]
    UserAlreadyExists,
    #[error("missing data")]
    MissingData,
    #[error("invalid token")]
    InvalidToken,
    #[error("internal error")]
    Store(#[from] anyhow::Error),
}

impl AuthServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IdentityNotFound => "IDENTITY_NOT_FOUND",
            Self::NoActiveCode => "NO_ACTIVE_CODE",
            Self::InvalidOtp => "INVALID_OTP",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::DeliveryFailed(_) => "DELIVERY_FAILED",
            Self::Transaction(_) => "TRANSACTION_ERROR",
            Self::Token(_) => "TOKEN_ERROR",
            Self::UserAlreadyExists => "USER_ALREADY_EXISTS",
            Self::MissingData => "MISSING_DATA",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::IdentityNotFound | Self::NoActiveCode => StatusCode::NOT_FOUND,
            Self::InvalidOtp | Self::OtpExpired | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::UserAlreadyExists => StatusCode::CONFLICT,
            Self::MissingData => StatusCode::BAD_REQUEST,
            Self::DeliveryFailed(_) => StatusCode::BAD_GATEWAY,
            Self::Transaction(_) | Self::Token(_) | Self::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        // 4xx are expected client errors and TraceLayer already records them.
        // Upstream and internal failures need their anyhow chain logged.
        if status.is_server_error() {
            let cause = match &self {
                Self::DeliveryFailed(e)
                | Self::Transaction(e)
                | Self::Token(e)
                | Self::Store(e) => format!("{e:#}"),
                _ => String::new(),
            };
            tracing::error!(error = %cause, kind = self.kind(), "request failed");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
