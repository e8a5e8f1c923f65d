use sea_orm::DatabaseConnection;

use crate::infra::db::{DbLoginCodeRepository, DbTransactioner, DbUserRepository};
use crate::infra::jwt::JwtTokenIssuer;
use crate::infra::sms::TwilioOtpSender;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub auth_secret: String,
    pub token_issuer: JwtTokenIssuer,
    pub otp_sender: TwilioOtpSender,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn login_code_repo(&self) -> DbLoginCodeRepository {
        DbLoginCodeRepository {
            db: self.db.clone(),
        }
    }

    pub fn transactioner(&self) -> DbTransactioner {
        DbTransactioner {
            db: self.db.clone(),
        }
    }
}
