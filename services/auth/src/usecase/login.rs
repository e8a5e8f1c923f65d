use chrono::Utc;
use rand::RngExt;
use tracing::{info, warn};

use crate::domain::repository::{
    LoginCodeRepository, OtpSender, TokenIssuer, Transactioner, UserRepository,
};
use crate::domain::types::{Credential, LoginCode, NewLoginCode, OTP_LEN, TokenClaims, User};
use crate::error::AuthServiceError;

const DIGITS: &[u8] = b"0123456789";

/// Random numeric OTP of [`OTP_LEN`] digits from the thread-local CSPRNG.
pub fn generate_otp() -> String {
    let mut rng = rand::rng();
    (0..OTP_LEN)
        .map(|_| DIGITS[rng.random_range(0..DIGITS.len())] as char)
        .collect()
}

// ── InitLogin ────────────────────────────────────────────────────────────────

pub struct InitLoginInput {
    pub username: String,
}

pub struct InitLoginUseCase<U, L, S>
where
    U: UserRepository,
    L: LoginCodeRepository,
    S: OtpSender,
{
    pub users: U,
    pub login_codes: L,
    pub sender: S,
}

impl<U, L, S> InitLoginUseCase<U, L, S>
where
    U: UserRepository,
    L: LoginCodeRepository,
    S: OtpSender,
{
    /// Issue a fresh OTP for the user, replacing any outstanding one, and send it.
    ///
    /// The code stays issued if delivery fails; the caller gets `DeliveryFailed`
    /// and decides whether to retry.
    pub async fn execute(&self, input: InitLoginInput) -> Result<(), AuthServiceError> {
        let user = self
            .users
            .find_by_username(&input.username)
            .await?
            .ok_or(AuthServiceError::IdentityNotFound)?;

        let otp = generate_otp();
        let fresh = NewLoginCode::pending(&user.username, &otp, Utc::now());
        let issued = self.upsert(&user, &fresh).await?;
        info!(
            user_id = %user.id,
            login_code_id = %issued.id,
            expiry_time = %issued.expiry_time,
            "login code issued"
        );

        if let Err(e) = self.sender.send(&user.username, &otp).await {
            warn!(user_id = %user.id, login_code_id = %issued.id, error = %e, "otp delivery failed");
            return Err(e);
        }
        Ok(())
    }

    /// Refresh the existing active row in place, or create one if there is none.
    async fn upsert(
        &self,
        user: &User,
        fresh: &NewLoginCode,
    ) -> Result<LoginCode, AuthServiceError> {
        if let Some(existing) = self
            .login_codes
            .find_by_username(None, &user.username)
            .await?
        {
            if let Some(refreshed) = self.login_codes.update(None, existing.id, fresh).await? {
                return Ok(refreshed);
            }
            // Consumed by a concurrent login between the lookup and the update.
        }
        self.login_codes.create(None, fresh).await
    }
}

// ── Login ────────────────────────────────────────────────────────────────────

pub struct LoginInput {
    pub username: String,
    pub otp: String,
}

pub struct LoginUseCase<U, L, T, I>
where
    U: UserRepository,
    L: LoginCodeRepository,
    T: Transactioner<Tx = L::Tx>,
    I: TokenIssuer,
{
    pub users: U,
    pub login_codes: L,
    pub transactioner: T,
    pub tokens: I,
}

impl<U, L, T, I> LoginUseCase<U, L, T, I>
where
    U: UserRepository,
    L: LoginCodeRepository,
    T: Transactioner<Tx = L::Tx>,
    I: TokenIssuer,
{
    /// Verify the OTP and exchange it for a credential.
    ///
    /// Verification, token issuance and consumption of the code run in one
    /// transaction: either the code is deleted and a credential returned, or
    /// nothing changes.
    pub async fn execute(&self, input: LoginInput) -> Result<Credential, AuthServiceError> {
        let user = self
            .users
            .find_by_username(&input.username)
            .await?
            .ok_or(AuthServiceError::IdentityNotFound)?;

        let tx = self.transactioner.begin().await?;
        match self.consume(&tx, &user, &input.otp).await {
            Ok(credential) => {
                self.transactioner.commit(tx).await?;
                info!(user_id = %user.id, "login code consumed");
                Ok(credential)
            }
            Err(err) => {
                if let Err(rollback_err) = self.transactioner.rollback(tx).await {
                    warn!(user_id = %user.id, error = %err, "rollback failed after login error");
                    return Err(rollback_err);
                }
                Err(err)
            }
        }
    }

    async fn consume(
        &self,
        tx: &L::Tx,
        user: &User,
        otp: &str,
    ) -> Result<Credential, AuthServiceError> {
        let login_code = self
            .login_codes
            .find_by_username(Some(tx), &user.username)
            .await?
            .ok_or(AuthServiceError::NoActiveCode)?;

        if login_code.code != otp {
            return Err(AuthServiceError::InvalidOtp);
        }
        // Lookups never return deleted rows, so this only fails on expiry.
        if !login_code.is_usable_at(Utc::now()) {
            return Err(AuthServiceError::OtpExpired);
        }

        let credential = self.tokens.generate(&TokenClaims::from(user))?;

        let deleted = self
            .login_codes
            .delete_by_username(Some(tx), &user.username)
            .await?;
        if deleted == 0 {
            // Another login consumed it after our read.
            return Err(AuthServiceError::NoActiveCode);
        }
        Ok(credential)
    }
}
