use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use otpgate_core::serde::to_rfc3339_ms;

/// Registered principal. `username` is the login identity (a phone number),
/// compared by exact match.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    #[serde(rename = "user_name")]
    pub username: String,
    pub role: String,
    pub full_name: String,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

/// Audit status of a login code. Usability is never derived from it; see
/// [`LoginCode::is_usable_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginCodeStatus {
    Pending,
    Success,
    Failed,
}

impl LoginCodeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for LoginCodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown login code status: {0}")]
pub struct UnknownLoginCodeStatus(pub String);

impl FromStr for LoginCodeStatus {
    type Err = UnknownLoginCodeStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            other => Err(UnknownLoginCodeStatus(other.to_owned())),
        }
    }
}

/// One outstanding OTP challenge for a username.
#[derive(Debug, Clone)]
pub struct LoginCode {
    pub id: Uuid,
    pub username: String,
    pub code: String,
    pub expiry_time: DateTime<Utc>,
    pub status: LoginCodeStatus,
    pub response_meta: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl LoginCode {
    /// Valid strictly before `expiry_time`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry_time
    }

    /// Whether the code can still be exchanged at `now`. Login checks this after
    /// matching the submitted code.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.deleted_at.is_none() && !self.is_expired_at(now)
    }
}

/// Mutable fields of a login code, written on create and on refresh.
/// The store assigns `id` and the timestamps.
#[derive(Debug, Clone)]
pub struct NewLoginCode {
    pub username: String,
    pub code: String,
    pub expiry_time: DateTime<Utc>,
    pub status: LoginCodeStatus,
}

impl NewLoginCode {
    /// A fresh pending challenge valid for [`LOGIN_CODE_TTL_SECS`] from `issued_at`.
    pub fn pending(username: &str, code: &str, issued_at: DateTime<Utc>) -> Self {
        Self {
            username: username.to_owned(),
            code: code.to_owned(),
            expiry_time: issued_at + Duration::seconds(LOGIN_CODE_TTL_SECS),
            status: LoginCodeStatus::Pending,
        }
    }
}

/// Claims handed to the token issuer after a successful OTP check. Never persisted.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub role: String,
}

impl From<&User> for TokenClaims {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role.clone(),
        }
    }
}

/// Signed, time-limited token returned to the caller on login.
#[derive(Debug, Clone, Serialize)]
pub struct Credential {
    pub token: String,
    pub expires_in: u64,
}

/// OTP length in digits.
pub const OTP_LEN: usize = 6;

/// Login code time-to-live in seconds (5 minutes).
pub const LOGIN_CODE_TTL_SECS: i64 = 300;
