#![allow(async_fn_in_trait)]

use uuid::Uuid;

use crate::domain::types::{Credential, LoginCode, NewLoginCode, TokenClaims, User};
use crate::error::AuthServiceError;

/// Registered users, looked up by login identity.
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthServiceError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthServiceError>;
    async fn create(&self, user: &User) -> Result<(), AuthServiceError>;
}

/// Atomic units of work over the login code store.
///
/// Dropping a `Tx` without calling [`Transactioner::commit`] must roll it back,
/// so a cancelled request never leaves a transaction open.
pub trait Transactioner: Send + Sync {
    type Tx: Send + Sync;

    async fn begin(&self) -> Result<Self::Tx, AuthServiceError>;
    async fn commit(&self, tx: Self::Tx) -> Result<(), AuthServiceError>;
    async fn rollback(&self, tx: Self::Tx) -> Result<(), AuthServiceError>;
}

/// Persistence for login codes.
///
/// Every operation takes an optional transaction; `None` runs standalone.
/// Lookups only ever return rows with `deleted_at IS NULL`. Deletes are soft.
pub trait LoginCodeRepository: Send + Sync {
    type Tx: Send + Sync;

    /// The active code for a username. Inside a transaction the row is locked
    /// until commit or rollback.
    async fn find_by_username(
        &self,
        tx: Option<&Self::Tx>,
        username: &str,
    ) -> Result<Option<LoginCode>, AuthServiceError>;

    async fn find_by_id(
        &self,
        tx: Option<&Self::Tx>,
        id: Uuid,
    ) -> Result<Option<LoginCode>, AuthServiceError>;

    /// Insert a new active code, assigning id and timestamps. If an active code
    /// already exists for the username it is refreshed in place instead.
    async fn create(
        &self,
        tx: Option<&Self::Tx>,
        code: &NewLoginCode,
    ) -> Result<LoginCode, AuthServiceError>;

    /// Overwrite the mutable fields of an active code. Returns `None` if the
    /// row no longer exists or was deleted.
    async fn update(
        &self,
        tx: Option<&Self::Tx>,
        id: Uuid,
        code: &NewLoginCode,
    ) -> Result<Option<LoginCode>, AuthServiceError>;

    /// Soft-delete the active code(s) for a username, marking them consumed.
    /// Returns the number of rows deleted.
    async fn delete_by_username(
        &self,
        tx: Option<&Self::Tx>,
        username: &str,
    ) -> Result<u64, AuthServiceError>;

    /// Soft-delete by id. Returns `true` if an active row was deleted.
    async fn delete(&self, tx: Option<&Self::Tx>, id: Uuid) -> Result<bool, AuthServiceError>;
}

/// Mints credentials for verified claims. Pure: signing secret and expiry are
/// fixed at construction.
pub trait TokenIssuer: Send + Sync {
    fn generate(&self, claims: &TokenClaims) -> Result<Credential, AuthServiceError>;
}

/// Delivers a plaintext OTP to its destination (SMS).
pub trait OtpSender: Send + Sync {
    async fn send(&self, destination: &str, otp: &str) -> Result<(), AuthServiceError>;
}
